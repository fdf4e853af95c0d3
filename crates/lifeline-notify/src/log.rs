// SPDX-FileCopyrightText: 2026 Lifeline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Fallback notifier that writes crisis events to the log.

use async_trait::async_trait;
use lifeline_core::{
    AdapterType, CrisisNotification, HealthStatus, LifelineError, NotificationAdapter,
    PluginAdapter,
};
use tracing::warn;

/// Emits one structured `warn!` event per crisis notification.
///
/// Used when no webhook is configured, so crisis activations are still
/// visible to whoever watches the service logs.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotifier;

#[async_trait]
impl PluginAdapter for LogNotifier {
    fn name(&self) -> &str {
        "log"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Notification
    }

    async fn health_check(&self) -> Result<HealthStatus, LifelineError> {
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), LifelineError> {
        Ok(())
    }
}

#[async_trait]
impl NotificationAdapter for LogNotifier {
    async fn deliver(&self, notification: &CrisisNotification) -> Result<(), LifelineError> {
        warn!(
            event_id = %notification.event_id,
            event_type = %notification.event_type,
            region = notification.region_code.as_ref().map(|r| r.as_str()).unwrap_or("unknown"),
            timestamp = %notification.timestamp,
            "crisis mode activated"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lifeline_core::{AuditEvent, AuditEventType};
    use tracing_test::traced_test;

    #[tokio::test]
    #[traced_test]
    async fn logs_crisis_event_fields() {
        let event = AuditEvent::new(
            AuditEventType::CrisisModeTriggeredByModeration,
            None,
            Some("AU".parse().unwrap()),
            true,
        );
        LogNotifier
            .deliver(&CrisisNotification::from(&event))
            .await
            .unwrap();

        assert!(logs_contain("crisis mode activated"));
        assert!(logs_contain("crisis_mode_triggered_by_moderation"));
        assert!(logs_contain("AU"));
    }
}

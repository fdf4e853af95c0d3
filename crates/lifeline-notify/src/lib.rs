// SPDX-FileCopyrightText: 2026 Lifeline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Operator notification relay for the Lifeline triage engine.
//!
//! The router hands crisis notifications to a [`RelayHandle`], which enqueues
//! them without waiting. A single worker task owns delivery: it applies the
//! per-attempt timeout, retries with exponential backoff, and drains the
//! queue on shutdown. Notifications carry no user content.

pub mod log;
pub mod relay;
pub mod webhook;

use std::sync::Arc;

use lifeline_config::model::NotifyConfig;
use lifeline_core::{LifelineError, NotificationAdapter};

pub use log::LogNotifier;
pub use relay::{NotificationPermit, NotificationRelay, RelayConfig, RelayHandle};
pub use webhook::WebhookNotifier;

/// Build the notifier selected by configuration.
///
/// A configured webhook URL selects [`WebhookNotifier`]; otherwise crisis
/// events are written to the log by [`LogNotifier`].
pub fn notifier_from_config(
    config: &NotifyConfig,
) -> Result<Arc<dyn NotificationAdapter>, LifelineError> {
    match &config.webhook_url {
        Some(url) => Ok(Arc::new(WebhookNotifier::new(url)?)),
        None => Ok(Arc::new(LogNotifier)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lifeline_core::PluginAdapter;

    #[test]
    fn no_webhook_selects_log_notifier() {
        let notifier = notifier_from_config(&NotifyConfig::default()).unwrap();
        assert_eq!(notifier.name(), "log");
    }

    #[test]
    fn webhook_url_selects_webhook_notifier() {
        let config = NotifyConfig {
            webhook_url: Some("https://ops.example.org/hook".into()),
            ..Default::default()
        };
        let notifier = notifier_from_config(&config).unwrap();
        assert_eq!(notifier.name(), "webhook");
    }

    #[test]
    fn malformed_webhook_url_is_rejected() {
        let config = NotifyConfig {
            webhook_url: Some("not a url".into()),
            ..Default::default()
        };
        assert!(notifier_from_config(&config).is_err());
    }
}

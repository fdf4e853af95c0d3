// SPDX-FileCopyrightText: 2026 Lifeline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Webhook notifier: POSTs the content-free notification as JSON.

use async_trait::async_trait;
use lifeline_core::{
    AdapterType, CrisisNotification, HealthStatus, LifelineError, NotificationAdapter,
    PluginAdapter,
};
use reqwest::Url;
use tracing::debug;

/// Delivers crisis notifications to an HTTP(S) webhook.
///
/// A single attempt per [`deliver`](NotificationAdapter::deliver) call. Timeout
/// and retry belong to the relay worker.
#[derive(Debug, Clone)]
pub struct WebhookNotifier {
    client: reqwest::Client,
    url: Url,
}

impl WebhookNotifier {
    /// Create a notifier for `url`. Only `http` and `https` are accepted.
    pub fn new(url: &str) -> Result<Self, LifelineError> {
        let url = Url::parse(url)
            .map_err(|e| LifelineError::Config(format!("invalid notify.webhook_url: {e}")))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(LifelineError::Config(format!(
                "notify.webhook_url must use http or https, got `{}`",
                url.scheme()
            )));
        }

        let client = reqwest::Client::builder()
            .build()
            .map_err(|e| LifelineError::Notification {
                message: format!("failed to build HTTP client: {e}"),
                source: Some(Box::new(e)),
            })?;

        Ok(Self { client, url })
    }
}

#[async_trait]
impl PluginAdapter for WebhookNotifier {
    fn name(&self) -> &str {
        "webhook"
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
impl NotificationAdapter for WebhookNotifier {
    async fn deliver(&self, notification: &CrisisNotification) -> Result<(), LifelineError> {
        let response = self
            .client
            .post(self.url.clone())
            .json(notification)
            .send()
            .await
            .map_err(|e| LifelineError::Notification {
                message: format!("webhook request failed: {e}"),
                source: Some(Box::new(e)),
            })?;

        let status = response.status();
        debug!(status = %status, event_id = %notification.event_id, "webhook responded");

        if status.is_success() {
            Ok(())
        } else {
            Err(LifelineError::Notification {
                message: format!("webhook returned {status}"),
                source: None,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lifeline_core::{AuditEvent, AuditEventType};
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn notification() -> CrisisNotification {
        let event = AuditEvent::new(
            AuditEventType::CrisisModeTriggered,
            Some(lifeline_core::RiskLevel::Emergency),
            Some("GB".parse().unwrap()),
            true,
        );
        CrisisNotification::from(&event)
    }

    #[tokio::test]
    async fn posts_metadata_only_json() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/hook"))
            .and(body_partial_json(serde_json::json!({
                "eventType": "crisis_mode_triggered",
                "regionCode": "GB"
            })))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&server)
            .await;

        let notifier = WebhookNotifier::new(&format!("{}/hook", server.uri())).unwrap();
        notifier.deliver(&notification()).await.unwrap();

        let requests = server.received_requests().await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&requests[0].body).unwrap();
        let mut keys: Vec<_> = body.as_object().unwrap().keys().cloned().collect();
        keys.sort();
        assert_eq!(keys, vec!["eventId", "eventType", "regionCode", "timestamp"]);
    }

    #[tokio::test]
    async fn non_success_status_is_an_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(502))
            .mount(&server)
            .await;

        let notifier = WebhookNotifier::new(&server.uri()).unwrap();
        let err = notifier.deliver(&notification()).await.unwrap_err();
        assert!(err.to_string().contains("502"), "got: {err}");
    }

    #[test]
    fn rejects_non_http_scheme() {
        assert!(WebhookNotifier::new("file:///etc/passwd").is_err());
    }
}

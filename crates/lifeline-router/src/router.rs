// SPDX-FileCopyrightText: 2026 Lifeline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Crisis router: the single entry point for questionnaire and chat traffic.
//!
//! Each call classifies or screens, writes the audit event, dispatches the
//! operator notification, and only then returns. The work runs on its own
//! task so a caller that goes away mid-request cannot cut a crisis decision
//! short of its audit row and notification.

use std::sync::Arc;
use std::time::Duration;

use lifeline_config::LifelineConfig;
use lifeline_core::{
    AuditEvent, AuditEventType, AuditSink, ChatMessage, ChatReply, CrisisNotification,
    LifelineError, RegionCode, RiskLevel, TriageAnswers, TriageResult,
};
use lifeline_notify::RelayHandle;
use tracing::{error, info};

use crate::classifier::classify_with_reason;
use crate::gateway::{GatewayOutcome, ModerationGateway};

/// Timeouts applied on the request path.
#[derive(Debug, Clone, Copy)]
pub struct RouterTimeouts {
    pub moderation: Duration,
    pub provider: Duration,
    pub audit_write: Duration,
}

impl From<&LifelineConfig> for RouterTimeouts {
    fn from(config: &LifelineConfig) -> Self {
        Self {
            moderation: Duration::from_millis(config.moderation.timeout_ms),
            provider: Duration::from_millis(config.provider.timeout_ms),
            audit_write: Duration::from_millis(config.audit.write_timeout_ms),
        }
    }
}

impl Default for RouterTimeouts {
    fn default() -> Self {
        Self::from(&LifelineConfig::default())
    }
}

/// Routes questionnaires and chat messages, recording every risk decision.
///
/// Cheap to clone; clones share the gateway, audit sink and relay.
#[derive(Clone)]
pub struct CrisisRouter {
    inner: Arc<RouterInner>,
}

struct RouterInner {
    gateway: ModerationGateway,
    audit: Arc<dyn AuditSink>,
    relay: Option<RelayHandle>,
    audit_timeout: Duration,
}

impl CrisisRouter {
    /// Create a router.
    ///
    /// With `relay` set to `None`, crisis events are still audited but no
    /// operator is notified, and `notified_owner` is recorded as `false`.
    pub fn new(
        gateway: ModerationGateway,
        audit: Arc<dyn AuditSink>,
        relay: Option<RelayHandle>,
        audit_timeout: Duration,
    ) -> Self {
        Self {
            inner: Arc::new(RouterInner {
                gateway,
                audit,
                relay,
                audit_timeout,
            }),
        }
    }

    /// Classify a questionnaire and record the outcome.
    ///
    /// EMERGENCY records `crisis_mode_triggered` and notifies an operator;
    /// URGENT and ROUTINE record `triage_completed`.
    pub async fn route_triage(&self, answers: TriageAnswers) -> Result<TriageResult, LifelineError> {
        let inner = Arc::clone(&self.inner);
        tokio::spawn(async move { inner.triage(answers).await })
            .await
            .map_err(|e| LifelineError::Internal(format!("triage task failed: {e}")))
    }

    /// Screen a chat message and produce the reply.
    ///
    /// A crisis signal records `crisis_mode_triggered_by_moderation` and
    /// notifies an operator; a soft block records `chat_message_blocked`.
    /// A pass records nothing. Invalid messages are rejected before screening.
    pub async fn route_chat(&self, message: ChatMessage) -> Result<ChatReply, LifelineError> {
        message.validate()?;
        let inner = Arc::clone(&self.inner);
        tokio::spawn(async move { inner.chat(message).await })
            .await
            .map_err(|e| LifelineError::Internal(format!("chat task failed: {e}")))
    }
}

impl RouterInner {
    async fn triage(&self, answers: TriageAnswers) -> TriageResult {
        let classification = classify_with_reason(&answers);
        let result = TriageResult::from_risk(classification.level, answers.region_code);
        let region = answers.region_code;

        info!(
            risk_level = %classification.level,
            reason = classification.reason,
            region = region_label(region),
            "triage classified"
        );
        lifeline_prometheus::record_triage(classification.level);

        match result {
            TriageResult::Crisis { .. } => {
                self.record_crisis(
                    AuditEventType::CrisisModeTriggered,
                    Some(RiskLevel::Emergency),
                    region,
                )
                .await;
            }
            TriageResult::Routed { risk_level, .. } => {
                self.write_audit(AuditEvent::new(
                    AuditEventType::TriageCompleted,
                    Some(risk_level),
                    region,
                    false,
                ))
                .await;
            }
        }

        result
    }

    async fn chat(&self, message: ChatMessage) -> ChatReply {
        let region = message.region_code;
        let verdict = self.gateway.screen(&message).await;
        let outcome = GatewayOutcome::for_verdict(&verdict);
        let reply = self.gateway.respond(&message, &verdict).await;
        drop(message);

        info!(
            outcome = outcome.as_str(),
            region = region_label(region),
            "chat routed"
        );
        lifeline_prometheus::record_chat(reply_label(&reply));

        match outcome {
            GatewayOutcome::CrisisBlock => {
                self.record_crisis(AuditEventType::CrisisModeTriggeredByModeration, None, region)
                    .await;
            }
            GatewayOutcome::SoftBlock => {
                self.write_audit(AuditEvent::new(
                    AuditEventType::ChatMessageBlocked,
                    None,
                    region,
                    false,
                ))
                .await;
            }
            GatewayOutcome::Pass => {}
        }

        reply
    }

    /// Audit a crisis event, then hand the notification to the relay.
    ///
    /// The queue slot is reserved first so `notified_owner` says whether a
    /// notification was actually queued.
    async fn record_crisis(
        &self,
        event_type: AuditEventType,
        risk_level: Option<RiskLevel>,
        region: Option<RegionCode>,
    ) {
        lifeline_prometheus::record_crisis(event_type);
        let permit = self.relay.as_ref().and_then(RelayHandle::reserve);
        let event = AuditEvent::new(event_type, risk_level, region, permit.is_some());
        let notification = CrisisNotification::from(&event);

        self.write_audit(event).await;

        if let Some(permit) = permit {
            permit.send(notification);
        }
    }

    /// Insert one audit row. Failures are logged and counted, never retried.
    ///
    /// The write runs on its own task: a panicking sink cannot take the
    /// notification down with it, and a timeout stops the wait, not the write.
    async fn write_audit(&self, event: AuditEvent) {
        let event_id = event.id();
        let event_type = event.event_type();

        let audit = Arc::clone(&self.audit);
        let write = tokio::spawn(async move { audit.record(event).await });

        let result = match tokio::time::timeout(self.audit_timeout, write).await {
            Ok(Ok(result)) => result.map(|_| ()),
            Ok(Err(e)) => Err(LifelineError::Internal(format!("audit write task failed: {e}"))),
            Err(_) => Err(LifelineError::Timeout {
                duration: self.audit_timeout,
            }),
        };

        if let Err(e) = result {
            error!(
                event_id = %event_id,
                event_type = %event_type,
                error = %e,
                "audit write failed"
            );
            lifeline_prometheus::record_audit_failure();
        }
    }
}

fn region_label(region: Option<RegionCode>) -> &'static str {
    match region {
        Some(code) => match code.as_str() {
            // Keeps the label set closed for log aggregation.
            "US" => "US",
            "CA" => "CA",
            "GB" => "GB",
            "IE" => "IE",
            "AU" => "AU",
            "NZ" => "NZ",
            _ => "other",
        },
        None => "unknown",
    }
}

fn reply_label(reply: &ChatReply) -> &'static str {
    match reply {
        ChatReply::Reply { .. } => "reply",
        ChatReply::Blocked { .. } => "blocked",
        ChatReply::Crisis { .. } => "crisis",
        ChatReply::Unavailable { .. } => "unavailable",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timeouts_follow_config() {
        let mut config = LifelineConfig::default();
        config.moderation.timeout_ms = 1200;
        config.audit.write_timeout_ms = 300;
        let t = RouterTimeouts::from(&config);
        assert_eq!(t.moderation, Duration::from_millis(1200));
        assert_eq!(t.provider, Duration::from_secs(30));
        assert_eq!(t.audit_write, Duration::from_millis(300));
    }

    #[test]
    fn region_labels_are_closed() {
        assert_eq!(region_label(None), "unknown");
        assert_eq!(region_label(Some("gb".parse().unwrap())), "GB");
        assert_eq!(region_label(Some("FR".parse().unwrap())), "other");
    }

    #[test]
    fn reply_labels() {
        assert_eq!(
            reply_label(&ChatReply::Unavailable {
                content: String::new()
            }),
            "unavailable"
        );
        assert_eq!(
            reply_label(&ChatReply::Crisis {
                content: String::new(),
                region_code: None
            }),
            "crisis"
        );
    }
}

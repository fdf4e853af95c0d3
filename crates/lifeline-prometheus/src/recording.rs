// SPDX-FileCopyrightText: 2026 Lifeline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Metric registration and recording helpers.
//!
//! Uses the metrics-rs facade so any recorder (Prometheus, statsd, etc.)
//! can collect these metrics. With no recorder installed every call is a no-op.
//! Labels are categorical only.

use lifeline_core::{AuditEventType, RiskLevel};
use metrics::describe_counter;

/// Register all Lifeline metric descriptions.
///
/// Called once at startup after the recorder is installed.
pub fn register_metrics() {
    describe_counter!(
        "lifeline_triage_total",
        "Questionnaire submissions classified, by risk level"
    );
    describe_counter!(
        "lifeline_chat_total",
        "Chat messages routed, by outcome (reply, blocked, crisis, unavailable)"
    );
    describe_counter!(
        "lifeline_crisis_activations_total",
        "Crisis mode activations, by source (triage, moderation)"
    );
    describe_counter!(
        "lifeline_moderation_failures_total",
        "Moderation calls that errored or timed out and failed closed"
    );
    describe_counter!(
        "lifeline_audit_write_failures_total",
        "Audit inserts that errored or timed out"
    );
    describe_counter!(
        "lifeline_notifications_total",
        "Operator notifications, by result (delivered, failed, dropped)"
    );
}

/// Record a classified questionnaire.
pub fn record_triage(level: RiskLevel) {
    metrics::counter!("lifeline_triage_total", "risk_level" => level.to_string()).increment(1);
}

/// Record a routed chat message by outcome label.
pub fn record_chat(outcome: &'static str) {
    metrics::counter!("lifeline_chat_total", "outcome" => outcome).increment(1);
}

/// Record a crisis mode activation.
pub fn record_crisis(event_type: AuditEventType) {
    let source = match event_type {
        AuditEventType::CrisisModeTriggeredByModeration => "moderation",
        _ => "triage",
    };
    metrics::counter!("lifeline_crisis_activations_total", "source" => source).increment(1);
}

/// Record a moderation call that failed closed.
pub fn record_moderation_failure() {
    metrics::counter!("lifeline_moderation_failures_total").increment(1);
}

/// Record a failed audit insert.
pub fn record_audit_failure() {
    metrics::counter!("lifeline_audit_write_failures_total").increment(1);
}

/// Record a notification outcome (`delivered`, `failed`, `dropped`).
pub fn record_notification(result: &'static str) {
    metrics::counter!("lifeline_notifications_total", "result" => result).increment(1);
}

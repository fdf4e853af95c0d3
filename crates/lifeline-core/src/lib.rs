// SPDX-FileCopyrightText: 2026 Lifeline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the Lifeline triage engine.
//!
//! This crate provides the domain types, the audit event model, the error
//! type, and the adapter traits used throughout the Lifeline workspace. All
//! external capabilities (moderation, AI, audit storage, notification)
//! implement traits defined here.

pub mod audit;
pub mod error;
pub mod resources;
pub mod traits;
pub mod types;

// Re-export key items at crate root for ergonomic imports.
pub use audit::{AuditEvent, AuditEventId, AuditEventType, AuditSummary, CrisisNotification};
pub use error::LifelineError;
pub use resources::{CrisisResources, crisis_resources};
pub use types::{
    AdapterType, ChatMessage, ChatReply, ChatRole, HealthStatus, ModerationVerdict, RegionCode,
    RiskLevel, TriageAnswers, TriageResult,
};

// Re-export all adapter traits at crate root.
pub use traits::{
    AuditQuery, AuditSink, ModerationAdapter, NotificationAdapter, PluginAdapter,
    ProviderAdapter,
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lifeline_error_has_all_variants() {
        let _config = LifelineError::Config("test".into());
        let _validation = LifelineError::Validation("test".into());
        let _storage = LifelineError::storage(std::io::Error::other("test"));
        let _moderation = LifelineError::Moderation {
            message: "test".into(),
            source: None,
        };
        let _provider = LifelineError::Provider {
            message: "test".into(),
            source: None,
        };
        let _notification = LifelineError::Notification {
            message: "test".into(),
            source: None,
        };
        let _timeout = LifelineError::Timeout {
            duration: std::time::Duration::from_secs(3),
        };
        let _internal = LifelineError::Internal("test".into());
    }

    #[test]
    fn adapter_type_has_four_variants() {
        use std::str::FromStr;

        let variants = [
            AdapterType::Moderation,
            AdapterType::Provider,
            AdapterType::Audit,
            AdapterType::Notification,
        ];

        for variant in &variants {
            let s = variant.to_string();
            let parsed = AdapterType::from_str(&s).expect("should parse back");
            assert_eq!(*variant, parsed);
        }
    }

    #[test]
    fn health_status_variants() {
        let healthy = HealthStatus::Healthy;
        let degraded = HealthStatus::Degraded("slow".into());
        let unhealthy = HealthStatus::Unhealthy("down".into());

        assert_eq!(healthy, HealthStatus::Healthy);
        assert_ne!(degraded, healthy);
        assert_ne!(unhealthy, healthy);
    }

    #[test]
    fn all_trait_modules_are_exported() {
        // Fails to compile if any adapter trait is missing from the public API.
        fn _assert_plugin_adapter<T: PluginAdapter>() {}
        fn _assert_moderation_adapter<T: ModerationAdapter>() {}
        fn _assert_provider_adapter<T: ProviderAdapter>() {}
        fn _assert_audit_sink<T: AuditSink>() {}
        fn _assert_audit_query<T: AuditQuery>() {}
        fn _assert_notification_adapter<T: NotificationAdapter>() {}
    }

    #[test]
    fn traits_are_object_safe() {
        fn _dyn(
            _: Option<std::sync::Arc<dyn ModerationAdapter>>,
            _: Option<std::sync::Arc<dyn ProviderAdapter>>,
            _: Option<std::sync::Arc<dyn AuditSink>>,
            _: Option<std::sync::Arc<dyn AuditQuery>>,
            _: Option<std::sync::Arc<dyn NotificationAdapter>>,
        ) {
        }
    }
}

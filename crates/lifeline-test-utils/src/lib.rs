// SPDX-FileCopyrightText: 2026 Lifeline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test utilities for Lifeline integration tests.
//!
//! Provides mock adapters and test harness infrastructure for fast,
//! deterministic, CI-runnable tests without external services.
//!
//! # Components
//!
//! - [`MockModeration`] - Scripted moderation verdicts, failures and hangs
//! - [`MockProvider`] - Mock AI provider with pre-configured responses and a call counter
//! - [`MemoryAuditSink`] - In-memory audit log that can be told to fail, stall or panic
//! - [`RecordingNotifier`] - Captures operator notifications
//! - [`TestHarness`] - A wired crisis router over a temp SQLite audit log

/// Implements [`lifeline_core::PluginAdapter`] for a mock with a fixed name.
macro_rules! mock_plugin {
    ($ty:ty, $name:expr, $kind:expr) => {
        #[async_trait::async_trait]
        impl lifeline_core::PluginAdapter for $ty {
            fn name(&self) -> &str {
                $name
            }

            fn version(&self) -> semver::Version {
                semver::Version::new(0, 1, 0)
            }

            fn adapter_type(&self) -> lifeline_core::AdapterType {
                $kind
            }

            async fn health_check(
                &self,
            ) -> Result<lifeline_core::HealthStatus, lifeline_core::LifelineError> {
                Ok(lifeline_core::HealthStatus::Healthy)
            }

            async fn shutdown(&self) -> Result<(), lifeline_core::LifelineError> {
                Ok(())
            }
        }
    };
}

pub(crate) use mock_plugin;

pub mod harness;
pub mod mock_audit;
pub mod mock_moderation;
pub mod mock_notifier;
pub mod mock_provider;

pub use harness::{TestHarness, TestHarnessBuilder};
pub use mock_audit::{AuditBehaviour, MemoryAuditSink};
pub use mock_moderation::MockModeration;
pub use mock_notifier::RecordingNotifier;
pub use mock_provider::MockProvider;

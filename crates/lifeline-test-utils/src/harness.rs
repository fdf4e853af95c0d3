// SPDX-FileCopyrightText: 2026 Lifeline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test harness for end-to-end routing tests.
//!
//! `TestHarness` wires a complete crisis router with mock moderation, mock
//! AI provider, a recording notifier behind a real relay, and a temp SQLite
//! audit log. A [`MemoryAuditSink`] can replace the SQLite log to inject
//! audit faults.

use std::sync::Arc;
use std::time::Duration;

use lifeline_config::model::StorageConfig;
use lifeline_core::{
    AuditQuery, AuditSink, AuditSummary, ChatMessage, ChatReply, LifelineError, TriageAnswers,
    TriageResult,
};
use lifeline_notify::{NotificationRelay, RelayConfig};
use lifeline_router::{CrisisRouter, ModerationGateway, RouterTimeouts};
use lifeline_storage::SqliteAuditStore;
use tokio_util::sync::CancellationToken;

use crate::mock_audit::MemoryAuditSink;
use crate::mock_moderation::MockModeration;
use crate::mock_notifier::RecordingNotifier;
use crate::mock_provider::MockProvider;

/// Builder for creating test environments with configurable options.
pub struct TestHarnessBuilder {
    moderation: MockModeration,
    provider: MockProvider,
    notifier: RecordingNotifier,
    memory_audit: Option<MemoryAuditSink>,
    notifications: bool,
    timeouts: RouterTimeouts,
}

impl TestHarnessBuilder {
    fn new() -> Self {
        Self {
            moderation: MockModeration::allowing(),
            provider: MockProvider::new(),
            notifier: RecordingNotifier::new(),
            memory_audit: None,
            notifications: true,
            timeouts: RouterTimeouts {
                moderation: Duration::from_millis(200),
                provider: Duration::from_millis(200),
                audit_write: Duration::from_millis(500),
            },
        }
    }

    /// Use this moderation script.
    pub fn with_moderation(mut self, moderation: MockModeration) -> Self {
        self.moderation = moderation;
        self
    }

    /// Use this provider.
    pub fn with_provider(mut self, provider: MockProvider) -> Self {
        self.provider = provider;
        self
    }

    /// Set mock provider responses.
    pub fn with_mock_responses(mut self, responses: Vec<String>) -> Self {
        self.provider = MockProvider::with_responses(responses);
        self
    }

    /// Use this notifier behind the relay.
    pub fn with_notifier(mut self, notifier: RecordingNotifier) -> Self {
        self.notifier = notifier;
        self
    }

    /// Replace the SQLite audit log with an in-memory sink.
    pub fn with_memory_audit(mut self, sink: MemoryAuditSink) -> Self {
        self.memory_audit = Some(sink);
        self
    }

    /// Build the router without a notification relay.
    pub fn without_notifications(mut self) -> Self {
        self.notifications = false;
        self
    }

    /// Override router timeouts.
    pub fn with_timeouts(mut self, timeouts: RouterTimeouts) -> Self {
        self.timeouts = timeouts;
        self
    }

    /// Build the test harness, creating all required subsystems.
    pub async fn build(self) -> Result<TestHarness, LifelineError> {
        let temp_dir = tempfile::TempDir::new().map_err(LifelineError::storage)?;

        let memory_audit = self.memory_audit.map(Arc::new);
        let (audit, audit_query, sqlite): (Arc<dyn AuditSink>, Arc<dyn AuditQuery>, _) =
            match &memory_audit {
                Some(sink) => {
                    let audit: Arc<dyn AuditSink> = sink.clone();
                    let query: Arc<dyn AuditQuery> = sink.clone();
                    (audit, query, None)
                }
                None => {
                    let db_path = temp_dir.path().join("audit.db");
                    let store = SqliteAuditStore::new(StorageConfig {
                        database_path: db_path.to_string_lossy().into_owned(),
                        wal_mode: true,
                    });
                    store.initialize().await?;
                    let store = Arc::new(store);
                    let audit: Arc<dyn AuditSink> = store.clone();
                    let query: Arc<dyn AuditQuery> = store.clone();
                    (audit, query, Some(store))
                }
            };

        let moderation = Arc::new(self.moderation);
        let provider = Arc::new(self.provider);
        let notifier = Arc::new(self.notifier);
        let shutdown = CancellationToken::new();

        let (relay_handle, relay) = if self.notifications {
            let config = RelayConfig {
                queue_capacity: 1024,
                max_attempts: 2,
                initial_backoff: Duration::from_millis(1),
                timeout: Duration::from_millis(200),
            };
            let (handle, relay) =
                NotificationRelay::spawn(notifier.clone(), config, shutdown.clone());
            (Some(handle), Some(relay))
        } else {
            (None, None)
        };

        let gateway = ModerationGateway::new(
            moderation.clone(),
            provider.clone(),
            self.timeouts.moderation,
            self.timeouts.provider,
        );
        let router = CrisisRouter::new(gateway, audit, relay_handle, self.timeouts.audit_write);

        Ok(TestHarness {
            router,
            moderation,
            provider,
            notifier,
            audit_query,
            sqlite,
            memory_audit,
            relay,
            shutdown,
            _temp_dir: temp_dir,
        })
    }
}

/// A complete routing environment with mock adapters and temp storage.
pub struct TestHarness {
    /// The crisis router under test.
    pub router: CrisisRouter,
    /// The scripted moderation adapter.
    pub moderation: Arc<MockModeration>,
    /// The mock AI provider.
    pub provider: Arc<MockProvider>,
    /// The notifier behind the relay.
    pub notifier: Arc<RecordingNotifier>,
    /// Aggregate view over whichever audit sink is in use.
    pub audit_query: Arc<dyn AuditQuery>,
    /// The SQLite audit log, unless replaced by a memory sink.
    pub sqlite: Option<Arc<SqliteAuditStore>>,
    /// The in-memory audit log, when one replaced SQLite.
    pub memory_audit: Option<Arc<MemoryAuditSink>>,
    relay: Option<NotificationRelay>,
    shutdown: CancellationToken,
    /// Temp directory kept alive for cleanup on drop.
    _temp_dir: tempfile::TempDir,
}

impl TestHarness {
    /// Create a new builder for configuring the test harness.
    pub fn builder() -> TestHarnessBuilder {
        TestHarnessBuilder::new()
    }

    /// Route a questionnaire.
    pub async fn triage(&self, answers: TriageAnswers) -> Result<TriageResult, LifelineError> {
        self.router.route_triage(answers).await
    }

    /// Route a user chat message.
    pub async fn chat(&self, text: &str) -> Result<ChatReply, LifelineError> {
        self.router.route_chat(ChatMessage::user(text)).await
    }

    /// Aggregate counts over everything recorded so far.
    pub async fn audit_summary(&self) -> Result<AuditSummary, LifelineError> {
        self.audit_query.summary(None).await
    }

    /// Stop the relay while keeping the router, so later crisis events
    /// find the queue closed.
    pub async fn stop_notifications(&mut self) -> Result<(), LifelineError> {
        self.shutdown.cancel();
        if let Some(relay) = self.relay.take() {
            relay.join().await?;
        }
        Ok(())
    }

    /// Stop the relay after it has drained its queue.
    pub async fn shutdown(mut self) -> Result<Arc<RecordingNotifier>, LifelineError> {
        self.stop_notifications().await?;
        Ok(self.notifier.clone())
    }
}

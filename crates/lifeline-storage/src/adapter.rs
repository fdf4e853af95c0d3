// SPDX-FileCopyrightText: 2026 Lifeline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite implementation of the audit sink and audit query traits.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::OnceCell;
use tracing::debug;

use lifeline_config::model::StorageConfig;
use lifeline_core::audit::assert_event_fields_minimized;
use lifeline_core::{
    AdapterType, AuditEvent, AuditEventId, AuditQuery, AuditSink, AuditSummary, HealthStatus,
    LifelineError, PluginAdapter,
};

use crate::database::{Database, map_tr_err};
use crate::queries;

/// SQLite-backed audit log.
///
/// Wraps a [`Database`] handle and delegates to the typed query module. The
/// database is opened by [`SqliteAuditStore::initialize`]; every other call
/// fails until then.
pub struct SqliteAuditStore {
    config: StorageConfig,
    db: OnceCell<Database>,
}

impl SqliteAuditStore {
    /// Create a store for the configured path. Nothing is opened yet.
    pub fn new(config: StorageConfig) -> Self {
        Self {
            config,
            db: OnceCell::new(),
        }
    }

    /// Open the database and run migrations.
    pub async fn initialize(&self) -> Result<(), LifelineError> {
        let db = Database::open(&self.config.database_path, self.config.wal_mode).await?;
        self.db.set(db).map_err(|_| LifelineError::Storage {
            source: "audit store already initialized".into(),
        })?;
        debug!(path = %self.config.database_path, "audit store initialized");
        Ok(())
    }

    /// Checkpoint the WAL. The connection stays usable.
    pub async fn close(&self) -> Result<(), LifelineError> {
        self.db()?.checkpoint().await?;
        debug!("WAL checkpoint complete");
        Ok(())
    }

    /// Total number of recorded events.
    pub async fn count(&self) -> Result<u64, LifelineError> {
        queries::audit::count_events(self.db()?).await
    }

    fn db(&self) -> Result<&Database, LifelineError> {
        self.db.get().ok_or_else(|| LifelineError::Storage {
            source: "audit store not initialized -- call initialize() first".into(),
        })
    }
}

#[async_trait]
impl PluginAdapter for SqliteAuditStore {
    fn name(&self) -> &str {
        "sqlite"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Audit
    }

    async fn health_check(&self) -> Result<HealthStatus, LifelineError> {
        let db = self.db()?;
        db.connection()
            .call(|conn| -> Result<(), rusqlite::Error> {
                conn.execute_batch("SELECT 1;")?;
                Ok(())
            })
            .await
            .map_err(map_tr_err)?;
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), LifelineError> {
        if let Some(db) = self.db.get() {
            db.checkpoint().await?;
            debug!("shutdown: WAL checkpoint complete");
        }
        Ok(())
    }
}

#[async_trait]
impl AuditSink for SqliteAuditStore {
    async fn record(&self, event: AuditEvent) -> Result<AuditEventId, LifelineError> {
        assert_event_fields_minimized(&event);
        queries::audit::insert_event(self.db()?, &event).await?;
        Ok(event.id())
    }
}

#[async_trait]
impl AuditQuery for SqliteAuditStore {
    async fn summary(&self, since: Option<DateTime<Utc>>) -> Result<AuditSummary, LifelineError> {
        queries::audit::summary(self.db()?, since).await
    }
}

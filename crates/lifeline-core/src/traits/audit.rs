// SPDX-FileCopyrightText: 2026 Lifeline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Audit sink and query traits.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::audit::{AuditEvent, AuditEventId, AuditSummary};
use crate::error::LifelineError;
use crate::traits::adapter::PluginAdapter;

/// Append-only destination for audit events.
///
/// There is no update or delete: once recorded, an event is immutable.
#[async_trait]
pub trait AuditSink: PluginAdapter {
    /// Appends one event and returns its id.
    async fn record(&self, event: AuditEvent) -> Result<AuditEventId, LifelineError>;
}

/// Aggregate-only read access to the audit log.
#[async_trait]
pub trait AuditQuery: Send + Sync {
    /// Counts events at or after `since` (all events when `None`).
    async fn summary(&self, since: Option<DateTime<Utc>>) -> Result<AuditSummary, LifelineError>;
}

// SPDX-FileCopyrightText: 2026 Lifeline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! In-memory audit sink with injectable faults.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::Mutex;

use lifeline_core::{
    AdapterType, AuditEvent, AuditEventId, AuditQuery, AuditSink, AuditSummary, LifelineError,
};

/// How [`MemoryAuditSink::record`] behaves.
#[derive(Debug, Clone, Copy, Default)]
pub enum AuditBehaviour {
    /// Store the event.
    #[default]
    Store,
    /// Return a storage error.
    Fail,
    /// Sleep before storing; longer than the router's write timeout means
    /// the write is abandoned.
    Stall(Duration),
    /// Panic inside the write.
    Panic,
}

/// Audit sink backed by a `Vec`.
#[derive(Default)]
pub struct MemoryAuditSink {
    events: Mutex<Vec<AuditEvent>>,
    behaviour: AuditBehaviour,
}

impl MemoryAuditSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_behaviour(behaviour: AuditBehaviour) -> Self {
        Self {
            events: Mutex::new(Vec::new()),
            behaviour,
        }
    }

    /// Snapshot of stored events, in insertion order.
    pub async fn events(&self) -> Vec<AuditEvent> {
        self.events.lock().await.clone()
    }
}

crate::mock_plugin!(MemoryAuditSink, "memory-audit", AdapterType::Audit);

#[async_trait]
impl AuditSink for MemoryAuditSink {
    async fn record(&self, event: AuditEvent) -> Result<AuditEventId, LifelineError> {
        match self.behaviour {
            AuditBehaviour::Store => {}
            AuditBehaviour::Fail => {
                return Err(LifelineError::Storage {
                    source: "mock audit failure".into(),
                });
            }
            AuditBehaviour::Stall(delay) => tokio::time::sleep(delay).await,
            AuditBehaviour::Panic => panic!("mock audit sink panicked"),
        }
        let id = event.id();
        self.events.lock().await.push(event);
        Ok(id)
    }
}

#[async_trait]
impl AuditQuery for MemoryAuditSink {
    async fn summary(&self, since: Option<DateTime<Utc>>) -> Result<AuditSummary, LifelineError> {
        let events = self.events.lock().await;
        Ok(AuditSummary::tally(events.iter(), since))
    }
}

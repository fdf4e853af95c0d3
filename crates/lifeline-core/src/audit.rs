// SPDX-FileCopyrightText: 2026 Lifeline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Minimized audit records and the aggregate view built from them.
//!
//! An [`AuditEvent`] records *that* a routing decision happened, never *what*
//! the person said or answered. Every field type implements [`Minimized`], a
//! sealed marker that no text-bearing type implements; adding a `String`
//! field to the event is a compile error in [`assert_event_fields_minimized`].

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use uuid::Uuid;

use crate::types::{RegionCode, RiskLevel};

mod sealed {
    pub trait Sealed {}
}

/// Field types allowed in an audit event: identifiers, enums, timestamps, flags.
pub trait Minimized: sealed::Sealed {}

macro_rules! minimized {
    ($($ty:ty),* $(,)?) => {
        $(
            impl sealed::Sealed for $ty {}
            impl Minimized for $ty {}
        )*
    };
}

minimized!(
    AuditEventId,
    AuditEventType,
    RiskLevel,
    RegionCode,
    DateTime<Utc>,
    bool,
);

impl<T: Minimized> sealed::Sealed for Option<T> {}
impl<T: Minimized> Minimized for Option<T> {}

/// Unique identifier of an audit row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AuditEventId(pub Uuid);

impl AuditEventId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for AuditEventId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for AuditEventId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// What kind of routing decision an audit row records.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Display,
    EnumString,
    Serialize,
    Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum AuditEventType {
    /// Questionnaire classified as URGENT or ROUTINE.
    TriageCompleted,
    /// Questionnaire classified as EMERGENCY.
    CrisisModeTriggered,
    /// Chat message carried a moderation crisis signal.
    CrisisModeTriggeredByModeration,
    /// Chat message disallowed by moderation (or moderation unavailable).
    ChatMessageBlocked,
}

impl AuditEventType {
    /// Crisis events are the ones that page an operator.
    pub fn is_crisis(&self) -> bool {
        matches!(
            self,
            AuditEventType::CrisisModeTriggered | AuditEventType::CrisisModeTriggeredByModeration
        )
    }
}

/// An append-only, content-free record of one routing decision.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditEvent {
    id: AuditEventId,
    event_type: AuditEventType,
    risk_level: Option<RiskLevel>,
    region_code: Option<RegionCode>,
    created_at: DateTime<Utc>,
    notified_owner: bool,
}

impl AuditEvent {
    /// Create a new event stamped with a fresh id and the current time.
    pub fn new(
        event_type: AuditEventType,
        risk_level: Option<RiskLevel>,
        region_code: Option<RegionCode>,
        notified_owner: bool,
    ) -> Self {
        Self {
            id: AuditEventId::new(),
            event_type,
            risk_level,
            region_code,
            created_at: Utc::now(),
            notified_owner,
        }
    }

    /// Rebuild an event read back from storage.
    pub fn from_parts(
        id: AuditEventId,
        event_type: AuditEventType,
        risk_level: Option<RiskLevel>,
        region_code: Option<RegionCode>,
        created_at: DateTime<Utc>,
        notified_owner: bool,
    ) -> Self {
        Self {
            id,
            event_type,
            risk_level,
            region_code,
            created_at,
            notified_owner,
        }
    }

    pub fn id(&self) -> AuditEventId {
        self.id
    }

    pub fn event_type(&self) -> AuditEventType {
        self.event_type
    }

    pub fn risk_level(&self) -> Option<RiskLevel> {
        self.risk_level
    }

    pub fn region_code(&self) -> Option<RegionCode> {
        self.region_code
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn notified_owner(&self) -> bool {
        self.notified_owner
    }
}

fn minimized<T: Minimized>(_: &T) {}

/// Compile-time guard: every field of [`AuditEvent`] must be [`Minimized`].
///
/// The exhaustive destructure fails to compile when a field is added, and the
/// `minimized` calls fail when the new field's type can hold free text.
pub fn assert_event_fields_minimized(event: &AuditEvent) {
    let AuditEvent {
        id,
        event_type,
        risk_level,
        region_code,
        created_at,
        notified_owner,
    } = event;
    minimized(id);
    minimized(event_type);
    minimized(risk_level);
    minimized(region_code);
    minimized(created_at);
    minimized(notified_owner);
}

/// Aggregate counts over audit events. Never contains individual rows.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditSummary {
    /// Lower time bound applied, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub since: Option<DateTime<Utc>>,
    pub total: u64,
    pub by_event_type: BTreeMap<AuditEventType, u64>,
    pub by_risk_level: BTreeMap<RiskLevel, u64>,
    pub by_region: BTreeMap<RegionCode, u64>,
}

impl AuditSummary {
    /// Tally events at or after `since`.
    pub fn tally<'a, I>(events: I, since: Option<DateTime<Utc>>) -> Self
    where
        I: IntoIterator<Item = &'a AuditEvent>,
    {
        let mut summary = AuditSummary {
            since,
            ..Default::default()
        };
        for event in events {
            if since.is_some_and(|s| event.created_at < s) {
                continue;
            }
            summary.add(event);
        }
        summary
    }

    fn add(&mut self, event: &AuditEvent) {
        self.total += 1;
        *self.by_event_type.entry(event.event_type).or_default() += 1;
        if let Some(level) = event.risk_level {
            *self.by_risk_level.entry(level).or_default() += 1;
        }
        if let Some(region) = event.region_code {
            *self.by_region.entry(region).or_default() += 1;
        }
    }
}

/// Content-free signal sent to a human operator when crisis mode activates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CrisisNotification {
    pub event_id: AuditEventId,
    pub event_type: AuditEventType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub region_code: Option<RegionCode>,
    pub timestamp: DateTime<Utc>,
}

impl From<&AuditEvent> for CrisisNotification {
    fn from(event: &AuditEvent) -> Self {
        Self {
            event_id: event.id,
            event_type: event.event_type,
            region_code: event.region_code,
            timestamp: event.created_at,
        }
    }
}

// SPDX-FileCopyrightText: 2026 Lifeline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Audit event inserts and aggregate reads.
//!
//! Timestamps are stored as fixed-width RFC 3339 UTC strings with
//! microseconds, so `created_at >= ?` compares correctly as text.

use chrono::{DateTime, SecondsFormat, Utc};
use lifeline_core::{
    AuditEvent, AuditEventType, AuditSummary, LifelineError, RegionCode, RiskLevel,
};
use rusqlite::params;

use crate::database::{Database, map_tr_err};

fn format_ts(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Append one event.
pub async fn insert_event(db: &Database, event: &AuditEvent) -> Result<(), LifelineError> {
    let id = event.id().to_string();
    let event_type = event.event_type().to_string();
    let risk_level = event.risk_level().map(|l| l.to_string());
    let region_code = event.region_code().map(String::from);
    let created_at = format_ts(event.created_at());
    let notified_owner = event.notified_owner();

    db.connection()
        .call(move |conn| -> Result<(), rusqlite::Error> {
            conn.execute(
                "INSERT INTO audit_events (id, event_type, risk_level, region_code, created_at, notified_owner)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![id, event_type, risk_level, region_code, created_at, notified_owner],
            )?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)
}

/// Count events at or after `since`, grouped by type, risk level and region.
pub async fn summary(
    db: &Database,
    since: Option<DateTime<Utc>>,
) -> Result<AuditSummary, LifelineError> {
    let lower = since.map(format_ts);

    let rows = db
        .connection()
        .call(move |conn| -> Result<Vec<GroupRow>, rusqlite::Error> {
            let mut stmt = conn.prepare(
                "SELECT event_type, risk_level, region_code, COUNT(*)
                 FROM audit_events
                 WHERE ?1 IS NULL OR created_at >= ?1
                 GROUP BY event_type, risk_level, region_code",
            )?;
            let rows = stmt.query_map(params![lower], |row| {
                Ok(GroupRow {
                    event_type: row.get(0)?,
                    risk_level: row.get(1)?,
                    region_code: row.get(2)?,
                    count: row.get(3)?,
                })
            })?;
            let rows: Result<Vec<_>, _> = rows.collect();
            rows
        })
        .await
        .map_err(map_tr_err)?;

    let mut summary = AuditSummary {
        since,
        ..Default::default()
    };
    for row in rows {
        let count = row.count as u64;
        let event_type: AuditEventType = row.event_type.parse().map_err(LifelineError::storage)?;
        summary.total += count;
        *summary.by_event_type.entry(event_type).or_default() += count;
        if let Some(level) = row.risk_level {
            let level: RiskLevel = level.parse().map_err(LifelineError::storage)?;
            *summary.by_risk_level.entry(level).or_default() += count;
        }
        if let Some(region) = row.region_code {
            let region: RegionCode = region.parse()?;
            *summary.by_region.entry(region).or_default() += count;
        }
    }
    Ok(summary)
}

/// Total number of rows, regardless of age.
pub async fn count_events(db: &Database) -> Result<u64, LifelineError> {
    db.connection()
        .call(|conn| -> Result<i64, rusqlite::Error> {
            conn.query_row("SELECT COUNT(*) FROM audit_events", [], |row| row.get(0))
        })
        .await
        .map_err(map_tr_err)
        .map(|n| n as u64)
}

struct GroupRow {
    event_type: String,
    risk_level: Option<String>,
    region_code: Option<String>,
    count: i64,
}

// SPDX-FileCopyrightText: 2026 Lifeline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `lifeline audit` command implementation.

use chrono::{DateTime, Utc};
use lifeline_config::LifelineConfig;
use lifeline_core::{AuditQuery, LifelineError};
use lifeline_storage::SqliteAuditStore;

/// Print aggregate audit counts as JSON.
pub async fn run_summary(config: &LifelineConfig, since: Option<&str>) -> Result<(), LifelineError> {
    let since = parse_since(since)?;

    let store = SqliteAuditStore::new(config.storage.clone());
    store.initialize().await?;
    let summary = store.summary(since).await;
    store.close().await?;
    let summary = summary?;

    let rendered = serde_json::to_string_pretty(&summary)
        .map_err(|e| LifelineError::Internal(format!("failed to render summary: {e}")))?;
    println!("{rendered}");
    Ok(())
}

fn parse_since(since: Option<&str>) -> Result<Option<DateTime<Utc>>, LifelineError> {
    since
        .map(|s| {
            DateTime::parse_from_rfc3339(s)
                .map(|ts| ts.with_timezone(&Utc))
                .map_err(|e| {
                    LifelineError::Validation(format!("--since must be an RFC 3339 timestamp: {e}"))
                })
        })
        .transpose()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn since_is_optional() {
        assert_eq!(parse_since(None).unwrap(), None);
    }

    #[test]
    fn since_offset_is_normalised_to_utc() {
        let ts = parse_since(Some("2026-03-01T12:00:00+02:00")).unwrap().unwrap();
        assert_eq!(ts.to_rfc3339(), "2026-03-01T10:00:00+00:00");
    }

    #[test]
    fn since_rejects_garbage() {
        assert!(matches!(
            parse_since(Some("last tuesday")),
            Err(LifelineError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn summary_over_fresh_database() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = LifelineConfig::default();
        config.storage.database_path = dir.path().join("audit.db").to_string_lossy().into_owned();
        run_summary(&config, None).await.unwrap();
        assert!(dir.path().join("audit.db").exists());
    }
}

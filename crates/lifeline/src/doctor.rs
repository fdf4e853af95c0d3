// SPDX-FileCopyrightText: 2026 Lifeline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `lifeline doctor` command implementation.
//!
//! Runs diagnostic checks against the Lifeline environment to find
//! configuration gaps, an unreadable audit log, or a gateway that is not
//! answering.

use std::io::IsTerminal;
use std::path::Path;
use std::time::{Duration, Instant};

use lifeline_config::model::LifelineConfig;
use lifeline_core::LifelineError;

/// Status of a diagnostic check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckStatus {
    /// Check passed successfully.
    Pass,
    /// Check passed with a warning.
    Warn,
    /// Check failed.
    Fail,
}

/// Result of a single diagnostic check.
#[derive(Debug, Clone)]
pub struct CheckResult {
    /// Name of the check.
    pub name: String,
    /// Check status.
    pub status: CheckStatus,
    /// Human-readable message.
    pub message: String,
    /// Duration the check took.
    pub duration: Duration,
}

impl CheckResult {
    fn new(name: &str, status: CheckStatus, message: impl Into<String>, start: Instant) -> Self {
        Self {
            name: name.to_string(),
            status,
            message: message.into(),
            duration: start.elapsed(),
        }
    }
}

/// Run the `lifeline doctor` command.
///
/// With `deep`, also runs the SQLite integrity and append-only checks.
pub async fn run_doctor(
    config: &LifelineConfig,
    config_path: Option<&Path>,
    deep: bool,
    plain: bool,
) -> Result<(), LifelineError> {
    let use_color = !plain && std::io::stdout().is_terminal();
    let mut results = vec![
        check_config(config_path),
        check_database(&config.storage.database_path).await,
        check_api_key(
            "Moderation key",
            config.moderation.api_key.is_some(),
            "OPENAI_API_KEY",
        ),
        check_api_key(
            "AI provider key",
            config.provider.api_key.is_some(),
            "ANTHROPIC_API_KEY",
        ),
        check_gateway_auth(config),
        check_notifier(config),
        check_health_endpoint(config).await,
    ];

    if deep {
        results.push(check_db_integrity(&config.storage.database_path).await);
        results.push(check_append_only(&config.storage.database_path).await);
    }

    println!();
    println!("  lifeline doctor");
    println!("  {}", "-".repeat(50));

    for result in &results {
        println!("{}", render_line(result, use_color));
    }

    println!();

    let issues = results
        .iter()
        .filter(|r| r.status != CheckStatus::Pass)
        .count();
    if issues > 0 {
        let issue_word = if issues == 1 { "issue" } else { "issues" };
        println!("  {issues} {issue_word} found.");
        if !deep {
            println!("  Run with --deep for detailed diagnostics.");
        }
    } else {
        println!("  All checks passed.");
    }

    println!();

    Ok(())
}

fn render_line(result: &CheckResult, use_color: bool) -> String {
    use colored::Colorize;

    let duration_ms = result.duration.as_millis();
    let (symbol, message) = if use_color {
        match result.status {
            CheckStatus::Pass => ("✓".green().to_string(), result.message.clone()),
            CheckStatus::Warn => ("!".yellow().to_string(), result.message.yellow().to_string()),
            CheckStatus::Fail => ("✗".red().to_string(), result.message.red().to_string()),
        }
    } else {
        let label = match result.status {
            CheckStatus::Pass => "[OK]  ",
            CheckStatus::Warn => "[WARN]",
            CheckStatus::Fail => "[FAIL]",
        };
        (label.to_string(), result.message.clone())
    };
    format!(
        "    {symbol} {:<20} {message} ({duration_ms}ms)",
        result.name
    )
}

/// Check configuration loads without errors.
fn check_config(path: Option<&Path>) -> CheckResult {
    let start = Instant::now();
    let loaded = match path {
        Some(path) => lifeline_config::load_and_validate_path(path),
        None => lifeline_config::load_and_validate(),
    };
    match loaded {
        Ok(_) => CheckResult::new("Configuration", CheckStatus::Pass, "valid", start),
        Err(errors) => CheckResult::new(
            "Configuration",
            CheckStatus::Fail,
            format!("{} error(s)", errors.len()),
            start,
        ),
    }
}

/// Check the audit database exists and can be queried.
async fn check_database(db_path: &str) -> CheckResult {
    let start = Instant::now();

    if !Path::new(db_path).exists() {
        return CheckResult::new(
            "Audit log",
            CheckStatus::Warn,
            format!("not found: {db_path} (will be created on first run)"),
            start,
        );
    }

    let conn = match tokio_rusqlite::Connection::open(db_path).await {
        Ok(conn) => conn,
        Err(e) => {
            return CheckResult::new(
                "Audit log",
                CheckStatus::Fail,
                format!("open failed: {e}"),
                start,
            );
        }
    };

    let count = conn
        .call(|conn| -> Result<i64, rusqlite::Error> {
            conn.query_row("SELECT COUNT(*) FROM audit_events", [], |row| row.get(0))
        })
        .await;

    match count {
        Ok(n) => CheckResult::new(
            "Audit log",
            CheckStatus::Pass,
            format!("{n} event(s) recorded"),
            start,
        ),
        Err(e) => CheckResult::new(
            "Audit log",
            CheckStatus::Fail,
            format!("query failed: {e}"),
            start,
        ),
    }
}

/// Check an API key is available from config or the environment.
fn check_api_key(name: &str, in_config: bool, env_var: &str) -> CheckResult {
    let start = Instant::now();
    if in_config {
        CheckResult::new(name, CheckStatus::Pass, "set in config", start)
    } else if std::env::var(env_var).is_ok_and(|v| !v.trim().is_empty()) {
        CheckResult::new(name, CheckStatus::Pass, format!("set via {env_var}"), start)
    } else {
        CheckResult::new(
            name,
            CheckStatus::Fail,
            format!("not configured (set it in config or {env_var})"),
            start,
        )
    }
}

fn check_gateway_auth(config: &LifelineConfig) -> CheckResult {
    let start = Instant::now();
    match &config.gateway.bearer_token {
        Some(_) => CheckResult::new("Gateway auth", CheckStatus::Pass, "bearer token set", start),
        None => CheckResult::new(
            "Gateway auth",
            CheckStatus::Warn,
            "no bearer token, every /v1 request will be rejected",
            start,
        ),
    }
}

fn check_notifier(config: &LifelineConfig) -> CheckResult {
    let start = Instant::now();
    match webhook_host(config) {
        Some(url) => CheckResult::new("Notifier", CheckStatus::Pass, format!("webhook {url}"), start),
        None => CheckResult::new(
            "Notifier",
            CheckStatus::Warn,
            "no webhook, crisis events are only logged",
            start,
        ),
    }
}

/// Webhook host, without path or credentials, for display.
fn webhook_host(config: &LifelineConfig) -> Option<String> {
    let url = config.notify.webhook_url.as_deref()?;
    Some(
        reqwest::Url::parse(url)
            .ok()
            .and_then(|u| u.host_str().map(str::to_string))
            .unwrap_or_else(|| "(unparseable)".to_string()),
    )
}

/// Check the gateway answers on /health.
async fn check_health_endpoint(config: &LifelineConfig) -> CheckResult {
    let start = Instant::now();
    let host = &config.gateway.host;
    let port = config.gateway.port;
    let url = format!("http://{host}:{port}/health");

    let client = match reqwest::Client::builder()
        .timeout(Duration::from_secs(3))
        .build()
    {
        Ok(c) => c,
        Err(e) => {
            return CheckResult::new(
                "Health endpoint",
                CheckStatus::Fail,
                format!("HTTP client error: {e}"),
                start,
            );
        }
    };

    match client.get(&url).send().await {
        Ok(resp) if resp.status().is_success() => {
            CheckResult::new("Health endpoint", CheckStatus::Pass, "reachable", start)
        }
        Ok(resp) => CheckResult::new(
            "Health endpoint",
            CheckStatus::Warn,
            format!("status {}", resp.status()),
            start,
        ),
        Err(_) => CheckResult::new(
            "Health endpoint",
            CheckStatus::Warn,
            format!("not reachable at {url} (service may not be running)"),
            start,
        ),
    }
}

/// Deep check: SQLite integrity check.
async fn check_db_integrity(db_path: &str) -> CheckResult {
    let start = Instant::now();

    if !Path::new(db_path).exists() {
        return CheckResult::new(
            "DB integrity",
            CheckStatus::Warn,
            "database not found (skipped)",
            start,
        );
    }

    let conn = match tokio_rusqlite::Connection::open(db_path).await {
        Ok(conn) => conn,
        Err(e) => {
            return CheckResult::new(
                "DB integrity",
                CheckStatus::Fail,
                format!("open failed: {e}"),
                start,
            );
        }
    };

    let result = conn
        .call(|conn| -> Result<Vec<String>, rusqlite::Error> {
            let mut stmt = conn.prepare("PRAGMA integrity_check")?;
            let rows = stmt.query_map([], |row| row.get::<_, String>(0))?;
            let rows: Result<Vec<String>, _> = rows.collect();
            rows
        })
        .await;

    match result {
        Ok(rows) if rows.len() == 1 && rows[0] == "ok" => {
            CheckResult::new("DB integrity", CheckStatus::Pass, "ok", start)
        }
        Ok(rows) => CheckResult::new(
            "DB integrity",
            CheckStatus::Fail,
            format!("{} issue(s) found", rows.len()),
            start,
        ),
        Err(e) => CheckResult::new(
            "DB integrity",
            CheckStatus::Fail,
            format!("check failed: {e}"),
            start,
        ),
    }
}

/// Deep check: the triggers that keep the audit log append-only are present.
async fn check_append_only(db_path: &str) -> CheckResult {
    let start = Instant::now();

    if !Path::new(db_path).exists() {
        return CheckResult::new(
            "Append-only guard",
            CheckStatus::Warn,
            "database not found (skipped)",
            start,
        );
    }

    let conn = match tokio_rusqlite::Connection::open(db_path).await {
        Ok(conn) => conn,
        Err(e) => {
            return CheckResult::new(
                "Append-only guard",
                CheckStatus::Fail,
                format!("open failed: {e}"),
                start,
            );
        }
    };

    let result = conn
        .call(|conn| -> Result<i64, rusqlite::Error> {
            conn.query_row(
                "SELECT COUNT(*) FROM sqlite_master \
                 WHERE type = 'trigger' AND tbl_name = 'audit_events' \
                 AND name IN ('audit_events_no_update', 'audit_events_no_delete')",
                [],
                |row| row.get(0),
            )
        })
        .await;

    match result {
        Ok(2) => CheckResult::new("Append-only guard", CheckStatus::Pass, "triggers present", start),
        Ok(n) => CheckResult::new(
            "Append-only guard",
            CheckStatus::Fail,
            format!("{n} of 2 triggers present"),
            start,
        ),
        Err(e) => CheckResult::new(
            "Append-only guard",
            CheckStatus::Fail,
            format!("check failed: {e}"),
            start,
        ),
    }
}

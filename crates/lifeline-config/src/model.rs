// SPDX-FileCopyrightText: 2026 Lifeline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs for the Lifeline triage engine.
//!
//! All structs use `#[serde(deny_unknown_fields)]` to reject unrecognized
//! config keys at startup, providing actionable error messages.

use serde::{Deserialize, Serialize};

/// Top-level Lifeline configuration.
///
/// Loaded from TOML files following XDG hierarchy, with environment variable overrides.
/// All sections are optional and default to sensible values.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct LifelineConfig {
    /// Service identity and logging.
    #[serde(default)]
    pub service: ServiceConfig,

    /// Audit database settings.
    #[serde(default)]
    pub storage: StorageConfig,

    /// HTTP gateway settings.
    #[serde(default)]
    pub gateway: GatewayConfig,

    /// External moderation capability settings.
    #[serde(default)]
    pub moderation: ModerationConfig,

    /// AI generation capability settings.
    #[serde(default)]
    pub provider: ProviderConfig,

    /// Audit write settings.
    #[serde(default)]
    pub audit: AuditConfig,

    /// Operator notification relay settings.
    #[serde(default)]
    pub notify: NotifyConfig,

    /// Prometheus exporter settings.
    #[serde(default)]
    pub prometheus: PrometheusConfig,
}

/// Service identity and logging configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ServiceConfig {
    /// Service name, used in log output and health responses.
    #[serde(default = "default_service_name")]
    pub name: String,

    /// Logging level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            name: default_service_name(),
            log_level: default_log_level(),
        }
    }
}

fn default_service_name() -> String {
    "lifeline".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Audit database configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct StorageConfig {
    /// Path to the SQLite database file.
    #[serde(default = "default_database_path")]
    pub database_path: String,

    /// Enable WAL (Write-Ahead Logging) mode for SQLite.
    #[serde(default = "default_wal_mode")]
    pub wal_mode: bool,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
            wal_mode: default_wal_mode(),
        }
    }
}

fn default_database_path() -> String {
    dirs::data_dir()
        .map(|p| p.join("lifeline").join("lifeline.db"))
        .unwrap_or_else(|| std::path::PathBuf::from("lifeline.db"))
        .to_string_lossy()
        .into_owned()
}

fn default_wal_mode() -> bool {
    true
}

/// HTTP gateway configuration.
#[derive(Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct GatewayConfig {
    /// Host address to bind.
    #[serde(default = "default_host")]
    pub host: String,

    /// Port to bind.
    #[serde(default = "default_port")]
    pub port: u16,

    /// Bearer token required on `/v1/*`. `None` rejects every `/v1/*` request.
    #[serde(default)]
    pub bearer_token: Option<String>,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            bearer_token: None,
        }
    }
}

impl std::fmt::Debug for GatewayConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GatewayConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("bearer_token", &self.bearer_token.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    3000
}

/// External moderation capability configuration.
#[derive(Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ModerationConfig {
    /// Moderation endpoint URL (`/v1/moderations` compatible).
    #[serde(default = "default_moderation_endpoint")]
    pub endpoint: String,

    /// API key. `None` requires the `OPENAI_API_KEY` environment variable.
    #[serde(default)]
    pub api_key: Option<String>,

    /// Moderation model name.
    #[serde(default = "default_moderation_model")]
    pub model: String,

    /// Upper bound on a single screening call, in milliseconds.
    #[serde(default = "default_moderation_timeout_ms")]
    pub timeout_ms: u64,

    /// Category names that raise a crisis signal when flagged.
    #[serde(default = "default_crisis_categories")]
    pub crisis_categories: Vec<String>,
}

impl Default for ModerationConfig {
    fn default() -> Self {
        Self {
            endpoint: default_moderation_endpoint(),
            api_key: None,
            model: default_moderation_model(),
            timeout_ms: default_moderation_timeout_ms(),
            crisis_categories: default_crisis_categories(),
        }
    }
}

impl std::fmt::Debug for ModerationConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModerationConfig")
            .field("endpoint", &self.endpoint)
            .field("api_key", &self.api_key.as_ref().map(|_| "[REDACTED]"))
            .field("model", &self.model)
            .field("timeout_ms", &self.timeout_ms)
            .field("crisis_categories", &self.crisis_categories)
            .finish()
    }
}

fn default_moderation_endpoint() -> String {
    "https://api.openai.com/v1/moderations".to_string()
}

fn default_moderation_model() -> String {
    "omni-moderation-latest".to_string()
}

fn default_moderation_timeout_ms() -> u64 {
    3000
}

fn default_crisis_categories() -> Vec<String> {
    vec![
        "self-harm".to_string(),
        "self-harm/intent".to_string(),
        "self-harm/instructions".to_string(),
    ]
}

/// AI generation capability configuration.
#[derive(Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ProviderConfig {
    /// Anthropic API key. `None` requires the `ANTHROPIC_API_KEY` environment variable.
    #[serde(default)]
    pub api_key: Option<String>,

    /// Model used for chat replies.
    #[serde(default = "default_model")]
    pub model: String,

    /// Maximum tokens to generate per reply.
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    /// Anthropic API version string.
    #[serde(default = "default_api_version")]
    pub api_version: String,

    /// Upper bound on a single generation call, in milliseconds.
    #[serde(default = "default_provider_timeout_ms")]
    pub timeout_ms: u64,

    /// System prompt sent with every chat message.
    #[serde(default = "default_system_prompt")]
    pub system_prompt: String,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: default_model(),
            max_tokens: default_max_tokens(),
            api_version: default_api_version(),
            timeout_ms: default_provider_timeout_ms(),
            system_prompt: default_system_prompt(),
        }
    }
}

impl std::fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("api_key", &self.api_key.as_ref().map(|_| "[REDACTED]"))
            .field("model", &self.model)
            .field("max_tokens", &self.max_tokens)
            .field("api_version", &self.api_version)
            .field("timeout_ms", &self.timeout_ms)
            .finish_non_exhaustive()
    }
}

fn default_model() -> String {
    "claude-sonnet-4-20250514".to_string()
}

fn default_max_tokens() -> u32 {
    1024
}

fn default_api_version() -> String {
    "2023-06-01".to_string()
}

fn default_provider_timeout_ms() -> u64 {
    30_000
}

fn default_system_prompt() -> String {
    "You are a supportive, non-judgmental listener on a mental health support service. \
     You do not diagnose, prescribe, or give medical advice. Keep replies short and warm, \
     and encourage the person to reach out to a professional or a crisis line when appropriate."
        .to_string()
}

/// Audit write configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct AuditConfig {
    /// Upper bound on a single audit insert, in milliseconds.
    #[serde(default = "default_audit_write_timeout_ms")]
    pub write_timeout_ms: u64,
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            write_timeout_ms: default_audit_write_timeout_ms(),
        }
    }
}

fn default_audit_write_timeout_ms() -> u64 {
    2000
}

/// Operator notification relay configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct NotifyConfig {
    /// Webhook that receives crisis notifications. `None` logs them instead.
    #[serde(default)]
    pub webhook_url: Option<String>,

    /// Bound of the relay queue. A full queue drops new notifications.
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,

    /// Delivery attempts per notification, including the first.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Backoff before the second attempt; doubles on each further attempt.
    #[serde(default = "default_initial_backoff_ms")]
    pub initial_backoff_ms: u64,

    /// Upper bound on a single delivery attempt, in milliseconds.
    #[serde(default = "default_notify_timeout_ms")]
    pub timeout_ms: u64,
}

impl Default for NotifyConfig {
    fn default() -> Self {
        Self {
            webhook_url: None,
            queue_capacity: default_queue_capacity(),
            max_attempts: default_max_attempts(),
            initial_backoff_ms: default_initial_backoff_ms(),
            timeout_ms: default_notify_timeout_ms(),
        }
    }
}

fn default_queue_capacity() -> usize {
    256
}

fn default_max_attempts() -> u32 {
    3
}

fn default_initial_backoff_ms() -> u64 {
    500
}

fn default_notify_timeout_ms() -> u64 {
    5000
}

/// Prometheus exporter configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct PrometheusConfig {
    /// Install the recorder and serve `/metrics`.
    #[serde(default = "default_prometheus_enabled")]
    pub enabled: bool,
}

impl Default for PrometheusConfig {
    fn default() -> Self {
        Self {
            enabled: default_prometheus_enabled(),
        }
    }
}

fn default_prometheus_enabled() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_timeouts() {
        let config = LifelineConfig::default();
        assert_eq!(config.moderation.timeout_ms, 3000);
        assert_eq!(config.provider.timeout_ms, 30_000);
        assert_eq!(config.audit.write_timeout_ms, 2000);
        assert_eq!(config.notify.timeout_ms, 5000);
    }

    #[test]
    fn default_crisis_categories_are_self_harm() {
        let config = ModerationConfig::default();
        assert_eq!(
            config.crisis_categories,
            vec!["self-harm", "self-harm/intent", "self-harm/instructions"]
        );
    }

    #[test]
    fn debug_redacts_secrets() {
        let mut config = LifelineConfig::default();
        config.gateway.bearer_token = Some("tok-secret".into());
        config.moderation.api_key = Some("sk-moderation".into());
        config.provider.api_key = Some("sk-ant-provider".into());
        let debug = format!("{config:?}");
        assert!(!debug.contains("tok-secret"));
        assert!(!debug.contains("sk-moderation"));
        assert!(!debug.contains("sk-ant-provider"));
        assert!(debug.contains("[REDACTED]"));
    }

    #[test]
    fn notify_section_parses() {
        let toml_str = r#"
[notify]
webhook_url = "https://ops.example.org/hook"
queue_capacity = 16
max_attempts = 5
"#;
        let config: LifelineConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(
            config.notify.webhook_url.as_deref(),
            Some("https://ops.example.org/hook")
        );
        assert_eq!(config.notify.queue_capacity, 16);
        assert_eq!(config.notify.max_attempts, 5);
        assert_eq!(config.notify.initial_backoff_ms, 500);
    }

    #[test]
    fn provider_deny_unknown_fields() {
        let toml_str = r#"
[provider]
modle = "claude"
"#;
        assert!(toml::from_str::<LifelineConfig>(toml_str).is_err());
    }
}

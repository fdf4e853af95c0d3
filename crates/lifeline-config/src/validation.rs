// SPDX-FileCopyrightText: 2026 Lifeline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation for configuration values.
//!
//! Validates semantic constraints that cannot be expressed via serde attributes,
//! such as valid bind addresses, non-empty paths, and non-zero timeouts.

use crate::diagnostic::ConfigError;
use crate::model::LifelineConfig;

const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

/// Validate a deserialized configuration for semantic correctness.
///
/// Returns `Ok(())` if all validations pass, or `Err(Vec<ConfigError>)` with
/// all collected validation errors (does not fail fast).
pub fn validate_config(config: &LifelineConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();

    if !LOG_LEVELS.contains(&config.service.log_level.as_str()) {
        errors.push(ConfigError::Validation {
            message: format!(
                "service.log_level `{}` must be one of {}",
                config.service.log_level,
                LOG_LEVELS.join(", ")
            ),
        });
    }

    if config.storage.database_path.trim().is_empty() {
        errors.push(ConfigError::Validation {
            message: "storage.database_path must not be empty".to_string(),
        });
    }

    let host = config.gateway.host.trim();
    if host.is_empty() {
        errors.push(ConfigError::Validation {
            message: "gateway.host must not be empty".to_string(),
        });
    } else {
        let is_valid_ip = host.parse::<std::net::IpAddr>().is_ok();
        let is_valid_hostname = host
            .chars()
            .all(|c| c.is_alphanumeric() || c == '.' || c == '-' || c == ':');
        if !is_valid_ip && !is_valid_hostname {
            errors.push(ConfigError::Validation {
                message: format!("gateway.host `{host}` is not a valid IP address or hostname"),
            });
        }
    }

    if let Some(token) = &config.gateway.bearer_token
        && token.trim().is_empty()
    {
        errors.push(ConfigError::Validation {
            message: "gateway.bearer_token must not be empty when set".to_string(),
        });
    }

    check_url(&mut errors, "moderation.endpoint", &config.moderation.endpoint);
    if let Some(url) = &config.notify.webhook_url {
        check_url(&mut errors, "notify.webhook_url", url);
    }

    for (key, value) in [
        ("moderation.timeout_ms", config.moderation.timeout_ms),
        ("provider.timeout_ms", config.provider.timeout_ms),
        ("audit.write_timeout_ms", config.audit.write_timeout_ms),
        ("notify.timeout_ms", config.notify.timeout_ms),
    ] {
        if value == 0 {
            errors.push(ConfigError::Validation {
                message: format!("{key} must be greater than 0"),
            });
        }
    }

    if config.provider.max_tokens == 0 {
        errors.push(ConfigError::Validation {
            message: "provider.max_tokens must be greater than 0".to_string(),
        });
    }

    if config.notify.queue_capacity == 0 {
        errors.push(ConfigError::Validation {
            message: "notify.queue_capacity must be greater than 0".to_string(),
        });
    }

    if config.notify.max_attempts == 0 {
        errors.push(ConfigError::Validation {
            message: "notify.max_attempts must be at least 1".to_string(),
        });
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn check_url(errors: &mut Vec<ConfigError>, key: &str, value: &str) {
    match url::Url::parse(value) {
        Ok(url) if matches!(url.scheme(), "http" | "https") => {}
        Ok(url) => errors.push(ConfigError::Validation {
            message: format!("{key} must use http or https, got `{}`", url.scheme()),
        }),
        Err(e) => errors.push(ConfigError::Validation {
            message: format!("{key} is not a valid URL: {e}"),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn has_error(errors: &[ConfigError], needle: &str) -> bool {
        errors
            .iter()
            .any(|e| matches!(e, ConfigError::Validation { message } if message.contains(needle)))
    }

    #[test]
    fn default_config_validates() {
        let config = LifelineConfig::default();
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn empty_database_path_fails_validation() {
        let mut config = LifelineConfig::default();
        config.storage.database_path = "".to_string();
        let errors = validate_config(&config).unwrap_err();
        assert!(has_error(&errors, "database_path"));
    }

    #[test]
    fn zero_timeouts_fail_validation() {
        let mut config = LifelineConfig::default();
        config.moderation.timeout_ms = 0;
        config.audit.write_timeout_ms = 0;
        let errors = validate_config(&config).unwrap_err();
        assert!(has_error(&errors, "moderation.timeout_ms"));
        assert!(has_error(&errors, "audit.write_timeout_ms"));
    }

    #[test]
    fn zero_queue_and_attempts_fail_validation() {
        let mut config = LifelineConfig::default();
        config.notify.queue_capacity = 0;
        config.notify.max_attempts = 0;
        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 2);
        assert!(has_error(&errors, "queue_capacity"));
        assert!(has_error(&errors, "max_attempts"));
    }

    #[test]
    fn malformed_webhook_fails_validation() {
        let mut config = LifelineConfig::default();
        config.notify.webhook_url = Some("not a url".to_string());
        let errors = validate_config(&config).unwrap_err();
        assert!(has_error(&errors, "notify.webhook_url"));
    }

    #[test]
    fn non_http_webhook_fails_validation() {
        let mut config = LifelineConfig::default();
        config.notify.webhook_url = Some("ftp://ops.example.org/hook".to_string());
        let errors = validate_config(&config).unwrap_err();
        assert!(has_error(&errors, "http or https"));
    }

    #[test]
    fn unknown_log_level_fails_validation() {
        let mut config = LifelineConfig::default();
        config.service.log_level = "verbose".to_string();
        let errors = validate_config(&config).unwrap_err();
        assert!(has_error(&errors, "service.log_level"));
    }

    #[test]
    fn blank_bearer_token_fails_validation() {
        let mut config = LifelineConfig::default();
        config.gateway.bearer_token = Some("  ".to_string());
        let errors = validate_config(&config).unwrap_err();
        assert!(has_error(&errors, "bearer_token"));
    }

    #[test]
    fn valid_custom_config_passes() {
        let mut config = LifelineConfig::default();
        config.gateway.host = "0.0.0.0".to_string();
        config.gateway.bearer_token = Some("tok".to_string());
        config.storage.database_path = "/tmp/test.db".to_string();
        config.notify.webhook_url = Some("https://ops.example.org/hook".to_string());
        assert!(validate_config(&config).is_ok());
    }
}

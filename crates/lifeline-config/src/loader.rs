// SPDX-FileCopyrightText: 2026 Lifeline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration loader using Figment for layered config merging.
//!
//! Supports XDG hierarchy: `./lifeline.toml` > `~/.config/lifeline/lifeline.toml` >
//! `/etc/lifeline/lifeline.toml` with environment variable overrides via `LIFELINE_` prefix.

#![allow(clippy::result_large_err)] // figment::Error is external and cannot be boxed without wrapper

use std::path::Path;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};

use crate::model::LifelineConfig;

/// Top-level sections, in the form they appear in env var names.
const SECTIONS: &[&str] = &[
    "service",
    "storage",
    "gateway",
    "moderation",
    "provider",
    "audit",
    "notify",
    "prometheus",
];

/// Load configuration from the standard XDG hierarchy with env var overrides.
///
/// Merge order (later overrides earlier):
/// 1. Compiled defaults
/// 2. `/etc/lifeline/lifeline.toml` (system-wide)
/// 3. `~/.config/lifeline/lifeline.toml` (user XDG config)
/// 4. `./lifeline.toml` (local directory)
/// 5. `LIFELINE_*` environment variables
pub fn load_config() -> Result<LifelineConfig, figment::Error> {
    build_figment().extract()
}

/// Load configuration from a TOML string only (no XDG lookup, no env vars).
///
/// Used for testing and explicit configuration.
pub fn load_config_from_str(toml_content: &str) -> Result<LifelineConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(LifelineConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Load configuration from a specific file path with env var overrides.
pub fn load_config_from_path(path: &Path) -> Result<LifelineConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(LifelineConfig::default()))
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()
}

/// Build the Figment used internally for config loading (exposed for diagnostic use).
///
/// Returns the Figment before extraction so callers can inspect metadata.
pub fn build_figment() -> Figment {
    Figment::new()
        .merge(Serialized::defaults(LifelineConfig::default()))
        .merge(Toml::file("/etc/lifeline/lifeline.toml"))
        .merge(Toml::file(
            dirs::config_dir()
                .map(|d| d.join("lifeline/lifeline.toml"))
                .unwrap_or_default(),
        ))
        .merge(Toml::file("lifeline.toml"))
        .merge(env_provider())
}

/// Create the environment variable provider using explicit `map()` for section-to-dot mapping.
///
/// Uses `Env::map()` rather than `Env::split("_")`: `LIFELINE_NOTIFY_WEBHOOK_URL`
/// must map to `notify.webhook_url`, not `notify.webhook.url`.
fn env_provider() -> Env {
    Env::prefixed("LIFELINE_").map(|key| map_env_key(key.as_str()).into())
}

/// Map a lowercased, prefix-stripped env var name to a dotted config path.
///
/// Only the first `<section>_` is replaced, so underscores inside key names survive.
pub(crate) fn map_env_key(key: &str) -> String {
    for section in SECTIONS {
        if let Some(rest) = key
            .strip_prefix(section)
            .and_then(|r| r.strip_prefix('_'))
        {
            return format!("{section}.{rest}");
        }
    }
    key.to_string()
}

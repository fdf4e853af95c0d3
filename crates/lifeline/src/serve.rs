// SPDX-FileCopyrightText: 2026 Lifeline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `lifeline serve` command implementation.
//!
//! Wires the OpenAI moderation adapter, the Anthropic provider, the SQLite
//! audit log and the configured notifier into a crisis router, then serves
//! it over HTTP until a shutdown signal arrives.
//!
//! Shutdown order: the gateway stops accepting connections and finishes
//! in-flight requests, then the relay delivers whatever notifications are
//! still queued, then the audit log is checkpointed.

use std::sync::Arc;
use std::time::Duration;

use lifeline_anthropic::AnthropicProvider;
use lifeline_config::model::LifelineConfig;
use lifeline_core::{LifelineError, PluginAdapter};
use lifeline_gateway::{AuthConfig, GatewayState, HealthState, ServerConfig, start_server};
use lifeline_moderation::OpenAiModeration;
use lifeline_notify::{NotificationRelay, RelayConfig, notifier_from_config};
use lifeline_router::{CrisisRouter, ModerationGateway, RouterTimeouts};
use lifeline_storage::SqliteAuditStore;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::shutdown;

/// Runs the `lifeline serve` command.
pub async fn run_serve(config: LifelineConfig) -> Result<(), LifelineError> {
    info!(service = %config.service.name, "starting lifeline serve");

    // Initialize storage.
    let store = {
        let store = SqliteAuditStore::new(config.storage.clone());
        store.initialize().await?;
        Arc::new(store)
    };

    let moderation = Arc::new(OpenAiModeration::new(&config.moderation).map_err(|e| {
        error!(error = %e, "failed to initialize moderation adapter");
        eprintln!(
            "error: moderation API key required. Set moderation.api_key in config or OPENAI_API_KEY."
        );
        e
    })?);

    let provider = Arc::new(AnthropicProvider::new(&config.provider).map_err(|e| {
        error!(error = %e, "failed to initialize Anthropic provider");
        eprintln!(
            "error: Anthropic API key required. Set provider.api_key in config or ANTHROPIC_API_KEY."
        );
        e
    })?);

    // Initialize Prometheus metrics (if enabled).
    let prometheus_render: Option<Arc<dyn Fn() -> String + Send + Sync>> =
        if config.prometheus.enabled {
            match lifeline_prometheus::PrometheusExporter::install() {
                Ok(exporter) => {
                    info!("prometheus metrics enabled");
                    let exporter = Arc::new(exporter);
                    Some(Arc::new(move || exporter.render()))
                }
                Err(e) => {
                    warn!(error = %e, "prometheus initialization failed, continuing without metrics");
                    None
                }
            }
        } else {
            debug!("prometheus metrics disabled by configuration");
            None
        };

    // The relay has its own token so it keeps delivering while the gateway
    // finishes in-flight requests.
    let relay_shutdown = CancellationToken::new();
    let notifier = notifier_from_config(&config.notify)?;
    info!(notifier = notifier.name(), "operator notifier selected");
    let (relay_handle, relay) = NotificationRelay::spawn(
        notifier.clone(),
        RelayConfig::from(&config.notify),
        relay_shutdown.clone(),
    );

    let timeouts = RouterTimeouts::from(&config);
    let gateway = ModerationGateway::new(
        moderation.clone(),
        provider.clone(),
        timeouts.moderation,
        timeouts.provider,
    );
    let router = CrisisRouter::new(gateway, store.clone(), Some(relay_handle), timeouts.audit_write);

    let state = GatewayState {
        router,
        audit: store.clone(),
        auth: AuthConfig {
            bearer_token: config.gateway.bearer_token.clone(),
        },
        health: HealthState {
            start_time: std::time::Instant::now(),
            prometheus_render,
        },
    };

    let cancel = shutdown::install_signal_handler();
    let server_result = start_server(&ServerConfig::from(&config.gateway), state, cancel).await;
    if let Err(e) = &server_result {
        error!(error = %e, "gateway stopped with an error");
    }

    relay_shutdown.cancel();
    match tokio::time::timeout(drain_timeout(&config), relay.join()).await {
        Ok(Ok(())) => info!("notification relay drained"),
        Ok(Err(e)) => warn!(error = %e, "notification relay did not stop cleanly"),
        Err(_) => warn!("notification relay drain timed out"),
    }

    if let Err(e) = notifier.shutdown().await {
        warn!(adapter = notifier.name(), error = %e, "adapter shutdown failed");
    }
    let adapters: [&dyn PluginAdapter; 3] = [moderation.as_ref(), provider.as_ref(), store.as_ref()];
    for adapter in adapters {
        if let Err(e) = adapter.shutdown().await {
            warn!(adapter = adapter.name(), error = %e, "adapter shutdown failed");
        }
    }

    info!("lifeline serve shutdown complete");
    server_result
}

/// Upper bound on draining the relay: every queued notification gets its
/// full retry budget, capped at one minute.
fn drain_timeout(config: &LifelineConfig) -> Duration {
    let notify = &config.notify;
    let per_notification = notify
        .timeout_ms
        .saturating_add(notify.initial_backoff_ms)
        .saturating_mul(u64::from(notify.max_attempts.max(1)).saturating_mul(2));
    Duration::from_millis(per_notification.saturating_mul(notify.queue_capacity as u64))
        .min(Duration::from_secs(60))
}

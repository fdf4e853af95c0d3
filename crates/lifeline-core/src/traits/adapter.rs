// SPDX-FileCopyrightText: 2026 Lifeline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Identity and lifecycle shared by every external capability.

use async_trait::async_trait;

use crate::error::LifelineError;
use crate::types::{AdapterType, HealthStatus};

/// Supertrait of the moderation, provider, notification and audit seams.
///
/// `serve` builds each adapter once, shares it behind an `Arc` for the life
/// of the process, and calls [`shutdown`](Self::shutdown) after the HTTP
/// server has stopped and the notification relay has drained. The router
/// never calls these methods on the request path.
#[async_trait]
pub trait PluginAdapter: Send + Sync + 'static {
    /// Stable name used in log fields.
    fn name(&self) -> &str;

    fn version(&self) -> semver::Version;

    /// Which seam this adapter fills.
    fn adapter_type(&self) -> AdapterType;

    /// Cheap readiness probe. Must not send user content anywhere.
    async fn health_check(&self) -> Result<HealthStatus, LifelineError>;

    /// Release connections and flush buffers. Called once, after the last
    /// request that could use the adapter.
    async fn shutdown(&self) -> Result<(), LifelineError>;
}

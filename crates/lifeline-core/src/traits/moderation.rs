// SPDX-FileCopyrightText: 2026 Lifeline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Moderation adapter trait for the external content-safety capability.

use async_trait::async_trait;

use crate::error::LifelineError;
use crate::traits::adapter::PluginAdapter;
use crate::types::ModerationVerdict;

/// Adapter for a content-safety classifier.
///
/// Implementations return the capability's verdict as-is. Callers decide what
/// an error means; the gateway treats any error as a fail-closed verdict.
#[async_trait]
pub trait ModerationAdapter: PluginAdapter {
    /// Screens a piece of text.
    async fn moderate(&self, text: &str) -> Result<ModerationVerdict, LifelineError>;
}

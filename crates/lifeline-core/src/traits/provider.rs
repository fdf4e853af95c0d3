// SPDX-FileCopyrightText: 2026 Lifeline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Provider adapter trait for the AI generation capability.

use async_trait::async_trait;

use crate::error::LifelineError;
use crate::traits::adapter::PluginAdapter;
use crate::types::ChatMessage;

/// Adapter for the AI capability that answers moderated chat messages.
///
/// Only ever called after the moderation gateway returned a clean pass.
#[async_trait]
pub trait ProviderAdapter: PluginAdapter {
    /// Generates a reply to a single message and returns its full text.
    async fn generate(&self, message: &ChatMessage) -> Result<String, LifelineError>;
}

// SPDX-FileCopyrightText: 2026 Lifeline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Notification adapter trait for operator alerts.

use async_trait::async_trait;

use crate::audit::CrisisNotification;
use crate::error::LifelineError;
use crate::traits::adapter::PluginAdapter;

/// Delivers a content-free crisis notification to a human operator.
///
/// Called only from the relay worker, never on the request path.
#[async_trait]
pub trait NotificationAdapter: PluginAdapter {
    /// Attempts a single delivery. Retry policy belongs to the caller.
    async fn deliver(&self, notification: &CrisisNotification) -> Result<(), LifelineError>;
}

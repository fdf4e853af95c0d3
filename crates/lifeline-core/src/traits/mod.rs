// SPDX-FileCopyrightText: 2026 Lifeline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Adapter trait definitions for the external capabilities the router depends on.
//!
//! All adapters extend the [`PluginAdapter`] base trait and use
//! `#[async_trait]` for dynamic dispatch compatibility.

pub mod adapter;
pub mod audit;
pub mod moderation;
pub mod notification;
pub mod provider;

pub use adapter::PluginAdapter;
pub use audit::{AuditQuery, AuditSink};
pub use moderation::ModerationAdapter;
pub use notification::NotificationAdapter;
pub use provider::ProviderAdapter;

// SPDX-FileCopyrightText: 2026 Lifeline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the Lifeline triage engine.

use thiserror::Error;

/// The primary error type used across all Lifeline adapter traits and core operations.
///
/// Error messages never include user-supplied text. Adapters that wrap an
/// upstream failure describe the failure, not the payload that caused it.
#[derive(Debug, Error)]
pub enum LifelineError {
    /// Configuration errors (invalid TOML, missing required fields, bad values).
    #[error("configuration error: {0}")]
    Config(String),

    /// A submission failed input validation and was not classified.
    #[error("validation error: {0}")]
    Validation(String),

    /// Audit store errors (database connection, query failure, migration).
    #[error("storage error: {source}")]
    Storage {
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// The external moderation capability failed or returned garbage.
    #[error("moderation error: {message}")]
    Moderation {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// The external AI generation capability failed.
    #[error("provider error: {message}")]
    Provider {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Operator notification delivery failed.
    #[error("notification error: {message}")]
    Notification {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Operation timed out.
    #[error("operation timed out after {duration:?}")]
    Timeout { duration: std::time::Duration },

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}

impl LifelineError {
    /// Wrap any storage-layer error.
    pub fn storage<E>(err: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        LifelineError::Storage {
            source: Box::new(err),
        }
    }
}

// SPDX-FileCopyrightText: 2026 Lifeline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Moderations API request/response types.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Moderation request.
#[derive(Serialize)]
pub struct ModerationRequest<'a> {
    /// Model to use for moderation.
    pub model: &'a str,
    /// Text to screen.
    pub input: &'a str,
}

/// Moderation response.
#[derive(Debug, Clone, Deserialize)]
pub struct ModerationResponse {
    /// One result per input.
    pub results: Vec<ModerationResult>,
    /// Model used.
    #[serde(default)]
    pub model: String,
}

/// Individual moderation result.
#[derive(Debug, Clone, Deserialize)]
pub struct ModerationResult {
    /// Whether the content was flagged in any category.
    pub flagged: bool,
    /// Per-category flags.
    #[serde(default)]
    pub categories: HashMap<String, bool>,
    /// Per-category confidence scores.
    #[serde(default)]
    pub category_scores: HashMap<String, f64>,
}

/// API error body.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiErrorResponse {
    pub error: ApiErrorDetail,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiErrorDetail {
    #[serde(rename = "type", default)]
    pub type_: Option<String>,
    pub message: String,
}

// SPDX-FileCopyrightText: 2026 Lifeline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP request handlers for the gateway REST API.
//!
//! Handles POST /v1/triage, POST /v1/chat, GET /v1/audit/summary and the
//! public health and metrics endpoints.
//!
//! Two failure shapes never carry a routing decision. A body that does not
//! parse gets 400 with the conservative directive and is never classified.
//! A routing failure gets 503 with the emergency fallback, so a caller that
//! cannot get a decision still renders the crisis experience.

use axum::{
    Json,
    extract::{Query, State, rejection::JsonRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{error, warn};

use lifeline_core::resources::CONSERVATIVE_DIRECTIVE;
use lifeline_core::{
    ChatMessage, ChatReply, CrisisResources, LifelineError, RiskLevel, TriageAnswers,
    TriageResult, crisis_resources,
};

use crate::server::{GatewayState, HealthState};

/// Response body for POST /v1/triage.
#[derive(Debug, Serialize)]
pub struct TriageResponse {
    #[serde(flatten)]
    pub result: TriageResult,
    /// Present only in crisis mode.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resources: Option<CrisisResources>,
}

impl From<TriageResult> for TriageResponse {
    fn from(result: TriageResult) -> Self {
        let resources = result
            .crisis_mode()
            .then(|| crisis_resources(result.region_code()));
        Self { result, resources }
    }
}

/// Response body for POST /v1/chat.
#[derive(Debug, Serialize)]
pub struct ChatResponse {
    #[serde(flatten)]
    pub reply: ChatReply,
    /// Present only in crisis mode.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resources: Option<CrisisResources>,
}

impl From<ChatReply> for ChatResponse {
    fn from(reply: ChatReply) -> Self {
        let resources = match &reply {
            ChatReply::Crisis { region_code, .. } => Some(crisis_resources(*region_code)),
            _ => None,
        };
        Self { reply, resources }
    }
}

/// Body returned when the request could not be routed at all.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EmergencyFallback {
    pub risk_level: RiskLevel,
    pub crisis_mode: bool,
    pub directive: &'static str,
    pub resources: CrisisResources,
}

impl Default for EmergencyFallback {
    fn default() -> Self {
        Self {
            risk_level: RiskLevel::Emergency,
            crisis_mode: true,
            directive: CONSERVATIVE_DIRECTIVE,
            resources: crisis_resources(None),
        }
    }
}

/// Error response body.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Error description.
    pub error: String,
    /// Conservative directive for clients that show something regardless.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub directive: Option<&'static str>,
}

/// Response body for GET /health.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// Health status string.
    pub status: String,
    /// Binary version.
    pub version: String,
    /// Uptime in seconds.
    pub uptime_secs: u64,
}

/// Query string for GET /v1/audit/summary.
#[derive(Debug, Deserialize)]
pub struct SummaryParams {
    /// RFC 3339 lower bound, inclusive.
    pub since: Option<String>,
}

fn bad_request(error: String) -> Response {
    (
        StatusCode::BAD_REQUEST,
        Json(ErrorResponse {
            error,
            directive: Some(CONSERVATIVE_DIRECTIVE),
        }),
    )
        .into_response()
}

/// Map a routing error to its response. Validation problems are the
/// caller's; anything else gets the emergency fallback.
fn routing_error(route: &'static str, err: LifelineError) -> Response {
    match err {
        LifelineError::Validation(message) => {
            warn!(route, error = %message, "request rejected");
            bad_request(message)
        }
        other => {
            error!(route, error = %other, "routing failed, returning emergency fallback");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(EmergencyFallback::default()),
            )
                .into_response()
        }
    }
}

/// POST /v1/triage
///
/// Classifies a questionnaire. EMERGENCY responses carry crisis resources.
pub async fn post_triage(
    State(state): State<GatewayState>,
    payload: Result<Json<TriageAnswers>, JsonRejection>,
) -> Response {
    let Json(answers) = match payload {
        Ok(payload) => payload,
        Err(rejection) => {
            warn!(route = "triage", status = %rejection.status(), "malformed questionnaire");
            return bad_request(rejection.body_text());
        }
    };

    match state.router.route_triage(answers).await {
        Ok(result) => (StatusCode::OK, Json(TriageResponse::from(result))).into_response(),
        Err(e) => routing_error("triage", e),
    }
}

/// POST /v1/chat
///
/// Screens a chat message and returns the reply. Crisis replies carry
/// crisis resources.
pub async fn post_chat(
    State(state): State<GatewayState>,
    payload: Result<Json<ChatMessage>, JsonRejection>,
) -> Response {
    let Json(message) = match payload {
        Ok(payload) => payload,
        Err(rejection) => {
            warn!(route = "chat", status = %rejection.status(), "malformed chat message");
            return bad_request(rejection.body_text());
        }
    };

    match state.router.route_chat(message).await {
        Ok(reply) => (StatusCode::OK, Json(ChatResponse::from(reply))).into_response(),
        Err(e) => routing_error("chat", e),
    }
}

/// GET /v1/audit/summary
///
/// Aggregate counts only; individual events are never returned.
pub async fn get_audit_summary(
    State(state): State<GatewayState>,
    Query(params): Query<SummaryParams>,
) -> Response {
    let since = match params.since.as_deref().map(DateTime::parse_from_rfc3339) {
        None => None,
        Some(Ok(ts)) => Some(ts.with_timezone(&Utc)),
        Some(Err(e)) => {
            return (
                StatusCode::BAD_REQUEST,
                Json(ErrorResponse {
                    error: format!("since must be an RFC 3339 timestamp: {e}"),
                    directive: None,
                }),
            )
                .into_response();
        }
    };

    match state.audit.summary(since).await {
        Ok(summary) => (StatusCode::OK, Json(summary)).into_response(),
        Err(e) => {
            error!(error = %e, "audit summary failed");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(ErrorResponse {
                    error: "audit log unavailable".to_string(),
                    directive: None,
                }),
            )
                .into_response()
        }
    }
}

/// GET /health
pub async fn get_public_health(State(health): State<HealthState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_secs: health.start_time.elapsed().as_secs(),
    })
}

/// GET /metrics
///
/// Prometheus text format, or 404 when the exporter is disabled.
pub async fn get_public_metrics(State(health): State<HealthState>) -> Response {
    match &health.prometheus_render {
        Some(render) => (
            StatusCode::OK,
            [("content-type", "text/plain; version=0.0.4")],
            render(),
        )
            .into_response(),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}

// SPDX-FileCopyrightText: 2026 Lifeline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP gateway for the Lifeline triage engine.
//!
//! Exposes the crisis router over a small JSON API. `/health` and `/metrics`
//! are public; everything under `/v1` requires a bearer token and is
//! rejected outright when no token is configured.

pub mod auth;
pub mod handlers;
pub mod server;

pub use auth::AuthConfig;
pub use server::{GatewayState, HealthState, ServerConfig, build_router, start_server};

// SPDX-FileCopyrightText: 2026 Lifeline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Triage classification, moderation gateway, and crisis routing.
//!
//! [`classify`] is the pure questionnaire classifier, [`ModerationGateway`]
//! screens chat before any AI reply, and [`CrisisRouter`] ties both to the
//! audit sink and the notification relay.

pub mod classifier;
pub mod gateway;
pub mod router;

pub use classifier::{Classification, classify, classify_with_reason};
pub use gateway::{GatewayOutcome, ModerationGateway};
pub use router::{CrisisRouter, RouterTimeouts};

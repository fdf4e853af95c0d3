// SPDX-FileCopyrightText: 2026 Lifeline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Region-specific emergency numbers and crisis lines, plus the fixed texts
//! shown when crisis mode is active.

use serde::Serialize;

use crate::types::RegionCode;

/// Directive returned whenever the system cannot make a decision it trusts.
pub const CONSERVATIVE_DIRECTIVE: &str = "If you are in immediate danger or thinking about harming yourself or someone else, call your local emergency number now. You can also reach a crisis line any time, day or night.";

/// Text returned on a crisis-block instead of any AI output.
pub const CRISIS_DIRECTIVE: &str = "It sounds like you may be going through something really serious. You deserve support right now. Please call your local emergency number or a crisis line. You do not have to face this alone.";

/// Text returned on a soft-block.
pub const SAFETY_TEMPLATE: &str = "I'm not able to respond to that message. If you are struggling, a trained counselor at a crisis line can help, any time.";

/// Text returned when moderation passed but the AI capability did not answer.
pub const UNAVAILABLE_TEMPLATE: &str = "I'm having trouble responding right now. Please try again in a moment. If you need to talk to someone now, a crisis line is always available.";

/// Emergency contacts for one region.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CrisisResources {
    /// Region these contacts apply to; `None` for the international fallback.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub region: Option<RegionCode>,
    pub emergency_number: &'static str,
    pub crisis_line: &'static str,
    pub crisis_line_name: &'static str,
}

const INTERNATIONAL: (&str, &str, &str) = (
    "112",
    "https://findahelpline.com",
    "Find A Helpline",
);

/// Look up emergency contacts for a region.
///
/// Unknown regions, and requests with no region, get the international
/// fallback so crisis mode always has something to show.
pub fn crisis_resources(region: Option<RegionCode>) -> CrisisResources {
    let (emergency_number, crisis_line, crisis_line_name) =
        match region.as_ref().map(RegionCode::as_str) {
            Some("US") | Some("CA") => ("911", "988", "988 Suicide & Crisis Lifeline"),
            Some("GB") => ("999", "116 123", "Samaritans"),
            Some("IE") => ("112", "116 123", "Samaritans"),
            Some("AU") => ("000", "13 11 14", "Lifeline"),
            Some("NZ") => ("111", "1737", "Need to talk? 1737"),
            _ => INTERNATIONAL,
        };
    CrisisResources {
        region,
        emergency_number,
        crisis_line,
        crisis_line_name,
    }
}

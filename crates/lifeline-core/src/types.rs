// SPDX-FileCopyrightText: 2026 Lifeline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Common types shared by the classifier, moderation gateway, and crisis router.

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize, Serializer};
use strum::{Display, EnumString};

use crate::error::LifelineError;

/// Maximum accepted chat message length, in characters.
pub const MAX_CHAT_CONTENT_CHARS: usize = 8_000;

/// Health status reported by adapter health checks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HealthStatus {
    /// Adapter is fully operational.
    Healthy,
    /// Adapter is operational but experiencing issues.
    Degraded(String),
    /// Adapter is not operational.
    Unhealthy(String),
}

/// Identifies the kind of external capability an adapter wraps.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
pub enum AdapterType {
    Moderation,
    Provider,
    Audit,
    Notification,
}

/// Categorical level of care. No sub-gradation.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Display,
    EnumString,
    Serialize,
    Deserialize,
)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RiskLevel {
    Emergency,
    Urgent,
    Routine,
}

/// A two-letter region code, normalised to upper case.
///
/// Stored as two ASCII bytes, so a value of this type can never carry
/// more than a region identifier.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RegionCode([u8; 2]);

impl RegionCode {
    /// Returns the code as an upper-case string slice.
    pub fn as_str(&self) -> &str {
        std::str::from_utf8(&self.0).unwrap_or("")
    }
}

impl FromStr for RegionCode {
    type Err = LifelineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bytes = s.trim().as_bytes();
        match bytes {
            [a, b] if a.is_ascii_alphabetic() && b.is_ascii_alphabetic() => {
                Ok(RegionCode([a.to_ascii_uppercase(), b.to_ascii_uppercase()]))
            }
            _ => Err(LifelineError::Validation(
                "regionCode must be a two-letter code".to_string(),
            )),
        }
    }
}

impl TryFrom<String> for RegionCode {
    type Error = LifelineError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<RegionCode> for String {
    fn from(code: RegionCode) -> Self {
        code.as_str().to_string()
    }
}

impl fmt::Display for RegionCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Debug for RegionCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RegionCode({})", self.as_str())
    }
}

/// Answers to the five-question safety questionnaire.
///
/// Every boolean is required when deserialising: a missing danger answer is
/// rejected, never defaulted to `false`. The type is not `Serialize`:
/// answers exist only for the duration of one classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct TriageAnswers {
    pub immediate_danger: bool,
    pub harm_self: bool,
    pub harm_others: bool,
    pub need_help_soon: bool,
    pub need_help_today: bool,
    #[serde(default)]
    pub region_code: Option<RegionCode>,
}

impl TriageAnswers {
    /// Build answers in questionnaire order, without a region.
    pub fn new(
        immediate_danger: bool,
        harm_self: bool,
        harm_others: bool,
        need_help_soon: bool,
        need_help_today: bool,
    ) -> Self {
        Self {
            immediate_danger,
            harm_self,
            harm_others,
            need_help_soon,
            need_help_today,
            region_code: None,
        }
    }

    /// Attach a region code.
    pub fn with_region(mut self, region_code: RegionCode) -> Self {
        self.region_code = Some(region_code);
        self
    }

    /// True when any of the three danger questions was answered yes.
    pub fn has_danger_signal(&self) -> bool {
        self.immediate_danger || self.harm_self || self.harm_others
    }
}

/// Outcome of routing a questionnaire submission.
///
/// `Crisis` is the EMERGENCY case and always implies crisis mode; callers
/// cannot read a crisis result as an ordinary success.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriageResult {
    Crisis {
        region_code: Option<RegionCode>,
    },
    Routed {
        risk_level: RiskLevel,
        region_code: Option<RegionCode>,
    },
}

impl TriageResult {
    /// Wrap a classified risk level. EMERGENCY always becomes `Crisis`.
    pub fn from_risk(risk_level: RiskLevel, region_code: Option<RegionCode>) -> Self {
        match risk_level {
            RiskLevel::Emergency => TriageResult::Crisis { region_code },
            _ => TriageResult::Routed {
                risk_level,
                region_code,
            },
        }
    }

    pub fn risk_level(&self) -> RiskLevel {
        match self {
            TriageResult::Crisis { .. } => RiskLevel::Emergency,
            TriageResult::Routed { risk_level, .. } => *risk_level,
        }
    }

    pub fn crisis_mode(&self) -> bool {
        matches!(self, TriageResult::Crisis { .. })
    }

    pub fn region_code(&self) -> Option<RegionCode> {
        match self {
            TriageResult::Crisis { region_code } | TriageResult::Routed { region_code, .. } => {
                *region_code
            }
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct TriageResultWire {
    risk_level: RiskLevel,
    crisis_mode: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    region_code: Option<RegionCode>,
}

impl Serialize for TriageResult {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        TriageResultWire {
            risk_level: self.risk_level(),
            crisis_mode: self.crisis_mode(),
            region_code: self.region_code(),
        }
        .serialize(serializer)
    }
}

/// Role of a chat message author.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, Serialize, Deserialize)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    User,
    Assistant,
    System,
}

/// An inbound chat message.
///
/// The content is read by the moderation gateway and, on a pass, by the AI
/// capability, then dropped with the request. The type has no `Serialize`
/// impl and its `Debug` output omits the content.
#[derive(Clone, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
    #[serde(default)]
    pub region_code: Option<RegionCode>,
}

impl ChatMessage {
    /// Create a user-authored message.
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            content: content.into(),
            region_code: None,
        }
    }

    /// Attach a region code.
    pub fn with_region(mut self, region_code: RegionCode) -> Self {
        self.region_code = Some(region_code);
        self
    }

    /// Reject empty or oversized content before screening.
    pub fn validate(&self) -> Result<(), LifelineError> {
        if self.content.trim().is_empty() {
            return Err(LifelineError::Validation(
                "content must not be empty".to_string(),
            ));
        }
        let chars = self.content.chars().count();
        if chars > MAX_CHAT_CONTENT_CHARS {
            return Err(LifelineError::Validation(format!(
                "content exceeds {MAX_CHAT_CONTENT_CHARS} characters ({chars})"
            )));
        }
        Ok(())
    }
}

impl fmt::Debug for ChatMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChatMessage")
            .field("role", &self.role)
            .field("content", &format_args!("[{} chars]", self.content.chars().count()))
            .field("region_code", &self.region_code)
            .finish()
    }
}

/// Verdict from the external content-safety capability.
///
/// Treated as authoritative: the gateway never re-derives it from the text.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModerationVerdict {
    pub allowed: bool,
    pub crisis_signal: bool,
    #[serde(default)]
    pub categories: BTreeSet<String>,
}

impl ModerationVerdict {
    /// A clean pass.
    pub fn allow() -> Self {
        Self {
            allowed: true,
            crisis_signal: false,
            categories: BTreeSet::new(),
        }
    }

    /// Substituted when the capability fails or times out.
    pub fn fail_closed() -> Self {
        Self {
            allowed: false,
            crisis_signal: false,
            categories: BTreeSet::new(),
        }
    }

    /// A verdict carrying a crisis signal.
    pub fn crisis<I, S>(categories: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            allowed: false,
            crisis_signal: true,
            categories: categories.into_iter().map(Into::into).collect(),
        }
    }

    /// A disallowed verdict without a crisis signal.
    pub fn blocked<I, S>(categories: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            allowed: false,
            crisis_signal: false,
            categories: categories.into_iter().map(Into::into).collect(),
        }
    }
}

/// Reply to a chat message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatReply {
    /// Moderation passed and the AI capability answered.
    Reply { content: String },
    /// Moderation disallowed the message; fixed safety template.
    Blocked { content: String },
    /// Moderation raised a crisis signal; chat must stop and the crisis
    /// experience takes over.
    Crisis {
        content: String,
        region_code: Option<RegionCode>,
    },
    /// Moderation passed but the AI capability failed; fixed fallback text.
    Unavailable { content: String },
}

impl ChatReply {
    pub fn content(&self) -> &str {
        match self {
            ChatReply::Reply { content }
            | ChatReply::Blocked { content }
            | ChatReply::Crisis { content, .. }
            | ChatReply::Unavailable { content } => content,
        }
    }

    pub fn blocked(&self) -> bool {
        matches!(self, ChatReply::Blocked { .. })
    }

    pub fn crisis_mode(&self) -> bool {
        matches!(self, ChatReply::Crisis { .. })
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ChatReplyWire<'a> {
    content: &'a str,
    blocked: bool,
    crisis_mode: bool,
}

impl Serialize for ChatReply {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        ChatReplyWire {
            content: self.content(),
            blocked: self.blocked(),
            crisis_mode: self.crisis_mode(),
        }
        .serialize(serializer)
    }
}

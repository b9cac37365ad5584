//! Structured join-error messages sent back to a joiner.
//!
//! These are distinct from generic DMs: on a typed-content capable
//! substrate they travel under the `convos.app/inviteJoinError:1.0` content
//! type, and the payload itself is a small UTF-8 JSON object so untyped
//! clients can still render something.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, thiserror::Error)]
pub enum ContentError {
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Why a join request was rejected.
///
/// Decoding collapses every unrecognized `errorType` string to `Unknown`
/// so older clients keep working when new variants ship.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum JoinErrorKind {
    ConversationExpired,
    GenericFailure,
    Unknown,
}

impl JoinErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            JoinErrorKind::ConversationExpired => "conversationExpired",
            JoinErrorKind::GenericFailure => "genericFailure",
            JoinErrorKind::Unknown => "unknown",
        }
    }

    /// Fixed user-facing message for this kind.
    pub fn user_message(&self) -> &'static str {
        match self {
            JoinErrorKind::ConversationExpired => "This conversation is no longer available",
            _ => "Failed to join conversation",
        }
    }
}

impl From<String> for JoinErrorKind {
    fn from(value: String) -> Self {
        match value.as_str() {
            "conversationExpired" => JoinErrorKind::ConversationExpired,
            "genericFailure" => JoinErrorKind::GenericFailure,
            _ => JoinErrorKind::Unknown,
        }
    }
}

impl From<JoinErrorKind> for String {
    fn from(kind: JoinErrorKind) -> Self {
        kind.as_str().to_string()
    }
}

/// The join-error payload addressed to the joiner.
///
/// Serializes as `{ "errorType", "inviteTag", "timestamp" }` with an
/// ISO-8601 UTC timestamp.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JoinErrorContent {
    pub error_type: JoinErrorKind,
    pub invite_tag: String,
    pub timestamp: DateTime<Utc>,
}

impl JoinErrorContent {
    pub fn new(error_type: JoinErrorKind, invite_tag: impl Into<String>) -> Self {
        Self {
            error_type,
            invite_tag: invite_tag.into(),
            timestamp: Utc::now(),
        }
    }

    pub fn conversation_expired(invite_tag: impl Into<String>) -> Self {
        Self::new(JoinErrorKind::ConversationExpired, invite_tag)
    }

    pub fn generic_failure(invite_tag: impl Into<String>) -> Self {
        Self::new(JoinErrorKind::GenericFailure, invite_tag)
    }

    pub fn encode(&self) -> Result<Vec<u8>, ContentError> {
        Ok(serde_json::to_vec(self)?)
    }

    pub fn decode(bytes: &[u8]) -> Result<Self, ContentError> {
        Ok(serde_json::from_slice(bytes)?)
    }

    pub fn user_message(&self) -> &'static str {
        self.error_type.user_message()
    }
}

/// Identity of a content type on a typed-content capable substrate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentTypeId {
    pub authority_id: &'static str,
    pub type_id: &'static str,
    pub version_major: u32,
    /// Carried for wire-shape compatibility; nothing keys off it.
    pub version_minor: u32,
}

/// Content type under which join errors are delivered.
pub const INVITE_JOIN_ERROR_CONTENT_TYPE: ContentTypeId = ContentTypeId {
    authority_id: "convos.app",
    type_id: "inviteJoinError",
    version_major: 1,
    version_minor: 0,
};

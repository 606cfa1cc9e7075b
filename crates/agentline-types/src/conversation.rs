//! Conversation message and agent API payload types.
//!
//! A conversation is an ordered list of [`StoredMessage`]s sharing a
//! `session_id`. Session ids are opaque client-chosen strings, not UUIDs.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use std::fmt;
use std::str::FromStr;

use crate::extraction::{ExtractedResult, Sentiment};

/// Who authored a stored message.
///
/// Maps to the CHECK constraint in the SQLite schema:
/// `CHECK (message_type IN ('human', 'ai'))`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageType {
    Human,
    Ai,
}

impl MessageType {
    /// Speaker label used when a message is replayed into a prompt.
    pub fn speaker(&self) -> &'static str {
        match self {
            MessageType::Human => "User",
            MessageType::Ai => "Assistant",
        }
    }
}

impl fmt::Display for MessageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MessageType::Human => write!(f, "human"),
            MessageType::Ai => write!(f, "ai"),
        }
    }
}

impl FromStr for MessageType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "human" => Ok(MessageType::Human),
            "ai" => Ok(MessageType::Ai),
            other => Err(format!("invalid message type: '{other}'")),
        }
    }
}

/// A single persisted conversation turn.
///
/// `data` carries per-message metadata: for assistant turns the request id,
/// confidence and sentiment; for failed requests the error text.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredMessage {
    pub id: Uuid,
    pub session_id: String,
    pub message_type: MessageType,
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
    pub created_at: DateTime<Utc>,
}

impl StoredMessage {
    /// Build a new message stamped with a fresh v7 id and the current time.
    pub fn new(
        session_id: impl Into<String>,
        message_type: MessageType,
        content: impl Into<String>,
        data: Option<serde_json::Value>,
    ) -> Self {
        Self {
            id: Uuid::now_v7(),
            session_id: session_id.into(),
            message_type,
            content: content.into(),
            data,
            created_at: Utc::now(),
        }
    }
}

/// Body of `POST /api/agent`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentRequest {
    /// The user's input text.
    pub query: String,
    pub user_id: String,
    pub request_id: String,
    pub session_id: String,
}

/// Result of `POST /api/agent`. The reply itself is read back from the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentResponse {
    pub success: bool,
}

/// Body of `POST /api/test-extraction`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractionTestRequest {
    pub text: String,
}

/// The extracted triple plus an echo of the input.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractionTestResponse {
    pub response: String,
    pub confidence: f64,
    pub sentiment: Sentiment,
    pub raw_output: String,
}

impl ExtractionTestResponse {
    pub fn new(result: ExtractedResult, raw_output: String) -> Self {
        Self {
            response: result.response,
            confidence: result.confidence,
            sentiment: result.sentiment,
            raw_output,
        }
    }
}

//! Short-term memory item types.
//!
//! Memory items mirror recent conversation turns in process so prompt
//! assembly does not have to hit the conversation store on every request.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

/// Kind of content a memory item holds.
///
/// Only `Message` items take part in history formatting; the other kinds are
/// carried so snapshots written by richer producers still load.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MemoryType {
    Message,
    Summary,
    Fact,
    Metadata,
}

impl fmt::Display for MemoryType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MemoryType::Message => write!(f, "message"),
            MemoryType::Summary => write!(f, "summary"),
            MemoryType::Fact => write!(f, "fact"),
            MemoryType::Metadata => write!(f, "metadata"),
        }
    }
}

impl FromStr for MemoryType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "message" => Ok(MemoryType::Message),
            "summary" => Ok(MemoryType::Summary),
            "fact" => Ok(MemoryType::Fact),
            "metadata" => Ok(MemoryType::Metadata),
            other => Err(format!("invalid memory type: '{other}'")),
        }
    }
}

/// Sender of a remembered message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MemoryRole {
    Human,
    Ai,
    System,
}

impl MemoryRole {
    /// Prompt speaker label. Everything that is not the assistant reads as the user.
    pub fn speaker(&self) -> &'static str {
        match self {
            MemoryRole::Ai => "Assistant",
            MemoryRole::Human | MemoryRole::System => "User",
        }
    }
}

impl fmt::Display for MemoryRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MemoryRole::Human => write!(f, "human"),
            MemoryRole::Ai => write!(f, "ai"),
            MemoryRole::System => write!(f, "system"),
        }
    }
}

impl FromStr for MemoryRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "human" => Ok(MemoryRole::Human),
            "ai" => Ok(MemoryRole::Ai),
            "system" => Ok(MemoryRole::System),
            other => Err(format!("invalid memory role: '{other}'")),
        }
    }
}

/// A single entry in short-term memory.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemoryItem {
    pub id: Uuid,
    pub session_id: String,
    pub user_id: String,
    pub memory_type: MemoryType,
    pub role: MemoryRole,
    pub content: String,
    /// Importance score between 0 and 1.
    #[serde(default = "default_importance")]
    pub importance: f64,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub metadata: HashMap<String, serde_json::Value>,
}

fn default_importance() -> f64 {
    0.5
}

impl MemoryItem {
    /// A conversation message item with default importance.
    pub fn message(
        session_id: impl Into<String>,
        user_id: impl Into<String>,
        role: MemoryRole,
        content: impl Into<String>,
        metadata: HashMap<String, serde_json::Value>,
    ) -> Self {
        Self {
            id: Uuid::now_v7(),
            session_id: session_id.into(),
            user_id: user_id.into(),
            memory_type: MemoryType::Message,
            role,
            content: content.into(),
            importance: default_importance(),
            created_at: Utc::now(),
            metadata,
        }
    }

    /// Set importance, clamped into `[0, 1]`.
    pub fn with_importance(mut self, importance: f64) -> Self {
        self.importance = if importance.is_finite() {
            importance.clamp(0.0, 1.0)
        } else {
            default_importance()
        };
        self
    }

    pub fn is_message(&self) -> bool {
        self.memory_type == MemoryType::Message
    }
}

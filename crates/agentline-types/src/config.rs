//! Configuration types for Agentline.
//!
//! `AgentConfig` represents the top-level `config.toml`. Every section and
//! field has a default, so an empty file (or no file) is a valid config.
//! Secrets (API keys, the bearer token) are never read from this file; they
//! come from the environment only. [`LoggingConfig`] is also env-only, since
//! the subscriber is installed before the file is read.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use crate::llm::DEFAULT_MODEL;

/// Top-level service configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentConfig {
    pub server: ServerConfig,
    pub llm: LlmConfig,
    pub memory: MemoryConfig,
}

/// HTTP bind settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8001,
        }
    }
}

/// Model selection and request shaping.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    /// `"<provider>:<model>"`, see [`crate::llm::ModelSpec`].
    pub model: String,
    pub base_url: String,
    pub max_tokens: u32,
    pub temperature: Option<f64>,
    pub timeout_secs: u64,
    /// Number of stored messages replayed into the prompt.
    pub history_limit: u32,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            base_url: "https://api.openai.com/v1".to_string(),
            max_tokens: 1024,
            temperature: None,
            timeout_secs: 120,
            history_limit: 10,
        }
    }
}

/// Short-term memory settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MemoryConfig {
    /// Maximum items kept per session.
    pub short_term_size: usize,
    /// Sessions kept in memory; the least recently written one is dropped
    /// past this.
    pub max_sessions: usize,
    pub persistence_enabled: bool,
    /// Directory for the short-term snapshot; `{data_dir}/memory_data` when unset.
    pub persistence_dir: Option<PathBuf>,
    /// Rough prompt budget for history, in tokens.
    pub token_limit: u32,
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            short_term_size: 10,
            max_sessions: 100,
            persistence_enabled: true,
            persistence_dir: None,
            token_limit: 4000,
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

impl fmt::Display for LogFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogFormat::Pretty => write!(f, "pretty"),
            LogFormat::Json => write!(f, "json"),
        }
    }
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pretty" | "text" => Ok(LogFormat::Pretty),
            "json" => Ok(LogFormat::Json),
            other => Err(format!("invalid log format: '{other}'")),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub format: LogFormat,
    /// Default filter directive when `RUST_LOG` is unset.
    pub level: Option<String>,
    /// Bridge spans to OpenTelemetry (stdout exporter).
    pub otel: bool,
}

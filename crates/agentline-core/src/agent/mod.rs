//! Agent orchestration: prompt assembly and the request flow.

pub mod prompt;
pub mod service;

pub use service::{AgentError, AgentService, AgentSettings, ERROR_RESPONSE, test_extraction};

//! OpenAI chat-completions provider.
//!
//! [`OpenAiProvider`] implements
//! [`LlmProvider`](agentline_core::llm::provider::LlmProvider) against any
//! endpoint speaking the `/chat/completions` protocol.

pub mod client;
pub mod types;

pub use client::OpenAiProvider;

//! Infrastructure layer for Agentline.
//!
//! Contains implementations of the ports defined in `agentline-core`: the
//! SQLite conversation store, the OpenAI-compatible LLM client, and the JSON
//! snapshot for short-term memory. Also owns config loading and data
//! directory resolution.

pub mod config;
pub mod filesystem;
pub mod llm;
pub mod memory;
pub mod sqlite;

//! Business logic and port definitions for Agentline.
//!
//! This crate holds the response-extraction cascade, short-term memory, prompt
//! assembly, and the agent service, plus the traits (ports) the
//! infrastructure layer implements. It depends only on `agentline-types` --
//! never on `agentline-infra` or any database/IO crate.

pub mod agent;
pub mod extract;
pub mod llm;
pub mod memory;
pub mod repository;

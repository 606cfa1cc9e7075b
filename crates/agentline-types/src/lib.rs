//! Shared domain types for Agentline.
//!
//! This crate contains the domain types used across the service: the
//! extraction triple, stored conversation messages, short-term memory items,
//! LLM request/response shapes, configuration, and their error types.
//!
//! Zero infrastructure dependencies -- only serde, uuid, chrono, thiserror.

pub mod config;
pub mod conversation;
pub mod error;
pub mod extraction;
pub mod llm;
pub mod memory;

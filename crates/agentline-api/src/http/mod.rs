//! HTTP/REST API layer for Agentline.
//!
//! Axum-based API under `/api/` with bearer token authentication on the
//! conversation routes, envelope responses for session data, and CORS.

pub mod error;
pub mod extractors;
pub mod handlers;
pub mod response;
pub mod router;

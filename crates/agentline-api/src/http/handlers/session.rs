//! Session HTTP handlers.
//!
//! Endpoints:
//! - GET    /api/sessions/{id}/messages        - Messages of a session, oldest first
//! - GET    /api/sessions/{id}/messages/latest - The newest message
//! - DELETE /api/sessions/{id}                 - Delete a session and its memory

use std::time::Instant;

use axum::Json;
use axum::extract::{Path, Query, State};
use serde::Deserialize;
use uuid::Uuid;

use agentline_types::conversation::StoredMessage;

use crate::http::error::AppError;
use crate::http::extractors::auth::Authenticated;
use crate::http::response::ApiResponse;
use crate::state::AppState;

/// Query parameters for message listing.
#[derive(Debug, Deserialize)]
pub struct MessageListQuery {
    #[serde(default = "default_message_limit")]
    pub limit: Option<i64>,
    #[serde(default)]
    pub offset: Option<i64>,
}

fn default_message_limit() -> Option<i64> {
    Some(100)
}

impl MessageListQuery {
    fn validate(&self) -> Result<(), AppError> {
        if self.limit.is_some_and(|l| l < 1) {
            return Err(AppError::Validation("limit must be at least 1".to_string()));
        }
        if self.offset.is_some_and(|o| o < 0) {
            return Err(AppError::Validation("offset must not be negative".to_string()));
        }
        Ok(())
    }
}

/// Result of deleting a session.
#[derive(Debug, serde::Serialize)]
pub struct SessionCleared {
    pub session_id: String,
    pub deleted_messages: u64,
}

/// GET /api/sessions/{id}/messages - List messages for a session.
pub async fn get_messages(
    State(state): State<AppState>,
    _auth: Authenticated,
    Path(session_id): Path<String>,
    Query(query): Query<MessageListQuery>,
) -> Result<Json<ApiResponse<Vec<StoredMessage>>>, AppError> {
    let start = Instant::now();
    let request_id = Uuid::now_v7().to_string();
    query.validate()?;

    let messages = state
        .agent_service
        .session_messages(&session_id, query.limit, query.offset)
        .await?;

    let elapsed = start.elapsed().as_millis() as u64;
    let resp = ApiResponse::success(messages, request_id, elapsed)
        .with_link("self", &format!("/api/sessions/{session_id}/messages"))
        .with_link(
            "latest",
            &format!("/api/sessions/{session_id}/messages/latest"),
        );

    Ok(Json(resp))
}

/// GET /api/sessions/{id}/messages/latest - The newest message of a session.
pub async fn get_latest_message(
    State(state): State<AppState>,
    _auth: Authenticated,
    Path(session_id): Path<String>,
) -> Result<Json<ApiResponse<StoredMessage>>, AppError> {
    let start = Instant::now();
    let request_id = Uuid::now_v7().to_string();

    let message = state
        .agent_service
        .latest_message(&session_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Session '{session_id}' has no messages")))?;

    let elapsed = start.elapsed().as_millis() as u64;
    let resp = ApiResponse::success(message, request_id, elapsed).with_link(
        "messages",
        &format!("/api/sessions/{session_id}/messages"),
    );

    Ok(Json(resp))
}

/// DELETE /api/sessions/{id} - Remove a session from the store and memory.
pub async fn delete_session(
    State(state): State<AppState>,
    _auth: Authenticated,
    Path(session_id): Path<String>,
) -> Result<Json<ApiResponse<SessionCleared>>, AppError> {
    let start = Instant::now();
    let request_id = Uuid::now_v7().to_string();

    let deleted_messages = state.agent_service.clear_session(&session_id).await?;

    let elapsed = start.elapsed().as_millis() as u64;
    Ok(Json(ApiResponse::success(
        SessionCleared {
            session_id,
            deleted_messages,
        },
        request_id,
        elapsed,
    )))
}

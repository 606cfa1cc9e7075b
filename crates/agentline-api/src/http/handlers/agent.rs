//! Agent endpoint.
//!
//! - POST /api/agent - Run one query through the agent

use axum::Json;
use axum::extract::State;

use agentline_types::conversation::{AgentRequest, AgentResponse};

use crate::http::error::AppError;
use crate::http::extractors::auth::Authenticated;
use crate::state::AppState;

/// POST /api/agent - Process a query and persist the exchange.
///
/// The reply is not returned here; clients read it back from the session.
/// Failures inside the agent surface as `{"success": false}` with a 200.
pub async fn run_agent(
    State(state): State<AppState>,
    _auth: Authenticated,
    Json(request): Json<AgentRequest>,
) -> Result<Json<AgentResponse>, AppError> {
    if request.session_id.trim().is_empty() {
        return Err(AppError::Validation("session_id must not be empty".to_string()));
    }

    let response = state.agent_service.process(&request).await;
    Ok(Json(response))
}

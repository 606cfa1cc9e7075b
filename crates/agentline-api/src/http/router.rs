//! Axum router configuration with middleware.
//!
//! Conversation routes live under `/api/` and require a bearer token; the
//! extraction debug route, `/` and `/health` are open.
//! Middleware: CORS, tracing.

use axum::Router;
use axum::extract::State;
use axum::routing::{delete, get, post};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::http::handlers;
use crate::state::AppState;

/// Build the complete API router with all routes and middleware.
pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let api_routes = Router::new()
        .route("/agent", post(handlers::agent::run_agent))
        .route(
            "/test-extraction",
            post(handlers::extraction::test_extraction_endpoint),
        )
        .route(
            "/sessions/{id}/messages",
            get(handlers::session::get_messages),
        )
        .route(
            "/sessions/{id}/messages/latest",
            get(handlers::session::get_latest_message),
        )
        .route("/sessions/{id}", delete(handlers::session::delete_session));

    Router::new()
        .nest("/api", api_routes)
        .route("/", get(service_info))
        .route("/health", get(health_check))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// GET / - Service description and endpoint list.
async fn service_info(State(state): State<AppState>) -> axum::Json<serde_json::Value> {
    let stored_messages = match state.agent_service.message_count().await {
        Ok(count) => Some(count),
        Err(e) => {
            tracing::warn!(error = %e, "failed to count stored messages");
            None
        }
    };

    axum::Json(serde_json::json!({
        "name": "agentline",
        "version": env!("CARGO_PKG_VERSION"),
        "description": "Conversational agent with structured response extraction",
        "model": state.config.llm.model,
        "provider": state.agent_service.provider_name(),
        "stored_messages": stored_messages,
        "endpoints": {
            "agent": "POST /api/agent",
            "test_extraction": "POST /api/test-extraction",
            "messages": "GET /api/sessions/{session_id}/messages",
            "latest_message": "GET /api/sessions/{session_id}/messages/latest",
            "delete_session": "DELETE /api/sessions/{session_id}",
            "health": "GET /health",
        },
    }))
}

/// GET /health - Simple health check endpoint (no auth required).
async fn health_check() -> axum::Json<serde_json::Value> {
    axum::Json(serde_json::json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

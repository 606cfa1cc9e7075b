//! Bearer token authentication extractor.
//!
//! Extracts the token from `Authorization: Bearer <token>` and compares its
//! SHA-256 digest with the digest of `API_BEARER_TOKEN` held in state.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use sha2::{Digest, Sha256};

use crate::http::error::AppError;
use crate::state::AppState;

/// Authenticated request marker. Extracting this validates the bearer token.
pub struct Authenticated;

impl FromRequestParts<AppState> for Authenticated {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let Some(expected) = state.bearer_digest.as_deref() else {
            return Err(AppError::Internal(
                "API_BEARER_TOKEN environment variable not set".to_string(),
            ));
        };

        let token = extract_bearer_token(parts)?;
        if hash_token(&token) == expected {
            Ok(Authenticated)
        } else {
            Err(AppError::Unauthorized("Invalid authentication token".to_string()))
        }
    }
}

/// Extract the bearer token from the `Authorization` header.
fn extract_bearer_token(parts: &Parts) -> Result<String, AppError> {
    let Some(auth) = parts.headers.get(axum::http::header::AUTHORIZATION) else {
        return Err(AppError::Unauthorized(
            "Missing token. Provide it via 'Authorization: Bearer <token>'.".to_string(),
        ));
    };

    let auth_str = auth
        .to_str()
        .map_err(|_| AppError::Unauthorized("Invalid Authorization header encoding".to_string()))?;

    match auth_str.strip_prefix("Bearer ") {
        Some(token) if !token.trim().is_empty() => Ok(token.trim().to_string()),
        _ => Err(AppError::Unauthorized(
            "Invalid authentication scheme".to_string(),
        )),
    }
}

/// SHA-256 of a token (lowercase hex).
pub fn hash_token(token: &str) -> String {
    let digest = Sha256::digest(token.as_bytes());
    format!("{:x}", digest)
}

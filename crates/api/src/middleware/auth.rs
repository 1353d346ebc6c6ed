//! Token authentication for protected routes.
//!
//! Clients send `Authorization: Token <key>`. User keys are looked up by
//! their SHA-256 hash; the statistics endpoint instead compares against
//! the configured admin token.

use axum::{
    Json,
    extract::{FromRequestParts, Request, State},
    http::{StatusCode, header::AUTHORIZATION, request::Parts},
    middleware::Next,
    response::{IntoResponse, Response},
};
use coinvault_db::UserRepository;
use coinvault_shared::types::UserId;
use serde_json::json;
use sha2::{Digest, Sha256};
use tracing::error;

use crate::{AppState, error::ApiError};

/// Extracts the key from a `Token <key>` Authorization header.
fn extract_token(header: &str) -> Option<&str> {
    header
        .strip_prefix("Token ")
        .or_else(|| header.strip_prefix("token "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

fn request_token(request: &Request) -> Option<&str> {
    request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(extract_token)
}

/// Compares two tokens without short-circuiting on the first differing byte.
///
/// Both sides are hashed first; timing reveals neither a matching prefix nor
/// the configured token's length.
fn tokens_match(given: &str, expected: &str) -> bool {
    let given = Sha256::digest(given.as_bytes());
    let expected = Sha256::digest(expected.as_bytes());
    given
        .iter()
        .zip(expected.iter())
        .fold(0u8, |diff, (a, b)| diff | (a ^ b))
        == 0
}

/// Authentication middleware that resolves user tokens.
///
/// The authenticated user is stored in request extensions for [`AuthUser`].
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    let Some(token) = request_token(&request) else {
        return ApiError::unauthorized("Authorization header with Token is required")
            .into_response();
    };

    let users = UserRepository::new((*state.db).clone());
    match users.find_by_token(token).await {
        Ok(Some(user)) => {
            request.extensions_mut().insert(AuthUser {
                id: UserId::from_uuid(user.id),
                username: user.username,
            });
            next.run(request).await
        }
        Ok(None) => ApiError::unauthorized("Invalid token").into_response(),
        Err(e) => {
            error!(error = %e, "Failed to look up token");
            ApiError::from(e).into_response()
        }
    }
}

/// Admin middleware comparing the token with `platform.admin_token`.
pub async fn admin_middleware(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    match request_token(&request) {
        Some(token) if tokens_match(token, &state.admin_token) => next.run(request).await,
        Some(_) => ApiError::unauthorized("Invalid token").into_response(),
        None => ApiError::unauthorized("Authorization header with Token is required")
            .into_response(),
    }
}

/// Extractor for the authenticated user.
#[derive(Debug, Clone)]
pub struct AuthUser {
    /// User ID.
    pub id: UserId,
    /// Username.
    pub username: String,
}

impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = (StatusCode, Json<serde_json::Value>);

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts.extensions.get::<Self>().cloned().ok_or_else(|| {
            (
                StatusCode::UNAUTHORIZED,
                Json(json!({
                    "error": "UNAUTHORIZED",
                    "message": "Authentication required",
                    "status_code": 401
                })),
            )
        })
    }
}

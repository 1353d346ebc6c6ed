//! User registration.

use axum::{
    Json, Router, extract::State, http::StatusCode, response::IntoResponse, routing::post,
};
use coinvault_db::UserRepository;
use serde::{Deserialize, Serialize};
use tracing::{error, info};

use crate::{AppState, error::ApiError};

const MAX_USERNAME_LEN: usize = 150;

/// Creates the user routes.
pub fn routes() -> Router<AppState> {
    Router::new().route("/users", post(create_user))
}

/// Request body for registering a user.
#[derive(Debug, Deserialize)]
pub struct CreateUserRequest {
    /// Unique username.
    pub username: String,
}

/// Response carrying the new user's API token.
#[derive(Debug, Serialize)]
pub struct CreateUserResponse {
    /// Username as stored.
    pub username: String,
    /// Plain API token; only its hash is stored, so it is shown once.
    pub token: String,
}

fn validate_username(username: &str) -> Result<&str, ApiError> {
    let username = username.trim();
    if username.is_empty() {
        return Err(ApiError::new(
            StatusCode::BAD_REQUEST,
            "VALIDATION_ERROR",
            "Username is required",
        ));
    }
    if username.chars().count() > MAX_USERNAME_LEN {
        return Err(ApiError::new(
            StatusCode::BAD_REQUEST,
            "VALIDATION_ERROR",
            format!("Ensure username has no more than {MAX_USERNAME_LEN} characters."),
        ));
    }
    Ok(username)
}

/// POST `/users` - Register a user and issue a token.
async fn create_user(
    State(state): State<AppState>,
    Json(payload): Json<CreateUserRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let username = validate_username(&payload.username)?;
    let users = UserRepository::new((*state.db).clone());

    if users.find_by_username(username).await?.is_some() {
        return Err(ApiError::new(
            StatusCode::CONFLICT,
            "USERNAME_TAKEN",
            "A user with that username already exists.",
        ));
    }

    let created = users.create(username).await.map_err(|e| {
        error!(error = %e, "Failed to create user");
        ApiError::from(e)
    })?;
    info!(user_id = %created.user.id, "User registered");

    Ok((
        StatusCode::CREATED,
        Json(CreateUserResponse {
            username: created.user.username,
            token: created.token,
        }),
    ))
}

// handlers/public/auth/login.rs - POST /auth/login handler

use axum::{extract::rejection::JsonRejection, extract::State, Json};
use serde::{Deserialize, Serialize};

use crate::database::models::User;
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult};
use crate::state::AppState;

pub const BAD_CREDENTIALS: &str = "Incorrect email or password";

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub user: User,
}

/// POST /auth/login - Exchange credentials for a bearer token
///
/// Expected Output (Success):
/// ```json
/// {
///   "token": "eyJhbGciOiJIUzI1NiI...",
///   "user": { "id": 1, "email": "a@x.com", "name": null, "role": "USER", "createdAt": "..." }
/// }
/// ```
///
/// Unknown email and wrong password produce the same 400.
pub async fn login(
    State(state): State<AppState>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> ApiResult<LoginResponse> {
    let Json(payload) = payload?;
    let (Some(email), Some(password)) = (payload.email, payload.password) else {
        return Err(ApiError::bad_request(BAD_CREDENTIALS));
    };

    let Some(record) = state.store().find_user_by_email(&email).await? else {
        tracing::warn!("login failed: unknown email");
        return Err(ApiError::bad_request(BAD_CREDENTIALS));
    };

    let hasher = state.passwords().clone();
    let stored_hash = record.password.clone();
    let matches =
        tokio::task::spawn_blocking(move || hasher.verify(&password, &stored_hash)).await?;
    if !matches {
        tracing::warn!("login failed: wrong password for user {}", record.id);
        return Err(ApiError::bad_request(BAD_CREDENTIALS));
    }

    let token = state.tokens().issue(record.id, record.role)?;

    Ok(ApiResponse::ok(LoginResponse {
        token,
        user: User::from(record),
    }))
}

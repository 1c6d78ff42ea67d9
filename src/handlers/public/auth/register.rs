// handlers/public/auth/register.rs - POST /auth/register handler

use axum::{extract::rejection::JsonRejection, extract::State, Json};
use serde::Deserialize;

use crate::database::models::{NewUser, User};
use crate::database::DatabaseError;
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult};
use crate::state::AppState;

pub const EMAIL_TAKEN: &str = "Email already in use";
pub const MISSING_CREDENTIALS: &str = "Email and password are required";

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub email: Option<String>,
    pub password: Option<String>,
    pub name: Option<String>,
}

/// POST /auth/register - Create a USER account
///
/// Expected Input:
/// ```json
/// { "email": "a@x.com", "password": "p1", "name": "Alice" }
/// ```
///
/// Responds 201 with the account (never the password). Missing email or
/// password and an already-registered email are both 400.
pub async fn register(
    State(state): State<AppState>,
    payload: Result<Json<RegisterRequest>, JsonRejection>,
) -> ApiResult<User> {
    let Json(payload) = payload?;

    let email = payload.email.filter(|e| !e.is_empty());
    let password = payload.password.filter(|p| !p.is_empty());
    let (Some(email), Some(password)) = (email, password) else {
        return Err(ApiError::bad_request(MISSING_CREDENTIALS));
    };

    if state.store().find_user_by_email(&email).await?.is_some() {
        return Err(ApiError::bad_request(EMAIL_TAKEN));
    }

    let hasher = state.passwords().clone();
    let password_hash = tokio::task::spawn_blocking(move || hasher.hash(&password)).await??;

    // A concurrent registration can still win the race to the unique index
    let user = state
        .store()
        .create_user(NewUser {
            email,
            password_hash,
            name: payload.name,
        })
        .await
        .map_err(|e| match e {
            DatabaseError::Conflict(_) => ApiError::bad_request(EMAIL_TAKEN),
            other => other.into(),
        })?;

    tracing::info!("registered user {} <{}>", user.id, user.email);
    Ok(ApiResponse::created(user))
}

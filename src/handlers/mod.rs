// handlers/mod.rs - Handlers grouped by security tier
//
// Public (no auth) → Protected (bearer token) → Elevated (bearer token + ADMIN role)

pub mod elevated;
pub mod protected;
pub mod public;

use crate::error::ApiError;

/// Fallback for unmatched routes
pub async fn not_found() -> ApiError {
    ApiError::not_found("Route not found")
}

use axum::{extract::Request, middleware::Next, response::Response};

use super::auth::Identity;
use crate::error::ApiError;

pub const ADMIN_ONLY: &str = "Access denied: admin only";

/// Role gate. Layer it inside [`super::require_auth`]; without an identity
/// on the request it refuses like any non-admin.
pub async fn require_admin(
    identity: Option<Identity>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    match identity {
        Some(identity) if identity.is_admin() => Ok(next.run(request).await),
        Some(identity) => {
            tracing::warn!(
                "user {} ({}) denied admin access to {}",
                identity.id(),
                identity.role(),
                request.uri().path()
            );
            Err(ApiError::forbidden(ADMIN_ONLY))
        }
        None => Err(ApiError::forbidden(ADMIN_ONLY)),
    }
}

use axum::{
    async_trait,
    extract::{FromRequestParts, Request, State},
    http::{header::AUTHORIZATION, request::Parts, HeaderMap},
    middleware::Next,
    response::Response,
};

use crate::auth::TokenSubject;
use crate::database::models::Role;
use crate::error::ApiError;
use crate::state::AppState;

pub const MISSING_TOKEN: &str = "Missing token (expected Authorization: Bearer <token>)";
pub const INVALID_TOKEN: &str = "Invalid or expired token";

/// Caller identity attached by [`require_auth`].
///
/// Fields are private and the only constructor lives in this module, so a
/// handler or later gate holding an `Identity` knows a token was verified.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Identity {
    id: i64,
    role: Role,
}

impl Identity {
    fn from_subject(subject: TokenSubject) -> Self {
        Self {
            id: subject.id,
            role: subject.role,
        }
    }

    pub fn id(&self) -> i64 {
        self.id
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for Identity
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Identity>()
            .copied()
            .ok_or_else(|| ApiError::unauthorized(MISSING_TOKEN))
    }
}

/// Auth gate: verify the bearer token and attach the caller's identity
pub async fn require_auth(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = extract_bearer_token(request.headers()).ok_or_else(|| {
        tracing::warn!("{} {}: missing bearer token", request.method(), request.uri().path());
        ApiError::unauthorized(MISSING_TOKEN)
    })?;

    let subject = state.tokens().verify(token).map_err(|_| {
        tracing::warn!("{} {}: rejected bearer token", request.method(), request.uri().path());
        ApiError::unauthorized(INVALID_TOKEN)
    })?;

    request.extensions_mut().insert(Identity::from_subject(subject));
    Ok(next.run(request).await)
}

/// Token part of an `Authorization: Bearer <token>` header
fn extract_bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let token = value.strip_prefix("Bearer ")?.trim();
    if token.is_empty() {
        None
    } else {
        Some(token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_str(value).unwrap());
        headers
    }

    #[test]
    fn extracts_bearer_token() {
        assert_eq!(extract_bearer_token(&headers("Bearer abc.def.ghi")), Some("abc.def.ghi"));
    }

    #[test]
    fn rejects_other_schemes_and_empty_tokens() {
        assert_eq!(extract_bearer_token(&HeaderMap::new()), None);
        assert_eq!(extract_bearer_token(&headers("Basic dXNlcjpwYXNz")), None);
        assert_eq!(extract_bearer_token(&headers("Bearer ")), None);
        assert_eq!(extract_bearer_token(&headers("bearer abc")), None);
    }
}

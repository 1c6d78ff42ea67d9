use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::database::models::Role;

pub mod password;

pub use password::{PasswordError, PasswordHasher};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub id: i64,
    pub role: Role,
    pub iat: i64,
    pub exp: i64,
}

impl Claims {
    pub fn new(id: i64, role: Role, issued_at: DateTime<Utc>, ttl: Duration) -> Self {
        Self {
            id,
            role,
            iat: issued_at.timestamp(),
            exp: (issued_at + ttl).timestamp(),
        }
    }
}

/// Identity carried by a verified token
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TokenSubject {
    pub id: i64,
    pub role: Role,
}

#[derive(Debug, thiserror::Error)]
pub enum TokenError {
    #[error("JWT generation error: {0}")]
    Generation(String),
    /// Bad signature, malformed payload and expiry all collapse into this.
    #[error("Invalid or expired token")]
    Invalid,
}

/// Issues and verifies signed, time-limited bearer tokens
pub struct TokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    ttl: Duration,
}

impl TokenService {
    pub fn new(secret: &str, ttl: Duration) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp"]);

        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
            ttl,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn issue(&self, id: i64, role: Role) -> Result<String, TokenError> {
        self.issue_at(id, role, Utc::now())
    }

    pub fn issue_at(&self, id: i64, role: Role, issued_at: DateTime<Utc>) -> Result<String, TokenError> {
        let claims = Claims::new(id, role, issued_at, self.ttl);
        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| TokenError::Generation(e.to_string()))
    }

    pub fn verify(&self, token: &str) -> Result<TokenSubject, TokenError> {
        let data = decode::<Claims>(token, &self.decoding_key, &self.validation).map_err(|e| {
            tracing::debug!("token rejected: {}", e);
            TokenError::Invalid
        })?;

        Ok(TokenSubject {
            id: data.claims.id,
            role: data.claims.role,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service(secret: &str) -> TokenService {
        TokenService::new(secret, Duration::days(7))
    }

    #[test]
    fn issued_token_verifies_to_same_identity() {
        let tokens = service("test-secret");
        let token = tokens.issue(42, Role::Admin).unwrap();
        let subject = tokens.verify(&token).unwrap();
        assert_eq!(subject, TokenSubject { id: 42, role: Role::Admin });
    }

    #[test]
    fn expiry_is_seven_days_after_issue() {
        let issued_at = Utc::now();
        let claims = Claims::new(1, Role::User, issued_at, Duration::days(7));
        assert_eq!(claims.exp - claims.iat, 7 * 24 * 60 * 60);
    }

    #[test]
    fn altered_signature_is_rejected() {
        let tokens = service("test-secret");
        let token = tokens.issue(7, Role::User).unwrap();

        // First character of the signature segment encodes six full bits
        let signature_start = token.rfind('.').unwrap() + 1;
        let mut bytes = token.into_bytes();
        bytes[signature_start] = if bytes[signature_start] == b'A' { b'B' } else { b'A' };
        let tampered = String::from_utf8(bytes).unwrap();

        assert!(matches!(tokens.verify(&tampered), Err(TokenError::Invalid)));
    }

    #[test]
    fn token_from_another_secret_is_rejected() {
        let token = service("secret-one").issue(7, Role::User).unwrap();
        assert!(matches!(service("secret-two").verify(&token), Err(TokenError::Invalid)));
    }

    #[test]
    fn expired_token_is_rejected() {
        let tokens = service("test-secret");
        let issued_at = Utc::now() - Duration::days(8);
        let token = tokens.issue_at(7, Role::User, issued_at).unwrap();
        assert!(matches!(tokens.verify(&token), Err(TokenError::Invalid)));
    }

    #[test]
    fn garbage_is_rejected() {
        let tokens = service("test-secret");
        assert!(matches!(tokens.verify("not-a-token"), Err(TokenError::Invalid)));
        assert!(matches!(tokens.verify(""), Err(TokenError::Invalid)));
    }
}

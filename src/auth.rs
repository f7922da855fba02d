use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::errors::ApiError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Role {
    Admin,
    User,
}

/// Decoded token payload, attached to the request extensions by the
/// authentication middleware.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub role: Role,
    pub exp: usize,
}

/// Issues and verifies HS256 bearer tokens with a single process-wide
/// secret, injected at startup.
#[derive(Clone)]
pub struct TokenService {
    encoding: EncodingKey,
    decoding: DecodingKey,
}

impl TokenService {
    pub fn new(secret: &str) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
        }
    }

    pub fn issue(&self, username: &str, role: Role) -> Result<String, ApiError> {
        self.issue_with_ttl(username, role, Duration::hours(1))
    }

    pub(crate) fn issue_with_ttl(
        &self,
        username: &str,
        role: Role,
        ttl: Duration,
    ) -> Result<String, ApiError> {
        let claims = Claims {
            sub: username.to_string(),
            role,
            exp: (Utc::now() + ttl).timestamp() as usize,
        };

        encode(&Header::default(), &claims, &self.encoding).map_err(|_e| ApiError::Internal)
    }

    /// A verified token is authoritative for its lifetime; the role claim
    /// is never re-derived from the identity store.
    pub fn verify(&self, token: &str) -> Result<Claims, ApiError> {
        decode::<Claims>(token, &self.decoding, &Validation::default())
            .map(|data| data.claims)
            .map_err(|_e| ApiError::Unauthenticated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn issue_then_verify_keeps_claims() {
        let tokens = TokenService::new("secret");

        let token = tokens.issue("alice", Role::Admin).unwrap();
        let claims = tokens.verify(&token).unwrap();

        assert_eq!(claims.sub, "alice");
        assert_eq!(claims.role, Role::Admin);
    }

    #[test]
    fn expired_token_is_rejected() {
        let tokens = TokenService::new("secret");

        let token = tokens
            .issue_with_ttl("alice", Role::User, Duration::hours(-2))
            .unwrap();

        assert!(tokens.verify(&token).is_err());
    }

    #[test]
    fn garbage_token_is_rejected() {
        let tokens = TokenService::new("secret");

        assert!(tokens.verify("not-a-token").is_err());
    }

    #[test]
    fn token_from_another_secret_is_rejected() {
        let token = TokenService::new("one")
            .issue("alice", Role::User)
            .unwrap();

        assert!(TokenService::new("two").verify(&token).is_err());
    }
}

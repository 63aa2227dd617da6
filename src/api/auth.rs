//! Session tokens.
//!
//! HS256 JWTs carrying the user id and email, valid for the configured
//! lifetime (one hour by default).

use std::time::{SystemTime, UNIX_EPOCH};

use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::accounts::User;
use crate::config::AuthConfig;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    pub id: i32,
    pub email: String,
    pub iat: u64,
    pub exp: u64,
}

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("JWT secret is not configured")]
    MissingSecret,

    #[error("token is invalid or expired: {0}")]
    Invalid(String),

    #[error("failed to sign token: {0}")]
    Signing(String),
}

pub type AuthResult<T> = Result<T, AuthError>;

/// Signs and verifies session tokens with one shared secret.
#[derive(Clone)]
pub struct TokenIssuer {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
    ttl_secs: u64,
}

impl TokenIssuer {
    pub fn new(config: &AuthConfig) -> AuthResult<Self> {
        if config.jwt_secret.is_empty() {
            return Err(AuthError::MissingSecret);
        }
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        Ok(Self {
            encoding: EncodingKey::from_secret(config.jwt_secret.as_bytes()),
            decoding: DecodingKey::from_secret(config.jwt_secret.as_bytes()),
            validation,
            ttl_secs: config.token_ttl_secs,
        })
    }

    pub fn issue(&self, user: &User) -> AuthResult<String> {
        self.issue_at(user, now_secs())
    }

    /// Token for `user` as if issued at `issued_at` (unix seconds).
    pub fn issue_at(&self, user: &User, issued_at: u64) -> AuthResult<String> {
        let claims = Claims {
            id: user.id,
            email: user.email.clone(),
            iat: issued_at,
            exp: issued_at + self.ttl_secs,
        };
        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|e| AuthError::Signing(e.to_string()))
    }

    pub fn verify(&self, token: &str) -> AuthResult<Claims> {
        decode::<Claims>(token, &self.decoding, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| AuthError::Invalid(e.to_string()))
    }
}

/// Token from an `Authorization: Bearer <token>` header value.
pub fn bearer_token(header: &str) -> Option<&str> {
    header
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

fn now_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn issuer(secret: &str) -> TokenIssuer {
        TokenIssuer::new(&AuthConfig {
            jwt_secret: secret.to_string(),
            token_ttl_secs: 3600,
        })
        .unwrap()
    }

    fn user() -> User {
        User {
            id: 7,
            name: "Ada".into(),
            email: "ada@example.com".into(),
            password: "secret".into(),
        }
    }

    #[test]
    fn test_issue_and_verify() {
        let issuer = issuer("s3cret");
        let token = issuer.issue(&user()).unwrap();
        let claims = issuer.verify(&token).unwrap();
        assert_eq!(claims.id, 7);
        assert_eq!(claims.email, "ada@example.com");
        assert_eq!(claims.exp - claims.iat, 3600);
    }

    #[test]
    fn test_expired_token_is_rejected() {
        let issuer = issuer("s3cret");
        let token = issuer.issue_at(&user(), now_secs() - 7200).unwrap();
        assert!(matches!(issuer.verify(&token), Err(AuthError::Invalid(_))));
    }

    #[test]
    fn test_foreign_secret_is_rejected() {
        let token = issuer("one").issue(&user()).unwrap();
        assert!(issuer("two").verify(&token).is_err());
        assert!(issuer("one").verify("not.a.token").is_err());
    }

    #[test]
    fn test_missing_secret() {
        assert!(matches!(
            TokenIssuer::new(&AuthConfig::default()),
            Err(AuthError::MissingSecret)
        ));
    }

    #[test]
    fn test_bearer_token() {
        assert_eq!(bearer_token("Bearer abc"), Some("abc"));
        assert_eq!(bearer_token("Basic abc"), None);
        assert_eq!(bearer_token("Bearer "), None);
    }
}

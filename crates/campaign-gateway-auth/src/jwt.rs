//! Token validation and claims extraction.
//!
//! Tokens are HS256 JWTs signed with a secret shared between the gateway and
//! the identity service. Validation proves who is asking; whether that account
//! may still act is decided by the [`UserResolver`](crate::UserResolver).

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::Deserialize;

use crate::error::{AuthError, Result};

/// Validated claims extracted from a token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedClaims {
    /// The `sub` claim: account id or email.
    pub subject: String,
    /// When the token expires.
    pub expires_at: DateTime<Utc>,
}

/// Trait for validating tokens.
#[async_trait]
pub trait TokenValidator: Send + Sync {
    /// Validate a raw token and extract its claims.
    ///
    /// # Errors
    ///
    /// Returns `InvalidToken`, `BadSignature` or `Expired`.
    async fn validate(&self, token: &str) -> Result<ValidatedClaims>;
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Subject {
    Text(String),
    Number(u64),
}

#[derive(Debug, Deserialize)]
struct RawClaims {
    sub: Option<Subject>,
    exp: u64,
}

/// HS256 validator using a shared secret.
pub struct HmacValidator {
    key: DecodingKey,
    validation: Validation,
}

impl HmacValidator {
    /// Create a validator for tokens signed with `secret`.
    #[must_use]
    pub fn new(secret: &str) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;
        validation.leeway = 0;
        validation.validate_aud = false;
        validation.set_required_spec_claims(&["exp"]);

        Self {
            key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
        }
    }

    fn validate_sync(&self, token: &str) -> Result<ValidatedClaims> {
        if token.trim().is_empty() {
            return Err(AuthError::InvalidToken("empty token".to_string()));
        }

        let data = decode::<RawClaims>(token, &self.key, &self.validation).map_err(|e| {
            match e.kind() {
                ErrorKind::ExpiredSignature => AuthError::Expired,
                ErrorKind::InvalidSignature => AuthError::BadSignature,
                _ => AuthError::InvalidToken(e.to_string()),
            }
        })?;

        let subject = match data.claims.sub {
            Some(Subject::Text(s)) if !s.is_empty() => s,
            Some(Subject::Number(n)) => n.to_string(),
            _ => return Err(AuthError::InvalidToken("missing subject".to_string())),
        };

        let exp_secs = i64::try_from(data.claims.exp).unwrap_or(i64::MAX);
        let expires_at = DateTime::from_timestamp(exp_secs, 0)
            .ok_or_else(|| AuthError::InvalidToken("invalid exp timestamp".to_string()))?;

        Ok(ValidatedClaims {
            subject,
            expires_at,
        })
    }
}

#[async_trait]
impl TokenValidator for HmacValidator {
    async fn validate(&self, token: &str) -> Result<ValidatedClaims> {
        self.validate_sync(token)
    }
}

/// Mint an HS256 token for `subject` that expires after `ttl`.
///
/// Only meant for tests and local development.
///
/// # Errors
///
/// Returns an error if encoding fails.
#[cfg(any(test, feature = "test-utils"))]
pub fn issue_token(secret: &str, subject: &str, ttl: chrono::Duration) -> Result<String> {
    use jsonwebtoken::{encode, EncodingKey, Header};

    #[derive(serde::Serialize)]
    struct Claims<'a> {
        sub: &'a str,
        exp: i64,
        iat: i64,
    }

    let now = Utc::now();
    let claims = Claims {
        sub: subject,
        exp: (now + ttl).timestamp(),
        iat: now.timestamp(),
    };
    encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| AuthError::Internal(e.to_string()))
}

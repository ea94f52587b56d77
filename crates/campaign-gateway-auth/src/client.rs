//! Identity backend client for live user resolution.
//!
//! A valid token only proves who is asking. Before a protected request is
//! forwarded, the gateway asks the identity service for the caller's current
//! record, so deactivations and role changes apply on the very next request.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Deserialize;

use campaign_gateway_core::UserContext;

use crate::error::{AuthError, Result};
use crate::jwt::ValidatedClaims;
use crate::AuthConfig;

/// Trait for resolving validated claims into a live user context.
#[async_trait]
pub trait UserResolver: Send + Sync {
    /// Fetch the live account behind `claims`.
    ///
    /// `token` is the raw credential the claims were read from; it is
    /// presented to the identity backend unchanged.
    ///
    /// # Errors
    ///
    /// - `IdentityUnavailable` if the backend is unreachable, slow, or failing
    /// - `InvalidToken` if the backend does not know the account
    /// - `InactiveAccount` if the account is deactivated
    async fn resolve(&self, claims: &ValidatedClaims, token: &str) -> Result<UserContext>;
}

/// Account record as returned by the identity service.
#[derive(Debug, Deserialize)]
struct MeResponse {
    id: serde_json::Value,
    email: String,
    #[serde(default)]
    role: String,
    #[serde(alias = "isActive")]
    is_active: bool,
}

impl MeResponse {
    fn into_context(self) -> UserContext {
        let id = match self.id {
            serde_json::Value::String(s) => s,
            other => other.to_string(),
        };
        UserContext {
            id,
            email: self.email,
            role: self.role,
            is_active: self.is_active,
        }
    }
}

/// Client for the identity service's "who am I" endpoint.
#[derive(Debug, Clone)]
pub struct IdentityClient {
    client: reqwest::Client,
    whoami_url: String,
}

impl IdentityClient {
    /// Create a new identity client.
    ///
    /// # Panics
    ///
    /// Panics if the HTTP client cannot be created.
    #[must_use]
    pub fn new(config: &AuthConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.identity_timeout_seconds))
            .connect_timeout(Duration::from_secs(5))
            .build()
            .expect("failed to create HTTP client");

        Self::with_client(client, config)
    }

    /// Create an identity client around an existing `reqwest::Client`.
    #[must_use]
    pub fn with_client(client: reqwest::Client, config: &AuthConfig) -> Self {
        Self {
            client,
            whoami_url: config.whoami_url(),
        }
    }

    /// The URL queried for the caller's record.
    #[must_use]
    pub fn whoami_url(&self) -> &str {
        &self.whoami_url
    }
}

#[async_trait]
impl UserResolver for IdentityClient {
    async fn resolve(&self, claims: &ValidatedClaims, token: &str) -> Result<UserContext> {
        let response = self
            .client
            .get(&self.whoami_url)
            .bearer_auth(token)
            .send()
            .await
            .map_err(|e| {
                let reason = if e.is_timeout() {
                    "timed out".to_string()
                } else {
                    e.to_string()
                };
                tracing::warn!(url = %self.whoami_url, error = %e, "Identity service request failed");
                AuthError::IdentityUnavailable(reason)
            })?;

        let status = response.status();
        match status {
            s if s.is_success() => {}
            StatusCode::UNAUTHORIZED | StatusCode::NOT_FOUND => {
                return Err(AuthError::InvalidToken(format!(
                    "identity service rejected subject {} ({status})",
                    claims.subject
                )));
            }
            StatusCode::FORBIDDEN => return Err(AuthError::InactiveAccount),
            _ => {
                tracing::warn!(url = %self.whoami_url, status = %status, "Identity service error");
                return Err(AuthError::IdentityUnavailable(format!("HTTP {status}")));
            }
        }

        let me: MeResponse = response
            .json()
            .await
            .map_err(|e| AuthError::IdentityUnavailable(format!("invalid response: {e}")))?;
        let user = me.into_context();

        if !user.matches_subject(&claims.subject) {
            tracing::warn!(
                subject = %claims.subject,
                user_id = %user.id,
                "Identity service returned a different account"
            );
            return Err(AuthError::InvalidToken("subject mismatch".to_string()));
        }

        if !user.is_active {
            return Err(AuthError::InactiveAccount);
        }

        Ok(user)
    }
}

/// A resolver that answers from a fixed set of accounts.
///
/// Accounts are looked up by id or email. Unknown subjects resolve to
/// `InvalidToken`, inactive ones to `InactiveAccount`.
#[cfg(any(test, feature = "test-utils"))]
#[derive(Debug, Default)]
pub struct StaticUserResolver {
    /// Known accounts.
    pub users: Vec<UserContext>,
    /// When set, every lookup fails with `IdentityUnavailable`.
    pub unavailable: bool,
}

#[cfg(any(test, feature = "test-utils"))]
#[async_trait]
impl UserResolver for StaticUserResolver {
    async fn resolve(&self, claims: &ValidatedClaims, _token: &str) -> Result<UserContext> {
        if self.unavailable {
            return Err(AuthError::IdentityUnavailable("offline".to_string()));
        }
        let user = self
            .users
            .iter()
            .find(|u| u.matches_subject(&claims.subject))
            .cloned()
            .ok_or_else(|| AuthError::InvalidToken("unknown subject".to_string()))?;
        if !user.is_active {
            return Err(AuthError::InactiveAccount);
        }
        Ok(user)
    }
}

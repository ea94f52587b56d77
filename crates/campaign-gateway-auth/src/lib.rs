//! Authentication for the campaign gateway.
//!
//! Authentication is two steps:
//!
//! - **Token validation**: an HS256 signature and expiry check against the
//!   secret shared with the identity service ([`HmacValidator`])
//! - **User resolution**: a live lookup of the account behind the token on
//!   the identity service ([`IdentityClient`])
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────┐     ┌──────────────────┐
//! │   Gateway        │────▶│  TokenValidator  │  signature + exp
//! │   pipeline       │     │  (HmacValidator) │
//! └────────┬─────────┘     └──────────────────┘
//!          │
//!          │               ┌──────────────────┐
//!          └──────────────▶│  UserResolver    │
//!                          │  (IdentityClient)│
//!                          └────────┬─────────┘
//!                                   │ HTTP
//!                          ┌────────▼─────────┐
//!                          │ identity service │
//!                          │  GET /auth/me    │
//!                          └──────────────────┘
//! ```
//!
//! # Example
//!
//! ```no_run
//! use campaign_gateway_auth::{AuthConfig, HmacValidator, IdentityClient, TokenValidator, UserResolver};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = AuthConfig {
//!     jwt_secret: "shared-secret".to_string(),
//!     identity_base_url: "http://identity:8001".to_string(),
//!     ..AuthConfig::default()
//! };
//!
//! let validator = HmacValidator::new(&config.jwt_secret);
//! let resolver = IdentityClient::new(&config);
//!
//! let token = "eyJhbGciOiJIUzI1NiIsInR5cCI6IkpXVCJ9...";
//! let claims = validator.validate(token).await?;
//! let user = resolver.resolve(&claims, token).await?;
//!
//! println!("{} is {}", user.email, user.role);
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

use std::fmt;

pub mod client;
pub mod error;
pub mod jwt;

pub use client::{IdentityClient, UserResolver};
pub use error::{AuthError, Result};
pub use jwt::{HmacValidator, TokenValidator, ValidatedClaims};

#[cfg(any(test, feature = "test-utils"))]
pub use client::StaticUserResolver;
#[cfg(any(test, feature = "test-utils"))]
pub use jwt::issue_token;

/// Configuration for token validation and identity lookups.
#[derive(Clone)]
pub struct AuthConfig {
    /// Secret shared with the identity service for HS256 signatures.
    pub jwt_secret: String,
    /// Base URL of the identity service (e.g., `http://identity:8001`).
    pub identity_base_url: String,
    /// Path of the "who am I" endpoint on the identity service.
    pub whoami_path: String,
    /// Timeout for one identity lookup, in seconds.
    pub identity_timeout_seconds: u64,
}

impl AuthConfig {
    /// Get the "who am I" endpoint URL.
    #[must_use]
    pub fn whoami_url(&self) -> String {
        format!(
            "{}/{}",
            self.identity_base_url.trim_end_matches('/'),
            self.whoami_path.trim_start_matches('/')
        )
    }
}

impl fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthConfig")
            .field("jwt_secret", &"<redacted>")
            .field("identity_base_url", &self.identity_base_url)
            .field("whoami_path", &self.whoami_path)
            .field("identity_timeout_seconds", &self.identity_timeout_seconds)
            .finish()
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: String::new(),
            identity_base_url: "http://localhost:8001".to_string(),
            whoami_path: "/auth/me".to_string(),
            identity_timeout_seconds: 10,
        }
    }
}

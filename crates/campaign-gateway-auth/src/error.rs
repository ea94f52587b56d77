//! Authentication error types.

use thiserror::Error;

/// A result type using `AuthError`.
pub type Result<T> = std::result::Result<T, AuthError>;

/// Errors that can occur while authenticating a request.
///
/// `InvalidToken`, `BadSignature` and `Expired` all reach the client as the
/// same 401; they stay distinct so logs show why a token was refused.
#[derive(Debug, Error)]
pub enum AuthError {
    /// The token is absent, malformed, or does not name a known account.
    #[error("invalid token: {0}")]
    InvalidToken(String),

    /// The token signature does not verify against the shared secret.
    #[error("bad signature")]
    BadSignature,

    /// The token's `exp` claim is in the past.
    #[error("token expired")]
    Expired,

    /// The account exists but has been deactivated.
    #[error("inactive account")]
    InactiveAccount,

    /// The identity backend could not be reached, timed out, or failed.
    #[error("identity service unavailable: {0}")]
    IdentityUnavailable(String),

    /// An internal error occurred.
    #[error("internal error: {0}")]
    Internal(String),
}

impl AuthError {
    /// Short failure kind for structured logs.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::InvalidToken(_) => "invalid_token",
            Self::BadSignature => "bad_signature",
            Self::Expired => "expired",
            Self::InactiveAccount => "inactive_account",
            Self::IdentityUnavailable(_) => "identity_unavailable",
            Self::Internal(_) => "internal",
        }
    }

    /// Returns the HTTP status code the client sees for this error.
    ///
    /// Inactive accounts always get 403: the caller is known but not allowed.
    #[must_use]
    pub const fn http_status_code(&self) -> u16 {
        match self {
            Self::InvalidToken(_) | Self::BadSignature | Self::Expired => 401,
            Self::InactiveAccount => 403,
            Self::IdentityUnavailable(_) => 503,
            Self::Internal(_) => 500,
        }
    }
}

//! Common error types for the campaign gateway.
//!
//! These errors are only produced while building the immutable routing and
//! rate-limit structures at startup. Request-time operations never fail here.

use thiserror::Error;

/// A result type using `CoreError`.
pub type Result<T> = std::result::Result<T, CoreError>;

/// Errors raised when constructing routing or rate-limit state.
#[derive(Debug, Error)]
pub enum CoreError {
    /// A route prefix or public path does not start with `/`.
    #[error("invalid path prefix: {0}")]
    InvalidPrefix(String),

    /// A route has no backend base URL.
    #[error("route {prefix} has no base URL for service {service}")]
    MissingBaseUrl {
        /// The offending prefix.
        prefix: String,
        /// The service the route points to.
        service: String,
    },

    /// A rate-limit rule has a zero limit or a zero-length window.
    #[error("invalid rate limit rule {key}: {reason}")]
    InvalidRule {
        /// The rule key (`global`, `service:<id>`, `path:<path>`).
        key: String,
        /// Why the rule was rejected.
        reason: &'static str,
    },
}

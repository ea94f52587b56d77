//! API error types and responses.
//!
//! This module defines the standard error format for all gateway-generated
//! responses. Errors returned by backends are relayed verbatim and never pass
//! through here.

use axum::http::header::RETRY_AFTER;
use axum::http::{HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use thiserror::Error;

use campaign_gateway_auth::AuthError;

use crate::proxy::ProxyError;

/// API error type that implements `IntoResponse`.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Missing, invalid or expired token.
    #[error("unauthorized")]
    Unauthorized,

    /// The account is known but not allowed to proceed.
    #[error("forbidden")]
    Forbidden,

    /// Too many requests, rate limit exceeded.
    #[error("rate limit exceeded, retry in {retry_after_seconds}s")]
    RateLimited {
        /// Seconds until the limiting window ends.
        retry_after_seconds: u64,
    },

    /// The request body exceeds the configured limit or could not be read.
    #[error("request body too large")]
    PayloadTooLarge,

    /// No such endpoint on the gateway.
    #[error("not found")]
    NotFound,

    /// A backend or the identity service cannot be reached.
    #[error("service unavailable: {0}")]
    ServiceUnavailable(String),

    /// A backend did not answer in time.
    #[error("gateway timeout: {0}")]
    GatewayTimeout(String),

    /// A backend call failed at the transport level.
    #[error("bad gateway: {0}")]
    BadGateway(String),

    /// Internal server error.
    #[error("internal error: {0}")]
    Internal(String),
}

/// Error response body.
#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: ErrorBody,
}

/// Error details.
#[derive(Debug, Serialize)]
struct ErrorBody {
    code: &'static str,
    message: String,
}

impl ApiError {
    /// Get the HTTP status code for this error.
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::Forbidden => StatusCode::FORBIDDEN,
            Self::RateLimited { .. } => StatusCode::TOO_MANY_REQUESTS,
            Self::PayloadTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::ServiceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            Self::GatewayTimeout(_) => StatusCode::GATEWAY_TIMEOUT,
            Self::BadGateway(_) => StatusCode::BAD_GATEWAY,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Get the error code string for this error.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::Unauthorized => "unauthorized",
            Self::Forbidden => "forbidden",
            Self::RateLimited { .. } => "rate_limited",
            Self::PayloadTooLarge => "payload_too_large",
            Self::NotFound => "not_found",
            Self::ServiceUnavailable(_) => "service_unavailable",
            Self::GatewayTimeout(_) => "gateway_timeout",
            Self::BadGateway(_) => "bad_gateway",
            Self::Internal(_) => "internal_error",
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let code = self.code();
        let message = self.to_string();
        let retry_after = match self {
            Self::RateLimited {
                retry_after_seconds,
            } => Some(retry_after_seconds),
            _ => None,
        };

        let body = ErrorResponse {
            error: ErrorBody { code, message },
        };

        let mut response = (status, Json(body)).into_response();
        if let Some(seconds) = retry_after {
            response
                .headers_mut()
                .insert(RETRY_AFTER, HeaderValue::from(seconds));
        }
        response
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::InvalidToken(_) | AuthError::BadSignature | AuthError::Expired => {
                Self::Unauthorized
            }
            AuthError::InactiveAccount => Self::Forbidden,
            AuthError::IdentityUnavailable(_) => {
                Self::ServiceUnavailable("identity service".to_string())
            }
            AuthError::Internal(msg) => {
                tracing::error!(error = %msg, "Auth internal error");
                Self::Internal("authentication error".to_string())
            }
        }
    }
}

impl From<ProxyError> for ApiError {
    fn from(err: ProxyError) -> Self {
        match err {
            ProxyError::ServiceUnavailable { service, .. } => Self::ServiceUnavailable(service),
            ProxyError::GatewayTimeout { service, .. } => Self::GatewayTimeout(service),
            ProxyError::BadGateway { service, .. } => Self::BadGateway(service),
        }
    }
}

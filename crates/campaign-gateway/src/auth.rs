//! Token extraction and the authentication stage.
//!
//! The access token is read from the `access_token` cookie first and from an
//! `Authorization: Bearer` header second. It is validated locally, then the
//! live account is fetched from the identity service.

use axum::http::header::AUTHORIZATION;
use axum::http::HeaderMap;
use axum_extra::extract::cookie::CookieJar;

use campaign_gateway_auth::{TokenValidator, UserResolver};
use campaign_gateway_core::UserContext;

use crate::error::ApiError;
use crate::state::GatewayState;

/// Find the access token in `headers`.
///
/// The cookie named `cookie_name` wins over the `Authorization` header.
/// Empty values count as absent.
#[must_use]
pub fn extract_token(headers: &HeaderMap, cookie_name: &str) -> Option<String> {
    let jar = CookieJar::from_headers(headers);
    if let Some(cookie) = jar.get(cookie_name) {
        let value = cookie.value().trim();
        if !value.is_empty() {
            return Some(value.to_string());
        }
    }

    headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| {
            let (scheme, token) = v.trim().split_once(' ')?;
            scheme.eq_ignore_ascii_case("bearer").then(|| token.trim())
        })
        .filter(|token| !token.is_empty())
        .map(str::to_string)
}

/// Authenticate a request.
///
/// # Errors
///
/// - `Unauthorized` if no token is present, or it is invalid, expired or unknown
/// - `Forbidden` if the account is deactivated
/// - `ServiceUnavailable` if the identity service cannot be reached
pub async fn authenticate<V, R>(
    state: &GatewayState<V, R>,
    headers: &HeaderMap,
) -> Result<UserContext, ApiError>
where
    V: TokenValidator,
    R: UserResolver,
{
    let Some(token) = extract_token(headers, &state.config.auth.access_cookie_name) else {
        tracing::debug!("No access token presented");
        return Err(ApiError::Unauthorized);
    };

    let claims = state.validator.validate(&token).await.map_err(|e| {
        tracing::debug!(kind = e.kind(), error = %e, "Token rejected");
        ApiError::from(e)
    })?;

    let user = state.resolver.resolve(&claims, &token).await.map_err(|e| {
        tracing::info!(
            subject = %claims.subject,
            kind = e.kind(),
            error = %e,
            "Account resolution failed"
        );
        ApiError::from(e)
    })?;

    tracing::debug!(user_id = %user.id, role = %user.role, "Request authenticated");
    Ok(user)
}

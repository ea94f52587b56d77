//! Identity and forwarding headers sent to backends.
//!
//! Backends trust `X-User-*` headers instead of re-validating tokens, so only
//! the gateway may set them: any client-supplied copies are stripped first.
//!
//! Values that are not plain visible ASCII (e.g. a role named `Diseñador`)
//! are sent as standard base64 of their UTF-8 bytes. ASCII values are sent
//! unchanged.

use std::net::SocketAddr;

use axum::http::{HeaderMap, HeaderName, HeaderValue};
use base64::prelude::*;

use campaign_gateway_core::UserContext;

/// Header carrying the account id.
pub const HEADER_USER_ID: &str = "x-user-id";
/// Header carrying the account email.
pub const HEADER_USER_EMAIL: &str = "x-user-email";
/// Header carrying the account role.
pub const HEADER_USER_ROLE: &str = "x-user-role";
/// Header carrying the active flag (`true` / `false`).
pub const HEADER_USER_IS_ACTIVE: &str = "x-user-is-active";
/// Request correlation id.
pub const HEADER_REQUEST_ID: &str = "x-request-id";
/// Forwarded-for chain.
pub const HEADER_FORWARDED_FOR: &str = "x-forwarded-for";

/// Build the identity headers for `user`.
#[must_use]
pub fn inject(user: &UserContext) -> HeaderMap {
    let mut headers = HeaderMap::with_capacity(4);
    headers.insert(HEADER_USER_ID, encode_header_value(&user.id));
    headers.insert(HEADER_USER_EMAIL, encode_header_value(&user.email));
    headers.insert(HEADER_USER_ROLE, encode_header_value(&user.role));
    headers.insert(
        HEADER_USER_IS_ACTIVE,
        HeaderValue::from_static(if user.is_active { "true" } else { "false" }),
    );
    headers
}

/// Remove every `X-User-*` header a client may have sent.
pub fn strip_identity_headers(headers: &mut HeaderMap) {
    let spoofed: Vec<HeaderName> = headers
        .keys()
        .filter(|name| name.as_str().starts_with("x-user-"))
        .cloned()
        .collect();
    for name in spoofed {
        headers.remove(name);
    }
}

/// Encode `value` for use as a header value.
///
/// Visible ASCII, spaces and tabs pass through; anything else is base64.
#[must_use]
pub fn encode_header_value(value: &str) -> HeaderValue {
    if is_plain(value) {
        if let Ok(header) = HeaderValue::from_str(value) {
            return header;
        }
    }
    let encoded = BASE64_STANDARD.encode(value.as_bytes());
    HeaderValue::from_str(&encoded).unwrap_or_else(|_| HeaderValue::from_static(""))
}

fn is_plain(value: &str) -> bool {
    value.bytes().all(|b| b == b'\t' || (0x20..0x7f).contains(&b))
}

/// The client identity used for rate limiting.
///
/// The first hop of `X-Forwarded-For` wins; otherwise the peer address.
#[must_use]
pub fn client_identity(headers: &HeaderMap, peer: Option<SocketAddr>) -> String {
    let forwarded = headers
        .get(HEADER_FORWARDED_FOR)
        .and_then(|v| v.to_str().ok())
        .and_then(|chain| chain.split(',').next())
        .map(str::trim)
        .filter(|hop| !hop.is_empty());

    match (forwarded, peer) {
        (Some(hop), _) => hop.to_string(),
        (None, Some(addr)) => addr.ip().to_string(),
        (None, None) => "unknown".to_string(),
    }
}

/// Append the peer address to the `X-Forwarded-For` chain.
pub fn append_forwarded_for(headers: &mut HeaderMap, peer: Option<SocketAddr>) {
    let Some(peer) = peer else {
        return;
    };
    let ip = peer.ip().to_string();
    let chain = match headers.get(HEADER_FORWARDED_FOR).and_then(|v| v.to_str().ok()) {
        Some(existing) if !existing.trim().is_empty() => format!("{existing}, {ip}"),
        _ => ip,
    };
    if let Ok(value) = HeaderValue::from_str(&chain) {
        headers.insert(HEADER_FORWARDED_FOR, value);
    }
}

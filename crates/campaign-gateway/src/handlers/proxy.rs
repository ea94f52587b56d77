//! The proxy pipeline.
//!
//! Every request under the API prefix runs through the same stages:
//!
//! ```text
//! rate limit ─► classify ─► [authenticate] ─► headers ─► forward ─► cookies ─► respond
//! ```
//!
//! Only public paths skip authentication. Any stage can end the request with
//! an [`ApiError`]; a backend's own error statuses are relayed unchanged.
//! CORS preflights are answered by the router's `CorsLayer` and never reach
//! this handler. Other `OPTIONS` requests are authenticated and forwarded
//! like any other method.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::body::Body;
use axum::extract::{ConnectInfo, Request, State};
use axum::http::request::Parts;
use axum::http::{HeaderMap, HeaderValue};
use axum::response::{IntoResponse, Response};
use tracing::Instrument;
use uuid::Uuid;

use campaign_gateway_auth::{TokenValidator, UserResolver};

use crate::auth::authenticate;
use crate::cookies;
use crate::error::ApiError;
use crate::headers::{
    append_forwarded_for, client_identity, inject, strip_identity_headers, HEADER_REQUEST_ID,
};
use crate::proxy::{filter_request_headers, filter_response_headers, ProxyRequest};
use crate::state::GatewayState;

/// Longest client-supplied request id that is reused.
const MAX_REQUEST_ID_LEN: usize = 128;

/// Catch-all handler for `ANY /api/*path`.
pub async fn proxy_request<V, R>(
    State(state): State<Arc<GatewayState<V, R>>>,
    request: Request,
) -> Response
where
    V: TokenValidator + 'static,
    R: UserResolver + 'static,
{
    let (parts, body) = request.into_parts();
    let request_id = request_id(&parts.headers);
    let span = tracing::info_span!(
        "proxy",
        request_id = %request_id,
        method = %parts.method,
        path = %parts.uri.path(),
    );

    let mut response = match run(&state, parts, body, &request_id).instrument(span).await {
        Ok(response) => response,
        Err(err) => err.into_response(),
    };

    if let Ok(value) = HeaderValue::from_str(&request_id) {
        response.headers_mut().insert(HEADER_REQUEST_ID, value);
    }
    response
}

async fn run<V, R>(
    state: &GatewayState<V, R>,
    parts: Parts,
    body: Body,
    request_id: &str,
) -> Result<Response, ApiError>
where
    V: TokenValidator,
    R: UserResolver,
{
    let path = parts.uri.path().to_string();
    let peer = parts
        .extensions
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| *addr);
    let client = client_identity(&parts.headers, peer);
    let route = state.routes.resolve(&path);

    let decision = state.limiter.allow(&client, &path, route.service_id);
    if !decision.permitted {
        tracing::warn!(
            client = %client,
            service = %route.service_id,
            scope = %decision.scope_key,
            limit = decision.limit,
            retry_after = decision.retry_after_seconds,
            kind = "rate_limited",
            "Rate limit exceeded"
        );
        return Err(ApiError::RateLimited {
            retry_after_seconds: decision.retry_after_seconds,
        });
    }

    let public = state.public_paths.is_public(&path);
    let user = if public {
        None
    } else {
        match authenticate(state, &parts.headers).await {
            Ok(user) => Some(user),
            Err(err) => {
                tracing::warn!(
                    service = %route.service_id,
                    prefix = %route.matched_prefix,
                    kind = err.code(),
                    "Authentication failed"
                );
                return Err(err);
            }
        }
    };

    let mut headers = filter_request_headers(&parts.headers);
    strip_identity_headers(&mut headers);
    if let Some(user) = &user {
        headers.extend(inject(user));
    }
    append_forwarded_for(&mut headers, peer);
    if let Ok(value) = HeaderValue::from_str(request_id) {
        headers.insert(HEADER_REQUEST_ID, value);
    }

    let body = axum::body::to_bytes(body, state.config.max_body_bytes)
        .await
        .map_err(|e| {
            tracing::warn!(error = %e, kind = "payload_too_large", "Request body rejected");
            ApiError::PayloadTooLarge
        })?;

    let outbound = ProxyRequest {
        method: parts.method,
        path: state.config.backend_path(&path),
        query: parts.uri.query().map(str::to_string),
        headers,
        body,
    };

    let upstream = state.proxy.forward(outbound, route).await.map_err(|e| {
        tracing::warn!(
            service = %route.service_id,
            prefix = %route.matched_prefix,
            default_route = route.is_default,
            kind = e.kind(),
            error = %e,
            "Backend call failed"
        );
        ApiError::from(e)
    })?;

    tracing::debug!(
        service = %route.service_id,
        status = upstream.status.as_u16(),
        authenticated = user.is_some(),
        "Backend responded"
    );

    let mut response = Response::new(Body::from(upstream.body));
    *response.status_mut() = upstream.status;
    *response.headers_mut() = filter_response_headers(&upstream.headers);
    cookies::relay(&upstream.headers, response.headers_mut());
    Ok(response)
}

/// The client's `X-Request-Id` if usable, otherwise a fresh one.
fn request_id(headers: &HeaderMap) -> String {
    headers
        .get(HEADER_REQUEST_ID)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|id| !id.is_empty() && id.len() <= MAX_REQUEST_ID_LEN)
        .map_or_else(|| Uuid::new_v4().to_string(), str::to_string)
}

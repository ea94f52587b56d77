//! Outbound calls to backend services.
//!
//! The [`ProxyExecutor`] makes exactly one attempt per inbound request,
//! bounded by the configured timeout, and maps transport failures onto
//! [`ProxyError`]. HTTP error statuses from the backend are not failures:
//! they are relayed to the client as-is.

use std::time::Duration;

use axum::body::Bytes;
use axum::http::header::{self, HeaderName};
use axum::http::{HeaderMap, Method, StatusCode};
use thiserror::Error;

use campaign_gateway_core::ResolvedRoute;

/// Headers that describe a single connection and are never forwarded.
const HOP_BY_HOP: &[&str] = &[
    "connection",
    "keep-alive",
    "proxy-authenticate",
    "proxy-authorization",
    "proxy-connection",
    "te",
    "trailer",
    "transfer-encoding",
    "upgrade",
];

/// Transport-level failure of a backend call.
#[derive(Debug, Error)]
pub enum ProxyError {
    /// The backend refused the connection, could not be resolved, or is down.
    #[error("service {service} unavailable: {reason}")]
    ServiceUnavailable {
        /// Backend service id.
        service: String,
        /// Transport error description.
        reason: String,
    },

    /// The backend did not answer within the timeout.
    #[error("service {service} timed out after {timeout_secs}s")]
    GatewayTimeout {
        /// Backend service id.
        service: String,
        /// The timeout that elapsed.
        timeout_secs: u64,
    },

    /// Any other transport failure, e.g. a reset mid-response.
    #[error("bad gateway for service {service}: {reason}")]
    BadGateway {
        /// Backend service id.
        service: String,
        /// Transport error description.
        reason: String,
    },
}

impl ProxyError {
    /// Short failure kind for structured logs.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::ServiceUnavailable { .. } => "service_unavailable",
            Self::GatewayTimeout { .. } => "gateway_timeout",
            Self::BadGateway { .. } => "bad_gateway",
        }
    }
}

/// A request to forward to a backend.
#[derive(Debug, Clone)]
pub struct ProxyRequest {
    /// HTTP method.
    pub method: Method,
    /// Backend path, already stripped of the public API prefix.
    pub path: String,
    /// Raw query string without the leading `?`.
    pub query: Option<String>,
    /// Headers to send; hop-by-hop headers must already be removed.
    pub headers: HeaderMap,
    /// Request body.
    pub body: Bytes,
}

impl ProxyRequest {
    /// Full target URL on `base_url`.
    #[must_use]
    pub fn url(&self, base_url: &str) -> String {
        let base = base_url.trim_end_matches('/');
        match &self.query {
            Some(query) if !query.is_empty() => format!("{base}{}?{query}", self.path),
            _ => format!("{base}{}", self.path),
        }
    }
}

/// A backend's answer.
#[derive(Debug, Clone)]
pub struct ProxyResponse {
    /// Status code returned by the backend.
    pub status: StatusCode,
    /// Response headers as received, including every `Set-Cookie`.
    pub headers: HeaderMap,
    /// Response body.
    pub body: Bytes,
}

/// Performs backend calls.
#[derive(Debug, Clone)]
pub struct ProxyExecutor {
    client: reqwest::Client,
    timeout: Duration,
}

impl ProxyExecutor {
    /// Create an executor whose calls time out after `timeout`.
    ///
    /// Redirects are relayed to the client, not followed.
    ///
    /// # Panics
    ///
    /// Panics if the HTTP client cannot be created.
    #[must_use]
    pub fn new(timeout: Duration) -> Self {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .redirect(reqwest::redirect::Policy::none())
            .pool_idle_timeout(Duration::from_secs(90))
            .build()
            .expect("failed to create HTTP client");

        Self { client, timeout }
    }

    /// The per-call timeout.
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Forward `request` to the backend of `route`.
    ///
    /// Dropping the returned future cancels the outbound call.
    ///
    /// # Errors
    ///
    /// - `ServiceUnavailable` if the connection cannot be established
    /// - `GatewayTimeout` if the deadline passes
    /// - `BadGateway` for any other transport failure
    pub async fn forward(
        &self,
        request: ProxyRequest,
        route: ResolvedRoute<'_>,
    ) -> Result<ProxyResponse, ProxyError> {
        let url = request.url(route.base_url);
        tracing::debug!(
            service = %route.service_id,
            method = %request.method,
            url = %url,
            "Forwarding request"
        );

        let mut outbound = self
            .client
            .request(request.method, &url)
            .headers(request.headers);
        if !request.body.is_empty() {
            outbound = outbound.body(request.body);
        }

        let response = outbound
            .send()
            .await
            .map_err(|e| self.classify(&e, route.service_id))?;

        let status = response.status();
        let headers = response.headers().clone();
        let body = response
            .bytes()
            .await
            .map_err(|e| self.classify(&e, route.service_id))?;

        Ok(ProxyResponse {
            status,
            headers,
            body,
        })
    }

    fn classify(&self, error: &reqwest::Error, service: &str) -> ProxyError {
        if error.is_timeout() {
            ProxyError::GatewayTimeout {
                service: service.to_string(),
                timeout_secs: self.timeout.as_secs(),
            }
        } else if error.is_connect() {
            ProxyError::ServiceUnavailable {
                service: service.to_string(),
                reason: error.to_string(),
            }
        } else {
            ProxyError::BadGateway {
                service: service.to_string(),
                reason: error.to_string(),
            }
        }
    }
}

/// Whether `name` is a hop-by-hop header, either by definition or because the
/// message's `Connection` header lists it.
fn is_hop_by_hop(name: &HeaderName, headers: &HeaderMap) -> bool {
    if HOP_BY_HOP.contains(&name.as_str()) {
        return true;
    }
    headers
        .get_all(header::CONNECTION)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(','))
        .any(|token| token.trim().eq_ignore_ascii_case(name.as_str()))
}

/// Headers of an inbound request that may be sent to a backend.
///
/// Drops hop-by-hop headers, `Host` (the client sets it for the backend) and
/// `Content-Length` (recomputed from the body).
#[must_use]
pub fn filter_request_headers(headers: &HeaderMap) -> HeaderMap {
    let mut out = HeaderMap::with_capacity(headers.len());
    for (name, value) in headers {
        if is_hop_by_hop(name, headers) || name == header::HOST || name == header::CONTENT_LENGTH {
            continue;
        }
        out.append(name.clone(), value.clone());
    }
    out
}

/// Headers of a backend response that may be sent to the client.
///
/// Drops hop-by-hop headers, `Content-Length` and `Set-Cookie`; cookies go
/// through [`relay`](crate::cookies::relay) instead.
#[must_use]
pub fn filter_response_headers(headers: &HeaderMap) -> HeaderMap {
    let mut out = HeaderMap::with_capacity(headers.len());
    for (name, value) in headers {
        if is_hop_by_hop(name, headers)
            || name == header::CONTENT_LENGTH
            || name == header::SET_COOKIE
        {
            continue;
        }
        out.append(name.clone(), value.clone());
    }
    out
}

//! Root and health endpoints.
//!
//! Both are public and never touch a backend.

use std::collections::BTreeMap;
use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde::Serialize;

use campaign_gateway_auth::{TokenValidator, UserResolver};

use crate::state::GatewayState;

/// Service identity response.
#[derive(Debug, Serialize)]
pub struct RootResponse {
    /// Service name.
    pub service: &'static str,
    /// Service version.
    pub version: &'static str,
    /// Always `running`.
    pub status: &'static str,
}

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// Service status.
    pub status: &'static str,
    /// Service version.
    pub version: &'static str,
    /// Configured backend base URLs by service id.
    pub services: BTreeMap<String, String>,
}

/// Service identity handler.
///
/// ```text
/// GET /
///
/// Response: 200 OK
/// {
///   "service": "campaign-gateway",
///   "version": "0.1.0",
///   "status": "running"
/// }
/// ```
pub async fn root() -> impl IntoResponse {
    let response = RootResponse {
        service: "campaign-gateway",
        version: env!("CARGO_PKG_VERSION"),
        status: "running",
    };

    (StatusCode::OK, Json(response))
}

/// Health check handler.
///
/// Reports the configured backends without probing them.
///
/// ```text
/// GET /api/health
///
/// Response: 200 OK
/// {
///   "status": "healthy",
///   "version": "0.1.0",
///   "services": { "campaign": "http://localhost:8002", ... }
/// }
/// ```
pub async fn health<V, R>(State(state): State<Arc<GatewayState<V, R>>>) -> impl IntoResponse
where
    V: TokenValidator,
    R: UserResolver,
{
    let response = HealthResponse {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
        services: state.config.services.clone(),
    };

    (StatusCode::OK, Json(response))
}

//! Router configuration.
//!
//! This module sets up the Axum router with all routes and middleware.
//!
//! `CorsLayer` answers every `OPTIONS` request itself, so only real
//! preflights (those carrying `Access-Control-Request-Method`) are sent
//! through it. Any other `OPTIONS` request goes to the proxy pipeline and is
//! authenticated and forwarded like `GET` or `POST`.

use std::sync::Arc;

use axum::extract::Request;
use axum::http::{header, HeaderValue, Method};
use axum::routing::{get, on, MethodFilter};
use axum::Router;
use tower::ServiceExt;
use tower_http::cors::{AllowHeaders, AllowMethods, AllowOrigin, Any, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;

use campaign_gateway_auth::{TokenValidator, UserResolver};

use crate::error::ApiError;
use crate::handlers::{health, proxy};
use crate::state::GatewayState;

/// Create the gateway router with all routes and middleware.
///
/// # Routes
///
/// - `GET /` - Service identity
/// - `GET /api/health` - Health check with backend URLs
/// - `GET|POST|PUT|PATCH|DELETE|OPTIONS /api/*path` - Proxy pipeline
pub fn create_router<V, R>(state: GatewayState<V, R>) -> Router
where
    V: TokenValidator + 'static,
    R: UserResolver + 'static,
{
    let cors = build_cors_layer(&state.config.cors_origins);
    let max_body_bytes = state.config.max_body_bytes;
    let api_prefix = state.config.api_prefix.trim_end_matches('/').to_string();

    let methods = MethodFilter::GET
        .or(MethodFilter::POST)
        .or(MethodFilter::PUT)
        .or(MethodFilter::PATCH)
        .or(MethodFilter::DELETE)
        .or(MethodFilter::OPTIONS);

    let state = Arc::new(state);

    let app: Router = Router::new()
        .route("/", get(health::root))
        .route(&format!("{api_prefix}/health"), get(health::health::<V, R>))
        .route(&api_prefix, on(methods, proxy::proxy_request::<V, R>))
        .route(&format!("{api_prefix}/*path"), on(methods, proxy::proxy_request::<V, R>))
        .fallback(not_found)
        .with_state(state);
    let with_cors = app.clone().layer(cors);

    let dispatch = tower::service_fn(move |request: Request| {
        let target = if request.method() == Method::OPTIONS && !is_preflight(&request) {
            app.clone()
        } else {
            with_cors.clone()
        };
        async move { target.oneshot(request).await }
    });

    Router::new()
        .fallback_service(dispatch)
        .layer(TraceLayer::new_for_http())
        .layer(RequestBodyLimitLayer::new(max_body_bytes))
}

async fn not_found() -> ApiError {
    ApiError::NotFound
}

fn is_preflight(request: &Request) -> bool {
    request.method() == Method::OPTIONS
        && request
            .headers()
            .contains_key(header::ACCESS_CONTROL_REQUEST_METHOD)
}

/// Build the CORS layer from configured origins.
///
/// `*` allows any origin without credentials. Explicit origins allow
/// credentials so the auth cookies can be sent cross-origin.
fn build_cors_layer(origins: &[String]) -> CorsLayer {
    if origins.iter().any(|o| o == "*") {
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any)
    } else {
        let origins: Vec<HeaderValue> = origins
            .iter()
            .filter_map(|o| match o.parse() {
                Ok(origin) => Some(origin),
                Err(_) => {
                    tracing::warn!(origin = %o, "Ignoring invalid CORS origin");
                    None
                }
            })
            .collect();

        CorsLayer::new()
            .allow_origin(AllowOrigin::list(origins))
            .allow_methods(AllowMethods::mirror_request())
            .allow_headers(AllowHeaders::mirror_request())
            .allow_credentials(true)
    }
}

//! Authenticating reverse-proxy gateway for the campaign platform.
//!
//! The gateway is the single entry point for browser and API clients. It:
//!
//! - Routes `/api/*` requests to backend services by longest path prefix
//! - Rate limits per client at global, service and path scope
//! - Validates access tokens and resolves the live account behind them
//! - Passes the caller's identity to backends as `X-User-*` headers
//! - Relays backend `Set-Cookie` headers with their attributes intact
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                          Clients                            │
//! │                (cookie or Bearer access token)              │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      campaign-gateway                       │
//! │  ┌──────────┐ ┌──────────┐ ┌──────────┐ ┌───────────────┐  │
//! │  │  CORS    │ │  Rate    │ │  Auth    │ │ Proxy + cookie│  │
//! │  │ preflight│ │  limiter │ │  stage   │ │ relay         │  │
//! │  └──────────┘ └──────────┘ └──────────┘ └───────────────┘  │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!        ┌─────────────┬───────┴──────┬──────────────┐
//!        ▼             ▼              ▼              ▼
//!   ┌──────────┐ ┌──────────┐ ┌─────────────┐ ┌──────────┐
//!   │ identity │ │ campaign │ │ enhancement │ │ content  │
//!   └──────────┘ └──────────┘ └─────────────┘ └──────────┘
//! ```
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use campaign_gateway::{create_router, GatewayConfig, GatewayState};
//! use campaign_gateway_auth::{HmacValidator, IdentityClient};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = GatewayConfig::load()?;
//! let auth = config.auth_config()?;
//!
//! let validator = Arc::new(HmacValidator::new(&auth.jwt_secret));
//! let resolver = Arc::new(IdentityClient::new(&auth));
//! let state = GatewayState::from_config(config, validator, resolver)?;
//!
//! let app = create_router(state);
//! let listener = tokio::net::TcpListener::bind("0.0.0.0:8000").await?;
//! axum::serve(listener, app).await?;
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod auth;
pub mod config;
pub mod cookies;
pub mod error;
pub mod handlers;
pub mod headers;
pub mod proxy;
pub mod routes;
pub mod state;

pub use config::{ConfigError, GatewayConfig};
pub use error::ApiError;
pub use proxy::{ProxyError, ProxyExecutor};
pub use routes::create_router;
pub use state::GatewayState;

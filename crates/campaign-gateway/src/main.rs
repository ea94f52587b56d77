//! Campaign Gateway - authenticating reverse proxy
//!
//! This is the main entry point for the gateway service.
//!
//! Configuration comes from the JSON file named by `GATEWAY_CONFIG` (if set)
//! and environment overrides such as `JWT_SECRET`, `LISTEN_ADDR` and
//! `CAMPAIGN_SERVICE_URL`.
//!
//! # Dev Mode
//!
//! Build with `--features dev-mode` to resolve accounts from a fixed in-memory
//! user instead of calling the identity service. A token for that user is
//! logged at startup.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[cfg(not(feature = "dev-mode"))]
use campaign_gateway_auth::IdentityClient;
use campaign_gateway_auth::HmacValidator;
#[cfg(feature = "dev-mode")]
use campaign_gateway_auth::{issue_token, StaticUserResolver};
use campaign_gateway::{create_router, GatewayConfig, GatewayState};
use campaign_gateway_core::RateLimiter;

/// How often expired rate-limit counters are dropped.
const PURGE_INTERVAL: Duration = Duration::from_secs(60);

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,campaign_gateway=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Campaign Gateway");

    let config = GatewayConfig::load()?;
    tracing::info!(
        listen_addr = %config.listen_addr,
        services = ?config.services,
        default_service = %config.default_service,
        rate_limit_enabled = config.rate_limit.enabled,
        cors_origins = ?config.cors_origins,
        "Gateway configuration loaded"
    );

    let auth_config = config.auth_config()?;
    let validator = Arc::new(HmacValidator::new(&auth_config.jwt_secret));

    #[cfg(feature = "dev-mode")]
    let resolver = {
        let user = campaign_gateway_core::UserContext {
            id: "1".to_string(),
            email: "dev@localhost".to_string(),
            role: "admin".to_string(),
            is_active: true,
        };
        let token = issue_token(&auth_config.jwt_secret, &user.id, chrono::Duration::hours(12))?;
        tracing::warn!("DEV MODE ENABLED - accounts resolved from memory");
        tracing::warn!(token = %token, "Dev access token");
        Arc::new(StaticUserResolver {
            users: vec![user],
            unavailable: false,
        })
    };

    #[cfg(not(feature = "dev-mode"))]
    let resolver = {
        tracing::info!(whoami_url = %auth_config.whoami_url(), "Identity client initialized");
        Arc::new(IdentityClient::new(&auth_config))
    };

    let limiter = Arc::new(RateLimiter::new(
        config.rate_limit_rules()?,
        config.rate_limit.enabled,
    ));
    spawn_purge_task(Arc::clone(&limiter));

    let listen_addr = config.listen_addr.clone();
    let state = GatewayState::new(config, validator, resolver, limiter)?;
    let app = create_router(state);
    tracing::info!("Router configured");

    tracing::info!(listen_addr = %listen_addr, "Starting HTTP server");
    let listener = tokio::net::TcpListener::bind(&listen_addr).await?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    tracing::info!("Server shut down");
    Ok(())
}

fn spawn_purge_task(limiter: Arc<RateLimiter>) {
    if !limiter.is_enabled() {
        return;
    }
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(PURGE_INTERVAL);
        loop {
            interval.tick().await;
            let purged = limiter.purge_expired();
            if purged > 0 {
                tracing::debug!(purged, remaining = limiter.counter_count(), "Purged rate-limit counters");
            }
        }
    });
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}

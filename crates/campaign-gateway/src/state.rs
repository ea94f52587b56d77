//! Gateway application state.
//!
//! Built once at startup and shared by every request. All tables are
//! immutable after construction; the only mutable piece is the rate limiter,
//! which synchronizes internally.

use std::sync::Arc;

use campaign_gateway_auth::{TokenValidator, UserResolver};
use campaign_gateway_core::{PublicPathSet, RateLimiter, RouteTable};

use crate::config::{ConfigError, GatewayConfig};
use crate::proxy::ProxyExecutor;

/// Shared application state for the gateway.
pub struct GatewayState<V, R>
where
    V: TokenValidator,
    R: UserResolver,
{
    /// Local token validation.
    pub validator: Arc<V>,
    /// Live account lookup.
    pub resolver: Arc<R>,
    /// Prefix to backend routing.
    pub routes: Arc<RouteTable>,
    /// Paths that skip authentication.
    pub public_paths: Arc<PublicPathSet>,
    /// Shared request counters.
    pub limiter: Arc<RateLimiter>,
    /// Backend HTTP client.
    pub proxy: ProxyExecutor,
    /// Gateway configuration.
    pub config: GatewayConfig,
}

impl<V, R> GatewayState<V, R>
where
    V: TokenValidator,
    R: UserResolver,
{
    /// Build the state from a validated configuration.
    ///
    /// The rate limiter is taken from the caller so a background task can
    /// share it.
    ///
    /// # Errors
    ///
    /// Returns an error if the route table or public path set cannot be built.
    pub fn new(
        config: GatewayConfig,
        validator: Arc<V>,
        resolver: Arc<R>,
        limiter: Arc<RateLimiter>,
    ) -> Result<Self, ConfigError> {
        let routes = Arc::new(config.route_table()?);
        let public_paths = Arc::new(config.public_path_set()?);
        let proxy = ProxyExecutor::new(config.proxy_timeout());

        Ok(Self {
            validator,
            resolver,
            routes,
            public_paths,
            limiter,
            proxy,
            config,
        })
    }

    /// Build the state together with a fresh rate limiter.
    ///
    /// # Errors
    ///
    /// Returns an error if any configured table is invalid.
    pub fn from_config(
        config: GatewayConfig,
        validator: Arc<V>,
        resolver: Arc<R>,
    ) -> Result<Self, ConfigError> {
        let limiter = Arc::new(RateLimiter::new(
            config.rate_limit_rules()?,
            config.rate_limit.enabled,
        ));
        Self::new(config, validator, resolver, limiter)
    }
}

impl<V, R> Clone for GatewayState<V, R>
where
    V: TokenValidator,
    R: UserResolver,
{
    fn clone(&self) -> Self {
        Self {
            validator: Arc::clone(&self.validator),
            resolver: Arc::clone(&self.resolver),
            routes: Arc::clone(&self.routes),
            public_paths: Arc::clone(&self.public_paths),
            limiter: Arc::clone(&self.limiter),
            proxy: self.proxy.clone(),
            config: self.config.clone(),
        }
    }
}

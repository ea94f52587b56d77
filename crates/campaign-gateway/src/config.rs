//! Gateway configuration types.
//!
//! Configuration is read once at startup: an optional JSON file named by
//! `GATEWAY_CONFIG`, then environment overrides, then validation. The
//! immutable routing, public-path and rate-limit structures are built from the
//! result and never re-read at request time.

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

use campaign_gateway_auth::AuthConfig;
use campaign_gateway_core::{
    CoreError, PublicPathSet, RateLimitRule, RateLimitRules, Route, RouteTable,
};

/// Environment variable naming an optional JSON configuration file.
pub const CONFIG_PATH_ENV: &str = "GATEWAY_CONFIG";

/// Environment variables that override a service's base URL.
const SERVICE_URL_ENV: &[(&str, &str)] = &[
    ("AUTH_SERVICE_URL", "identity"),
    ("CAMPAIGN_SERVICE_URL", "campaign"),
    ("ENHANCEMENT_SERVICE_URL", "enhancement"),
    ("CONTENT_SERVICE_URL", "content"),
];

/// Errors raised while loading or validating configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("failed to read {path}: {source}")]
    Io {
        /// Path of the file.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The configuration file is not valid JSON for [`GatewayConfig`].
    #[error("invalid configuration file: {0}")]
    Parse(#[from] serde_json::Error),

    /// No token signing secret was configured.
    #[error("JWT secret is not configured (set JWT_SECRET)")]
    MissingSecret,

    /// A route, the default route or the auth settings name an unknown service.
    #[error("no base URL configured for service {0}")]
    UnknownService(String),

    /// A rate-limit shorthand could not be parsed.
    #[error("invalid rate limit {0:?}, expected e.g. \"60/minute\"")]
    InvalidLimit(String),

    /// An environment variable has an unusable value.
    #[error("invalid value for {key}: {value}")]
    InvalidValue {
        /// Variable name.
        key: &'static str,
        /// Offending value.
        value: String,
    },

    /// Routing or rate-limit state rejected the configuration.
    #[error(transparent)]
    Core(#[from] CoreError),
}

/// A prefix→service binding as written in configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RouteConfig {
    /// Path prefix, e.g. `/api/campaigns`.
    pub prefix: String,
    /// Service id, a key of [`GatewayConfig::services`].
    pub service: String,
}

impl RouteConfig {
    fn new(prefix: &str, service: &str) -> Self {
        Self {
            prefix: prefix.to_string(),
            service: service.to_string(),
        }
    }
}

/// A request limit per window.
///
/// Written either as a shorthand string (`"60/minute"`, `"5/hour"`) or as an
/// object (`{"requests": 60, "window_seconds": 60}`).
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum LimitSpec {
    /// `"<requests>/<second|minute|hour|day>"`.
    Shorthand(String),
    /// Explicit request count and window length.
    Detailed {
        /// Requests allowed per window.
        requests: u32,
        /// Window length in seconds.
        #[serde(default = "LimitSpec::default_window")]
        window_seconds: u64,
    },
}

impl LimitSpec {
    const fn default_window() -> u64 {
        60
    }

    /// Parse into a request count and window length.
    ///
    /// # Errors
    ///
    /// Returns `InvalidLimit` for malformed shorthand strings.
    pub fn parse(&self) -> Result<(u32, Duration), ConfigError> {
        match self {
            Self::Detailed {
                requests,
                window_seconds,
            } => Ok((*requests, Duration::from_secs(*window_seconds))),
            Self::Shorthand(s) => {
                let invalid = || ConfigError::InvalidLimit(s.clone());
                let (count, unit) = s.split_once('/').ok_or_else(invalid)?;
                let count: u32 = count.trim().parse().map_err(|_| invalid())?;
                let seconds = match unit.trim().to_ascii_lowercase().as_str() {
                    "second" | "sec" | "s" => 1,
                    "minute" | "min" | "m" => 60,
                    "hour" | "h" => 3600,
                    "day" | "d" => 86_400,
                    _ => return Err(invalid()),
                };
                Ok((count, Duration::from_secs(seconds)))
            }
        }
    }
}

impl From<&str> for LimitSpec {
    fn from(s: &str) -> Self {
        Self::Shorthand(s.to_string())
    }
}

/// Rate limiting configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct RateLimitConfig {
    /// Whether rate limiting is applied at all.
    #[serde(default = "RateLimitConfig::default_enabled")]
    pub enabled: bool,

    /// Global default limit.
    #[serde(default = "RateLimitConfig::default_global")]
    pub default: LimitSpec,

    /// Per-service overrides keyed by service id.
    #[serde(default)]
    pub services: BTreeMap<String, LimitSpec>,

    /// Per-exact-path overrides keyed by request path.
    #[serde(default)]
    pub paths: BTreeMap<String, LimitSpec>,
}

impl RateLimitConfig {
    const fn default_enabled() -> bool {
        true
    }

    fn default_global() -> LimitSpec {
        "100/minute".into()
    }
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        let services = [
            ("campaign", "60/minute"),
            ("enhancement", "30/minute"),
            ("content", "30/minute"),
        ];
        let paths = [
            ("/api/auth/login", "10/minute"),
            ("/api/auth/register", "5/hour"),
            ("/api/auth/refresh", "30/minute"),
        ];
        Self {
            enabled: Self::default_enabled(),
            default: Self::default_global(),
            services: services
                .into_iter()
                .map(|(k, v)| (k.to_string(), v.into()))
                .collect(),
            paths: paths
                .into_iter()
                .map(|(k, v)| (k.to_string(), v.into()))
                .collect(),
        }
    }
}

/// Authentication settings.
#[derive(Clone, Deserialize)]
pub struct AuthSettings {
    /// Secret shared with the identity service for token signatures.
    #[serde(default)]
    pub jwt_secret: String,

    /// Cookie carrying the access token. Takes precedence over `Authorization`.
    #[serde(default = "AuthSettings::default_cookie_name")]
    pub access_cookie_name: String,

    /// Service id of the identity backend.
    #[serde(default = "AuthSettings::default_identity_service")]
    pub identity_service: String,

    /// Path of the identity backend's "who am I" endpoint.
    #[serde(default = "AuthSettings::default_whoami_path")]
    pub whoami_path: String,

    /// Timeout for one identity lookup, in seconds.
    #[serde(default = "AuthSettings::default_identity_timeout")]
    pub identity_timeout_seconds: u64,
}

impl AuthSettings {
    fn default_cookie_name() -> String {
        "access_token".to_string()
    }

    fn default_identity_service() -> String {
        "identity".to_string()
    }

    fn default_whoami_path() -> String {
        "/auth/me".to_string()
    }

    const fn default_identity_timeout() -> u64 {
        10
    }
}

impl Default for AuthSettings {
    fn default() -> Self {
        Self {
            jwt_secret: String::new(),
            access_cookie_name: Self::default_cookie_name(),
            identity_service: Self::default_identity_service(),
            whoami_path: Self::default_whoami_path(),
            identity_timeout_seconds: Self::default_identity_timeout(),
        }
    }
}

impl fmt::Debug for AuthSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthSettings")
            .field("jwt_secret", &"<redacted>")
            .field("access_cookie_name", &self.access_cookie_name)
            .field("identity_service", &self.identity_service)
            .field("whoami_path", &self.whoami_path)
            .field("identity_timeout_seconds", &self.identity_timeout_seconds)
            .finish()
    }
}

/// Configuration for the gateway service.
#[derive(Debug, Clone, Deserialize)]
pub struct GatewayConfig {
    /// Listen address (e.g., "0.0.0.0:8000").
    #[serde(default = "GatewayConfig::default_listen_addr")]
    pub listen_addr: String,

    /// Allowed CORS origins. `*` allows any origin without credentials.
    #[serde(default)]
    pub cors_origins: Vec<String>,

    /// Maximum request body size in bytes.
    #[serde(default = "GatewayConfig::default_max_body")]
    pub max_body_bytes: usize,

    /// Timeout for one proxied backend call, in seconds.
    #[serde(default = "GatewayConfig::default_proxy_timeout")]
    pub proxy_timeout_seconds: u64,

    /// Public prefix removed from the path before forwarding.
    #[serde(default = "GatewayConfig::default_api_prefix")]
    pub api_prefix: String,

    /// Backend base URLs keyed by service id.
    #[serde(default = "GatewayConfig::default_services")]
    pub services: BTreeMap<String, String>,

    /// Prefix→service bindings, in priority order for equal-length prefixes.
    #[serde(default = "GatewayConfig::default_routes")]
    pub routes: Vec<RouteConfig>,

    /// Service receiving paths no route matches.
    #[serde(default = "GatewayConfig::default_service")]
    pub default_service: String,

    /// Paths exempt from authentication. Entries ending in `/*` are prefixes.
    #[serde(default = "GatewayConfig::default_public_paths")]
    pub public_paths: Vec<String>,

    /// Rate limiting.
    #[serde(default)]
    pub rate_limit: RateLimitConfig,

    /// Authentication.
    #[serde(default)]
    pub auth: AuthSettings,
}

impl GatewayConfig {
    fn default_listen_addr() -> String {
        "0.0.0.0:8000".to_string()
    }

    const fn default_max_body() -> usize {
        10 * 1024 * 1024 // 10 MB
    }

    const fn default_proxy_timeout() -> u64 {
        30
    }

    fn default_api_prefix() -> String {
        "/api".to_string()
    }

    fn default_services() -> BTreeMap<String, String> {
        [
            ("identity", "http://localhost:8001"),
            ("campaign", "http://localhost:8002"),
            ("enhancement", "http://localhost:8003"),
            ("content", "http://localhost:8004"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
    }

    fn default_routes() -> Vec<RouteConfig> {
        vec![
            RouteConfig::new("/api/auth", "identity"),
            RouteConfig::new("/api/campaigns", "campaign"),
            RouteConfig::new("/api/enhance-objective", "enhancement"),
            RouteConfig::new("/api/ai-interactions", "enhancement"),
            RouteConfig::new("/api/ai/*", "content"),
        ]
    }

    fn default_service() -> String {
        "campaign".to_string()
    }

    fn default_public_paths() -> Vec<String> {
        [
            "/",
            "/api/health",
            "/api/auth/login",
            "/api/auth/register",
            "/api/auth/refresh",
        ]
        .into_iter()
        .map(str::to_string)
        .collect()
    }

    /// Load configuration from `GATEWAY_CONFIG` (if set) and the environment.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed, an override is
    /// malformed, or the result fails validation.
    pub fn load() -> Result<Self, ConfigError> {
        let mut config = match std::env::var(CONFIG_PATH_ENV) {
            Ok(path) => Self::from_file(path)?,
            Err(_) => Self::default(),
        };
        config.apply_env(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Read a JSON configuration file. Missing fields take their defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or is not valid.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(serde_json::from_str(&raw)?)
    }

    /// Apply environment overrides read through `lookup`.
    ///
    /// # Errors
    ///
    /// Returns `InvalidValue` for a non-boolean `RATE_LIMIT_ENABLED`.
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(addr) = lookup("LISTEN_ADDR") {
            self.listen_addr = addr;
        }
        if let Some(secret) = lookup("JWT_SECRET") {
            self.auth.jwt_secret = secret;
        }
        for (key, service) in SERVICE_URL_ENV {
            if let Some(url) = lookup(key) {
                self.services.insert((*service).to_string(), url);
            }
        }
        if let Some(origins) = lookup("CORS_ORIGINS") {
            self.cors_origins = origins
                .split(',')
                .map(str::trim)
                .filter(|o| !o.is_empty())
                .map(str::to_string)
                .collect();
        }
        if let Some(enabled) = lookup("RATE_LIMIT_ENABLED") {
            self.rate_limit.enabled = match enabled.trim().to_ascii_lowercase().as_str() {
                "1" | "true" | "yes" | "on" => true,
                "0" | "false" | "no" | "off" => false,
                _ => {
                    return Err(ConfigError::InvalidValue {
                        key: "RATE_LIMIT_ENABLED",
                        value: enabled,
                    })
                }
            };
        }
        Ok(())
    }

    /// Check the configuration is usable.
    ///
    /// # Errors
    ///
    /// Returns an error for an empty secret, a route or default pointing at a
    /// service without a URL, or an invalid route, path or limit.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.auth.jwt_secret.is_empty() {
            return Err(ConfigError::MissingSecret);
        }
        self.service_url(&self.auth.identity_service)?;
        self.route_table()?;
        self.public_path_set()?;
        self.rate_limit_rules()?;
        Ok(())
    }

    fn service_url(&self, service: &str) -> Result<&str, ConfigError> {
        self.services
            .get(service)
            .map(String::as_str)
            .ok_or_else(|| ConfigError::UnknownService(service.to_string()))
    }

    /// Build the immutable route table.
    ///
    /// # Errors
    ///
    /// Returns an error if a route names an unknown service or has a bad prefix.
    pub fn route_table(&self) -> Result<RouteTable, ConfigError> {
        let routes = self
            .routes
            .iter()
            .map(|r| Ok(Route::new(&r.prefix, &r.service, self.service_url(&r.service)?)))
            .collect::<Result<Vec<_>, ConfigError>>()?;
        let default = Route::new(
            &self.api_prefix,
            &self.default_service,
            self.service_url(&self.default_service)?,
        );
        Ok(RouteTable::new(routes, default)?)
    }

    /// Build the immutable public path set.
    ///
    /// # Errors
    ///
    /// Returns an error if an entry does not start with `/`.
    pub fn public_path_set(&self) -> Result<PublicPathSet, ConfigError> {
        Ok(PublicPathSet::new(&self.public_paths)?)
    }

    /// Build the immutable rate-limit rule set.
    ///
    /// # Errors
    ///
    /// Returns an error for malformed or zero limits.
    pub fn rate_limit_rules(&self) -> Result<RateLimitRules, ConfigError> {
        let (limit, window) = self.rate_limit.default.parse()?;
        let global = RateLimitRule::global(limit, window);

        let mut overrides = Vec::new();
        for (service, spec) in &self.rate_limit.services {
            let (limit, window) = spec.parse()?;
            overrides.push(RateLimitRule::service(service, limit, window));
        }
        for (path, spec) in &self.rate_limit.paths {
            let (limit, window) = spec.parse()?;
            overrides.push(RateLimitRule::path(path, limit, window));
        }
        Ok(RateLimitRules::new(global, overrides)?)
    }

    /// Authentication settings in the form the auth crate expects.
    ///
    /// # Errors
    ///
    /// Returns `UnknownService` if the identity service has no URL.
    pub fn auth_config(&self) -> Result<AuthConfig, ConfigError> {
        Ok(AuthConfig {
            jwt_secret: self.auth.jwt_secret.clone(),
            identity_base_url: self.service_url(&self.auth.identity_service)?.to_string(),
            whoami_path: self.auth.whoami_path.clone(),
            identity_timeout_seconds: self.auth.identity_timeout_seconds,
        })
    }

    /// Get the proxy timeout as a `Duration`.
    #[must_use]
    pub fn proxy_timeout(&self) -> Duration {
        Duration::from_secs(self.proxy_timeout_seconds)
    }

    /// The path forwarded to a backend: the request path minus the API prefix.
    ///
    /// `/api/auth/login` becomes `/auth/login`; `/api` becomes `/`.
    #[must_use]
    pub fn backend_path(&self, path: &str) -> String {
        let prefix = self.api_prefix.trim_end_matches('/');
        let rest = match path.strip_prefix(prefix) {
            Some(rest) if prefix.is_empty() || rest.is_empty() || rest.starts_with('/') => rest,
            _ => path,
        };
        if rest.is_empty() {
            "/".to_string()
        } else {
            rest.to_string()
        }
    }
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            listen_addr: Self::default_listen_addr(),
            cors_origins: Vec::new(),
            max_body_bytes: Self::default_max_body(),
            proxy_timeout_seconds: Self::default_proxy_timeout(),
            api_prefix: Self::default_api_prefix(),
            services: Self::default_services(),
            routes: Self::default_routes(),
            default_service: Self::default_service(),
            public_paths: Self::default_public_paths(),
            rate_limit: RateLimitConfig::default(),
            auth: AuthSettings::default(),
        }
    }
}

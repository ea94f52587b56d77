//! Fixed-window rate limiting.
//!
//! Every request is charged against exactly one rule: the path rule for the
//! exact request path if one exists, else the rule of the resolved service,
//! else the global rule. Each `(rule, client)` pair owns a counter that is
//! created on first use and resets once its window has elapsed.
//!
//! Path rules match with trailing slashes ignored, the same way public paths
//! do, so `/api/auth/login/` is charged to the `/api/auth/login` rule.
//!
//! Counters live in a concurrent map. The window reset, the increment and
//! the read of the new count for one key all happen under that key's entry
//! guard, so two concurrent requests can never both be admitted past the
//! limit.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use dashmap::DashMap;
use serde::Serialize;

use crate::error::{CoreError, Result};
use crate::routing::trim_trailing_slash;

/// The granularity a rule applies at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RateLimitScope {
    /// Applies to every request without a more specific rule.
    Global,
    /// Applies to all requests routed to one service.
    Service,
    /// Applies to one exact request path.
    Path,
}

impl RateLimitScope {
    /// Short name used in counter keys and logs.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Global => "global",
            Self::Service => "service",
            Self::Path => "path",
        }
    }
}

/// A single rate-limit rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RateLimitRule {
    /// The rule's scope.
    pub scope: RateLimitScope,
    /// Service id for service rules, path for path rules, empty for global.
    pub key: String,
    /// Requests allowed per window.
    pub limit: u32,
    /// Window length.
    pub window: Duration,
}

impl RateLimitRule {
    /// The global default rule.
    #[must_use]
    pub fn global(limit: u32, window: Duration) -> Self {
        Self {
            scope: RateLimitScope::Global,
            key: String::new(),
            limit,
            window,
        }
    }

    /// A rule for all requests routed to `service`.
    #[must_use]
    pub fn service(service: impl Into<String>, limit: u32, window: Duration) -> Self {
        Self {
            scope: RateLimitScope::Service,
            key: service.into(),
            limit,
            window,
        }
    }

    /// A rule for one exact request path. A trailing slash is dropped.
    #[must_use]
    pub fn path(path: impl Into<String>, limit: u32, window: Duration) -> Self {
        let path = path.into();
        Self {
            scope: RateLimitScope::Path,
            key: trim_trailing_slash(&path).to_string(),
            limit,
            window,
        }
    }

    /// The counter namespace for this rule, e.g. `service:campaign`.
    #[must_use]
    pub fn scope_key(&self) -> String {
        match self.scope {
            RateLimitScope::Global => "global".to_string(),
            scope => format!("{}:{}", scope.as_str(), self.key),
        }
    }

    fn validate(&self) -> Result<()> {
        if self.limit == 0 {
            return Err(CoreError::InvalidRule {
                key: self.scope_key(),
                reason: "limit must be positive",
            });
        }
        if self.window.is_zero() {
            return Err(CoreError::InvalidRule {
                key: self.scope_key(),
                reason: "window must be positive",
            });
        }
        Ok(())
    }
}

/// The full immutable rule set.
#[derive(Debug, Clone)]
pub struct RateLimitRules {
    global: RateLimitRule,
    services: HashMap<String, RateLimitRule>,
    paths: HashMap<String, RateLimitRule>,
}

impl RateLimitRules {
    /// Build a rule set from a global rule and any number of overrides.
    ///
    /// Overrides that are global-scoped replace the global rule. A later
    /// override for the same service or path replaces an earlier one.
    ///
    /// # Errors
    ///
    /// Returns an error if any rule has a zero limit or window.
    pub fn new(global: RateLimitRule, overrides: impl IntoIterator<Item = RateLimitRule>) -> Result<Self> {
        global.validate()?;
        let mut rules = Self {
            global,
            services: HashMap::new(),
            paths: HashMap::new(),
        };
        for rule in overrides {
            rule.validate()?;
            match rule.scope {
                RateLimitScope::Global => rules.global = rule,
                RateLimitScope::Service => {
                    rules.services.insert(rule.key.clone(), rule);
                }
                RateLimitScope::Path => {
                    rules.paths.insert(trim_trailing_slash(&rule.key).to_string(), rule);
                }
            }
        }
        Ok(rules)
    }

    /// The most specific rule for a request: path, then service, then global.
    #[must_use]
    pub fn select(&self, path: &str, service: &str) -> &RateLimitRule {
        self.paths
            .get(trim_trailing_slash(path))
            .or_else(|| self.services.get(service))
            .unwrap_or(&self.global)
    }

    /// The global rule.
    #[must_use]
    pub const fn global(&self) -> &RateLimitRule {
        &self.global
    }
}

/// Result of a rate-limit check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RateLimitDecision {
    /// Whether the request may proceed.
    pub permitted: bool,
    /// Seconds until the current window ends. Zero when permitted.
    pub retry_after_seconds: u64,
    /// Counter namespace of the governing rule, e.g. `path:/api/auth/login`.
    pub scope_key: String,
    /// Limit of the governing rule.
    pub limit: u32,
    /// Requests left in the current window after this one.
    pub remaining: u32,
}

impl RateLimitDecision {
    fn unlimited() -> Self {
        Self {
            permitted: true,
            retry_after_seconds: 0,
            scope_key: "disabled".to_string(),
            limit: u32::MAX,
            remaining: u32::MAX,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct CounterKey {
    scope_key: String,
    client: String,
}

#[derive(Debug, Clone, Copy)]
struct Window {
    count: u32,
    started_at: Instant,
    length: Duration,
}

impl Window {
    fn has_elapsed(&self, now: Instant) -> bool {
        now.saturating_duration_since(self.started_at) >= self.length
    }
}

/// Concurrency-safe fixed-window rate limiter.
///
/// Constructed once and shared behind an `Arc`; there is no global instance.
#[derive(Debug)]
pub struct RateLimiter {
    enabled: bool,
    rules: RateLimitRules,
    counters: DashMap<CounterKey, Window>,
}

impl RateLimiter {
    /// Create a limiter. With `enabled == false` every request is permitted.
    #[must_use]
    pub fn new(rules: RateLimitRules, enabled: bool) -> Self {
        Self {
            enabled,
            rules,
            counters: DashMap::new(),
        }
    }

    /// Whether limiting is enabled.
    #[must_use]
    pub const fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// The rule set.
    #[must_use]
    pub const fn rules(&self) -> &RateLimitRules {
        &self.rules
    }

    /// Charge one request from `client` to `path` on `service`.
    #[must_use]
    pub fn allow(&self, client: &str, path: &str, service: &str) -> RateLimitDecision {
        self.allow_at(client, path, service, Instant::now())
    }

    /// Same as [`allow`](Self::allow) with an explicit clock reading.
    #[must_use]
    pub fn allow_at(&self, client: &str, path: &str, service: &str, now: Instant) -> RateLimitDecision {
        if !self.enabled {
            return RateLimitDecision::unlimited();
        }

        let rule = self.rules.select(path, service);
        let key = CounterKey {
            scope_key: rule.scope_key(),
            client: client.to_string(),
        };

        let (count, started_at) = {
            let mut window = self.counters.entry(key.clone()).or_insert_with(|| Window {
                count: 0,
                started_at: now,
                length: rule.window,
            });
            if window.has_elapsed(now) {
                window.count = 0;
                window.started_at = now;
            }
            window.length = rule.window;
            window.count = window.count.saturating_add(1);
            (window.count, window.started_at)
        };

        if count > rule.limit {
            let elapsed = now.saturating_duration_since(started_at);
            let remaining = rule.window.saturating_sub(elapsed);
            let retry_after_seconds = ceil_secs(remaining).max(1);
            tracing::debug!(
                scope = %key.scope_key,
                client = %key.client,
                count,
                limit = rule.limit,
                retry_after_seconds,
                "Rate limit exceeded"
            );
            return RateLimitDecision {
                permitted: false,
                retry_after_seconds,
                scope_key: key.scope_key,
                limit: rule.limit,
                remaining: 0,
            };
        }

        RateLimitDecision {
            permitted: true,
            retry_after_seconds: 0,
            scope_key: key.scope_key,
            limit: rule.limit,
            remaining: rule.limit - count,
        }
    }

    /// Drop counters whose window has elapsed. Returns how many were removed.
    pub fn purge_expired(&self) -> usize {
        self.purge_expired_at(Instant::now())
    }

    /// Same as [`purge_expired`](Self::purge_expired) with an explicit clock reading.
    pub fn purge_expired_at(&self, now: Instant) -> usize {
        let before = self.counters.len();
        self.counters.retain(|_, window| !window.has_elapsed(now));
        before.saturating_sub(self.counters.len())
    }

    /// Number of live counters.
    #[must_use]
    pub fn counter_count(&self) -> usize {
        self.counters.len()
    }
}

fn ceil_secs(d: Duration) -> u64 {
    if d.subsec_nanos() > 0 {
        d.as_secs() + 1
    } else {
        d.as_secs()
    }
}

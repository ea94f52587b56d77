//! Static path routing.
//!
//! The [`RouteTable`] maps request paths to backend services by longest
//! prefix match and the [`PublicPathSet`] decides which paths skip
//! authentication. Both are built once at startup and only read afterwards,
//! so they are shared across requests without synchronization.

use std::collections::HashSet;

use serde::Serialize;

use crate::error::{CoreError, Result};

/// A prefix→backend binding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Route {
    /// Path prefix, always starting with `/` and without a trailing slash.
    pub prefix: String,
    /// Identifier of the backend service.
    pub service_id: String,
    /// Base URL of the backend service, without a trailing slash.
    pub base_url: String,
}

impl Route {
    /// Create a route, normalizing the prefix and base URL.
    ///
    /// A trailing `/*` or `/` on the prefix is dropped, so `/api/ai/*` and
    /// `/api/ai` are the same route.
    #[must_use]
    pub fn new(
        prefix: impl Into<String>,
        service_id: impl Into<String>,
        base_url: impl Into<String>,
    ) -> Self {
        Self {
            prefix: normalize_prefix(&prefix.into()),
            service_id: service_id.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    fn validate(&self) -> Result<()> {
        if !self.prefix.starts_with('/') {
            return Err(CoreError::InvalidPrefix(self.prefix.clone()));
        }
        if self.base_url.is_empty() {
            return Err(CoreError::MissingBaseUrl {
                prefix: self.prefix.clone(),
                service: self.service_id.clone(),
            });
        }
        Ok(())
    }
}

/// The outcome of [`RouteTable::resolve`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedRoute<'a> {
    /// Identifier of the selected backend service.
    pub service_id: &'a str,
    /// Base URL of the selected backend service.
    pub base_url: &'a str,
    /// The prefix that matched, or the default route's prefix.
    pub matched_prefix: &'a str,
    /// Whether the default route was used.
    pub is_default: bool,
}

/// Ordered prefix→backend bindings with a default fallback.
#[derive(Debug, Clone)]
pub struct RouteTable {
    routes: Vec<Route>,
    default: Route,
}

impl RouteTable {
    /// Build a route table. Configuration order is kept for tie-breaking.
    ///
    /// # Errors
    ///
    /// Returns an error if a prefix does not start with `/` or a route has an
    /// empty base URL.
    pub fn new(routes: Vec<Route>, default: Route) -> Result<Self> {
        for route in &routes {
            route.validate()?;
        }
        default.validate()?;
        Ok(Self { routes, default })
    }

    /// Resolve a request path to its backend.
    ///
    /// The longest matching prefix wins; among equally long prefixes the one
    /// configured first wins. Unmatched paths resolve to the default route.
    #[must_use]
    pub fn resolve(&self, path: &str) -> ResolvedRoute<'_> {
        let mut best: Option<&Route> = None;
        for route in &self.routes {
            if !prefix_matches(&route.prefix, path) {
                continue;
            }
            if best.map_or(true, |b| route.prefix.len() > b.prefix.len()) {
                best = Some(route);
            }
        }

        match best {
            Some(route) => ResolvedRoute {
                service_id: &route.service_id,
                base_url: &route.base_url,
                matched_prefix: &route.prefix,
                is_default: false,
            },
            None => ResolvedRoute {
                service_id: &self.default.service_id,
                base_url: &self.default.base_url,
                matched_prefix: &self.default.prefix,
                is_default: true,
            },
        }
    }

    /// The configured routes, in configuration order.
    #[must_use]
    pub fn routes(&self) -> &[Route] {
        &self.routes
    }

    /// The default route.
    #[must_use]
    pub const fn default_route(&self) -> &Route {
        &self.default
    }
}

/// Paths that bypass authentication.
///
/// Entries ending in `/*` match the prefix and everything below it; all other
/// entries match exactly. A trailing slash on the request path is ignored.
#[derive(Debug, Clone, Default)]
pub struct PublicPathSet {
    exact: HashSet<String>,
    prefixes: Vec<String>,
}

impl PublicPathSet {
    /// Build the set from configuration entries.
    ///
    /// # Errors
    ///
    /// Returns an error if an entry does not start with `/`.
    pub fn new<I, S>(entries: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut set = Self::default();
        for entry in entries {
            let entry = entry.as_ref().trim();
            if !entry.starts_with('/') {
                return Err(CoreError::InvalidPrefix(entry.to_string()));
            }
            if let Some(prefix) = entry.strip_suffix("/*") {
                set.prefixes.push(normalize_prefix(prefix));
            } else {
                set.exact.insert(trim_trailing_slash(entry).to_string());
            }
        }
        Ok(set)
    }

    /// Whether `path` is exempt from authentication.
    #[must_use]
    pub fn is_public(&self, path: &str) -> bool {
        let path = trim_trailing_slash(path);
        self.exact.contains(path) || self.prefixes.iter().any(|p| prefix_matches(p, path))
    }
}

fn normalize_prefix(prefix: &str) -> String {
    let prefix = prefix.trim();
    let prefix = prefix.strip_suffix("/*").unwrap_or(prefix);
    let trimmed = prefix.trim_end_matches('/');
    if trimmed.is_empty() {
        "/".to_string()
    } else {
        trimmed.to_string()
    }
}

pub(crate) fn trim_trailing_slash(path: &str) -> &str {
    let trimmed = path.trim_end_matches('/');
    if trimmed.is_empty() {
        "/"
    } else {
        trimmed
    }
}

/// Segment-aware prefix test: `/api/ai` matches `/api/ai/x` but not `/api/aix`.
fn prefix_matches(prefix: &str, path: &str) -> bool {
    if prefix == "/" {
        return path.starts_with('/');
    }
    match path.strip_prefix(prefix) {
        Some(rest) => rest.is_empty() || rest.starts_with('/'),
        None => false,
    }
}

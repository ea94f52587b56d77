//! Core types for the campaign gateway.
//!
//! This crate provides the state the gateway shares across concurrent requests
//! and the types every other crate builds on:
//!
//! - **Routing**: the static prefix→backend [`RouteTable`] and the
//!   [`PublicPathSet`] of unauthenticated paths
//! - **Rate limiting**: the fixed-window [`RateLimiter`] and its rules
//! - **User context**: the live account record forwarded to backends
//!
//! # Example
//!
//! ```
//! use campaign_gateway_core::{Route, RouteTable};
//!
//! let table = RouteTable::new(
//!     vec![
//!         Route::new("/api/auth", "identity", "http://identity:8001"),
//!         Route::new("/api/campaigns", "campaign", "http://campaign:8002"),
//!     ],
//!     Route::new("/api", "campaign", "http://campaign:8002"),
//! )
//! .unwrap();
//!
//! let resolved = table.resolve("/api/auth/login");
//! assert_eq!(resolved.service_id, "identity");
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod context;
pub mod error;
pub mod rate_limit;
pub mod routing;

pub use context::UserContext;
pub use error::{CoreError, Result};
pub use rate_limit::{RateLimitDecision, RateLimitRule, RateLimitRules, RateLimitScope, RateLimiter};
pub use routing::{PublicPathSet, ResolvedRoute, Route, RouteTable};

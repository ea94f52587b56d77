//! HTTP request handlers.
//!
//! `health` serves the gateway's own endpoints; `proxy` runs the request
//! pipeline for everything under the API prefix.

pub mod health;
pub mod proxy;

//! HTTP gateway for service tokens and transaction-code lookups.
//!
//! The service does two things on behalf of its callers:
//!
//! - `GET /accessToken` runs an OAuth2 client-credentials grant against the
//!   identity provider and returns the provider's JSON response as is.
//! - `GET /tcodes?accessRight=<name>` looks up the transaction codes granted by
//!   an access right in the authorization database.
//!
//! Both routes are timed into a Prometheus histogram, served next to
//! liveness, readiness and scrape endpoints that are not timed.
//!
//! # Modules
//!
//! - [`config`]: Configuration loading from environment
//! - [`error`]: Unified error types
//! - [`secrets`]: Startup decoding of base64 secrets
//! - [`metrics`]: Request duration histogram and process metrics
//! - [`auth`]: Token acquisition
//! - [`db`]: Database lookup and driver seam
//! - [`api`]: HTTP routes, handlers and timing middleware

pub mod api;
pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod metrics;
pub mod secrets;

pub use config::Config;
pub use error::{GatewayError, Result};

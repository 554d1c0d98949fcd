//! OAuth2 client-credentials token acquisition.
//!
//! This module handles:
//! - The token response type
//! - The client that posts the grant to the identity provider

pub mod client;
pub mod types;

pub use client::TokenAcquirer;
pub use types::TokenResponse;

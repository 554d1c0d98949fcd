//! Unified error types for the gateway.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;
use tracing::error;

/// Unified error type for the gateway.
#[derive(Error, Debug)]
pub enum GatewayError {
    /// Configuration loading error.
    #[error("configuration error: {0}")]
    Config(#[from] envy::Error),

    /// Token endpoint error.
    #[error("token acquisition failed: {0}")]
    Auth(#[from] UpstreamAuthError),

    /// Database error.
    #[error("data access failed: {0}")]
    DataAccess(#[from] DataAccessError),
}

/// Failures talking to the OAuth2 token endpoint.
#[derive(Error, Debug)]
pub enum UpstreamAuthError {
    /// The provider answered with a non-success status.
    #[error("HTTP error! status: {status}")]
    Status {
        /// Status code returned by the provider.
        status: u16,
    },

    /// The request never produced a response (connect, TLS, timeout).
    #[error("token request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The success body was not JSON.
    #[error("failed to parse token response: {0}")]
    Decode(String),
}

impl UpstreamAuthError {
    /// Status code returned by the provider, if there was a response.
    pub fn status(&self) -> Option<u16> {
        match self {
            UpstreamAuthError::Status { status } => Some(*status),
            _ => None,
        }
    }
}

/// Connection and SQL execution failures.
#[derive(Error, Debug)]
pub enum DataAccessError {
    /// Could not open a connection.
    #[error("connection failed: {0}")]
    Connect(String),

    /// Statement execution or row fetch failed.
    #[error("query failed: {0}")]
    Query(String),

    /// Closing the connection failed.
    #[error("failed to close connection: {0}")]
    Close(String),

    /// The configured outbound deadline elapsed.
    #[error("database call timed out")]
    Timeout,

    /// The blocking driver task panicked or was cancelled.
    #[error("database worker failed: {0}")]
    Worker(String),
}

/// Convenient Result type alias.
pub type Result<T> = std::result::Result<T, GatewayError>;

/// Failures are not translated per route: the caller gets a bare 500 and the
/// cause goes to the log.
impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        error!(error = %self, "request failed");
        (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error").into_response()
    }
}

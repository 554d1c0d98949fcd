//! Token endpoint payloads.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Grant type sent with every token request.
pub const GRANT_TYPE_CLIENT_CREDENTIALS: &str = "client_credentials";

/// Form body of a client-credentials token request.
#[derive(Debug, Clone, Serialize)]
pub struct TokenRequest<'a> {
    /// Registered client identifier.
    pub client_id: &'a str,
    /// Requested scope.
    pub scope: &'a str,
    /// Decoded client secret.
    pub client_secret: &'a str,
    /// Always `client_credentials`.
    pub grant_type: &'static str,
}

/// Provider response, kept exactly as received.
///
/// Only a few well-known fields get accessors; everything else the provider
/// sends is carried along and serialized back unchanged.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(transparent)]
pub struct TokenResponse(Value);

impl TokenResponse {
    /// Wrap a raw JSON payload.
    pub fn new(value: Value) -> Self {
        Self(value)
    }

    /// The bearer token.
    pub fn access_token(&self) -> Option<&str> {
        self.0.get("access_token").and_then(Value::as_str)
    }

    /// Token type, usually `Bearer`.
    pub fn token_type(&self) -> Option<&str> {
        self.0.get("token_type").and_then(Value::as_str)
    }

    /// Lifetime in seconds. Some providers send it as a string.
    pub fn expires_in(&self) -> Option<u64> {
        match self.0.get("expires_in")? {
            Value::Number(n) => n.as_u64(),
            Value::String(s) => s.parse().ok(),
            _ => None,
        }
    }

    /// The full payload.
    pub fn as_json(&self) -> &Value {
        &self.0
    }

    /// Consume into the full payload.
    pub fn into_json(self) -> Value {
        self.0
    }
}

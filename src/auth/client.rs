//! Client-credentials grant against the identity provider.

use std::sync::Arc;
use std::time::Duration;

use reqwest::redirect::Policy;
use tracing::{debug, instrument, warn};

use crate::config::{CLIENT_ID, TOKEN_ENDPOINT, TOKEN_SCOPE};
use crate::error::UpstreamAuthError;
use crate::secrets::Credentials;

use super::types::{TokenRequest, TokenResponse, GRANT_TYPE_CLIENT_CREDENTIALS};

/// Maximum number of redirects followed on the token request.
const MAX_REDIRECTS: usize = 10;

/// Requests access tokens on behalf of this service.
#[derive(Debug, Clone)]
pub struct TokenAcquirer {
    /// HTTP client for token requests.
    http: reqwest::Client,
    /// Token endpoint URL.
    endpoint: String,
    /// Registered client identifier.
    client_id: String,
    /// Requested scope.
    scope: String,
    /// Decoded secrets.
    credentials: Arc<Credentials>,
}

impl TokenAcquirer {
    /// Create an acquirer for the configured provider.
    ///
    /// `timeout` bounds the whole request; `None` leaves the transport default
    /// (no deadline).
    pub fn new(
        credentials: Arc<Credentials>,
        timeout: Option<Duration>,
    ) -> Result<Self, UpstreamAuthError> {
        let mut builder = reqwest::Client::builder().redirect(Policy::limited(MAX_REDIRECTS));
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let http = builder.build()?;

        Ok(Self {
            http,
            endpoint: TOKEN_ENDPOINT.to_string(),
            client_id: CLIENT_ID.to_string(),
            scope: TOKEN_SCOPE.to_string(),
            credentials,
        })
    }

    /// Point the acquirer at another token endpoint.
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    /// Token endpoint URL.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Perform one client-credentials grant and return the provider payload.
    #[instrument(skip(self), fields(endpoint = %self.endpoint))]
    pub async fn acquire_token(&self) -> Result<TokenResponse, UpstreamAuthError> {
        let form = TokenRequest {
            client_id: &self.client_id,
            scope: &self.scope,
            client_secret: self.credentials.client_secret(),
            grant_type: GRANT_TYPE_CLIENT_CREDENTIALS,
        };

        let response = self.http.post(&self.endpoint).form(&form).send().await?;

        let status = response.status();
        if !status.is_success() {
            warn!(status = status.as_u16(), "Authentication failed");
            return Err(UpstreamAuthError::Status {
                status: status.as_u16(),
            });
        }

        let token: TokenResponse = response
            .json()
            .await
            .map_err(|e| UpstreamAuthError::Decode(e.to_string()))?;

        debug!(
            token_type = token.token_type().unwrap_or("unknown"),
            expires_in = token.expires_in(),
            "Access token acquired"
        );

        Ok(token)
    }
}

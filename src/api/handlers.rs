//! HTTP API handlers.

use std::sync::Arc;

use axum::extract::{Query, State};
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::Json;
use serde::Serialize;
use tracing::info;

use crate::auth::{TokenAcquirer, TokenResponse};
use crate::db::QueryGateway;
use crate::error::Result;
use crate::metrics::MetricsCollector;

/// Application state shared with handlers.
#[derive(Clone)]
pub struct AppState {
    /// Request metrics.
    pub metrics: Arc<MetricsCollector>,
    /// Token client.
    pub tokens: Arc<TokenAcquirer>,
    /// Database lookups.
    pub queries: Arc<QueryGateway>,
}

impl AppState {
    /// Create new app state.
    pub fn new(metrics: MetricsCollector, tokens: TokenAcquirer, queries: QueryGateway) -> Self {
        Self {
            metrics: Arc::new(metrics),
            tokens: Arc::new(tokens),
            queries: Arc::new(queries),
        }
    }
}

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// Status: "ok".
    pub status: &'static str,
}

/// Query string of `/tcodes`.
#[derive(Debug, Default)]
pub struct TcodesParams {
    /// Access right to look up.
    pub access_right: Option<String>,
}

impl TcodesParams {
    /// Pick the filter from raw query pairs. A repeated `accessRight`
    /// resolves to its first value.
    pub fn from_pairs(pairs: Vec<(String, String)>) -> Self {
        let access_right = pairs
            .into_iter()
            .find(|(key, _)| key == "accessRight")
            .map(|(_, value)| value);
        Self { access_right }
    }
}

/// Liveness and readiness handler - always returns 200.
pub async fn health() -> impl IntoResponse {
    Json(HealthResponse { status: "ok" })
}

/// Prometheus scrape endpoint.
pub async fn metrics(State(state): State<AppState>) -> impl IntoResponse {
    let (body, content_type) = state.metrics.snapshot();
    (StatusCode::OK, [(header::CONTENT_TYPE, content_type)], body)
}

/// Greeting on the root path.
pub async fn index() -> &'static str {
    info!("Hello from tcode-gateway!");
    "Hello from tcode-gateway!"
}

/// Fetch an access token and pass the provider payload through.
pub async fn access_token(State(state): State<AppState>) -> Result<Json<TokenResponse>> {
    let token = state.tokens.acquire_token().await?;
    Ok(Json(token))
}

/// Transaction codes granted by an access right.
pub async fn tcodes(
    State(state): State<AppState>,
    Query(pairs): Query<Vec<(String, String)>>,
) -> Result<Json<Vec<Option<String>>>> {
    let params = TcodesParams::from_pairs(pairs);
    let values = state.queries.lookup(params.access_right.as_deref()).await?;
    Ok(Json(values))
}

/// Catch-all for unknown routes.
pub async fn not_found() -> impl IntoResponse {
    (StatusCode::NOT_FOUND, "Not Found")
}

//! HTTP API route definitions.

use axum::middleware::from_fn_with_state;
use axum::{routing::get, Router};
use tower_http::trace::TraceLayer;

use super::handlers::{access_token, health, index, metrics, not_found, tcodes, AppState};
use super::timing::track_request_duration;

/// Create the API router.
///
/// Administrative `GET`s are neither timed nor logged. Everything else, other
/// methods on the administrative paths and the 404 fallback included, passes
/// through the timing middleware and then request tracing.
pub fn create_router(state: AppState) -> Router {
    let timed = timed_router(state.clone());
    admin_router(state, timed.clone()).merge(timed)
}

/// Application routes behind the timing middleware.
fn timed_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/accessToken", get(access_token))
        .route("/tcodes", get(tcodes))
        .fallback(not_found)
        .layer(TraceLayer::new_for_http())
        .layer(from_fn_with_state(state.metrics.clone(), track_request_duration))
        .with_state(state)
}

/// Health and metrics endpoints. Methods other than `GET` go to `other`.
pub fn admin_router(state: AppState, other: Router) -> Router {
    Router::new()
        .route("/ready", get(health).fallback_service(other.clone()))
        .route("/live", get(health).fallback_service(other.clone()))
        .route("/metrics", get(metrics).fallback_service(other))
        .with_state(state)
}

//! HTTP API module: administrative endpoints, token and lookup routes.

pub mod handlers;
pub mod routes;
pub mod timing;

pub use handlers::AppState;
pub use routes::create_router;

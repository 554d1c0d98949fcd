//! Integration tests for the gateway.
//!
//! These tests run the full router on a real socket, with a fake identity
//! provider served from the same process and the mock database driver.
//!
//! Run with: cargo test --test integration

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::http::StatusCode;
use axum::routing::post;
use axum::{Form, Json, Router};
use pretty_assertions::assert_eq;
use serde_json::json;
use tokio::net::TcpListener;

use tcode_gateway::api::{create_router, AppState};
use tcode_gateway::auth::TokenAcquirer;
use tcode_gateway::db::{MockConnector, QueryGateway};
use tcode_gateway::metrics::MetricsCollector;
use tcode_gateway::secrets::{Credentials, RawSecrets};

/// Serve a router on an ephemeral port.
async fn serve(app: Router) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    addr
}

/// Fake identity provider that only accepts the right client secret.
async fn spawn_provider() -> SocketAddr {
    let app = Router::new().route(
        "/oauth2/v2.0/token",
        post(|Form(form): Form<HashMap<String, String>>| async move {
            if form.get("client_secret").map(String::as_str) != Some("integration-secret") {
                return (StatusCode::UNAUTHORIZED, Json(json!({ "error": "invalid_client" })));
            }
            (
                StatusCode::OK,
                Json(json!({
                    "token_type": "Bearer",
                    "expires_in": 3599,
                    "ext_expires_in": 3599,
                    "access_token": "eyJ.integration.token"
                })),
            )
        }),
    );
    serve(app).await
}

async fn spawn_gateway(secret_b64: &str, mock: &MockConnector) -> SocketAddr {
    let raw = RawSecrets {
        client_secret: Some(secret_b64.to_string()),
        username: Some("c2NvdHQ=".to_string()),
        password: Some("dGlnZXI=".to_string()),
    };
    let credentials = Arc::new(Credentials::decode(&raw));
    let provider = spawn_provider().await;

    let tokens = TokenAcquirer::new(credentials.clone(), None)
        .unwrap()
        .with_endpoint(format!("http://{}/oauth2/v2.0/token", provider));
    let queries = QueryGateway::new(Arc::new(mock.clone()), credentials, None);
    let state = AppState::new(MetricsCollector::new().unwrap(), tokens, queries);

    serve(create_router(state)).await
}

/// Decoded secret reaches the provider and the payload comes back whole.
#[tokio::test]
async fn test_access_token_round_trip() {
    let mock = MockConnector::new();
    // "integration-secret"
    let gateway = spawn_gateway("aW50ZWdyYXRpb24tc2VjcmV0", &mock).await;

    let response = reqwest::get(format!("http://{}/accessToken", gateway)).await.unwrap();
    assert_eq!(response.status(), reqwest::StatusCode::OK);

    let body = response.text().await.unwrap();
    assert_eq!(
        body,
        r#"{"token_type":"Bearer","expires_in":3599,"ext_expires_in":3599,"access_token":"eyJ.integration.token"}"#
    );
}

/// A rejected client secret surfaces as a generic failure.
#[tokio::test]
async fn test_access_token_rejected() {
    let mock = MockConnector::new();
    let gateway = spawn_gateway("d3Jvbmc=", &mock).await;

    let response = reqwest::get(format!("http://{}/accessToken", gateway)).await.unwrap();

    assert_eq!(response.status(), reqwest::StatusCode::INTERNAL_SERVER_ERROR);
}

/// Lookups use the decoded database user and show up in the scrape output.
#[tokio::test]
async fn test_tcodes_and_metrics() {
    let mock = MockConnector::new();
    mock.set_column(Some("Z_FI_POST"), "LOW", &[Some("FB01"), Some("FB50")]);
    let gateway = spawn_gateway("aW50ZWdyYXRpb24tc2VjcmV0", &mock).await;
    let client = reqwest::Client::new();

    let codes: Vec<String> = client
        .get(format!("http://{}/tcodes", gateway))
        .query(&[("accessRight", "Z_FI_POST")])
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(codes, vec!["FB01".to_string(), "FB50".to_string()]);

    let executed = mock.executed();
    assert_eq!(executed.len(), 1);
    assert_eq!(executed[0].username, "scott");
    assert_eq!(mock.open_connections(), 0);

    let ready = client
        .get(format!("http://{}/ready", gateway))
        .send()
        .await
        .unwrap();
    assert_eq!(ready.status(), reqwest::StatusCode::OK);

    let scrape = client
        .get(format!("http://{}/metrics", gateway))
        .send()
        .await
        .unwrap();
    assert_eq!(
        scrape.headers()["content-type"],
        "text/plain; version=0.0.4; charset=utf-8"
    );
    let text = scrape.text().await.unwrap();

    let tcodes_line = text
        .lines()
        .find(|l| {
            l.starts_with("http_request_duration_seconds_count") && l.contains("handler=\"/tcodes\"")
        })
        .expect("tcodes sample");
    assert!(tcodes_line.contains("code=\"200\""));
    assert!(tcodes_line.ends_with(" 1"));
    assert!(!text.contains("handler=\"/ready\""));
    assert!(!text.contains("handler=\"/metrics\""));
}

//! Request duration middleware.
//!
//! The timer is handed to the response body, so a sample is taken when the
//! body has been fully sent or dropped, not when the handler returns. A
//! request whose handler never produced a response (client went away) is
//! recorded with [`CLIENT_CLOSED_REQUEST`].

use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::Instant;

use axum::body::{Body, Bytes};
use axum::extract::{Request, State};
use axum::middleware::Next;
use axum::response::Response;
use http_body::{Body as HttpBody, Frame, SizeHint};

use crate::metrics::MetricsCollector;

/// Outcome code for requests abandoned before a response existed.
pub const CLIENT_CLOSED_REQUEST: u16 = 499;

/// RAII guard for one timed request.
/// Records exactly once, when finished or dropped.
pub struct RequestTimer {
    metrics: Arc<MetricsCollector>,
    method: String,
    route: String,
    start: Instant,
    status: Option<u16>,
    recorded: bool,
}

impl RequestTimer {
    /// Start timing a request.
    pub fn start(metrics: Arc<MetricsCollector>, method: &str, route: &str) -> Self {
        Self {
            metrics,
            method: method.to_string(),
            route: route.to_string(),
            start: Instant::now(),
            status: None,
            recorded: false,
        }
    }

    /// Remember the final status code.
    pub fn set_status(&mut self, status: u16) {
        self.status = Some(status);
    }

    fn record(&mut self) {
        if self.recorded {
            return;
        }
        self.recorded = true;
        let code = self.status.unwrap_or(CLIENT_CLOSED_REQUEST);
        self.metrics
            .observe(&self.method, &self.route, code, self.start.elapsed().as_secs_f64());
    }
}

impl Drop for RequestTimer {
    fn drop(&mut self) {
        self.record();
    }
}

/// Response body that stops its timer at end of stream.
pub struct TimedBody {
    inner: Body,
    timer: Option<RequestTimer>,
}

impl TimedBody {
    /// Wrap a body.
    pub fn new(inner: Body, timer: RequestTimer) -> Self {
        Self {
            inner,
            timer: Some(timer),
        }
    }
}

impl HttpBody for TimedBody {
    type Data = Bytes;
    type Error = axum::Error;

    fn poll_frame(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
    ) -> Poll<Option<Result<Frame<Self::Data>, Self::Error>>> {
        let this = self.get_mut();
        let polled = Pin::new(&mut this.inner).poll_frame(cx);
        if matches!(polled, Poll::Ready(None) | Poll::Ready(Some(Err(_)))) {
            this.timer.take();
        }
        polled
    }

    fn is_end_stream(&self) -> bool {
        self.inner.is_end_stream()
    }

    fn size_hint(&self) -> SizeHint {
        self.inner.size_hint()
    }
}

/// Time every request that reaches it.
pub async fn track_request_duration(
    State(metrics): State<Arc<MetricsCollector>>,
    request: Request,
    next: Next,
) -> Response {
    // URI path excludes the query string
    let mut timer = RequestTimer::start(metrics, request.method().as_str(), request.uri().path());

    let response = next.run(request).await;
    timer.set_status(response.status().as_u16());

    let (parts, body) = response.into_parts();
    Response::from_parts(parts, Body::new(TimedBody::new(body, timer)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;
    use axum::routing::get;
    use axum::{middleware, Router};
    use std::time::Duration;
    use tower::ServiceExt;

    fn count_for(collector: &MetricsCollector, route: &str) -> Vec<String> {
        let handler = format!("handler=\"{}\"", route);
        collector
            .snapshot()
            .0
            .lines()
            .filter(|l| l.starts_with("http_request_duration_seconds_count") && l.contains(&handler))
            .map(str::to_string)
            .collect()
    }

    fn app(metrics: Arc<MetricsCollector>) -> Router {
        Router::new()
            .route("/fast", get(|| async { "done" }))
            .route("/teapot", get(|| async { (StatusCode::IM_A_TEAPOT, "short and stout") }))
            .route("/hang", get(|| std::future::pending::<&'static str>()))
            .layer(middleware::from_fn_with_state(metrics, track_request_duration))
    }

    async fn call(app: Router, uri: &str) -> (StatusCode, Bytes) {
        let response = app
            .oneshot(axum::http::Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, body)
    }

    #[tokio::test]
    async fn records_once_with_final_status() {
        let metrics = Arc::new(MetricsCollector::new().unwrap());

        let (status, body) = call(app(metrics.clone()), "/teapot").await;
        assert_eq!(status, StatusCode::IM_A_TEAPOT);
        assert_eq!(&body[..], b"short and stout");

        let lines = count_for(&metrics, "/teapot");
        assert_eq!(lines.len(), 1);
        assert!(lines[0].contains("code=\"418\""));
        assert!(lines[0].ends_with(" 1"));
    }

    #[tokio::test]
    async fn route_label_drops_query_string() {
        let metrics = Arc::new(MetricsCollector::new().unwrap());

        call(app(metrics.clone()), "/fast?x=1&y=2").await;

        let lines = count_for(&metrics, "/fast");
        assert_eq!(lines.len(), 1);
        assert!(lines[0].contains("method=\"GET\""));
    }

    #[tokio::test]
    async fn aborted_request_is_recorded_once() {
        let metrics = Arc::new(MetricsCollector::new().unwrap());
        let request = axum::http::Request::builder().uri("/hang").body(Body::empty()).unwrap();

        let outcome =
            tokio::time::timeout(Duration::from_millis(20), app(metrics.clone()).oneshot(request)).await;
        assert!(outcome.is_err());

        let lines = count_for(&metrics, "/hang");
        assert_eq!(lines.len(), 1);
        assert!(lines[0].contains("code=\"499\""));
        assert!(lines[0].ends_with(" 1"));
    }

    #[tokio::test]
    async fn dropped_body_is_recorded() {
        let metrics = Arc::new(MetricsCollector::new().unwrap());

        let response = app(metrics.clone())
            .oneshot(axum::http::Request::builder().uri("/fast").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert!(count_for(&metrics, "/fast").is_empty());

        drop(response);
        assert_eq!(count_for(&metrics, "/fast").len(), 1);
    }
}

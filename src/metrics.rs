//! Prometheus metrics for request latency and process health.
//!
//! The collector owns its recorder instead of installing a global one, so a
//! process (or a test binary) can hold several independent collectors. The
//! binary builds exactly one at startup and shares it through the router state.

use metrics::{describe_histogram, histogram, with_local_recorder, Unit};
use metrics_exporter_prometheus::{BuildError, Matcher, PrometheusBuilder, PrometheusHandle, PrometheusRecorder};
use metrics_process::Collector;
use tracing::debug;

// === Metric Name Constants ===

/// HTTP request duration histogram metric name.
pub const METRIC_HTTP_REQUEST_DURATION: &str = "http_request_duration_seconds";

/// Histogram bucket boundaries in seconds.
pub const REQUEST_DURATION_BUCKETS: [f64; 10] =
    [0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0];

/// Content type of the Prometheus text exposition format.
pub const PROMETHEUS_CONTENT_TYPE: &str = "text/plain; version=0.0.4; charset=utf-8";

/// Request duration histogram plus default process metrics.
pub struct MetricsCollector {
    recorder: PrometheusRecorder,
    handle: PrometheusHandle,
    process: Collector,
}

impl MetricsCollector {
    /// Build a collector with the fixed request-duration buckets.
    pub fn new() -> Result<Self, BuildError> {
        let recorder = PrometheusBuilder::new()
            .set_buckets_for_metric(
                Matcher::Full(METRIC_HTTP_REQUEST_DURATION.to_string()),
                &REQUEST_DURATION_BUCKETS,
            )?
            .build_recorder();
        let handle = recorder.handle();
        let process = Collector::default();

        with_local_recorder(&recorder, || {
            describe_histogram!(
                METRIC_HTTP_REQUEST_DURATION,
                Unit::Seconds,
                "Duration of HTTP requests in seconds"
            );
            process.describe();
        });

        debug!("Metrics initialized");

        Ok(Self {
            recorder,
            handle,
            process,
        })
    }

    /// Record one request.
    pub fn observe(&self, method: &str, route: &str, outcome_code: u16, duration_seconds: f64) {
        with_local_recorder(&self.recorder, || {
            histogram!(
                METRIC_HTTP_REQUEST_DURATION,
                "code" => outcome_code.to_string(),
                "handler" => route.to_string(),
                "method" => method.to_string()
            )
            .record(duration_seconds);
        });
    }

    /// Render every collected metric and the matching content type.
    pub fn snapshot(&self) -> (String, &'static str) {
        with_local_recorder(&self.recorder, || self.process.collect());
        (self.handle.render(), PROMETHEUS_CONTENT_TYPE)
    }
}

impl std::fmt::Debug for MetricsCollector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MetricsCollector").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn count_line<'a>(snapshot: &'a str, route: &str) -> Option<&'a str> {
        let handler = format!("handler=\"{}\"", route);
        snapshot
            .lines()
            .find(|l| l.starts_with("http_request_duration_seconds_count") && l.contains(&handler))
    }

    #[test]
    fn snapshot_before_samples_has_no_requests() {
        let collector = MetricsCollector::new().expect("collector");
        let (body, content_type) = collector.snapshot();

        assert_eq!(content_type, PROMETHEUS_CONTENT_TYPE);
        assert!(!body.contains("http_request_duration_seconds_count"));
    }

    #[test]
    fn snapshot_includes_process_metrics() {
        let collector = MetricsCollector::new().expect("collector");
        let (body, _) = collector.snapshot();

        assert!(
            body.lines().any(|l| l.starts_with("process_")),
            "no process metrics in:\n{}",
            body
        );
    }

    #[test]
    fn observe_records_labeled_sample() {
        let collector = MetricsCollector::new().expect("collector");
        collector.observe("GET", "/tcodes", 200, 0.02);
        collector.observe("GET", "/tcodes", 200, 0.3);

        let (body, _) = collector.snapshot();
        let line = count_line(&body, "/tcodes").expect("count line");
        assert!(line.contains("code=\"200\""));
        assert!(line.contains("method=\"GET\""));
        assert!(line.ends_with(" 2"));
    }

    #[test]
    fn uses_fixed_buckets() {
        let collector = MetricsCollector::new().expect("collector");
        collector.observe("GET", "/", 200, 0.007);

        let (body, _) = collector.snapshot();
        assert!(body.contains("le=\"0.005\""));
        assert!(body.contains("le=\"2.5\""));
        assert!(body.contains("le=\"+Inf\""));
    }

    #[test]
    fn collectors_are_independent() {
        let a = MetricsCollector::new().expect("collector");
        let b = MetricsCollector::new().expect("collector");
        a.observe("GET", "/only-a", 404, 0.001);

        assert!(count_line(&a.snapshot().0, "/only-a").is_some());
        assert!(count_line(&b.snapshot().0, "/only-a").is_none());
    }
}

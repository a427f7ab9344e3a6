use axum::body::Body;
use axum::extract::MatchedPath;
use axum::http::Request;
use axum::middleware::Next;
use axum::response::Response;
use metrics::{counter, describe_counter, describe_histogram, histogram, Unit};
use metrics_exporter_prometheus::{BuildError, Matcher, PrometheusBuilder, PrometheusHandle};
use std::time::Instant;

const REQUEST_DURATION: &str = "http_request_duration_seconds";
const LATENCY_BUCKETS: &[f64] = &[0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5];

/// Paths polled by infrastructure; recording them would drown real traffic.
const UNTRACKED: &[&str] = &["/health", "/metrics"];

pub async fn metrics_middleware(
    matched_path: Option<MatchedPath>,
    req: Request<Body>,
    next: Next,
) -> Response {
    let path = matched_path
        .map(|p| p.as_str().to_string())
        .unwrap_or_else(|| req.uri().path().to_string());
    if UNTRACKED.contains(&path.as_str()) {
        return next.run(req).await;
    }

    let start = Instant::now();
    let method = req.method().to_string();
    let response = next.run(req).await;

    let labels = [
        ("method", method),
        ("path", path),
        ("status", response.status().as_u16().to_string()),
    ];
    counter!("http_requests_total", &labels).increment(1);
    histogram!(REQUEST_DURATION, &labels).record(start.elapsed().as_secs_f64());

    response
}

fn builder() -> Result<PrometheusBuilder, BuildError> {
    PrometheusBuilder::new()
        .set_buckets_for_metric(Matcher::Full(REQUEST_DURATION.to_string()), LATENCY_BUCKETS)
}

/// Installs the global Prometheus recorder and describes the HTTP metrics.
pub fn init_metrics() -> Result<PrometheusHandle, BuildError> {
    let handle = builder()?.install_recorder()?;
    describe_counter!("http_requests_total", "HTTP requests by method, route and status");
    describe_histogram!(REQUEST_DURATION, Unit::Seconds, "HTTP request latency");
    Ok(handle)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn latency_uses_configured_buckets() {
        let recorder = builder().unwrap().build_recorder();
        let handle = recorder.handle();
        metrics::with_local_recorder(&recorder, || {
            histogram!(REQUEST_DURATION, "path" => "/likes").record(0.02);
        });

        let rendered = handle.render();
        assert!(rendered.contains("http_request_duration_seconds_bucket{path=\"/likes\",le=\"0.025\"} 1"));
        assert!(rendered.contains("http_request_duration_seconds_bucket{path=\"/likes\",le=\"0.01\"} 0"));
    }
}

//! Prometheus request metrics.
//!
//! Every routed request is counted by route pattern, method and status, and
//! its latency is observed in a histogram. `GET /metrics` exports the
//! registry in the text exposition format.

use std::time::{Duration, Instant};

use axum::extract::{MatchedPath, Request, State};
use axum::http::{header, HeaderValue, Method, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use prometheus::{CounterVec, Encoder, HistogramOpts, HistogramVec, Opts, Registry, TextEncoder};
use tracing::error;

use crate::error::{AppError, Result};
use crate::state::AppState;

pub struct HttpMetrics {
    registry: Registry,
    /// Requests by route pattern, method and status code.
    pub requests_total: CounterVec,
    /// Request latency by route pattern and method.
    pub request_duration_seconds: HistogramVec,
}

impl HttpMetrics {
    pub fn new() -> std::result::Result<Self, prometheus::Error> {
        let registry = Registry::new();

        let requests_total = CounterVec::new(
            Opts::new("http_requests_total", "Number of HTTP requests"),
            &["path", "method", "status"],
        )?;

        let request_duration_seconds = HistogramVec::new(
            HistogramOpts::new(
                "http_request_duration_seconds",
                "HTTP request latency in seconds",
            ),
            &["path", "method"],
        )?;

        registry.register(Box::new(requests_total.clone()))?;
        registry.register(Box::new(request_duration_seconds.clone()))?;

        Ok(Self {
            registry,
            requests_total,
            request_duration_seconds,
        })
    }

    pub fn observe(&self, path: &str, method: &Method, status: StatusCode, elapsed: Duration) {
        self.requests_total
            .with_label_values(&[path, method.as_str(), status.as_str()])
            .inc();
        self.request_duration_seconds
            .with_label_values(&[path, method.as_str()])
            .observe(elapsed.as_secs_f64());
    }

    /// Renders the registry in the Prometheus text format.
    pub fn export(&self) -> std::result::Result<String, prometheus::Error> {
        let encoder = TextEncoder::new();
        let mut buffer = Vec::new();
        encoder.encode(&self.registry.gather(), &mut buffer)?;
        String::from_utf8(buffer).map_err(|err| prometheus::Error::Msg(err.to_string()))
    }
}

/// Route middleware recording [`HttpMetrics`] for each request.
pub async fn track_metrics(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    let path = request
        .extensions()
        .get::<MatchedPath>()
        .map(|matched| matched.as_str().to_owned())
        .unwrap_or_else(|| request.uri().path().to_owned());
    let method = request.method().clone();

    let started = Instant::now();
    let response = next.run(request).await;

    state
        .metrics()
        .observe(&path, &method, response.status(), started.elapsed());
    response
}

pub async fn metrics_handler(State(state): State<AppState>) -> Result<Response> {
    let body = state.metrics().export().map_err(|err| {
        error!(error = %err, "failed to encode metrics");
        AppError::Directory(portal_core::DirectoryError::Internal)
    })?;

    Ok((
        [(
            header::CONTENT_TYPE,
            HeaderValue::from_static("text/plain; version=0.0.4"),
        )],
        body,
    )
        .into_response())
}

//! Tracing middleware
//!
//! Logs request method, path, request_id, status code, and duration for each request.

use super::layer::{Middleware, Next};
use super::request_id::RequestId;
use crate::error::Result;
use crate::request::Request;
use crate::response::Response;
use std::time::Instant;
use tracing::{info_span, Level};

/// Middleware that creates a tracing span for every request
///
/// The `http_request` span carries:
/// - HTTP method
/// - Request path
/// - Request ID (when a [`RequestIdLayer`](super::RequestIdLayer) runs outside this layer)
/// - Response status code
/// - Request duration
/// - Any custom fields configured via `with_field()`
///
/// Successful responses are logged at the configured level, 4xx/5xx responses
/// and propagated errors at `WARN`.
///
/// # Example
///
/// ```rust,ignore
/// App::new()
///     .layer(TracingLayer::new().with_field("service", "bookshop"))
///     .layer(RequestIdLayer::new())
/// ```
#[derive(Debug, Clone)]
pub struct TracingLayer {
    level: Level,
    custom_fields: Vec<(String, String)>,
}

impl TracingLayer {
    /// Create a new TracingLayer with default INFO level
    pub fn new() -> Self {
        Self::with_level(Level::INFO)
    }

    /// Create a TracingLayer with a specific log level
    pub fn with_level(level: Level) -> Self {
        Self {
            level,
            custom_fields: Vec::new(),
        }
    }

    /// Add a custom field to every request span
    pub fn with_field(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.custom_fields.push((key.into(), value.into()));
        self
    }

    fn log_completed(&self, method: &str, path: &str, request_id: &str, status: u16, duration_ms: u64) {
        macro_rules! completed {
            ($macro:ident) => {
                tracing::$macro!(
                    method = %method,
                    path = %path,
                    request_id = %request_id,
                    status = status,
                    duration_ms = duration_ms,
                    "Request completed"
                )
            };
        }

        match self.level {
            Level::TRACE => completed!(trace),
            Level::DEBUG => completed!(debug),
            Level::INFO => completed!(info),
            Level::WARN => completed!(warn),
            _ => completed!(error),
        }
    }
}

impl Default for TracingLayer {
    fn default() -> Self {
        Self::new()
    }
}

impl Middleware for TracingLayer {
    fn handle(&self, req: &mut Request, next: Next<'_>) -> Result<Response> {
        let method = req.method().to_string();
        let path = req.path().to_string();
        let request_id = req
            .extensions()
            .get::<RequestId>()
            .map(|id| id.as_str().to_string())
            .unwrap_or_else(|| "unknown".to_string());

        let span = info_span!(
            "http_request",
            method = %method,
            path = %path,
            request_id = %request_id,
            fields = ?self.custom_fields,
            status = tracing::field::Empty,
            duration_ms = tracing::field::Empty,
            error = tracing::field::Empty,
        );
        let _enter = span.enter();
        let start = Instant::now();

        let result = next.run(req);
        let duration_ms = start.elapsed().as_millis() as u64;
        span.record("duration_ms", duration_ms);

        match &result {
            Ok(res) => {
                let status = res.status();
                span.record("status", status.as_u16());
                if status.is_client_error() || status.is_server_error() {
                    span.record("error", true);
                    tracing::warn!(
                        method = %method,
                        path = %path,
                        request_id = %request_id,
                        status = status.as_u16(),
                        duration_ms = duration_ms,
                        error = true,
                        "Request failed"
                    );
                } else {
                    self.log_completed(&method, &path, &request_id, status.as_u16(), duration_ms);
                }
            }
            Err(err) => {
                span.record("error", true);
                tracing::warn!(
                    method = %method,
                    path = %path,
                    request_id = %request_id,
                    duration_ms = duration_ms,
                    error = %err,
                    "Request raised an unhandled error"
                );
            }
        }

        result
    }
}

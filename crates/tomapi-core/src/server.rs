//! HTTP server implementation
//!
//! The core is synchronous; this module is the only async code. Each request
//! body is buffered, then [`App::handle`] runs on tokio's blocking pool.

use crate::app::App;
use crate::config::Environment;
use crate::error::{Error, Result};
use crate::request::Request;
use crate::response::{HttpResponse, Response};
use http::StatusCode;
use http_body_util::BodyExt;
use hyper::body::Incoming;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper_util::rt::TokioIo;
use std::convert::Infallible;
use std::sync::Arc;
use std::time::Instant;
use tokio::net::{TcpListener, ToSocketAddrs};
use tracing::{error, info};

/// Internal server struct
pub(crate) struct Server {
    app: Arc<App>,
}

impl Server {
    pub fn new(app: App) -> Self {
        Self { app: Arc::new(app) }
    }

    /// Bind `addr` and serve until the process exits
    pub async fn run(self, addr: impl ToSocketAddrs) -> Result<()> {
        let listener = TcpListener::bind(addr).await.map_err(Error::Io)?;
        self.serve(listener).await
    }

    /// Serve connections accepted from `listener`
    pub async fn serve(self, listener: TcpListener) -> Result<()> {
        info!(
            addr = %listener.local_addr().map_err(Error::Io)?,
            environment = self.app.environment().as_str(),
            "tomapi server running"
        );

        loop {
            let (stream, remote_addr) = listener.accept().await.map_err(Error::Io)?;
            let io = TokioIo::new(stream);
            let app = Arc::clone(&self.app);

            tokio::spawn(async move {
                let service = service_fn(move |req: hyper::Request<Incoming>| {
                    let app = Arc::clone(&app);
                    async move { Ok::<_, Infallible>(handle_request(app, req).await) }
                });

                if let Err(err) = http1::Builder::new().serve_connection(io, service).await {
                    error!(remote_addr = %remote_addr, "Connection error: {}", err);
                }
            });
        }
    }
}

/// Handle a single HTTP request
async fn handle_request(app: Arc<App>, req: hyper::Request<Incoming>) -> HttpResponse {
    let method = req.method().clone();
    let path = req.uri().path().to_string();
    let start = Instant::now();

    let (parts, body) = req.into_parts();
    let body = match body.collect().await {
        Ok(collected) => collected.to_bytes(),
        Err(err) => {
            error!(method = %method, path = %path, error = %err, "Failed to read request body");
            return plain(StatusCode::BAD_REQUEST, "Bad Request").into_http();
        }
    };
    let request = Request::new(parts, body);

    let environment = app.environment().clone();
    let outcome = tokio::task::spawn_blocking(move || app.handle(request)).await;

    let response = match outcome {
        Ok(Ok(response)) => response,
        Ok(Err(err)) => {
            error!(method = %method, path = %path, error = %err, "Unhandled error");
            internal_error(&environment, &err.to_string())
        }
        Err(join_err) => {
            error!(method = %method, path = %path, error = %join_err, "Handler panicked");
            internal_error(&environment, "handler panicked")
        }
    };

    log_request(&method, &path, response.status(), start);
    response.into_http()
}

fn plain(status: StatusCode, text: &str) -> Response {
    let mut res = Response::new();
    res.set_status(status);
    res.set_text(text);
    res
}

/// 500 response; details are hidden in production
pub(crate) fn internal_error(environment: &Environment, detail: &str) -> Response {
    if environment.show_error_details() {
        plain(
            StatusCode::INTERNAL_SERVER_ERROR,
            &format!("Internal Server Error: {}", detail),
        )
    } else {
        plain(StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error")
    }
}

/// Log request completion
fn log_request(method: &http::Method, path: &str, status: StatusCode, start: Instant) {
    let elapsed = start.elapsed();

    if status.is_server_error() {
        error!(
            method = %method,
            path = %path,
            status = status.as_u16(),
            duration_ms = elapsed.as_millis() as u64,
            "Request failed"
        );
    } else {
        info!(
            method = %method,
            path = %path,
            status = status.as_u16(),
            duration_ms = elapsed.as_millis() as u64,
            "Request completed"
        );
    }
}

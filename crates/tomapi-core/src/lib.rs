//! # tomapi Core
//!
//! Core library providing the routing, handler-resolution and
//! middleware-dispatch engine for tomapi.
//!
//! This crate is not meant to be used directly. Use `tomapi` instead.

mod app;
mod config;
pub mod dispatcher;
mod error;
pub mod handler;
pub mod middleware;
mod path_params;
mod request;
mod response;
pub mod router;
mod server;
pub mod static_files;
#[cfg(any(test, feature = "test-utils"))]
mod test_client;

// Public API
pub use app::App;
pub use config::{Config, Environment};
pub use dispatcher::{Dispatch, Dispatcher, ExceptionHandler};
pub use error::{BoxError, Error, Result};
pub use handler::{Handler, HandlerKind, Invokable, Resource, ResourceHandler, DEFAULT_METHODS};
pub use middleware::{Middleware, MiddlewareChain, Next, RequestId, RequestIdLayer, TracingLayer};
pub use path_params::PathParams;
pub use request::Request;
pub use response::{HttpResponse, Response};
pub use router::template::{match_path, RouteTemplate};
pub use router::{Route, Router};
pub use static_files::StaticFiles;
#[cfg(any(test, feature = "test-utils"))]
pub use test_client::{TestClient, TestRequest, TestResponse};

// Re-exported so applications can name status codes and methods without a
// direct `http` dependency.
pub use http::{Method, StatusCode};

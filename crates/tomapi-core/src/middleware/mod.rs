//! Middleware infrastructure for tomapi
//!
//! Middleware wraps request dispatch with cross-cutting behaviour. Layers are
//! added with `.layer()` on [`App`](crate::App); the most recently added layer
//! runs first on the way in and last on the way out.
//!
//! # Example
//!
//! ```rust,ignore
//! use tomapi_core::middleware::{RequestIdLayer, TracingLayer};
//!
//! App::new()
//!     .layer(TracingLayer::new())
//!     .layer(RequestIdLayer::new())
//!     .route("/", home)?
//!     .run("127.0.0.1:8080")
//! ```

mod layer;
mod request_id;
mod tracing_layer;

pub use layer::{Middleware, MiddlewareChain, Next};
pub use request_id::{RequestId, RequestIdLayer, REQUEST_ID_HEADER};
pub use tracing_layer::TracingLayer;

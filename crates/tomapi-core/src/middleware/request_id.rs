//! Request ID middleware
//!
//! Assigns every request a unique identifier, makes it available to inner
//! layers and handlers through the request extensions, and echoes it back in
//! the `x-request-id` response header.

use super::layer::Middleware;
use crate::request::Request;
use crate::response::Response;
use http::HeaderValue;
use std::fmt;
use uuid::Uuid;

/// Header carrying the request id
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Identifier assigned to a request by [`RequestIdLayer`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestId(String);

impl RequestId {
    /// Generate a fresh UUID v4 id
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Middleware that tags requests with a [`RequestId`]
///
/// An id already present in the extensions (set by an outer layer) is kept.
/// With [`trust_header`](RequestIdLayer::trust_header) an incoming
/// `x-request-id` header is reused instead of generating a new id.
#[derive(Debug, Clone, Default)]
pub struct RequestIdLayer {
    trust_header: bool,
}

impl RequestIdLayer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reuse a client supplied `x-request-id` header when present
    pub fn trust_header(mut self) -> Self {
        self.trust_header = true;
        self
    }
}

impl Middleware for RequestIdLayer {
    fn process_request(&self, req: &mut Request) {
        if req.extensions().get::<RequestId>().is_some() {
            return;
        }

        let id = self
            .trust_header
            .then(|| req.header(REQUEST_ID_HEADER))
            .flatten()
            .filter(|value| !value.is_empty())
            .map(|value| RequestId(value.to_string()))
            .unwrap_or_else(RequestId::generate);

        req.extensions_mut().insert(id);
    }

    fn process_response(&self, req: &Request, res: &mut Response) {
        let Some(id) = req.extensions().get::<RequestId>() else {
            return;
        };
        if let Ok(value) = HeaderValue::from_str(id.as_str()) {
            res.headers_mut().insert(REQUEST_ID_HEADER, value);
        }
    }
}

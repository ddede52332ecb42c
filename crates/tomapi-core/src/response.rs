//! Response type for tomapi
//!
//! A [`Response`] is created by the dispatcher with framework defaults
//! (status 200, empty body) and then mutated in place by the handler and by
//! middleware post-hooks. It is converted into an `http::Response` only at the
//! transport boundary.
//!
//! # Body setters
//!
//! | Setter | Default Content-Type |
//! |--------|----------------------|
//! | [`Response::set_text`] | `text/plain` |
//! | [`Response::set_json`] | `application/json` |
//! | [`Response::set_html`] | `text/html` |
//! | [`Response::set_body`] | none |
//!
//! An explicit [`Response::set_content_type`] always wins over the default
//! implied by the body setter, regardless of call order.
//!
//! # Example
//!
//! ```rust,ignore
//! fn greeting(_req: &Request, res: &mut Response, params: &PathParams) -> Result<()> {
//!     res.set_text(format!("Hello, {}", params.get("name").unwrap_or("stranger")));
//!     Ok(())
//! }
//! ```

use crate::error::Result;
use bytes::Bytes;
use http::{header, HeaderMap, HeaderValue, StatusCode};
use http_body_util::Full;
use serde::Serialize;
use std::borrow::Cow;

/// Response type handed to the transport
pub type HttpResponse = http::Response<Full<Bytes>>;

/// What kind of body was last written
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BodyKind {
    Raw,
    Text,
    Json,
    Html,
}

impl BodyKind {
    fn default_content_type(self) -> Option<&'static str> {
        match self {
            BodyKind::Raw => None,
            BodyKind::Text => Some("text/plain"),
            BodyKind::Json => Some("application/json"),
            BodyKind::Html => Some("text/html"),
        }
    }
}

/// Mutable HTTP response
#[derive(Debug, Clone)]
pub struct Response {
    status: StatusCode,
    headers: HeaderMap,
    body: Bytes,
    kind: BodyKind,
    content_type: Option<String>,
}

impl Response {
    /// Create a response with status 200 and an empty body
    pub fn new() -> Self {
        Self {
            status: StatusCode::OK,
            headers: HeaderMap::new(),
            body: Bytes::new(),
            kind: BodyKind::Raw,
            content_type: None,
        }
    }

    /// Get the status code
    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// Set the status code
    pub fn set_status(&mut self, status: StatusCode) {
        self.status = status;
    }

    /// Get the headers
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Get mutable headers
    pub fn headers_mut(&mut self) -> &mut HeaderMap {
        &mut self.headers
    }

    /// Get the raw body bytes
    pub fn body(&self) -> &Bytes {
        &self.body
    }

    /// Get the body as text (lossy UTF-8)
    pub fn text(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.body)
    }

    /// Set raw body bytes
    pub fn set_body(&mut self, body: impl Into<Bytes>) {
        self.body = body.into();
        self.kind = BodyKind::Raw;
    }

    /// Set a textual body (`text/plain` unless overridden)
    pub fn set_text(&mut self, text: impl Into<String>) {
        self.body = Bytes::from(text.into());
        self.kind = BodyKind::Text;
    }

    /// Serialize `value` as the JSON body (`application/json` unless overridden)
    pub fn set_json<T: Serialize + ?Sized>(&mut self, value: &T) -> Result<()> {
        self.body = Bytes::from(serde_json::to_vec(value)?);
        self.kind = BodyKind::Json;
        Ok(())
    }

    /// Set a pre-rendered markup body (`text/html` unless overridden)
    pub fn set_html(&mut self, html: impl Into<String>) {
        self.body = Bytes::from(html.into());
        self.kind = BodyKind::Html;
    }

    /// Override the content type
    pub fn set_content_type(&mut self, content_type: impl Into<String>) {
        self.content_type = Some(content_type.into());
    }

    /// The content type this response will be sent with, if any
    pub fn content_type(&self) -> Option<&str> {
        self.content_type
            .as_deref()
            .or_else(|| self.kind.default_content_type())
    }

    /// Convert into an `http::Response` for the transport
    pub fn into_http(self) -> HttpResponse {
        let content_type = self
            .content_type
            .as_deref()
            .or_else(|| self.kind.default_content_type())
            .map(HeaderValue::from_str);

        let mut headers = self.headers;
        match content_type {
            Some(Ok(value)) => {
                headers.insert(header::CONTENT_TYPE, value);
            }
            Some(Err(_)) => {
                tracing::warn!(
                    content_type = ?self.content_type,
                    "Dropping invalid content-type override"
                );
            }
            None => {}
        }

        let mut response = http::Response::new(Full::new(self.body));
        *response.status_mut() = self.status;
        *response.headers_mut() = headers;
        response
    }
}

impl Default for Response {
    fn default() -> Self {
        Self::new()
    }
}

impl From<Response> for HttpResponse {
    fn from(response: Response) -> Self {
        response.into_http()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::BodyExt;

    #[test]
    fn test_defaults() {
        let res = Response::new();
        assert_eq!(res.status(), StatusCode::OK);
        assert!(res.body().is_empty());
        assert_eq!(res.content_type(), None);
    }

    #[test]
    fn test_body_setters_pick_content_type() {
        let mut res = Response::new();

        res.set_text("hi");
        assert_eq!(res.content_type(), Some("text/plain"));
        assert_eq!(res.text(), "hi");

        res.set_json(&serde_json::json!({ "name": "Ada" })).unwrap();
        assert_eq!(res.content_type(), Some("application/json"));
        assert_eq!(res.text(), r#"{"name":"Ada"}"#);

        res.set_html("<h1>hi</h1>");
        assert_eq!(res.content_type(), Some("text/html"));

        res.set_body(vec![0u8, 1, 2]);
        assert_eq!(res.content_type(), None);
        assert_eq!(res.body().as_ref(), &[0u8, 1, 2]);
    }

    #[test]
    fn test_override_wins_regardless_of_order() {
        let mut res = Response::new();
        res.set_content_type("text/csv");
        res.set_text("a,b");
        assert_eq!(res.content_type(), Some("text/csv"));
    }

    #[tokio::test]
    async fn test_into_http() {
        let mut res = Response::new();
        res.set_status(StatusCode::CREATED);
        res.headers_mut()
            .insert("x-custom", HeaderValue::from_static("1"));
        res.set_text("made");

        let http = res.into_http();
        assert_eq!(http.status(), StatusCode::CREATED);
        assert_eq!(http.headers().get(header::CONTENT_TYPE).unwrap(), "text/plain");
        assert_eq!(http.headers().get("x-custom").unwrap(), "1");

        let body = http.into_body().collect().await.unwrap().to_bytes();
        assert_eq!(body, Bytes::from_static(b"made"));
    }

    #[test]
    fn test_invalid_override_is_dropped() {
        let mut res = Response::new();
        res.set_content_type("bad\nvalue");
        let http = res.into_http();
        assert!(http.headers().get(header::CONTENT_TYPE).is_none());
    }
}

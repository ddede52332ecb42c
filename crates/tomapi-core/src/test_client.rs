//! TestClient for integration testing without network binding
//!
//! The client sends simulated requests through [`App::handle`], so static
//! files, middleware, routing and the exception handler all behave exactly as
//! they do behind the real server.
//!
//! # Example
//!
//! ```rust,ignore
//! use tomapi_core::{App, TestClient};
//!
//! #[test]
//! fn test_home() {
//!     let app = App::new().route("/home", home).unwrap();
//!     let client = TestClient::new(app);
//!
//!     let response = client.get("http://testserver/home").unwrap();
//!     response.assert_status(200);
//!     assert_eq!(response.text(), "Hello from the HOME page");
//! }
//! ```
//!
//! A handler error that no exception handler absorbs is returned as `Err`
//! from the client call.

use crate::app::App;
use crate::error::{Error, Result};
use crate::request::Request;
use crate::response::Response;
use bytes::Bytes;
use http::{header, HeaderMap, HeaderValue, Method, StatusCode, Uri};
use serde::{de::DeserializeOwned, Serialize};

/// Test client for integration testing without network binding
pub struct TestClient {
    app: App,
}

impl TestClient {
    /// Create a new test client from an application
    pub fn new(app: App) -> Self {
        Self { app }
    }

    /// The application under test
    pub fn app(&self) -> &App {
        &self.app
    }

    pub fn get(&self, url: &str) -> Result<TestResponse> {
        self.request(TestRequest::get(url))
    }

    pub fn post(&self, url: &str) -> Result<TestResponse> {
        self.request(TestRequest::post(url))
    }

    pub fn put(&self, url: &str) -> Result<TestResponse> {
        self.request(TestRequest::put(url))
    }

    pub fn patch(&self, url: &str) -> Result<TestResponse> {
        self.request(TestRequest::patch(url))
    }

    pub fn delete(&self, url: &str) -> Result<TestResponse> {
        self.request(TestRequest::delete(url))
    }

    pub fn options(&self, url: &str) -> Result<TestResponse> {
        self.request(TestRequest::new(Method::OPTIONS, url))
    }

    /// Send a POST request with a JSON body
    pub fn post_json<T: Serialize>(&self, url: &str, body: &T) -> Result<TestResponse> {
        self.request(TestRequest::post(url).json(body))
    }

    /// Send a request with full control
    ///
    /// ```rust,ignore
    /// let response = client.request(
    ///     TestRequest::put("/book")
    ///         .header("Authorization", "Bearer token")
    ///         .body("title=Dune"),
    /// )?;
    /// ```
    pub fn request(&self, req: TestRequest) -> Result<TestResponse> {
        let request = req.into_request()?;
        let response = self.app.handle(request)?;
        Ok(TestResponse::from_response(response))
    }
}

/// Reduce an absolute URL to its path and query; relative paths pass through
///
/// Anything else, such as a bare `hey`, is rejected rather than read as a host.
fn path_and_query(url: &str) -> Result<String> {
    let uri: Uri = url
        .parse()
        .map_err(|err| Error::msg(format!("invalid test URL `{}`: {}", url, err)))?;

    if uri.scheme().is_none() && !url.starts_with('/') {
        return Err(Error::msg(format!(
            "invalid test URL `{}`: expected a path starting with `/` or an absolute URL",
            url
        )));
    }

    Ok(match uri.path_and_query() {
        Some(pq) if !pq.as_str().is_empty() => pq.as_str().to_string(),
        _ => "/".to_string(),
    })
}

/// Test request builder
#[derive(Debug, Clone)]
pub struct TestRequest {
    method: Method,
    url: String,
    headers: HeaderMap,
    body: Option<Bytes>,
}

impl TestRequest {
    /// Create a new request with the given method and URL
    ///
    /// `url` may be a path (`/home`) or an absolute URL
    /// (`http://testserver/home`); scheme and host are ignored.
    pub fn new(method: Method, url: &str) -> Self {
        Self {
            method,
            url: url.to_string(),
            headers: HeaderMap::new(),
            body: None,
        }
    }

    pub fn get(url: &str) -> Self {
        Self::new(Method::GET, url)
    }

    pub fn post(url: &str) -> Self {
        Self::new(Method::POST, url)
    }

    pub fn put(url: &str) -> Self {
        Self::new(Method::PUT, url)
    }

    pub fn patch(url: &str) -> Self {
        Self::new(Method::PATCH, url)
    }

    pub fn delete(url: &str) -> Self {
        Self::new(Method::DELETE, url)
    }

    /// Add a header; invalid names or values are ignored
    pub fn header(mut self, key: &str, value: &str) -> Self {
        if let (Ok(name), Ok(val)) = (
            key.parse::<http::header::HeaderName>(),
            HeaderValue::from_str(value),
        ) {
            self.headers.insert(name, val);
        }
        self
    }

    /// Set the request body as JSON
    ///
    /// This also sets the Content-Type header to `application/json`.
    pub fn json<T: Serialize>(mut self, body: &T) -> Self {
        if let Ok(bytes) = serde_json::to_vec(body) {
            self.body = Some(Bytes::from(bytes));
            self.headers.insert(
                header::CONTENT_TYPE,
                HeaderValue::from_static("application/json"),
            );
        }
        self
    }

    /// Set the request body as raw bytes
    pub fn body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = Some(body.into());
        self
    }

    fn into_request(self) -> Result<Request> {
        let uri: Uri = path_and_query(&self.url)?
            .parse()
            .map_err(|err| Error::msg(format!("invalid test URL `{}`: {}", self.url, err)))?;

        let mut req = http::Request::new(self.body.unwrap_or_default());
        *req.method_mut() = self.method;
        *req.uri_mut() = uri;
        *req.headers_mut() = self.headers;
        Ok(Request::from_http(req))
    }
}

/// Test response with assertion helpers
#[derive(Debug)]
pub struct TestResponse {
    status: StatusCode,
    headers: HeaderMap,
    body: Bytes,
}

impl TestResponse {
    fn from_response(response: Response) -> Self {
        let body = response.body().clone();
        let (parts, _) = response.into_http().into_parts();
        Self {
            status: parts.status,
            headers: parts.headers,
            body,
        }
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Look up a header value as a string
    pub fn header(&self, key: &str) -> Option<&str> {
        self.headers.get(key).and_then(|v| v.to_str().ok())
    }

    pub fn body(&self) -> &Bytes {
        &self.body
    }

    /// Get the response body as a string (lossy UTF-8)
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).to_string()
    }

    /// Parse the response body as JSON
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        serde_json::from_slice(&self.body)
    }

    /// Assert that the response has the expected status code
    ///
    /// # Panics
    ///
    /// Panics if the status code doesn't match.
    ///
    /// ```rust,ignore
    /// response.assert_status(200);
    /// ```
    pub fn assert_status(&self, expected: u16) -> &Self {
        assert_eq!(
            self.status.as_u16(),
            expected,
            "Expected status {}, got {}. Body: {}",
            expected,
            self.status,
            self.text()
        );
        self
    }

    /// Assert that the response has the expected header value
    ///
    /// # Panics
    ///
    /// Panics if the header doesn't exist or doesn't match.
    pub fn assert_header(&self, key: &str, expected: &str) -> &Self {
        let actual = self.header(key).unwrap_or("");
        assert_eq!(
            actual, expected,
            "Expected header '{}' to be '{}', got '{}'",
            key, expected, actual
        );
        self
    }

    /// Assert that the response body contains the expected string
    ///
    /// # Panics
    ///
    /// Panics if the body doesn't contain the expected string.
    pub fn assert_body_contains(&self, expected: &str) -> &Self {
        let body = self.text();
        assert!(
            body.contains(expected),
            "Expected body to contain '{}', got '{}'",
            expected,
            body
        );
        self
    }
}

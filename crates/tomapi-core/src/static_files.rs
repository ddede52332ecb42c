//! Static asset serving
//!
//! Requests whose path starts with the configured prefix are answered from a
//! directory on disk before routing and middleware run. The prefix is
//! stripped, the remainder sanitised against traversal, and the file served
//! with a MIME type derived from its extension.
//!
//! # Example
//!
//! ```rust,ignore
//! App::new().serve_static("/static", "./static")
//! // GET /static/css/site.css -> ./static/css/site.css
//! ```

use crate::request::Request;
use crate::response::Response;
use http::{header, HeaderValue, StatusCode};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

/// MIME type detection based on file extension
fn mime_type_for_extension(extension: &str) -> &'static str {
    match extension.to_lowercase().as_str() {
        // Text
        "html" | "htm" => "text/html; charset=utf-8",
        "css" => "text/css; charset=utf-8",
        "js" | "mjs" => "text/javascript; charset=utf-8",
        "json" => "application/json",
        "xml" => "application/xml",
        "txt" => "text/plain; charset=utf-8",
        "md" => "text/markdown; charset=utf-8",
        "csv" => "text/csv",

        // Images
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "svg" => "image/svg+xml",
        "ico" => "image/x-icon",

        // Fonts
        "woff" => "font/woff",
        "woff2" => "font/woff2",
        "ttf" => "font/ttf",

        "pdf" => "application/pdf",
        "wasm" => "application/wasm",

        _ => "application/octet-stream",
    }
}

/// Weak validator from file metadata
fn calculate_etag(modified: SystemTime, size: u64) -> String {
    let timestamp = modified
        .duration_since(SystemTime::UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0);

    format!("\"{:x}-{:x}\"", timestamp, size)
}

/// Sanitize a file path to prevent directory traversal
fn sanitize_path(path: &str) -> String {
    path.trim_start_matches('/')
        .split('/')
        .filter(|part| !part.is_empty() && *part != "." && *part != ".." && !part.contains('\\'))
        .collect::<Vec<_>>()
        .join("/")
}

/// Normalize a mount prefix to `/name` form (no trailing slash)
fn normalize_prefix(prefix: &str) -> String {
    let trimmed = prefix.trim_matches('/');
    if trimmed.is_empty() {
        "/".to_string()
    } else {
        format!("/{}", trimmed)
    }
}

fn not_found() -> Response {
    let mut res = Response::new();
    res.set_status(StatusCode::NOT_FOUND);
    res.set_text("Not Found");
    res
}

/// Static directory mounted on a URL prefix
#[derive(Debug, Clone)]
pub struct StaticFiles {
    root: PathBuf,
    prefix: String,
    index_file: Option<String>,
    max_age: u64,
    etag: bool,
}

impl StaticFiles {
    /// Serve `root` under `prefix`
    pub fn new(prefix: impl AsRef<str>, root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            prefix: normalize_prefix(prefix.as_ref()),
            index_file: None,
            max_age: 3600,
            etag: true,
        }
    }

    /// Serve `name` when a directory is requested
    pub fn index_file(mut self, name: impl Into<String>) -> Self {
        self.index_file = Some(name.into());
        self
    }

    /// Set Cache-Control max-age in seconds (0 disables the header)
    pub fn max_age(mut self, seconds: u64) -> Self {
        self.max_age = seconds;
        self
    }

    /// Enable or disable ETag headers
    pub fn etag(mut self, enabled: bool) -> Self {
        self.etag = enabled;
        self
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// The path below the prefix, if `path` falls under this mount
    ///
    /// `/static/a.css` and `/static` fall under `/static`; `/staticky` does not.
    pub fn strip_prefix<'p>(&self, path: &'p str) -> Option<&'p str> {
        if self.prefix == "/" {
            return Some(path);
        }
        let rest = path.strip_prefix(self.prefix.as_str())?;
        if rest.is_empty() || rest.starts_with('/') {
            Some(rest)
        } else {
            None
        }
    }

    /// Serve the file named by the (already prefix-stripped) request path
    pub fn serve(&self, req: &Request) -> Response {
        let relative = sanitize_path(req.path());
        let mut file_path = self.root.join(&relative);

        if file_path.is_dir() {
            match &self.index_file {
                Some(index) => file_path = file_path.join(index),
                None => return not_found(),
            }
        }

        match self.serve_file(&file_path) {
            Ok(res) => res,
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                tracing::debug!(path = %file_path.display(), "Static file not found");
                not_found()
            }
            Err(err) => {
                tracing::error!(path = %file_path.display(), error = %err, "Failed to read static file");
                let mut res = Response::new();
                res.set_status(StatusCode::INTERNAL_SERVER_ERROR);
                res.set_text("Internal Server Error");
                res
            }
        }
    }

    fn serve_file(&self, path: &Path) -> io::Result<Response> {
        let metadata = fs::metadata(path)?;
        if !metadata.is_file() {
            return Err(io::Error::new(io::ErrorKind::NotFound, "not a file"));
        }
        let content = fs::read(path)?;

        let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("");
        let mut res = Response::new();
        res.set_body(content);
        res.set_content_type(mime_type_for_extension(extension));

        if self.etag {
            if let Ok(modified) = metadata.modified() {
                if let Ok(value) = HeaderValue::from_str(&calculate_etag(modified, metadata.len())) {
                    res.headers_mut().insert(header::ETAG, value);
                }
            }
        }

        if self.max_age > 0 {
            if let Ok(value) = HeaderValue::from_str(&format!("public, max-age={}", self.max_age)) {
                res.headers_mut().insert(header::CACHE_CONTROL, value);
            }
        }

        Ok(res)
    }
}

//! Error types for tomapi
//!
//! Two families of failures live here:
//!
//! - **Configuration-time** errors ([`Error::DuplicateRoute`],
//!   [`Error::InvalidTemplate`], [`Error::Config`], [`Error::Io`]) are returned
//!   straight to the code that registered routes or started the server. They
//!   never reach the application's exception handler and
//!   [`Error::is_registration_error`] reports them.
//! - **Request-time** errors ([`Error::MethodNotAllowed`], [`Error::Handler`],
//!   [`Error::Json`]) are raised while resolving or running a handler and are
//!   funneled through the exception handler, if one is installed.
//!   [`Error::is_request_error`] reports them. Handler code wraps its own
//!   failures, I/O included, with [`Error::handler`].
//!
//! An unmatched path is *not* an error; the dispatcher answers it with a 404.

use std::fmt;

/// Boxed error produced by application handler code.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Result type alias for tomapi operations
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Errors raised by the tomapi core
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A route template was registered twice (exact string comparison).
    #[error("route `{template}` is already registered")]
    DuplicateRoute {
        /// The rejected template
        template: String,
    },

    /// A route template could not be parsed.
    #[error("invalid route template `{template}`: {reason}")]
    InvalidTemplate {
        /// The rejected template
        template: String,
        /// What is wrong with it
        reason: String,
    },

    /// The matched route does not accept the request method.
    #[error("method not allowed: {method}")]
    MethodNotAllowed {
        /// The rejected method, as sent by the client
        method: String,
    },

    /// Application handler code failed.
    #[error("handler failed: {0}")]
    Handler(#[source] BoxError),

    /// A structured body could not be serialized.
    #[error("failed to serialize JSON body: {0}")]
    Json(#[from] serde_json::Error),

    /// Environment configuration could not be loaded.
    #[error("configuration error: {0}")]
    Config(#[from] envy::Error),

    /// Transport-level I/O failure (bind, accept).
    ///
    /// Not converted implicitly: I/O failures in handler code go through
    /// [`Error::handler`] so they count as request-time errors.
    #[error("I/O error: {0}")]
    Io(#[source] std::io::Error),
}

impl Error {
    /// Wrap an arbitrary error raised by handler code
    pub fn handler<E>(err: E) -> Self
    where
        E: Into<BoxError>,
    {
        Self::Handler(err.into())
    }

    /// Create a handler failure from a plain message
    pub fn msg(message: impl fmt::Display) -> Self {
        Self::Handler(message.to_string().into())
    }

    /// Create a method-not-allowed error for the given method
    pub fn method_not_allowed(method: impl Into<String>) -> Self {
        Self::MethodNotAllowed {
            method: method.into(),
        }
    }

    /// True for errors raised while configuring routes or starting the server
    pub fn is_registration_error(&self) -> bool {
        matches!(
            self,
            Error::DuplicateRoute { .. }
                | Error::InvalidTemplate { .. }
                | Error::Config(_)
                | Error::Io(_)
        )
    }

    /// True for errors raised while serving a request
    pub fn is_request_error(&self) -> bool {
        matches!(
            self,
            Error::MethodNotAllowed { .. } | Error::Handler(_) | Error::Json(_)
        )
    }
}

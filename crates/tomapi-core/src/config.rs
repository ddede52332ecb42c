//! Application configuration
//!
//! Configuration has sane defaults and can be overridden from `TOMAPI_*`
//! environment variables:
//!
//! | Variable               | Field           | Default              |
//! |------------------------|-----------------|----------------------|
//! | `TOMAPI_TEMPLATES_DIR` | `templates_dir` | `templates`          |
//! | `TOMAPI_STATIC_DIR`    | `static_dir`    | `static`             |
//! | `TOMAPI_STATIC_PREFIX` | `static_prefix` | `/static`            |
//! | `TOMAPI_LOG_FILTER`    | `log_filter`    | `info,tomapi=debug`  |
//!
//! The runtime profile is read separately from `TOMAPI_ENV`, see
//! [`Environment`].

use crate::error::Result;
use serde::Deserialize;
use std::path::PathBuf;

/// Settings consumed by [`App`](crate::App)
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Directory holding the application's templates
    pub templates_dir: PathBuf,
    /// Directory served by the static asset server
    pub static_dir: PathBuf,
    /// Path prefix that routes requests to the static asset server
    pub static_prefix: String,
    /// Default `tracing` filter used when `RUST_LOG` is not set
    pub log_filter: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            templates_dir: PathBuf::from("templates"),
            static_dir: PathBuf::from("static"),
            static_prefix: "/static".to_string(),
            log_filter: "info,tomapi=debug".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from `TOMAPI_*` environment variables
    ///
    /// Unset variables keep their default value.
    pub fn from_env() -> Result<Self> {
        Ok(envy::prefixed("TOMAPI_").from_env::<Config>()?)
    }

    /// Load configuration from an explicit set of variables
    ///
    /// Keys are expected without the `TOMAPI_` prefix, upper-cased.
    pub fn from_vars<I>(vars: I) -> Result<Self>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        Ok(envy::from_iter::<_, Config>(vars)?)
    }

    /// Set the templates directory
    pub fn templates_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.templates_dir = dir.into();
        self
    }

    /// Set the static files directory
    pub fn static_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.static_dir = dir.into();
        self
    }

    /// Set the static URL prefix
    pub fn static_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.static_prefix = prefix.into();
        self
    }

    /// Set the default log filter
    pub fn log_filter(mut self, filter: impl Into<String>) -> Self {
        self.log_filter = filter.into();
        self
    }
}

/// Runtime profile, detected from `TOMAPI_ENV`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Environment {
    /// Verbose errors and debug logging
    Development,
    /// Error details are masked in generated responses
    Production,
    /// Any other profile name
    Custom(String),
}

impl Environment {
    /// Detect the current environment from `TOMAPI_ENV`.
    ///
    /// - `production` / `prod` → `Production`
    /// - `development` / `dev` / unset → `Development`
    /// - anything else → `Custom(name)`
    pub fn current() -> Self {
        Self::from_name(std::env::var("TOMAPI_ENV").ok().as_deref())
    }

    fn from_name(name: Option<&str>) -> Self {
        match name {
            Some("production") | Some("prod") => Self::Production,
            Some("development") | Some("dev") | None => Self::Development,
            Some(other) => Self::Custom(other.to_string()),
        }
    }

    /// Check if running in production mode.
    pub fn is_production(&self) -> bool {
        matches!(self, Self::Production)
    }

    /// Get the environment name as a string.
    pub fn as_str(&self) -> &str {
        match self {
            Self::Development => "development",
            Self::Production => "production",
            Self::Custom(name) => name,
        }
    }

    /// Whether error details may be exposed in responses.
    pub fn show_error_details(&self) -> bool {
        !self.is_production()
    }
}

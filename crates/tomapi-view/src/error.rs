//! Error types for template rendering

use thiserror::Error;

/// Errors raised while loading or rendering templates
#[derive(Debug, Error)]
pub enum ViewError {
    /// The named template is not loaded
    #[error("template not found: {0}")]
    NotFound(String),

    /// Tera failed to parse or render a template
    #[error("template error: {0}")]
    Template(#[source] tera::Error),

    /// The context value could not be turned into a Tera context
    #[error("failed to build template context: {0}")]
    Serialization(String),
}

impl ViewError {
    /// Create a context serialization error
    pub fn serialization_error(message: impl Into<String>) -> Self {
        Self::Serialization(message.into())
    }
}

impl From<tera::Error> for ViewError {
    fn from(err: tera::Error) -> Self {
        match &err.kind {
            tera::ErrorKind::TemplateNotFound(name) => Self::NotFound(name.clone()),
            _ => Self::Template(err),
        }
    }
}

impl From<ViewError> for tomapi_core::Error {
    fn from(err: ViewError) -> Self {
        tomapi_core::Error::handler(err)
    }
}

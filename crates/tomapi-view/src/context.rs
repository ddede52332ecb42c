//! Context builder for templates

use crate::ViewError;
use serde::Serialize;
use tera::Context;
use tomapi_core::PathParams;

/// Builder for constructing template context
///
/// A fluent alternative to declaring a `Serialize` struct for small pages.
///
/// # Example
///
/// ```rust,ignore
/// use tomapi_view::ContextBuilder;
///
/// let context = ContextBuilder::new()
///     .params(params)
///     .insert("title", "Books")
///     .insert_some("user", user.as_deref())
///     .build();
/// ```
#[derive(Debug, Clone, Default)]
pub struct ContextBuilder {
    context: Context,
}

impl ContextBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a value into the context
    pub fn insert<T: Serialize + ?Sized>(mut self, key: impl Into<String>, value: &T) -> Self {
        self.context.insert(key.into(), value);
        self
    }

    /// Insert a value if a condition is met
    pub fn insert_if<T: Serialize + ?Sized, F>(
        self,
        key: impl Into<String>,
        value: &T,
        condition: F,
    ) -> Self
    where
        F: FnOnce(&T) -> bool,
    {
        if condition(value) {
            self.insert(key, value)
        } else {
            self
        }
    }

    /// Insert a value if it's Some
    pub fn insert_some<T: Serialize + ?Sized>(
        self,
        key: impl Into<String>,
        value: Option<&T>,
    ) -> Self {
        match value {
            Some(v) => self.insert(key, v),
            None => self,
        }
    }

    /// Insert every bound path parameter under its placeholder name
    pub fn params(mut self, params: &PathParams) -> Self {
        for (name, value) in params.iter() {
            self.context.insert(name, value);
        }
        self
    }

    /// Extend with the fields of a serializable struct
    pub fn extend<T: Serialize>(mut self, value: &T) -> Result<Self, ViewError> {
        let additional = Context::from_serialize(value)
            .map_err(|e| ViewError::serialization_error(e.to_string()))?;
        self.context.extend(additional);
        Ok(self)
    }

    pub fn build(self) -> Context {
        self.context
    }
}

impl From<ContextBuilder> for Context {
    fn from(builder: ContextBuilder) -> Self {
        builder.build()
    }
}

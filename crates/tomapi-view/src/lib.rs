//! # tomapi-view
//!
//! Template rendering support for tomapi using Tera templates.
//!
//! Rendering happens only inside handler code; routing never touches it.
//! Failures surface as [`ViewError`], which converts into
//! `tomapi_core::Error::Handler` so a `?` inside a handler sends template
//! errors through the application's exception handler.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use tomapi::prelude::*;
//! use tomapi_view::{ContextBuilder, Templates};
//!
//! let templates = Templates::from_dir("templates")?;
//!
//! let app = App::new().route("/", move |_req, res, _params| {
//!     let ctx = ContextBuilder::new().insert("name", "Ada").build();
//!     templates.render_into(res, "index.html", &ctx)?;
//!     Ok(())
//! })?;
//! ```

#![warn(rustdoc::missing_crate_level_docs)]

mod context;
mod error;
mod templates;

pub use context::ContextBuilder;
pub use error::ViewError;
pub use templates::{Templates, TemplatesConfig};

// Re-export tera types that users might need
pub use tera::Context;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::{Context, ContextBuilder, Templates, TemplatesConfig, ViewError};
}

//! # tomapi
//!
//! A small web framework built around three pieces: a route table of path
//! templates, handlers that are either plain functions or per-request
//! resource objects, and an ordered middleware chain wrapped around dispatch.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use tomapi::prelude::*;
//!
//! fn home(_req: &Request, res: &mut Response, _params: &PathParams) -> Result<()> {
//!     res.set_text("Hello from the HOME page");
//!     Ok(())
//! }
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     App::new()
//!         .route("/home", home)?
//!         .route("/hello/{name}", |_, res, params| {
//!             res.set_text(format!("Hello, {}", params.get("name").unwrap_or_default()));
//!             Ok(())
//!         })?
//!         .run("127.0.0.1:8080")
//!         .await
//! }
//! ```
//!
//! ## Optional Features
//!
//! - `view` - Tera templates via [`view::Templates`]
//! - `test-utils` (default) - the in-process [`TestClient`]
//! - `full` - everything
//!
//! ```toml
//! [dependencies]
//! tomapi = { version = "0.1", features = ["view"] }
//! ```

// Re-export core functionality
pub use tomapi_core::*;

// Re-exports for user convenience
pub use serde;
pub use serde_json;
pub use tokio;
pub use tracing;

/// Template rendering (requires the `view` feature)
#[cfg(feature = "view")]
pub mod view {
    pub use tomapi_view::*;
}

/// Prelude module - import everything you need with `use tomapi::prelude::*`
pub mod prelude {
    pub use tomapi_core::{
        // App builder
        App,
        Config,
        Environment,
        // Error handling
        Error,
        // Handlers
        HandlerKind,
        Method,
        // Middleware
        Middleware,
        Next,
        PathParams,
        Request,
        RequestId,
        RequestIdLayer,
        Resource,
        Response,
        Result,
        StaticFiles,
        StatusCode,
        TracingLayer,
    };

    #[cfg(feature = "test-utils")]
    pub use tomapi_core::{TestClient, TestRequest, TestResponse};

    #[cfg(feature = "view")]
    pub use tomapi_view::{Context, ContextBuilder, Templates, ViewError};

    // Re-export commonly used external types
    pub use serde::{Deserialize, Serialize};
    pub use tracing::{debug, error, info, trace, warn};
}

#[cfg(test)]
mod tests {
    use super::prelude::*;

    #[test]
    fn prelude_imports_work() {
        let _: fn() -> Result<()> = || Ok(());
        let _ = App::new();
    }

    #[test]
    fn reexported_crates_are_usable() {
        #[derive(Serialize)]
        struct Book {
            title: &'static str,
        }

        let value = crate::serde_json::to_value(Book { title: "Dune" }).unwrap();
        assert_eq!(value, crate::serde_json::json!({ "title": "Dune" }));

        let runtime = crate::tokio::runtime::Builder::new_current_thread()
            .build()
            .unwrap();
        assert_eq!(runtime.block_on(async { 1 + 1 }), 2);
    }
}

//! Route registry
//!
//! Routes are kept in registration order and resolved by a linear scan: the
//! **first** registered template that matches a path wins, even when a later
//! template would be a more specific match.
//!
//! ```rust,ignore
//! let mut router = Router::new();
//! router.register("/a/{x}", HandlerKind::function(catch_all))?;
//! router.register("/a/b", HandlerKind::function(never_reached))?;
//!
//! let (route, params) = router.resolve("/a/b").unwrap();
//! assert_eq!(route.template(), "/a/{x}");
//! assert_eq!(params.get("x"), Some("b"));
//! ```
//!
//! Registering the same template string twice is rejected with
//! [`Error::DuplicateRoute`](crate::Error::DuplicateRoute); the first
//! registration stays active.

pub mod template;

use crate::error::{Error, Result};
use crate::handler::{HandlerKind, Invokable};
use crate::path_params::PathParams;
use http::Method;
use template::RouteTemplate;

/// A registered route: a parsed template and its handler
#[derive(Debug, Clone)]
pub struct Route {
    template: RouteTemplate,
    handler: HandlerKind,
}

impl Route {
    /// The template as registered
    pub fn template(&self) -> &str {
        self.template.as_str()
    }

    /// The handler serving this route
    pub fn handler(&self) -> &HandlerKind {
        &self.handler
    }

    /// Resolve the handler for `method`, see [`HandlerKind::resolve_for_method`]
    pub fn resolve_for_method(&self, method: &Method) -> Result<Invokable<'_>> {
        self.handler.resolve_for_method(method)
    }
}

/// Ordered route table
#[derive(Debug, Clone, Default)]
pub struct Router {
    routes: Vec<Route>,
}

impl Router {
    /// Create an empty router
    pub fn new() -> Self {
        Self { routes: Vec::new() }
    }

    /// Register `handler` under `template`
    ///
    /// Duplicate detection compares template strings exactly; `/a/{x}` and
    /// `/a/{y}` are distinct registrations.
    pub fn register(&mut self, template: &str, handler: HandlerKind) -> Result<()> {
        if self.contains(template) {
            return Err(Error::DuplicateRoute {
                template: template.to_string(),
            });
        }

        let template = RouteTemplate::parse(template)?;
        tracing::debug!(
            template = %template,
            methods = ?handler.allowed_methods(),
            "Registered route"
        );
        self.routes.push(Route { template, handler });
        Ok(())
    }

    /// Find the first route matching `path`, with its bound parameters
    pub fn resolve(&self, path: &str) -> Option<(&Route, PathParams)> {
        self.routes
            .iter()
            .find_map(|route| route.template.matches(path).map(|params| (route, params)))
    }

    /// Whether `template` is already registered (exact string comparison)
    pub fn contains(&self, template: &str) -> bool {
        self.routes.iter().any(|r| r.template.as_str() == template)
    }

    /// Registered templates in registration order
    pub fn templates(&self) -> impl Iterator<Item = &str> {
        self.routes.iter().map(|r| r.template.as_str())
    }

    /// Registered routes in registration order
    pub fn routes(&self) -> &[Route] {
        &self.routes
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}

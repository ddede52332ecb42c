//! Handler trait and handler resolution
//!
//! A route is served either by a plain function or by a resource. Both are
//! stored as a [`HandlerKind`] and turned into a single [`Invokable`] by
//! [`HandlerKind::resolve_for_method`], so the dispatcher never needs to know
//! which shape it is calling.
//!
//! ```rust,ignore
//! // Function handler, default methods
//! HandlerKind::function(home);
//!
//! // Function handler, POST only
//! HandlerKind::function_with_methods(create, ["post"]);
//!
//! // Resource: a fresh `Books` per request, GET and POST supported
//! HandlerKind::resource(Resource::new(Books::default).get(Books::get).post(Books::post));
//! ```

use crate::error::{Error, Result};
use crate::path_params::PathParams;
use crate::request::Request;
use crate::response::Response;
use http::Method;
use std::fmt;
use std::sync::Arc;

/// Methods a function handler accepts when none are given
pub const DEFAULT_METHODS: [&str; 6] = ["get", "post", "put", "patch", "delete", "options"];

/// Trait representing a synchronous request handler
///
/// Implemented for every `Fn(&Request, &mut Response, &PathParams) -> Result<()>`.
pub trait Handler: Send + Sync + 'static {
    /// Handle the request by mutating `res` in place
    fn call(&self, req: &Request, res: &mut Response, params: &PathParams) -> Result<()>;
}

impl<F> Handler for F
where
    F: Fn(&Request, &mut Response, &PathParams) -> Result<()> + Send + Sync + 'static,
{
    fn call(&self, req: &Request, res: &mut Response, params: &PathParams) -> Result<()> {
        self(req, res, params)
    }
}

/// Type-erased handler stored in a route
pub type BoxedHandler = Arc<dyn Handler>;

/// A resolved handler, ready to run once
pub type Invokable<'a> = Box<dyn FnOnce(&Request, &mut Response, &PathParams) -> Result<()> + 'a>;

/// Method-to-member resolution for resource handlers
///
/// [`Resource`] is the implementation most code wants; implement this trait
/// directly only for resources that decide method support dynamically.
pub trait ResourceHandler: Send + Sync + 'static {
    /// Instantiate the resource and select the member serving `method`
    fn resolve(&self, method: &Method) -> Result<Invokable<'static>>;

    /// Lowercased names of the methods this resource exposes
    fn methods(&self) -> Vec<String>;
}

type Member<R> = Arc<dyn Fn(&R, &Request, &mut Response, &PathParams) -> Result<()> + Send + Sync>;

/// Resource handler built from a factory and per-method members
///
/// The factory runs once per request, before the member lookup. A method with
/// no registered member is rejected with [`Error::MethodNotAllowed`].
pub struct Resource<R> {
    factory: Arc<dyn Fn() -> R + Send + Sync>,
    members: Vec<(String, Member<R>)>,
}

impl<R: 'static> Resource<R> {
    /// Create a resource with no members
    pub fn new<F>(factory: F) -> Self
    where
        F: Fn() -> R + Send + Sync + 'static,
    {
        Self {
            factory: Arc::new(factory),
            members: Vec::new(),
        }
    }

    /// Register the member serving `method` (case-insensitive)
    ///
    /// Registering a method twice replaces the earlier member.
    pub fn member<F>(mut self, method: &str, member: F) -> Self
    where
        F: Fn(&R, &Request, &mut Response, &PathParams) -> Result<()> + Send + Sync + 'static,
    {
        let method = method.to_ascii_lowercase();
        let member: Member<R> = Arc::new(member);
        match self.members.iter_mut().find(|(m, _)| *m == method) {
            Some((_, existing)) => *existing = member,
            None => self.members.push((method, member)),
        }
        self
    }

    pub fn get<F>(self, member: F) -> Self
    where
        F: Fn(&R, &Request, &mut Response, &PathParams) -> Result<()> + Send + Sync + 'static,
    {
        self.member("get", member)
    }

    pub fn post<F>(self, member: F) -> Self
    where
        F: Fn(&R, &Request, &mut Response, &PathParams) -> Result<()> + Send + Sync + 'static,
    {
        self.member("post", member)
    }

    pub fn put<F>(self, member: F) -> Self
    where
        F: Fn(&R, &Request, &mut Response, &PathParams) -> Result<()> + Send + Sync + 'static,
    {
        self.member("put", member)
    }

    pub fn patch<F>(self, member: F) -> Self
    where
        F: Fn(&R, &Request, &mut Response, &PathParams) -> Result<()> + Send + Sync + 'static,
    {
        self.member("patch", member)
    }

    pub fn delete<F>(self, member: F) -> Self
    where
        F: Fn(&R, &Request, &mut Response, &PathParams) -> Result<()> + Send + Sync + 'static,
    {
        self.member("delete", member)
    }

    pub fn options<F>(self, member: F) -> Self
    where
        F: Fn(&R, &Request, &mut Response, &PathParams) -> Result<()> + Send + Sync + 'static,
    {
        self.member("options", member)
    }
}

impl<R: 'static> ResourceHandler for Resource<R> {
    fn resolve(&self, method: &Method) -> Result<Invokable<'static>> {
        let instance = (self.factory)();
        let wanted = method.as_str().to_ascii_lowercase();
        let member = self
            .members
            .iter()
            .find(|(m, _)| *m == wanted)
            .map(|(_, member)| Arc::clone(member))
            .ok_or_else(|| Error::method_not_allowed(method.as_str()))?;

        Ok(Box::new(
            move |req: &Request, res: &mut Response, params: &PathParams| {
                member(&instance, req, res, params)
            },
        ))
    }

    fn methods(&self) -> Vec<String> {
        self.members.iter().map(|(m, _)| m.clone()).collect()
    }
}

/// Handler shape stored in a route
#[derive(Clone)]
pub enum HandlerKind {
    /// A plain function, gated by its allowed methods
    Function {
        handler: BoxedHandler,
        /// Lowercased method names
        methods: Vec<String>,
    },
    /// A resource; method support comes from its members
    Resource(Arc<dyn ResourceHandler>),
}

impl HandlerKind {
    /// Function handler accepting [`DEFAULT_METHODS`]
    pub fn function<F>(handler: F) -> Self
    where
        F: Fn(&Request, &mut Response, &PathParams) -> Result<()> + Send + Sync + 'static,
    {
        Self::function_with_methods(handler, DEFAULT_METHODS)
    }

    /// Function handler accepting only `methods` (case-insensitive)
    pub fn function_with_methods<F, I, S>(handler: F, methods: I) -> Self
    where
        F: Fn(&Request, &mut Response, &PathParams) -> Result<()> + Send + Sync + 'static,
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self::from_handler(Arc::new(handler), methods)
    }

    /// Function handler from an already boxed [`Handler`]
    pub fn from_handler<I, S>(handler: BoxedHandler, methods: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self::Function {
            handler,
            methods: methods
                .into_iter()
                .map(|m| m.as_ref().to_ascii_lowercase())
                .collect(),
        }
    }

    /// Resource handler
    pub fn resource<R: ResourceHandler>(resource: R) -> Self {
        Self::Resource(Arc::new(resource))
    }

    /// Lowercased names of the methods this handler can serve
    pub fn allowed_methods(&self) -> Vec<String> {
        match self {
            Self::Function { methods, .. } => methods.clone(),
            Self::Resource(resource) => resource.methods(),
        }
    }

    /// Produce the invokable unit serving `method`
    ///
    /// Fails with [`Error::MethodNotAllowed`] when a function handler does not
    /// list `method`, or a resource has no member for it.
    pub fn resolve_for_method(&self, method: &Method) -> Result<Invokable<'_>> {
        match self {
            Self::Function { handler, methods } => {
                let allowed = methods
                    .iter()
                    .any(|m| m.eq_ignore_ascii_case(method.as_str()));
                if !allowed {
                    return Err(Error::method_not_allowed(method.as_str()));
                }
                Ok(Box::new(
                    move |req: &Request, res: &mut Response, params: &PathParams| {
                        handler.call(req, res, params)
                    },
                ))
            }
            Self::Resource(resource) => resource.resolve(method),
        }
    }
}

impl fmt::Debug for HandlerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Function { methods, .. } => f
                .debug_struct("Function")
                .field("methods", methods)
                .finish_non_exhaustive(),
            Self::Resource(resource) => f
                .debug_struct("Resource")
                .field("methods", &resource.methods())
                .finish_non_exhaustive(),
        }
    }
}

impl<R: 'static> From<Resource<R>> for HandlerKind {
    fn from(resource: Resource<R>) -> Self {
        Self::resource(resource)
    }
}

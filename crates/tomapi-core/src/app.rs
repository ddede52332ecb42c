//! tomapi application builder

use crate::config::{Config, Environment};
use crate::dispatcher::Dispatcher;
use crate::error::{Error, Result};
use crate::handler::{HandlerKind, ResourceHandler};
use crate::middleware::{Middleware, MiddlewareChain};
use crate::path_params::PathParams;
use crate::request::Request;
use crate::response::Response;
use crate::router::Router;
use crate::server::Server;
use crate::static_files::StaticFiles;
use std::path::PathBuf;
use tokio::net::{TcpListener, ToSocketAddrs};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Main application type for tomapi
///
/// An `App` owns the route table, the exception handler, the middleware chain
/// and the static file mount. It is configured through `&mut self` or the
/// consuming builder methods, then handed to a transport ([`App::run`] or
/// [`TestClient`](crate::TestClient)) which only ever needs `&self`.
///
/// # Example
///
/// ```rust,ignore
/// use tomapi::prelude::*;
///
/// fn home(_req: &Request, res: &mut Response, _params: &PathParams) -> Result<()> {
///     res.set_text("Hello from the HOME page");
///     Ok(())
/// }
///
/// #[tokio::main]
/// async fn main() -> Result<()> {
///     App::new()
///         .route("/home", home)?
///         .route("/hello/{name}", |_, res, params| {
///             res.set_text(format!("Hello, {}", params.get("name").unwrap_or_default()));
///             Ok(())
///         })?
///         .run("127.0.0.1:8080")
///         .await
/// }
/// ```
pub struct App {
    dispatcher: Dispatcher,
    middleware: MiddlewareChain,
    static_files: Option<StaticFiles>,
    config: Config,
    environment: Environment,
}

impl App {
    /// Create an application with the default [`Config`]
    pub fn new() -> Self {
        Self::with_config(Config::default())
    }

    /// Create an application configured from `TOMAPI_*` environment variables
    pub fn from_env() -> Result<Self> {
        Ok(Self::with_config(Config::from_env()?))
    }

    /// Create an application with an explicit configuration
    ///
    /// Installs a global tracing subscriber unless one is already set. The
    /// static mount is taken from `static_prefix`/`static_dir`; a prefix of
    /// `""` or `/` would shadow every route, so it disables the mount instead.
    pub fn with_config(config: Config) -> Self {
        let _ = tracing_subscriber::registry()
            .with(
                EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| EnvFilter::new(&config.log_filter)),
            )
            .with(tracing_subscriber::fmt::layer())
            .try_init();

        let mut static_files = Some(StaticFiles::new(&config.static_prefix, config.static_dir.clone()));
        if static_files.as_ref().is_some_and(|files| files.prefix() == "/") {
            tracing::warn!(
                static_prefix = %config.static_prefix,
                "Static prefix covers every path; static serving disabled"
            );
            static_files = None;
        }

        Self {
            dispatcher: Dispatcher::default(),
            middleware: MiddlewareChain::new(),
            static_files,
            config,
            environment: Environment::current(),
        }
    }

    pub fn environment(&self) -> &Environment {
        &self.environment
    }

    /// Override the environment detected from `TOMAPI_ENV`
    pub fn with_environment(mut self, environment: Environment) -> Self {
        self.environment = environment;
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Directory holding this application's templates
    pub fn templates_dir(&self) -> &PathBuf {
        &self.config.templates_dir
    }

    pub fn router(&self) -> &Router {
        self.dispatcher.router()
    }

    pub fn middleware(&self) -> &MiddlewareChain {
        &self.middleware
    }

    pub fn static_files(&self) -> Option<&StaticFiles> {
        self.static_files.as_ref()
    }

    /// Register a route (imperative form)
    ///
    /// Fails with [`Error::DuplicateRoute`] if `template` is already
    /// registered, or [`Error::InvalidTemplate`] if it cannot be parsed.
    pub fn add_route(&mut self, template: &str, handler: impl Into<HandlerKind>) -> Result<()> {
        self.dispatcher.router_mut().register(template, handler.into())
    }

    /// Register a function handler accepting the default methods
    pub fn route<F>(mut self, template: &str, handler: F) -> Result<Self>
    where
        F: Fn(&Request, &mut Response, &PathParams) -> Result<()> + Send + Sync + 'static,
    {
        self.add_route(template, HandlerKind::function(handler))?;
        Ok(self)
    }

    /// Register a function handler accepting only `methods`
    ///
    /// ```rust,ignore
    /// app.route_with_methods("/create", ["post"], create)?
    /// ```
    pub fn route_with_methods<F, I, S>(mut self, template: &str, methods: I, handler: F) -> Result<Self>
    where
        F: Fn(&Request, &mut Response, &PathParams) -> Result<()> + Send + Sync + 'static,
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.add_route(template, HandlerKind::function_with_methods(handler, methods))?;
        Ok(self)
    }

    /// Register a resource handler
    ///
    /// ```rust,ignore
    /// app.resource("/book", Resource::new(Books::default).get(Books::get).post(Books::post))?
    /// ```
    pub fn resource<R: ResourceHandler>(mut self, template: &str, resource: R) -> Result<Self> {
        self.add_route(template, HandlerKind::resource(resource))?;
        Ok(self)
    }

    /// Add a middleware layer; it becomes the outermost layer
    pub fn add_middleware<M: Middleware>(&mut self, middleware: M) {
        self.middleware.add(middleware);
    }

    /// Builder form of [`add_middleware`](Self::add_middleware)
    pub fn layer<M: Middleware>(mut self, middleware: M) -> Self {
        self.add_middleware(middleware);
        self
    }

    /// Install the exception handler; a later call replaces an earlier one
    pub fn add_exception_handler<F>(&mut self, handler: F)
    where
        F: Fn(&Request, &mut Response, &Error) + Send + Sync + 'static,
    {
        self.dispatcher.set_exception_handler(handler);
    }

    /// Builder form of [`add_exception_handler`](Self::add_exception_handler)
    pub fn exception_handler<F>(mut self, handler: F) -> Self
    where
        F: Fn(&Request, &mut Response, &Error) + Send + Sync + 'static,
    {
        self.add_exception_handler(handler);
        self
    }

    /// Serve `root` under `prefix`, replacing the mount from the config
    pub fn serve_static(mut self, prefix: &str, root: impl Into<PathBuf>) -> Self {
        self.static_files = Some(StaticFiles::new(prefix, root));
        self
    }

    /// Mount a preconfigured [`StaticFiles`]
    pub fn serve_static_with(mut self, files: StaticFiles) -> Self {
        self.static_files = Some(files);
        self
    }

    /// Disable static file serving
    pub fn without_static(mut self) -> Self {
        self.static_files = None;
        self
    }

    /// Handle one request
    ///
    /// Requests under the static prefix are served from disk without running
    /// middleware or routing. Everything else goes through the middleware
    /// chain into the dispatcher. Errors not absorbed by the exception handler
    /// are returned.
    pub fn handle(&self, mut req: Request) -> Result<Response> {
        if let Some(files) = &self.static_files {
            if let Some(rest) = files.strip_prefix(req.path()) {
                let rest = if rest.is_empty() { "/" } else { rest }.to_string();
                tracing::trace!(path = %req.path(), file = %rest, "Serving static file");
                req.set_path(&rest);
                return Ok(files.serve(&req));
            }
        }

        self.middleware.call(&mut req, &self.dispatcher)
    }

    /// Run the server on `addr`
    ///
    /// ```rust,ignore
    /// App::new()
    ///     .route("/", home)?
    ///     .run("127.0.0.1:8080")
    ///     .await
    /// ```
    pub async fn run(self, addr: impl ToSocketAddrs) -> Result<()> {
        Server::new(self).run(addr).await
    }

    /// Serve connections from an already bound listener
    pub async fn serve(self, listener: TcpListener) -> Result<()> {
        Server::new(self).serve(listener).await
    }
}

impl Default for App {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for App {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("App")
            .field("dispatcher", &self.dispatcher)
            .field("middleware", &self.middleware)
            .field("static_files", &self.static_files)
            .field("environment", &self.environment)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handler::Resource;
    use bytes::Bytes;
    use http::{Method, StatusCode};

    fn request(method: Method, path: &str) -> Request {
        Request::from_http(
            http::Request::builder()
                .method(method)
                .uri(path)
                .body(Bytes::new())
                .unwrap(),
        )
    }

    fn home(_req: &Request, res: &mut Response, _params: &PathParams) -> Result<()> {
        res.set_text("Hello from the HOME page");
        Ok(())
    }

    #[test]
    fn test_builder_and_imperative_registration_share_duplicate_rules() {
        let mut app = App::new().route("/home", home).unwrap();

        let err = app.add_route("/home", HandlerKind::function(home)).unwrap_err();
        assert!(matches!(err, Error::DuplicateRoute { .. }));

        let err = App::new()
            .route("/home", home)
            .and_then(|app| app.route("/home", home))
            .unwrap_err();
        assert!(matches!(err, Error::DuplicateRoute { .. }));
        assert_eq!(app.router().len(), 1);
    }

    #[test]
    fn test_add_route_accepts_resources() {
        struct Ping;
        let mut app = App::new();
        app.add_route(
            "/ping",
            Resource::new(|| Ping).get(|_: &Ping, _: &Request, res: &mut Response, _: &PathParams| {
                res.set_text("pong");
                Ok(())
            }),
        )
        .unwrap();

        let res = app.handle(request(Method::GET, "/ping")).unwrap();
        assert_eq!(res.text(), "pong");
    }

    #[test]
    fn test_handle_routes_through_dispatcher() {
        let app = App::new()
            .route("/home", home)
            .unwrap()
            .route_with_methods("/only-post", ["post"], home)
            .unwrap();

        assert_eq!(app.handle(request(Method::GET, "/home")).unwrap().text(), "Hello from the HOME page");
        assert_eq!(app.handle(request(Method::GET, "/missing")).unwrap().status(), StatusCode::NOT_FOUND);
        assert!(app.handle(request(Method::GET, "/only-post")).is_err());
    }

    #[test]
    fn test_static_prefix_bypasses_routes() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("main.css"), "body {}").unwrap();

        let app = App::new()
            .serve_static("/static", dir.path())
            .route("/static/main.css", home)
            .unwrap();

        let res = app.handle(request(Method::GET, "/static/main.css")).unwrap();
        assert_eq!(res.text(), "body {}");

        let res = app.handle(request(Method::GET, "/static/missing.css")).unwrap();
        assert_eq!(res.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_without_static_routes_everything() {
        let app = App::new()
            .without_static()
            .route("/static/main.css", home)
            .unwrap();
        assert!(app.static_files().is_none());

        let res = app.handle(request(Method::GET, "/static/main.css")).unwrap();
        assert_eq!(res.text(), "Hello from the HOME page");
    }

    #[test]
    fn test_config_drives_static_mount() {
        let app = App::with_config(Config::default().static_prefix("/assets").static_dir("public"));
        let files = app.static_files().unwrap();
        assert_eq!(files.prefix(), "/assets");
        assert_eq!(files.root(), std::path::Path::new("public"));
        assert_eq!(app.templates_dir(), &PathBuf::from("templates"));
    }

    #[test]
    fn test_root_static_prefix_from_config_keeps_routes_reachable() {
        for prefix in ["", "/", "//"] {
            let app = App::with_config(Config::default().static_prefix(prefix))
                .route("/home", home)
                .unwrap();
            assert!(app.static_files().is_none(), "prefix {prefix:?}");

            let res = app.handle(request(Method::GET, "/home")).unwrap();
            assert_eq!(res.text(), "Hello from the HOME page");
        }
    }
}

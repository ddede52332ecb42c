//! Request dispatch and the exception funnel
//!
//! The dispatcher sits at the bottom of the middleware chain. For every
//! request it builds a fresh [`Response`], finds the first matching route,
//! resolves the handler for the request method and lets it fill in the
//! response.
//!
//! Errors raised while resolving or running the handler are all routed to a
//! single optional exception handler. Without one they propagate to the
//! caller. An unmatched path is not an error: it produces `404 Not Found`
//! directly.

use crate::error::{Error, Result};
use crate::request::Request;
use crate::response::Response;
use crate::router::Router;
use http::StatusCode;
use std::sync::Arc;

/// Shared exception handler: `(request, response, error)`
pub type ExceptionHandler = Arc<dyn Fn(&Request, &mut Response, &Error) + Send + Sync>;

/// Terminal step of the middleware chain
pub trait Dispatch {
    fn dispatch(&self, req: &Request) -> Result<Response>;
}

impl<F> Dispatch for F
where
    F: Fn(&Request) -> Result<Response>,
{
    fn dispatch(&self, req: &Request) -> Result<Response> {
        self(req)
    }
}

/// Routes requests to handlers and funnels their errors
#[derive(Clone, Default)]
pub struct Dispatcher {
    router: Router,
    exception_handler: Option<ExceptionHandler>,
}

impl Dispatcher {
    pub fn new(router: Router) -> Self {
        Self {
            router,
            exception_handler: None,
        }
    }

    pub fn router(&self) -> &Router {
        &self.router
    }

    pub fn router_mut(&mut self) -> &mut Router {
        &mut self.router
    }

    /// Install the exception handler, replacing any earlier one
    pub fn set_exception_handler<F>(&mut self, handler: F)
    where
        F: Fn(&Request, &mut Response, &Error) + Send + Sync + 'static,
    {
        self.exception_handler = Some(Arc::new(handler));
    }

    pub fn has_exception_handler(&self) -> bool {
        self.exception_handler.is_some()
    }

    fn run_handler(&self, req: &Request, res: &mut Response) -> Option<Result<()>> {
        let (route, params) = self.router.resolve(req.path())?;
        tracing::trace!(
            path = %req.path(),
            template = %route.template(),
            params = params.len(),
            "Matched route"
        );

        Some(
            route
                .resolve_for_method(req.method())
                .and_then(|invokable| invokable(req, res, &params)),
        )
    }
}

impl Dispatch for Dispatcher {
    fn dispatch(&self, req: &Request) -> Result<Response> {
        let mut res = Response::new();

        let outcome = match self.run_handler(req, &mut res) {
            Some(outcome) => outcome,
            None => {
                tracing::debug!(method = %req.method(), path = %req.path(), "No route matched");
                res.set_status(StatusCode::NOT_FOUND);
                res.set_text("Not Found");
                return Ok(res);
            }
        };

        match (outcome, &self.exception_handler) {
            (Ok(()), _) => Ok(res),
            (Err(err), Some(handler)) => {
                tracing::warn!(
                    method = %req.method(),
                    path = %req.path(),
                    error = %err,
                    "Handler error passed to exception handler"
                );
                handler(req, &mut res, &err);
                Ok(res)
            }
            (Err(err), None) => Err(err),
        }
    }
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("router", &self.router)
            .field("exception_handler", &self.exception_handler.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handler::{HandlerKind, Resource};
    use crate::path_params::PathParams;
    use bytes::Bytes;
    use http::Method;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn request(method: Method, path: &str) -> Request {
        Request::from_http(
            http::Request::builder()
                .method(method)
                .uri(path)
                .body(Bytes::new())
                .unwrap(),
        )
    }

    fn dispatcher() -> Dispatcher {
        let mut router = Router::new();
        router
            .register(
                "/hello/{name}",
                HandlerKind::function(|_, res, params| {
                    res.set_text(format!("Hello, {}", params.get("name").unwrap_or_default()));
                    Ok(())
                }),
            )
            .unwrap();
        router
            .register(
                "/boom",
                HandlerKind::function(|_, _, _| Err(Error::msg("kaboom"))),
            )
            .unwrap();
        router
            .register(
                "/create",
                HandlerKind::function_with_methods(|_, res, _| {
                    res.set_status(StatusCode::CREATED);
                    Ok(())
                }, ["post"]),
            )
            .unwrap();
        Dispatcher::new(router)
    }

    #[test]
    fn test_matched_handler_mutates_fresh_response() {
        let res = dispatcher().dispatch(&request(Method::GET, "/hello/Ada")).unwrap();
        assert_eq!(res.status(), StatusCode::OK);
        assert_eq!(res.text(), "Hello, Ada");
    }

    #[test]
    fn test_unmatched_is_404_without_exception_handler_call() {
        let calls = Arc::new(AtomicUsize::new(0));
        let calls_inner = Arc::clone(&calls);

        let mut dispatcher = dispatcher();
        dispatcher.set_exception_handler(move |_, _, _| {
            calls_inner.fetch_add(1, Ordering::SeqCst);
        });

        let res = dispatcher.dispatch(&request(Method::GET, "/nowhere")).unwrap();
        assert_eq!(res.status(), StatusCode::NOT_FOUND);
        assert_eq!(res.text(), "Not Found");
        assert_eq!(res.content_type(), Some("text/plain"));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_errors_propagate_without_exception_handler() {
        let dispatcher = dispatcher();

        let err = dispatcher.dispatch(&request(Method::GET, "/boom")).unwrap_err();
        assert_eq!(err.to_string(), "handler failed: kaboom");

        let err = dispatcher.dispatch(&request(Method::GET, "/create")).unwrap_err();
        assert!(matches!(err, Error::MethodNotAllowed { .. }));
    }

    #[test]
    fn test_exception_handler_output_is_returned() {
        let mut dispatcher = dispatcher();
        dispatcher.set_exception_handler(|_, res, err| {
            res.set_status(StatusCode::INTERNAL_SERVER_ERROR);
            res.set_text(err.to_string());
        });

        let res = dispatcher.dispatch(&request(Method::GET, "/boom")).unwrap();
        assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(res.text(), "handler failed: kaboom");

        // Method gating errors take the same path.
        let res = dispatcher.dispatch(&request(Method::GET, "/create")).unwrap();
        assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(res.text(), "method not allowed: GET");
    }

    #[test]
    fn test_exception_handler_sees_partially_written_response() {
        let mut router = Router::new();
        router
            .register(
                "/partial",
                HandlerKind::function(|_, res, _| {
                    res.set_text("partial");
                    res.set_status(StatusCode::ACCEPTED);
                    Err(Error::msg("failed halfway"))
                }),
            )
            .unwrap();
        let mut dispatcher = Dispatcher::new(router);
        dispatcher.set_exception_handler(|_, res, _| {
            let seen = format!("{}|{}", res.status().as_u16(), res.text());
            res.set_text(seen);
        });

        let res = dispatcher.dispatch(&request(Method::GET, "/partial")).unwrap();
        assert_eq!(res.status(), StatusCode::ACCEPTED);
        assert_eq!(res.text(), "202|partial");
    }

    #[test]
    fn test_last_exception_handler_wins() {
        let mut dispatcher = dispatcher();
        dispatcher.set_exception_handler(|_, res, _| res.set_text("first"));
        dispatcher.set_exception_handler(|_, res, _| res.set_text("second"));

        let res = dispatcher.dispatch(&request(Method::GET, "/boom")).unwrap();
        assert_eq!(res.text(), "second");
    }

    #[test]
    fn test_resource_dispatch() {
        struct Books;
        impl Books {
            fn post(&self, _: &Request, res: &mut Response, _: &PathParams) -> Result<()> {
                res.set_text("Endpoint to create a book");
                Ok(())
            }
        }

        let mut router = Router::new();
        router
            .register("/book", HandlerKind::resource(Resource::new(|| Books).post(Books::post)))
            .unwrap();
        let dispatcher = Dispatcher::new(router);

        let res = dispatcher.dispatch(&request(Method::POST, "/book")).unwrap();
        assert_eq!(res.text(), "Endpoint to create a book");
        assert!(dispatcher.dispatch(&request(Method::GET, "/book")).is_err());
    }
}

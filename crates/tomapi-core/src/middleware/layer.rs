//! Middleware chain
//!
//! The chain is a singly linked list of layers ending in a terminal node that
//! hands the request to a [`Dispatch`] implementation. It is built once at
//! configuration time and shared read-only by every request afterwards.
//!
//! Adding a layer makes it the **outermost** one: with `A` added before `B`,
//! a request runs `B.pre → A.pre → dispatch → A.post → B.post`.

use crate::dispatcher::Dispatch;
use crate::error::Result;
use crate::request::Request;
use crate::response::Response;
use std::sync::Arc;

/// Cross-cutting request/response processing
///
/// Most middleware only override the two hooks. Overriding [`handle`]
/// gives full control, including answering without calling `next`.
///
/// [`handle`]: Middleware::handle
pub trait Middleware: Send + Sync + 'static {
    /// Runs before the rest of the chain
    fn process_request(&self, _req: &mut Request) {}

    /// Runs after the rest of the chain produced a response
    fn process_response(&self, _req: &Request, _res: &mut Response) {}

    /// Wrap the rest of the chain
    ///
    /// If `next` fails the error is returned as is and
    /// [`process_response`](Middleware::process_response) is skipped.
    fn handle(&self, req: &mut Request, next: Next<'_>) -> Result<Response> {
        self.process_request(req);
        let mut res = next.run(req)?;
        self.process_response(req, &mut res);
        Ok(res)
    }
}

enum Link {
    Terminal,
    Layer {
        middleware: Arc<dyn Middleware>,
        next: Arc<Link>,
    },
}

/// The remainder of the chain below the current layer
pub struct Next<'a> {
    link: &'a Link,
    dispatch: &'a dyn Dispatch,
}

impl<'a> Next<'a> {
    /// Run the remaining layers and the terminal dispatcher
    pub fn run(self, req: &mut Request) -> Result<Response> {
        match self.link {
            Link::Terminal => self.dispatch.dispatch(req),
            Link::Layer { middleware, next } => middleware.handle(
                req,
                Next {
                    link: next,
                    dispatch: self.dispatch,
                },
            ),
        }
    }
}

/// Ordered, nestable wrapper around a dispatcher
#[derive(Clone)]
pub struct MiddlewareChain {
    head: Arc<Link>,
    len: usize,
}

impl MiddlewareChain {
    /// Create the identity chain
    pub fn new() -> Self {
        Self {
            head: Arc::new(Link::Terminal),
            len: 0,
        }
    }

    /// Wrap the current chain in `middleware`, making it the outermost layer
    pub fn add<M: Middleware>(&mut self, middleware: M) {
        self.add_arc(Arc::new(middleware));
    }

    /// Like [`add`](Self::add) for an already shared middleware
    pub fn add_arc(&mut self, middleware: Arc<dyn Middleware>) {
        let next = Arc::clone(&self.head);
        self.head = Arc::new(Link::Layer { middleware, next });
        self.len += 1;
    }

    /// Run `req` through every layer and then `dispatch`
    pub fn call(&self, req: &mut Request, dispatch: &dyn Dispatch) -> Result<Response> {
        Next {
            link: &self.head,
            dispatch,
        }
        .run(req)
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn len(&self) -> usize {
        self.len
    }
}

impl Default for MiddlewareChain {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for MiddlewareChain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MiddlewareChain")
            .field("len", &self.len)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use bytes::Bytes;
    use http::{Method, StatusCode};
    use proptest::prelude::*;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Mutex;

    type Log = Arc<Mutex<Vec<String>>>;

    fn create_test_request(method: Method, path: &str) -> Request {
        let req = http::Request::builder()
            .method(method)
            .uri(path)
            .body(Bytes::new())
            .unwrap();
        Request::from_http(req)
    }

    /// Records pre/post hook execution
    struct Tracking {
        name: String,
        log: Log,
    }

    impl Tracking {
        fn new(name: impl Into<String>, log: &Log) -> Self {
            Self {
                name: name.into(),
                log: Arc::clone(log),
            }
        }
    }

    impl Middleware for Tracking {
        fn process_request(&self, _req: &mut Request) {
            self.log.lock().unwrap().push(format!("{}.pre", self.name));
        }

        fn process_response(&self, _req: &Request, _res: &mut Response) {
            self.log.lock().unwrap().push(format!("{}.post", self.name));
        }
    }

    /// Answers without calling the rest of the chain
    struct ShortCircuit(StatusCode);

    impl Middleware for ShortCircuit {
        fn handle(&self, _req: &mut Request, _next: Next<'_>) -> Result<Response> {
            let mut res = Response::new();
            res.set_status(self.0);
            res.set_text("blocked");
            Ok(res)
        }
    }

    fn terminal(log: &Log) -> impl Fn(&Request) -> Result<Response> + Send + Sync {
        let log = Arc::clone(log);
        move |_req: &Request| -> Result<Response> {
            log.lock().unwrap().push("handler".to_string());
            Ok(Response::new())
        }
    }

    #[test]
    fn test_empty_chain_calls_dispatch_directly() {
        let log: Log = Arc::default();
        let chain = MiddlewareChain::new();
        let mut req = create_test_request(Method::GET, "/test");

        let res = chain.call(&mut req, &terminal(&log)).unwrap();
        assert_eq!(res.status(), StatusCode::OK);
        assert_eq!(*log.lock().unwrap(), vec!["handler"]);
        assert!(chain.is_empty());
    }

    #[test]
    fn test_newest_layer_is_outermost() {
        let log: Log = Arc::default();
        let mut chain = MiddlewareChain::new();
        chain.add(Tracking::new("A", &log));
        chain.add(Tracking::new("B", &log));

        let mut req = create_test_request(Method::GET, "/test");
        chain.call(&mut req, &terminal(&log)).unwrap();

        assert_eq!(
            *log.lock().unwrap(),
            vec!["B.pre", "A.pre", "handler", "A.post", "B.post"]
        );
        assert_eq!(chain.len(), 2);
    }

    #[test]
    fn test_pre_hook_mutation_visible_inside() {
        struct Tag;
        impl Middleware for Tag {
            fn process_request(&self, req: &mut Request) {
                req.extensions_mut().insert("tagged");
            }
        }

        let mut chain = MiddlewareChain::new();
        chain.add(Tag);

        let seen = Arc::new(AtomicBool::new(false));
        let seen_inner = Arc::clone(&seen);
        let dispatch = move |req: &Request| -> Result<Response> {
            seen_inner.store(req.extensions().get::<&str>() == Some(&"tagged"), Ordering::SeqCst);
            Ok(Response::new())
        };

        let mut req = create_test_request(Method::GET, "/");
        chain.call(&mut req, &dispatch).unwrap();
        assert!(seen.load(Ordering::SeqCst));
    }

    #[test]
    fn test_short_circuit_skips_inner_layers() {
        let log: Log = Arc::default();
        let mut chain = MiddlewareChain::new();
        chain.add(Tracking::new("inner", &log));
        chain.add(ShortCircuit(StatusCode::UNAUTHORIZED));
        chain.add(Tracking::new("outer", &log));

        let mut req = create_test_request(Method::GET, "/test");
        let res = chain.call(&mut req, &terminal(&log)).unwrap();

        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(*log.lock().unwrap(), vec!["outer.pre", "outer.post"]);
    }

    #[test]
    fn test_error_skips_post_hooks() {
        let log: Log = Arc::default();
        let mut chain = MiddlewareChain::new();
        chain.add(Tracking::new("A", &log));
        chain.add(Tracking::new("B", &log));

        let failing = |_: &Request| -> Result<Response> { Err(Error::msg("boom")) };
        let mut req = create_test_request(Method::GET, "/test");
        let err = chain.call(&mut req, &failing).unwrap_err();

        assert!(matches!(err, Error::Handler(_)));
        assert_eq!(*log.lock().unwrap(), vec!["B.pre", "A.pre"]);
    }

    #[test]
    fn test_post_hook_mutates_response() {
        struct Stamp;
        impl Middleware for Stamp {
            fn process_response(&self, _req: &Request, res: &mut Response) {
                res.headers_mut()
                    .insert("x-stamp", http::HeaderValue::from_static("1"));
            }
        }

        let mut chain = MiddlewareChain::new();
        chain.add(Stamp);
        let dispatch = |_: &Request| -> Result<Response> { Ok(Response::new()) };

        let mut req = create_test_request(Method::GET, "/");
        let res = chain.call(&mut req, &dispatch).unwrap();
        assert_eq!(res.headers().get("x-stamp").unwrap(), "1");
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(50))]

        #[test]
        fn prop_nesting_order(num_layers in 1usize..10usize) {
            let log: Log = Arc::default();
            let mut chain = MiddlewareChain::new();
            for i in 0..num_layers {
                chain.add(Tracking::new(i.to_string(), &log));
            }

            let mut req = create_test_request(Method::GET, "/test");
            chain.call(&mut req, &terminal(&log)).unwrap();

            let mut expected: Vec<String> =
                (0..num_layers).rev().map(|i| format!("{}.pre", i)).collect();
            expected.push("handler".to_string());
            expected.extend((0..num_layers).map(|i| format!("{}.post", i)));

            prop_assert_eq!(&*log.lock().unwrap(), &expected);
        }
    }
}

//! Integration tests for the tomapi facade
//!
//! These drive whole applications through the in-process TestClient.

use tomapi::prelude::*;

const RESPONSE_TEXT: &str = "this is cool";

#[test]
fn test_basic_route_adding() {
    let app = App::new()
        .route("/home", |_, res, _| {
            res.set_text("YOLO");
            Ok(())
        })
        .unwrap();

    assert!(app.router().contains("/home"));
}

#[test]
fn test_route_overlap_is_rejected() {
    let result = App::new()
        .route("/home", |_, _, _| Ok(()))
        .and_then(|app| app.route("/home", |_, _, _| Ok(())));

    assert!(matches!(result, Err(Error::DuplicateRoute { .. })));
}

#[test]
fn test_it_can_send_requests() {
    let app = App::new()
        .route("/hey", |_, res, _| {
            res.set_text(RESPONSE_TEXT);
            Ok(())
        })
        .unwrap();
    let client = TestClient::new(app);

    assert_eq!(client.get("http://testserver/hey").unwrap().text(), RESPONSE_TEXT);
}

#[test]
fn test_parameterized_route() {
    let app = App::new()
        .route("/{name}", |_, res, params| {
            res.set_text(format!("hey {}", params.get("name").unwrap_or_default()));
            Ok(())
        })
        .unwrap();
    let client = TestClient::new(app);

    assert_eq!(client.get("http://testserver/tom").unwrap().text(), "hey tom");
    assert_eq!(client.get("http://testserver/ashley").unwrap().text(), "hey ashley");
}

#[test]
fn test_it_returns_404_for_nonexistent_route() {
    let client = TestClient::new(App::new());

    let response = client.get("http://testserver/does-not-exist").unwrap();
    response.assert_status(404);
    assert_eq!(response.text(), "Not Found");
}

struct Books;

impl Books {
    fn get(&self, _: &Request, res: &mut Response, _: &PathParams) -> Result<()> {
        res.set_text("Books Page");
        Ok(())
    }

    fn post(&self, _: &Request, res: &mut Response, _: &PathParams) -> Result<()> {
        res.set_text("Endpoint to create a book");
        Ok(())
    }
}

#[test]
fn test_resource_handler_dispatches_on_method() {
    let app = App::new()
        .resource("/book", Resource::new(|| Books).get(Books::get).post(Books::post))
        .unwrap();
    let client = TestClient::new(app);

    assert_eq!(client.get("/book").unwrap().text(), "Books Page");
    assert_eq!(client.post("/book").unwrap().text(), "Endpoint to create a book");
}

#[test]
fn test_resource_handler_method_not_allowed() {
    let app = App::new()
        .resource("/baz", Resource::new(|| Books).post(Books::post))
        .unwrap();
    let client = TestClient::new(app);

    let err = client.get("/baz").unwrap_err();
    assert!(matches!(err, Error::MethodNotAllowed { ref method } if method == "GET"));
}

#[test]
fn test_custom_exception_handler_renders_error_text() {
    let app = App::new()
        .route("/exception", |_, _, _| Err(Error::msg("This handler should not be used")))
        .unwrap()
        .exception_handler(|_, res, err| {
            res.set_status(StatusCode::INTERNAL_SERVER_ERROR);
            res.set_text(err.to_string());
        });
    let client = TestClient::new(app);

    let response = client.get("/exception").unwrap();
    response
        .assert_status(500)
        .assert_body_contains("This handler should not be used");
}

#[cfg(feature = "view")]
#[test]
fn test_template_page_through_handler() {
    use tomapi::view::{ContextBuilder, Templates};

    let dir = tempfile::tempdir().unwrap();
    std::fs::write(
        dir.path().join("index.html"),
        "<title>{{ title }}</title><h1>{{ name }}</h1>",
    )
    .unwrap();
    let templates = Templates::from_dir(dir.path()).unwrap();

    let app = App::new()
        .route("/", move |_, res, _| {
            let ctx = ContextBuilder::new()
                .insert("title", "Best Title")
                .insert("name", "Best Name")
                .build();
            templates.render_into(res, "index.html", &ctx)?;
            Ok(())
        })
        .unwrap()
        .route("/broken", |_, res, _| {
            Templates::empty().render_into(res, "missing.html", &tomapi::view::Context::new())?;
            Ok(())
        })
        .unwrap();
    let client = TestClient::new(app);

    let response = client.get("/").unwrap();
    response
        .assert_status(200)
        .assert_header("content-type", "text/html")
        .assert_body_contains("<h1>Best Name</h1>");

    let err = client.get("/broken").unwrap_err();
    assert!(matches!(err, Error::Handler(_)));
}

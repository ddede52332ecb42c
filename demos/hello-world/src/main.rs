//! Hello World demo for tomapi
//!
//! Run from this directory with: cargo run
//!
//! Then visit: http://127.0.0.1:8080

use tomapi::prelude::*;

/// Logs every request on the way in and out
struct RequestLogMiddleware;

impl Middleware for RequestLogMiddleware {
    fn process_request(&self, req: &mut Request) {
        info!(uri = %req.uri(), "Processing request");
    }

    fn process_response(&self, req: &Request, _res: &mut Response) {
        info!(uri = %req.uri(), "Processing response");
    }
}

fn home(_req: &Request, res: &mut Response, _params: &PathParams) -> Result<()> {
    res.set_text("Hello from the HOME page");
    Ok(())
}

fn about(_req: &Request, res: &mut Response, _params: &PathParams) -> Result<()> {
    res.set_text("Hello from the ABOUT page");
    Ok(())
}

fn greeting(_req: &Request, res: &mut Response, params: &PathParams) -> Result<()> {
    res.set_text(format!("Hello, {}", params.get("name").unwrap_or_default()));
    Ok(())
}

fn exception_thrower(_req: &Request, _res: &mut Response, _params: &PathParams) -> Result<()> {
    Err(Error::msg("This handler should not be used"))
}

/// Created fresh for every request to `/book`
struct BooksResource;

impl BooksResource {
    fn get(&self, _req: &Request, res: &mut Response, _params: &PathParams) -> Result<()> {
        res.set_text("Books Page");
        Ok(())
    }

    fn post(&self, _req: &Request, res: &mut Response, _params: &PathParams) -> Result<()> {
        res.set_text("Endpoint to create a book");
        Ok(())
    }
}

fn custom_exception_handler(_req: &Request, res: &mut Response, err: &Error) {
    res.set_status(StatusCode::INTERNAL_SERVER_ERROR);
    res.set_text(err.to_string());
}

#[tokio::main]
async fn main() -> std::result::Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let app = App::from_env()?;
    let templates = Templates::from_dir(app.templates_dir())?;

    let app = app
        .route("/home", home)?
        .route("/about", about)?
        .route("/hello/{name}", greeting)?
        .resource(
            "/book",
            Resource::new(|| BooksResource)
                .get(BooksResource::get)
                .post(BooksResource::post),
        )?
        .route("/", move |_req, res, _params| {
            let ctx = ContextBuilder::new()
                .insert("name", "Test Driven Rust Web Framework")
                .insert("title", "Test Driven Rust Web Framework")
                .build();
            templates.render_into(res, "index.html", &ctx)?;
            Ok(())
        })?
        .route("/exception", exception_thrower)?
        .layer(RequestLogMiddleware)
        .layer(TracingLayer::new())
        .layer(RequestIdLayer::new())
        .exception_handler(custom_exception_handler);

    info!("Starting server on http://127.0.0.1:8080");
    app.run("127.0.0.1:8080").await?;
    Ok(())
}

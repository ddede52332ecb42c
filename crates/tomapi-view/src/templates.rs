//! Template engine wrapper

use crate::ViewError;
use serde::Serialize;
use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, PoisonError, RwLock};
use tera::Tera;
use tomapi_core::Response;

/// Configuration for the template engine
#[derive(Debug, Clone)]
pub struct TemplatesConfig {
    /// Glob pattern for template files
    pub glob: String,
    /// Reload every template from disk before each render
    pub auto_reload: bool,
}

impl Default for TemplatesConfig {
    fn default() -> Self {
        Self {
            glob: "templates/**/*".to_string(),
            auto_reload: false,
        }
    }
}

impl TemplatesConfig {
    /// Create a new config with the given glob pattern
    pub fn new(glob: impl Into<String>) -> Self {
        Self {
            glob: glob.into(),
            ..Default::default()
        }
    }

    /// Glob matching every file below `dir`
    pub fn from_dir(dir: impl AsRef<Path>) -> Self {
        let dir = dir.as_ref().display().to_string();
        Self::new(format!("{}/**/*", dir.trim_end_matches('/')))
    }

    /// Set auto-reload behavior
    pub fn auto_reload(mut self, enabled: bool) -> Self {
        self.auto_reload = enabled;
        self
    }
}

/// Template engine wrapper providing thread-safe template rendering
///
/// Cloning is cheap; clones share the loaded templates. Handlers usually
/// capture a clone:
///
/// ```rust,ignore
/// let templates = Templates::from_dir(app.templates_dir())?;
/// let app = app.route("/", move |_, res, _| {
///     templates.render_into(res, "index.html", &ContextBuilder::new().insert("name", "Ada").build())
///         .map_err(Into::into)
/// })?;
/// ```
#[derive(Clone)]
pub struct Templates {
    inner: Arc<RwLock<Tera>>,
    config: TemplatesConfig,
}

impl Templates {
    /// Create a new template engine from a glob pattern
    ///
    /// Template names are paths relative to the part of the glob before the
    /// first `*`: with `templates/**/*.html`, `templates/pages/home.html` is
    /// rendered as `pages/home.html`.
    ///
    /// # Errors
    ///
    /// Returns an error if a matched template fails to parse.
    pub fn new(glob: impl Into<String>) -> Result<Self, ViewError> {
        Self::with_config(TemplatesConfig::new(glob))
    }

    /// Load every template below `dir`
    pub fn from_dir(dir: impl AsRef<Path>) -> Result<Self, ViewError> {
        Self::with_config(TemplatesConfig::from_dir(dir))
    }

    /// Create a new template engine with configuration
    pub fn with_config(config: TemplatesConfig) -> Result<Self, ViewError> {
        let mut tera = Tera::new(&config.glob)?;
        register_builtin_filters(&mut tera);

        tracing::debug!(
            glob = %config.glob,
            count = tera.get_template_names().count(),
            "Loaded templates"
        );

        Ok(Self {
            inner: Arc::new(RwLock::new(tera)),
            config,
        })
    }

    /// Create an empty template engine (for adding templates programmatically)
    pub fn empty() -> Self {
        let mut tera = Tera::default();
        register_builtin_filters(&mut tera);
        Self {
            inner: Arc::new(RwLock::new(tera)),
            config: TemplatesConfig::default(),
        }
    }

    /// Add a template from a string
    pub fn add_template(
        &self,
        name: impl Into<String>,
        content: impl Into<String>,
    ) -> Result<(), ViewError> {
        let mut tera = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        tera.add_raw_template(&name.into(), &content.into())?;
        Ok(())
    }

    /// Render a template with the given context
    pub fn render(&self, template: &str, context: &tera::Context) -> Result<String, ViewError> {
        if self.config.auto_reload {
            let mut tera = self.inner.write().unwrap_or_else(PoisonError::into_inner);
            if let Err(e) = tera.full_reload() {
                tracing::warn!("Template reload failed: {}", e);
            }
        }

        let tera = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        tera.render(template, context).map_err(ViewError::from)
    }

    /// Render a template with a serializable context
    pub fn render_with<T: Serialize>(&self, template: &str, data: &T) -> Result<String, ViewError> {
        let context = tera::Context::from_serialize(data)
            .map_err(|e| ViewError::serialization_error(e.to_string()))?;
        self.render(template, &context)
    }

    /// Render a template as the HTML body of `res`
    ///
    /// On failure `res` is left untouched.
    pub fn render_into(
        &self,
        res: &mut Response,
        template: &str,
        context: &tera::Context,
    ) -> Result<(), ViewError> {
        let html = self.render(template, context)?;
        res.set_html(html);
        Ok(())
    }

    /// Check if a template exists
    pub fn has_template(&self, name: &str) -> bool {
        let tera = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        let found = tera.get_template_names().any(|n| n == name);
        found
    }

    /// Get all template names
    pub fn template_names(&self) -> Vec<String> {
        let tera = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        tera.get_template_names().map(String::from).collect()
    }

    /// Reload all templates from disk
    pub fn reload(&self) -> Result<(), ViewError> {
        let mut tera = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        tera.full_reload()?;
        Ok(())
    }

    pub fn config(&self) -> &TemplatesConfig {
        &self.config
    }
}

impl std::fmt::Debug for Templates {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Templates")
            .field("config", &self.config)
            .field("templates", &self.template_names())
            .finish()
    }
}

/// Register built-in template filters
fn register_builtin_filters(tera: &mut Tera) {
    tera.register_filter(
        "json_pretty",
        |value: &tera::Value, _: &HashMap<String, tera::Value>| {
            serde_json::to_string_pretty(value)
                .map(tera::Value::String)
                .map_err(|e| tera::Error::msg(e.to_string()))
        },
    );

    tera.register_filter(
        "truncate_words",
        |value: &tera::Value, args: &HashMap<String, tera::Value>| {
            let s = tera::try_get_value!("truncate_words", "value", String, value);
            let length = match args.get("length") {
                Some(val) => tera::try_get_value!("truncate_words", "length", usize, val),
                None => 50,
            };
            let end = match args.get("end") {
                Some(val) => tera::try_get_value!("truncate_words", "end", String, val),
                None => "...".to_string(),
            };

            let words: Vec<&str> = s.split_whitespace().collect();
            if words.len() <= length {
                Ok(tera::Value::String(s))
            } else {
                Ok(tera::Value::String(format!("{}{}", words[..length].join(" "), end)))
            }
        },
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_empty_templates() {
        let templates = Templates::empty();
        templates.add_template("test", "Hello, {{ name }}!").unwrap();

        let mut ctx = tera::Context::new();
        ctx.insert("name", "World");

        assert_eq!(templates.render("test", &ctx).unwrap(), "Hello, World!");
    }

    #[test]
    fn test_render_with_struct() {
        #[derive(Serialize)]
        struct Data {
            name: String,
        }

        let templates = Templates::empty();
        templates.add_template("test", "Hello, {{ name }}!").unwrap();

        let data = Data {
            name: "Alice".to_string(),
        };
        assert_eq!(templates.render_with("test", &data).unwrap(), "Hello, Alice!");
    }

    #[test]
    fn test_render_into_sets_html_body() {
        let templates = Templates::empty();
        templates.add_template("page", "<h1>{{ title }}</h1>").unwrap();

        let mut ctx = tera::Context::new();
        ctx.insert("title", "Books");

        let mut res = Response::new();
        templates.render_into(&mut res, "page", &ctx).unwrap();
        assert_eq!(res.text(), "<h1>Books</h1>");
        assert_eq!(res.content_type(), Some("text/html"));
    }

    #[test]
    fn test_missing_template_leaves_response_untouched() {
        let templates = Templates::empty();
        let mut res = Response::new();
        res.set_text("before");

        let err = templates
            .render_into(&mut res, "missing.html", &tera::Context::new())
            .unwrap_err();
        assert!(matches!(err, ViewError::NotFound(_)));
        assert_eq!(res.text(), "before");
    }

    #[test]
    fn test_loads_directory_and_escapes_html() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir(dir.path().join("pages")).unwrap();
        fs::write(dir.path().join("index.html"), "<p>{{ name }}</p>").unwrap();
        fs::write(dir.path().join("pages/about.html"), "about").unwrap();

        let templates = Templates::from_dir(dir.path()).unwrap();
        assert!(templates.has_template("index.html"));
        assert!(templates.has_template("pages/about.html"));

        let mut ctx = tera::Context::new();
        ctx.insert("name", "<b>Ada</b>");
        assert_eq!(
            templates.render("index.html", &ctx).unwrap(),
            "<p>&lt;b&gt;Ada&lt;&#x2F;b&gt;</p>"
        );
    }

    #[test]
    fn test_reload_picks_up_changes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("index.html");
        fs::write(&path, "v1").unwrap();

        let templates = Templates::from_dir(dir.path()).unwrap();
        fs::write(&path, "v2").unwrap();
        assert_eq!(templates.render("index.html", &tera::Context::new()).unwrap(), "v1");

        templates.reload().unwrap();
        assert_eq!(templates.render("index.html", &tera::Context::new()).unwrap(), "v2");
    }

    #[test]
    fn test_truncate_words_filter() {
        let templates = Templates::empty();
        templates
            .add_template("t", "{{ text | truncate_words(length=2) }}")
            .unwrap();

        let mut ctx = tera::Context::new();
        ctx.insert("text", "one two three");
        assert_eq!(templates.render("t", &ctx).unwrap(), "one two...");
    }
}

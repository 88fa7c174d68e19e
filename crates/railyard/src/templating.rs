// File: src/templating.rs
// Purpose: Templating collaborator and the in-memory reference store

use crate::value::Value;
use anyhow::{Context, Result};
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use thiserror::Error;
use tracing::debug;
use walkdir::WalkDir;

/// Variables visible to a template
pub type TemplateContext = HashMap<String, Value>;

/// Which template to render for an action
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TemplateDescriptor {
    pub controller: String,
    pub action: String,
    pub format: String,
    /// Explicit template type, appended as a final extension
    pub kind: Option<String>,
}

impl TemplateDescriptor {
    pub fn new(
        controller: impl Into<String>,
        action: impl Into<String>,
        format: impl Into<String>,
    ) -> Self {
        Self {
            controller: controller.into(),
            action: action.into(),
            format: format.into(),
            kind: None,
        }
    }

    pub fn with_kind(mut self, kind: impl Into<String>) -> Self {
        self.kind = Some(kind.into());
        self
    }

    /// Store key: `controller/action.format[.kind]`
    pub fn key(&self) -> String {
        match &self.kind {
            Some(kind) => format!("{}/{}.{}.{}", self.controller, self.action, self.format, kind),
            None => format!("{}/{}.{}", self.controller, self.action, self.format),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TemplateError {
    #[error("template not found: {0}")]
    NotFound(String),

    #[error("failed to render template `{name}`: {message}")]
    Render { name: String, message: String },
}

impl TemplateError {
    /// Whether the template simply does not exist
    pub fn is_not_found(&self) -> bool {
        matches!(self, TemplateError::NotFound(_))
    }
}

/// Renders views and layouts for the dispatcher
///
/// A missing template must be reported as [`TemplateError::NotFound`] so
/// callers can fall back to raw content.
pub trait Templating: Send + Sync {
    fn render(
        &self,
        descriptor: &TemplateDescriptor,
        context: &TemplateContext,
    ) -> Result<String, TemplateError>;

    fn exists(&self, descriptor: &TemplateDescriptor) -> bool;

    fn render_inline(&self, source: &str, context: &TemplateContext) -> Result<String, TemplateError>;

    /// Renders layout `name`; the wrapped body is the `content` variable
    fn render_layout(
        &self,
        name: &str,
        format: &str,
        context: &TemplateContext,
    ) -> Result<String, TemplateError>;
}

/// Templates held in memory, keyed by `controller/action.format`
///
/// Placeholders are `{name}` or `{a.b}` for nested objects; unknown
/// placeholders are left as written.
#[derive(Debug, Clone)]
pub struct TemplateStore {
    templates: HashMap<String, String>,
    layouts_dir: String,
}

impl Default for TemplateStore {
    fn default() -> Self {
        Self::new("layouts")
    }
}

impl TemplateStore {
    /// Create an empty store; layouts live under `layouts_dir/`
    pub fn new(layouts_dir: impl Into<String>) -> Self {
        Self {
            templates: HashMap::new(),
            layouts_dir: layouts_dir.into(),
        }
    }

    pub fn insert(&mut self, key: impl Into<String>, source: impl Into<String>) {
        self.templates.insert(key.into(), source.into());
    }

    /// Builder form of [`insert`](Self::insert)
    pub fn with_template(mut self, key: impl Into<String>, source: impl Into<String>) -> Self {
        self.insert(key, source);
        self
    }

    /// Adds layout `name` for `format`
    pub fn with_layout(self, name: &str, format: &str, source: impl Into<String>) -> Self {
        let key = self.layout_key(name, format);
        self.with_template(key, source)
    }

    /// Load every file under `views_dir`, keyed by relative path
    pub fn load_dir(views_dir: impl AsRef<Path>, layouts_dir: impl Into<String>) -> Result<Self> {
        let views_dir = views_dir.as_ref();
        let mut store = Self::new(layouts_dir);

        if !views_dir.exists() {
            return Ok(store);
        }

        for entry in WalkDir::new(views_dir).into_iter() {
            let entry =
                entry.with_context(|| format!("Failed to walk views directory: {:?}", views_dir))?;
            if !entry.file_type().is_file() {
                continue;
            }

            let path = entry.path();
            let relative = path
                .strip_prefix(views_dir)
                .with_context(|| format!("Template outside views directory: {:?}", path))?;
            let key = relative
                .components()
                .map(|c| c.as_os_str().to_string_lossy())
                .collect::<Vec<_>>()
                .join("/");

            let source = fs::read_to_string(path)
                .with_context(|| format!("Failed to read template: {:?}", path))?;

            debug!(template = %key, "Loaded template");
            store.insert(key, source);
        }

        Ok(store)
    }

    pub fn len(&self) -> usize {
        self.templates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.templates.contains_key(key)
    }

    fn layout_key(&self, name: &str, format: &str) -> String {
        format!("{}/{}.{}", self.layouts_dir, name, format)
    }
}

impl Templating for TemplateStore {
    fn render(
        &self,
        descriptor: &TemplateDescriptor,
        context: &TemplateContext,
    ) -> Result<String, TemplateError> {
        let key = descriptor.key();
        let source = self
            .templates
            .get(&key)
            .ok_or(TemplateError::NotFound(key))?;
        Ok(interpolate(source, context))
    }

    fn exists(&self, descriptor: &TemplateDescriptor) -> bool {
        self.templates.contains_key(&descriptor.key())
    }

    fn render_inline(&self, source: &str, context: &TemplateContext) -> Result<String, TemplateError> {
        Ok(interpolate(source, context))
    }

    fn render_layout(
        &self,
        name: &str,
        format: &str,
        context: &TemplateContext,
    ) -> Result<String, TemplateError> {
        let key = self.layout_key(name, format);
        let source = self
            .templates
            .get(&key)
            .ok_or(TemplateError::NotFound(key))?;
        Ok(interpolate(source, context))
    }
}

/// Replace `{name}` / `{a.b}` placeholders with context values
pub fn interpolate(source: &str, context: &TemplateContext) -> String {
    static VAR_REGEX: Lazy<Regex> = Lazy::new(|| {
        Regex::new(r"\{([a-zA-Z_][a-zA-Z0-9_\.]*)\}").expect("placeholder regex is valid")
    });

    VAR_REGEX
        .replace_all(source, |caps: &regex::Captures| {
            let name = &caps[1];
            lookup(context, name)
                .map(|v| v.to_string())
                .unwrap_or_else(|| format!("{{{}}}", name))
        })
        .into_owned()
}

fn lookup<'a>(context: &'a TemplateContext, path: &str) -> Option<&'a Value> {
    let mut parts = path.split('.');
    let first = context.get(parts.next()?)?;
    parts.try_fold(first, |current, part| current.get(part))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn context(pairs: &[(&str, Value)]) -> TemplateContext {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    #[test]
    fn test_interpolation() {
        let mut user = HashMap::new();
        user.insert("name".to_string(), Value::from("Ann"));
        let ctx = context(&[("title", Value::from("Hi")), ("user", Value::from(user))]);

        assert_eq!(
            interpolate("<h1>{title}</h1><p>{user.name}</p><p>{missing}</p>", &ctx),
            "<h1>Hi</h1><p>Ann</p><p>{missing}</p>"
        );
    }

    #[test]
    fn test_missing_template_is_not_found() {
        let store = TemplateStore::default();
        let err = store
            .render(&TemplateDescriptor::new("blog", "show", "html"), &TemplateContext::new())
            .unwrap_err();
        assert!(err.is_not_found());
        assert_eq!(err, TemplateError::NotFound("blog/show.html".to_string()));
    }

    #[test]
    fn test_descriptor_kind_extends_key() {
        let descriptor = TemplateDescriptor::new("blog", "show", "html").with_kind("tpl");
        assert_eq!(descriptor.key(), "blog/show.html.tpl");
    }

    #[test]
    fn test_layout_wraps_content() {
        let store = TemplateStore::default().with_layout("main", "html", "<main>{content}</main>");
        let ctx = context(&[("content", Value::from("body"))]);
        assert_eq!(store.render_layout("main", "html", &ctx).unwrap(), "<main>body</main>");
        assert!(store.render_layout("main", "json", &ctx).unwrap_err().is_not_found());
    }

    #[test]
    fn test_load_dir() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("blog")).unwrap();
        fs::create_dir_all(dir.path().join("site")).unwrap();
        fs::write(dir.path().join("blog/show.html"), "<p>{id}</p>").unwrap();
        fs::write(dir.path().join("site/application.html"), "<body>{content}</body>").unwrap();

        let store = TemplateStore::load_dir(dir.path(), "site").unwrap();
        assert_eq!(store.len(), 2);
        assert!(store.exists(&TemplateDescriptor::new("blog", "show", "html")));

        let ctx = context(&[("content", Value::from("x"))]);
        assert_eq!(
            store.render_layout("application", "html", &ctx).unwrap(),
            "<body>x</body>"
        );
    }

    #[test]
    fn test_load_missing_dir_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = TemplateStore::load_dir(dir.path().join("nope"), "layouts").unwrap();
        assert!(store.is_empty());
    }
}

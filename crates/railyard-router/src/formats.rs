/// Response formats known to the router
///
/// A request's format comes from its path extension (`/feed.rss`). Unknown
/// extensions fall back to the `format` request parameter, then to the
/// `Accept` header, then to the default format.
use crate::{RouteError, RouteRequest};

/// Format used when a path has no extension
pub const DEFAULT_FORMAT: &str = "html";

/// A named response format
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Format {
    pub name: String,
    /// MIME types, preferred first
    pub mime_types: Vec<String>,
    /// Extra extensions resolving to this format (`htm` for `html`)
    pub alternative_extensions: Vec<String>,
}

impl Format {
    pub fn new<I, S>(name: impl Into<String>, mime_types: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: name.into(),
            mime_types: mime_types.into_iter().map(Into::into).collect(),
            alternative_extensions: Vec::new(),
        }
    }

    pub fn with_alternative_extension(mut self, extension: impl Into<String>) -> Self {
        self.alternative_extensions.push(extension.into());
        self
    }

    fn answers_to(&self, extension: &str) -> bool {
        self.name == extension || self.alternative_extensions.iter().any(|e| e == extension)
    }
}

/// Registry of formats plus the default
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormatRegistry {
    formats: Vec<Format>,
    default: String,
}

impl Default for FormatRegistry {
    fn default() -> Self {
        Self {
            formats: vec![
                Format::new("html", ["text/html", "application/xhtml+xml"])
                    .with_alternative_extension("htm"),
                Format::new("xml", ["text/xml", "application/xml"]),
                Format::new("js", ["text/javascript"]),
                Format::new("css", ["text/css"]),
                Format::new("json", ["application/json"]),
                Format::new("txt", ["text/plain"]),
                Format::new("atom", ["application/atom+xml"]),
                Format::new("rss", ["application/rss+xml"]),
            ],
            default: DEFAULT_FORMAT.to_string(),
        }
    }
}

impl FormatRegistry {
    /// Registers a format, replacing any format with the same name
    pub fn register(&mut self, format: Format) {
        match self.formats.iter_mut().find(|f| f.name == format.name) {
            Some(existing) => *existing = format,
            None => self.formats.push(format),
        }
    }

    /// Builder form of [`register`](Self::register)
    pub fn with_format(mut self, format: Format) -> Self {
        self.register(format);
        self
    }

    /// Changes the default format; it must already be registered
    pub fn set_default(&mut self, name: &str) -> Result<(), RouteError> {
        if self.get(name).is_none() {
            return Err(RouteError::UnknownFormat(name.to_string()));
        }
        self.default = name.to_string();
        Ok(())
    }

    pub fn default_format(&self) -> &str {
        &self.default
    }

    pub fn get(&self, name: &str) -> Option<&Format> {
        self.formats.iter().find(|f| f.name == name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.formats.iter().map(|f| f.name.as_str())
    }

    /// Preferred MIME type for a format
    pub fn mime_type(&self, name: &str) -> Option<&str> {
        self.get(name)
            .and_then(|f| f.mime_types.first())
            .map(String::as_str)
    }

    /// Format name for an extension, including alternative extensions
    pub fn for_extension(&self, extension: &str) -> Option<&str> {
        self.formats
            .iter()
            .find(|f| f.answers_to(extension))
            .map(|f| f.name.as_str())
    }

    /// Format name for a MIME type
    pub fn for_mime_type(&self, mime: &str) -> Option<&str> {
        self.formats
            .iter()
            .find(|f| f.mime_types.iter().any(|m| m.eq_ignore_ascii_case(mime)))
            .map(|f| f.name.as_str())
    }

    /// Resolves the format of a request with the given path extension
    ///
    /// ```
    /// use railyard_router::{FormatRegistry, RouteRequest};
    ///
    /// let formats = FormatRegistry::default();
    /// let req = RouteRequest::get("/feed.rss");
    /// assert_eq!(formats.resolve("rss", &req), "rss");
    /// assert_eq!(formats.resolve("htm", &req), "html");
    ///
    /// let req = RouteRequest::get("/feed.zip").with_accept("application/json");
    /// assert_eq!(formats.resolve("zip", &req), "json");
    /// ```
    pub fn resolve(&self, extension: &str, request: &RouteRequest) -> String {
        if let Some(name) = self.for_extension(extension) {
            return name.to_string();
        }

        if let Some(name) = request
            .data
            .get("format")
            .and_then(|requested| self.get(requested))
        {
            return name.name.clone();
        }

        request
            .accept
            .as_deref()
            .into_iter()
            .flat_map(|accept| accept.split(','))
            .map(|entry| entry.split(';').next().unwrap_or("").trim())
            .find_map(|mime| self.for_mime_type(mime))
            .unwrap_or(self.default.as_str())
            .to_string()
    }
}

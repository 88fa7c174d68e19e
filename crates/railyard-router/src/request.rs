/// The slice of an HTTP request the router needs
use std::collections::HashMap;

/// Request as seen by route matching
///
/// The hosting HTTP layer converts its own request type into this one.
/// `data` holds query/form parameters; a `method` entry in it overrides the
/// HTTP method (used by HTML forms that cannot send PUT or DELETE).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RouteRequest {
    /// Uppercase HTTP method
    pub method: String,
    /// Request path with a leading slash
    pub path: String,
    /// Request parameters
    pub data: HashMap<String, String>,
    /// Value of the `Accept` header, if any
    pub accept: Option<String>,
}

impl RouteRequest {
    pub fn new(method: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            method: method.into().to_ascii_uppercase(),
            path: path.into(),
            data: HashMap::new(),
            accept: None,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new("GET", path)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new("POST", path)
    }

    /// Parses `"POST /articles"` style strings
    ///
    /// A leading uppercase word followed by a space is the method; without
    /// one the request is a GET.
    ///
    /// ```
    /// use railyard_router::RouteRequest;
    ///
    /// let req = RouteRequest::parse("DELETE /articles/5");
    /// assert_eq!(req.method, "DELETE");
    /// assert_eq!(req.path, "/articles/5");
    ///
    /// let req = RouteRequest::parse("/articles");
    /// assert_eq!(req.method, "GET");
    /// ```
    pub fn parse(line: &str) -> Self {
        match split_method_prefix(line) {
            Some((method, path)) => Self::new(method, path),
            None => Self::get(line),
        }
    }

    /// Adds a request parameter (builder style)
    pub fn with_data(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.data.insert(key.into(), value.into());
        self
    }

    /// Sets the `Accept` header value (builder style)
    pub fn with_accept(mut self, accept: impl Into<String>) -> Self {
        self.accept = Some(accept.into());
        self
    }

    /// Copy of this request addressed to another path
    ///
    /// Used when a forwarding route hands the rest of the path to another
    /// route set.
    pub fn with_path(&self, path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            ..self.clone()
        }
    }

    /// The method routes are checked against
    pub fn effective_method(&self) -> String {
        self.data
            .get("method")
            .filter(|m| !m.is_empty())
            .map(|m| m.to_ascii_uppercase())
            .unwrap_or_else(|| self.method.to_ascii_uppercase())
    }
}

/// Splits a leading `"VERB "` off a string
///
/// Returns `None` unless the string starts with one or more ASCII uppercase
/// letters followed by a single space.
pub(crate) fn split_method_prefix(input: &str) -> Option<(&str, &str)> {
    let (head, rest) = input.split_once(' ')?;
    if !head.is_empty() && head.bytes().all(|b| b.is_ascii_uppercase()) {
        Some((head, rest))
    } else {
        None
    }
}

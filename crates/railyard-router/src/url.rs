/// Options for reverse routing
use std::collections::BTreeMap;

use crate::Params;

/// What a generated URL should point at
///
/// ```
/// use railyard_router::UrlOptions;
///
/// let options = UrlOptions::new().controller("blog").action("edit").id("22");
/// assert_eq!(options.get("action"), Some("edit"));
/// assert_eq!(options.get("format"), None);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UrlOptions {
    /// Values for pattern variables (`controller`, `action`, `id`, ...)
    pub values: BTreeMap<String, String>,
    /// Format to append as an extension when it is not the default
    pub format: Option<String>,
    /// Base path literals are checked against (else the request path)
    pub path: Option<String>,
    pub trailing_slash: bool,
}

impl UrlOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn param(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.values.insert(name.into(), value.into());
        self
    }

    pub fn controller(self, controller: impl Into<String>) -> Self {
        self.param("controller", controller)
    }

    pub fn action(self, action: impl Into<String>) -> Self {
        self.param("action", action)
    }

    pub fn id(self, id: impl Into<String>) -> Self {
        self.param("id", id)
    }

    pub fn format(mut self, format: impl Into<String>) -> Self {
        self.format = Some(format.into());
        self
    }

    pub fn path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }

    pub fn trailing_slash(mut self, trailing_slash: bool) -> Self {
        self.trailing_slash = trailing_slash;
        self
    }

    /// Value for a variable; `format` also answers from the format option
    pub fn get(&self, name: &str) -> Option<&str> {
        match self.values.get(name) {
            Some(value) => Some(value),
            None if name == "format" => self.format.as_deref(),
            None => None,
        }
    }

    /// Explicit format, from the format option or a `format` value
    pub fn requested_format(&self) -> Option<&str> {
        self.format
            .as_deref()
            .or_else(|| self.values.get("format").map(String::as_str))
    }
}

/// Builds options that point back at a set of bound params
///
/// Splat lists are joined with `/`.
impl From<&Params> for UrlOptions {
    fn from(params: &Params) -> Self {
        Self {
            values: params
                .iter()
                .map(|(name, value)| (name.clone(), value.to_path_string()))
                .collect(),
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ParamValue;

    #[test]
    fn test_format_lookup() {
        let options = UrlOptions::new().format("json");
        assert_eq!(options.get("format"), Some("json"));
        assert_eq!(options.requested_format(), Some("json"));

        let options = UrlOptions::new().param("format", "xml");
        assert_eq!(options.requested_format(), Some("xml"));
    }

    #[test]
    fn test_from_params_joins_splats() {
        let mut params = Params::new();
        params.insert("controller".into(), ParamValue::from("docs"));
        params.insert(
            "path".into(),
            ParamValue::from(vec!["guide".to_string(), "intro".to_string()]),
        );

        let options = UrlOptions::from(&params);
        assert_eq!(options.get("controller"), Some("docs"));
        assert_eq!(options.get("path"), Some("guide/intro"));
    }
}

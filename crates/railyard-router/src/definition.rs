/// Route declarations
///
/// A `RouteDef` is the plain record a route set is built from. It can be
/// written in code with the builder methods or deserialized from a
/// `[[routes]]` table in a routes file.
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use serde::Deserialize;

use crate::{Params, RouteRequest};

/// Declaration of a single route
///
/// ```
/// use railyard_router::RouteDef;
///
/// let def = RouteDef::new("GET /$id")
///     .action("show")
///     .requirement("id", r"^\d+$");
/// assert_eq!(def.pattern, "GET /$id");
/// assert_eq!(def.action.as_deref(), Some("show"));
/// ```
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RouteDef {
    pub pattern: String,

    /// Action used when the pattern has no `$action`
    #[serde(default)]
    pub action: Option<String>,

    /// Controller used when the pattern has no `$controller`
    #[serde(default)]
    pub controller: Option<String>,

    /// Route set receiving the rest of the path (pattern must end with `->`)
    #[serde(default, alias = "forwardTo")]
    pub forward_to: Option<String>,

    /// Default values for pattern variables
    #[serde(default)]
    pub defaults: BTreeMap<String, String>,

    /// Variables that may be omitted without a value
    #[serde(default)]
    pub optional: Vec<String>,

    /// Regular expressions bound values must match
    #[serde(default)]
    pub requirements: BTreeMap<String, String>,

    /// Built-in conditions by name (`method = "post"`)
    #[serde(default)]
    pub conditions: BTreeMap<String, String>,

    /// Conditions supplied as code
    #[serde(skip)]
    pub custom_conditions: Vec<Condition>,
}

impl RouteDef {
    pub fn new(pattern: impl Into<String>) -> Self {
        Self {
            pattern: pattern.into(),
            ..Self::default()
        }
    }

    pub fn action(mut self, action: impl Into<String>) -> Self {
        self.action = Some(action.into());
        self
    }

    pub fn controller(mut self, controller: impl Into<String>) -> Self {
        self.controller = Some(controller.into());
        self
    }

    pub fn forward_to(mut self, target: impl Into<String>) -> Self {
        self.forward_to = Some(target.into());
        self
    }

    pub fn default_value(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.defaults.insert(name.into(), value.into());
        self
    }

    /// Declares a variable that may be absent (a null default)
    pub fn optional(mut self, name: impl Into<String>) -> Self {
        self.optional.push(name.into());
        self
    }

    pub fn requirement(mut self, name: impl Into<String>, regex: impl Into<String>) -> Self {
        self.requirements.insert(name.into(), regex.into());
        self
    }

    pub fn condition(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.conditions.insert(name.into(), value.into());
        self
    }

    pub fn custom_condition(mut self, condition: Condition) -> Self {
        self.custom_conditions.push(condition);
        self
    }
}

impl From<&str> for RouteDef {
    fn from(pattern: &str) -> Self {
        RouteDef::new(pattern)
    }
}

impl From<String> for RouteDef {
    fn from(pattern: String) -> Self {
        RouteDef::new(pattern)
    }
}

/// Predicate signature: (configured value, request, path, bound params)
pub type ConditionFn = dyn Fn(&str, &RouteRequest, &str, &Params) -> bool + Send + Sync;

/// A named predicate evaluated against the live request
///
/// ```
/// use railyard_router::{Condition, RouteRequest, Params};
///
/// let ajax_only = Condition::new("xhr", "true", |value, req, _path, _params| {
///     req.data.get("xhr").map(String::as_str) == Some(value)
/// });
/// let req = RouteRequest::get("/").with_data("xhr", "true");
/// assert!(ajax_only.check(&req, "/", &Params::new()));
/// ```
#[derive(Clone)]
pub struct Condition {
    name: String,
    value: String,
    predicate: Arc<ConditionFn>,
}

impl Condition {
    pub fn new<F>(name: impl Into<String>, value: impl Into<String>, predicate: F) -> Self
    where
        F: Fn(&str, &RouteRequest, &str, &Params) -> bool + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            value: value.into(),
            predicate: Arc::new(predicate),
        }
    }

    /// Built-in HTTP method condition (`ANY` always passes)
    pub fn method(value: impl Into<String>) -> Self {
        Self::new("method", value, |expected, req, _path, _params| {
            expected.eq_ignore_ascii_case("ANY")
                || expected.eq_ignore_ascii_case(&req.effective_method())
        })
    }

    /// Resolves a condition declared by name in a route definition
    pub fn builtin(name: &str, value: &str) -> Option<Self> {
        match name {
            "method" => Some(Self::method(value)),
            _ => None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn check(&self, request: &RouteRequest, path: &str, params: &Params) -> bool {
        (self.predicate)(&self.value, request, path, params)
    }
}

impl fmt::Debug for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Condition")
            .field("name", &self.name)
            .field("value", &self.value)
            .finish_non_exhaustive()
    }
}

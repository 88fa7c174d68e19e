/// A single compiled route
///
/// A `Route` owns one [`Pattern`] plus the defaults, requirements and
/// conditions declared for it. Matching turns a [`RouteRequest`] into an
/// immutable [`MatchResult`]; generation turns [`UrlOptions`] back into a path.
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use regex::Regex;

use crate::pattern::{Segment, COMPONENT_SEPARATOR, EXTENSION_SEPARATOR};
use crate::{
    Condition, FormatRegistry, ParamValue, Params, Pattern, RouteDef, RouteError, RouteRequest,
    UrlOptions,
};

/// Action used when neither the pattern nor the declaration names one
pub const DEFAULT_ACTION: &str = "index";

#[derive(Debug, Clone)]
pub struct Route {
    controller_name: String,
    pattern: Pattern,
    action: Option<String>,
    controller: Option<String>,
    forward_to: Option<String>,
    /// `None` marks a variable that may be absent
    defaults: BTreeMap<String, Option<String>>,
    requirements: Vec<(String, Regex)>,
    conditions: Vec<Condition>,
}

impl Route {
    /// Compiles a route declaration for the route set named `controller_name`
    ///
    /// ```
    /// use railyard_router::{Route, RouteDef};
    ///
    /// let route = Route::new("blog", RouteDef::new("GET /$id").action("show")).unwrap();
    /// assert_eq!(route.controller_name(), "blog");
    /// assert_eq!(route.default_for("action"), Some("show"));
    /// assert!(Route::new("blog", RouteDef::new("/files/*path/x")).is_err());
    /// ```
    pub fn new(controller_name: impl Into<String>, def: RouteDef) -> Result<Self, RouteError> {
        let pattern = Pattern::parse(&def.pattern)?;

        match (pattern.is_forward(), &def.forward_to) {
            (true, None) => {
                return Err(RouteError::MissingForwardTarget {
                    pattern: def.pattern,
                })
            }
            (false, Some(target)) => {
                return Err(RouteError::UnexpectedForwardTarget {
                    pattern: def.pattern.clone(),
                    target: target.clone(),
                })
            }
            _ => {}
        }

        let mut defaults = BTreeMap::new();
        defaults.insert(
            "action".to_string(),
            Some(def.action.clone().unwrap_or_else(|| DEFAULT_ACTION.to_string())),
        );
        defaults.insert("id".to_string(), None);
        if let Some(controller) = &def.controller {
            defaults.insert("controller".to_string(), Some(controller.clone()));
        }
        for name in &def.optional {
            defaults.insert(name.clone(), None);
        }
        for (name, value) in &def.defaults {
            defaults.insert(name.clone(), Some(value.clone()));
        }

        let requirements = def
            .requirements
            .iter()
            .map(|(name, source)| {
                Regex::new(source)
                    .map(|regex| (name.clone(), regex))
                    .map_err(|e| RouteError::InvalidRequirement {
                        pattern: def.pattern.clone(),
                        name: name.clone(),
                        message: e.to_string(),
                    })
            })
            .collect::<Result<Vec<_>, _>>()?;

        let mut conditions = def
            .conditions
            .iter()
            .map(|(name, value)| {
                Condition::builtin(name, value).ok_or_else(|| RouteError::UnknownCondition {
                    pattern: def.pattern.clone(),
                    name: name.clone(),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        conditions.extend(def.custom_conditions.iter().cloned());

        Ok(Self {
            controller_name: controller_name.into(),
            pattern,
            action: def.action,
            controller: def.controller,
            forward_to: def.forward_to,
            defaults,
            requirements,
            conditions,
        })
    }

    /// Name of the route set this route belongs to
    pub fn controller_name(&self) -> &str {
        &self.controller_name
    }

    pub fn pattern(&self) -> &Pattern {
        &self.pattern
    }

    pub fn forward_to(&self) -> Option<&str> {
        self.forward_to.as_deref()
    }

    /// Declared default for a variable (`None` if absent or null)
    pub fn default_for(&self, name: &str) -> Option<&str> {
        self.defaults.get(name).and_then(|v| v.as_deref())
    }

    /// Whether a variable may be left out of a path
    pub fn has_default(&self, name: &str) -> bool {
        self.defaults.contains_key(name)
    }

    /// Value fixed by the declaration itself (`action` / `controller`)
    fn configured(&self, name: &str) -> Option<&str> {
        match name {
            "action" => self.action.as_deref(),
            "controller" => self.controller.as_deref(),
            _ => None,
        }
    }

    /// Matches a request against this route
    ///
    /// Never fails loudly: a request this route does not accept yields `None`.
    pub fn recognize(
        self: &Arc<Self>,
        request: &RouteRequest,
        formats: &FormatRegistry,
    ) -> Option<MatchResult> {
        if !self.pattern.method().allows(&request.effective_method()) {
            return None;
        }

        let path = SplitPath::new(&request.path);
        let extension = path
            .extension
            .map(str::to_string)
            .unwrap_or_else(|| formats.default_format().to_string());

        let mut bound: BTreeMap<String, Option<ParamValue>> = self
            .defaults
            .iter()
            .map(|(name, value)| (name.clone(), value.clone().map(ParamValue::Single)))
            .collect();

        let segments = self.pattern.segments();
        let components = &path.components;
        let mut remaining_path = None;
        let mut idx = 0;

        while idx < components.len() {
            let segment = segments.get(idx)?;
            let component = components[idx];
            match segment {
                Segment::Literal(text) => {
                    if component != text {
                        return None;
                    }
                }
                Segment::Variable(name) => {
                    if !component.is_empty() {
                        bound.insert(name.clone(), Some(ParamValue::from(component)));
                    }
                }
                Segment::Splat(name) => {
                    let rest = components[idx..].iter().map(|c| c.to_string()).collect();
                    bound.insert(name.clone(), Some(ParamValue::List(rest)));
                    idx = components.len();
                    break;
                }
            }

            if self.pattern.is_forward() && idx + 1 == segments.len() {
                remaining_path = Some(format!(
                    "{}{}{}{}",
                    COMPONENT_SEPARATOR,
                    components[idx + 1..].join("/"),
                    EXTENSION_SEPARATOR,
                    extension
                ));
                idx += 1;
                break;
            }
            idx += 1;
        }

        // Segments the path did not reach must be optional
        for segment in &segments[idx.min(segments.len())..] {
            match segment.name() {
                Some(name) if self.has_default(name) => {}
                _ => return None,
            }
        }

        // A forward route whose defaulted tail was never reached still forwards
        if self.pattern.is_forward() && remaining_path.is_none() {
            remaining_path = Some(format!(
                "{}{}{}",
                COMPONENT_SEPARATOR, EXTENSION_SEPARATOR, extension
            ));
        }

        match (self.pattern.format(), path.extension) {
            (Some(Segment::Literal(expected)), Some(actual)) if expected == actual => {}
            (Some(Segment::Literal(_)), _) => return None,
            (Some(Segment::Variable(name)), Some(actual)) => {
                bound.insert(name.clone(), Some(ParamValue::from(actual)));
            }
            _ => {}
        }

        let params: Params = bound
            .into_iter()
            .filter_map(|(name, value)| value.map(|v| (name, v)))
            .collect();

        let requirements_met = self.requirements.iter().all(|(name, regex)| {
            params
                .get(name)
                .is_some_and(|value| regex.is_match(&value.to_path_string()))
        });
        if !requirements_met {
            return None;
        }

        if !self
            .conditions
            .iter()
            .all(|condition| condition.check(request, &request.path, &params))
        {
            return None;
        }

        let action = params
            .get("action")
            .and_then(ParamValue::as_str)
            .unwrap_or(DEFAULT_ACTION)
            .to_string();
        let controller_name = params
            .get("controller")
            .and_then(ParamValue::as_str)
            .unwrap_or(&self.controller_name)
            .to_string();
        let format = formats.resolve(&extension, request);

        Some(MatchResult {
            do_forward: remaining_path.is_some(),
            forward_to: remaining_path.as_ref().and(self.forward_to.clone()),
            remaining_path,
            params,
            method: request.effective_method(),
            action,
            controller_name,
            format,
            extension,
            path: request.path.clone(),
            request: request.clone(),
            route: Arc::clone(self),
        })
    }

    /// Builds a path for `options`, or `None` if this route cannot produce one
    ///
    /// Segments are resolved right to left. Trailing variables without a
    /// value, or whose value equals their default, are left out. Once a
    /// segment has been written every earlier variable needs a value, taken
    /// from the options, the declaration, the defaults, then the request.
    ///
    /// Values that would not match back to themselves give `None`: a `/`
    /// outside a splat, or a `.` in the last component with no extension.
    pub fn generate(
        &self,
        options: &UrlOptions,
        request: Option<&RouteRequest>,
        formats: &FormatRegistry,
    ) -> Option<String> {
        if !self.accepts_fixed_values(options) {
            return None;
        }

        let base = options
            .path
            .as_deref()
            .or(request.map(|r| r.path.as_str()))
            .unwrap_or("/");
        let base_components = SplitPath::new(base).components;

        let mut emitted: Vec<String> = Vec::new();
        let mut use_request_data = false;

        for (idx, segment) in self.pattern.segments().iter().enumerate().rev() {
            let name = match segment {
                Segment::Literal(text) => {
                    if base_components.get(idx) != Some(&text.as_str()) {
                        return None;
                    }
                    emitted.push(text.clone());
                    use_request_data = true;
                    continue;
                }
                Segment::Variable(name) | Segment::Splat(name) => name,
            };

            let value = self.lookup(name, options);
            let value = if use_request_data {
                value
                    .map(str::to_string)
                    .or_else(|| request.and_then(|r| r.data.get(name).cloned()))?
            } else {
                match value {
                    None => continue,
                    Some(v) if self.default_for(name) == Some(v) => continue,
                    Some(v) => v.to_string(),
                }
            };

            if !self.satisfies_requirement(name, &value) {
                return None;
            }
            // Only a splat may span components
            if matches!(segment, Segment::Variable(_)) && value.contains(COMPONENT_SEPARATOR) {
                return None;
            }
            emitted.push(value);
            use_request_data = true;
        }

        emitted.reverse();
        let mut path = format!("{}{}", COMPONENT_SEPARATOR, emitted.join("/"));

        let default_format = formats.default_format();
        let extension = match self.pattern.format() {
            Some(Segment::Literal(ext)) => Some(ext.clone()),
            Some(segment) => Some(
                segment
                    .name()
                    .and_then(|name| self.lookup(name, options))
                    .or(options.requested_format())
                    .unwrap_or(default_format)
                    .to_string(),
            ),
            None => options
                .requested_format()
                .filter(|f| *f != default_format)
                .map(str::to_string),
        };

        match extension {
            Some(ext) => {
                path.push(EXTENSION_SEPARATOR);
                path.push_str(&ext);
            }
            None if options.trailing_slash && path != "/" => path.push(COMPONENT_SEPARATOR),
            // A dot in the last component would be read back as an extension
            None if path
                .rsplit(COMPONENT_SEPARATOR)
                .next()
                .is_some_and(|last| last.contains(EXTENSION_SEPARATOR)) =>
            {
                return None;
            }
            None => {}
        }

        Some(path)
    }

    fn lookup<'a>(&'a self, name: &str, options: &'a UrlOptions) -> Option<&'a str> {
        options
            .get(name)
            .or_else(|| self.configured(name))
            .or_else(|| self.default_for(name))
    }

    /// Options naming `action`/`controller` must agree with what the route fixes
    fn accepts_fixed_values(&self, options: &UrlOptions) -> bool {
        ["action", "controller"].iter().all(|name| {
            let Some(wanted) = options.values.get(*name) else {
                return true;
            };
            let fixed = if self.pattern.has_variable(name) {
                self.configured(name)
            } else if *name == "controller" {
                Some(self.default_for(name).unwrap_or(&self.controller_name))
            } else {
                self.default_for(name)
            };
            fixed.map_or(true, |fixed| fixed == wanted)
        })
    }

    fn satisfies_requirement(&self, name: &str, value: &str) -> bool {
        self.requirements
            .iter()
            .filter(|(required, _)| required == name)
            .all(|(_, regex)| regex.is_match(value))
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: {} {}",
            self.controller_name,
            self.pattern.method(),
            self.pattern.body()
        )?;
        if let Some(target) = &self.forward_to {
            write!(f, " -> {}", target)?;
        }
        Ok(())
    }
}

/// Request path split into components and an optional extension
struct SplitPath<'a> {
    components: Vec<&'a str>,
    extension: Option<&'a str>,
}

impl<'a> SplitPath<'a> {
    fn new(path: &'a str) -> Self {
        let relative = path.strip_prefix(COMPONENT_SEPARATOR).unwrap_or(path);
        let mut components: Vec<&str> = relative.split(COMPONENT_SEPARATOR).collect();
        let mut extension = None;
        if let Some(last) = components.pop() {
            match last.rsplit_once(EXTENSION_SEPARATOR) {
                Some((stem, ext)) => {
                    components.push(stem);
                    extension = Some(ext);
                }
                None => components.push(last),
            }
        }
        Self {
            components,
            extension,
        }
    }
}

/// Outcome of a successful match
///
/// A value of its own; the matched [`Route`] is only referenced.
#[derive(Debug, Clone)]
pub struct MatchResult {
    /// Bound variables and splats, null bindings removed
    pub params: Params,
    /// Effective request method
    pub method: String,
    pub action: String,
    pub controller_name: String,
    pub format: String,
    /// Path extension, or the default format when the path had none
    pub extension: String,
    pub do_forward: bool,
    /// Unconsumed path handed to the forward target
    pub remaining_path: Option<String>,
    pub forward_to: Option<String>,
    /// Path of the request as received
    pub path: String,
    pub request: RouteRequest,
    pub route: Arc<Route>,
}

impl MatchResult {
    pub fn param(&self, name: &str) -> Option<&str> {
        self.params.get(name).and_then(ParamValue::as_str)
    }

    pub fn id(&self) -> Option<&str> {
        self.param("id")
    }

    /// The request with the bound params merged into its data
    pub fn merged_request(&self) -> RouteRequest {
        let mut request = self.request.clone();
        for (name, value) in &self.params {
            request.data.insert(name.clone(), value.to_path_string());
        }
        request
            .data
            .insert("controller".to_string(), self.controller_name.clone());
        request
            .data
            .insert("action".to_string(), self.action.clone());
        request
    }
}

impl PartialEq for MatchResult {
    fn eq(&self, other: &Self) -> bool {
        self.params == other.params
            && self.method == other.method
            && self.action == other.action
            && self.controller_name == other.controller_name
            && self.format == other.format
            && self.extension == other.extension
            && self.do_forward == other.do_forward
            && self.remaining_path == other.remaining_path
            && self.forward_to == other.forward_to
            && self.path == other.path
            && self.request == other.request
            && Arc::ptr_eq(&self.route, &other.route)
    }
}

impl fmt::Display for MatchResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("{")?;
        for (idx, (name, value)) in self.params.iter().enumerate() {
            if idx > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{}: {:?}", name, value.to_path_string())?;
        }
        f.write_str("}")
    }
}

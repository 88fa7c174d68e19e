/// Route pattern compilation
///
/// Pure parsing of pattern strings into typed segments. A pattern looks like
/// `"GET /articles/$id/edit"`, `"/$controller/$action/$id"`, `"/files/*path"`
/// or `"/blog->"`:
///
/// - an optional uppercase HTTP method followed by a space (default: any method)
/// - `/`-separated components: `$name` variables, `*name` splats, literals
/// - an optional `.ext` or `.$name` format suffix on the last component
/// - an optional trailing `->` forward marker
use std::fmt;
use std::str::FromStr;

use crate::request::split_method_prefix;
use crate::RouteError;

pub(crate) const VARIABLE_IDENTIFIER: char = '$';
pub(crate) const SPLAT_IDENTIFIER: char = '*';
pub(crate) const COMPONENT_SEPARATOR: char = '/';
pub(crate) const EXTENSION_SEPARATOR: char = '.';
pub(crate) const FORWARD_MARKER: &str = "->";

/// One `/`-delimited unit of a pattern
///
/// ```
/// use railyard_router::pattern::{classify_segment, Segment};
///
/// assert_eq!(classify_segment("blog"), Segment::Literal("blog".into()));
/// assert_eq!(classify_segment("$id"), Segment::Variable("id".into()));
/// assert_eq!(classify_segment("*path"), Segment::Splat("path".into()));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Segment {
    /// Must equal the path component exactly
    Literal(String),
    /// Binds one path component
    Variable(String),
    /// Binds every remaining path component
    Splat(String),
}

impl Segment {
    /// Parameter name bound by this segment
    pub fn name(&self) -> Option<&str> {
        match self {
            Segment::Literal(_) => None,
            Segment::Variable(name) | Segment::Splat(name) => Some(name),
        }
    }
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Segment::Literal(text) => f.write_str(text),
            Segment::Variable(name) => write!(f, "{}{}", VARIABLE_IDENTIFIER, name),
            Segment::Splat(name) => write!(f, "{}{}", SPLAT_IDENTIFIER, name),
        }
    }
}

/// Classifies a single pattern component (pure function)
pub fn classify_segment(component: &str) -> Segment {
    if let Some(name) = component.strip_prefix(VARIABLE_IDENTIFIER) {
        Segment::Variable(name.to_string())
    } else if let Some(name) = component.strip_prefix(SPLAT_IDENTIFIER) {
        Segment::Splat(name.to_string())
    } else {
        Segment::Literal(component.to_string())
    }
}

/// HTTP method accepted by a route
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum MethodFilter {
    #[default]
    Any,
    /// Uppercase method name
    Only(String),
}

impl MethodFilter {
    /// Case-insensitive method check
    pub fn allows(&self, method: &str) -> bool {
        match self {
            MethodFilter::Any => true,
            MethodFilter::Only(expected) => expected.eq_ignore_ascii_case(method),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            MethodFilter::Any => "ANY",
            MethodFilter::Only(method) => method,
        }
    }
}

impl fmt::Display for MethodFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A compiled route pattern
///
/// ```
/// use railyard_router::pattern::{MethodFilter, Pattern, Segment};
///
/// let pattern: Pattern = "GET /$id/edit".parse().unwrap();
/// assert_eq!(pattern.method(), &MethodFilter::Only("GET".into()));
/// assert_eq!(
///     pattern.segments(),
///     &[Segment::Variable("id".into()), Segment::Literal("edit".into())]
/// );
///
/// let pattern: Pattern = "/blog->".parse().unwrap();
/// assert!(pattern.is_forward());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pattern {
    source: String,
    body: String,
    method: MethodFilter,
    segments: Vec<Segment>,
    format: Option<Segment>,
    forward: bool,
}

impl Pattern {
    /// Compiles a pattern string
    ///
    /// Fails on malformed patterns: empty variable names, a splat that is not
    /// the last segment, or a splat inside a forwarding pattern.
    pub fn parse(source: &str) -> Result<Self, RouteError> {
        let trimmed = source.trim();

        let (method, rest) = match split_method_prefix(trimmed) {
            Some((method, rest)) => (MethodFilter::Only(method.to_string()), rest.trim_start()),
            None => (MethodFilter::Any, trimmed),
        };

        let (forward, body) = match rest.strip_suffix(FORWARD_MARKER) {
            Some(body) => (true, body.trim_end()),
            None => (false, rest),
        };

        let relative = body.strip_prefix(COMPONENT_SEPARATOR).unwrap_or(body);
        let mut components: Vec<&str> = relative.split(COMPONENT_SEPARATOR).collect();

        // The last component may carry a format suffix: `feed.rss`, `show.$format`
        let mut format = None;
        if let Some(last) = components.pop() {
            match last.rsplit_once(EXTENSION_SEPARATOR) {
                Some((stem, ext)) => {
                    components.push(stem);
                    format = Some(classify_segment(ext));
                }
                None => components.push(last),
            }
        }

        let segments: Vec<Segment> = components.into_iter().map(classify_segment).collect();

        validate(source, &segments, format.as_ref(), forward)?;

        Ok(Self {
            source: source.to_string(),
            body: body.to_string(),
            method,
            segments,
            format,
            forward,
        })
    }

    /// The string this pattern was compiled from
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Path part of the pattern, without method prefix or forward marker
    pub fn body(&self) -> &str {
        &self.body
    }

    pub fn method(&self) -> &MethodFilter {
        &self.method
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Format suffix segment, if the pattern declares one
    pub fn format(&self) -> Option<&Segment> {
        self.format.as_ref()
    }

    /// Whether the pattern ends with `->`
    pub fn is_forward(&self) -> bool {
        self.forward
    }

    /// Names bound by this pattern, in order
    pub fn variables(&self) -> impl Iterator<Item = &str> {
        self.segments
            .iter()
            .chain(self.format.iter())
            .filter_map(Segment::name)
    }

    pub fn has_variable(&self, name: &str) -> bool {
        self.variables().any(|v| v == name)
    }
}

impl FromStr for Pattern {
    type Err = RouteError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Pattern::parse(s)
    }
}

impl fmt::Display for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

fn validate(
    source: &str,
    segments: &[Segment],
    format: Option<&Segment>,
    forward: bool,
) -> Result<(), RouteError> {
    if segments.iter().chain(format).any(|s| s.name() == Some("")) {
        return Err(RouteError::EmptyVariableName {
            pattern: source.to_string(),
        });
    }

    if matches!(format, Some(Segment::Splat(_))) {
        return Err(RouteError::SplatNotLast {
            pattern: source.to_string(),
            name: format.and_then(Segment::name).unwrap_or_default().to_string(),
        });
    }

    let last = segments.len().saturating_sub(1);
    for (idx, segment) in segments.iter().enumerate() {
        if let Segment::Splat(name) = segment {
            if forward {
                return Err(RouteError::SplatWithForward {
                    pattern: source.to_string(),
                });
            }
            if idx != last {
                return Err(RouteError::SplatNotLast {
                    pattern: source.to_string(),
                    name: name.clone(),
                });
            }
        }
    }

    Ok(())
}

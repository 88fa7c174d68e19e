/// Values bound by a route match
use std::collections::BTreeMap;
use std::fmt;

/// A single bound parameter
///
/// Variables bind one path component; splats bind every remaining
/// component as a list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParamValue {
    Single(String),
    List(Vec<String>),
}

impl ParamValue {
    /// The value of a variable binding
    pub fn as_str(&self) -> Option<&str> {
        match self {
            ParamValue::Single(s) => Some(s),
            ParamValue::List(_) => None,
        }
    }

    /// The components of a splat binding
    pub fn as_list(&self) -> Option<&[String]> {
        match self {
            ParamValue::Single(_) => None,
            ParamValue::List(items) => Some(items),
        }
    }

    /// Renders the value the way it appears in a path
    ///
    /// Splat lists are joined with `/`.
    pub fn to_path_string(&self) -> String {
        match self {
            ParamValue::Single(s) => s.clone(),
            ParamValue::List(items) => items.join("/"),
        }
    }
}

impl fmt::Display for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_path_string())
    }
}

impl From<&str> for ParamValue {
    fn from(s: &str) -> Self {
        ParamValue::Single(s.to_string())
    }
}

impl From<String> for ParamValue {
    fn from(s: String) -> Self {
        ParamValue::Single(s)
    }
}

impl From<Vec<String>> for ParamValue {
    fn from(items: Vec<String>) -> Self {
        ParamValue::List(items)
    }
}

/// Bound parameters, ordered by name so matches compare and print stably
pub type Params = BTreeMap<String, ParamValue>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_value() {
        let value = ParamValue::from("22");
        assert_eq!(value.as_str(), Some("22"));
        assert_eq!(value.as_list(), None);
        assert_eq!(value.to_string(), "22");
    }

    #[test]
    fn test_list_value_joins_with_slash() {
        let value = ParamValue::from(vec!["docs".to_string(), "intro".to_string()]);
        assert_eq!(value.as_str(), None);
        assert_eq!(value.as_list().map(|l| l.len()), Some(2));
        assert_eq!(value.to_path_string(), "docs/intro");
    }
}

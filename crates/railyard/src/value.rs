// File: src/value.rs
// Purpose: Values assigned to views and layouts

use railyard_router::ParamValue;
use serde_json::Value as JsonValue;
use std::collections::HashMap;
use std::fmt;

/// A view variable
///
/// Objects are reached from templates with dotted names (`{post.title}`).
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    Number(f64),
    String(String),
    Array(Vec<Value>),
    Object(HashMap<String, Value>),
}

impl Value {
    /// Field of an object value
    pub fn get(&self, key: &str) -> Option<&Value> {
        match self {
            Value::Object(map) => map.get(key),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => Ok(()),
            Value::Bool(b) => write!(f, "{}", b),
            // 3.0 prints as 3
            Value::Number(n) if n.fract() == 0.0 && n.abs() < i64::MAX as f64 => {
                write!(f, "{}", *n as i64)
            }
            Value::Number(n) => write!(f, "{}", n),
            Value::String(s) => f.write_str(s),
            Value::Array(items) => {
                f.write_str("[")?;
                for (idx, item) in items.iter().enumerate() {
                    if idx > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                f.write_str("]")
            }
            Value::Object(_) => f.write_str("[Object]"),
        }
    }
}

macro_rules! number_from {
    ($($ty:ty),*) => {
        $(
            impl From<$ty> for Value {
                fn from(n: $ty) -> Self {
                    Value::Number(n as f64)
                }
            }
        )*
    };
}

number_from!(i32, i64, u32, u64, usize, f64);

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Value::Array(items)
    }
}

impl From<HashMap<String, Value>> for Value {
    fn from(fields: HashMap<String, Value>) -> Self {
        Value::Object(fields)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(Value::Null)
    }
}

/// Route params: variables become strings, splats become arrays
impl From<&ParamValue> for Value {
    fn from(param: &ParamValue) -> Self {
        match param {
            ParamValue::Single(s) => Value::String(s.clone()),
            ParamValue::List(items) => items.iter().map(|s| Value::from(s.as_str())).collect(),
        }
    }
}

impl From<JsonValue> for Value {
    fn from(json: JsonValue) -> Self {
        match json {
            JsonValue::Null => Value::Null,
            JsonValue::Bool(b) => Value::Bool(b),
            JsonValue::Number(n) => n.as_f64().map(Value::Number).unwrap_or_default(),
            JsonValue::String(s) => Value::String(s),
            JsonValue::Array(items) => items.into_iter().map(Value::from).collect(),
            JsonValue::Object(map) => {
                Value::Object(map.into_iter().map(|(k, v)| (k, Value::from(v))).collect())
            }
        }
    }
}

impl FromIterator<Value> for Value {
    fn from_iter<I: IntoIterator<Item = Value>>(iter: I) -> Self {
        Value::Array(iter.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        assert_eq!(Value::from(3).to_string(), "3");
        assert_eq!(Value::from(2.5).to_string(), "2.5");
        assert_eq!(Value::from(2usize).to_string(), "2");
        assert_eq!(Value::Null.to_string(), "");
        assert_eq!(
            Value::from(vec![Value::from("a"), Value::from(true)]).to_string(),
            "[a, true]"
        );
    }

    #[test]
    fn test_from_json() {
        let value = Value::from(serde_json::json!({"post": {"title": "Hi"}, "draft": null}));
        assert_eq!(
            value.get("post").and_then(|p| p.get("title")).and_then(Value::as_str),
            Some("Hi")
        );
        assert!(value.get("draft").is_some_and(Value::is_null));
    }

    #[test]
    fn test_from_option() {
        assert!(Value::from(None::<&str>).is_null());
        assert_eq!(Value::from(Some("x")), Value::from("x"));
    }

    #[test]
    fn test_from_splat_param() {
        let param = ParamValue::List(vec!["a".into(), "b".into()]);
        assert_eq!(Value::from(&param).to_string(), "[a, b]");
    }
}

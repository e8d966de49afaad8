//! The in-memory configuration tree.

use std::fmt;

use indexmap::IndexMap;

/// Ordered mapping type used throughout the configuration tree.
///
/// Keys keep the order they had in the originating file, so dumps and
/// error listings stay recognizable to whoever wrote the file.
pub type Map = IndexMap<String, Value>;

/// A single node in a configuration tree: scalar, sequence or mapping.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// An explicit null.
    Null,
    /// A boolean.
    Bool(bool),
    /// An integer.
    Integer(i64),
    /// A floating-point number.
    Float(f64),
    /// A string.
    String(String),
    /// An ordered sequence of values.
    Sequence(Vec<Value>),
    /// An ordered mapping from string keys to values.
    Mapping(Map),
}

/// The shape of a [`Value`], used for type checks and error messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Kind {
    /// The null shape.
    Null,
    /// The boolean shape.
    Bool,
    /// The integer shape.
    Integer,
    /// The floating-point shape.
    Float,
    /// The string shape.
    String,
    /// The sequence shape.
    Sequence,
    /// The mapping shape.
    Mapping,
}

impl Kind {
    /// An article-prefixed description for error messages, e.g. "an integer".
    pub fn description(self) -> &'static str {
        match self {
            Kind::Null => "null",
            Kind::Bool => "a boolean",
            Kind::Integer => "an integer",
            Kind::Float => "a number",
            Kind::String => "a string",
            Kind::Sequence => "a sequence",
            Kind::Mapping => "a mapping",
        }
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.description())
    }
}

impl Value {
    /// The shape of this value.
    pub fn kind(&self) -> Kind {
        match self {
            Value::Null => Kind::Null,
            Value::Bool(_) => Kind::Bool,
            Value::Integer(_) => Kind::Integer,
            Value::Float(_) => Kind::Float,
            Value::String(_) => Kind::String,
            Value::Sequence(_) => Kind::Sequence,
            Value::Mapping(_) => Kind::Mapping,
        }
    }

    /// True if this value is the explicit null.
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// The boolean payload, if this is a boolean.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// The integer payload, if this is an integer.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Integer(n) => Some(*n),
            _ => None,
        }
    }

    /// The numeric payload widened to a float, if this is a number.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Integer(n) => Some(*n as f64),
            Value::Float(n) => Some(*n),
            _ => None,
        }
    }

    /// The string payload, if this is a string.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// The elements, if this is a sequence.
    pub fn as_sequence(&self) -> Option<&[Value]> {
        match self {
            Value::Sequence(items) => Some(items),
            _ => None,
        }
    }

    /// The entries, if this is a mapping.
    pub fn as_mapping(&self) -> Option<&Map> {
        match self {
            Value::Mapping(map) => Some(map),
            _ => None,
        }
    }

    /// Convert a parsed YAML document into a configuration tree.
    ///
    /// YAML permits arbitrary mapping keys; configuration trees are keyed
    /// by strings, so scalar keys are stringified and structured keys fall
    /// back to their YAML rendering.
    pub fn from_yaml(yaml: serde_yaml::Value) -> Value {
        match yaml {
            serde_yaml::Value::Null => Value::Null,
            serde_yaml::Value::Bool(b) => Value::Bool(b),
            serde_yaml::Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Value::Integer(i)
                } else {
                    Value::Float(n.as_f64().unwrap_or(f64::NAN))
                }
            }
            serde_yaml::Value::String(s) => Value::String(s),
            serde_yaml::Value::Sequence(items) => {
                Value::Sequence(items.into_iter().map(Value::from_yaml).collect())
            }
            serde_yaml::Value::Mapping(entries) => {
                let mut map = Map::new();
                for (key, value) in entries {
                    map.insert(yaml_key(key), Value::from_yaml(value));
                }
                Value::Mapping(map)
            }
            serde_yaml::Value::Tagged(tagged) => Value::from_yaml(tagged.value),
        }
    }
}

fn yaml_key(key: serde_yaml::Value) -> String {
    match key {
        serde_yaml::Value::String(s) => s,
        serde_yaml::Value::Bool(b) => b.to_string(),
        serde_yaml::Value::Number(n) => n.to_string(),
        serde_yaml::Value::Null => "null".to_string(),
        other => serde_yaml::to_string(&other)
            .map(|s| s.trim_end().to_string())
            .unwrap_or_default(),
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("null"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Integer(n) => write!(f, "{n}"),
            Value::Float(n) => write!(f, "{n}"),
            Value::String(s) => write!(f, "'{s}'"),
            Value::Sequence(items) => {
                f.write_str("[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{item}")?;
                }
                f.write_str("]")
            }
            Value::Mapping(map) => {
                f.write_str("{")?;
                for (i, (key, value)) in map.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{key}: {value}")?;
                }
                f.write_str("}")
            }
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Integer(n)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Integer(n.into())
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Float(n)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Value::Sequence(items)
    }
}

impl From<Map> for Value {
    fn from(map: Map) -> Self {
        Value::Mapping(map)
    }
}

impl PartialEq<i64> for Value {
    fn eq(&self, other: &i64) -> bool {
        self.as_i64() == Some(*other)
    }
}

impl PartialEq<f64> for Value {
    fn eq(&self, other: &f64) -> bool {
        matches!(self, Value::Float(n) if n == other)
    }
}

impl PartialEq<bool> for Value {
    fn eq(&self, other: &bool) -> bool {
        self.as_bool() == Some(*other)
    }
}

impl PartialEq<&str> for Value {
    fn eq(&self, other: &&str) -> bool {
        self.as_str() == Some(*other)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_yaml_scalars() {
        let value = Value::from_yaml(serde_yaml::from_str("5").unwrap());
        assert_eq!(value, Value::Integer(5));

        let value = Value::from_yaml(serde_yaml::from_str("5.5").unwrap());
        assert_eq!(value, Value::Float(5.5));

        let value = Value::from_yaml(serde_yaml::from_str("~").unwrap());
        assert!(value.is_null());
    }

    #[test]
    fn test_from_yaml_preserves_key_order() {
        let yaml = "zebra: 1\napple: 2\nmango: 3\n";
        let value = Value::from_yaml(serde_yaml::from_str(yaml).unwrap());
        let keys: Vec<_> = value.as_mapping().unwrap().keys().cloned().collect();
        assert_eq!(keys, vec!["zebra", "apple", "mango"]);
    }

    #[test]
    fn test_from_yaml_stringifies_scalar_keys() {
        let yaml = "1: one\ntrue: yes\n";
        let value = Value::from_yaml(serde_yaml::from_str(yaml).unwrap());
        let map = value.as_mapping().unwrap();
        assert!(map.contains_key("1"));
        assert!(map.contains_key("true"));
    }

    #[test]
    fn test_display() {
        let mut map = Map::new();
        map.insert("foo".into(), Value::Sequence(vec![1.into(), "x".into()]));
        assert_eq!(Value::Mapping(map).to_string(), "{foo: [1, 'x']}");
    }
}

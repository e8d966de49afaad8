//! Validated configuration values.

use std::ops::Index;
use std::path::{Path, PathBuf};

use indexmap::IndexMap;

use crate::error::ConfigError;
use crate::value::Value;

/// The outcome of validating a view against a template.
///
/// Mapping templates produce a [`Record`](Resolved::Record): an immutable
/// result keyed by exactly the fields the template declared. Looking up a
/// key that exists in the configuration but was never declared is a
/// [`ConfigError::KeyNotDeclared`], distinct from a missing value.
#[derive(Debug, Clone, PartialEq)]
pub enum Resolved {
    /// A converted scalar, sequence-of-strings or replacement value.
    Value(Value),
    /// A resolved, absolute filename.
    Path(PathBuf),
    /// The fields declared by a mapping template, in declaration order.
    Record {
        /// The view the record was validated from, for error messages.
        name: String,
        /// Field name to resolved value.
        fields: IndexMap<String, Resolved>,
    },
    /// Elements validated by a sequence template.
    Sequence(Vec<Resolved>),
}

impl Resolved {
    /// Look up a declared field of a record.
    pub fn get(&self, key: &str) -> Result<&Resolved, ConfigError> {
        match self {
            Resolved::Record { name, fields } => {
                fields.get(key).ok_or_else(|| ConfigError::KeyNotDeclared {
                    name: name.clone(),
                    key: key.to_string(),
                })
            }
            other => Err(ConfigError::type_mismatch(
                "validated result",
                "a record",
                other.describe(),
            )),
        }
    }

    /// The declared field names of a record, in declaration order.
    pub fn keys(&self) -> Vec<&str> {
        match self {
            Resolved::Record { fields, .. } => fields.keys().map(String::as_str).collect(),
            _ => Vec::new(),
        }
    }

    /// The underlying value, if this is a plain value.
    pub fn as_value(&self) -> Option<&Value> {
        match self {
            Resolved::Value(value) => Some(value),
            _ => None,
        }
    }

    /// The boolean payload, if any.
    pub fn as_bool(&self) -> Option<bool> {
        self.as_value().and_then(Value::as_bool)
    }

    /// The integer payload, if any.
    pub fn as_i64(&self) -> Option<i64> {
        self.as_value().and_then(Value::as_i64)
    }

    /// The numeric payload widened to a float, if any.
    pub fn as_f64(&self) -> Option<f64> {
        self.as_value().and_then(Value::as_f64)
    }

    /// The string payload, if any.
    pub fn as_str(&self) -> Option<&str> {
        self.as_value().and_then(Value::as_str)
    }

    /// The resolved filename, if this came from a filename template.
    pub fn as_path(&self) -> Option<&Path> {
        match self {
            Resolved::Path(path) => Some(path),
            _ => None,
        }
    }

    /// The validated elements, if this came from a sequence template.
    pub fn as_sequence(&self) -> Option<&[Resolved]> {
        match self {
            Resolved::Sequence(items) => Some(items),
            _ => None,
        }
    }

    fn describe(&self) -> &'static str {
        match self {
            Resolved::Value(_) => "a value",
            Resolved::Path(_) => "a path",
            Resolved::Record { .. } => "a record",
            Resolved::Sequence(_) => "a sequence",
        }
    }
}

/// Panicking field access for ergonomic use in application setup code,
/// mirroring [`Resolved::get`]. Panics on undeclared keys.
impl Index<&str> for Resolved {
    type Output = Resolved;

    fn index(&self, key: &str) -> &Resolved {
        match self.get(key) {
            Ok(found) => found,
            Err(err) => panic!("{err}"),
        }
    }
}

impl PartialEq<i64> for Resolved {
    fn eq(&self, other: &i64) -> bool {
        self.as_i64() == Some(*other)
    }
}

impl PartialEq<f64> for Resolved {
    fn eq(&self, other: &f64) -> bool {
        matches!(self.as_value(), Some(Value::Float(n)) if n == other)
    }
}

impl PartialEq<bool> for Resolved {
    fn eq(&self, other: &bool) -> bool {
        self.as_bool() == Some(*other)
    }
}

impl PartialEq<&str> for Resolved {
    fn eq(&self, other: &&str) -> bool {
        self.as_str() == Some(*other)
    }
}

impl PartialEq<Value> for Resolved {
    fn eq(&self, other: &Value) -> bool {
        self.as_value() == Some(other)
    }
}

impl From<Value> for Resolved {
    fn from(value: Value) -> Self {
        Resolved::Value(value)
    }
}

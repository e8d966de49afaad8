//! Declarative templates: expected shape, default, and conversion rule
//! for a configuration path.
//!
//! Templates form a closed set of variants rather than an open trait
//! hierarchy; new shapes are added by extending the enum. A template is
//! stateless and reusable: validation reads through a [`View`] each
//! time, so it always observes the current overlay and sources.

use std::path::{Component, Path, PathBuf};

use indexmap::IndexMap;
use regex_lite::Regex;

use crate::error::ConfigError;
use crate::resolved::Resolved;
use crate::value::{Kind, Value};
use crate::view::{Origin, View};

/// A validation unit for one configuration path.
///
/// Every variant carries a `default`: `None` means the value is
/// required, while `Some(Value::Null)` declares an explicit null
/// default, a distinct case. Defaults are used only when no source
/// defines the path at all, never to recover from a type or value
/// failure.
#[derive(Debug, Clone)]
pub enum Template {
    /// Accept any present value verbatim.
    Any {
        /// Value to use when the path is absent everywhere.
        default: Option<Value>,
    },
    /// A boolean.
    Bool {
        /// Value to use when the path is absent everywhere.
        default: Option<Value>,
    },
    /// An integer. Float candidates are accepted by truncation.
    Integer {
        /// Value to use when the path is absent everywhere.
        default: Option<Value>,
    },
    /// Any number, preserving the candidate's integer or float flavor.
    Number {
        /// Value to use when the path is absent everywhere.
        default: Option<Value>,
    },
    /// A string, optionally constrained by a pattern.
    Str {
        /// Value to use when the path is absent everywhere.
        default: Option<Value>,
        /// Pattern the candidate must match.
        pattern: Option<Regex>,
    },
    /// One of a fixed set of allowed values.
    Choice {
        /// The allowed values.
        choices: Vec<Value>,
        /// Value to use when the path is absent everywhere.
        default: Option<Value>,
    },
    /// One of a fixed set of allowed values, each mapped to a
    /// replacement that is returned instead of the raw candidate.
    ChoiceMap {
        /// Allowed value to replacement pairs.
        choices: Vec<(Value, Value)>,
        /// Value to use when the path is absent everywhere.
        default: Option<Value>,
    },
    /// The first alternative that validates the candidate wins.
    OneOf {
        /// Alternatives, tried strictly in declared order.
        alternatives: Vec<Template>,
        /// Value to use when the path is absent everywhere.
        default: Option<Value>,
    },
    /// A sequence of strings, or a single string split on whitespace.
    StrSeq {
        /// Split a lone string candidate on runs of whitespace. When
        /// false, a string candidate becomes a one-element sequence.
        split: bool,
        /// Value to use when the path is absent everywhere.
        default: Option<Value>,
    },
    /// A filename, resolved to an absolute path.
    Filename {
        /// Explicit base directory, overriding every other resolution
        /// rule including `relative_to`.
        cwd: Option<PathBuf>,
        /// Sibling key (in the same mapping template) whose resolved
        /// filename becomes the base directory.
        relative_to: Option<String>,
        /// Value to use when the path is absent everywhere, returned
        /// unresolved.
        default: Option<Value>,
    },
    /// A homogeneous sequence validated element by element.
    Seq {
        /// Template every element must satisfy.
        element: Box<Template>,
        /// Value to use when the path is absent everywhere.
        default: Option<Value>,
    },
    /// A mapping with a declared subtemplate per key. Undeclared keys
    /// in the configuration are ignored and inaccessible through the
    /// validated result.
    Mapping {
        /// Declared field name to subtemplate.
        fields: IndexMap<String, Template>,
    },
    /// Any value of a given shape, unconverted.
    TypeIs {
        /// The required shape.
        kind: Kind,
        /// Value to use when the path is absent everywhere.
        default: Option<Value>,
    },
}

impl Template {
    /// Accept anything, required.
    pub fn any() -> Template {
        Template::Any { default: None }
    }

    /// A required boolean.
    pub fn boolean() -> Template {
        Template::Bool { default: None }
    }

    /// A required integer.
    pub fn integer() -> Template {
        Template::Integer { default: None }
    }

    /// A required number of either flavor.
    pub fn number() -> Template {
        Template::Number { default: None }
    }

    /// A required string.
    pub fn string() -> Template {
        Template::Str {
            default: None,
            pattern: None,
        }
    }

    /// A required string matching a pattern.
    ///
    /// An unparseable pattern is a template-definition error: the
    /// schema itself is malformed, independent of any input.
    pub fn pattern(pattern: &str) -> Result<Template, ConfigError> {
        let compiled = Regex::new(pattern)
            .map_err(|err| ConfigError::template(format!("invalid pattern /{pattern}/: {err}")))?;
        Ok(Template::Str {
            default: None,
            pattern: Some(compiled),
        })
    }

    /// A required member of a fixed set of values.
    pub fn choice(choices: impl IntoIterator<Item = impl Into<Value>>) -> Template {
        Template::Choice {
            choices: choices.into_iter().map(Into::into).collect(),
            default: None,
        }
    }

    /// A required member of a fixed set, replaced by its mapped value.
    pub fn choice_map(
        choices: impl IntoIterator<Item = (impl Into<Value>, impl Into<Value>)>,
    ) -> Template {
        Template::ChoiceMap {
            choices: choices
                .into_iter()
                .map(|(allowed, replacement)| (allowed.into(), replacement.into()))
                .collect(),
            default: None,
        }
    }

    /// The first of several alternatives to validate wins.
    pub fn one_of(alternatives: impl IntoIterator<Item = impl Into<Shorthand>>) -> Template {
        Template::OneOf {
            alternatives: alternatives.into_iter().map(as_template).collect(),
            default: None,
        }
    }

    /// A sequence of strings, splitting a lone string on whitespace.
    pub fn str_seq() -> Template {
        Template::StrSeq {
            split: true,
            default: None,
        }
    }

    /// A required filename resolved to an absolute path.
    pub fn filename() -> Template {
        Template::Filename {
            cwd: None,
            relative_to: None,
            default: None,
        }
    }

    /// A homogeneous sequence whose elements satisfy a template.
    pub fn sequence(element: impl Into<Shorthand>) -> Template {
        Template::Seq {
            element: Box::new(as_template(element)),
            default: None,
        }
    }

    /// A mapping of declared keys to subtemplates.
    pub fn mapping(
        fields: impl IntoIterator<Item = (impl Into<String>, impl Into<Shorthand>)>,
    ) -> Template {
        Template::Mapping {
            fields: fields
                .into_iter()
                .map(|(key, spec)| (key.into(), as_template(spec)))
                .collect(),
        }
    }

    /// A required value of the given shape, unconverted.
    pub fn type_is(kind: Kind) -> Template {
        Template::TypeIs {
            kind,
            default: None,
        }
    }

    /// Declare a default, making this template optional.
    ///
    /// Has no effect on mapping templates, whose fields carry their
    /// own defaults.
    pub fn with_default(mut self, value: impl Into<Value>) -> Template {
        if let Some(slot) = self.default_slot() {
            *slot = Some(value.into());
        }
        self
    }

    /// Resolve a lone string candidate as a single-element sequence
    /// instead of splitting it on whitespace.
    ///
    /// Has effect only on [`Template::StrSeq`].
    pub fn no_split(mut self) -> Template {
        if let Template::StrSeq { split, .. } = &mut self {
            *split = false;
        }
        self
    }

    /// Resolve relative filename candidates against this directory.
    ///
    /// Has effect only on [`Template::Filename`].
    pub fn in_dir(mut self, dir: impl Into<PathBuf>) -> Template {
        if let Template::Filename { cwd, .. } = &mut self {
            *cwd = Some(dir.into());
        }
        self
    }

    /// Resolve relative filename candidates against the resolved value
    /// of a sibling key in the enclosing mapping template.
    ///
    /// Has effect only on [`Template::Filename`].
    pub fn relative_to(mut self, key: impl Into<String>) -> Template {
        if let Template::Filename { relative_to, .. } = &mut self {
            *relative_to = Some(key.into());
        }
        self
    }

    /// The declared default, if any. `None` means required.
    pub fn default(&self) -> Option<&Value> {
        match self {
            Template::Any { default }
            | Template::Bool { default }
            | Template::Integer { default }
            | Template::Number { default }
            | Template::Str { default, .. }
            | Template::Choice { default, .. }
            | Template::ChoiceMap { default, .. }
            | Template::OneOf { default, .. }
            | Template::StrSeq { default, .. }
            | Template::Filename { default, .. }
            | Template::Seq { default, .. }
            | Template::TypeIs { default, .. } => default.as_ref(),
            Template::Mapping { .. } => None,
        }
    }

    fn default_slot(&mut self) -> Option<&mut Option<Value>> {
        match self {
            Template::Any { default }
            | Template::Bool { default }
            | Template::Integer { default }
            | Template::Number { default }
            | Template::Str { default, .. }
            | Template::Choice { default, .. }
            | Template::ChoiceMap { default, .. }
            | Template::OneOf { default, .. }
            | Template::StrSeq { default, .. }
            | Template::Filename { default, .. }
            | Template::Seq { default, .. }
            | Template::TypeIs { default, .. } => Some(default),
            Template::Mapping { .. } => None,
        }
    }

    /// Validate and convert the value at a view.
    ///
    /// The highest-priority source that defines the path wins; sources
    /// are never deep-merged below the leaf level. An absent path
    /// resolves to the declared default, or fails with
    /// [`ConfigError::NotFound`] if the template is required.
    pub fn validate(&self, view: &View) -> Result<Resolved, ConfigError> {
        self.validate_at(view, None)
    }

    fn validate_at(
        &self,
        view: &View,
        siblings: Option<&IndexMap<String, Template>>,
    ) -> Result<Resolved, ConfigError> {
        match self {
            Template::Any { default } => match take_first(view, default)? {
                FirstOr::Default(value) | FirstOr::Found(value, _) => Ok(Resolved::Value(value)),
            },

            Template::Bool { default } => match take_first(view, default)? {
                FirstOr::Default(value) => Ok(Resolved::Value(value)),
                FirstOr::Found(value @ Value::Bool(_), _) => Ok(Resolved::Value(value)),
                FirstOr::Found(other, _) => Err(mismatch(view, "a boolean", &other)),
            },

            Template::Integer { default } => match take_first(view, default)? {
                FirstOr::Default(value) => Ok(Resolved::Value(value)),
                FirstOr::Found(value @ Value::Integer(_), _) => Ok(Resolved::Value(value)),
                FirstOr::Found(Value::Float(f), _) => Ok(Resolved::Value(Value::Integer(f as i64))),
                FirstOr::Found(other, _) => Err(mismatch(view, "an integer", &other)),
            },

            Template::Number { default } => match take_first(view, default)? {
                FirstOr::Default(value) => Ok(Resolved::Value(value)),
                FirstOr::Found(value @ (Value::Integer(_) | Value::Float(_)), _) => {
                    Ok(Resolved::Value(value))
                }
                FirstOr::Found(other, _) => Err(mismatch(view, "a number", &other)),
            },

            Template::Str { default, pattern } => match take_first(view, default)? {
                FirstOr::Default(value) => Ok(Resolved::Value(value)),
                FirstOr::Found(Value::String(s), _) => match pattern {
                    Some(pattern) if !pattern.is_match(&s) => Err(ConfigError::invalid(
                        view.name(),
                        Value::String(s),
                        format!("must match /{}/", pattern.as_str()),
                    )),
                    _ => Ok(Resolved::Value(Value::String(s))),
                },
                FirstOr::Found(other, _) => Err(mismatch(view, "a string", &other)),
            },

            Template::Choice { choices, default } => match take_first(view, default)? {
                FirstOr::Default(value) => Ok(Resolved::Value(value)),
                FirstOr::Found(value, _) => {
                    if choices.contains(&value) {
                        Ok(Resolved::Value(value))
                    } else {
                        Err(ConfigError::invalid(
                            view.name(),
                            value,
                            format!("must be one of {}", Value::Sequence(choices.clone())),
                        ))
                    }
                }
            },

            Template::ChoiceMap { choices, default } => match take_first(view, default)? {
                FirstOr::Default(value) => Ok(Resolved::Value(value)),
                FirstOr::Found(value, _) => {
                    match choices.iter().find(|(allowed, _)| *allowed == value) {
                        Some((_, replacement)) => Ok(Resolved::Value(replacement.clone())),
                        None => {
                            let allowed: Vec<Value> =
                                choices.iter().map(|(allowed, _)| allowed.clone()).collect();
                            Err(ConfigError::invalid(
                                view.name(),
                                value,
                                format!("must be one of {}", Value::Sequence(allowed)),
                            ))
                        }
                    }
                }
            },

            Template::OneOf {
                alternatives,
                default,
            } => match take_first(view, default)? {
                FirstOr::Default(value) => Ok(Resolved::Value(value)),
                FirstOr::Found(candidate, _) => {
                    for alternative in alternatives {
                        match alternative.validate_at(view, siblings) {
                            Ok(resolved) => return Ok(resolved),
                            // A malformed alternative is a schema bug,
                            // not a value that failed to match.
                            Err(err @ ConfigError::Template { .. }) => return Err(err),
                            Err(_) => continue,
                        }
                    }
                    Err(ConfigError::invalid(
                        view.name(),
                        candidate,
                        format!("did not match any of {} alternatives", alternatives.len()),
                    ))
                }
            },

            Template::StrSeq { split, default } => match take_first(view, default)? {
                FirstOr::Default(value) => Ok(Resolved::Value(value)),
                FirstOr::Found(Value::String(s), _) => {
                    let items: Vec<Value> = if *split {
                        s.split_whitespace().map(Value::from).collect()
                    } else {
                        vec![Value::String(s)]
                    };
                    Ok(Resolved::Value(Value::Sequence(items)))
                }
                FirstOr::Found(Value::Sequence(items), _) => {
                    for item in &items {
                        if !matches!(item, Value::String(_)) {
                            return Err(mismatch(view, "a sequence of strings", item));
                        }
                    }
                    Ok(Resolved::Value(Value::Sequence(items)))
                }
                FirstOr::Found(other, _) => {
                    Err(mismatch(view, "a string or a sequence of strings", &other))
                }
            },

            Template::Filename {
                cwd,
                relative_to,
                default,
            } => validate_filename(view, siblings, cwd, relative_to, default),

            Template::Seq { element, default } => match take_first(view, default)? {
                FirstOr::Default(value) => Ok(Resolved::Value(value)),
                FirstOr::Found(Value::Sequence(items), _) => {
                    let mut resolved = Vec::with_capacity(items.len());
                    for index in 0..items.len() {
                        // Fail fast on the first invalid element.
                        resolved.push(element.validate(&view.at(index))?);
                    }
                    Ok(Resolved::Sequence(resolved))
                }
                FirstOr::Found(other, _) => Err(mismatch(view, "a sequence", &other)),
            },

            Template::Mapping { fields } => {
                // Structural check over the declared cross-references,
                // before any value is read: it must fire even when the
                // offending fields are never exercised by the data.
                check_relative_refs(fields)?;
                let mut out = IndexMap::new();
                for (key, template) in fields {
                    let field_view = view.at(key.as_str());
                    out.insert(key.clone(), template.validate_at(&field_view, Some(fields))?);
                }
                Ok(Resolved::Record {
                    name: view.name(),
                    fields: out,
                })
            }

            Template::TypeIs { kind, default } => match take_first(view, default)? {
                FirstOr::Default(value) => Ok(Resolved::Value(value)),
                FirstOr::Found(value, _) => {
                    if value.kind() == *kind {
                        Ok(Resolved::Value(value))
                    } else {
                        Err(mismatch(view, kind.description(), &value))
                    }
                }
            },
        }
    }
}

enum FirstOr<'a> {
    Found(Value, Origin<'a>),
    Default(Value),
}

fn take_first<'a>(view: &View<'a>, default: &Option<Value>) -> Result<FirstOr<'a>, ConfigError> {
    match view.first() {
        Ok((value, origin)) => Ok(FirstOr::Found(value, origin)),
        Err(ConfigError::NotFound { name }) => match default {
            Some(value) => Ok(FirstOr::Default(value.clone())),
            None => Err(ConfigError::NotFound { name }),
        },
        Err(err) => Err(err),
    }
}

fn mismatch(view: &View, expected: &str, actual: &Value) -> ConfigError {
    ConfigError::type_mismatch(view.name(), expected, actual.kind().description())
}

/// Walk the `relative_to` references declared by a mapping template.
///
/// Purely structural: a reference to an undeclared sibling, a sibling
/// that is not a filename template, a self-reference, or any cycle is
/// rejected here regardless of what the configuration data contains.
/// Templates with an explicit working directory are exempt, since the
/// directory override disables sibling resolution entirely.
fn check_relative_refs(fields: &IndexMap<String, Template>) -> Result<(), ConfigError> {
    for (name, template) in fields {
        let Template::Filename {
            cwd: None,
            relative_to: Some(first),
            ..
        } = template
        else {
            continue;
        };

        let mut seen: Vec<&str> = vec![name.as_str()];
        let mut target = first.as_str();
        loop {
            if seen.contains(&target) {
                return Err(ConfigError::template(format!(
                    "circular relative_to reference through '{target}'"
                )));
            }
            let Some(next) = fields.get(target) else {
                return Err(ConfigError::template(format!(
                    "'{name}' is relative to '{target}', which is not declared"
                )));
            };
            let Template::Filename {
                cwd, relative_to, ..
            } = next
            else {
                return Err(ConfigError::template(format!(
                    "'{name}' is relative to '{target}', which is not a filename template"
                )));
            };
            seen.push(target);
            match (cwd, relative_to) {
                (None, Some(next_target)) => target = next_target.as_str(),
                _ => break,
            }
        }
    }
    Ok(())
}

fn validate_filename(
    view: &View,
    siblings: Option<&IndexMap<String, Template>>,
    cwd: &Option<PathBuf>,
    relative_to: &Option<String>,
    default: &Option<Value>,
) -> Result<Resolved, ConfigError> {
    let (value, origin) = match take_first(view, default)? {
        FirstOr::Default(value) => return Ok(Resolved::Value(value)),
        FirstOr::Found(value, origin) => (value, origin),
    };
    let Some(raw) = value.as_str() else {
        return Err(mismatch(view, "a filename", &value));
    };

    let mut path = expand_home(raw);
    if path.is_relative() {
        let base = if let Some(dir) = cwd {
            dir.clone()
        } else if let Some(target) = relative_to {
            sibling_base(view, siblings, target)?
        } else {
            source_base(view, origin)
        };
        path = base.join(path);
    }
    Ok(Resolved::Path(normalize(&path)))
}

/// Resolve the sibling named by `relative_to` through the same template
/// set and use its resolved filename as the base directory.
fn sibling_base(
    view: &View,
    siblings: Option<&IndexMap<String, Template>>,
    target: &str,
) -> Result<PathBuf, ConfigError> {
    let Some(siblings) = siblings else {
        return Err(ConfigError::template(format!(
            "{} is relative to '{target}' but has no sibling templates",
            view.name()
        )));
    };
    let Some(sibling) = siblings.get(target) else {
        return Err(ConfigError::template(format!(
            "relative_to target '{target}' is not declared"
        )));
    };
    let Some(parent) = view.parent() else {
        return Err(ConfigError::template(format!(
            "{} is relative to '{target}' but has no enclosing mapping",
            view.name()
        )));
    };
    match sibling.validate_at(&parent.at(target), Some(siblings))? {
        Resolved::Path(base) => Ok(base),
        Resolved::Value(Value::String(s)) => Ok(expand_home(&s)),
        _ => Err(ConfigError::template(format!(
            "relative_to target '{target}' did not resolve to a filename"
        ))),
    }
}

/// Base directory derived from the source that produced the candidate:
/// a packaged-defaults file resolves beside itself, a user file
/// resolves in the configuration directory, and anything else resolves
/// in the process working directory.
fn source_base(view: &View, origin: Origin<'_>) -> PathBuf {
    if let Origin::Source(source) = origin {
        if let Some(file) = source.path() {
            if source.is_default() {
                if let Some(dir) = file.parent() {
                    return dir.to_path_buf();
                }
            } else if let Some(dir) = view.root().base_dir() {
                return dir.to_path_buf();
            }
        }
    }
    std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."))
}

fn expand_home(raw: &str) -> PathBuf {
    if let Some(rest) = raw.strip_prefix("~/").or_else(|| raw.strip_prefix("~\\")) {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest);
        }
    } else if raw == "~" {
        if let Some(home) = dirs::home_dir() {
            return home;
        }
    }
    PathBuf::from(raw)
}

/// Lexically normalize a path: drop `.` components and fold `..` into
/// their parent. The path need not exist, so symbolic links are not
/// consulted. Leading `..` is kept for relative inputs and discarded
/// once a root is reached, since the root is its own parent.
fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    let mut depth = 0usize;
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if depth > 0 {
                    out.pop();
                    depth -= 1;
                } else if !out.has_root() {
                    out.push(component.as_os_str());
                }
            }
            Component::Normal(part) => {
                out.push(part);
                depth += 1;
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

/// Shorthand forms accepted wherever a template is expected.
///
/// This is the closed set of literal shapes that [`as_template`]
/// derives templates from; the derivation table lives in one exhaustive
/// match rather than open-ended runtime inspection.
#[derive(Debug, Clone)]
pub enum Shorthand {
    /// No declaration at all: accept anything, required.
    Absent,
    /// A bare shape reference, e.g. "an integer": the matching typed
    /// template, required.
    Kind(Kind),
    /// A concrete value: the matching typed template with that value
    /// as its default.
    Value(Value),
    /// A set of allowed values: a choice template.
    Set(Vec<Value>),
    /// A sequence of alternatives: a first-match template, required.
    Seq(Vec<Shorthand>),
    /// A mapping literal: a mapping template with recursively derived
    /// fields.
    Map(Vec<(String, Shorthand)>),
    /// An already-built template, passed through unchanged.
    Template(Template),
}

/// Derive a concrete [`Template`] from a shorthand shape.
pub fn as_template(spec: impl Into<Shorthand>) -> Template {
    match spec.into() {
        Shorthand::Absent => Template::any(),
        Shorthand::Kind(kind) => match kind {
            Kind::Bool => Template::boolean(),
            Kind::Integer => Template::integer(),
            Kind::Float => Template::number(),
            Kind::String => Template::string(),
            Kind::Null | Kind::Sequence | Kind::Mapping => Template::type_is(kind),
        },
        Shorthand::Value(value) => match value {
            Value::Null => Template::any(),
            Value::Bool(_) => Template::Bool {
                default: Some(value),
            },
            Value::Integer(_) => Template::Integer {
                default: Some(value),
            },
            Value::Float(_) => Template::Number {
                default: Some(value),
            },
            Value::String(_) => Template::Str {
                default: Some(value),
                pattern: None,
            },
            Value::Sequence(_) => Template::TypeIs {
                kind: Kind::Sequence,
                default: Some(value),
            },
            Value::Mapping(_) => Template::TypeIs {
                kind: Kind::Mapping,
                default: Some(value),
            },
        },
        Shorthand::Set(values) => Template::Choice {
            choices: values,
            default: None,
        },
        Shorthand::Seq(items) => Template::OneOf {
            alternatives: items.into_iter().map(as_template).collect(),
            default: None,
        },
        Shorthand::Map(fields) => Template::Mapping {
            fields: fields
                .into_iter()
                .map(|(key, spec)| (key, as_template(spec)))
                .collect(),
        },
        Shorthand::Template(template) => template,
    }
}

impl From<Template> for Shorthand {
    fn from(template: Template) -> Self {
        Shorthand::Template(template)
    }
}

impl From<Kind> for Shorthand {
    fn from(kind: Kind) -> Self {
        Shorthand::Kind(kind)
    }
}

impl From<Value> for Shorthand {
    fn from(value: Value) -> Self {
        Shorthand::Value(value)
    }
}

impl From<bool> for Shorthand {
    fn from(b: bool) -> Self {
        Shorthand::Value(b.into())
    }
}

impl From<i64> for Shorthand {
    fn from(n: i64) -> Self {
        Shorthand::Value(n.into())
    }
}

impl From<i32> for Shorthand {
    fn from(n: i32) -> Self {
        Shorthand::Value(n.into())
    }
}

impl From<f64> for Shorthand {
    fn from(n: f64) -> Self {
        Shorthand::Value(n.into())
    }
}

impl From<&str> for Shorthand {
    fn from(s: &str) -> Self {
        Shorthand::Value(s.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bare_kind_is_required() {
        let template = as_template(Kind::Integer);
        assert!(matches!(template, Template::Integer { default: None }));

        let template = as_template(Kind::String);
        assert!(matches!(
            template,
            Template::Str {
                default: None,
                pattern: None
            }
        ));

        let template = as_template(Kind::Float);
        assert!(matches!(template, Template::Number { default: None }));
    }

    #[test]
    fn test_concrete_value_becomes_default() {
        let template = as_template(2);
        assert!(matches!(template, Template::Integer { .. }));
        assert_eq!(template.default(), Some(&Value::Integer(2)));

        let template = as_template("foo");
        assert!(matches!(template, Template::Str { .. }));
        assert_eq!(template.default(), Some(&Value::String("foo".into())));
    }

    #[test]
    fn test_null_shorthand_is_required_any() {
        let template = as_template(Value::Null);
        assert!(matches!(template, Template::Any { default: None }));

        let template = as_template(Shorthand::Absent);
        assert!(matches!(template, Template::Any { default: None }));
    }

    #[test]
    fn test_sequence_shorthand_is_one_of() {
        let template = as_template(Shorthand::Seq(vec![]));
        assert!(matches!(template, Template::OneOf { default: None, .. }));
    }

    #[test]
    fn test_set_shorthand_is_choice() {
        let template = as_template(Shorthand::Set(vec![1.into(), 2.into()]));
        assert!(matches!(template, Template::Choice { .. }));
    }

    #[test]
    fn test_map_shorthand_derives_fields_recursively() {
        let template = as_template(Shorthand::Map(vec![(
            "outer".into(),
            Shorthand::Map(vec![("inner".into(), 2.into())]),
        )]));
        let Template::Mapping { fields } = template else {
            panic!("expected mapping template");
        };
        let Template::Mapping { fields: inner } = &fields["outer"] else {
            panic!("expected nested mapping template");
        };
        assert_eq!(inner["inner"].default(), Some(&Value::Integer(2)));
    }

    #[test]
    fn test_collection_kinds_are_type_checks() {
        assert!(matches!(
            as_template(Kind::Mapping),
            Template::TypeIs {
                kind: Kind::Mapping,
                default: None
            }
        ));
        assert!(matches!(
            as_template(Kind::Sequence),
            Template::TypeIs {
                kind: Kind::Sequence,
                default: None
            }
        ));
    }

    #[test]
    fn test_template_passthrough() {
        let original = Template::integer().with_default(7);
        let derived = as_template(original.clone());
        assert_eq!(derived.default(), original.default());
    }

    #[test]
    fn test_invalid_pattern_is_template_error() {
        let err = Template::pattern("(unclosed").unwrap_err();
        assert!(matches!(err, ConfigError::Template { .. }));
    }

    #[test]
    fn test_normalize_folds_dots() {
        assert_eq!(
            normalize(Path::new("/a/b/../c/./d")),
            PathBuf::from("/a/c/d")
        );
        // Climbing above the root stays at the root.
        assert_eq!(normalize(Path::new("/../x")), PathBuf::from("/x"));
        assert_eq!(normalize(Path::new("/a/../../../x")), PathBuf::from("/x"));
        // Excess parent steps on a relative path are legitimate.
        assert_eq!(normalize(Path::new("a/../../b")), PathBuf::from("../b"));
    }

    #[test]
    fn test_relative_ref_chain_ok() {
        let Template::Mapping { fields } = Template::mapping([
            ("base", Template::filename()),
            ("log", Template::filename().relative_to("base")),
        ]) else {
            unreachable!()
        };
        assert!(check_relative_refs(&fields).is_ok());
    }

    #[test]
    fn test_relative_ref_cycle_detected_from_every_entry() {
        let Template::Mapping { fields } = Template::mapping([
            ("foo", Template::filename().relative_to("bar")),
            ("bar", Template::filename().relative_to("baz")),
            ("baz", Template::filename().relative_to("foo")),
        ]) else {
            unreachable!()
        };
        assert!(matches!(
            check_relative_refs(&fields),
            Err(ConfigError::Template { .. })
        ));
    }
}

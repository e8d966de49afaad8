//! Lazy views over prioritized configuration sources.
//!
//! A view is a symbolic path into the composed configuration tree. It
//! holds no data of its own: every read walks the overlay and every
//! source again, so a write through any view is observed by the next
//! read with no cache to invalidate.

use std::cell::RefCell;
use std::fmt;
use std::path::{Path, PathBuf};

use indexmap::IndexSet;

use crate::error::ConfigError;
use crate::resolved::Resolved;
use crate::source::Source;
use crate::template::{as_template, Shorthand};
use crate::value::{Kind, Map, Value};

/// One step of a traversal path: a mapping key or a sequence index.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Key {
    /// A mapping key.
    Name(String),
    /// A sequence index.
    Index(usize),
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Key::Name(name) => write!(f, "['{name}']"),
            Key::Index(index) => write!(f, "[{index}]"),
        }
    }
}

impl From<&str> for Key {
    fn from(name: &str) -> Self {
        Key::Name(name.to_string())
    }
}

impl From<String> for Key {
    fn from(name: String) -> Self {
        Key::Name(name)
    }
}

impl From<usize> for Key {
    fn from(index: usize) -> Self {
        Key::Index(index)
    }
}

fn render_name(path: &[Key]) -> String {
    let mut name = String::from("root");
    for key in path {
        name.push_str(&key.to_string());
    }
    name
}

/// The base of a view hierarchy: an ordered source list plus the
/// mutable overlay.
///
/// The first source has the highest priority among sources; the overlay
/// always outranks them all. Reads are reentrant and side-effect free;
/// mutation (`add`, writes through [`View::set`]) requires external
/// synchronization if shared across threads.
#[derive(Debug)]
pub struct RootView {
    sources: Vec<Source>,
    overlay: RefCell<Value>,
    base_dir: Option<PathBuf>,
}

impl RootView {
    /// Create a view hierarchy over a list of sources, highest priority
    /// first.
    pub fn new(sources: Vec<Source>) -> RootView {
        RootView {
            sources,
            overlay: RefCell::new(Value::Mapping(Map::new())),
            base_dir: None,
        }
    }

    /// Append a source with the lowest priority.
    ///
    /// Useful for dynamically extending defaults, e.g. a plugin sharing
    /// the host application's configuration.
    pub fn add(&mut self, source: Source) {
        self.sources.push(source);
    }

    /// Insert a source just below the overlay, above every other source.
    pub fn add_override(&mut self, source: Source) {
        self.sources.insert(0, source);
    }

    /// The current sources, highest priority first.
    pub fn sources(&self) -> &[Source] {
        &self.sources
    }

    /// The view at the root of the composed tree.
    pub fn view(&self) -> View<'_> {
        View {
            root: self,
            path: Vec::new(),
        }
    }

    /// Shorthand for `view().at(key)`.
    pub fn at(&self, key: impl Into<Key>) -> View<'_> {
        self.view().at(key)
    }

    /// Record the user configuration directory used as the base for
    /// relative filename templates resolved from user file sources.
    pub fn set_base_dir(&mut self, dir: impl Into<PathBuf>) {
        self.base_dir = Some(dir.into());
    }

    /// The recorded user configuration directory, if any.
    pub fn base_dir(&self) -> Option<&Path> {
        self.base_dir.as_deref()
    }
}

impl Default for RootView {
    fn default() -> Self {
        RootView::new(Vec::new())
    }
}

/// Which layer produced a candidate value.
#[derive(Debug, Clone, Copy)]
pub(crate) enum Origin<'a> {
    /// The runtime overlay.
    Overlay,
    /// One of the read-only sources.
    Source(&'a Source),
}

/// A symbolic path into the composed configuration tree.
///
/// Views are cheap to construct and safe to discard; subscripting with
/// [`at`](View::at) never touches the data. Obtain one from
/// [`RootView::view`] or [`Configuration`](crate::Configuration).
#[derive(Debug, Clone)]
pub struct View<'a> {
    root: &'a RootView,
    path: Vec<Key>,
}

impl<'a> View<'a> {
    /// The human-readable path of this view, e.g. `root['foo'][2]`.
    pub fn name(&self) -> String {
        render_name(&self.path)
    }

    /// The root this view resolves against.
    pub fn root(&self) -> &'a RootView {
        self.root
    }

    /// The subview for a key or index under this view.
    pub fn at(&self, key: impl Into<Key>) -> View<'a> {
        let mut path = self.path.clone();
        path.push(key.into());
        View {
            root: self.root,
            path,
        }
    }

    /// The enclosing view, or `None` at the root.
    pub fn parent(&self) -> Option<View<'a>> {
        if self.path.is_empty() {
            return None;
        }
        let mut path = self.path.clone();
        path.pop();
        Some(View {
            root: self.root,
            path,
        })
    }

    /// All candidate values for this view, in priority order.
    ///
    /// The overlay is walked first, then each source. A source that
    /// simply does not define this path contributes nothing; a source
    /// whose value at a path prefix is not indexable yields a
    /// [`ConfigError::TypeMismatch`] naming the offending prefix.
    pub fn get_all(&self) -> Candidates<'a> {
        Candidates {
            root: self.root,
            path: self.path.clone(),
            layer: 0,
        }
    }

    /// The first candidate together with the source that produced it.
    pub(crate) fn first(&self) -> Result<(Value, Origin<'a>), ConfigError> {
        let mut candidates = self.get_all();
        match candidates.next_with_origin() {
            Some(Ok(found)) => Ok(found),
            Some(Err(err)) => Err(err),
            None => Err(ConfigError::NotFound { name: self.name() }),
        }
    }

    /// The canonical value for this view: the first candidate of
    /// [`get_all`](View::get_all), or [`ConfigError::NotFound`].
    pub fn get(&self) -> Result<Value, ConfigError> {
        self.first().map(|(value, _)| value)
    }

    /// The value for this view as a boolean.
    pub fn get_bool(&self) -> Result<bool, ConfigError> {
        let value = self.get()?;
        value
            .as_bool()
            .ok_or_else(|| self.type_mismatch(Kind::Bool, &value))
    }

    /// The value for this view as a string.
    pub fn get_str(&self) -> Result<String, ConfigError> {
        let value = self.get()?;
        match value {
            Value::String(s) => Ok(s),
            other => Err(self.type_mismatch(Kind::String, &other)),
        }
    }

    /// The value for this view as an integer.
    pub fn get_i64(&self) -> Result<i64, ConfigError> {
        let value = self.get()?;
        value
            .as_i64()
            .ok_or_else(|| self.type_mismatch(Kind::Integer, &value))
    }

    /// The value for this view as a float, widening integers.
    pub fn get_f64(&self) -> Result<f64, ConfigError> {
        let value = self.get()?;
        value
            .as_f64()
            .ok_or_else(|| self.type_mismatch(Kind::Float, &value))
    }

    /// The union of the keys of every mapping candidate at this view,
    /// in priority order.
    ///
    /// This enumerates the keys of *all* mappings matching the view, in
    /// contrast to `get()?.as_mapping()`, which sees only the first.
    pub fn keys(&self) -> Result<Vec<String>, ConfigError> {
        let mut keys: IndexSet<String> = IndexSet::new();
        for candidate in self.get_all() {
            let candidate = candidate?;
            let map = candidate
                .as_mapping()
                .ok_or_else(|| self.type_mismatch(Kind::Mapping, &candidate))?;
            for key in map.keys() {
                keys.insert(key.clone());
            }
        }
        Ok(keys.into_iter().collect())
    }

    /// `(key, subview)` pairs for every key of [`keys`](View::keys),
    /// re-derived on each call.
    pub fn items(&self) -> Result<Vec<(String, View<'a>)>, ConfigError> {
        Ok(self
            .keys()?
            .into_iter()
            .map(|key| {
                let subview = self.at(key.as_str());
                (key, subview)
            })
            .collect())
    }

    /// The subview for every key of [`keys`](View::keys).
    pub fn values(&self) -> Result<Vec<View<'a>>, ConfigError> {
        Ok(self.items()?.into_iter().map(|(_, view)| view).collect())
    }

    /// The concatenation, in priority order, of the elements of every
    /// sequence candidate at this view.
    pub fn all_contents(&self) -> Result<Vec<Value>, ConfigError> {
        let mut contents = Vec::new();
        for candidate in self.get_all() {
            let candidate = candidate?;
            match candidate {
                Value::Sequence(items) => contents.extend(items),
                other => return Err(self.type_mismatch(Kind::Sequence, &other)),
            }
        }
        Ok(contents)
    }

    /// Write a value into the overlay at this view's path.
    ///
    /// The overlay is the single highest-priority source, so the next
    /// read through any equivalent view observes this value. Missing
    /// intermediate nodes are created as mappings; conflicting scalar
    /// intermediates are replaced.
    pub fn set(&self, value: impl Into<Value>) -> Result<(), ConfigError> {
        let value = value.into();
        let mut overlay = self.root.overlay.borrow_mut();

        if self.path.is_empty() {
            if !matches!(value, Value::Mapping(_)) {
                return Err(ConfigError::type_mismatch(
                    self.name(),
                    Kind::Mapping.description(),
                    value.kind().description(),
                ));
            }
            *overlay = value;
            return Ok(());
        }

        let mut node = &mut *overlay;
        for (depth, key) in self.path.iter().enumerate() {
            let last = depth == self.path.len() - 1;
            match key {
                Key::Name(name) => {
                    if !matches!(node, Value::Mapping(_)) {
                        *node = Value::Mapping(Map::new());
                    }
                    let Value::Mapping(map) = node else {
                        unreachable!()
                    };
                    let entry = map.entry(name.clone()).or_insert(Value::Null);
                    if last {
                        *entry = value;
                        return Ok(());
                    }
                    node = entry;
                }
                Key::Index(index) => {
                    let Value::Sequence(items) = node else {
                        return Err(ConfigError::type_mismatch(
                            render_name(&self.path[..depth]),
                            Kind::Sequence.description(),
                            node.kind().description(),
                        ));
                    };
                    if *index == items.len() {
                        items.push(Value::Null);
                    }
                    let Some(entry) = items.get_mut(*index) else {
                        return Err(ConfigError::invalid(
                            render_name(&self.path[..depth]),
                            Value::Integer(*index as i64),
                            "overlay index out of range",
                        ));
                    };
                    if last {
                        *entry = value;
                        return Ok(());
                    }
                    node = entry;
                }
            }
        }
        unreachable!("loop returns on the last path segment")
    }

    /// Validate this view against a template shorthand.
    ///
    /// Accepts anything convertible to [`Shorthand`]: a full
    /// [`Template`](crate::Template), a bare [`Kind`], or a concrete
    /// default value.
    pub fn extract(&self, spec: impl Into<Shorthand>) -> Result<Resolved, ConfigError> {
        as_template(spec).validate(self)
    }

    fn type_mismatch(&self, expected: Kind, actual: &Value) -> ConfigError {
        ConfigError::type_mismatch(
            self.name(),
            expected.description(),
            actual.kind().description(),
        )
    }
}

/// Iterator over the candidate values of a view, lazily walking the
/// overlay and each source in priority order.
#[derive(Debug)]
pub struct Candidates<'a> {
    root: &'a RootView,
    path: Vec<Key>,
    // 0 is the overlay, 1..=sources.len() indexes sources.
    layer: usize,
}

impl<'a> Candidates<'a> {
    pub(crate) fn next_with_origin(
        &mut self,
    ) -> Option<Result<(Value, Origin<'a>), ConfigError>> {
        loop {
            let origin = if self.layer == 0 {
                Origin::Overlay
            } else {
                Origin::Source(self.root.sources.get(self.layer - 1)?)
            };
            self.layer += 1;

            let resolved = match origin {
                Origin::Overlay => {
                    let overlay = self.root.overlay.borrow();
                    descend(&overlay, &self.path).map(|found| found.cloned())
                }
                Origin::Source(source) => {
                    descend(source.data(), &self.path).map(|found| found.cloned())
                }
            };
            match resolved {
                Ok(Some(value)) => return Some(Ok((value, origin))),
                Ok(None) => continue,
                Err(err) => return Some(Err(err)),
            }
        }
    }
}

impl Iterator for Candidates<'_> {
    type Item = Result<Value, ConfigError>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_with_origin()
            .map(|found| found.map(|(value, _)| value))
    }
}

/// Walk one source tree along a path.
///
/// `Ok(None)` means the source simply does not define the path (absent
/// mapping key, out-of-range index). A value that cannot be indexed at
/// all raises a type mismatch naming the parent path: that source is
/// malformed relative to what the path shape expects.
fn descend<'v>(tree: &'v Value, path: &[Key]) -> Result<Option<&'v Value>, ConfigError> {
    let mut node = tree;
    for (depth, key) in path.iter().enumerate() {
        node = match (node, key) {
            (Value::Mapping(map), Key::Name(name)) => match map.get(name) {
                Some(child) => child,
                None => return Ok(None),
            },
            // A mapping has no integer positions; it just lacks the key.
            (Value::Mapping(_), Key::Index(_)) => return Ok(None),
            (Value::Sequence(items), Key::Index(index)) => match items.get(*index) {
                Some(child) => child,
                None => return Ok(None),
            },
            (Value::Sequence(_), Key::Name(_)) => {
                return Err(ConfigError::type_mismatch(
                    render_name(&path[..depth]),
                    Kind::Mapping.description(),
                    Kind::Sequence.description(),
                ));
            }
            (other, _) => {
                return Err(ConfigError::type_mismatch(
                    render_name(&path[..depth]),
                    "a collection",
                    other.kind().description(),
                ));
            }
        };
    }
    Ok(Some(node))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn root_of(yaml_sources: &[&str]) -> RootView {
        let sources = yaml_sources
            .iter()
            .map(|yaml| Source::new(Value::from_yaml(serde_yaml::from_str(yaml).unwrap())))
            .collect();
        RootView::new(sources)
    }

    #[test]
    fn test_candidates_in_priority_order() {
        let root = root_of(&["foo: 1", "foo: 2", "bar: 3"]);
        let found: Vec<Value> = root.at("foo").get_all().map(|c| c.unwrap()).collect();
        assert_eq!(found, vec![Value::Integer(1), Value::Integer(2)]);
    }

    #[test]
    fn test_get_takes_first_candidate() {
        let root = root_of(&["foo: 1", "foo: 2"]);
        assert_eq!(root.at("foo").get().unwrap(), 1);
    }

    #[test]
    fn test_missing_key_skips_source() {
        let root = root_of(&["bar: 1", "foo: 2"]);
        assert_eq!(root.at("foo").get().unwrap(), 2);
    }

    #[test]
    fn test_missing_everywhere_is_not_found() {
        let root = root_of(&["bar: 1"]);
        let err = root.at("baz").get().unwrap_err();
        assert!(matches!(err, ConfigError::NotFound { name } if name == "root['baz']"));
    }

    #[test]
    fn test_out_of_range_index_skips_source() {
        let root = root_of(&["foo: [1]", "foo: [2, 3]"]);
        assert_eq!(root.at("foo").at(1).get().unwrap(), 3);
    }

    #[test]
    fn test_scalar_at_prefix_is_type_mismatch() {
        let root = root_of(&["foo: 5"]);
        let err = root.at("foo").at("bar").get().unwrap_err();
        match err {
            ConfigError::TypeMismatch { name, actual, .. } => {
                assert_eq!(name, "root['foo']");
                assert_eq!(actual, "an integer");
            }
            other => panic!("expected TypeMismatch, got {other:?}"),
        }
    }

    #[test]
    fn test_string_key_into_sequence_is_type_mismatch() {
        let root = root_of(&["foo: [1, 2]"]);
        let err = root.at("foo").at("bar").get().unwrap_err();
        assert!(matches!(err, ConfigError::TypeMismatch { .. }));
    }

    #[test]
    fn test_keys_unions_all_sources_in_priority_order() {
        let root = root_of(&["foo: {a: 1, b: 2}", "foo: {b: 9, c: 3}"]);
        assert_eq!(root.at("foo").keys().unwrap(), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_keys_rejects_non_mapping_candidate() {
        let root = root_of(&["foo: {a: 1}", "foo: 5"]);
        assert!(matches!(
            root.at("foo").keys(),
            Err(ConfigError::TypeMismatch { .. })
        ));
    }

    #[test]
    fn test_all_contents_concatenates() {
        let root = root_of(&["foo: [1, 2]", "foo: [3]"]);
        let contents = root.at("foo").all_contents().unwrap();
        assert_eq!(
            contents,
            vec![Value::Integer(1), Value::Integer(2), Value::Integer(3)]
        );
    }

    #[test]
    fn test_all_contents_rejects_scalar() {
        let root = root_of(&["foo: [1]", "foo: nope"]);
        assert!(matches!(
            root.at("foo").all_contents(),
            Err(ConfigError::TypeMismatch { .. })
        ));
    }

    #[test]
    fn test_overlay_wins_over_all_sources() {
        let root = root_of(&["foo: 1"]);
        root.at("foo").set(99).unwrap();
        assert_eq!(root.at("foo").get().unwrap(), 99);
    }

    #[test]
    fn test_overlay_write_creates_intermediate_mappings() {
        let root = root_of(&[]);
        root.at("a").at("b").at("c").set("deep").unwrap();
        assert_eq!(root.at("a").at("b").at("c").get().unwrap(), "deep");
    }

    #[test]
    fn test_overlay_write_preserves_siblings() {
        let root = root_of(&[]);
        root.at("a").at("x").set(1).unwrap();
        root.at("a").at("y").set(2).unwrap();
        assert_eq!(root.at("a").at("x").get().unwrap(), 1);
        assert_eq!(root.at("a").at("y").get().unwrap(), 2);
    }

    #[test]
    fn test_read_your_writes_without_caching() {
        let root = root_of(&["foo: 1"]);
        let view = root.at("foo");
        assert_eq!(view.get().unwrap(), 1);
        view.set(2).unwrap();
        assert_eq!(view.get().unwrap(), 2);
        view.set(3).unwrap();
        assert_eq!(view.get().unwrap(), 3);
    }

    #[test]
    fn test_add_override_outranks_sources_but_not_overlay() {
        let mut root = root_of(&["foo: 1"]);
        root.add_override(Source::new(Value::from_yaml(
            serde_yaml::from_str("foo: 2").unwrap(),
        )));
        assert_eq!(root.at("foo").get().unwrap(), 2);

        root.at("foo").set(3).unwrap();
        assert_eq!(root.at("foo").get().unwrap(), 3);
    }

    #[test]
    fn test_view_names() {
        let root = RootView::default();
        assert_eq!(root.view().name(), "root");
        assert_eq!(root.at("foo").at(2).name(), "root['foo'][2]");
        assert_eq!(root.at("foo").at(2).parent().unwrap().name(), "root['foo']");
        assert!(root.view().parent().is_none());
    }

    #[test]
    fn test_typed_reads() {
        let root = root_of(&["yes: true\nname: quince\nport: 8080\nratio: 0.5"]);
        assert!(root.at("yes").get_bool().unwrap());
        assert_eq!(root.at("name").get_str().unwrap(), "quince");
        assert_eq!(root.at("port").get_i64().unwrap(), 8080);
        assert_eq!(root.at("ratio").get_f64().unwrap(), 0.5);
        assert_eq!(root.at("port").get_f64().unwrap(), 8080.0);
        assert!(matches!(
            root.at("name").get_i64(),
            Err(ConfigError::TypeMismatch { .. })
        ));
    }
}

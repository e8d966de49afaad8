//! A single read-only origin of configuration data.

use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::ConfigError;
use crate::value::Value;

/// One origin of configuration data, ordered by priority inside a
/// [`RootView`](crate::RootView).
///
/// Sources are immutable once constructed. The optional origin path is
/// kept for diagnostics and for resolving relative filenames declared in
/// templates; the `default` flag marks packaged-defaults sources, whose
/// own directory becomes the base for relative paths instead of the
/// user's configuration directory.
#[derive(Debug, Clone)]
pub struct Source {
    data: Value,
    path: Option<PathBuf>,
    default: bool,
}

impl Source {
    /// Create an in-memory source with no origin file.
    pub fn new(data: impl Into<Value>) -> Source {
        Source {
            data: data.into(),
            path: None,
            default: false,
        }
    }

    /// Create a source from already-parsed data and its origin file.
    pub fn with_path(data: impl Into<Value>, path: impl Into<PathBuf>, default: bool) -> Source {
        Source {
            data: data.into(),
            path: Some(path.into()),
            default,
        }
    }

    /// Read and parse a YAML configuration file.
    ///
    /// I/O and parse failures are surfaced as [`ConfigError::SourceRead`]
    /// naming the file and the underlying cause; they are never skipped.
    pub fn from_file(path: impl AsRef<Path>, default: bool) -> Result<Source, ConfigError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|err| ConfigError::SourceRead {
            path: path.to_path_buf(),
            source: err.into(),
        })?;
        let yaml: serde_yaml::Value =
            serde_yaml::from_str(&contents).map_err(|err| ConfigError::SourceRead {
                path: path.to_path_buf(),
                source: err.into(),
            })?;
        debug!(path = %path.display(), default, "loaded configuration file");
        Ok(Source {
            // An empty file parses as null; treat it as an empty mapping
            // so it merely contributes nothing.
            data: match Value::from_yaml(yaml) {
                Value::Null => Value::Mapping(Default::default()),
                data => data,
            },
            path: Some(path.to_path_buf()),
            default,
        })
    }

    /// The parsed configuration tree.
    pub fn data(&self) -> &Value {
        &self.data
    }

    /// The file this source was read from, if any.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Whether this is a packaged-defaults source.
    pub fn is_default(&self) -> bool {
        self.default
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ReadError;

    #[test]
    fn test_from_file_missing() {
        let err = Source::from_file("/nonexistent/config.yaml", false).unwrap_err();
        match err {
            ConfigError::SourceRead { path, source } => {
                assert_eq!(path, PathBuf::from("/nonexistent/config.yaml"));
                assert!(matches!(source, ReadError::Io(_)));
            }
            other => panic!("expected SourceRead, got {other:?}"),
        }
    }

    #[test]
    fn test_from_file_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        std::fs::write(&path, "foo: [unclosed\n").unwrap();

        let err = Source::from_file(&path, false).unwrap_err();
        match err {
            ConfigError::SourceRead { source, .. } => {
                assert!(matches!(source, ReadError::Yaml(_)));
            }
            other => panic!("expected SourceRead, got {other:?}"),
        }
    }

    #[test]
    fn test_from_file_empty_is_empty_mapping() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        std::fs::write(&path, "").unwrap();

        let source = Source::from_file(&path, false).unwrap();
        assert_eq!(source.data().as_mapping().map(|m| m.len()), Some(0));
    }
}

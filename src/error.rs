//! Error taxonomy for configuration queries and validation.

use std::path::PathBuf;

use thiserror::Error;

use crate::value::Value;

/// Any error raised while querying or validating a configuration.
///
/// Resolution and validation never log or swallow errors; every failure
/// propagates to the caller as one of these kinds. A declared template
/// default is only ever used on *absence* of a value, never to recover
/// from a type or value failure at a present candidate.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// No source (including the overlay) defines a required value.
    #[error("{name} not found")]
    NotFound {
        /// Display name of the unresolved view, e.g. `root['foo'][2]`.
        name: String,
    },

    /// A candidate's runtime shape disagrees with what was expected.
    #[error("{name} must be {expected}, not {actual}")]
    TypeMismatch {
        /// Display name of the offending view.
        name: String,
        /// What the view or template expected, e.g. "an integer".
        expected: String,
        /// The shape actually found, e.g. "a string".
        actual: String,
    },

    /// A candidate is shape-correct but fails a semantic constraint.
    #[error("{name} has invalid value {candidate}: {reason}")]
    Invalid {
        /// Display name of the offending view.
        name: String,
        /// The rejected candidate.
        candidate: Value,
        /// Which constraint failed, naming the allowed set or pattern.
        reason: String,
    },

    /// The template itself is malformed, independent of any input data.
    #[error("malformed template: {reason}")]
    Template {
        /// What is wrong with the template definition.
        reason: String,
    },

    /// A key was looked up on a validated result but never declared in
    /// the template that produced it. Distinct from [`NotFound`]: the
    /// configuration may well contain the key, but the schema does not.
    ///
    /// [`NotFound`]: ConfigError::NotFound
    #[error("{key} is not declared in the template that produced {name}")]
    KeyNotDeclared {
        /// Display name of the validated result.
        name: String,
        /// The undeclared key.
        key: String,
    },

    /// A configuration file could not be opened or parsed.
    #[error("file {path} could not be read: {source}")]
    SourceRead {
        /// The failing file.
        path: PathBuf,
        /// The underlying cause.
        #[source]
        source: ReadError,
    },
}

/// Underlying cause of a [`ConfigError::SourceRead`].
#[derive(Debug, Error)]
pub enum ReadError {
    /// The file could not be opened or read.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// The file is not valid YAML.
    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),
}

impl ConfigError {
    pub(crate) fn type_mismatch(
        name: impl Into<String>,
        expected: impl Into<String>,
        actual: impl Into<String>,
    ) -> Self {
        ConfigError::TypeMismatch {
            name: name.into(),
            expected: expected.into(),
            actual: actual.into(),
        }
    }

    pub(crate) fn invalid(
        name: impl Into<String>,
        candidate: Value,
        reason: impl Into<String>,
    ) -> Self {
        ConfigError::Invalid {
            name: name.into(),
            candidate,
            reason: reason.into(),
        }
    }

    pub(crate) fn template(reason: impl Into<String>) -> Self {
        ConfigError::Template {
            reason: reason.into(),
        }
    }
}

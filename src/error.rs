//! Error types shared by the value model, path resolution and the transformer.

use std::{io, path::PathBuf};

use thiserror::Error;

use crate::value::ValueType;

/// Errors that abort processing of the current record or script.
///
/// Out-of-range indices, absent optional fields and lookup misses are not
/// represented here: they resolve to "no match" instead.
#[derive(Error, Debug)]
pub enum FixError {
    /// A projection or path step expected one variant and found another
    #[error("Type mismatch: expected {expected}, got {actual} at '{path}'")]
    TypeMismatch {
        expected: &'static str,
        actual: ValueType,
        path: String,
    },

    /// `$first`, `$last`, `$append` or a numeric reference could not be satisfied
    #[error("Using ref, but can't find: {field} in: {container}")]
    ReferenceResolution { field: String, container: String },

    /// Malformed script: unknown operation, bad conditional name, wrong arity
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// A script, variable table or lookup file could not be read
    #[error("Cannot read '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Malformed JSON in a script or input document
    #[error("Invalid JSON: {0}")]
    Json(#[from] serde_json::Error),
}

impl FixError {
    pub(crate) fn config(message: impl Into<String>) -> Self {
        FixError::Configuration(message.into())
    }

    pub(crate) fn type_mismatch(expected: &'static str, actual: ValueType, path: Option<&str>) -> Self {
        FixError::TypeMismatch {
            expected,
            actual,
            path: path.unwrap_or("").to_string(),
        }
    }
}

pub type Result<T, E = FixError> = std::result::Result<T, E>;

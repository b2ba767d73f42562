//! # Record Values
//!
//! A record is a tree of [`Value`]s. Every node is exactly one of:
//!
//! - **[`Array`]** - an ordered list of values (repeated fields)
//! - **[`Hash`]** - an insertion-ordered map of field names to values
//! - **[`Scalar`]** - a string literal
//!
//! There is no null variant. Absence is expressed with `Option<Value>` and every
//! container silently drops a `None` handed to `add`/`put`.
//!
//! ## Provenance Paths
//!
//! Each value carries the dotted, 1-based path at which it currently lives in
//! its tree (`a.b.2.c`). The path is owned by the containers: whenever a value
//! is put into a [`Hash`] or [`Array`] the container recomputes the path of the
//! whole subtree. Paths never take part in equality or hashing.
//!
//! ## Examples
//!
//! ```
//! use recfix::{Hash, Value};
//!
//! let mut record = Hash::new();
//! record.add("title", Value::from("Faust")).unwrap();
//! record.add("title", Value::from("Ulysses")).unwrap();
//!
//! let titles = record.get("title").unwrap();
//! assert_eq!(titles.as_array().unwrap().len(), 2);
//! assert_eq!(titles.as_array().unwrap().get(1).unwrap().path(), Some("title.2"));
//! ```

pub mod array;
pub mod hash;
pub mod pattern;

use std::{
    fmt,
    hash::{Hash as StdHash, Hasher},
};

pub use array::Array;
pub use hash::Hash;

use crate::error::{FixError, Result};

/// The variant tag of a [`Value`], used in diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueType {
    Array,
    Hash,
    Scalar,
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValueType::Array => write!(f, "Array"),
            ValueType::Hash => write!(f, "Hash"),
            ValueType::Scalar => write!(f, "Scalar"),
        }
    }
}

/// A string literal together with its provenance path.
#[derive(Debug, Clone)]
pub struct Scalar {
    text: String,
    path: Option<String>,
}

impl Scalar {
    pub fn new(text: impl Into<String>) -> Self {
        Scalar {
            text: text.into(),
            path: None,
        }
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    pub fn into_string(self) -> String {
        self.text
    }

    pub fn path(&self) -> Option<&str> {
        self.path.as_deref()
    }

    pub(crate) fn set_text(&mut self, text: String) {
        self.text = text;
    }
}

impl PartialEq for Scalar {
    fn eq(&self, other: &Self) -> bool {
        self.text == other.text
    }
}

impl Eq for Scalar {}

/// A node of a record tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    /// Repeated values, addressed 1-based from paths
    Array(Array),

    /// Named fields in insertion order
    Hash(Hash),

    /// A string literal
    Scalar(Scalar),
}

impl Value {
    pub fn scalar(text: impl Into<String>) -> Self {
        Value::Scalar(Scalar::new(text))
    }

    pub fn new_array() -> Self {
        Value::Array(Array::new())
    }

    pub fn new_hash() -> Self {
        Value::Hash(Hash::new())
    }

    pub fn value_type(&self) -> ValueType {
        match self {
            Value::Array(_) => ValueType::Array,
            Value::Hash(_) => ValueType::Hash,
            Value::Scalar(_) => ValueType::Scalar,
        }
    }

    pub fn is_array(&self) -> bool {
        matches!(self, Value::Array(_))
    }

    pub fn is_hash(&self) -> bool {
        matches!(self, Value::Hash(_))
    }

    pub fn is_scalar(&self) -> bool {
        matches!(self, Value::Scalar(_))
    }

    pub fn as_array(&self) -> Result<&Array> {
        match self {
            Value::Array(array) => Ok(array),
            other => Err(other.mismatch("Array")),
        }
    }

    pub fn as_array_mut(&mut self) -> Result<&mut Array> {
        match self {
            Value::Array(array) => Ok(array),
            other => Err(other.mismatch("Array")),
        }
    }

    pub fn as_hash(&self) -> Result<&Hash> {
        match self {
            Value::Hash(hash) => Ok(hash),
            other => Err(other.mismatch("Hash")),
        }
    }

    pub fn as_hash_mut(&mut self) -> Result<&mut Hash> {
        match self {
            Value::Hash(hash) => Ok(hash),
            other => Err(other.mismatch("Hash")),
        }
    }

    pub fn as_scalar(&self) -> Result<&str> {
        match self {
            Value::Scalar(scalar) => Ok(scalar.as_str()),
            other => Err(other.mismatch("Scalar")),
        }
    }

    /// Returns this value as a sequence: an array as-is, anything else
    /// wrapped in a new single-element array.
    pub fn as_list(&self) -> Array {
        self.clone().into_list()
    }

    /// Owned variant of [`Value::as_list`]. Element paths are kept.
    pub fn into_list(self) -> Array {
        match self {
            Value::Array(array) => array,
            other => Array::detached(vec![other]),
        }
    }

    /// The provenance path of this value, if it has been placed in a tree.
    pub fn path(&self) -> Option<&str> {
        match self {
            Value::Array(array) => array.path(),
            Value::Hash(hash) => hash.path(),
            Value::Scalar(scalar) => scalar.path(),
        }
    }

    /// True for the empty string, an empty array and an empty hash.
    pub fn is_empty(&self) -> bool {
        match self {
            Value::Array(array) => array.is_empty(),
            Value::Hash(hash) => hash.is_empty(),
            Value::Scalar(scalar) => scalar.text.is_empty(),
        }
    }

    /// Recomputes the path of this value and all of its descendants.
    pub(crate) fn relocate(&mut self, path: Option<String>) {
        match self {
            Value::Array(array) => array.relocate(path),
            Value::Hash(hash) => hash.relocate(path),
            Value::Scalar(scalar) => scalar.path = path,
        }
    }

    fn mismatch(&self, expected: &'static str) -> FixError {
        FixError::type_mismatch(expected, self.value_type(), self.path())
    }
}

/// Joins a parent path and a child segment.
pub(crate) fn child_path(parent: Option<&str>, segment: &str) -> String {
    match parent {
        Some(parent) if !parent.is_empty() => format!("{}.{}", parent, segment),
        _ => segment.to_string(),
    }
}

impl StdHash for Value {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.value_type().hash(state);
        match self {
            Value::Array(array) => {
                state.write_usize(array.len());
                for item in array.iter() {
                    item.hash(state);
                }
            }
            Value::Hash(hash) => {
                state.write_usize(hash.len());
                for (field, value) in hash.iter() {
                    field.hash(state);
                    value.hash(state);
                }
            }
            Value::Scalar(scalar) => scalar.text.hash(state),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Scalar(scalar) => write!(f, "{}", scalar.text),
            container => {
                let json = crate::output::to_json(container).map_err(|_| fmt::Error)?;
                f.write_str(&json)
            }
        }
    }
}

impl From<&str> for Value {
    fn from(text: &str) -> Self {
        Value::scalar(text)
    }
}

impl From<String> for Value {
    fn from(text: String) -> Self {
        Value::scalar(text)
    }
}

impl From<Array> for Value {
    fn from(array: Array) -> Self {
        Value::Array(array)
    }
}

impl From<Hash> for Value {
    fn from(hash: Hash) -> Self {
        Value::Hash(hash)
    }
}

impl From<Vec<Value>> for Value {
    fn from(values: Vec<Value>) -> Self {
        Value::Array(values.into_iter().collect())
    }
}

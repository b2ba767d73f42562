use std::{borrow::Cow, collections::HashSet};

use indexmap::IndexMap;

use super::{Array, Value, child_path, pattern};
use crate::{
    error::Result,
    path::{FixPath, InsertMode},
};

/// An insertion-ordered map of field names to values.
///
/// Lookups accept field-name patterns (see [`pattern`]). Re-adding an existing
/// field keeps its original position; `None` values are never stored.
#[derive(Debug, Clone, Default)]
pub struct Hash {
    fields: IndexMap<String, Value>,
    path: Option<String>,
}

impl Hash {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn path(&self) -> Option<&str> {
        self.path.as_deref()
    }

    pub fn iter(&self) -> indexmap::map::Iter<'_, String, Value> {
        self.fields.iter()
    }

    pub fn keys(&self) -> indexmap::map::Keys<'_, String, Value> {
        self.fields.keys()
    }

    pub fn values(&self) -> indexmap::map::Values<'_, String, Value> {
        self.fields.values()
    }

    /// Names of all fields matching `pattern`, in this hash's field order.
    pub fn find_fields(&self, pattern: &str) -> Vec<String> {
        if !pattern::is_pattern(pattern) {
            return match self.fields.get_key_value(pattern) {
                Some((field, _)) => vec![field.clone()],
                None => Vec::new(),
            };
        }
        let compiled = pattern::compile(pattern);
        self.fields
            .keys()
            .filter(|field| compiled.matches(field))
            .cloned()
            .collect()
    }

    pub fn contains_field(&self, pattern: &str) -> bool {
        if !pattern::is_pattern(pattern) {
            return self.fields.contains_key(pattern);
        }
        let compiled = pattern::compile(pattern);
        self.fields.keys().any(|field| compiled.matches(field))
    }

    /// Looks up the value of the fields matching `pattern`.
    ///
    /// A single match is returned as-is. Several matches are aggregated into a
    /// new array, splicing in the elements of matched arrays.
    pub fn get(&self, pattern: &str) -> Option<Cow<'_, Value>> {
        let fields = self.find_fields(pattern);
        match fields.as_slice() {
            [] => None,
            [field] => self.fields.get(field).map(Cow::Borrowed),
            many => {
                let mut values = Vec::new();
                for field in many {
                    match &self.fields[field.as_str()] {
                        Value::Array(array) => values.extend(array.iter().cloned()),
                        value => values.push(value.clone()),
                    }
                }
                Some(Cow::Owned(Value::Array(Array::detached(values))))
            }
        }
    }

    /// Exact field access without pattern matching.
    pub fn get_field(&self, field: &str) -> Option<&Value> {
        self.fields.get(field)
    }

    pub(crate) fn get_field_mut(&mut self, field: &str) -> Option<&mut Value> {
        self.fields.get_mut(field)
    }

    /// Sets a field, replacing any previous value in place. `None` is ignored.
    pub fn put(&mut self, field: &str, value: impl Into<Option<Value>>) {
        if let Some(mut value) = value.into() {
            value.relocate(Some(self.field_path(field)));
            self.fields.insert(field.to_string(), value);
        }
    }

    /// [`put`](Hash::put)s a value, provided the field is already present.
    pub fn replace(&mut self, field: &str, value: impl Into<Option<Value>>) {
        if self.contains_field(field) {
            self.put(field, value);
        }
    }

    /// Adds a value, merging with an existing one.
    ///
    /// `field` may be a full path (`a.b.$append`), which is resolved with
    /// [`InsertMode::Append`]. An existing non-array value is promoted to the
    /// first element of an array before the new value(s) are appended.
    pub fn add(&mut self, field: &str, value: impl Into<Option<Value>>) -> Result<()> {
        let Some(value) = value.into() else {
            return Ok(());
        };
        if FixPath::is_nested(field) {
            return FixPath::parse(field).insert(self, InsertMode::Append, value);
        }
        self.merge_field(field, value);
        Ok(())
    }

    /// Adds each value of a hash to this hash with merge semantics.
    pub fn add_all(&mut self, other: Hash) {
        for (field, value) in other {
            self.merge_field(&field, value);
        }
    }

    pub(crate) fn merge_field(&mut self, field: &str, value: Value) {
        let path = self.field_path(field);
        let Some(existing) = self.fields.get_mut(field) else {
            self.put(field, value);
            return;
        };
        if !existing.is_array() {
            let first = std::mem::replace(existing, Value::new_array());
            if let Value::Array(array) = existing {
                array.relocate(Some(path));
                array.add(first);
            }
        }
        if let Value::Array(array) = existing {
            match value {
                Value::Array(values) => values.into_iter().for_each(|v| array.add(v)),
                value => array.add(value),
            }
        }
    }

    /// Removes every field matching `pattern`.
    pub fn remove(&mut self, pattern: &str) {
        for field in self.find_fields(pattern) {
            self.fields.shift_remove(&field);
        }
    }

    /// Removes a field by exact name.
    pub fn remove_field(&mut self, field: &str) -> Option<Value> {
        self.fields.shift_remove(field)
    }

    /// Stores `value` at `field` in place, or removes the field for `None`.
    pub(crate) fn put_or_remove(&mut self, field: &str, value: Option<Value>) {
        match value {
            Some(value) => self.put(field, value),
            None => {
                self.fields.shift_remove(field);
            }
        }
    }

    /// Retains only the fields matched by at least one of `patterns`.
    pub fn retain_fields<S: AsRef<str>>(&mut self, patterns: &[S]) {
        let keep: HashSet<String> = patterns
            .iter()
            .flat_map(|pattern| self.find_fields(pattern.as_ref()))
            .collect();
        self.fields.retain(|field, _| keep.contains(field));
    }

    /// Recursively drops empty strings, arrays and hashes.
    pub fn remove_empty_values(&mut self) {
        for value in self.fields.values_mut() {
            match value {
                Value::Array(array) => array.remove_empty_values(),
                Value::Hash(hash) => hash.remove_empty_values(),
                Value::Scalar(_) => {}
            }
        }
        self.fields.retain(|_, value| !value.is_empty());
    }

    /// Resolves a path expression against this hash.
    pub fn find(&self, path: &str) -> Option<Cow<'_, Value>> {
        FixPath::parse(path).find(self)
    }

    /// Inserts a value at a path expression with the given mode.
    pub fn insert(&mut self, mode: InsertMode, path: &str, value: Value) -> Result<()> {
        FixPath::parse(path).insert(self, mode, value)
    }

    /// Removes whatever a path expression addresses.
    pub fn remove_path(&mut self, path: &str) {
        FixPath::parse(path).remove(self)
    }

    /// Applies `operator` to every scalar addressed by `path`. Scalars mapped
    /// to `None` are removed.
    pub fn transform_fields<F>(&mut self, path: &str, operator: F)
    where
        F: FnMut(&str) -> Option<String>,
    {
        let mut operator = operator;
        FixPath::parse(path).transform(self, &mut operator)
    }

    pub(crate) fn relocate(&mut self, path: Option<String>) {
        self.path = path;
        let parent = self.path.clone();
        for (field, value) in self.fields.iter_mut() {
            value.relocate(Some(child_path(parent.as_deref(), field)));
        }
    }

    fn field_path(&self, field: &str) -> String {
        child_path(self.path.as_deref(), field)
    }
}

impl PartialEq for Hash {
    fn eq(&self, other: &Self) -> bool {
        self.fields.len() == other.fields.len()
            && self.fields.iter().zip(other.fields.iter()).all(|(a, b)| a == b)
    }
}

impl Eq for Hash {}

impl IntoIterator for Hash {
    type Item = (String, Value);
    type IntoIter = indexmap::map::IntoIter<String, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.fields.into_iter()
    }
}

impl<'a> IntoIterator for &'a Hash {
    type Item = (&'a String, &'a Value);
    type IntoIter = indexmap::map::Iter<'a, String, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.fields.iter()
    }
}

impl<K: Into<String>> FromIterator<(K, Value)> for Hash {
    fn from_iter<I: IntoIterator<Item = (K, Value)>>(iter: I) -> Self {
        let mut hash = Hash::new();
        for (field, value) in iter {
            let field: String = field.into();
            hash.put(&field, value);
        }
        hash
    }
}

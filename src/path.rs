//! # Path Expressions
//!
//! A path expression addresses locations in a record tree. It is a
//! dot-separated list of segments:
//!
//! | segment | meaning |
//! |---|---|
//! | `title`, `a*`, `x\|y` | field name or field-name pattern |
//! | `*` | every element of an array |
//! | `2` | the second element of an array (1-based), or field `"2"` of a hash |
//! | `$first`, `$last` | first / last element |
//! | `$append` | a new element appended for the insertion |
//!
//! Paths are resolved recursively over segment slices; a [`FixPath`] itself is
//! never mutated.
//!
//! Resolution is tolerant: absent fields, out-of-range indices and scalars in
//! the middle of a path mean "no match". Only insertions can fail, when a
//! reference cannot be satisfied or a scalar would need to hold a child.

use std::{borrow::Cow, fmt};

use crate::{
    error::{FixError, Result},
    value::{Array, Hash, Value, ValueType},
};

/// Suffix that marks a field as an array represented by an indexed hash.
pub const ARRAY_MARKER: &str = "[]";

const SEPARATOR: char = '.';
const WILDCARD: &str = "*";

/// A reserved segment resolved against the size of the current container.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reference {
    First,
    Last,
    Append,
}

impl Reference {
    pub fn parse(segment: &str) -> Option<Self> {
        match segment {
            "$first" => Some(Reference::First),
            "$last" => Some(Reference::Last),
            "$append" => Some(Reference::Append),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Reference::First => "$first",
            Reference::Last => "$last",
            Reference::Append => "$append",
        }
    }
}

/// A single step of a path expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathSegment {
    /// Field name or field-name pattern
    ///
    /// # Examples
    /// - `title` → `Field("title")`
    /// - `title-?|subtitle` → `Field("title-?|subtitle")`
    Field(String),

    /// `*` - every element
    Wildcard,

    /// 1-based position
    ///
    /// Only canonical decimal numbers become indices, so `07` stays a field.
    Index(usize),

    /// `$first`, `$last` or `$append`
    Reference(Reference),
}

impl PathSegment {
    pub fn parse(segment: &str) -> Self {
        if segment == WILDCARD {
            return PathSegment::Wildcard;
        }
        if let Some(reference) = Reference::parse(segment) {
            return PathSegment::Reference(reference);
        }
        match segment.parse::<usize>() {
            Ok(index) if index.to_string() == segment => PathSegment::Index(index),
            _ => PathSegment::Field(segment.to_string()),
        }
    }

    /// True for segments that address an existing element by position.
    fn is_positional(&self) -> bool {
        matches!(
            self,
            PathSegment::Index(_) | PathSegment::Reference(Reference::First | Reference::Last)
        )
    }

    /// Field names of `hash` that this segment addresses.
    fn fields_in(&self, hash: &Hash) -> Vec<String> {
        match self {
            PathSegment::Field(pattern) => hash.find_fields(pattern),
            PathSegment::Wildcard => hash.keys().cloned().collect(),
            segment => segment
                .key_in(hash)
                .filter(|key| hash.get_field(key).is_some())
                .into_iter()
                .collect(),
        }
    }

    /// The hash key a positional segment stands for.
    fn key_in(&self, hash: &Hash) -> Option<String> {
        match self {
            PathSegment::Field(name) => Some(name.clone()),
            PathSegment::Index(index) => Some(index.to_string()),
            PathSegment::Reference(Reference::First) => Some("1".to_string()),
            PathSegment::Reference(Reference::Last) => (!hash.is_empty()).then(|| hash.len().to_string()),
            PathSegment::Reference(Reference::Append) => Some(next_index(hash)),
            PathSegment::Wildcard => None,
        }
    }

    /// The 0-based element a positional segment stands for. `len` itself is
    /// allowed for indices one past the end.
    fn index_in(&self, array: &Array) -> Option<usize> {
        match self {
            PathSegment::Index(index) => index.checked_sub(1).filter(|&i| i <= array.len()),
            PathSegment::Reference(Reference::First) => (!array.is_empty()).then_some(0),
            PathSegment::Reference(Reference::Last) => array.len().checked_sub(1),
            PathSegment::Reference(Reference::Append) => Some(array.len()),
            _ => None,
        }
    }
}

impl fmt::Display for PathSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PathSegment::Field(name) => write!(f, "{}", name),
            PathSegment::Wildcard => write!(f, "{}", WILDCARD),
            PathSegment::Index(index) => write!(f, "{}", index),
            PathSegment::Reference(reference) => write!(f, "{}", reference.as_str()),
        }
    }
}

/// How a new value combines with what is already at the target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertMode {
    /// Overwrite the target
    Replace,

    /// Merge with the target, promoting it to an array if needed
    Append,

    /// Store as the next `"1"`, `"2"`, ... key of an array-marked hash
    Indexed,
}

impl InsertMode {
    fn apply(self, hash: &mut Hash, field: &str, value: Value) {
        match self {
            InsertMode::Replace => hash.put(field, value),
            InsertMode::Append => hash.merge_field(field, value),
            InsertMode::Indexed => {
                let element: Hash = [(field, value)].into_iter().collect();
                hash.merge_field(&next_index(hash), Value::Hash(element));
            }
        }
    }
}

/// A parsed path expression.
///
/// # Examples
///
/// ```
/// use recfix::{FixPath, Hash, InsertMode, Value};
///
/// let mut record = Hash::new();
/// let path = FixPath::parse("a.b.c");
/// path.insert(&mut record, InsertMode::Replace, Value::from("X")).unwrap();
///
/// let found = path.find(&record).unwrap();
/// assert_eq!(found.as_scalar().unwrap(), "X");
/// assert_eq!(found.path(), Some("a.b.c"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FixPath {
    segments: Vec<PathSegment>,
}

impl FixPath {
    pub fn parse(path: &str) -> Self {
        FixPath {
            segments: path.split(SEPARATOR).map(PathSegment::parse).collect(),
        }
    }

    /// True if `path` has more than one segment.
    pub fn is_nested(path: &str) -> bool {
        path.contains(SEPARATOR)
    }

    pub fn segments(&self) -> &[PathSegment] {
        &self.segments
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Resolves this path. Wildcards and implicit array mapping produce a new
    /// array of every match; a plain path borrows from the tree.
    pub fn find<'a>(&self, hash: &'a Hash) -> Option<Cow<'a, Value>> {
        find_in_hash(hash, &self.segments)
    }

    pub fn insert(&self, hash: &mut Hash, mode: InsertMode, value: Value) -> Result<()> {
        insert_into_hash(hash, mode, false, &self.segments, value)
    }

    pub fn remove(&self, hash: &mut Hash) {
        remove_from_hash(hash, &self.segments)
    }

    /// Applies `operator` to every scalar this path reaches. A `None` result
    /// removes the scalar; a field left with one value is unwrapped.
    pub fn transform(&self, hash: &mut Hash, operator: &mut dyn FnMut(&str) -> Option<String>) {
        transform_hash(hash, &self.segments, operator)
    }
}

impl fmt::Display for FixPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, segment) in self.segments.iter().enumerate() {
            if i > 0 {
                write!(f, "{}", SEPARATOR)?;
            }
            write!(f, "{}", segment)?;
        }
        Ok(())
    }
}

fn next_index(hash: &Hash) -> String {
    (hash.len() + 1).to_string()
}

fn unresolved_in_hash(segment: &PathSegment, hash: &Hash) -> FixError {
    FixError::ReferenceResolution {
        field: segment.to_string(),
        container: format!("Hash at '{}' of size {}", hash.path().unwrap_or(""), hash.len()),
    }
}

fn unresolved_in_array(segment: &PathSegment, array: &Array) -> FixError {
    FixError::ReferenceResolution {
        field: segment.to_string(),
        container: format!("Array at '{}' of size {}", array.path().unwrap_or(""), array.len()),
    }
}

// ============================================================================
// Find
// ============================================================================

fn find_in_value<'a>(value: &'a Value, path: &[PathSegment]) -> Option<Cow<'a, Value>> {
    if path.is_empty() {
        return Some(Cow::Borrowed(value));
    }
    match value {
        Value::Array(array) => find_in_array(array, path),
        Value::Hash(hash) => find_in_hash(hash, path),
        Value::Scalar(_) => None,
    }
}

fn find_in_hash<'a>(hash: &'a Hash, path: &[PathSegment]) -> Option<Cow<'a, Value>> {
    let Some((head, tail)) = path.split_first() else {
        return Some(Cow::Owned(Value::Hash(hash.clone())));
    };
    let key = match head {
        // Hash values are not expanded by `*`; the segment is skipped.
        PathSegment::Wildcard => return find_in_hash(hash, tail),
        PathSegment::Reference(Reference::Append) => return None,
        segment => segment.key_in(hash)?,
    };
    let value = hash.get(&key)?;
    if tail.is_empty() {
        return Some(value);
    }
    match value {
        Cow::Borrowed(value) => find_in_value(value, tail),
        Cow::Owned(value) => find_in_value(&value, tail).map(|found| Cow::Owned(found.into_owned())),
    }
}

fn find_in_array<'a>(array: &'a Array, path: &[PathSegment]) -> Option<Cow<'a, Value>> {
    let (head, tail) = path.split_first()?;
    match head {
        PathSegment::Wildcard => {
            let mut found = Vec::new();
            for element in array {
                match find_in_value(element, tail).map(Cow::into_owned) {
                    Some(Value::Array(nested)) => found.extend(nested),
                    Some(value) => found.push(value),
                    None => {}
                }
            }
            collected(found)
        }
        PathSegment::Reference(Reference::Append) => None,
        PathSegment::Field(_) => {
            // Implicit map: the whole path applies to every element.
            let found = array
                .iter()
                .filter_map(|element| find_in_value(element, path))
                .map(Cow::into_owned)
                .collect();
            collected(found)
        }
        positional => {
            let index = positional.index_in(array)?;
            find_in_value(array.get(index)?, tail)
        }
    }
}

fn collected<'a>(found: Vec<Value>) -> Option<Cow<'a, Value>> {
    if found.is_empty() {
        None
    } else {
        Some(Cow::Owned(Value::Array(Array::detached(found))))
    }
}

// ============================================================================
// Insert
// ============================================================================

fn insert_into_value(
    target: &mut Value,
    mode: InsertMode,
    indexed: bool,
    path: &[PathSegment],
    value: Value,
) -> Result<()> {
    match target {
        Value::Hash(hash) => insert_into_hash(hash, mode, indexed, path, value),
        Value::Array(array) => insert_into_array(array, mode, path, value),
        Value::Scalar(scalar) => Err(FixError::type_mismatch(
            "Array or Hash",
            ValueType::Scalar,
            scalar.path(),
        )),
    }
}

fn insert_into_hash(
    hash: &mut Hash,
    mode: InsertMode,
    indexed: bool,
    path: &[PathSegment],
    value: Value,
) -> Result<()> {
    let Some((head, tail)) = path.split_first() else {
        return Ok(());
    };

    if tail.is_empty() {
        let mode = if indexed { InsertMode::Indexed } else { mode };
        match head {
            PathSegment::Wildcard => {
                for field in head.fields_in(hash) {
                    mode.apply(hash, &field, value.clone());
                }
            }
            PathSegment::Reference(Reference::Append) => hash.put(&next_index(hash), value),
            PathSegment::Field(name) => mode.apply(hash, name, value),
            PathSegment::Index(index) => mode.apply(hash, &index.to_string(), value),
            positional => {
                let field = positional
                    .fields_in(hash)
                    .pop()
                    .ok_or_else(|| unresolved_in_hash(positional, hash))?;
                mode.apply(hash, &field, value);
            }
        }
        return Ok(());
    }

    match head {
        PathSegment::Field(name) => {
            let mut fields = hash.find_fields(name);
            if fields.is_empty() {
                hash.put(name, Value::new_hash());
                fields.push(name.clone());
            }
            let indexed = name.ends_with(ARRAY_MARKER) && !tail[0].is_positional();
            for field in fields {
                if let Some(target) = hash.get_field_mut(&field) {
                    insert_into_value(target, mode, indexed, tail, value.clone())?;
                }
            }
            Ok(())
        }
        PathSegment::Wildcard => {
            for field in head.fields_in(hash) {
                if let Some(target) = hash.get_field_mut(&field)
                    && !target.is_scalar()
                {
                    insert_into_value(target, mode, false, tail, value.clone())?;
                }
            }
            Ok(())
        }
        reference => {
            let field = referenced_field(hash, reference).ok_or_else(|| unresolved_in_hash(reference, hash))?;
            match hash.get_field_mut(&field) {
                Some(target) => insert_into_value(target, mode, false, tail, value),
                None => Err(unresolved_in_hash(reference, hash)),
            }
        }
    }
}

/// Resolves `$first`, `$last`, `$append` or an index to a field of `hash`.
/// Only `$append` creates a new nested hash.
fn referenced_field(hash: &mut Hash, segment: &PathSegment) -> Option<String> {
    if let PathSegment::Reference(Reference::Append) = segment {
        let field = next_index(hash);
        hash.put(&field, Value::new_hash());
        return Some(field);
    }
    segment.fields_in(hash).pop()
}

fn insert_into_array(array: &mut Array, mode: InsertMode, path: &[PathSegment], value: Value) -> Result<()> {
    let Some((head, tail)) = path.split_first() else {
        return Ok(());
    };

    if tail.is_empty() {
        match head {
            PathSegment::Wildcard => match mode {
                InsertMode::Replace => {
                    for index in 0..array.len() {
                        array.set(index, value.clone());
                    }
                }
                _ => array.add(value),
            },
            PathSegment::Field(_) => {
                let mut element = Hash::new();
                insert_into_hash(&mut element, mode, false, path, value)?;
                array.add(Value::Hash(element));
            }
            positional => {
                let index = positional
                    .index_in(array)
                    .ok_or_else(|| unresolved_in_array(positional, array))?;
                if mode == InsertMode::Replace && index < array.len() {
                    array.set(index, value);
                } else {
                    array.add(value);
                }
            }
        }
        return Ok(());
    }

    match head {
        PathSegment::Field(_) => {
            // Every insertion through a field of an array creates a new element.
            let mut element = Hash::new();
            insert_into_hash(&mut element, mode, false, path, value)?;
            array.add(Value::Hash(element));
            Ok(())
        }
        PathSegment::Wildcard => {
            for element in array.iter_mut().filter(|element| !element.is_scalar()) {
                insert_into_value(element, mode, false, tail, value.clone())?;
            }
            Ok(())
        }
        positional => {
            let index = positional
                .index_in(array)
                .ok_or_else(|| unresolved_in_array(positional, array))?;
            if index == array.len() {
                array.add(Value::new_hash());
            }
            match array.get_mut(index) {
                Some(target) => insert_into_value(target, mode, false, tail, value),
                None => Err(unresolved_in_array(positional, array)),
            }
        }
    }
}

// ============================================================================
// Remove
// ============================================================================

fn remove_from_value(value: &mut Value, path: &[PathSegment]) {
    match value {
        Value::Array(array) => remove_from_array(array, path),
        Value::Hash(hash) => remove_from_hash(hash, path),
        Value::Scalar(_) => {}
    }
}

fn remove_from_hash(hash: &mut Hash, path: &[PathSegment]) {
    let Some((head, tail)) = path.split_first() else {
        return;
    };
    if matches!(head, PathSegment::Reference(Reference::Append)) {
        return;
    }
    for field in head.fields_in(hash) {
        if tail.is_empty() {
            hash.remove_field(&field);
        } else if let Some(value) = hash.get_field_mut(&field) {
            remove_from_value(value, tail);
        }
    }
}

fn remove_from_array(array: &mut Array, path: &[PathSegment]) {
    let Some((head, tail)) = path.split_first() else {
        return;
    };
    match head {
        PathSegment::Wildcard if tail.is_empty() => array.remove_all(),
        PathSegment::Wildcard => array.iter_mut().for_each(|element| remove_from_value(element, tail)),
        PathSegment::Field(_) => array.iter_mut().for_each(|element| remove_from_value(element, path)),
        PathSegment::Reference(Reference::Append) => {}
        positional => {
            let Some(index) = positional.index_in(array).filter(|&i| i < array.len()) else {
                return;
            };
            if tail.is_empty() {
                array.remove(index);
            } else if let Some(element) = array.get_mut(index) {
                remove_from_value(element, tail);
            }
        }
    }
}

// ============================================================================
// Transform
// ============================================================================

type Operator<'o> = dyn FnMut(&str) -> Option<String> + 'o;

fn transform_hash(hash: &mut Hash, path: &[PathSegment], operator: &mut Operator<'_>) {
    let Some((head, tail)) = path.split_first() else {
        let fields: Vec<String> = hash.keys().cloned().collect();
        for field in fields {
            transform_field(hash, &field, operator);
        }
        return;
    };
    match head {
        PathSegment::Wildcard => transform_hash(hash, tail, operator),
        PathSegment::Reference(Reference::Append) => {}
        segment => {
            for field in segment.fields_in(hash) {
                if tail.is_empty() {
                    transform_field(hash, &field, operator);
                    continue;
                }
                match hash.get_field_mut(&field) {
                    Some(Value::Hash(nested)) => transform_hash(nested, tail, operator),
                    Some(Value::Array(nested)) => transform_array(nested, tail, operator),
                    _ => {}
                }
            }
        }
    }
}

/// Transforms every value of a field and stores the results back with
/// [`Hash::add`] semantics: none removes the field, one is stored unwrapped.
fn transform_field(hash: &mut Hash, field: &str, operator: &mut Operator<'_>) {
    let Some(slot) = hash.get_field_mut(field) else {
        return;
    };
    let old = std::mem::replace(slot, Value::new_array());
    let mut results: Vec<Value> = old
        .into_list()
        .into_iter()
        .filter_map(|value| transform_value(value, operator))
        .collect();
    let replacement = match results.len() {
        0 => None,
        1 => results.pop(),
        _ => Some(Value::Array(results.into_iter().collect())),
    };
    hash.put_or_remove(field, replacement);
}

/// Applies `operator` to every scalar inside `value`.
fn transform_value(value: Value, operator: &mut Operator<'_>) -> Option<Value> {
    match value {
        Value::Scalar(scalar) => operator(scalar.as_str()).map(Value::scalar),
        Value::Array(array) => Some(Value::Array(
            array
                .into_iter()
                .filter_map(|element| transform_value(element, operator))
                .collect(),
        )),
        Value::Hash(hash) => Some(Value::Hash(
            hash.into_iter()
                .filter_map(|(field, value)| transform_value(value, operator).map(|value| (field, value)))
                .collect(),
        )),
    }
}

fn transform_array(array: &mut Array, path: &[PathSegment], operator: &mut Operator<'_>) {
    let (targets, rest): (Vec<usize>, &[PathSegment]) = match path.split_first() {
        None => ((0..array.len()).collect(), path),
        Some((PathSegment::Wildcard, tail)) => ((0..array.len()).collect(), tail),
        Some((PathSegment::Field(_), _)) => ((0..array.len()).collect(), path),
        Some((PathSegment::Reference(Reference::Append), _)) => return,
        Some((positional, tail)) => match positional.index_in(array).filter(|&i| i < array.len()) {
            Some(index) => (vec![index], tail),
            None => return,
        },
    };

    let mut removed = Vec::new();
    for index in targets {
        let Some(element) = array.get_mut(index) else {
            continue;
        };
        match element {
            Value::Scalar(scalar) if rest.is_empty() => match operator(scalar.as_str()) {
                Some(text) => scalar.set_text(text),
                None => removed.push(index),
            },
            Value::Scalar(_) => {}
            Value::Hash(nested) => transform_hash(nested, rest, operator),
            Value::Array(nested) => transform_array(nested, rest, operator),
        }
    }
    for index in removed.into_iter().rev() {
        array.remove(index);
    }
}

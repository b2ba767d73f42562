use super::{Value, child_path};

/// An ordered list of values.
///
/// Storage is 0-based; the paths assigned to elements are 1-based, so the
/// first element of an array at `author` lives at `author.1`.
#[derive(Debug, Clone, Default)]
pub struct Array {
    items: Vec<Value>,
    path: Option<String>,
}

impl Array {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wraps values without touching their paths. Used for search results that
    /// aggregate values from different places of a tree.
    pub(crate) fn detached(items: Vec<Value>) -> Self {
        Array { items, path: None }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn path(&self) -> Option<&str> {
        self.path.as_deref()
    }

    pub fn get(&self, index: usize) -> Option<&Value> {
        self.items.get(index)
    }

    pub(crate) fn get_mut(&mut self, index: usize) -> Option<&mut Value> {
        self.items.get_mut(index)
    }

    pub fn first(&self) -> Option<&Value> {
        self.items.first()
    }

    pub fn last(&self) -> Option<&Value> {
        self.items.last()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Value> {
        self.items.iter()
    }

    pub(crate) fn iter_mut(&mut self) -> std::slice::IterMut<'_, Value> {
        self.items.iter_mut()
    }

    /// Appends a value. `None` is ignored.
    pub fn add(&mut self, value: impl Into<Option<Value>>) {
        if let Some(mut value) = value.into() {
            value.relocate(Some(self.element_path(self.items.len())));
            self.items.push(value);
        }
    }

    /// Replaces the element at `index`, returning the previous one.
    pub fn set(&mut self, index: usize, mut value: Value) -> Option<Value> {
        let path = self.element_path(index);
        let slot = self.items.get_mut(index)?;
        value.relocate(Some(path));
        Some(std::mem::replace(slot, value))
    }

    /// Removes the element at `index`, shifting later elements left.
    pub fn remove(&mut self, index: usize) -> Option<Value> {
        if index >= self.items.len() {
            return None;
        }
        let removed = self.items.remove(index);
        self.reindex_from(index);
        Some(removed)
    }

    pub fn remove_all(&mut self) {
        self.items.clear();
    }

    /// Keeps only the elements for which `keep` returns true.
    pub fn retain(&mut self, keep: impl FnMut(&Value) -> bool) {
        let before = self.items.len();
        self.items.retain(keep);
        if self.items.len() != before {
            self.reindex_from(0);
        }
    }

    /// Recursively empties nested containers and drops every element that is
    /// empty afterwards (empty string, empty array, empty hash).
    pub fn remove_empty_values(&mut self) {
        for item in self.items.iter_mut() {
            match item {
                Value::Array(array) => array.remove_empty_values(),
                Value::Hash(hash) => hash.remove_empty_values(),
                Value::Scalar(_) => {}
            }
        }
        self.retain(|item| !item.is_empty());
    }

    pub(crate) fn relocate(&mut self, path: Option<String>) {
        self.path = path;
        self.reindex_from(0);
    }

    fn reindex_from(&mut self, start: usize) {
        for index in start..self.items.len() {
            let path = self.element_path(index);
            self.items[index].relocate(Some(path));
        }
    }

    fn element_path(&self, index: usize) -> String {
        child_path(self.path.as_deref(), &(index + 1).to_string())
    }
}

impl PartialEq for Array {
    fn eq(&self, other: &Self) -> bool {
        self.items == other.items
    }
}

impl Eq for Array {}

impl FromIterator<Value> for Array {
    fn from_iter<I: IntoIterator<Item = Value>>(iter: I) -> Self {
        let mut array = Array::new();
        for value in iter {
            array.add(value);
        }
        array
    }
}

impl IntoIterator for Array {
    type Item = Value;
    type IntoIter = std::vec::IntoIter<Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.into_iter()
    }
}

impl<'a> IntoIterator for &'a Array {
    type Item = &'a Value;
    type IntoIter = std::slice::Iter<'a, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

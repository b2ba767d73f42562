use std::ops::{Deref, DerefMut};

use crate::{
    error::Result,
    value::{Hash, Value},
};

/// The root of one record tree, plus its reject flag.
///
/// A `Record` dereferences to its root [`Hash`]. The reject flag is kept out
/// of the field map so that no field operation can set or clear it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Record {
    root: Hash,
    rejected: bool,
}

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a record from flattened `(path, value)` pairs.
    ///
    /// # Examples
    ///
    /// ```
    /// use recfix::Record;
    ///
    /// let record = Record::from_literals([("title", "Faust"), ("author.name", "Goethe")]).unwrap();
    /// assert_eq!(record.find("author.name").unwrap().as_scalar().unwrap(), "Goethe");
    /// ```
    pub fn from_literals<I, K, V>(literals: I) -> Result<Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        let mut record = Record::new();
        for (path, value) in literals {
            record.add_literal(path.as_ref(), value)?;
        }
        Ok(record)
    }

    /// Folds one input literal into the tree. Repeating a path turns the field
    /// into an array.
    pub fn add_literal(&mut self, path: &str, value: impl Into<String>) -> Result<()> {
        let value = value.into();
        log::trace!("Literal {} = {:?}", path, value);
        self.root.add(path, Value::scalar(value))
    }

    /// Marks the record for suppression. Processing continues.
    pub fn reject(&mut self) {
        self.rejected = true;
    }

    pub fn is_rejected(&self) -> bool {
        self.rejected
    }

    pub fn into_hash(self) -> Hash {
        self.root
    }
}

impl Deref for Record {
    type Target = Hash;

    fn deref(&self) -> &Hash {
        &self.root
    }
}

impl DerefMut for Record {
    fn deref_mut(&mut self) -> &mut Hash {
        &mut self.root
    }
}

impl From<Hash> for Record {
    fn from(root: Hash) -> Self {
        Record { root, rejected: false }
    }
}

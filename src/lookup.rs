//! # Lookup Maps
//!
//! The `lookup` operation replaces field values through a [`Lookup`]. Maps come
//! from three places:
//!
//! - **inline** - the named options of the call ([`InlineMap`])
//! - **registered** - a map added to the [`MapRegistry`] under a name
//! - **file** - any other name is read as a CSV/TSV file location ([`FileMap`])
//!
//! A miss falls back to the [`DEFAULT_KEY`] entry.

use std::{collections::HashMap, fmt, fs, path::Path, sync::Arc};

use csv::ReaderBuilder;
use dashmap::DashMap;
use indexmap::IndexMap;

use crate::error::{FixError, Result};

/// Key whose value is used when a lookup finds nothing.
pub const DEFAULT_KEY: &str = "__default";

/// Separator of file maps when no `sep_char` option is given.
pub const DEFAULT_SEPARATOR: &str = ",";

/// A read-only string-to-string map.
pub trait Lookup: Send + Sync + fmt::Debug {
    fn lookup(&self, key: &str) -> Option<String>;

    fn lookup_or_default(&self, key: &str) -> Option<String> {
        self.lookup(key).or_else(|| self.lookup(DEFAULT_KEY))
    }
}

/// A map given directly in the script.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InlineMap {
    entries: IndexMap<String, String>,
}

impl InlineMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.entries.insert(key.into(), value.into());
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Lookup for InlineMap {
    fn lookup(&self, key: &str) -> Option<String> {
        self.entries.get(key).cloned()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for InlineMap {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut map = InlineMap::new();
        for (key, value) in iter {
            map.insert(key, value);
        }
        map
    }
}

/// A two-column map read from a delimited text file.
///
/// The first column is the key, the second the value; further columns are
/// ignored. Fields follow CSV quoting rules, and records with fewer than two
/// columns are skipped with a warning. Later records override earlier ones.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileMap {
    entries: HashMap<String, String>,
}

impl FileMap {
    pub fn load(path: impl AsRef<Path>, separator: &str) -> Result<Self> {
        let path = path.as_ref();
        let delimiter = match separator.as_bytes() {
            [byte] => *byte,
            _ => {
                return Err(FixError::config(format!(
                    "Map separator must be a single byte, got {:?}",
                    separator
                )));
            }
        };
        let text = fs::read_to_string(path).map_err(|source| FixError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(FileMap::parse(&text, delimiter, &path.display().to_string()))
    }

    fn parse(text: &str, delimiter: u8, source: &str) -> Self {
        let mut reader = ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .delimiter(delimiter)
            .from_reader(text.as_bytes());

        let mut entries = HashMap::new();
        for (number, record) in reader.records().enumerate() {
            match record {
                Ok(record) if record.len() >= 2 => {
                    entries.insert(record[0].to_string(), record[1].to_string());
                }
                Ok(record) => log::warn!("Skipping malformed record {} of {}: {:?}", number + 1, source, record),
                Err(err) => log::warn!("Skipping unreadable record {} of {}: {}", number + 1, source, err),
            }
        }
        FileMap { entries }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Lookup for FileMap {
    fn lookup(&self, key: &str) -> Option<String> {
        self.entries.get(key).cloned()
    }
}

/// Named maps shared by every compilation against this registry.
///
/// File maps are loaded once per (location, separator) and then reused.
#[derive(Debug, Default)]
pub struct MapRegistry {
    named: DashMap<String, Arc<dyn Lookup>>,
    files: DashMap<(String, String), Arc<dyn Lookup>>,
}

impl MapRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self, name: impl Into<String>, map: impl Lookup + 'static) {
        self.named.insert(name.into(), Arc::new(map));
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn Lookup>> {
        self.named.get(name).map(|entry| Arc::clone(entry.value()))
    }

    /// Returns the registered map `name`, or loads `name` as a file.
    pub fn resolve(&self, name: &str, separator: &str) -> Result<Arc<dyn Lookup>> {
        if let Some(map) = self.get(name) {
            return Ok(map);
        }
        let key = (name.to_string(), separator.to_string());
        if let Some(map) = self.files.get(&key) {
            return Ok(Arc::clone(map.value()));
        }
        let map: Arc<dyn Lookup> = Arc::new(FileMap::load(name, separator)?);
        log::debug!("Loaded lookup file {}", name);
        self.files.insert(key, Arc::clone(&map));
        Ok(map)
    }
}

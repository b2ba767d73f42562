//! # Operations
//!
//! The closed set of named operations a script can call. Every name is
//! resolved into a [`FixMethod`] when the script is compiled; parameters are
//! checked and converted (numbers, regular expressions, lookup maps) at the
//! same time.
//!
//! ## Record-level
//!
//! | name | params |
//! |---|---|
//! | `set_field` | path, value |
//! | `set_array` | path, values... (`path.$append` appends) |
//! | `set_hash` | path; fields as options (`path.$append` appends) |
//! | `add_field` | path, value |
//! | `copy_field` / `move_field` | from, to |
//! | `remove_field` | paths... |
//! | `retain` | field patterns... |
//! | `vacuum`, `reject` | - |
//! | `array` | path (hash → key/value list) |
//! | `hash` | path (key/value list → hash) |
//! | `format` | path, format with `%s` |
//! | `parse_text` | path, regex |
//! | `paste` | target, sources... (`~literal`); option `join_char` |
//!
//! ## Field-level
//!
//! `trim`, `upcase`, `downcase`, `capitalize`, `substring(path, start,
//! length)`, `replace_all(path, regex, replacement)` and `lookup(path,
//! [map])` rewrite every scalar the path reaches.

use std::{borrow::Cow, fmt, sync::Arc};

use regex::Regex;

use super::Options;
use crate::{
    error::{FixError, Result},
    lookup::{DEFAULT_SEPARATOR, InlineMap, Lookup, MapRegistry},
    path::{InsertMode, Reference},
    record::Record,
    value::{Array, Hash, Value},
};

const LITERAL_PREFIX: char = '~';
const DEFAULT_JOIN: &str = " ";
const SEP_OPTION: &str = "sep_char";
const DELETE_OPTION: &str = "delete";
const JOIN_OPTION: &str = "join_char";

/// A source of `paste`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PasteSource {
    /// `~text`
    Literal(String),
    Field(String),
}

/// A transformation of a single scalar value.
#[derive(Debug, Clone)]
pub enum FieldOp {
    Trim,
    Upcase,
    Downcase,
    Capitalize,

    /// Characters `start..start + length`, counted in chars
    Substring { start: usize, length: usize },

    ReplaceAll { regex: Regex, replacement: String },

    /// A miss keeps the value unless `delete` is set.
    Lookup { map: Arc<dyn Lookup>, delete: bool },
}

impl FieldOp {
    pub fn apply(&self, value: &str) -> Option<String> {
        match self {
            FieldOp::Trim => Some(value.trim().to_string()),
            FieldOp::Upcase => Some(value.to_uppercase()),
            FieldOp::Downcase => Some(value.to_lowercase()),
            FieldOp::Capitalize => {
                let mut chars = value.chars();
                Some(match chars.next() {
                    Some(first) => first.to_uppercase().chain(chars).collect(),
                    None => String::new(),
                })
            }
            FieldOp::Substring { start, length } => Some(value.chars().skip(*start).take(*length).collect()),
            FieldOp::ReplaceAll { regex, replacement } => {
                Some(regex.replace_all(value, replacement.as_str()).into_owned())
            }
            FieldOp::Lookup { map, delete } => match map.lookup_or_default(value) {
                Some(found) => Some(found),
                None if *delete => None,
                None => Some(value.to_string()),
            },
        }
    }

    fn name(&self) -> &'static str {
        match self {
            FieldOp::Trim => "trim",
            FieldOp::Upcase => "upcase",
            FieldOp::Downcase => "downcase",
            FieldOp::Capitalize => "capitalize",
            FieldOp::Substring { .. } => "substring",
            FieldOp::ReplaceAll { .. } => "replace_all",
            FieldOp::Lookup { .. } => "lookup",
        }
    }
}

/// A compiled operation call.
#[derive(Debug, Clone)]
pub enum FixMethod {
    SetField { path: String, value: String },
    SetArray { path: String, values: Vec<String> },
    SetHash { path: String, fields: Options },
    AddField { path: String, value: String },
    CopyField { from: String, to: String },
    MoveField { from: String, to: String },
    RemoveField { paths: Vec<String> },
    Retain { patterns: Vec<String> },
    Vacuum,
    Reject,

    /// `array`: hash to flat key/value array
    ArrayFromHash { path: String },

    /// `hash`: flat key/value array to hash
    HashFromArray { path: String },

    Format { path: String, format: String },

    /// The regex must match a whole value.
    ParseText { path: String, regex: Regex },

    Paste {
        target: String,
        sources: Vec<PasteSource>,
        join: String,
    },

    /// Any [`FieldOp`] applied to the scalars at `path`
    Field { path: String, op: FieldOp },
}

impl FixMethod {
    /// Resolves an operation name with its substituted parameters.
    pub fn compile(name: &str, params: Vec<String>, options: Options, maps: &MapRegistry) -> Result<Self> {
        let method = match name {
            "set_field" => {
                let [path, value] = exactly::<2>(name, params)?;
                FixMethod::SetField { path, value }
            }
            "set_array" => {
                let (path, values) = at_least_one(name, params)?;
                FixMethod::SetArray { path, values }
            }
            "set_hash" => {
                let [path] = exactly::<1>(name, params)?;
                FixMethod::SetHash { path, fields: options }
            }
            "add_field" => {
                let [path, value] = exactly::<2>(name, params)?;
                FixMethod::AddField { path, value }
            }
            "copy_field" => {
                let [from, to] = exactly::<2>(name, params)?;
                FixMethod::CopyField { from, to }
            }
            "move_field" => {
                let [from, to] = exactly::<2>(name, params)?;
                FixMethod::MoveField { from, to }
            }
            "remove_field" => FixMethod::RemoveField { paths: params },
            "retain" => FixMethod::Retain { patterns: params },
            "vacuum" => {
                let [] = exactly::<0>(name, params)?;
                FixMethod::Vacuum
            }
            "reject" => FixMethod::Reject,
            "array" => {
                let [path] = exactly::<1>(name, params)?;
                FixMethod::ArrayFromHash { path }
            }
            "hash" => {
                let [path] = exactly::<1>(name, params)?;
                FixMethod::HashFromArray { path }
            }
            "format" => {
                let [path, format] = exactly::<2>(name, params)?;
                FixMethod::Format { path, format }
            }
            "parse_text" => {
                let [path, pattern] = exactly::<2>(name, params)?;
                FixMethod::ParseText {
                    path,
                    regex: regex(&format!("^(?:{})$", pattern))?,
                }
            }
            "paste" => {
                let (target, sources) = at_least_one(name, params)?;
                let sources = sources
                    .into_iter()
                    .map(|source| match source.strip_prefix(LITERAL_PREFIX) {
                        Some(literal) => PasteSource::Literal(literal.to_string()),
                        None => PasteSource::Field(source),
                    })
                    .collect();
                let join = options.get(JOIN_OPTION).map_or(DEFAULT_JOIN, String::as_str);
                FixMethod::Paste {
                    target,
                    sources,
                    join: join.to_string(),
                }
            }
            "trim" | "upcase" | "downcase" | "capitalize" => {
                let [path] = exactly::<1>(name, params)?;
                let op = match name {
                    "trim" => FieldOp::Trim,
                    "upcase" => FieldOp::Upcase,
                    "downcase" => FieldOp::Downcase,
                    _ => FieldOp::Capitalize,
                };
                FixMethod::Field { path, op }
            }
            "substring" => {
                let [path, start, length] = exactly::<3>(name, params)?;
                FixMethod::Field {
                    path,
                    op: FieldOp::Substring {
                        start: number(name, &start)?,
                        length: number(name, &length)?,
                    },
                }
            }
            "replace_all" => {
                let [path, pattern, replacement] = exactly::<3>(name, params)?;
                FixMethod::Field {
                    path,
                    op: FieldOp::ReplaceAll {
                        regex: regex(&pattern)?,
                        replacement,
                    },
                }
            }
            "lookup" => compile_lookup(params, options, maps)?,
            _ => return Err(FixError::config(format!("Unknown operation: {}", name))),
        };
        Ok(method)
    }

    pub fn name(&self) -> &'static str {
        match self {
            FixMethod::SetField { .. } => "set_field",
            FixMethod::SetArray { .. } => "set_array",
            FixMethod::SetHash { .. } => "set_hash",
            FixMethod::AddField { .. } => "add_field",
            FixMethod::CopyField { .. } => "copy_field",
            FixMethod::MoveField { .. } => "move_field",
            FixMethod::RemoveField { .. } => "remove_field",
            FixMethod::Retain { .. } => "retain",
            FixMethod::Vacuum => "vacuum",
            FixMethod::Reject => "reject",
            FixMethod::ArrayFromHash { .. } => "array",
            FixMethod::HashFromArray { .. } => "hash",
            FixMethod::Format { .. } => "format",
            FixMethod::ParseText { .. } => "parse_text",
            FixMethod::Paste { .. } => "paste",
            FixMethod::Field { op, .. } => op.name(),
        }
    }

    /// Runs this operation against a record.
    pub fn apply(&self, record: &mut Record) -> Result<()> {
        match self {
            FixMethod::SetField { path, value } => record.insert(InsertMode::Replace, path, Value::scalar(value)),
            FixMethod::SetArray { path, values } => {
                let values = values.iter().map(Value::scalar);
                match appended(path) {
                    Some(base) => {
                        for value in values {
                            record.add(base, value)?;
                        }
                        Ok(())
                    }
                    None => record.insert(InsertMode::Replace, path, Value::Array(values.collect())),
                }
            }
            FixMethod::SetHash { path, fields } => {
                let hash: Hash = fields.iter().map(|(k, v)| (k.as_str(), Value::scalar(v))).collect();
                match appended(path) {
                    Some(base) => record.insert(InsertMode::Append, base, Value::Hash(hash)),
                    None => record.insert(InsertMode::Replace, path, Value::Hash(hash)),
                }
            }
            FixMethod::AddField { path, value } => record.add(path, Value::scalar(value)),
            FixMethod::CopyField { from, to } => match found(record, from) {
                Some(value) => record.add(to, value),
                None => Ok(()),
            },
            FixMethod::MoveField { from, to } => match found(record, from) {
                Some(value) => {
                    record.remove_path(from);
                    record.insert(InsertMode::Replace, to, value)
                }
                None => Ok(()),
            },
            FixMethod::RemoveField { paths } => {
                for path in paths {
                    record.remove_path(path);
                }
                Ok(())
            }
            FixMethod::Retain { patterns } => {
                record.retain_fields(patterns.as_slice());
                Ok(())
            }
            FixMethod::Vacuum => {
                record.remove_empty_values();
                Ok(())
            }
            FixMethod::Reject => {
                record.reject();
                Ok(())
            }
            FixMethod::ArrayFromHash { path } => array_from_hash(record, path),
            FixMethod::HashFromArray { path } => hash_from_array(record, path),
            FixMethod::Format { path, format } => match found(record, path) {
                Some(value) => {
                    let formatted = apply_format(format, &value.into_list());
                    record.insert(InsertMode::Replace, path, Value::scalar(formatted))
                }
                None => Ok(()),
            },
            FixMethod::ParseText { path, regex } => parse_text(record, path, regex),
            FixMethod::Paste { target, sources, join } => {
                let parts: Vec<String> = sources
                    .iter()
                    .filter_map(|source| match source {
                        PasteSource::Literal(text) => Some(text.clone()),
                        PasteSource::Field(path) => {
                            found(record, path).and_then(|value| value.into_list().first().map(Value::to_string))
                        }
                    })
                    .collect();
                record.insert(InsertMode::Replace, target, Value::scalar(parts.join(join)))
            }
            FixMethod::Field { path, op } => {
                record.transform_fields(path, |value| op.apply(value));
                Ok(())
            }
        }
    }
}

impl fmt::Display for FixMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

fn compile_lookup(params: Vec<String>, options: Options, maps: &MapRegistry) -> Result<FixMethod> {
    let delete = options.get(DELETE_OPTION).is_some_and(|value| value == "true");
    let map: Arc<dyn Lookup> = match params.as_slice() {
        [_] => Arc::new(
            options
                .iter()
                .filter(|(key, _)| *key != SEP_OPTION && *key != DELETE_OPTION)
                .map(|(key, value)| (key.as_str(), value.as_str()))
                .collect::<InlineMap>(),
        ),
        [_, name] => {
            let separator = options.get(SEP_OPTION).map_or(DEFAULT_SEPARATOR, String::as_str);
            maps.resolve(name, separator)?
        }
        _ => {
            return Err(FixError::config(format!(
                "lookup expects 1 or 2 parameter(s), got {}",
                params.len()
            )));
        }
    };
    let mut params = params;
    params.truncate(1);
    let [path] = exactly::<1>("lookup", params)?;
    Ok(FixMethod::Field {
        path,
        op: FieldOp::Lookup { map, delete },
    })
}

fn exactly<const N: usize>(name: &str, params: Vec<String>) -> Result<[String; N]> {
    let count = params.len();
    params
        .try_into()
        .map_err(|_| FixError::config(format!("{} expects {} parameter(s), got {}", name, N, count)))
}

fn at_least_one(name: &str, params: Vec<String>) -> Result<(String, Vec<String>)> {
    let mut params = params.into_iter();
    let first = params
        .next()
        .ok_or_else(|| FixError::config(format!("{} expects at least 1 parameter", name)))?;
    Ok((first, params.collect()))
}

fn number(name: &str, text: &str) -> Result<usize> {
    text.parse()
        .map_err(|_| FixError::config(format!("{} expects a non-negative number, got '{}'", name, text)))
}

fn regex(pattern: &str) -> Result<Regex> {
    Regex::new(pattern).map_err(|e| FixError::config(format!("Invalid regular expression '{}': {}", pattern, e)))
}

/// The base path of a path ending in `.$append`.
fn appended(path: &str) -> Option<&str> {
    path.strip_suffix(Reference::Append.as_str())?.strip_suffix('.')
}

fn found(record: &Record, path: &str) -> Option<Value> {
    record.find(path).map(Cow::into_owned)
}

/// Substitutes values for `%s` in order. `%%` is a literal percent sign;
/// missing values render as the empty string.
fn apply_format(format: &str, values: &Array) -> String {
    let mut values = values.iter();
    let mut out = String::with_capacity(format.len());
    let mut chars = format.chars().peekable();
    while let Some(c) = chars.next() {
        match (c, chars.peek()) {
            ('%', Some('s')) => {
                chars.next();
                if let Some(value) = values.next() {
                    out.push_str(&value.to_string());
                }
            }
            ('%', Some('%')) => {
                chars.next();
                out.push('%');
            }
            (c, _) => out.push(c),
        }
    }
    out
}

fn array_from_hash(record: &mut Record, path: &str) -> Result<()> {
    let Some(value) = found(record, path) else {
        return Ok(());
    };
    let mut flat = Vec::new();
    for element in value.into_list() {
        if let Value::Hash(hash) = element {
            for (field, value) in hash {
                flat.push(Value::scalar(field));
                flat.push(value);
            }
        }
    }
    if flat.is_empty() {
        return Ok(());
    }
    record.insert(InsertMode::Replace, path, Value::Array(flat.into_iter().collect()))
}

fn hash_from_array(record: &mut Record, path: &str) -> Result<()> {
    let Some(value) = found(record, path) else {
        return Ok(());
    };
    let values: Vec<Value> = value.into_list().into_iter().collect();
    let mut hash = Hash::new();
    for pair in values.chunks_exact(2) {
        hash.put(&pair[0].to_string(), pair[1].clone());
    }
    record.insert(InsertMode::Replace, path, Value::Hash(hash))
}

fn parse_text(record: &mut Record, path: &str, regex: &Regex) -> Result<()> {
    let Some(value) = found(record, path) else {
        return Ok(());
    };
    let names: Vec<&str> = regex.capture_names().flatten().collect();
    let mut removed = false;
    for element in value.into_list() {
        let Value::Scalar(scalar) = element else {
            continue;
        };
        let Some(captures) = regex.captures(scalar.as_str()) else {
            continue;
        };
        if !removed {
            record.remove_path(path);
            removed = true;
        }
        if names.is_empty() {
            for group in captures.iter().skip(1).flatten() {
                record.add(path, Value::scalar(group.as_str()))?;
            }
        } else {
            let parsed: Hash = names
                .iter()
                .filter_map(|name| captures.name(name).map(|group| (*name, Value::scalar(group.as_str()))))
                .collect();
            record.add(path, Value::Hash(parsed))?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format() {
        let values: Array = vec![Value::from("a"), Value::from("b")].into_iter().collect();
        assert_eq!(apply_format("%s-%s (100%%) %s", &values), "a-b (100%) ");
    }

    #[test]
    fn test_appended() {
        assert_eq!(appended("a.b.$append"), Some("a.b"));
        assert_eq!(appended("a.b"), None);
        assert_eq!(appended("$append"), None);
    }

    #[test]
    fn test_capitalize_unicode() {
        assert_eq!(FieldOp::Capitalize.apply("ärger").as_deref(), Some("Ärger"));
        assert_eq!(FieldOp::Capitalize.apply("").as_deref(), Some(""));
    }

    #[test]
    fn test_substring_clamps() {
        let op = FieldOp::Substring { start: 2, length: 10 };
        assert_eq!(op.apply("abcdef").as_deref(), Some("cdef"));
        assert_eq!(op.apply("a").as_deref(), Some(""));
    }

    #[test]
    fn test_arity() {
        let maps = MapRegistry::new();
        let err = FixMethod::compile("set_field", vec!["a".into()], Options::new(), &maps).unwrap_err();
        assert_eq!(err.to_string(), "Configuration error: set_field expects 2 parameter(s), got 1");
    }

    #[test]
    fn test_unknown_operation() {
        let maps = MapRegistry::new();
        assert!(FixMethod::compile("frobnicate", vec![], Options::new(), &maps).is_err());
    }
}

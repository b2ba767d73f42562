//! Conditional predicates for `if`, `elsif` and `unless`.
//!
//! A conditional name is either `exists` or `<quantifier>_<predicate>`:
//!
//! | quantifier | holds when |
//! |---|---|
//! | `all` | every value at the path satisfies the predicate |
//! | `any` | at least one value does |
//! | `none` | `any` does not hold |
//!
//! Predicates are `contain`, `equal` and `match`; the third-person forms
//! (`contains`, `equals`, `matches`) are accepted too. `match` searches the
//! value with a regular expression. Only scalar values can satisfy a predicate.

use std::{borrow::Cow, fmt};

use regex::Regex;

use crate::{
    error::{FixError, Result},
    value::{Hash, Value},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Quantifier {
    All,
    Any,
    None,
}

impl Quantifier {
    fn parse(token: &str) -> Option<Self> {
        match token {
            "all" => Some(Quantifier::All),
            "any" => Some(Quantifier::Any),
            "none" => Some(Quantifier::None),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub enum Predicate {
    Contains(String),
    Equals(String),
    Matches(Regex),
}

impl Predicate {
    fn parse(token: &str, argument: &str) -> Result<Self> {
        match token {
            "contain" | "contains" => Ok(Predicate::Contains(argument.to_string())),
            "equal" | "equals" => Ok(Predicate::Equals(argument.to_string())),
            "match" | "matches" => Regex::new(argument)
                .map(Predicate::Matches)
                .map_err(|e| FixError::config(format!("Invalid regular expression '{}': {}", argument, e))),
            other => Err(FixError::config(format!("Unknown predicate: {}", other))),
        }
    }

    pub fn test(&self, value: &Value) -> bool {
        let Value::Scalar(scalar) = value else {
            return false;
        };
        let text = scalar.as_str();
        match self {
            Predicate::Contains(needle) => text.contains(needle.as_str()),
            Predicate::Equals(expected) => text == expected,
            Predicate::Matches(regex) => regex.is_match(text),
        }
    }
}

/// A compiled conditional.
#[derive(Debug, Clone)]
pub enum Conditional {
    /// `exists(path)`
    Exists { path: String },

    /// `<quantifier>_<predicate>(path, argument)`
    Quantified {
        quantifier: Quantifier,
        predicate: Predicate,
        path: String,
    },
}

impl Conditional {
    /// Resolves a conditional name and its parameters.
    ///
    /// # Examples
    ///
    /// ```
    /// use recfix::fix::Conditional;
    ///
    /// assert!(Conditional::parse("any_equal", &["tags".into(), "x".into()]).is_ok());
    /// assert!(Conditional::parse("equal", &["tags".into(), "x".into()]).is_err());
    /// ```
    pub fn parse(name: &str, params: &[String]) -> Result<Self> {
        if name == "exists" {
            return match params {
                [path] => Ok(Conditional::Exists { path: path.clone() }),
                _ => Err(arity(name, 1, params.len())),
            };
        }
        let Some((quantifier, predicate)) = name.split_once('_') else {
            return Err(FixError::config(format!(
                "Missing quantifier prefix (all_, any_, none_) for {}",
                name
            )));
        };
        let quantifier = Quantifier::parse(quantifier)
            .ok_or_else(|| FixError::config(format!("Unknown quantifier: {}", quantifier)))?;
        let [path, argument] = params else {
            return Err(arity(name, 2, params.len()));
        };
        Ok(Conditional::Quantified {
            quantifier,
            predicate: Predicate::parse(predicate, argument)?,
            path: path.clone(),
        })
    }

    pub fn test(&self, record: &Hash) -> bool {
        let result = match self {
            Conditional::Exists { path } => record.find(path).is_some(),
            Conditional::Quantified {
                quantifier,
                predicate,
                path,
            } => {
                let values = record.find(path).map(Cow::into_owned).map(Value::into_list);
                match (quantifier, values) {
                    (Quantifier::All, Some(values)) => {
                        !values.is_empty() && values.iter().all(|value| predicate.test(value))
                    }
                    (Quantifier::Any, Some(values)) => values.iter().any(|value| predicate.test(value)),
                    (Quantifier::None, Some(values)) => !values.iter().any(|value| predicate.test(value)),
                    (Quantifier::None, None) => true,
                    (_, None) => false,
                }
            }
        };
        log::debug!("Conditional {} -> {}", self, result);
        result
    }
}

impl fmt::Display for Conditional {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Conditional::Exists { path } => write!(f, "exists({})", path),
            Conditional::Quantified {
                quantifier,
                predicate,
                path,
            } => {
                let quantifier = match quantifier {
                    Quantifier::All => "all",
                    Quantifier::Any => "any",
                    Quantifier::None => "none",
                };
                match predicate {
                    Predicate::Contains(s) => write!(f, "{}_contain({}, {})", quantifier, path, s),
                    Predicate::Equals(s) => write!(f, "{}_equal({}, {})", quantifier, path, s),
                    Predicate::Matches(r) => write!(f, "{}_match({}, {})", quantifier, path, r.as_str()),
                }
            }
        }
    }
}

fn arity(name: &str, expected: usize, actual: usize) -> FixError {
    FixError::config(format!(
        "{} expects {} parameter(s), got {}",
        name, expected, actual
    ))
}

//! Field-name patterns and their process-wide match cache.
//!
//! A pattern is one or more terms separated by `|`. A term without wildcard
//! metacharacters names a field exactly; otherwise `*`, `?` and `[...]` (with
//! `[!...]` for negation) are interpreted glob-style.
//!
//! Compiled patterns are shared by every [`Hash`](super::Hash) in the process
//! and keyed by pattern text. Each compiled pattern also memoizes its verdict
//! per field name. Entries are never invalidated, which is sound only because
//! field names are never renamed in place: a field is removed and a new one is
//! added instead.

use std::sync::Arc;

use dashmap::DashMap;
use once_cell::sync::Lazy;
use regex::Regex;

const ALTERNATION: char = '|';

static PATTERNS: Lazy<DashMap<String, Arc<FieldPattern>>> = Lazy::new(DashMap::new);

/// Returns the compiled form of `pattern`, compiling it on first use.
pub fn compile(pattern: &str) -> Arc<FieldPattern> {
    if let Some(compiled) = PATTERNS.get(pattern) {
        return Arc::clone(compiled.value());
    }
    // Two threads may compile the same pattern; both results are identical.
    let compiled = Arc::new(FieldPattern::new(pattern));
    PATTERNS
        .entry(pattern.to_string())
        .or_insert(compiled)
        .value()
        .clone()
}

/// Number of distinct patterns compiled so far.
pub fn cached_patterns() -> usize {
    PATTERNS.len()
}

/// True if `term` contains a glob metacharacter.
pub fn is_wildcard(term: &str) -> bool {
    metachar_position(term).is_some()
}

/// True if `pattern` needs more than an exact field lookup.
pub fn is_pattern(pattern: &str) -> bool {
    pattern.contains(ALTERNATION) || is_wildcard(pattern)
}

#[derive(Debug)]
enum Term {
    Exact(String),
    Wildcard { prefix: String, regex: Regex },
}

impl Term {
    fn parse(term: &str) -> Term {
        let Some(start) = metachar_position(term) else {
            return Term::Exact(term.to_string());
        };
        match Regex::new(&glob_to_regex(term)) {
            Ok(regex) => Term::Wildcard {
                prefix: term[..start].to_string(),
                regex,
            },
            Err(e) => {
                log::warn!("Matching field pattern '{}' literally: {}", term, e);
                Term::Exact(term.to_string())
            }
        }
    }
}

/// A compiled field-name pattern.
#[derive(Debug)]
pub struct FieldPattern {
    terms: Vec<Term>,
    verdicts: DashMap<String, bool>,
}

impl FieldPattern {
    fn new(pattern: &str) -> Self {
        FieldPattern {
            terms: pattern.split(ALTERNATION).map(Term::parse).collect(),
            verdicts: DashMap::new(),
        }
    }

    /// Tests a field name against every term.
    pub fn matches(&self, field: &str) -> bool {
        if let Some(verdict) = self.verdicts.get(field) {
            return *verdict;
        }
        let verdict = self.terms.iter().any(|term| match term {
            Term::Exact(name) => name == field,
            Term::Wildcard { prefix, regex } => field.starts_with(prefix.as_str()) && regex.is_match(field),
        });
        self.verdicts.insert(field.to_string(), verdict);
        verdict
    }
}

/// Byte offset of the first metacharacter, which ends the static prefix.
fn metachar_position(term: &str) -> Option<usize> {
    let chars: Vec<(usize, char)> = term.char_indices().collect();
    chars.iter().enumerate().find_map(|(i, &(offset, c))| match c {
        '*' | '?' => Some(offset),
        '[' if class_end(&chars, i).is_some() => Some(offset),
        _ => None,
    })
}

/// Index of the `]` closing a non-empty character class opened at `start`.
/// A bare `[]` (the array marker) is not a class.
fn class_end(chars: &[(usize, char)], start: usize) -> Option<usize> {
    (start + 2..chars.len()).find(|&i| chars[i].1 == ']')
}

fn glob_to_regex(term: &str) -> String {
    let chars: Vec<(usize, char)> = term.char_indices().collect();
    let mut out = String::from("^");
    let mut i = 0;
    while i < chars.len() {
        match chars[i].1 {
            '*' => out.push_str(".*"),
            '?' => out.push('.'),
            '[' => match class_end(&chars, i) {
                Some(end) => {
                    let body: String = chars[i + 1..end].iter().map(|&(_, c)| c).collect();
                    out.push('[');
                    match body.strip_prefix('!') {
                        Some(negated) => {
                            out.push('^');
                            out.push_str(&escape_class(negated));
                        }
                        None => out.push_str(&escape_class(&body)),
                    }
                    out.push(']');
                    i = end;
                }
                None => out.push_str(r"\["),
            },
            c => out.push_str(&regex::escape(c.encode_utf8(&mut [0; 4]))),
        }
        i += 1;
    }
    out.push('$');
    out
}

fn escape_class(body: &str) -> String {
    let mut out = String::with_capacity(body.len());
    for c in body.chars() {
        if matches!(c, '\\' | '[' | '&' | '~' | '^') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

//! # Operation Scripts
//!
//! An operation script is a JSON array of nodes, each tagged by `kind`:
//!
//! ```json
//! [
//!   {"kind": "call", "name": "upcase", "params": ["title"]},
//!   {"kind": "if", "name": "any_equal", "params": ["type", "book"],
//!    "then": [{"kind": "call", "name": "add_field", "params": ["genre", "print"]}],
//!    "elsif": [{"name": "exists", "params": ["url"], "then": []}],
//!    "else": [{"kind": "call", "name": "reject"}]},
//!   {"kind": "unless", "name": "exists", "params": ["id"], "then": []},
//!   {"kind": "bind", "name": "list", "var": "$i", "path": "author", "body": []}
//! ]
//! ```
//!
//! A script is parsed into [`OperationNode`]s and then compiled once into
//! [`Expression`]s. Compilation substitutes `$[name]` variable references,
//! resolves every operation and conditional name and prepares regular
//! expressions and lookup maps, so that no name is resolved per record.

pub mod conditional;
pub mod method;

use std::{fs, path::Path};

use indexmap::IndexMap;
use serde::Deserialize;

use crate::{
    error::{FixError, Result},
    lookup::MapRegistry,
};

pub use conditional::{Conditional, Predicate, Quantifier};
pub use method::{FieldOp, FixMethod};

/// The process-wide variable table, read-only once the script is compiled.
pub type Vars = IndexMap<String, String>;

/// Named options of a call, in script order.
pub type Options = IndexMap<String, String>;

const VAR_START: &str = "$[";
const VAR_END: char = ']';

/// One node of an operation script.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum OperationNode {
    /// A named operation
    ///
    /// # Examples
    /// - `{"kind": "call", "name": "trim", "params": ["title"]}`
    /// - `{"kind": "call", "name": "paste", "params": ["x", "a", "~-", "b"], "options": {"join_char": ""}}`
    Call {
        name: String,
        #[serde(default)]
        params: Vec<String>,
        #[serde(default)]
        options: Options,
    },

    /// `if` with any number of `elsif` branches and an optional `else`
    If {
        name: String,
        #[serde(default)]
        params: Vec<String>,
        #[serde(default)]
        then: Vec<OperationNode>,
        #[serde(default)]
        elsif: Vec<ElsIf>,
        #[serde(default, rename = "else")]
        otherwise: Vec<OperationNode>,
    },

    /// Runs its body when the conditional does not hold
    Unless {
        name: String,
        #[serde(default)]
        params: Vec<String>,
        #[serde(default)]
        then: Vec<OperationNode>,
    },

    /// Runs its body once per value found at `path`, with the value bound to `var`
    Bind {
        name: String,
        var: String,
        path: String,
        #[serde(default)]
        body: Vec<OperationNode>,
    },
}

/// An `elsif` branch of an [`OperationNode::If`].
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ElsIf {
    pub name: String,
    #[serde(default)]
    pub params: Vec<String>,
    #[serde(default)]
    pub then: Vec<OperationNode>,
}

/// A parsed, not yet compiled, operation script.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Fix {
    nodes: Vec<OperationNode>,
}

impl Fix {
    pub fn new(nodes: Vec<OperationNode>) -> Self {
        Fix { nodes }
    }

    pub fn from_json(text: &str) -> Result<Self> {
        Ok(Fix::new(serde_json::from_str(text)?))
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| FixError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Fix::from_json(&text)
    }

    pub fn nodes(&self) -> &[OperationNode] {
        &self.nodes
    }

    /// Compiles the script against a variable table and a map registry.
    pub fn compile(&self, vars: &Vars, maps: &MapRegistry) -> Result<Vec<Expression>> {
        let compiler = Compiler { vars, maps };
        compiler.compile_all(&self.nodes)
    }
}

/// A compiled operation node.
#[derive(Debug)]
pub enum Expression {
    Call(FixMethod),

    /// Branches are tested in order; the first that holds runs.
    If {
        branches: Vec<(Conditional, Vec<Expression>)>,
        otherwise: Vec<Expression>,
    },

    Unless {
        conditional: Conditional,
        body: Vec<Expression>,
    },

    /// `list` binding: iterate the values at `path` under the name `var`
    Bind {
        var: String,
        path: String,
        body: Vec<Expression>,
    },
}

struct Compiler<'a> {
    vars: &'a Vars,
    maps: &'a MapRegistry,
}

impl Compiler<'_> {
    fn compile_all(&self, nodes: &[OperationNode]) -> Result<Vec<Expression>> {
        nodes.iter().map(|node| self.compile(node)).collect()
    }

    fn compile(&self, node: &OperationNode) -> Result<Expression> {
        match node {
            OperationNode::Call { name, params, options } => {
                let params = self.resolve_all(params)?;
                let options = options
                    .iter()
                    .map(|(key, value)| Ok((key.clone(), self.resolve(value)?)))
                    .collect::<Result<Options>>()?;
                Ok(Expression::Call(FixMethod::compile(name, params, options, self.maps)?))
            }
            OperationNode::If {
                name,
                params,
                then,
                elsif,
                otherwise,
            } => {
                let mut branches = vec![(self.conditional(name, params)?, self.compile_all(then)?)];
                for branch in elsif {
                    branches.push((
                        self.conditional(&branch.name, &branch.params)?,
                        self.compile_all(&branch.then)?,
                    ));
                }
                Ok(Expression::If {
                    branches,
                    otherwise: self.compile_all(otherwise)?,
                })
            }
            OperationNode::Unless { name, params, then } => Ok(Expression::Unless {
                conditional: self.conditional(name, params)?,
                body: self.compile_all(then)?,
            }),
            OperationNode::Bind { name, var, path, body } => {
                if name != "list" {
                    return Err(FixError::config(format!("Unknown bind: {}", name)));
                }
                Ok(Expression::Bind {
                    var: var.clone(),
                    path: self.resolve(path)?,
                    body: self.compile_all(body)?,
                })
            }
        }
    }

    fn conditional(&self, name: &str, params: &[String]) -> Result<Conditional> {
        Conditional::parse(name, &self.resolve_all(params)?)
    }

    fn resolve_all(&self, params: &[String]) -> Result<Vec<String>> {
        params.iter().map(|param| self.resolve(param)).collect()
    }

    fn resolve(&self, text: &str) -> Result<String> {
        substitute(text, self.vars)
    }
}

/// Replaces every `$[name]` in `text` with the value of `name` in `vars`.
///
/// An unterminated `$[` is kept as-is.
///
/// # Examples
///
/// ```
/// use recfix::fix::{Vars, substitute};
///
/// let mut vars = Vars::new();
/// vars.insert("lang".to_string(), "de".to_string());
/// assert_eq!(substitute("title_$[lang]", &vars).unwrap(), "title_de");
/// assert!(substitute("$[missing]", &vars).is_err());
/// ```
pub fn substitute(text: &str, vars: &Vars) -> Result<String> {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(start) = rest.find(VAR_START) {
        let after = &rest[start + VAR_START.len()..];
        let Some(end) = after.find(VAR_END) else {
            break;
        };
        let name = &after[..end];
        let value = vars
            .get(name)
            .ok_or_else(|| FixError::config(format!("Undefined variable: {}", name)))?;
        out.push_str(&rest[..start]);
        out.push_str(value);
        rest = &after[end + 1..];
    }
    out.push_str(rest);
    Ok(out)
}

//! Compile an operation script without running it

use std::path::PathBuf;

use super::CliError;
use crate::{Fix, MapRegistry, Metafix, Vars, fix::Expression};

/// Options for the check command
#[derive(Debug, Clone, Default)]
pub struct CheckOptions {
    /// Location of the JSON operation script
    pub fix: PathBuf,
    /// Variables referenced by the script
    pub vars: Vars,
}

/// Result of a successful check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CheckReport {
    /// Number of operation nodes, nested ones included
    pub operations: usize,
}

/// Parse and compile a script, resolving every name, variable and lookup map
pub fn execute_check(options: &CheckOptions) -> Result<CheckReport, CliError> {
    let fix = Fix::from_path(&options.fix)?;
    let metafix = Metafix::with_maps(&fix, &options.vars, &MapRegistry::new())?;
    Ok(CheckReport {
        operations: count(metafix.expressions()),
    })
}

fn count(expressions: &[Expression]) -> usize {
    expressions
        .iter()
        .map(|expression| match expression {
            Expression::Call(_) => 1,
            Expression::If { branches, otherwise } => {
                1 + branches.iter().map(|(_, body)| count(body)).sum::<usize>() + count(otherwise)
            }
            Expression::Unless { body, .. } | Expression::Bind { body, .. } => 1 + count(body),
        })
        .sum()
}

//! CLI support for recfix
//!
//! Provides programmatic access to the `run` and `check` commands for
//! embedding in other tools.

mod check;
mod run;

pub use check::{CheckOptions, CheckReport, execute_check};
pub use run::{RunOptions, RunReport, execute_run};

use std::{fs, io, path::Path};

use thiserror::Error;

use crate::{FixError, Vars};

/// Errors that can occur during CLI operations
#[derive(Error, Debug)]
pub enum CliError {
    /// Script compilation or record transformation failed
    #[error(transparent)]
    Fix(#[from] FixError),

    /// Malformed input document
    #[error("Invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// No input provided
    #[error("No input provided. Use --input or pipe JSON to stdin.")]
    NoInput,

    /// A `--var` argument without `=`
    #[error("Invalid variable '{0}', expected NAME=VALUE")]
    InvalidVar(String),
}

/// Builds the variable table from an optional JSON file and `NAME=VALUE`
/// assignments. Assignments override file entries.
pub fn parse_vars(assignments: &[String], file: Option<&Path>) -> Result<Vars, CliError> {
    let mut vars = match file {
        Some(path) => {
            let text = fs::read_to_string(path).map_err(|source| FixError::Io {
                path: path.to_path_buf(),
                source,
            })?;
            serde_json::from_str::<Vars>(&text)?
        }
        None => Vars::new(),
    };
    for assignment in assignments {
        let (name, value) = assignment
            .split_once('=')
            .ok_or_else(|| CliError::InvalidVar(assignment.clone()))?;
        vars.insert(name.to_string(), value.to_string());
    }
    Ok(vars)
}

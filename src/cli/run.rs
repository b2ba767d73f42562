//! Transform JSON records with an operation script

use std::path::PathBuf;

use serde_json::{Deserializer, Value as JsonValue};

use super::CliError;
use crate::{
    Fix, Metafix, Outcome, Record, Vars,
    convert::{json_to_record, to_literals},
    output::{to_json, to_json_pretty},
};

/// Options for the run command
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    /// Location of the JSON operation script
    pub fix: PathBuf,
    /// JSON input: a stream of objects, or arrays of objects
    pub input: Option<String>,
    /// Variables referenced by the script
    pub vars: Vars,
    /// Print `path<TAB>value` lines instead of JSON
    pub flat: bool,
    /// Pretty-print JSON output
    pub pretty: bool,
}

/// Rendered output of a run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunReport {
    /// One entry per emitted record
    pub output: Vec<String>,
    pub emitted: usize,
    pub rejected: usize,
}

/// Transform every record of the input
pub fn execute_run(options: &RunOptions) -> Result<RunReport, CliError> {
    let fix = Fix::from_path(&options.fix)?;
    let metafix = Metafix::new(&fix, &options.vars)?;
    let input = options.input.as_ref().ok_or(CliError::NoInput)?;

    let mut report = RunReport::default();
    for document in Deserializer::from_str(input).into_iter::<JsonValue>() {
        let documents = match document? {
            JsonValue::Array(items) => items,
            single => vec![single],
        };
        for json in documents {
            match metafix.transform(json_to_record(json)?)? {
                Outcome::Emit(record) => {
                    report.output.push(render(&record, options)?);
                    report.emitted += 1;
                }
                Outcome::Rejected(_) => {
                    report.rejected += 1;
                    log::info!("Rejected record {}", report.emitted + report.rejected);
                }
            }
        }
    }
    Ok(report)
}

fn render(record: &Record, options: &RunOptions) -> Result<String, CliError> {
    let rendered = if options.flat {
        to_literals(record)
            .into_iter()
            .map(|(path, value)| format!("{}\t{}", path, value))
            .collect::<Vec<_>>()
            .join("\n")
    } else if options.pretty {
        to_json_pretty(record)?
    } else {
        to_json(record)?
    };
    Ok(rendered)
}

use clap::{Parser as ClapParser, Subcommand};
use recfix::cli::{self, CheckOptions, CliError, RunOptions};
use std::{
    fs,
    io::{self, Read},
    path::PathBuf,
};

#[derive(ClapParser)]
#[command(name = "recfix")]
#[command(about = "recfix - Transform metadata records with path-addressed operation scripts")]
#[command(version)]
struct Cli {
    /// Log conditionals and binds (overridden by RUST_LOG)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Transform JSON records with an operation script
    Run {
        /// The JSON operation script
        #[arg(short, long)]
        fix: PathBuf,

        /// JSON input file (reads from stdin if not provided)
        #[arg(short, long)]
        input: Option<PathBuf>,

        /// Script variable as NAME=VALUE (repeatable)
        #[arg(long = "var", value_name = "NAME=VALUE")]
        var: Vec<String>,

        /// JSON object of script variables
        #[arg(long)]
        vars: Option<PathBuf>,

        /// Print path/value lines instead of JSON
        #[arg(long)]
        flat: bool,

        /// Pretty-print the output
        #[arg(short, long)]
        pretty: bool,
    },

    /// Compile an operation script without running it
    Check {
        /// The JSON operation script
        #[arg(short, long)]
        fix: PathBuf,

        /// Script variable as NAME=VALUE (repeatable)
        #[arg(long = "var", value_name = "NAME=VALUE")]
        var: Vec<String>,

        /// JSON object of script variables
        #[arg(long)]
        vars: Option<PathBuf>,
    },
}

fn main() {
    let cli = Cli::parse();

    let level = if cli.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    let result = match cli.command {
        Commands::Run {
            fix,
            input,
            var,
            vars,
            flat,
            pretty,
        } => run(fix, input, var, vars, flat, pretty),
        Commands::Check { fix, var, vars } => check(fix, var, vars),
    };

    if let Err(e) = result {
        eprintln!("{}", e);
        std::process::exit(1);
    }
}

fn run(
    fix: PathBuf,
    input: Option<PathBuf>,
    var: Vec<String>,
    vars: Option<PathBuf>,
    flat: bool,
    pretty: bool,
) -> Result<(), CliError> {
    let input = match input {
        Some(path) => Some(fs::read_to_string(path)?),
        None if !atty::is(atty::Stream::Stdin) => {
            let mut buffer = String::new();
            io::stdin().read_to_string(&mut buffer)?;
            Some(buffer)
        }
        None => None,
    };

    let options = RunOptions {
        fix,
        input,
        vars: cli::parse_vars(&var, vars.as_deref())?,
        flat,
        pretty,
    };

    let report = cli::execute_run(&options)?;
    for record in &report.output {
        println!("{}", record);
    }
    if report.rejected > 0 {
        log::info!("{} emitted, {} rejected", report.emitted, report.rejected);
    }
    Ok(())
}

fn check(fix: PathBuf, var: Vec<String>, vars: Option<PathBuf>) -> Result<(), CliError> {
    let options = CheckOptions {
        fix,
        vars: cli::parse_vars(&var, vars.as_deref())?,
    };
    let report = cli::execute_check(&options)?;
    println!("Script is valid ({} operations)", report.operations);
    Ok(())
}

//! CLI command definitions and handlers

mod check;
mod init;

pub use check::CheckArgs;

use crate::error::{GovernanceError, EXIT_FATAL};
use anyhow::Result;
use clap::{Parser, Subcommand};
use console::style;
use std::path::PathBuf;

/// Parse and validate workers count (1-64)
fn parse_workers(s: &str) -> Result<usize, String> {
    let n: usize = s
        .parse()
        .map_err(|_| format!("'{}' is not a valid number", s))?;
    if n == 0 {
        Err("workers must be at least 1".to_string())
    } else if n > 64 {
        Err("workers cannot exceed 64".to_string())
    } else {
        Ok(n)
    }
}

/// archgate - Architectural governance gate
#[derive(Parser, Debug)]
#[command(name = "archgate")]
#[command(
    version,
    about = "Architectural governance gate: score component cost, flag threshold violations, pass or fail the build",
    long_about = "archgate walks a source tree, assigns every component directory a composite \
cost approximating structural complexity and coupling, compares it against an environment- \
and branch-aware threshold, and exits non-zero when the build should fail.\n\n\
Run without a subcommand to check the current directory:\n  \
archgate",
    after_help = "\
Examples:
  archgate                                   Check the current directory
  archgate --project-root ../svc check       Check another project
  archgate check --format json -o gate.json  JSON report for CI artifacts
  archgate check --environment production    Fail on any violation
  archgate check --branch feature/login      Skip the git branch lookup
  archgate init                              Write archgate.toml with defaults

Exit codes:
  0  pass
  1  governance failure (violations under a failing policy, or emergency action)
  2  fatal error: invalid configuration, missing root, no components
     Fatal errors never exit 1, so wrappers can tell \"did not evaluate\"
     apart from \"failed governance\""
)]
pub struct Cli {
    /// Project root to scan
    #[arg(long, global = true, default_value = ".")]
    pub project_root: PathBuf,

    /// Log level (error, warn, info, debug, trace); RUST_LOG overrides
    #[arg(long, global = true, default_value = "warn", value_parser = ["error", "warn", "info", "debug", "trace"])]
    pub log_level: String,

    /// Number of parallel workers (1-64)
    #[arg(long, global = true, default_value = "8", value_parser = parse_workers)]
    pub workers: usize,

    /// Configuration file (default: archgate.toml or .archgaterc.json in the project root)
    #[arg(long, global = true, env = "ARCHGATE_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Score components and decide pass/fail (default)
    #[command(after_help = "\
Examples:
  archgate check                                  Console summary, environment policy
  archgate check --format markdown -o audit.md    Markdown audit artifact
  archgate check --fail-on-violations             Fail on any violation, any environment
  archgate check --no-fail                        Only emergencies fail the run")]
    Check(CheckArgs),

    /// Write an archgate.toml with the default settings
    Init,
}

/// Run the selected command and return the process exit code.
pub fn run(cli: Cli) -> Result<i32> {
    match cli.command {
        Some(Commands::Init) => init::run(&cli.project_root).map(|_| 0),
        Some(Commands::Check(args)) => {
            check::run(&cli.project_root, cli.config.as_deref(), cli.workers, args)
        }
        None => check::run(
            &cli.project_root,
            cli.config.as_deref(),
            cli.workers,
            CheckArgs::default(),
        ),
    }
}

/// Print a fatal error banner and return its exit code.
///
/// Governance errors also report how many files were processed before the
/// failure.
pub fn report_fatal(err: &anyhow::Error) -> i32 {
    eprintln!("{} {:#}", style("error:").red().bold(), err);

    match err.downcast_ref::<GovernanceError>() {
        Some(governance) => {
            eprintln!(
                "{} files processed before failure",
                style(governance.files_processed()).cyan()
            );
            governance.exit_code()
        }
        None => EXIT_FATAL,
    }
}

//! Ralph: depth-first agent orchestrator for hierarchical backlogs.
//!
//! This is the main entry point for the `ralph` CLI. It parses arguments,
//! installs the log subscriber, dispatches to the appropriate command
//! handler, and handles errors with proper exit codes.

mod cli;
mod commands;
pub mod agent;
pub mod cascade;
pub mod config;
pub mod context;
pub mod dispatch;
pub mod error;
pub mod events;
pub mod exit_codes;
pub mod fs;
pub mod graph;
pub mod orchestrator;
pub mod scheduler;
pub mod task;
pub mod tracker;

#[cfg(test)]
mod test_support;

use anyhow::Context;
use cli::Cli;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

/// Environment variable holding an `EnvFilter` directive.
const LOG_ENV: &str = "RALPH_LOG";

fn main() -> ExitCode {
    let cli = Cli::parse_args();

    if let Err(err) = init_logging(cli.verbose) {
        eprintln!("Warning: {:#}", err);
    }

    match commands::dispatch(cli.command) {
        Ok(()) => ExitCode::from(exit_codes::SUCCESS as u8),
        Err(err) => {
            eprintln!("Error: {}", err);
            ExitCode::from(err.exit_code() as u8)
        }
    }
}

/// Install the stderr log subscriber. `RALPH_LOG` wins over `-v`.
fn init_logging(verbose: u8) -> anyhow::Result<()> {
    let filter = match std::env::var(LOG_ENV) {
        Ok(directive) if !directive.trim().is_empty() => EnvFilter::try_new(&directive)
            .with_context(|| format!("invalid {} directive '{}'", LOG_ENV, directive))?,
        _ => EnvFilter::new(level_for(verbose)),
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init()
        .map_err(|e| anyhow::anyhow!("failed to install log subscriber: {}", e))
}

fn level_for(verbose: u8) -> &'static str {
    match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    }
}

//! CLI argument parsing for ralph.
//!
//! Uses clap derive macros for declarative argument definitions.
//! This module defines the command structure; actual implementations
//! are in the `commands` module.

use clap::{ArgAction, Args, Parser, Subcommand};
use std::path::PathBuf;

/// Ralph: depth-first agent orchestrator for hierarchical backlogs.
///
/// Repeatedly picks the deepest ready task from the issue tracker, hands it
/// to the specialist agent its `agent:<type>` label names, and closes parent
/// tasks once all their children are done.
#[derive(Parser, Debug)]
#[command(name = "ralph")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace).
    ///
    /// `RALPH_LOG` takes precedence when set.
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

/// Available commands for ralph.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Process the backlog until no eligible task remains.
    ///
    /// Each pass re-queries the tracker, runs the deepest ready task through
    /// its agent, then cascades completion up the hierarchy.
    Orchestrate(OrchestrateArgs),

    /// List configured agents and which identities use built-in prompts.
    Agents,

    /// Scaffold `.claude/agents/` and a default `orchestrator.yaml`.
    Init(InitArgs),
}

/// Arguments for the `orchestrate` command.
#[derive(Args, Debug, Default)]
pub struct OrchestrateArgs {
    /// Stop after processing this many tasks.
    #[arg(short = 'n', long, value_parser = clap::value_parser!(u32).range(1..))]
    pub max_iterations: Option<u32>,

    /// Only process tasks carrying a label matching this pattern (glob).
    #[arg(short, long)]
    pub label: Option<String>,

    /// Show what would run without launching agents or updating tasks.
    #[arg(long)]
    pub dry_run: bool,

    /// Use this model for every agent, overriding agent configuration.
    #[arg(long)]
    pub model: Option<String>,

    /// Do not close tasks (or their parents) after a successful agent run.
    #[arg(long)]
    pub no_auto_complete: bool,

    /// Process a single task and exit.
    #[arg(long)]
    pub single: bool,

    /// Run in-progress tasks before ready ones.
    #[arg(long)]
    pub resume: bool,

    /// List configured agents and exit.
    #[arg(long)]
    pub list_agents: bool,
}

/// Arguments for the `init` command.
#[derive(Args, Debug, Default)]
pub struct InitArgs {
    /// Project directory to scaffold (defaults to the current directory).
    pub target: Option<PathBuf>,

    /// Overwrite existing agent files and configuration.
    #[arg(short, long, conflicts_with = "merge")]
    pub force: bool,

    /// Only add files that do not exist yet.
    #[arg(short, long)]
    pub merge: bool,

    /// Print every file written or skipped.
    #[arg(short, long)]
    pub verbose: bool,
}

impl Cli {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }
}

//! Command implementations for ralph.
//!
//! This module provides the dispatcher that routes CLI commands to their
//! implementations.

mod agents;
mod init;
mod orchestrate;

use crate::cli::Command;
use crate::error::Result;

/// Dispatch a command to its implementation.
pub fn dispatch(command: Command) -> Result<()> {
    match command {
        Command::Orchestrate(args) => orchestrate::cmd_orchestrate(args),
        Command::Agents => agents::cmd_agents(),
        Command::Init(args) => init::cmd_init(args),
    }
}

//! Agent process launching.
//!
//! The orchestrator hands each leaf task to an external agent process and
//! waits for it to exit. [`AgentRunner`] is the seam: [`CommandRunner`]
//! launches the configured CLI, tests substitute a scripted runner.
//!
//! There is no timeout here. How long an agent may run is the agent CLI's
//! own concern.

mod command;

pub use command::CommandRunner;

use crate::agent::config::AgentConfig;
use crate::error::Result;
use std::path::PathBuf;
use std::time::Duration;

/// Everything needed to launch one agent for one task.
#[derive(Debug, Clone, Copy)]
pub struct AgentInvocation<'a> {
    pub task_id: &'a str,
    /// Effective agent configuration, model override already applied.
    pub agent: &'a AgentConfig,
    /// Rendered task prompt.
    pub prompt: &'a str,
}

/// How an agent process ended.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunnerExit {
    /// Exit code; `None` if the process was killed by a signal.
    pub exit_code: Option<i32>,
    /// Session id reported in the agent's JSON output, if any.
    pub session_id: Option<String>,
    pub stdout_log: Option<PathBuf>,
    pub stderr_log: Option<PathBuf>,
    pub duration: Duration,
}

impl RunnerExit {
    pub fn is_success(&self) -> bool {
        self.exit_code == Some(0)
    }
}

/// Launches agent processes.
pub trait AgentRunner {
    /// Run the agent to completion.
    ///
    /// Returns [`RalphError::AgentLaunch`] if the process could not be
    /// started. A process that starts and exits nonzero is `Ok`.
    ///
    /// [`RalphError::AgentLaunch`]: crate::error::RalphError::AgentLaunch
    fn run(&self, invocation: &AgentInvocation<'_>) -> Result<RunnerExit>;
}

//! Error types for the ralph CLI.
//!
//! Uses thiserror for derive macros. Variants are split between the fatal
//! class (the run cannot continue) and per-task failures that are recorded in
//! the run summary while the loop moves on.

use crate::exit_codes;
use thiserror::Error;

/// Main error type for ralph operations.
#[derive(Error, Debug)]
pub enum RalphError {
    /// User provided invalid arguments or configuration values.
    #[error("{0}")]
    UserError(String),

    /// The tracker could not be reached or answered with unusable output.
    #[error("Tracker unavailable: {0}")]
    TrackerUnavailable(String),

    /// A task id the tracker does not know about (broken reference).
    #[error("Task not found: {0}")]
    TaskNotFound(String),

    /// A parent chain that cannot be walked (missing ancestor or a cycle).
    #[error("Broken hierarchy: {0}")]
    BrokenHierarchy(String),

    /// The agent configuration store does not exist.
    #[error("Agent configuration missing: {0}")]
    ConfigMissing(String),

    /// A single agent configuration or the orchestrator config failed to parse.
    #[error("Invalid configuration: {0}")]
    ConfigInvalid(String),

    /// The agent process could not be started.
    #[error("Agent launch failed: {0}")]
    AgentLaunch(String),
}

impl RalphError {
    /// Whether this error aborts the whole run.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            RalphError::TrackerUnavailable(_) | RalphError::ConfigMissing(_)
        )
    }

    /// Returns the process exit code for this error type.
    pub fn exit_code(&self) -> i32 {
        match self {
            RalphError::UserError(_) => exit_codes::USER_ERROR,
            RalphError::ConfigInvalid(_) => exit_codes::USER_ERROR,
            RalphError::TaskNotFound(_) => exit_codes::USER_ERROR,
            RalphError::BrokenHierarchy(_) => exit_codes::USER_ERROR,
            RalphError::AgentLaunch(_) => exit_codes::USER_ERROR,
            RalphError::TrackerUnavailable(_) => exit_codes::TRACKER_FAILURE,
            RalphError::ConfigMissing(_) => exit_codes::CONFIG_FAILURE,
        }
    }
}

/// Result type alias for ralph operations.
pub type Result<T> = std::result::Result<T, RalphError>;

//! Project context resolution for ralph.
//!
//! Finds the project root from any working directory and derives the paths
//! of the agent configuration store, the orchestrator config file, and the
//! local run state (event log, agent logs).
//!
//! # Layout
//!
//! ```text
//! {project_root}/
//! └── .claude/
//!     ├── agents/              agent configuration store (*.md)
//!     ├── orchestrator.yaml    optional orchestrator settings
//!     └── orchestrator/
//!         ├── events.ndjson    run audit log
//!         └── logs/<task-id>/  captured agent output
//! ```

use crate::error::{RalphError, Result};
use std::env;
use std::path::{Path, PathBuf};

/// Name of the configuration directory that marks a project root.
pub const CLAUDE_DIR: &str = ".claude";

/// Resolved paths for a ralph run. All paths are absolute.
#[derive(Debug, Clone)]
pub struct ProjectContext {
    /// Directory containing `.claude/` (or the working directory if none does).
    pub project_root: PathBuf,

    /// `{project_root}/.claude`.
    pub claude_dir: PathBuf,
}

impl ProjectContext {
    /// Resolve the project context from the current working directory.
    pub fn resolve() -> Result<Self> {
        let cwd = env::current_dir().map_err(|e| {
            RalphError::UserError(format!("failed to get current working directory: {}", e))
        })?;

        Ok(Self::resolve_from(&cwd))
    }

    /// Resolve the project context starting from a specific directory.
    ///
    /// Walks up to the nearest ancestor holding a `.claude/` directory and
    /// falls back to `start` itself when there is none.
    pub fn resolve_from<P: AsRef<Path>>(start: P) -> Self {
        let start = start.as_ref();
        let project_root = start
            .ancestors()
            .find(|dir| dir.join(CLAUDE_DIR).is_dir())
            .unwrap_or(start)
            .to_path_buf();

        Self::at(project_root)
    }

    /// Context rooted exactly at `project_root`, without searching.
    pub fn at<P: Into<PathBuf>>(project_root: P) -> Self {
        let project_root = project_root.into();
        let claude_dir = project_root.join(CLAUDE_DIR);
        Self {
            project_root,
            claude_dir,
        }
    }

    /// Directory holding one markdown file per agent identity.
    pub fn agents_dir(&self) -> PathBuf {
        self.claude_dir.join("agents")
    }

    /// Path to the optional orchestrator settings file.
    pub fn config_path(&self) -> PathBuf {
        self.claude_dir.join("orchestrator.yaml")
    }

    /// Directory for local run state.
    pub fn state_dir(&self) -> PathBuf {
        self.claude_dir.join("orchestrator")
    }

    /// Path to the NDJSON run audit log.
    pub fn events_file(&self) -> PathBuf {
        self.state_dir().join("events.ndjson")
    }

    /// Directory for captured output of one task's agent runs.
    pub fn task_logs_dir(&self, task_id: &str) -> PathBuf {
        self.state_dir().join("logs").join(sanitize_for_path(task_id))
    }
}

/// Tracker ids are opaque; keep them from escaping the logs directory.
fn sanitize_for_path(id: &str) -> String {
    let name = id
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' => '_',
            c => c,
        })
        .collect::<String>();
    let name = name.trim_start_matches('.');
    if name.is_empty() {
        "_".to_string()
    } else {
        name.to_string()
    }
}

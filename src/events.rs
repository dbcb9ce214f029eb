//! Run audit log.
//!
//! Every orchestration run appends NDJSON events (one JSON object per line)
//! to `.claude/orchestrator/events.ndjson`.
//!
//! # Event Format
//!
//! - `ts`: RFC3339 timestamp
//! - `action`: what happened (`run_start`, `dispatch`, `agent_complete`, ...)
//! - `actor`: `user@HOST`
//! - `task`: task id, for task-specific events
//! - `details`: action-specific object
//!
//! The log is an audit trail, not state. A failed write is logged as a
//! warning and the run carries on. Dry runs write nothing.

use crate::error::{RalphError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

/// Actions recorded in the audit log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventAction {
    RunStart,
    /// Agent launched for a task.
    Dispatch,
    /// Agent process exited.
    AgentComplete,
    /// Task closed after a successful run that left it open.
    AutoComplete,
    /// Container task closed because all its children are done.
    ContainerClose,
    /// Ancestor closed by the completion cascade.
    CascadeClose,
    /// Task passed over for this pass.
    Skip,
    RunFinish,
}

impl std::fmt::Display for EventAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            EventAction::RunStart => "run_start",
            EventAction::Dispatch => "dispatch",
            EventAction::AgentComplete => "agent_complete",
            EventAction::AutoComplete => "auto_complete",
            EventAction::ContainerClose => "container_close",
            EventAction::CascadeClose => "cascade_close",
            EventAction::Skip => "skip",
            EventAction::RunFinish => "run_finish",
        };
        f.write_str(name)
    }
}

/// A single audit log entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    pub ts: DateTime<Utc>,

    pub action: EventAction,

    pub actor: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub task: Option<String>,

    pub details: Value,
}

impl Event {
    /// New event stamped with the current time and actor.
    pub fn new(action: EventAction) -> Self {
        Self {
            ts: Utc::now(),
            action,
            actor: actor_string(),
            task: None,
            details: Value::Object(serde_json::Map::new()),
        }
    }

    pub fn with_task(mut self, task_id: impl Into<String>) -> Self {
        self.task = Some(task_id.into());
        self
    }

    pub fn with_details(mut self, details: Value) -> Self {
        self.details = details;
        self
    }

    /// Serialize to a single JSON line (no trailing newline).
    pub fn to_ndjson_line(&self) -> Result<String> {
        serde_json::to_string(self)
            .map_err(|e| RalphError::UserError(format!("failed to serialize event to JSON: {}", e)))
    }
}

fn actor_string() -> String {
    let user = std::env::var("USER")
        .or_else(|_| std::env::var("USERNAME"))
        .unwrap_or_else(|_| "unknown".to_string());

    let host = hostname::get()
        .map(|h| h.to_string_lossy().to_string())
        .unwrap_or_else(|_| "unknown".to_string());

    format!("{}@{}", user, host)
}

/// Append `event` to the NDJSON file at `path`, creating parent directories.
pub fn append_event(path: &Path, event: &Event) -> Result<()> {
    let line = event.to_ndjson_line()?;

    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir).map_err(|e| {
            RalphError::UserError(format!(
                "failed to create events directory '{}': {}",
                dir.display(),
                e
            ))
        })?;
    }

    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|e| {
            RalphError::UserError(format!(
                "failed to open events file '{}': {}",
                path.display(),
                e
            ))
        })?;

    writeln!(file, "{}", line).map_err(|e| {
        RalphError::UserError(format!(
            "failed to write event to '{}': {}",
            path.display(),
            e
        ))
    })?;

    Ok(())
}

/// Destination for run events. Disabled logs drop everything.
#[derive(Debug, Clone, Default)]
pub struct EventLog {
    path: Option<PathBuf>,
}

impl EventLog {
    pub fn to_file(path: impl Into<PathBuf>) -> Self {
        Self {
            path: Some(path.into()),
        }
    }

    pub fn disabled() -> Self {
        Self { path: None }
    }

    pub fn is_enabled(&self) -> bool {
        self.path.is_some()
    }

    /// Append an event, downgrading failures to a warning.
    pub fn record(&self, event: Event) {
        let Some(path) = &self.path else {
            return;
        };
        if let Err(e) = append_event(path, &event) {
            tracing::warn!(action = %event.action, error = %e, "failed to append run event");
        }
    }
}

//! Task model for ralph.
//!
//! The tracker hands back loosely shaped JSON records ([`TaskRecord`]). The
//! graph builder resolves each record's hierarchy depth and turns it into a
//! typed [`Task`], which is what the scheduler, router, dispatcher and
//! cascader operate on.
//!
//! # Hierarchy
//!
//! ```text
//! fb-ft0          epic     depth 0
//! └── fb-ft0.1    task     depth 1
//!     └── fb-ft0.1.1  subtask  depth 2
//! ```
//!
//! Depth is always derived from parent references, never from the id text.

mod record;
#[cfg(test)]
mod tests;

pub use record::{DependencyRef, TaskRecord, decode_records};

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// Lifecycle status of a task. `Done` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    Open,
    InProgress,
    Blocked,
    Done,
}

impl TaskStatus {
    /// Decode a tracker status string.
    ///
    /// `closed` and `done` both mean done. Unrecognized statuses decode as
    /// `Open` so that they never count toward a parent's completion.
    pub fn from_tracker(status: &str) -> Self {
        match status.trim().to_lowercase().as_str() {
            "in_progress" | "in-progress" => TaskStatus::InProgress,
            "blocked" => TaskStatus::Blocked,
            "closed" | "done" => TaskStatus::Done,
            _ => TaskStatus::Open,
        }
    }

    /// The status string the tracker expects on update.
    pub fn as_tracker_str(&self) -> &'static str {
        match self {
            TaskStatus::Open => "open",
            TaskStatus::InProgress => "in_progress",
            TaskStatus::Blocked => "blocked",
            TaskStatus::Done => "closed",
        }
    }

    pub fn is_done(&self) -> bool {
        matches!(self, TaskStatus::Done)
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TaskStatus::Open => write!(f, "open"),
            TaskStatus::InProgress => write!(f, "in_progress"),
            TaskStatus::Blocked => write!(f, "blocked"),
            TaskStatus::Done => write!(f, "done"),
        }
    }
}

/// Position of a task in the hierarchy, derived from depth.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskKind {
    /// Depth-0 container.
    Epic,
    /// Depth-1 unit of work under an epic.
    Task,
    /// Depth 2 and below.
    Subtask,
}

impl TaskKind {
    pub fn from_depth(depth: usize) -> Self {
        match depth {
            0 => TaskKind::Epic,
            1 => TaskKind::Task,
            _ => TaskKind::Subtask,
        }
    }
}

impl fmt::Display for TaskKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TaskKind::Epic => write!(f, "epic"),
            TaskKind::Task => write!(f, "task"),
            TaskKind::Subtask => write!(f, "subtask"),
        }
    }
}

/// A task with its hierarchy depth resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Task {
    /// Opaque, stable tracker id (e.g. "fb-ft0.1.2").
    pub id: String,
    pub title: String,
    pub kind: TaskKind,
    /// Parent reference; owned by the tracker and never written by ralph.
    pub parent_id: Option<String>,
    /// Number of parent hops to a root.
    pub depth: usize,
    pub labels: BTreeSet<String>,
    /// Ids that must reach done before this task is ready.
    pub dependency_ids: BTreeSet<String>,
    pub status: TaskStatus,
    pub notes: String,
    pub description: String,
    pub acceptance: String,
}

impl Task {
    /// Build a typed task from a tracker record and its resolved depth.
    pub fn from_record(record: &TaskRecord, depth: usize) -> Self {
        Self {
            id: record.id.clone(),
            title: record.title.clone().unwrap_or_default(),
            kind: TaskKind::from_depth(depth),
            parent_id: record.parent_ref().map(str::to_string),
            depth,
            labels: record.labels.iter().flatten().cloned().collect(),
            dependency_ids: record.blocking_dependencies(),
            status: TaskStatus::from_tracker(record.status.as_deref().unwrap_or_default()),
            notes: record.notes.clone().unwrap_or_default(),
            description: record.description.clone().unwrap_or_default(),
            acceptance: record.acceptance.clone().unwrap_or_default(),
        }
    }
}

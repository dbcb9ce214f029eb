//! Per-task outcome records and the end-of-run summary.

use crate::dispatch::Outcome;
use crate::task::{Task, TaskKind};
use serde_json::{Value, json};
use std::fmt;

/// One processed (or skipped) task, as reported in the summary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskOutcome {
    pub task_id: String,
    pub title: String,
    /// Unknown when the task's hierarchy could not be resolved.
    pub depth: Option<usize>,
    pub kind: Option<TaskKind>,
    /// Identity the task was routed to. `None` for containers and skips.
    pub agent: Option<String>,
    pub model: Option<String>,
    pub outcome: Outcome,
    /// Routing notes, cascade notes and recovered per-task errors.
    pub notes: Vec<String>,
}

impl TaskOutcome {
    pub fn for_task(task: &Task, outcome: Outcome) -> Self {
        Self {
            task_id: task.id.clone(),
            title: task.title.clone(),
            depth: Some(task.depth),
            kind: Some(task.kind),
            agent: None,
            model: None,
            outcome,
            notes: Vec::new(),
        }
    }

    /// A task dropped before it could be typed.
    pub fn unresolved(task_id: &str, reason: &str) -> Self {
        Self {
            task_id: task_id.to_string(),
            title: String::new(),
            depth: None,
            kind: None,
            agent: None,
            model: None,
            outcome: Outcome::Skipped {
                reason: reason.to_string(),
            },
            notes: Vec::new(),
        }
    }
}

/// Why the loop ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// A pass found nothing left to process.
    NoCandidates,
    /// The iteration bound (or single-task mode) was reached.
    IterationLimit,
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StopReason::NoCandidates => write!(f, "no more eligible tasks"),
            StopReason::IterationLimit => write!(f, "iteration limit reached"),
        }
    }
}

/// Result of a whole orchestration run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSummary {
    /// Outcomes in processing order; skips that never got processed last.
    pub outcomes: Vec<TaskOutcome>,
    /// Ancestors closed by the cascader.
    pub cascade_closed: Vec<String>,
    /// Processed tasks (skips excluded).
    pub iterations: u32,
    pub stop: StopReason,
    pub dry_run: bool,
}

impl RunSummary {
    fn count(&self, pred: impl Fn(&Outcome) -> bool) -> usize {
        self.outcomes.iter().filter(|o| pred(&o.outcome)).count()
    }

    pub fn completed(&self) -> usize {
        self.count(|o| matches!(o, Outcome::Completed { .. }))
    }

    pub fn failed(&self) -> usize {
        self.count(|o| matches!(o, Outcome::Failed { .. }))
    }

    pub fn skipped(&self) -> usize {
        self.count(|o| matches!(o, Outcome::Skipped { .. }))
    }

    /// Tasks closed by ralph: auto-completed leaves, containers and cascades.
    pub fn auto_closed(&self) -> usize {
        self.count(|o| {
            matches!(
                o,
                Outcome::Completed {
                    auto_closed: true,
                    ..
                } | Outcome::ContainerClosed
            )
        }) + self.cascade_closed.len()
    }

    /// Dry-run would-run and would-close outcomes.
    pub fn planned(&self) -> usize {
        self.count(|o| matches!(o, Outcome::WouldRun | Outcome::WouldClose))
    }

    pub fn has_failures(&self) -> bool {
        self.failed() > 0
    }

    /// Counts for the `run_finish` event.
    pub fn to_details(&self) -> Value {
        json!({
            "stop": self.stop.to_string(),
            "iterations": self.iterations,
            "completed": self.completed(),
            "failed": self.failed(),
            "skipped": self.skipped(),
            "auto_closed": self.auto_closed(),
            "cascade_closed": self.cascade_closed,
        })
    }
}

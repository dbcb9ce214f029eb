//! Completion cascader.
//!
//! When a task reaches done, its ancestors may have become complete. The
//! cascader walks the parent chain one hop at a time:
//!
//! - ancestor already done: move on to its parent without writing
//! - every child done: close the ancestor and move on
//! - any child not done: stop
//! - no children listed: stop (a childless task is never closed here)
//!
//! A missing ancestor ends the walk with a note. Tracker outages propagate.
//! With auto-complete off or in dry-run the cascader does nothing.

use crate::dispatch::append_note;
use crate::error::{RalphError, Result};
use crate::events::{Event, EventAction, EventLog};
use crate::graph::MAX_DEPTH;
use crate::task::{TaskRecord, TaskStatus};
use crate::tracker::Tracker;
use serde_json::json;
use std::collections::BTreeSet;

/// Completion state of a task's direct children.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChildState {
    /// No children.
    Leaf,
    /// All `total` children are done.
    Complete { total: usize },
    /// `remaining` of `total` children are not done.
    Incomplete { remaining: usize, total: usize },
}

/// Look up the children of `id` and summarize their completion.
pub fn child_state(tracker: &dyn Tracker, id: &str) -> Result<ChildState> {
    let children = tracker.list_children(id)?;
    Ok(summarize(&children))
}

fn summarize(children: &[TaskRecord]) -> ChildState {
    let total = children.len();
    if total == 0 {
        return ChildState::Leaf;
    }
    let remaining = children
        .iter()
        .filter(|c| !TaskStatus::from_tracker(c.status.as_deref().unwrap_or_default()).is_done())
        .count();
    if remaining == 0 {
        ChildState::Complete { total }
    } else {
        ChildState::Incomplete { remaining, total }
    }
}

/// What one cascade did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CascadeReport {
    /// Ancestors closed, nearest first.
    pub closed: Vec<String>,
    /// First ancestor left open because a child is not done.
    pub stopped_at: Option<String>,
    pub notes: Vec<String>,
}

/// Closes ancestors whose children are all done.
pub struct Cascader<'a> {
    tracker: &'a dyn Tracker,
    events: &'a EventLog,
    enabled: bool,
}

impl<'a> Cascader<'a> {
    pub fn new(tracker: &'a dyn Tracker, events: &'a EventLog, enabled: bool) -> Self {
        Self {
            tracker,
            events,
            enabled,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Close `id` as a completed container, appending a note.
    pub fn close_container(&self, id: &str, children: usize, action: EventAction) -> Result<()> {
        let record = self.tracker.get(id)?;
        let note = format!("Auto-closed: all {} children are done", children);
        let notes = append_note(record.notes.as_deref().unwrap_or_default(), &note);
        self.tracker.set_status(id, TaskStatus::Done, Some(&notes))?;

        self.events.record(
            Event::new(action)
                .with_task(id)
                .with_details(json!({ "children": children })),
        );
        tracing::info!(task = %id, children, "closed completed container");
        Ok(())
    }

    /// Propagate completion upward from a task that just reached done.
    pub fn cascade(&self, parent_id: Option<&str>) -> Result<CascadeReport> {
        let mut report = CascadeReport::default();
        if !self.enabled {
            return Ok(report);
        }

        let mut visited = BTreeSet::new();
        let mut next = parent_id.map(str::to_string);

        while let Some(id) = next.take() {
            if !visited.insert(id.clone()) {
                report
                    .notes
                    .push(format!("stopped at '{}': parent chain loops", id));
                break;
            }
            if visited.len() > MAX_DEPTH {
                report.notes.push(format!(
                    "stopped at '{}': parent chain deeper than {} levels",
                    id, MAX_DEPTH
                ));
                break;
            }

            let ancestor = match self.tracker.get(&id) {
                Ok(record) => record,
                Err(RalphError::TaskNotFound(_)) => {
                    report
                        .notes
                        .push(format!("parent '{}' does not exist; cascade stopped", id));
                    break;
                }
                Err(e) => return Err(e),
            };

            let status = TaskStatus::from_tracker(ancestor.status.as_deref().unwrap_or_default());
            if status.is_done() {
                next = ancestor.parent_ref().map(str::to_string);
                continue;
            }

            match child_state(self.tracker, &id)? {
                ChildState::Complete { total } => {
                    self.close_container(&id, total, EventAction::CascadeClose)?;
                    report.closed.push(id);
                    next = ancestor.parent_ref().map(str::to_string);
                }
                ChildState::Incomplete { remaining, .. } => {
                    tracing::debug!(task = %id, remaining, "cascade stopped at incomplete ancestor");
                    report.stopped_at = Some(id);
                }
                ChildState::Leaf => {
                    report.notes.push(format!(
                        "parent '{}' lists no children; left open",
                        id
                    ));
                    report.stopped_at = Some(id);
                }
            }
        }

        Ok(report)
    }
}

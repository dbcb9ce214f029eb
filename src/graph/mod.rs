//! Task graph builder.
//!
//! Turns the tracker's ready and in-progress lists into typed [`Task`]s with
//! resolved depth, plus the set of dependency ids known to be done.
//!
//! # Depth resolution
//!
//! Depth is the number of parent hops to a root. Ancestors are fetched from
//! the tracker one `get` at a time and every depth resolved along the way is
//! cached for the rest of the run, so a sibling never walks the same chain
//! twice. Parent references are structural and do not change during a run.
//!
//! A chain that cannot be walked (missing ancestor or a cycle) skips the task
//! for this pass with a reason. It never aborts the run.
//!
//! Dependency statuses are not cached across passes: an earlier dispatch may
//! have completed one.

use crate::error::{RalphError, Result};
use crate::scheduler::RunContext;
use crate::task::{Task, TaskRecord, TaskStatus};
use crate::tracker::Tracker;
use std::collections::{BTreeSet, HashMap};

/// Upper bound on parent hops, guarding against malformed trackers.
pub(crate) const MAX_DEPTH: usize = 64;

/// A task left out of a pass, with the reason.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedTask {
    pub id: String,
    pub reason: String,
}

/// One pass's view of the backlog.
#[derive(Debug, Clone, Default)]
pub struct Snapshot {
    /// In-progress tasks (empty unless resuming).
    pub in_progress: Vec<Task>,
    /// Ready tasks not also in progress.
    pub ready: Vec<Task>,
    /// Dependency ids confirmed done.
    pub done_ids: BTreeSet<String>,
    /// Tasks dropped for this pass.
    pub skipped: Vec<SkippedTask>,
}

impl Snapshot {
    /// Drop tasks whose id is in `ids`.
    pub fn exclude(&mut self, ids: &BTreeSet<String>) {
        self.in_progress.retain(|t| !ids.contains(&t.id));
        self.ready.retain(|t| !ids.contains(&t.id));
    }

    pub fn is_empty(&self) -> bool {
        self.in_progress.is_empty() && self.ready.is_empty()
    }
}

/// Builds snapshots, caching resolved depths for the lifetime of the builder.
pub struct GraphBuilder<'a> {
    tracker: &'a dyn Tracker,
    depths: HashMap<String, usize>,
}

impl<'a> GraphBuilder<'a> {
    pub fn new(tracker: &'a dyn Tracker) -> Self {
        Self {
            tracker,
            depths: HashMap::new(),
        }
    }

    /// Query the tracker and build a snapshot for one scheduling pass.
    pub fn build(&mut self, ctx: &RunContext) -> Result<Snapshot> {
        let label = ctx.tracker_label();

        let in_progress_records = if ctx.resume {
            self.tracker.list_in_progress(label)?
        } else {
            Vec::new()
        };
        let ready_records = self.tracker.list_ready(label)?;

        let mut snapshot = Snapshot::default();
        let mut seen = BTreeSet::new();

        for record in &in_progress_records {
            if seen.insert(record.id.clone()) {
                if let Some(task) = self.typed(record, &mut snapshot.skipped)? {
                    snapshot.in_progress.push(task);
                }
            }
        }
        for record in &ready_records {
            if seen.insert(record.id.clone()) {
                if let Some(task) = self.typed(record, &mut snapshot.skipped)? {
                    snapshot.ready.push(task);
                }
            }
        }

        snapshot.done_ids = self.done_dependencies(&snapshot, &seen)?;

        tracing::debug!(
            in_progress = snapshot.in_progress.len(),
            ready = snapshot.ready.len(),
            skipped = snapshot.skipped.len(),
            "built task graph snapshot"
        );
        Ok(snapshot)
    }

    /// Resolve a record into a task, or record why it was skipped.
    fn typed(&mut self, record: &TaskRecord, skipped: &mut Vec<SkippedTask>) -> Result<Option<Task>> {
        match self.resolve_depth(record) {
            Ok(depth) => Ok(Some(Task::from_record(record, depth))),
            Err(e) if !e.is_fatal() => {
                tracing::warn!(task = %record.id, error = %e, "skipping task with broken hierarchy");
                skipped.push(SkippedTask {
                    id: record.id.clone(),
                    reason: e.to_string(),
                });
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    /// Depth of `record`, walking and caching its ancestor chain.
    pub fn resolve_depth(&mut self, record: &TaskRecord) -> Result<usize> {
        if let Some(&depth) = self.depths.get(&record.id) {
            return Ok(depth);
        }

        // Ids whose depth is not yet known, from the task upward.
        let mut chain = vec![record.id.clone()];
        let mut next = record.parent_ref().map(str::to_string);
        let mut known_ancestor = None;

        while let Some(parent_id) = next {
            if let Some(&depth) = self.depths.get(&parent_id) {
                known_ancestor = Some(depth);
                break;
            }
            if chain.contains(&parent_id) {
                return Err(RalphError::BrokenHierarchy(format!(
                    "parent cycle through '{}' above task '{}'",
                    parent_id, record.id
                )));
            }
            if chain.len() > MAX_DEPTH {
                return Err(RalphError::BrokenHierarchy(format!(
                    "task '{}' is nested deeper than {} levels",
                    record.id, MAX_DEPTH
                )));
            }

            let parent = self.tracker.get(&parent_id).map_err(|e| match e {
                RalphError::TaskNotFound(_) => RalphError::BrokenHierarchy(format!(
                    "parent '{}' of task '{}' does not exist",
                    parent_id, record.id
                )),
                other => other,
            })?;

            next = parent.parent_ref().map(str::to_string);
            chain.push(parent_id);
        }

        let mut depth = known_ancestor.map_or(0, |d| d + 1);
        for id in chain.iter().rev() {
            self.depths.insert(id.clone(), depth);
            depth += 1;
        }

        Ok(self.depths[&record.id])
    }

    /// Which dependency ids of the snapshot's tasks are done right now.
    fn done_dependencies(
        &self,
        snapshot: &Snapshot,
        listed: &BTreeSet<String>,
    ) -> Result<BTreeSet<String>> {
        let wanted: BTreeSet<&String> = snapshot
            .in_progress
            .iter()
            .chain(snapshot.ready.iter())
            .flat_map(|t| t.dependency_ids.iter())
            .collect();

        let mut done = BTreeSet::new();
        for id in wanted {
            // Anything ready or in progress is by definition not done.
            if listed.contains(id) {
                continue;
            }
            match self.tracker.get(id) {
                Ok(record) => {
                    let status = TaskStatus::from_tracker(record.status.as_deref().unwrap_or_default());
                    if status.is_done() {
                        done.insert(id.clone());
                    }
                }
                Err(RalphError::TaskNotFound(_)) => {
                    tracing::warn!(dependency = %id, "dependency does not exist; treating as unmet");
                }
                Err(e) => return Err(e),
            }
        }
        Ok(done)
    }
}

#[cfg(test)]
mod tests;

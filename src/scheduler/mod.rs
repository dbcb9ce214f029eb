//! Ready queue and scheduling policy.
//!
//! [`schedule`] is a pure function from a graph snapshot and the run context
//! to an ordered queue. It performs no I/O.
//!
//! # Ordering
//!
//! Entries sort by [`PriorityKey`], smallest first:
//!
//! 1. tier: in-progress tasks (when resuming) before ready tasks
//! 2. depth, deepest first, so leaves run before their containers
//! 3. task id, ascending, as a stable tie-break
//!
//! # Eligibility
//!
//! A task is excluded when any dependency is not in the snapshot's done set,
//! when it fails the label filter, or when its status is done or blocked.

mod run_context;

pub use run_context::{LabelFilter, RunContext};

use crate::graph::Snapshot;
use crate::task::{Task, TaskStatus};
use std::cmp::Reverse;
use std::collections::BTreeSet;

/// Scheduling tier. Lower tiers run first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Tier {
    Resume,
    Ready,
}

/// Total order over queue entries.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct PriorityKey {
    pub tier: Tier,
    pub depth: Reverse<usize>,
    pub id: String,
}

impl PriorityKey {
    pub fn new(tier: Tier, task: &Task) -> Self {
        Self {
            tier,
            depth: Reverse(task.depth),
            id: task.id.clone(),
        }
    }
}

/// A task with its priority, ready to dispatch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReadyQueueEntry {
    pub task: Task,
    pub key: PriorityKey,
}

impl ReadyQueueEntry {
    pub fn is_resumed(&self) -> bool {
        self.key.tier == Tier::Resume
    }
}

/// Order the snapshot's eligible tasks for dispatch.
pub fn schedule(snapshot: &Snapshot, ctx: &RunContext) -> Vec<ReadyQueueEntry> {
    let resumed = snapshot
        .in_progress
        .iter()
        .filter(|_| ctx.resume)
        .map(|t| (Tier::Resume, t));
    let ready = snapshot.ready.iter().map(|t| (Tier::Ready, t));

    let mut queue: Vec<ReadyQueueEntry> = resumed
        .chain(ready)
        .filter(|(_, task)| is_eligible(task, snapshot, ctx))
        .map(|(tier, task)| ReadyQueueEntry {
            key: PriorityKey::new(tier, task),
            task: task.clone(),
        })
        .collect();

    queue.sort_by(|a, b| a.key.cmp(&b.key));

    let mut seen = BTreeSet::new();
    queue.retain(|entry| seen.insert(entry.task.id.clone()));
    queue
}

fn is_eligible(task: &Task, snapshot: &Snapshot, ctx: &RunContext) -> bool {
    if matches!(task.status, TaskStatus::Done | TaskStatus::Blocked) {
        return false;
    }
    if !ctx.admits(&task.labels) {
        return false;
    }
    task.dependency_ids
        .iter()
        .all(|dep| snapshot.done_ids.contains(dep))
}

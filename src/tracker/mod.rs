//! Tracker client boundary.
//!
//! The task store is an external collaborator. Everything the engine needs
//! from it goes through the [`Tracker`] trait, so the scheduling loop can be
//! driven by the real `bd` CLI or by an in-memory store in tests.
//!
//! # Error contract
//!
//! - [`RalphError::TrackerUnavailable`] when the tracker cannot be reached or
//!   answers with output that cannot be decoded. This aborts the run.
//! - [`RalphError::TaskNotFound`] from [`Tracker::get`] when the id is unknown.
//!   Callers treat this as a per-task failure.
//!
//! Every mutation is a single idempotent call.
//!
//! [`RalphError::TrackerUnavailable`]: crate::error::RalphError::TrackerUnavailable
//! [`RalphError::TaskNotFound`]: crate::error::RalphError::TaskNotFound

mod bd;

pub use bd::BeadsTracker;

use crate::error::Result;
use crate::task::{TaskRecord, TaskStatus};

/// Query/mutate interface to the task store.
pub trait Tracker {
    /// Open tasks whose blocking dependencies are all done.
    fn list_ready(&self, label: Option<&str>) -> Result<Vec<TaskRecord>>;

    /// Tasks currently marked in progress.
    fn list_in_progress(&self, label: Option<&str>) -> Result<Vec<TaskRecord>>;

    /// Fetch one task by id.
    fn get(&self, id: &str) -> Result<TaskRecord>;

    /// Set a task's status, optionally attaching a note.
    fn set_status(&self, id: &str, status: TaskStatus, notes: Option<&str>) -> Result<()>;

    /// Direct children of a task, in every status.
    fn list_children(&self, id: &str) -> Result<Vec<TaskRecord>>;
}

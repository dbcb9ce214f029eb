//! Test doubles for the tracker and agent runner.

use crate::agent::{AgentInvocation, AgentRunner, AgentSource, RunnerExit};
use crate::error::{RalphError, Result};
use crate::task::{DependencyRef, TaskRecord, TaskStatus};
use crate::tracker::Tracker;
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::sync::{Arc, LazyLock, Mutex, MutexGuard};
use tempfile::TempDir;

static CWD_LOCK: LazyLock<Mutex<()>> = LazyLock::new(|| Mutex::new(()));

pub(crate) struct DirGuard {
    original: PathBuf,
    _lock: MutexGuard<'static, ()>,
}

impl DirGuard {
    pub(crate) fn new(new_dir: &Path) -> Self {
        // The working directory is process-global; hold the lock for the guard's lifetime.
        let lock = CWD_LOCK.lock().unwrap_or_else(|poison| poison.into_inner());
        let original = std::env::current_dir().unwrap();
        std::env::set_current_dir(new_dir).unwrap();
        Self {
            original,
            _lock: lock,
        }
    }
}

impl Drop for DirGuard {
    fn drop(&mut self) {
        let _ = std::env::set_current_dir(&self.original);
    }
}

/// A temporary project with an empty `.claude/agents/` directory.
pub(crate) fn create_test_project() -> TempDir {
    let temp = TempDir::new().unwrap();
    std::fs::create_dir_all(temp.path().join(".claude/agents")).unwrap();
    temp
}

/// Fluent construction of tracker records.
pub(crate) struct RecordBuilder(TaskRecord);

pub(crate) fn rec(id: &str) -> RecordBuilder {
    RecordBuilder(TaskRecord {
        id: id.to_string(),
        title: Some(format!("Title of {}", id)),
        status: Some("open".to_string()),
        ..Default::default()
    })
}

impl RecordBuilder {
    pub(crate) fn parent(mut self, parent: &str) -> Self {
        self.0.parent = Some(parent.to_string());
        self
    }

    pub(crate) fn status(mut self, status: &str) -> Self {
        self.0.status = Some(status.to_string());
        self
    }

    pub(crate) fn labels(mut self, labels: &[&str]) -> Self {
        self.0.labels = Some(labels.iter().map(|l| l.to_string()).collect());
        self
    }

    pub(crate) fn deps(mut self, deps: &[&str]) -> Self {
        self.0.dependencies = Some(
            deps.iter()
                .map(|d| DependencyRef::Id(d.to_string()))
                .collect(),
        );
        self
    }

    pub(crate) fn build(self) -> TaskRecord {
        self.0
    }
}

/// A status change made through [`Tracker::set_status`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Mutation {
    pub id: String,
    pub status: TaskStatus,
    pub notes: Option<String>,
}

/// In-memory tracker with `bd`-like ready semantics.
#[derive(Debug, Default)]
pub(crate) struct MemoryTracker {
    records: Mutex<BTreeMap<String, TaskRecord>>,
    mutations: Mutex<Vec<Mutation>>,
    gets: Mutex<Vec<String>>,
    unavailable: Mutex<bool>,
}

impl MemoryTracker {
    pub(crate) fn with_tasks<I: IntoIterator<Item = TaskRecord>>(records: I) -> Self {
        let tracker = Self::default();
        for record in records {
            tracker.insert(record);
        }
        tracker
    }

    pub(crate) fn insert(&self, record: TaskRecord) {
        self.records
            .lock()
            .unwrap()
            .insert(record.id.clone(), record);
    }

    pub(crate) fn status_of(&self, id: &str) -> Option<TaskStatus> {
        self.records
            .lock()
            .unwrap()
            .get(id)
            .map(|r| TaskStatus::from_tracker(r.status.as_deref().unwrap_or_default()))
    }

    pub(crate) fn notes_of(&self, id: &str) -> Option<String> {
        self.records
            .lock()
            .unwrap()
            .get(id)
            .and_then(|r| r.notes.clone())
    }

    pub(crate) fn mutations(&self) -> Vec<Mutation> {
        self.mutations.lock().unwrap().clone()
    }

    /// Ids passed to `get`, in call order.
    pub(crate) fn gets(&self) -> Vec<String> {
        self.gets.lock().unwrap().clone()
    }

    /// Make every subsequent call fail as if the tracker were unreachable.
    pub(crate) fn set_unavailable(&self, unavailable: bool) {
        *self.unavailable.lock().unwrap() = unavailable;
    }

    fn check_available(&self) -> Result<()> {
        if *self.unavailable.lock().unwrap() {
            return Err(RalphError::TrackerUnavailable(
                "memory tracker is offline".to_string(),
            ));
        }
        Ok(())
    }

    fn status_in(records: &BTreeMap<String, TaskRecord>, id: &str) -> Option<TaskStatus> {
        records
            .get(id)
            .map(|r| TaskStatus::from_tracker(r.status.as_deref().unwrap_or_default()))
    }

    fn has_label(record: &TaskRecord, label: Option<&str>) -> bool {
        match label {
            None => true,
            Some(label) => record.labels.iter().flatten().any(|l| l == label),
        }
    }
}

impl Tracker for MemoryTracker {
    fn list_ready(&self, label: Option<&str>) -> Result<Vec<TaskRecord>> {
        self.check_available()?;
        let records = self.records.lock().unwrap();
        Ok(records
            .values()
            .filter(|r| Self::status_in(&records, &r.id) == Some(TaskStatus::Open))
            .filter(|r| {
                r.blocking_dependencies()
                    .iter()
                    .all(|d| Self::status_in(&records, d) == Some(TaskStatus::Done))
            })
            .filter(|r| Self::has_label(r, label))
            .cloned()
            .collect())
    }

    fn list_in_progress(&self, label: Option<&str>) -> Result<Vec<TaskRecord>> {
        self.check_available()?;
        let records = self.records.lock().unwrap();
        Ok(records
            .values()
            .filter(|r| Self::status_in(&records, &r.id) == Some(TaskStatus::InProgress))
            .filter(|r| Self::has_label(r, label))
            .cloned()
            .collect())
    }

    fn get(&self, id: &str) -> Result<TaskRecord> {
        self.check_available()?;
        self.gets.lock().unwrap().push(id.to_string());
        self.records
            .lock()
            .unwrap()
            .get(id)
            .cloned()
            .ok_or_else(|| RalphError::TaskNotFound(id.to_string()))
    }

    fn set_status(&self, id: &str, status: TaskStatus, notes: Option<&str>) -> Result<()> {
        self.check_available()?;
        let mut records = self.records.lock().unwrap();
        let record = records
            .get_mut(id)
            .ok_or_else(|| RalphError::TaskNotFound(id.to_string()))?;
        record.status = Some(status.as_tracker_str().to_string());
        if let Some(notes) = notes {
            record.notes = Some(notes.to_string());
        }
        self.mutations.lock().unwrap().push(Mutation {
            id: id.to_string(),
            status,
            notes: notes.map(str::to_string),
        });
        Ok(())
    }

    fn list_children(&self, id: &str) -> Result<Vec<TaskRecord>> {
        self.check_available()?;
        Ok(self
            .records
            .lock()
            .unwrap()
            .values()
            .filter(|r| r.parent_ref() == Some(id))
            .cloned()
            .collect())
    }
}

/// What a scripted agent does when run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Scripted {
    Exit(i32),
    /// Change the task's own status through the tracker, then exit.
    SetStatusAndExit(TaskStatus, i32),
    LaunchFailure,
}

/// A launch seen by [`ScriptedRunner`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct RecordedRun {
    pub task_id: String,
    pub identity: String,
    pub model: Option<String>,
    pub built_in: bool,
    pub prompt: String,
}

/// Agent runner that follows a per-task script instead of launching processes.
#[derive(Debug)]
pub(crate) struct ScriptedRunner {
    default: Scripted,
    scripts: Mutex<HashMap<String, Scripted>>,
    tracker: Option<Arc<MemoryTracker>>,
    runs: Mutex<Vec<RecordedRun>>,
}

impl ScriptedRunner {
    /// Every task exits with `default` unless scripted otherwise.
    pub(crate) fn new(default: Scripted) -> Self {
        Self {
            default,
            scripts: Mutex::new(HashMap::new()),
            tracker: None,
            runs: Mutex::new(Vec::new()),
        }
    }

    /// Tracker used by [`Scripted::SetStatusAndExit`].
    pub(crate) fn with_tracker(mut self, tracker: Arc<MemoryTracker>) -> Self {
        self.tracker = Some(tracker);
        self
    }

    pub(crate) fn on(self, task_id: &str, script: Scripted) -> Self {
        self.scripts
            .lock()
            .unwrap()
            .insert(task_id.to_string(), script);
        self
    }

    pub(crate) fn runs(&self) -> Vec<RecordedRun> {
        self.runs.lock().unwrap().clone()
    }

    pub(crate) fn run_ids(&self) -> Vec<String> {
        self.runs().into_iter().map(|r| r.task_id).collect()
    }
}

impl AgentRunner for ScriptedRunner {
    fn run(&self, invocation: &AgentInvocation<'_>) -> Result<RunnerExit> {
        self.runs.lock().unwrap().push(RecordedRun {
            task_id: invocation.task_id.to_string(),
            identity: invocation.agent.identity.clone(),
            model: invocation.agent.model.clone(),
            built_in: invocation.agent.source == AgentSource::BuiltIn,
            prompt: invocation.prompt.to_string(),
        });

        let script = self
            .scripts
            .lock()
            .unwrap()
            .get(invocation.task_id)
            .cloned()
            .unwrap_or_else(|| self.default.clone());

        let exit_code = match script {
            Scripted::Exit(code) => code,
            Scripted::SetStatusAndExit(status, code) => {
                if let Some(tracker) = &self.tracker {
                    tracker.set_status(invocation.task_id, status, None)?;
                }
                code
            }
            Scripted::LaunchFailure => {
                return Err(RalphError::AgentLaunch(format!(
                    "scripted launch failure for {}",
                    invocation.task_id
                )));
            }
        };

        Ok(RunnerExit {
            exit_code: Some(exit_code),
            ..Default::default()
        })
    }
}

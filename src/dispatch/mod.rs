//! Execution dispatcher.
//!
//! Runs one leaf task through its routed agent:
//!
//! 1. mark the task in progress (skipped if it already is)
//! 2. launch the agent and wait for it to exit
//! 3. classify: exit code 0 is completed, anything else (including a launch
//!    failure) is failed
//! 4. completed and auto-complete on: if the agent left the task open or in
//!    progress, close it
//! 5. failed: append a failure note; the task stays in progress for a later
//!    resumed run
//!
//! The agent owns its task's final status. The dispatcher only fills the gap
//! when an agent finishes cleanly without saying so.
//!
//! In dry-run mode nothing is written and no process is launched.

use crate::agent::prompt::TaskPrompt;
use crate::agent::{AgentInvocation, AgentRunner, RouteDecision, RunnerExit};
use crate::error::{RalphError, Result};
use crate::events::{Event, EventAction, EventLog};
use crate::scheduler::RunContext;
use crate::task::{Task, TaskStatus};
use crate::tracker::Tracker;
use serde_json::json;
use std::fmt;

/// Result of processing one task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Dry run: the agent would have been launched.
    WouldRun,
    /// Dry run: the container would have been closed.
    WouldClose,
    /// Agent exited 0.
    Completed {
        final_status: TaskStatus,
        /// Closed by ralph rather than by the agent.
        auto_closed: bool,
        session_id: Option<String>,
    },
    /// Agent exited nonzero or never started.
    Failed { reason: String },
    /// Container closed because all its children are done.
    ContainerClosed,
    /// Not processed this pass.
    Skipped { reason: String },
}

impl Outcome {
    pub fn label(&self) -> &'static str {
        match self {
            Outcome::WouldRun => "would-run",
            Outcome::WouldClose => "would-close",
            Outcome::Completed { .. } => "completed",
            Outcome::Failed { .. } => "failed",
            Outcome::ContainerClosed => "closed",
            Outcome::Skipped { .. } => "skipped",
        }
    }

    /// Whether the task ended this step in the done state.
    pub fn reached_done(&self) -> bool {
        match self {
            Outcome::Completed { final_status, .. } => final_status.is_done(),
            Outcome::ContainerClosed => true,
            _ => false,
        }
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outcome::Completed {
                final_status,
                auto_closed,
                ..
            } => {
                write!(f, "completed ({}", final_status)?;
                if *auto_closed {
                    write!(f, ", auto-closed")?;
                }
                write!(f, ")")
            }
            Outcome::Failed { reason } => write!(f, "failed: {}", reason),
            Outcome::Skipped { reason } => write!(f, "skipped: {}", reason),
            other => f.write_str(other.label()),
        }
    }
}

/// Join an existing notes field with a new entry.
pub fn append_note(existing: &str, note: &str) -> String {
    let existing = existing.trim_end();
    if existing.is_empty() {
        note.to_string()
    } else {
        format!("{}\n\n{}", existing, note)
    }
}

/// Sends leaf tasks to agents.
pub struct Dispatcher<'a> {
    tracker: &'a dyn Tracker,
    runner: &'a dyn AgentRunner,
    prompt: &'a TaskPrompt,
    events: &'a EventLog,
}

impl<'a> Dispatcher<'a> {
    pub fn new(
        tracker: &'a dyn Tracker,
        runner: &'a dyn AgentRunner,
        prompt: &'a TaskPrompt,
        events: &'a EventLog,
    ) -> Self {
        Self {
            tracker,
            runner,
            prompt,
            events,
        }
    }

    /// Dispatch `task` to the agent chosen by `route`.
    ///
    /// Fatal tracker errors are returned as `Err`. Agent failures are an
    /// [`Outcome::Failed`].
    pub fn dispatch(&self, task: &Task, route: &RouteDecision, ctx: &RunContext) -> Result<Outcome> {
        let prompt = match self.prompt.render(task) {
            Ok(prompt) => prompt,
            Err(e) => {
                return Ok(Outcome::Failed {
                    reason: format!("failed to render task prompt: {}", e),
                });
            }
        };

        if ctx.dry_run {
            return Ok(Outcome::WouldRun);
        }

        if task.status != TaskStatus::InProgress {
            self.tracker
                .set_status(&task.id, TaskStatus::InProgress, None)?;
        }

        self.events.record(
            Event::new(EventAction::Dispatch)
                .with_task(&task.id)
                .with_details(json!({
                    "agent": route.identity(),
                    "model": route.model(),
                    "depth": task.depth,
                    "routing_notes": route.notes,
                })),
        );

        let invocation = AgentInvocation {
            task_id: &task.id,
            agent: &route.config,
            prompt: &prompt,
        };

        let reason = match self.runner.run(&invocation) {
            Ok(exit) if exit.is_success() => {
                self.record_exit(task, route, Some(&exit));
                return self.complete(task, route, ctx, exit);
            }
            Ok(exit) => {
                self.record_exit(task, route, Some(&exit));
                match exit.exit_code {
                    Some(code) => format!("agent exited with code {}", code),
                    None => "agent was terminated by a signal".to_string(),
                }
            }
            Err(e @ RalphError::AgentLaunch(_)) => {
                self.record_exit(task, route, None);
                e.to_string()
            }
            Err(e) => return Err(e),
        };

        tracing::warn!(task = %task.id, reason = %reason, "agent run failed");
        self.note_failure(task, &reason)?;
        Ok(Outcome::Failed { reason })
    }

    fn record_exit(&self, task: &Task, route: &RouteDecision, exit: Option<&RunnerExit>) {
        self.events.record(
            Event::new(EventAction::AgentComplete)
                .with_task(&task.id)
                .with_details(json!({
                    "agent": route.identity(),
                    "launched": exit.is_some(),
                    "exit_code": exit.and_then(|e| e.exit_code),
                    "session_id": exit.and_then(|e| e.session_id.clone()),
                    "duration_ms": exit.map(|e| e.duration.as_millis() as u64),
                })),
        );
    }

    /// Handle a successful exit, closing the task if the agent did not.
    fn complete(
        &self,
        task: &Task,
        route: &RouteDecision,
        ctx: &RunContext,
        exit: RunnerExit,
    ) -> Result<Outcome> {
        let current = self.tracker.get(&task.id)?;
        let status = TaskStatus::from_tracker(current.status.as_deref().unwrap_or_default());

        let agent_decided = matches!(status, TaskStatus::Done | TaskStatus::Blocked);
        if agent_decided || !ctx.auto_complete {
            return Ok(Outcome::Completed {
                final_status: status,
                auto_closed: false,
                session_id: exit.session_id,
            });
        }

        let mut note = format!("Auto-completed after successful {} run", route.identity());
        if let Some(session) = &exit.session_id {
            note.push_str(&format!(" (session {})", session));
        }
        let notes = append_note(current.notes.as_deref().unwrap_or_default(), &note);
        self.tracker
            .set_status(&task.id, TaskStatus::Done, Some(&notes))?;

        self.events.record(
            Event::new(EventAction::AutoComplete)
                .with_task(&task.id)
                .with_details(json!({ "agent": route.identity(), "previous_status": status })),
        );
        tracing::info!(task = %task.id, "auto-completed task");

        Ok(Outcome::Completed {
            final_status: TaskStatus::Done,
            auto_closed: true,
            session_id: exit.session_id,
        })
    }

    /// Attach a failure note. An open task is left in progress; a status
    /// the agent set itself (blocked, done) is kept.
    fn note_failure(&self, task: &Task, reason: &str) -> Result<()> {
        let (existing, status) = match self.tracker.get(&task.id) {
            Ok(record) => {
                let status = TaskStatus::from_tracker(record.status.as_deref().unwrap_or_default());
                (record.notes.unwrap_or_default(), status)
            }
            Err(RalphError::TaskNotFound(_)) => return Ok(()),
            Err(e) => return Err(e),
        };

        let keep = match status {
            TaskStatus::Blocked | TaskStatus::Done => status,
            TaskStatus::Open | TaskStatus::InProgress => TaskStatus::InProgress,
        };
        let notes = append_note(&existing, &format!("Agent failed: {}", reason));
        self.tracker.set_status(&task.id, keep, Some(&notes))
    }
}

//! Orchestration loop.
//!
//! # States
//!
//! ```text
//! Init -> Scheduling -> Dispatching -> [Cascading] -> Scheduling -> ... -> Done
//! ```
//!
//! - **Scheduling**: re-query the tracker, rebuild the graph, drop tasks
//!   already attempted this run and order the rest. Empty queue ends the run.
//! - **Dispatching**: pop entries until one is processed. Containers are
//!   closed or skipped here; skips do not count as an iteration. A queue that
//!   runs out with nothing processed ends the run.
//! - **Cascading**: propagate completion to ancestors of a task that just
//!   reached done, whatever the agent's exit code.
//!
//! After each processed task the iteration counter is checked against the
//! run's bound, then the loop goes back to scheduling since a completion may
//! have unblocked other tasks.
//!
//! Tracker outages and a missing configuration store abort the run. Every
//! other failure is recorded on the task's outcome.

mod summary;

pub use summary::{RunSummary, StopReason, TaskOutcome};

use crate::agent::prompt::TaskPrompt;
use crate::agent::{AgentRunner, Router};
use crate::cascade::{Cascader, ChildState, child_state};
use crate::dispatch::{Dispatcher, Outcome};
use crate::error::{RalphError, Result};
use crate::events::{Event, EventAction, EventLog};
use crate::graph::GraphBuilder;
use crate::scheduler::{ReadyQueueEntry, RunContext, schedule};
use crate::task::{Task, TaskStatus};
use crate::tracker::Tracker;
use serde_json::json;
use std::collections::{BTreeMap, BTreeSet, VecDeque};

enum LoopState {
    Init,
    Scheduling,
    Dispatching(VecDeque<ReadyQueueEntry>),
    Cascading(Task),
    Done(StopReason),
}

/// Bookkeeping carried across passes of one run.
#[derive(Default)]
struct Progress {
    /// Tasks processed this run; never scheduled again.
    attempted: BTreeSet<String>,
    outcomes: Vec<TaskOutcome>,
    /// Skipped tasks not (yet) processed, first reason wins.
    skips: BTreeMap<String, TaskOutcome>,
    cascade_closed: Vec<String>,
    iterations: u32,
}

/// Callback invoked after each processed task.
pub type Reporter<'a> = Box<dyn Fn(&TaskOutcome) + 'a>;

/// Drives scheduling, dispatch and cascading until the backlog is drained.
pub struct Orchestrator<'a> {
    tracker: &'a dyn Tracker,
    runner: &'a dyn AgentRunner,
    router: &'a Router,
    prompt: &'a TaskPrompt,
    events: EventLog,
    ctx: RunContext,
    reporter: Option<Reporter<'a>>,
}

impl<'a> Orchestrator<'a> {
    /// Dry runs never write events, whatever `events` is.
    pub fn new(
        tracker: &'a dyn Tracker,
        runner: &'a dyn AgentRunner,
        router: &'a Router,
        prompt: &'a TaskPrompt,
        events: EventLog,
        ctx: RunContext,
    ) -> Self {
        let events = if ctx.dry_run {
            EventLog::disabled()
        } else {
            events
        };
        Self {
            tracker,
            runner,
            router,
            prompt,
            events,
            ctx,
            reporter: None,
        }
    }

    pub fn with_reporter(mut self, reporter: impl Fn(&TaskOutcome) + 'a) -> Self {
        self.reporter = Some(Box::new(reporter));
        self
    }

    /// Run the loop to completion.
    pub fn run(&self) -> Result<RunSummary> {
        let mut graph = GraphBuilder::new(self.tracker);
        let mut progress = Progress::default();
        let mut state = LoopState::Init;

        let stop = loop {
            state = match state {
                LoopState::Init => {
                    self.record_start();
                    LoopState::Scheduling
                }
                LoopState::Scheduling => self.schedule_pass(&mut graph, &mut progress)?,
                LoopState::Dispatching(queue) => self.dispatch_next(queue, &mut progress)?,
                LoopState::Cascading(task) => {
                    self.cascade_from(&task, &mut progress)?;
                    self.next_pass(&progress)
                }
                LoopState::Done(stop) => break stop,
            };
        };

        let Progress {
            mut outcomes,
            skips,
            cascade_closed,
            iterations,
            ..
        } = progress;
        outcomes.extend(skips.into_values());

        let summary = RunSummary {
            outcomes,
            cascade_closed,
            iterations,
            stop,
            dry_run: self.ctx.dry_run,
        };

        self.events
            .record(Event::new(EventAction::RunFinish).with_details(summary.to_details()));
        tracing::info!(
            iterations = summary.iterations,
            completed = summary.completed(),
            failed = summary.failed(),
            stop = %summary.stop,
            "orchestration finished"
        );
        Ok(summary)
    }

    fn record_start(&self) {
        let ctx = &self.ctx;
        self.events.record(Event::new(EventAction::RunStart).with_details(json!({
            "label": ctx.label_filter.as_ref().map(|f| f.pattern()),
            "max_iterations": ctx.iteration_limit(),
            "model_override": ctx.model_override,
            "auto_complete": ctx.auto_complete,
            "resume": ctx.resume,
        })));
    }

    fn schedule_pass(&self, graph: &mut GraphBuilder<'_>, progress: &mut Progress) -> Result<LoopState> {
        let mut snapshot = graph.build(&self.ctx)?;
        snapshot.exclude(&progress.attempted);

        for skipped in &snapshot.skipped {
            if !progress.attempted.contains(&skipped.id) {
                self.note_skip(progress, TaskOutcome::unresolved(&skipped.id, &skipped.reason));
            }
        }

        let queue = schedule(&snapshot, &self.ctx);
        tracing::debug!(candidates = queue.len(), "scheduling pass");
        if queue.is_empty() {
            return Ok(LoopState::Done(StopReason::NoCandidates));
        }
        Ok(LoopState::Dispatching(queue.into()))
    }

    fn dispatch_next(
        &self,
        mut queue: VecDeque<ReadyQueueEntry>,
        progress: &mut Progress,
    ) -> Result<LoopState> {
        let Some(entry) = queue.pop_front() else {
            return Ok(LoopState::Done(StopReason::NoCandidates));
        };
        let task = entry.task;

        let record = match self.process(&task)? {
            Step::Skip(reason) => {
                self.note_skip(progress, TaskOutcome::for_task(&task, Outcome::Skipped { reason }));
                return Ok(LoopState::Dispatching(queue));
            }
            Step::Processed(record) => record,
        };

        let cascading = !self.ctx.dry_run && self.ctx.auto_complete;
        let reached_done = match &record.outcome {
            Outcome::Failed { .. } if cascading => self.left_done(&task.id)?,
            outcome => outcome.reached_done(),
        };
        progress.attempted.insert(task.id.clone());
        progress.skips.remove(&task.id);
        progress.iterations += 1;
        if let Some(report) = &self.reporter {
            report(&record);
        }
        progress.outcomes.push(record);

        if reached_done && cascading {
            return Ok(LoopState::Cascading(task));
        }
        Ok(self.next_pass(progress))
    }

    /// Whether a failed task was closed anyway, by the agent before it
    /// exited nonzero.
    fn left_done(&self, task_id: &str) -> Result<bool> {
        match self.tracker.get(task_id) {
            Ok(record) => Ok(TaskStatus::from_tracker(record.status.as_deref().unwrap_or_default())
                .is_done()),
            Err(e) if !e.is_fatal() => Ok(false),
            Err(e) => Err(e),
        }
    }

    fn next_pass(&self, progress: &Progress) -> LoopState {
        match self.ctx.iteration_limit() {
            Some(limit) if progress.iterations >= limit => LoopState::Done(StopReason::IterationLimit),
            _ => LoopState::Scheduling,
        }
    }

    /// Handle one task: containers are closed or skipped, leaves dispatched.
    fn process(&self, task: &Task) -> Result<Step> {
        let children = match child_state(self.tracker, &task.id) {
            Ok(children) => children,
            Err(e) if !e.is_fatal() => return Ok(Step::failed(task, e)),
            Err(e) => return Err(e),
        };

        match children {
            ChildState::Leaf => self.dispatch_leaf(task),
            ChildState::Incomplete { remaining, total } => Ok(Step::Skip(format!(
                "{} of {} children not done",
                remaining, total
            ))),
            ChildState::Complete { .. } if !self.ctx.auto_complete => Ok(Step::Skip(
                "all children done; auto-complete is off".to_string(),
            )),
            ChildState::Complete { .. } if self.ctx.dry_run => {
                Ok(Step::Processed(TaskOutcome::for_task(task, Outcome::WouldClose)))
            }
            ChildState::Complete { total } => {
                let cascader = self.cascader();
                match cascader.close_container(&task.id, total, EventAction::ContainerClose) {
                    Ok(()) => Ok(Step::Processed(TaskOutcome::for_task(
                        task,
                        Outcome::ContainerClosed,
                    ))),
                    Err(e) if !e.is_fatal() => Ok(Step::failed(task, e)),
                    Err(e) => Err(e),
                }
            }
        }
    }

    fn dispatch_leaf(&self, task: &Task) -> Result<Step> {
        let route = self.router.route(task, self.ctx.model_override.as_deref());
        let dispatcher = Dispatcher::new(self.tracker, self.runner, self.prompt, &self.events);

        let outcome = match dispatcher.dispatch(task, &route, &self.ctx) {
            Ok(outcome) => outcome,
            Err(e) if !e.is_fatal() => Outcome::Failed {
                reason: e.to_string(),
            },
            Err(e) => return Err(e),
        };

        let mut record = TaskOutcome::for_task(task, outcome);
        record.agent = Some(route.identity().to_string());
        record.model = route.model().map(str::to_string);
        record.notes = route.notes;
        Ok(Step::Processed(record))
    }

    fn cascade_from(&self, task: &Task, progress: &mut Progress) -> Result<()> {
        let notes = match self.cascader().cascade(task.parent_id.as_deref()) {
            Ok(report) => {
                for id in &report.closed {
                    progress.skips.remove(id);
                    progress.attempted.insert(id.clone());
                }
                progress.cascade_closed.extend(report.closed);
                report.notes
            }
            Err(e) if !e.is_fatal() => vec![format!("cascade failed: {}", e)],
            Err(e) => return Err(e),
        };

        if let Some(last) = progress.outcomes.last_mut() {
            last.notes.extend(notes);
        }
        Ok(())
    }

    fn cascader(&self) -> Cascader<'_> {
        Cascader::new(
            self.tracker,
            &self.events,
            self.ctx.auto_complete && !self.ctx.dry_run,
        )
    }

    fn note_skip(&self, progress: &mut Progress, record: TaskOutcome) {
        if progress.skips.contains_key(&record.task_id) {
            return;
        }
        if let Outcome::Skipped { reason } = &record.outcome {
            tracing::debug!(task = %record.task_id, reason = %reason, "skipping task");
            self.events.record(
                Event::new(EventAction::Skip)
                    .with_task(&record.task_id)
                    .with_details(json!({ "reason": reason })),
            );
        }
        progress.skips.insert(record.task_id.clone(), record);
    }
}

/// Result of handling one queue entry.
enum Step {
    /// Not processed this pass.
    Skip(String),
    Processed(TaskOutcome),
}

impl Step {
    fn failed(task: &Task, err: RalphError) -> Self {
        tracing::warn!(task = %task.id, error = %err, "task failed");
        Step::Processed(TaskOutcome::for_task(
            task,
            Outcome::Failed {
                reason: err.to_string(),
            },
        ))
    }
}

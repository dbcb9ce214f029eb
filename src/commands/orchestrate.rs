//! Implementation of the `ralph orchestrate` command.
//!
//! Wires configuration, the agent store, the `bd` tracker and the agent
//! runner into an [`Orchestrator`] and prints progress and the run summary.
//!
//! Command-line flags override `orchestrator.yaml`:
//!
//! | flag | config key |
//! |------|------------|
//! | `--max-iterations` | `max_iterations` |
//! | `--resume` | `resume` |
//! | `--no-auto-complete` | `auto_complete` |
//!
//! The process exits 0 when the loop finishes normally, including when some
//! tasks failed; failures are reported in the summary.

use super::agents::format_agents;
use crate::agent::prompt::TaskPrompt;
use crate::agent::{AgentRunner, AgentStore, CommandRunner, Router, RoutingTable};
use crate::cli::OrchestrateArgs;
use crate::config::Config;
use crate::context::ProjectContext;
use crate::dispatch::Outcome;
use crate::error::Result;
use crate::events::EventLog;
use crate::orchestrator::{Orchestrator, RunSummary, TaskOutcome};
use crate::scheduler::{LabelFilter, RunContext};
use crate::tracker::{BeadsTracker, Tracker};

/// Execute the `ralph orchestrate` command.
pub fn cmd_orchestrate(args: OrchestrateArgs) -> Result<()> {
    let project = ProjectContext::resolve()?;
    let store = AgentStore::load(&project.agents_dir())?;

    if args.list_agents {
        print!("{}", format_agents(&store, &project));
        return Ok(());
    }

    let config = Config::load(project.config_path())?;
    let tracker = BeadsTracker::new(&config.tracker, &project.project_root)?;
    let runner = CommandRunner::new(&config.runner, &project)?;

    let summary = execute(&project, &config, store, &args, &tracker, &runner)?;
    print!("{}", format_summary(&summary));
    Ok(())
}

/// Build the run context from configuration and flags.
fn run_context(args: &OrchestrateArgs, config: &Config) -> Result<RunContext> {
    let label_filter = args.label.as_deref().map(LabelFilter::new).transpose()?;

    Ok(RunContext {
        max_iterations: args.max_iterations.or(config.max_iterations),
        label_filter,
        dry_run: args.dry_run,
        model_override: args.model.clone(),
        auto_complete: config.auto_complete && !args.no_auto_complete,
        resume: args.resume || config.resume,
        single: args.single,
    })
}

/// Run the loop against the given collaborators.
fn execute(
    project: &ProjectContext,
    config: &Config,
    store: AgentStore,
    args: &OrchestrateArgs,
    tracker: &dyn Tracker,
    runner: &dyn AgentRunner,
) -> Result<RunSummary> {
    let ctx = run_context(args, config)?;
    let router =
        Router::new(RoutingTable::standard(), store).with_default_model(config.default_model.clone());
    let prompt = TaskPrompt::new(config.prompt_template.as_deref())
        .with_tracker_command(&config.tracker.command);
    let events = if config.event_log {
        EventLog::to_file(project.events_file())
    } else {
        EventLog::disabled()
    };

    for (identity, reason) in router.store().failures() {
        eprintln!("Warning: agent '{}' failed to load: {}", identity, reason);
    }

    println!("{}", format_header(&ctx));

    Orchestrator::new(tracker, runner, &router, &prompt, events, ctx)
        .with_reporter(|outcome| println!("{}", format_outcome(outcome)))
        .run()
}

fn format_header(ctx: &RunContext) -> String {
    let mut parts = Vec::new();
    if ctx.dry_run {
        parts.push("DRY RUN".to_string());
    }
    if let Some(filter) = &ctx.label_filter {
        parts.push(format!("label={}", filter.pattern()));
    }
    if let Some(limit) = ctx.iteration_limit() {
        parts.push(format!("max={}", limit));
    }
    if let Some(model) = &ctx.model_override {
        parts.push(format!("model={}", model));
    }
    if ctx.resume {
        parts.push("resume".to_string());
    }
    if !ctx.auto_complete {
        parts.push("no-auto-complete".to_string());
    }

    if parts.is_empty() {
        "Orchestrating backlog".to_string()
    } else {
        format!("Orchestrating backlog ({})", parts.join(", "))
    }
}

/// One progress line per processed task.
fn format_outcome(outcome: &TaskOutcome) -> String {
    let mut line = format!("{:<14} {}", outcome.task_id, outcome.outcome);
    match (&outcome.agent, &outcome.model) {
        (Some(agent), Some(model)) => line.push_str(&format!("  [{} / {}]", agent, model)),
        (Some(agent), None) => line.push_str(&format!("  [{}]", agent)),
        _ => {}
    }
    if !outcome.title.is_empty() {
        line.push_str("  ");
        line.push_str(&outcome.title);
    }
    line
}

fn format_summary(summary: &RunSummary) -> String {
    let mut lines = vec![
        String::new(),
        format!("Run Summary ({})", summary.stop),
        "===========".to_string(),
    ];
    if summary.dry_run {
        lines.push(format!("  Planned:     {:>3}", summary.planned()));
    } else {
        lines.push(format!("  Completed:   {:>3}", summary.completed()));
        lines.push(format!("  Failed:      {:>3}", summary.failed()));
        lines.push(format!("  Auto-closed: {:>3}", summary.auto_closed()));
    }
    lines.push(format!("  Skipped:     {:>3}", summary.skipped()));

    if !summary.outcomes.is_empty() {
        lines.push(String::new());
        lines.push("Tasks:".to_string());
        for outcome in &summary.outcomes {
            lines.push(format!("  {}", format_outcome(outcome)));
            for note in &outcome.notes {
                lines.push(format!("      note: {}", note));
            }
        }
    }

    if !summary.cascade_closed.is_empty() {
        lines.push(String::new());
        lines.push(format!("Closed by cascade: {}", summary.cascade_closed.join(", ")));
    }

    let failed: Vec<&str> = summary
        .outcomes
        .iter()
        .filter(|o| matches!(o.outcome, Outcome::Failed { .. }))
        .map(|o| o.task_id.as_str())
        .collect();
    if !failed.is_empty() {
        lines.push(String::new());
        lines.push(format!(
            "Failed tasks stay in progress; rerun with --resume to retry: {}",
            failed.join(", ")
        ));
    }

    let mut out = lines.join("\n");
    out.push('\n');
    out
}

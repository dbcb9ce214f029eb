//! Implementation of the `ralph init` command.
//!
//! Scaffolds a project for orchestration:
//!
//! 1. `.claude/agents/dev-*.md` for every canonical identity, generated from
//!    the built-in role prompts
//! 2. `.claude/orchestrator.yaml` with the default settings
//!
//! An existing `.claude/` directory is refused unless `--force` (overwrite
//! the scaffolded files) or `--merge` (write only the missing ones) is given.
//! Files ralph does not scaffold are never touched.

use crate::agent::{AgentConfig, AgentType};
use crate::cli::InitArgs;
use crate::config::Config;
use crate::context::ProjectContext;
use crate::error::{RalphError, Result};
use crate::fs::write_atomic;
use std::path::{Path, PathBuf};

/// What happened to one scaffolded file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FileAction {
    Created,
    Replaced,
    Kept,
}

/// Execute the `ralph init` command.
pub fn cmd_init(args: InitArgs) -> Result<()> {
    let target = resolve_target(args.target.as_deref())?;
    let project = ProjectContext::at(&target);

    let results = scaffold(&project, &args)?;

    println!("Initialized ralph in {}", target.display());
    println!();
    for (path, action) in &results {
        let rel = path.strip_prefix(&target).unwrap_or(path);
        match action {
            FileAction::Created => println!("  created  {}", rel.display()),
            FileAction::Replaced => println!("  replaced {}", rel.display()),
            FileAction::Kept if args.verbose => println!("  kept     {} (exists)", rel.display()),
            FileAction::Kept => {}
        }
    }
    println!();
    println!("Next steps:");
    println!("  1. Review and customize the agents in .claude/agents/");
    println!("  2. Initialize the tracker in your project: bd init");
    println!("  3. Label tasks with agent:<type> and run: ralph orchestrate --dry-run");

    Ok(())
}

fn resolve_target(target: Option<&Path>) -> Result<PathBuf> {
    let cwd = std::env::current_dir().map_err(|e| {
        RalphError::UserError(format!("failed to get current working directory: {}", e))
    })?;
    let target = match target {
        Some(path) => cwd.join(path),
        None => cwd,
    };

    if !target.is_dir() {
        return Err(RalphError::UserError(format!(
            "target directory does not exist: {}",
            target.display()
        )));
    }
    Ok(target)
}

/// Write the scaffold files, returning each path with what was done to it.
fn scaffold(project: &ProjectContext, args: &InitArgs) -> Result<Vec<(PathBuf, FileAction)>> {
    if project.claude_dir.exists() && !args.force && !args.merge {
        return Err(RalphError::UserError(format!(
            "'{}' already exists\n\
             Fix: use --force to overwrite the scaffolded files or --merge to add only missing ones.",
            project.claude_dir.display()
        )));
    }

    let mut files = Vec::new();
    for agent_type in AgentType::ALL {
        let path = project
            .agents_dir()
            .join(format!("{}.md", agent_type.identity()));
        files.push((path, AgentConfig::built_in(agent_type).to_markdown()?));
    }
    files.push((project.config_path(), Config::default().to_yaml()?));

    let mut results = Vec::new();
    for (path, content) in files {
        let action = if !path.exists() {
            FileAction::Created
        } else if args.force {
            FileAction::Replaced
        } else {
            FileAction::Kept
        };

        if action != FileAction::Kept {
            write_atomic(&path, &content)?;
        }
        tracing::debug!(path = %path.display(), action = ?action, "scaffolded file");
        results.push((path, action));
    }

    Ok(results)
}

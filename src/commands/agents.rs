//! Implementation of the `ralph agents` command.
//!
//! Lists the canonical agent identities with the configuration each one
//! resolves to, any extra agents found in `.claude/agents/`, and files that
//! failed to load.

use crate::agent::config::{AgentLookup, AgentStore};
use crate::agent::{AgentSource, AgentType};
use crate::context::ProjectContext;
use crate::error::Result;

/// Execute the `ralph agents` command.
pub fn cmd_agents() -> Result<()> {
    let project = ProjectContext::resolve()?;
    let store = AgentStore::load(&project.agents_dir())?;
    print!("{}", format_agents(&store, &project));
    Ok(())
}

/// Render the agent listing.
pub(super) fn format_agents(store: &AgentStore, project: &ProjectContext) -> String {
    let mut lines = vec![
        format!("Agents ({})", project.agents_dir().display()),
        "======".to_string(),
        String::new(),
    ];

    for agent_type in AgentType::ALL {
        let identity = agent_type.identity();
        let source = match store.lookup(identity) {
            AgentLookup::Loaded(config) => {
                let mut source = "file".to_string();
                if config.name != config.identity {
                    source.push_str(&format!("  name={}", config.name));
                }
                if let Some(model) = &config.model {
                    source.push_str(&format!("  model={}", model));
                }
                if !config.capabilities.is_empty() {
                    source.push_str(&format!("  tools={}", config.capabilities.join(",")));
                }
                source
            }
            AgentLookup::Absent => "built-in".to_string(),
            AgentLookup::Failed(_) => "FAILED (tasks fall back to dev-general)".to_string(),
        };
        lines.push(format!("  {:<13} {:<16} {}", identity, agent_type.label(), source));
    }

    let extra: Vec<_> = store
        .agents()
        .filter(|a| AgentType::ALL.iter().all(|t| t.identity() != a.identity))
        .collect();
    if !extra.is_empty() {
        lines.push(String::new());
        lines.push("Other agents (not routed by label):".to_string());
        for agent in extra {
            let path = match &agent.source {
                AgentSource::File(path) => path.display().to_string(),
                AgentSource::BuiltIn => "built-in".to_string(),
            };
            lines.push(format!("  {:<13} {}", agent.identity, path));
        }
    }

    if !store.failures().is_empty() {
        lines.push(String::new());
        lines.push("Load failures:".to_string());
        for (identity, reason) in store.failures() {
            lines.push(format!("  {}: {}", identity, reason));
        }
    }

    let mut out = lines.join("\n");
    out.push('\n');
    out
}

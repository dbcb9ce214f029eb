//! Task-to-agent routing.
//!
//! # Resolution Order
//!
//! 1. Scan the task's `agent:<type>` labels through the [`RoutingTable`];
//!    the highest-precedence recognized type wins
//! 2. No recognized label: `dev-general`
//! 3. Load the identity's configuration from the [`AgentStore`]:
//!    - loaded: use it
//!    - file absent: use the built-in configuration for that type
//!    - file failed to load: fall back to `dev-general`
//! 4. Model: run override, then the agent's own model, then the default
//!
//! Routing never fails. Anything unusual is recorded as a note on the
//! decision and the task still gets an agent.

use crate::agent::config::{AgentConfig, AgentLookup, AgentStore};
use crate::agent::routing::{AgentType, RoutingTable};
use crate::task::Task;

/// The agent chosen for a task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteDecision {
    /// Type selected by the task's labels.
    pub agent_type: AgentType,
    /// Effective configuration. A copy; the store is never modified.
    pub config: AgentConfig,
    /// Non-fatal routing notes (unknown labels, fallbacks).
    pub notes: Vec<String>,
}

impl RouteDecision {
    pub fn identity(&self) -> &str {
        &self.config.identity
    }

    pub fn model(&self) -> Option<&str> {
        self.config.model.as_deref()
    }
}

/// Resolves tasks to agent configurations.
#[derive(Debug, Clone)]
pub struct Router {
    table: RoutingTable,
    store: AgentStore,
    default_model: Option<String>,
}

impl Router {
    pub fn new(table: RoutingTable, store: AgentStore) -> Self {
        Self {
            table,
            store,
            default_model: None,
        }
    }

    /// Model used when neither the run nor the agent names one.
    pub fn with_default_model(mut self, model: Option<String>) -> Self {
        self.default_model = model;
        self
    }

    pub fn store(&self) -> &AgentStore {
        &self.store
    }

    /// Choose the agent for `task`, applying `model_override` if given.
    pub fn route(&self, task: &Task, model_override: Option<&str>) -> RouteDecision {
        let mut notes = Vec::new();

        let matched = self.table.match_labels(&task.labels);
        for label in &matched.unrecognized {
            notes.push(format!("unrecognized agent label '{}'", label));
        }
        let agent_type = match matched.agent_type {
            Some(agent_type) => agent_type,
            None => {
                if !matched.unrecognized.is_empty() {
                    notes.push(format!("routing to {}", AgentType::General.identity()));
                }
                AgentType::General
            }
        };

        let mut config = self.resolve_config(agent_type, &mut notes);

        // Only meaningful when the routed type kept its own configuration.
        if config.identity == agent_type.identity() {
            let routed_label = task
                .labels
                .iter()
                .find(|l| self.table.match_labels(std::iter::once(*l)).agent_type == Some(agent_type));
            if let Some(label) = routed_label {
                if !config.matches_label(label) {
                    notes.push(format!(
                        "{} declares label pattern '{}' which does not match '{}'",
                        config.identity, config.label_pattern, label
                    ));
                }
            }
        }

        config.model = model_override
            .map(str::to_string)
            .or(config.model)
            .or_else(|| self.default_model.clone());

        tracing::debug!(
            task = %task.id,
            agent = %config.identity,
            model = config.model.as_deref().unwrap_or("-"),
            "routed task"
        );

        RouteDecision {
            agent_type,
            config,
            notes,
        }
    }

    fn resolve_config(&self, agent_type: AgentType, notes: &mut Vec<String>) -> AgentConfig {
        let identity = agent_type.identity();

        match self.store.lookup(identity) {
            AgentLookup::Loaded(config) => config.clone(),
            AgentLookup::Absent => {
                notes.push(format!("no configuration file for {}, using built-in prompt", identity));
                AgentConfig::built_in(agent_type)
            }
            AgentLookup::Failed(reason) => {
                let general = AgentType::General;
                notes.push(format!(
                    "failed to load {} ({}), falling back to {}",
                    identity,
                    reason,
                    general.identity()
                ));
                if agent_type == general {
                    return AgentConfig::built_in(general);
                }
                match self.store.lookup(general.identity()) {
                    AgentLookup::Loaded(config) => config.clone(),
                    _ => AgentConfig::built_in(general),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::config::AgentSource;
    use crate::task::{TaskKind, TaskStatus};
    use std::collections::BTreeSet;
    use std::path::PathBuf;

    fn task_with_labels(labels: &[&str]) -> Task {
        Task {
            id: "fb-1".to_string(),
            title: "Task".to_string(),
            kind: TaskKind::Task,
            parent_id: Some("fb-0".to_string()),
            depth: 1,
            labels: labels.iter().map(|s| s.to_string()).collect(),
            dependency_ids: BTreeSet::new(),
            status: TaskStatus::Open,
            notes: String::new(),
            description: String::new(),
            acceptance: String::new(),
        }
    }

    fn file_config(agent_type: AgentType, model: Option<&str>) -> AgentConfig {
        AgentConfig {
            model: model.map(str::to_string),
            prompt_body: format!("file prompt for {}", agent_type.identity()),
            source: AgentSource::File(PathBuf::from(format!("{}.md", agent_type.identity()))),
            ..AgentConfig::built_in(agent_type)
        }
    }

    fn full_store() -> AgentStore {
        AgentStore::from_configs(AgentType::ALL.iter().map(|t| file_config(*t, Some("sonnet"))))
    }

    #[test]
    fn test_routes_frontend_label() {
        let router = Router::new(RoutingTable::standard(), full_store());
        let decision = router.route(&task_with_labels(&["agent:frontend"]), None);

        assert_eq!(decision.agent_type, AgentType::Frontend);
        assert_eq!(decision.identity(), "dev-frontend");
        assert_eq!(decision.model(), Some("sonnet"));
        assert!(decision.notes.is_empty());
    }

    #[test]
    fn test_backend_takes_precedence() {
        let router = Router::new(RoutingTable::standard(), full_store());
        let decision = router.route(&task_with_labels(&["agent:frontend", "agent:backend"]), None);
        assert_eq!(decision.identity(), "dev-backend");
    }

    #[test]
    fn test_no_labels_routes_general_without_notes() {
        let router = Router::new(RoutingTable::standard(), full_store());
        let decision = router.route(&task_with_labels(&[]), None);
        assert_eq!(decision.identity(), "dev-general");
        assert!(decision.notes.is_empty());
    }

    #[test]
    fn test_unknown_label_routes_general_with_note() {
        let router = Router::new(RoutingTable::standard(), full_store());
        let decision = router.route(&task_with_labels(&["agent:devops"]), None);

        assert_eq!(decision.agent_type, AgentType::General);
        assert_eq!(decision.identity(), "dev-general");
        assert!(decision.notes.iter().any(|n| n.contains("agent:devops")));
    }

    #[test]
    fn test_load_failure_falls_back_to_general() {
        let mut store = AgentStore::from_configs(
            AgentType::ALL
                .iter()
                .filter(|t| **t != AgentType::Qa)
                .map(|t| file_config(*t, Some("sonnet"))),
        );
        store.record_failure("dev-qa", "bad yaml");

        let router = Router::new(RoutingTable::standard(), store);
        let decision = router.route(&task_with_labels(&["agent:qa"]), None);

        assert_eq!(decision.agent_type, AgentType::Qa);
        assert_eq!(decision.identity(), "dev-general");
        assert!(decision.notes.iter().any(|n| n.contains("failed to load dev-qa")));
    }

    #[test]
    fn test_general_load_failure_uses_built_in() {
        let mut store = AgentStore::default();
        store.record_failure("dev-general", "bad yaml");

        let router = Router::new(RoutingTable::standard(), store);
        let decision = router.route(&task_with_labels(&[]), None);

        assert_eq!(decision.identity(), "dev-general");
        assert_eq!(decision.config.source, AgentSource::BuiltIn);
    }

    #[test]
    fn test_absent_file_uses_built_in_for_type() {
        let router = Router::new(RoutingTable::standard(), AgentStore::default());
        let decision = router.route(&task_with_labels(&["agent:sdet"]), None);

        assert_eq!(decision.identity(), "dev-sdet");
        assert_eq!(decision.config.source, AgentSource::BuiltIn);
        assert_eq!(
            decision.config.prompt_body,
            AgentType::Sdet.fallback_prompt()
        );
        assert_eq!(decision.notes.len(), 1);
    }

    #[test]
    fn test_model_override_does_not_touch_store() {
        let router = Router::new(RoutingTable::standard(), full_store());
        let decision = router.route(&task_with_labels(&["agent:ai"]), Some("opus"));
        assert_eq!(decision.model(), Some("opus"));

        let again = router.route(&task_with_labels(&["agent:ai"]), None);
        assert_eq!(again.model(), Some("sonnet"));
        match router.store().lookup("dev-ai") {
            AgentLookup::Loaded(config) => assert_eq!(config.model.as_deref(), Some("sonnet")),
            other => panic!("unexpected lookup {:?}", other),
        }
    }

    #[test]
    fn test_default_model_applies_when_agent_has_none() {
        let store = AgentStore::from_configs([file_config(AgentType::Backend, None)]);
        let router = Router::new(RoutingTable::standard(), store)
            .with_default_model(Some("haiku".to_string()));

        let decision = router.route(&task_with_labels(&["agent:backend"]), None);
        assert_eq!(decision.model(), Some("haiku"));
    }

    #[test]
    fn test_label_pattern_mismatch_is_noted() {
        let mut config = file_config(AgentType::Backend, None);
        config.label_pattern = "agent:api".to_string();
        let router = Router::new(RoutingTable::standard(), AgentStore::from_configs([config]));

        let decision = router.route(&task_with_labels(&["agent:backend"]), None);
        assert_eq!(decision.identity(), "dev-backend");
        assert!(decision.notes.iter().any(|n| n.contains("agent:api")));
    }

    #[test]
    fn test_file_named_differently_still_routes() {
        let temp = tempfile::TempDir::new().unwrap();
        std::fs::write(
            temp.path().join("dev-backend.md"),
            "---\nname: backend-engineer\nmodel: opus\n---\nBackend.\n",
        )
        .unwrap();
        let store = AgentStore::load(temp.path()).unwrap();
        let router = Router::new(RoutingTable::standard(), store);

        let decision = router.route(&task_with_labels(&["agent:backend"]), None);
        assert_eq!(decision.identity(), "dev-backend");
        assert_eq!(decision.config.name, "backend-engineer");
        assert_eq!(decision.model(), Some("opus"));
        assert!(matches!(decision.config.source, AgentSource::File(_)));
        assert!(decision.notes.is_empty());
    }

    #[test]
    fn test_injected_table() {
        let table = RoutingTable::new(
            vec![("api".to_string(), AgentType::Backend)],
            vec![AgentType::Backend],
        );
        let router = Router::new(table, full_store());

        let decision = router.route(&task_with_labels(&["agent:api"]), None);
        assert_eq!(decision.identity(), "dev-backend");

        let decision = router.route(&task_with_labels(&["agent:frontend"]), None);
        assert_eq!(decision.identity(), "dev-general");
    }
}

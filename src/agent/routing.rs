//! Label-to-identity routing table.
//!
//! Tasks opt into a specialist agent with a label of the form `agent:<type>`.
//! The table maps each recognized `<type>` to an [`AgentType`] and fixes the
//! order in which types win when a task carries several agent labels.
//!
//! | label            | identity       |
//! |------------------|----------------|
//! | `agent:backend`  | `dev-backend`  |
//! | `agent:frontend` | `dev-frontend` |
//! | `agent:ai`       | `dev-ai`       |
//! | `agent:sdet`     | `dev-sdet`     |
//! | `agent:qa`       | `dev-qa`       |
//! | `agent:general`  | `dev-general`  |
//!
//! Anything else routes to `dev-general`.

use regex::Regex;
use std::collections::BTreeSet;
use std::fmt;
use std::sync::LazyLock;

static AGENT_LABEL_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^agent:([A-Za-z0-9_-]+)$").expect("Invalid agent label regex")
});

/// The closed set of agent specializations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum AgentType {
    Backend,
    Frontend,
    Ai,
    Sdet,
    Qa,
    General,
}

impl AgentType {
    /// Every type, in default precedence order.
    pub const ALL: [AgentType; 6] = [
        AgentType::Backend,
        AgentType::Frontend,
        AgentType::Ai,
        AgentType::Sdet,
        AgentType::Qa,
        AgentType::General,
    ];

    /// Label suffix, as in `agent:<key>`.
    pub fn key(&self) -> &'static str {
        match self {
            AgentType::Backend => "backend",
            AgentType::Frontend => "frontend",
            AgentType::Ai => "ai",
            AgentType::Sdet => "sdet",
            AgentType::Qa => "qa",
            AgentType::General => "general",
        }
    }

    /// Agent identity name; also the config file stem in `.claude/agents/`.
    pub fn identity(&self) -> &'static str {
        match self {
            AgentType::Backend => "dev-backend",
            AgentType::Frontend => "dev-frontend",
            AgentType::Ai => "dev-ai",
            AgentType::Sdet => "dev-sdet",
            AgentType::Qa => "dev-qa",
            AgentType::General => "dev-general",
        }
    }

    /// The routing label for this type.
    pub fn label(&self) -> String {
        format!("agent:{}", self.key())
    }

    pub fn description(&self) -> &'static str {
        match self {
            AgentType::Backend => "Backend development: APIs, services, persistence",
            AgentType::Frontend => "Frontend development: UI components, styling, client state",
            AgentType::Ai => "AI/ML work: prompts, model integration, evaluation",
            AgentType::Sdet => "Test automation: test suites, fixtures, CI checks",
            AgentType::Qa => "Quality assurance: verification against acceptance criteria",
            AgentType::General => "General-purpose development",
        }
    }

    /// Role prompt used when the identity has no configuration file.
    pub fn fallback_prompt(&self) -> &'static str {
        match self {
            AgentType::Backend => {
                "You are a backend development agent. You build and maintain server-side \
                 code: APIs, services, data models and persistence. Follow the existing \
                 conventions of the codebase and cover your changes with tests."
            }
            AgentType::Frontend => {
                "You are a frontend development agent. You build user interfaces: \
                 components, styling, client-side state and accessibility. Match the \
                 existing design system and component patterns."
            }
            AgentType::Ai => {
                "You are an AI engineering agent. You work on model integrations, prompts, \
                 retrieval and evaluation code. Keep model calls isolated behind clear \
                 interfaces and measure changes where you can."
            }
            AgentType::Sdet => {
                "You are a software development engineer in test. You write and maintain \
                 automated tests, fixtures and test infrastructure. Prefer deterministic \
                 tests and keep the suite fast."
            }
            AgentType::Qa => {
                "You are a quality assurance agent. You verify completed work against its \
                 acceptance criteria, exercise edge cases and report defects precisely."
            }
            AgentType::General => {
                "You are a general-purpose development agent. Read the task carefully, \
                 inspect the surrounding code and make the smallest complete change that \
                 satisfies it."
            }
        }
    }
}

impl fmt::Display for AgentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.identity())
    }
}

/// Parse the `<type>` out of an `agent:<type>` label.
pub fn parse_agent_label(label: &str) -> Option<&str> {
    AGENT_LABEL_REGEX
        .captures(label)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}

/// Result of scanning a task's labels against a table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelMatch {
    /// Winning type, or `None` when no label was recognized.
    pub agent_type: Option<AgentType>,
    /// `agent:*` labels the table does not recognize.
    pub unrecognized: Vec<String>,
}

/// Explicit mapping from label suffix to agent type, plus precedence.
#[derive(Debug, Clone)]
pub struct RoutingTable {
    entries: Vec<(String, AgentType)>,
    precedence: Vec<AgentType>,
}

impl RoutingTable {
    pub fn new(entries: Vec<(String, AgentType)>, precedence: Vec<AgentType>) -> Self {
        Self {
            entries,
            precedence,
        }
    }

    /// The built-in table: one label per type, backend first.
    pub fn standard() -> Self {
        Self::new(
            AgentType::ALL
                .iter()
                .map(|t| (t.key().to_string(), *t))
                .collect(),
            AgentType::ALL.to_vec(),
        )
    }

    /// Look up a single label suffix.
    pub fn lookup(&self, key: &str) -> Option<AgentType> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, t)| *t)
    }

    /// Pick the agent type for a label set.
    ///
    /// Labels that are not of the `agent:<type>` form are ignored. When
    /// several recognized labels are present the earliest type in the
    /// precedence list wins; a recognized type missing from the precedence
    /// list ranks after all listed ones.
    pub fn match_labels<'a, I>(&self, labels: I) -> LabelMatch
    where
        I: IntoIterator<Item = &'a String>,
    {
        let mut found = BTreeSet::new();
        let mut unrecognized = Vec::new();

        for label in labels {
            let Some(key) = parse_agent_label(label) else {
                continue;
            };
            match self.lookup(key) {
                Some(agent_type) => {
                    found.insert(agent_type);
                }
                None => unrecognized.push(label.clone()),
            }
        }

        let agent_type = self
            .precedence
            .iter()
            .find(|t| found.contains(t))
            .copied()
            .or_else(|| found.iter().next().copied());

        LabelMatch {
            agent_type,
            unrecognized,
        }
    }
}

impl Default for RoutingTable {
    fn default() -> Self {
        Self::standard()
    }
}

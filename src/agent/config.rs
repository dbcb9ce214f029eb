//! Agent configuration store.
//!
//! Each agent identity is described by a markdown file in `.claude/agents/`:
//! YAML frontmatter followed by the role prompt.
//!
//! # File Format
//!
//! ```markdown
//! ---
//! name: dev-backend
//! description: Backend development agent
//! model: sonnet
//! tools: Read, Write, Edit, Bash, Grep, Glob
//! skills:
//!   - api-design
//! label: "agent:backend"
//! ---
//! You are a backend development agent...
//! ```
//!
//! The file stem is the identity routing looks up; `name` is the agent name
//! handed to the agent CLI and defaults to the stem.
//!
//! `tools` and `skills` accept either a YAML list or a comma-separated
//! string. `label` is a glob over task labels and defaults to the canonical
//! routing label of the identity.
//!
//! A file that fails to parse is recorded as a load failure for its identity
//! and does not prevent the other identities from loading. A missing
//! directory is fatal.

use crate::agent::routing::AgentType;
use crate::error::{RalphError, Result};
use globset::Glob;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Frontmatter of an agent file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentFrontmatter {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub tools: Option<NameList>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub skills: Option<NameList>,

    /// Glob over task labels this identity serves.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,

    /// Unknown fields preserved for forward compatibility.
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_yaml::Value>,
}

/// A list of names written either inline (`a, b`) or as a YAML sequence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum NameList {
    Inline(String),
    List(Vec<String>),
}

impl NameList {
    pub fn to_vec(&self) -> Vec<String> {
        let items: Vec<String> = match self {
            NameList::Inline(s) => s.split(',').map(|p| p.trim().to_string()).collect(),
            NameList::List(v) => v.iter().map(|p| p.trim().to_string()).collect(),
        };
        items.into_iter().filter(|p| !p.is_empty()).collect()
    }
}

/// Where an agent configuration came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AgentSource {
    /// Loaded from a file in the agents directory.
    File(PathBuf),
    /// No file exists; the built-in role prompt is used.
    BuiltIn,
}

/// Resolved configuration for one agent identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AgentConfig {
    /// Routing identity (the file stem, e.g. `dev-backend`).
    pub identity: String,
    /// Agent name passed to the agent CLI.
    pub name: String,
    pub description: String,
    pub label_pattern: String,
    pub model: Option<String>,
    /// Tool names the agent may use.
    pub capabilities: Vec<String>,
    pub skills: Vec<String>,
    pub prompt_body: String,
    pub source: AgentSource,
}

impl AgentConfig {
    /// Built-in configuration for an agent type with no file on disk.
    pub fn built_in(agent_type: AgentType) -> Self {
        Self {
            identity: agent_type.identity().to_string(),
            name: agent_type.identity().to_string(),
            description: agent_type.description().to_string(),
            label_pattern: agent_type.label(),
            model: None,
            capabilities: Vec::new(),
            skills: Vec::new(),
            prompt_body: agent_type.fallback_prompt().to_string(),
            source: AgentSource::BuiltIn,
        }
    }

    /// Parse an agent file. `stem` is the file name without extension and
    /// becomes the identity; it also names the agent when the frontmatter
    /// has no `name`.
    pub fn parse(stem: &str, content: &str, path: &Path) -> Result<Self> {
        let (yaml, body) = split_frontmatter(content)?;

        let fm: AgentFrontmatter = if yaml.trim().is_empty() {
            AgentFrontmatter::default()
        } else {
            serde_yaml::from_str(&yaml).map_err(|e| {
                RalphError::ConfigInvalid(format!("failed to parse agent frontmatter: {}", e))
            })?
        };

        let identity = stem.to_string();
        let name = fm
            .name
            .as_deref()
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .unwrap_or(stem)
            .to_string();

        let label_pattern = match fm.label.as_deref().map(str::trim) {
            Some(pattern) if !pattern.is_empty() => pattern.to_string(),
            _ => default_label_for(&identity),
        };
        Glob::new(&label_pattern).map_err(|e| {
            RalphError::ConfigInvalid(format!(
                "invalid label pattern '{}' for agent '{}': {}",
                label_pattern, identity, e
            ))
        })?;

        Ok(Self {
            identity,
            name,
            description: fm.description.unwrap_or_default(),
            label_pattern,
            model: fm
                .model
                .map(|m| m.trim().to_string())
                .filter(|m| !m.is_empty()),
            capabilities: fm.tools.as_ref().map(NameList::to_vec).unwrap_or_default(),
            skills: fm.skills.as_ref().map(NameList::to_vec).unwrap_or_default(),
            prompt_body: body.trim().to_string(),
            source: AgentSource::File(path.to_path_buf()),
        })
    }

    /// Whether `label` matches this identity's label pattern.
    pub fn matches_label(&self, label: &str) -> bool {
        Glob::new(&self.label_pattern)
            .map(|g| g.compile_matcher().is_match(label))
            .unwrap_or(false)
    }

    /// Render this configuration back to the on-disk file format.
    pub fn to_markdown(&self) -> Result<String> {
        let fm = AgentFrontmatter {
            name: Some(self.name.clone()),
            description: Some(self.description.clone()).filter(|d| !d.is_empty()),
            model: self.model.clone(),
            tools: Some(NameList::Inline(self.capabilities.join(", ")))
                .filter(|_| !self.capabilities.is_empty()),
            skills: Some(NameList::List(self.skills.clone())).filter(|_| !self.skills.is_empty()),
            label: Some(self.label_pattern.clone()),
            extra: BTreeMap::new(),
        };

        let yaml = serde_yaml::to_string(&fm).map_err(|e| {
            RalphError::ConfigInvalid(format!("failed to serialize agent frontmatter: {}", e))
        })?;

        Ok(format!("---\n{}---\n\n{}\n", yaml, self.prompt_body))
    }
}

/// `dev-backend` serves `agent:backend`; other names serve `agent:<name>`.
fn default_label_for(identity: &str) -> String {
    let key = identity.strip_prefix("dev-").unwrap_or(identity);
    format!("agent:{}", key)
}

/// Split a markdown file into its frontmatter YAML and body.
fn split_frontmatter(content: &str) -> Result<(String, String)> {
    let normalized = content.replace("\r\n", "\n");

    if !normalized.starts_with("---") {
        return Err(RalphError::ConfigInvalid(
            "agent file must start with '---' frontmatter delimiter".to_string(),
        ));
    }

    let first_newline = normalized.find('\n').ok_or_else(|| {
        RalphError::ConfigInvalid("agent file frontmatter is incomplete".to_string())
    })?;

    let rest = &normalized[first_newline + 1..];
    let (yaml, body) = if let Some(body) = rest.strip_prefix("---") {
        ("", body)
    } else {
        let closing = rest.find("\n---").ok_or_else(|| {
            RalphError::ConfigInvalid(
                "agent file missing closing '---' frontmatter delimiter".to_string(),
            )
        })?;
        (&rest[..closing], &rest[closing + 4..])
    };

    Ok((yaml.to_string(), body.to_string()))
}

/// Outcome of looking up an identity in the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AgentLookup<'a> {
    Loaded(&'a AgentConfig),
    /// A file exists for the identity but could not be loaded.
    Failed(&'a str),
    /// No file exists for the identity.
    Absent,
}

/// All agent configurations loaded from the agents directory.
#[derive(Debug, Clone, Default)]
pub struct AgentStore {
    agents: BTreeMap<String, AgentConfig>,
    failures: BTreeMap<String, String>,
}

impl AgentStore {
    /// Load every `*.md` file in `dir`.
    ///
    /// Returns [`RalphError::ConfigMissing`] if the directory does not exist.
    pub fn load(dir: &Path) -> Result<Self> {
        if !dir.is_dir() {
            return Err(RalphError::ConfigMissing(format!(
                "agents directory '{}' does not exist\n\
                 Fix: run `ralph init` to scaffold the default agents.",
                dir.display()
            )));
        }

        let entries = std::fs::read_dir(dir).map_err(|e| {
            RalphError::ConfigMissing(format!(
                "failed to read agents directory '{}': {}",
                dir.display(),
                e
            ))
        })?;

        let mut paths: Vec<PathBuf> = entries
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|p| p.is_file() && p.extension().is_some_and(|ext| ext == "md"))
            .collect();
        paths.sort();

        let mut store = Self::default();
        for path in paths {
            let stem = path
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_default();

            let loaded = std::fs::read_to_string(&path)
                .map_err(|e| {
                    RalphError::ConfigInvalid(format!(
                        "failed to read '{}': {}",
                        path.display(),
                        e
                    ))
                })
                .and_then(|content| AgentConfig::parse(&stem, &content, &path));

            match loaded {
                Ok(config) => store.insert(config),
                Err(e) => {
                    tracing::warn!(agent = %stem, error = %e, "failed to load agent configuration");
                    store.failures.insert(stem, e.to_string());
                }
            }
        }

        tracing::debug!(
            loaded = store.agents.len(),
            failed = store.failures.len(),
            dir = %dir.display(),
            "loaded agent configurations"
        );
        Ok(store)
    }

    /// Build a store from configurations already in memory.
    pub fn from_configs<I: IntoIterator<Item = AgentConfig>>(configs: I) -> Self {
        let mut store = Self::default();
        for config in configs {
            store.insert(config);
        }
        store
    }

    fn insert(&mut self, config: AgentConfig) {
        self.failures.remove(&config.identity);
        self.agents.insert(config.identity.clone(), config);
    }

    /// Record a load failure for an identity.
    pub fn record_failure(&mut self, identity: &str, reason: &str) {
        self.failures
            .insert(identity.to_string(), reason.to_string());
    }

    pub fn lookup(&self, identity: &str) -> AgentLookup<'_> {
        if let Some(config) = self.agents.get(identity) {
            return AgentLookup::Loaded(config);
        }
        match self.failures.get(identity) {
            Some(reason) => AgentLookup::Failed(reason),
            None => AgentLookup::Absent,
        }
    }

    /// Loaded configurations, ordered by identity.
    pub fn agents(&self) -> impl Iterator<Item = &AgentConfig> {
        self.agents.values()
    }

    /// Identities whose files failed to load, with the reason.
    pub fn failures(&self) -> &BTreeMap<String, String> {
        &self.failures
    }
}

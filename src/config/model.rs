//! Config struct definition and default implementation.

use super::types::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Orchestrator settings from `.claude/orchestrator.yaml`.
///
/// Every key is optional. Command-line flags override these values when the
/// run context is built.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub tracker: TrackerSettings,

    pub runner: RunnerSettings,

    /// Model used when an agent file does not name one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_model: Option<String>,

    /// Close tasks (and cascade to parents) after successful agent runs.
    #[serde(default = "default_true")]
    pub auto_complete: bool,

    /// Resume in-progress tasks ahead of ready ones.
    #[serde(default)]
    pub resume: bool,

    /// Upper bound on dispatched tasks per run.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_iterations: Option<u32>,

    /// Append run events to `.claude/orchestrator/events.ndjson`.
    #[serde(default = "default_true")]
    pub event_log: bool,

    /// Override for the task prompt template.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prompt_template: Option<String>,

    /// Unknown fields preserved for forward compatibility.
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_yaml::Value>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            tracker: TrackerSettings::default(),
            runner: RunnerSettings::default(),
            default_model: None,
            auto_complete: true,
            resume: false,
            max_iterations: None,
            event_log: true,
            prompt_template: None,
            extra: BTreeMap::new(),
        }
    }
}

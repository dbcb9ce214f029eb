//! Configuration sections and defaults for ralph.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// How to reach the tracker.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackerSettings {
    /// Tracker CLI invocation (shell-words parsed; no shell).
    #[serde(default = "default_tracker_command")]
    pub command: String,

    /// `--limit` passed to ready/in-progress listings.
    #[serde(default = "default_list_limit")]
    pub list_limit: u32,

    /// `--limit` passed to child listings.
    #[serde(default = "default_children_limit")]
    pub children_limit: u32,

    /// Unknown fields preserved for forward compatibility.
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_yaml::Value>,
}

impl Default for TrackerSettings {
    fn default() -> Self {
        Self {
            command: default_tracker_command(),
            list_limit: default_list_limit(),
            children_limit: default_children_limit(),
            extra: BTreeMap::new(),
        }
    }
}

/// How to launch agent processes.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RunnerSettings {
    /// Base agent CLI invocation; routing arguments and the task prompt are
    /// appended per dispatch.
    #[serde(default = "default_runner_command")]
    pub command: String,

    /// Capture agent stdout/stderr under `.claude/orchestrator/logs/`.
    #[serde(default = "default_true")]
    pub capture_logs: bool,

    /// Unknown fields preserved for forward compatibility.
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_yaml::Value>,
}

impl Default for RunnerSettings {
    fn default() -> Self {
        Self {
            command: default_runner_command(),
            capture_logs: true,
            extra: BTreeMap::new(),
        }
    }
}

pub(crate) fn default_tracker_command() -> String {
    "bd".to_string()
}
pub(crate) fn default_list_limit() -> u32 {
    50
}
pub(crate) fn default_children_limit() -> u32 {
    100
}
pub(crate) fn default_runner_command() -> String {
    "claude --print --output-format json --dangerously-skip-permissions".to_string()
}
pub(crate) fn default_true() -> bool {
    true
}

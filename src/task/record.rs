//! Raw tracker records.
//!
//! Field names follow the `bd --json` output. The list and show commands
//! disagree on a few spellings (`parent` vs `parent_id`, `issue_type` vs
//! `type`), so both are accepted.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};

/// One issue as reported by the tracker.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TaskRecord {
    #[serde(default)]
    pub id: String,

    #[serde(default)]
    pub title: Option<String>,

    #[serde(default)]
    pub description: Option<String>,

    #[serde(default)]
    pub acceptance: Option<String>,

    #[serde(default)]
    pub notes: Option<String>,

    #[serde(default)]
    pub status: Option<String>,

    #[serde(default)]
    pub labels: Option<Vec<String>>,

    #[serde(default)]
    pub issue_type: Option<String>,

    #[serde(default, rename = "type")]
    pub type_name: Option<String>,

    /// Parent as reported by `bd list`.
    #[serde(default)]
    pub parent: Option<String>,

    /// Parent as reported by `bd show`.
    #[serde(default)]
    pub parent_id: Option<String>,

    #[serde(default)]
    pub dependencies: Option<Vec<DependencyRef>>,

    /// Everything else the tracker reports.
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

/// A dependency entry: either a bare id or an edge object.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DependencyRef {
    Id(String),
    Edge {
        #[serde(default)]
        depends_on_id: Option<String>,
        #[serde(default)]
        id: Option<String>,
        #[serde(default, rename = "type")]
        edge_type: Option<String>,
        #[serde(default)]
        dependency_type: Option<String>,
    },
}

impl DependencyRef {
    /// The id of the task being depended on.
    pub fn target(&self) -> Option<&str> {
        match self {
            DependencyRef::Id(id) => Some(id.as_str()),
            DependencyRef::Edge {
                depends_on_id, id, ..
            } => depends_on_id.as_deref().or(id.as_deref()),
        }
    }

    /// Only `blocks` edges (or untyped ones) gate readiness. Parent-child and
    /// informational links do not.
    pub fn is_blocking(&self) -> bool {
        match self {
            DependencyRef::Id(_) => true,
            DependencyRef::Edge {
                edge_type,
                dependency_type,
                ..
            } => match edge_type.as_deref().or(dependency_type.as_deref()) {
                None => true,
                Some(kind) => kind == "blocks",
            },
        }
    }
}

impl TaskRecord {
    /// The parent reference, whichever spelling the tracker used.
    pub fn parent_ref(&self) -> Option<&str> {
        self.parent
            .as_deref()
            .or(self.parent_id.as_deref())
            .map(str::trim)
            .filter(|p| !p.is_empty())
    }

    /// Ids of blocking dependencies, never including the task itself.
    pub fn blocking_dependencies(&self) -> BTreeSet<String> {
        self.dependencies
            .iter()
            .flatten()
            .filter(|dep| dep.is_blocking())
            .filter_map(|dep| dep.target())
            .filter(|target| !target.is_empty() && *target != self.id)
            .map(str::to_string)
            .collect()
    }
}

/// Decode tracker JSON output into records.
///
/// The tracker prints either an array or a single object; empty output means
/// no records.
pub fn decode_records(json: &str) -> serde_json::Result<Vec<TaskRecord>> {
    let trimmed = json.trim();
    if trimmed.is_empty() {
        return Ok(Vec::new());
    }

    let value: Value = serde_json::from_str(trimmed)?;
    match value {
        Value::Null => Ok(Vec::new()),
        Value::Array(items) => items.into_iter().map(serde_json::from_value).collect(),
        other => Ok(vec![serde_json::from_value(other)?]),
    }
}

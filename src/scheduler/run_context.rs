//! Immutable per-run parameters.

use crate::error::{RalphError, Result};
use globset::{Glob, GlobMatcher};
use std::collections::BTreeSet;

/// Restricts a run to tasks carrying a matching label.
///
/// The pattern is a glob (`area:*`, `agent:{qa,sdet}`). A pattern without
/// glob metacharacters is also passed to the tracker so it can filter
/// server-side.
#[derive(Debug, Clone)]
pub struct LabelFilter {
    pattern: String,
    matcher: GlobMatcher,
}

impl LabelFilter {
    pub fn new(pattern: &str) -> Result<Self> {
        let pattern = pattern.trim();
        if pattern.is_empty() {
            return Err(RalphError::UserError(
                "label filter must not be empty".to_string(),
            ));
        }

        let matcher = Glob::new(pattern)
            .map_err(|e| {
                RalphError::UserError(format!(
                    "invalid label filter '{}': {}\n\
                     Fix: use a plain label or a glob like 'area:*'.",
                    pattern, e
                ))
            })?
            .compile_matcher();

        Ok(Self {
            pattern: pattern.to_string(),
            matcher,
        })
    }

    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    /// Whether any label in the set matches.
    pub fn matches(&self, labels: &BTreeSet<String>) -> bool {
        labels.iter().any(|l| self.matcher.is_match(l))
    }

    /// The label to hand to the tracker, if the pattern is a literal.
    pub fn tracker_label(&self) -> Option<&str> {
        let is_literal = !self
            .pattern
            .chars()
            .any(|c| matches!(c, '*' | '?' | '[' | ']' | '{' | '}' | '\\'));
        is_literal.then_some(self.pattern.as_str())
    }
}

/// Parameters for one orchestration run. Built once from config and flags.
#[derive(Debug, Clone, Default)]
pub struct RunContext {
    /// Upper bound on processed tasks; `None` is unbounded.
    pub max_iterations: Option<u32>,
    pub label_filter: Option<LabelFilter>,
    pub dry_run: bool,
    /// Replaces the resolved agent's model for every dispatch.
    pub model_override: Option<String>,
    pub auto_complete: bool,
    /// Schedule in-progress tasks ahead of ready ones.
    pub resume: bool,
    /// Stop after one processed task.
    pub single: bool,
}

impl RunContext {
    /// The effective iteration bound.
    pub fn iteration_limit(&self) -> Option<u32> {
        if self.single {
            Some(1)
        } else {
            self.max_iterations
        }
    }

    /// Label passed to tracker queries.
    pub fn tracker_label(&self) -> Option<&str> {
        self.label_filter.as_ref().and_then(LabelFilter::tracker_label)
    }

    /// Whether a task's labels pass the filter. No filter passes everything.
    pub fn admits(&self, labels: &BTreeSet<String>) -> bool {
        self.label_filter
            .as_ref()
            .is_none_or(|filter| filter.matches(labels))
    }
}

//! Task prompt rendering.

use super::template::{TemplateError, check_template, render_template};
use crate::task::Task;
use std::collections::HashMap;

/// Placeholders available to task prompt templates.
pub const TASK_PLACEHOLDERS: &[&str] = &[
    "task_id",
    "title",
    "description",
    "acceptance",
    "notes",
    "labels",
    "depth",
    "kind",
    "parent_id",
    "tracker",
];

/// Tracker command named in prompts unless configured otherwise.
const DEFAULT_TRACKER_COMMAND: &str = "bd";

/// Prompt sent to the agent when no custom template is configured.
pub const DEFAULT_TASK_TEMPLATE: &str = r#"## Task: {title}
**Task ID:** {task_id}
**Kind:** {kind} (depth {depth})
**Labels:** {labels}

## Description
{description}

## Acceptance Criteria
{acceptance}

## Previous Progress Notes
{notes}

## Instructions
1. Read any design documents referenced in the description
2. Implement the requirements as specified
3. Make sure every acceptance criterion is met
4. Run the relevant tests to verify your work

## Progress Tracking
Record progress notes as you go so that a fresh agent can pick up where you
left off if this session ends early:

```bash
{tracker} update {task_id} --notes "Progress: <what is done and what remains>"
```

Record a note after each major step, before long-running builds or test
suites, and whenever you hit a blocker or make a key decision. Include the
files you changed, the tests you wrote and their status, and what remains.

## Finishing
When the work is complete, close the task yourself:

```bash
{tracker} update {task_id} --status closed
```

If you cannot finish, mark it blocked and explain why in the notes:

```bash
{tracker} update {task_id} --status blocked --notes "Blocked: <reason>"
```

Begin working on this task now.
"#;

/// Check a custom task template against the known placeholders.
pub fn check_task_template(template: &str) -> Result<(), TemplateError> {
    check_template(template, TASK_PLACEHOLDERS)
}

/// Renders the prompt handed to an agent for a task.
#[derive(Debug, Clone)]
pub struct TaskPrompt {
    template: String,
    /// Tracker CLI the agent is told to use for notes and status.
    tracker_command: String,
}

impl TaskPrompt {
    /// Use `template`, or the default when `None`.
    pub fn new(template: Option<&str>) -> Self {
        Self {
            template: template.unwrap_or(DEFAULT_TASK_TEMPLATE).to_string(),
            tracker_command: DEFAULT_TRACKER_COMMAND.to_string(),
        }
    }

    /// Name `command` as the tracker CLI in rendered prompts.
    pub fn with_tracker_command(mut self, command: &str) -> Self {
        let command = command.trim();
        if !command.is_empty() {
            self.tracker_command = command.to_string();
        }
        self
    }

    pub fn render(&self, task: &Task) -> Result<String, TemplateError> {
        let mut vars = task_vars(task);
        vars.insert("tracker".to_string(), self.tracker_command.clone());
        render_template(&self.template, &vars)
    }
}

impl Default for TaskPrompt {
    fn default() -> Self {
        Self::new(None)
    }
}

fn or_placeholder(value: &str, placeholder: &str) -> String {
    if value.trim().is_empty() {
        placeholder.to_string()
    } else {
        value.trim().to_string()
    }
}

fn task_vars(task: &Task) -> HashMap<String, String> {
    let labels = task.labels.iter().cloned().collect::<Vec<_>>().join(", ");

    HashMap::from([
        ("task_id".to_string(), task.id.clone()),
        ("title".to_string(), task.title.clone()),
        (
            "description".to_string(),
            or_placeholder(&task.description, "(No description provided)"),
        ),
        (
            "acceptance".to_string(),
            or_placeholder(&task.acceptance, "(No acceptance criteria provided)"),
        ),
        ("notes".to_string(), or_placeholder(&task.notes, "(none)")),
        ("labels".to_string(), or_placeholder(&labels, "(none)")),
        ("depth".to_string(), task.depth.to_string()),
        ("kind".to_string(), task.kind.to_string()),
        (
            "parent_id".to_string(),
            task.parent_id.clone().unwrap_or_default(),
        ),
    ])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::task::{TaskKind, TaskStatus};
    use std::collections::BTreeSet;

    fn sample_task() -> Task {
        Task {
            id: "fb-ft0.1.2".to_string(),
            title: "Add login form".to_string(),
            kind: TaskKind::Subtask,
            parent_id: Some("fb-ft0.1".to_string()),
            depth: 2,
            labels: BTreeSet::from(["agent:frontend".to_string(), "ui".to_string()]),
            dependency_ids: BTreeSet::new(),
            status: TaskStatus::Open,
            notes: String::new(),
            description: "Build the form described in docs/login.md".to_string(),
            acceptance: "- form validates email".to_string(),
        }
    }

    #[test]
    fn test_default_template_renders() {
        let prompt = TaskPrompt::default().render(&sample_task()).unwrap();

        assert!(prompt.starts_with("## Task: Add login form\n**Task ID:** fb-ft0.1.2"));
        assert!(prompt.contains("**Kind:** subtask (depth 2)"));
        assert!(prompt.contains("**Labels:** agent:frontend, ui"));
        assert!(prompt.contains("Build the form described in docs/login.md"));
        assert!(prompt.contains("- form validates email"));
        assert!(prompt.contains("## Previous Progress Notes\n(none)"));
        assert!(prompt.contains("bd update fb-ft0.1.2 --notes"));
        assert!(prompt.contains("bd update fb-ft0.1.2 --status closed"));
    }

    #[test]
    fn test_configured_tracker_command_is_named() {
        let prompt = TaskPrompt::default()
            .with_tracker_command("beads --db .beads/work.db")
            .render(&sample_task())
            .unwrap();

        assert!(prompt.contains("beads --db .beads/work.db update fb-ft0.1.2 --status closed"));
        assert!(!prompt.contains("bd update"));
    }

    #[test]
    fn test_empty_fields_get_placeholders() {
        let mut task = sample_task();
        task.description = "   ".to_string();
        task.acceptance.clear();
        task.labels.clear();

        let prompt = TaskPrompt::default().render(&task).unwrap();
        assert!(prompt.contains("(No description provided)"));
        assert!(prompt.contains("(No acceptance criteria provided)"));
        assert!(prompt.contains("**Labels:** (none)"));
    }

    #[test]
    fn test_previous_notes_are_included() {
        let mut task = sample_task();
        task.notes = "Progress: form markup done".to_string();

        let prompt = TaskPrompt::default().render(&task).unwrap();
        assert!(prompt.contains("## Previous Progress Notes\nProgress: form markup done"));
    }

    #[test]
    fn test_custom_template() {
        let prompt = TaskPrompt::new(Some("{kind} {task_id} under {parent_id}: {title}"))
            .render(&sample_task())
            .unwrap();
        assert_eq!(prompt, "subtask fb-ft0.1.2 under fb-ft0.1: Add login form");
    }

    #[test]
    fn test_check_task_template() {
        assert!(check_task_template(DEFAULT_TASK_TEMPLATE).is_ok());
        assert!(check_task_template("{task_id} {depth}").is_ok());
        assert!(check_task_template("{tracker} show {task_id}").is_ok());

        let err = check_task_template("{task_id} {priority}").unwrap_err();
        assert!(err.to_string().contains("priority"));
    }
}

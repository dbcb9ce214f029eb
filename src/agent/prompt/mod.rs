//! Prompt generation for agent runs.
//!
//! - **Template**: `{variable}` substitution engine
//! - **Task**: the task prompt and its placeholders
//!
//! Use `{{` and `}}` to render literal braces.

mod task;
mod template;

pub use task::{TaskPrompt, check_task_template};
pub use template::TemplateError;

//! Config loading, validation, and serialization.

use super::model::Config;
use crate::agent::prompt::check_task_template;
use crate::error::{RalphError, Result};
use std::path::Path;

impl Config {
    /// Load config from a YAML file.
    ///
    /// A missing file yields the defaults; the file is optional.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| {
            RalphError::ConfigInvalid(format!(
                "failed to read config file '{}': {}",
                path.display(),
                e
            ))
        })?;

        Self::from_yaml(&content)
    }

    /// Parse config from a YAML string.
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }

        let config: Config = serde_yaml::from_str(yaml).map_err(|e| {
            RalphError::ConfigInvalid(format!("failed to parse orchestrator.yaml: {}", e))
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Serialize config to YAML string.
    pub fn to_yaml(&self) -> Result<String> {
        serde_yaml::to_string(self)
            .map_err(|e| RalphError::ConfigInvalid(format!("failed to serialize config: {}", e)))
    }

    /// Validate config values.
    ///
    /// - list limits must be positive
    /// - tracker and runner commands must parse to at least one word
    /// - `max_iterations`, when set, must be positive
    /// - a custom prompt template may only use known placeholders
    pub fn validate(&self) -> Result<()> {
        if self.tracker.list_limit == 0 || self.tracker.children_limit == 0 {
            return Err(RalphError::ConfigInvalid(
                "orchestrator.yaml validation failed: tracker limits must be greater than 0"
                    .to_string(),
            ));
        }

        for (key, command) in [
            ("tracker.command", &self.tracker.command),
            ("runner.command", &self.runner.command),
        ] {
            let words = shell_words::split(command).map_err(|e| {
                RalphError::ConfigInvalid(format!(
                    "orchestrator.yaml validation failed: {} '{}' cannot be parsed: {}",
                    key, command, e
                ))
            })?;
            if words.is_empty() {
                return Err(RalphError::ConfigInvalid(format!(
                    "orchestrator.yaml validation failed: {} must not be empty",
                    key
                )));
            }
        }

        if self.max_iterations == Some(0) {
            return Err(RalphError::ConfigInvalid(
                "orchestrator.yaml validation failed: max_iterations must be greater than 0"
                    .to_string(),
            ));
        }

        if let Some(template) = &self.prompt_template {
            check_task_template(template).map_err(|e| {
                RalphError::ConfigInvalid(format!(
                    "orchestrator.yaml validation failed: prompt_template: {}",
                    e
                ))
            })?;
        }

        Ok(())
    }
}

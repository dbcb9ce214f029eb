//! `bd` (beads) command runner.
//!
//! Wraps the beads CLI with captured stdout/stderr and maps failures onto the
//! tracker error contract. All output is requested as JSON.

use super::Tracker;
use crate::config::TrackerSettings;
use crate::error::{RalphError, Result};
use crate::task::{TaskRecord, TaskStatus, decode_records};
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use tracing::debug;

/// Stderr fragments the beads CLI uses for unknown ids.
const NOT_FOUND_MARKERS: &[&str] = &["not found", "no issue", "does not exist"];

/// Captured output of one `bd` invocation.
#[derive(Debug, Clone)]
struct BdOutput {
    success: bool,
    exit_code: i32,
    stdout: String,
    stderr: String,
}

impl BdOutput {
    fn from_output(output: &Output) -> Self {
        Self {
            success: output.status.success(),
            exit_code: output.status.code().unwrap_or(-1),
            stdout: String::from_utf8_lossy(&output.stdout).trim().to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        }
    }

    fn error_text(&self) -> &str {
        if self.stderr.is_empty() {
            &self.stdout
        } else {
            &self.stderr
        }
    }
}

/// Tracker backed by the `bd` command line tool.
#[derive(Debug, Clone)]
pub struct BeadsTracker {
    program: String,
    base_args: Vec<String>,
    list_limit: u32,
    children_limit: u32,
    cwd: PathBuf,
}

impl BeadsTracker {
    /// Build a tracker client from settings, running commands in `cwd`.
    pub fn new(settings: &TrackerSettings, cwd: &Path) -> Result<Self> {
        let mut words = shell_words::split(&settings.command).map_err(|e| {
            RalphError::ConfigInvalid(format!(
                "failed to parse tracker command '{}': {}",
                settings.command, e
            ))
        })?;
        if words.is_empty() {
            return Err(RalphError::ConfigInvalid(
                "tracker command is empty".to_string(),
            ));
        }
        let program = words.remove(0);

        Ok(Self {
            program,
            base_args: words,
            list_limit: settings.list_limit,
            children_limit: settings.children_limit,
            cwd: cwd.to_path_buf(),
        })
    }

    fn run(&self, args: &[&str]) -> Result<BdOutput> {
        debug!(program = %self.program, ?args, "tracker command");

        let output = Command::new(&self.program)
            .current_dir(&self.cwd)
            .args(&self.base_args)
            .args(args)
            .output()
            .map_err(|e| {
                RalphError::TrackerUnavailable(format!(
                    "failed to execute {} {}: {}\n\
                     Fix: ensure the tracker CLI is installed and in PATH.",
                    self.program,
                    args.first().unwrap_or(&""),
                    e
                ))
            })?;

        Ok(BdOutput::from_output(&output))
    }

    /// Run a command that must succeed and decode its JSON output.
    fn query(&self, args: &[&str]) -> Result<Vec<TaskRecord>> {
        let output = self.run(args)?;
        if !output.success {
            return Err(RalphError::TrackerUnavailable(format!(
                "{} {} failed (exit code {}): {}",
                self.program,
                args.first().unwrap_or(&""),
                output.exit_code,
                output.error_text()
            )));
        }
        decode(&self.program, args, &output.stdout)
    }

    fn list_with_label(&self, mut args: Vec<String>, label: Option<&str>) -> Result<Vec<TaskRecord>> {
        if let Some(label) = label {
            args.push("--label".to_string());
            args.push(label.to_string());
        }
        let refs: Vec<&str> = args.iter().map(String::as_str).collect();
        self.query(&refs)
    }
}

fn decode(program: &str, args: &[&str], stdout: &str) -> Result<Vec<TaskRecord>> {
    decode_records(stdout).map_err(|e| {
        RalphError::TrackerUnavailable(format!(
            "failed to parse {} {} output as JSON: {}",
            program,
            args.first().unwrap_or(&""),
            e
        ))
    })
}

impl Tracker for BeadsTracker {
    fn list_ready(&self, label: Option<&str>) -> Result<Vec<TaskRecord>> {
        let args = vec![
            "ready".to_string(),
            "--json".to_string(),
            "--limit".to_string(),
            self.list_limit.to_string(),
        ];
        self.list_with_label(args, label)
    }

    fn list_in_progress(&self, label: Option<&str>) -> Result<Vec<TaskRecord>> {
        let args = vec![
            "list".to_string(),
            "--status".to_string(),
            "in_progress".to_string(),
            "--json".to_string(),
            "--limit".to_string(),
            self.list_limit.to_string(),
        ];
        self.list_with_label(args, label)
    }

    fn get(&self, id: &str) -> Result<TaskRecord> {
        let args = ["show", id, "--json"];
        let output = self.run(&args)?;

        if !output.success {
            let text = output.error_text().to_lowercase();
            if NOT_FOUND_MARKERS.iter().any(|m| text.contains(m)) {
                return Err(RalphError::TaskNotFound(id.to_string()));
            }
            return Err(RalphError::TrackerUnavailable(format!(
                "{} show {} failed (exit code {}): {}",
                self.program,
                id,
                output.exit_code,
                output.error_text()
            )));
        }

        decode(&self.program, &args, &output.stdout)?
            .into_iter()
            .find(|record| record.id == id)
            .ok_or_else(|| RalphError::TaskNotFound(id.to_string()))
    }

    fn set_status(&self, id: &str, status: TaskStatus, notes: Option<&str>) -> Result<()> {
        let mut args = vec!["update", id, "--status", status.as_tracker_str()];
        if let Some(notes) = notes {
            args.push("--notes");
            args.push(notes);
        }

        let output = self.run(&args)?;
        if !output.success {
            return Err(RalphError::TrackerUnavailable(format!(
                "{} update {} --status {} failed (exit code {}): {}",
                self.program,
                id,
                status.as_tracker_str(),
                output.exit_code,
                output.error_text()
            )));
        }
        Ok(())
    }

    fn list_children(&self, id: &str) -> Result<Vec<TaskRecord>> {
        let limit = self.children_limit.to_string();
        self.query(&["list", "--parent", id, "--all", "--json", "--limit", limit.as_str()])
    }
}

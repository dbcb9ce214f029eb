//! Agent runner backed by a CLI command (Claude Code by default).
//!
//! The invocation is assembled as:
//!
//! ```text
//! <runner.command...> (--agent <name> | --append-system-prompt <prompt>)
//!     [--model <model>] [--allowedTools <a,b,...>] <task prompt>
//! ```
//!
//! `--agent` is used when the identity has a configuration file, since the
//! agent CLI reads the same `.claude/agents/` directory. Identities without a
//! file get their built-in role prompt inline.

use super::{AgentInvocation, AgentRunner, RunnerExit};
use crate::agent::config::AgentSource;
use crate::config::RunnerSettings;
use crate::context::ProjectContext;
use crate::error::{RalphError, Result};
use std::fs::File;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::time::Instant;

/// Environment variable carrying the task id into the agent process.
pub const TASK_ID_ENV: &str = "RALPH_TASK_ID";

#[derive(Debug, Clone)]
pub struct CommandRunner {
    base: Vec<String>,
    project: ProjectContext,
    capture_logs: bool,
}

impl CommandRunner {
    pub fn new(settings: &RunnerSettings, project: &ProjectContext) -> Result<Self> {
        let base = shell_words::split(&settings.command).map_err(|e| {
            RalphError::ConfigInvalid(format!(
                "failed to parse runner command '{}': {}\n\
                 Fix: check for unmatched quotes or invalid escape sequences.",
                settings.command, e
            ))
        })?;

        if base.is_empty() {
            return Err(RalphError::ConfigInvalid(
                "runner command is empty".to_string(),
            ));
        }

        Ok(Self {
            base,
            project: project.clone(),
            capture_logs: settings.capture_logs,
        })
    }

    /// Arguments after the program name.
    pub fn build_args(&self, invocation: &AgentInvocation<'_>) -> Vec<String> {
        let agent = invocation.agent;
        let mut args: Vec<String> = self.base[1..].to_vec();

        match &agent.source {
            AgentSource::File(_) => {
                args.push("--agent".to_string());
                args.push(agent.name.clone());
            }
            AgentSource::BuiltIn => {
                args.push("--append-system-prompt".to_string());
                args.push(agent.prompt_body.clone());
            }
        }

        if let Some(model) = &agent.model {
            args.push("--model".to_string());
            args.push(model.clone());
        }

        if !agent.capabilities.is_empty() {
            args.push("--allowedTools".to_string());
            args.push(agent.capabilities.join(","));
        }

        args.push(invocation.prompt.to_string());
        args
    }

    fn open_logs(&self, task_id: &str) -> Result<(PathBuf, File, PathBuf, File)> {
        let dir = self.project.task_logs_dir(task_id);
        std::fs::create_dir_all(&dir).map_err(|e| {
            RalphError::AgentLaunch(format!(
                "failed to create agent logs directory '{}': {}",
                dir.display(),
                e
            ))
        })?;

        let create = |path: PathBuf| -> Result<(PathBuf, File)> {
            let file = File::create(&path).map_err(|e| {
                RalphError::AgentLaunch(format!(
                    "failed to create log file '{}': {}",
                    path.display(),
                    e
                ))
            })?;
            Ok((path, file))
        };

        let (stdout_path, stdout) = create(dir.join("stdout.log"))?;
        let (stderr_path, stderr) = create(dir.join("stderr.log"))?;
        Ok((stdout_path, stdout, stderr_path, stderr))
    }
}

impl AgentRunner for CommandRunner {
    fn run(&self, invocation: &AgentInvocation<'_>) -> Result<RunnerExit> {
        let program = &self.base[0];
        let args = self.build_args(invocation);

        let mut command = Command::new(program);
        command
            .args(&args)
            .current_dir(&self.project.project_root)
            .env(TASK_ID_ENV, invocation.task_id)
            .stdin(Stdio::null());

        let (stdout_log, stderr_log) = if self.capture_logs {
            let (stdout_path, stdout, stderr_path, stderr) = self.open_logs(invocation.task_id)?;
            command
                .stdout(Stdio::from(stdout))
                .stderr(Stdio::from(stderr));
            (Some(stdout_path), Some(stderr_path))
        } else {
            (None, None)
        };

        tracing::info!(
            task = invocation.task_id,
            agent = %invocation.agent.identity,
            program = %program,
            "launching agent"
        );

        let start = Instant::now();
        let mut child = command.spawn().map_err(|e| {
            RalphError::AgentLaunch(format!(
                "failed to execute agent command '{}': {}\n\
                 Fix: ensure the command is installed and in PATH.",
                program, e
            ))
        })?;

        let status = child.wait().map_err(|e| {
            RalphError::AgentLaunch(format!("failed to wait for agent process: {}", e))
        })?;
        let duration = start.elapsed();

        let session_id = stdout_log.as_deref().and_then(read_session_id);

        tracing::info!(
            task = invocation.task_id,
            exit_code = ?status.code(),
            elapsed_ms = duration.as_millis() as u64,
            "agent exited"
        );

        Ok(RunnerExit {
            exit_code: status.code(),
            session_id,
            stdout_log,
            stderr_log,
            duration,
        })
    }
}

/// Pull `session_id` out of a JSON result printed by the agent CLI.
fn read_session_id(stdout_log: &Path) -> Option<String> {
    let content = std::fs::read_to_string(stdout_log).ok()?;
    let value: serde_json::Value = serde_json::from_str(content.trim()).ok()?;
    value
        .get("session_id")
        .and_then(|v| v.as_str())
        .map(str::to_string)
}

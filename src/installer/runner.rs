// ABOUTME: Child process execution behind an injectable runner interface
// ABOUTME: Runs packaging scripts with an explicit environment map and captures their output

use async_trait::async_trait;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::process::Command;
use tracing::debug;

use super::error::RunnerError;

/// A single child process invocation.
///
/// Environment entries are added to the inherited environment of the child
/// only; the installer's own environment is never modified.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Invocation {
    pub program: String,
    pub args: Vec<String>,
    pub env: BTreeMap<String, String>,
    pub working_dir: Option<PathBuf>,
}

impl Invocation {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            ..Default::default()
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.insert(key.into(), value.into());
        self
    }

    pub fn current_dir(mut self, dir: &Path) -> Self {
        self.working_dir = Some(dir.to_path_buf());
        self
    }

    pub fn display(&self) -> String {
        if self.args.is_empty() {
            self.program.clone()
        } else {
            format!("{} {}", self.program, self.args.join(" "))
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProcessOutput {
    pub exit_code: i32,
    pub stdout: String,
    pub stderr: String,
}

impl ProcessOutput {
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }
}

#[async_trait]
pub trait ProcessRunner: Send + Sync {
    /// Run the invocation to completion. A non-zero exit is reported through
    /// `ProcessOutput`, not as an error.
    async fn run(&self, invocation: &Invocation) -> Result<ProcessOutput, RunnerError>;
}

/// Runs invocations as real child processes
#[derive(Debug, Clone, Default)]
pub struct SystemProcessRunner;

#[async_trait]
impl ProcessRunner for SystemProcessRunner {
    async fn run(&self, invocation: &Invocation) -> Result<ProcessOutput, RunnerError> {
        let mut cmd = Command::new(&invocation.program);
        cmd.args(&invocation.args);

        for (key, value) in &invocation.env {
            cmd.env(key, value);
        }

        if let Some(ref working_dir) = invocation.working_dir {
            cmd.current_dir(working_dir);
        }

        cmd.stdin(Stdio::null());
        cmd.stdout(Stdio::piped());
        cmd.stderr(Stdio::piped());

        debug!("Running: {} (cwd: {:?})", invocation.display(), invocation.working_dir);

        let output = cmd.output().await.map_err(|e| RunnerError::Spawn {
            program: invocation.program.clone(),
            source: e,
        })?;

        // Killed by a signal: no exit code
        let exit_code = output.status.code().unwrap_or(-1);
        debug!("{} exited with code {}", invocation.display(), exit_code);

        Ok(ProcessOutput {
            exit_code,
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
        })
    }
}

//! Subprocess execution utilities.
//!
//! Builds run as a single child process whose output is passed straight
//! through to ours. The child is wrapped in a [`ProcessTask`] so a caller can
//! hand out a [`CancelToken`] and stop it from elsewhere.
//!
//! Spawning and waiting go through `tokio::process` and must happen inside a
//! tokio runtime.

use std::collections::BTreeMap;
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::process::{ExitStatus, Stdio};
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::process::{Child, Command};
use tokio::sync::watch;

/// Builder for subprocess execution.
#[derive(Debug, Clone)]
pub struct ProcessBuilder {
    program: PathBuf,
    args: Vec<String>,
    env: BTreeMap<String, String>,
    cwd: Option<PathBuf>,
}

impl ProcessBuilder {
    /// Create a new process builder for the given program.
    pub fn new(program: impl AsRef<Path>) -> Self {
        ProcessBuilder {
            program: program.as_ref().to_path_buf(),
            args: Vec::new(),
            env: BTreeMap::new(),
            cwd: None,
        }
    }

    /// Add a single argument.
    pub fn arg(mut self, arg: impl AsRef<OsStr>) -> Self {
        self.args.push(arg.as_ref().to_string_lossy().into_owned());
        self
    }

    /// Add multiple arguments.
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        self.args.extend(
            args.into_iter()
                .map(|s| s.as_ref().to_string_lossy().into_owned()),
        );
        self
    }

    /// Set an environment variable.
    pub fn env(mut self, key: impl AsRef<str>, value: impl AsRef<str>) -> Self {
        self.env
            .insert(key.as_ref().to_string(), value.as_ref().to_string());
        self
    }

    /// Set the working directory.
    pub fn cwd(mut self, cwd: impl AsRef<Path>) -> Self {
        self.cwd = Some(cwd.as_ref().to_path_buf());
        self
    }

    fn build_command(&self) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args);

        for (key, value) in &self.env {
            cmd.env(key, value);
        }

        if let Some(ref cwd) = self.cwd {
            cmd.current_dir(cwd);
        }

        cmd
    }

    /// Spawn the process with stdin closed and stdout/stderr inherited.
    pub fn spawn_task(&self) -> Result<ProcessTask> {
        let mut cmd = self.build_command();
        cmd.stdin(Stdio::null())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .kill_on_drop(true);

        let child = cmd
            .spawn()
            .with_context(|| format!("failed to spawn `{}`", self.program.display()))?;

        Ok(ProcessTask {
            child,
            display: self.display_command(),
            cancel: CancelToken::new(),
        })
    }

    /// Display the command for log and error messages.
    pub fn display_command(&self) -> String {
        let mut parts = vec![self.program.display().to_string()];
        parts.extend(self.args.iter().cloned());
        parts.join(" ")
    }
}

/// Shared flag used to stop a running [`ProcessTask`].
#[derive(Debug, Clone)]
pub struct CancelToken(Arc<watch::Sender<bool>>);

impl CancelToken {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(false);
        CancelToken(Arc::new(tx))
    }

    /// Request cancellation. Safe to call from any thread.
    pub fn cancel(&self) {
        self.0.send_replace(true);
    }

    pub fn is_cancelled(&self) -> bool {
        *self.0.borrow()
    }

    /// Resolves once [`CancelToken::cancel`] has been called.
    pub async fn cancelled(&self) {
        let mut rx = self.0.subscribe();
        // The sender lives as long as `self`, so this only errors if it
        // cannot ever be cancelled.
        if rx.wait_for(|cancelled| *cancelled).await.is_err() {
            std::future::pending::<()>().await;
        }
    }
}

impl Default for CancelToken {
    fn default() -> Self {
        CancelToken::new()
    }
}

/// How a task ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskExit {
    /// The child exited on its own.
    Exited(ExitStatus),
    /// The child was killed through its cancel token.
    Cancelled,
}

/// A spawned child process that can be waited on or cancelled.
#[derive(Debug)]
pub struct ProcessTask {
    child: Child,
    display: String,
    cancel: CancelToken,
}

impl ProcessTask {
    /// Replace this task's cancel token with a shared one.
    pub fn with_cancel_token(mut self, cancel: CancelToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Wait until the child exits or the task is cancelled.
    pub async fn wait(mut self) -> Result<TaskExit> {
        let command = self.display.clone();

        tokio::select! {
            status = self.child.wait() => {
                let status = status.with_context(|| format!("failed to wait for `{}`", command))?;
                return Ok(TaskExit::Exited(status));
            }
            _ = self.cancel.cancelled() => {}
        }

        tracing::debug!("cancelling `{}`", command);
        // Fails only if the child already exited; it is reaped either way.
        if let Err(e) = self.child.kill().await {
            tracing::debug!("failed to kill `{}`: {}", command, e);
        }
        Ok(TaskExit::Cancelled)
    }
}

/// Find an executable in PATH.
pub fn find_executable(name: &str) -> Option<PathBuf> {
    which::which(name).ok()
}

//! Build execution.
//!
//! Runs a [`BuildPlan`] to completion on the calling thread and reduces the
//! result to a [`BuildOutcome`]. Nothing here decides what a failure means
//! for the pipeline; callers inspect [`BuildOutcome::is_failure`].

use std::fmt;
use std::process::ExitStatus;
use std::time::Instant;

use serde::Serialize;

use crate::builder::local::bundle_binaries;
use crate::builder::plan::{BuildInvocation, BuildPlan, LocalBuild};
use crate::util::process::{CancelToken, ProcessBuilder, TaskExit};

/// Spawn error reported for a build stopped through its cancel token.
const CANCELLED: &str = "build cancelled";

/// How a build ended.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildOutcome {
    /// Exit code, when the child exited normally
    pub exit_status: Option<i32>,
    /// Why the child could not run to completion
    pub spawn_error: Option<String>,
}

impl BuildOutcome {
    /// A clean exit.
    pub fn success() -> Self {
        BuildOutcome::exited(0)
    }

    /// The child exited with `code`.
    pub fn exited(code: i32) -> Self {
        BuildOutcome {
            exit_status: Some(code),
            spawn_error: None,
        }
    }

    /// The child never ran, or stopped without an exit code.
    pub fn spawn_failed(error: impl Into<String>) -> Self {
        BuildOutcome {
            exit_status: None,
            spawn_error: Some(error.into()),
        }
    }

    fn from_exit_status(status: ExitStatus) -> Self {
        match status.code() {
            Some(code) => BuildOutcome::exited(code),
            None => BuildOutcome::spawn_failed(format!("terminated by signal ({})", status)),
        }
    }

    /// A spawn error or a nonzero exit status.
    ///
    /// Negative codes count too: Windows reports NTSTATUS crashes such as
    /// `0xC0000005` as negative `i32` values.
    pub fn is_failure(&self) -> bool {
        self.spawn_error.is_some() || self.exit_status.is_some_and(|code| code != 0)
    }
}

impl fmt::Display for BuildOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.spawn_error, self.exit_status) {
            (Some(err), Some(code)) => write!(f, "{} (exit status {})", err, code),
            (Some(err), None) => write!(f, "{}", err),
            (None, Some(code)) => write!(f, "exit status {}", code),
            (None, None) => write!(f, "no exit status"),
        }
    }
}

/// Something that can run a build plan.
pub trait BuildRunner {
    /// Run the plan and block until it finishes.
    fn run(&mut self, plan: &BuildPlan) -> BuildOutcome;
}

/// Runs plans as real subprocesses.
#[derive(Debug, Default)]
pub struct SystemRunner {
    cancel: CancelToken,
}

impl SystemRunner {
    pub fn new() -> Self {
        SystemRunner {
            cancel: CancelToken::new(),
        }
    }

    /// Token that stops the running build.
    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    /// Run one process to completion on a current-thread runtime.
    fn spawn(&self, process: ProcessBuilder) -> BuildOutcome {
        if self.cancel.is_cancelled() {
            return BuildOutcome::spawn_failed(CANCELLED);
        }

        tracing::debug!("running `{}`", process.display_command());

        let runtime = match tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
        {
            Ok(runtime) => runtime,
            Err(e) => {
                return BuildOutcome::spawn_failed(format!("failed to start build runtime: {}", e))
            }
        };

        runtime.block_on(async {
            let task = match process.spawn_task() {
                Ok(task) => task.with_cancel_token(self.cancel.clone()),
                Err(e) => return BuildOutcome::spawn_failed(format!("{:#}", e)),
            };

            match task.wait().await {
                Ok(TaskExit::Exited(status)) => BuildOutcome::from_exit_status(status),
                Ok(TaskExit::Cancelled) => BuildOutcome::spawn_failed(CANCELLED),
                Err(e) => BuildOutcome::spawn_failed(format!("{:#}", e)),
            }
        })
    }

    fn run_docker(&self, invocation: &BuildInvocation) -> BuildOutcome {
        let process = ProcessBuilder::new(invocation.executable()).args(invocation.arguments());
        self.spawn(process)
    }

    fn run_local(&self, local: &LocalBuild) -> BuildOutcome {
        tracing::info!("Running local cargo build on {}", std::env::consts::OS);

        let invocation = &local.invocation;
        let mut process = ProcessBuilder::new(invocation.executable())
            .args(invocation.arguments())
            .cwd(&invocation.working_paths().source_path);
        for (key, value) in &local.env {
            process = process.env(key, value);
        }

        let outcome = self.spawn(process);
        if outcome.is_failure() {
            return outcome;
        }

        match bundle_binaries(&local.output_dir, &local.artifact_dir, &local.binaries) {
            Ok(_) => outcome,
            Err(e) => {
                tracing::error!("Error zipping artifact: {:#}", e);
                BuildOutcome {
                    exit_status: Some(1),
                    spawn_error: Some(format!("{:#}", e)),
                }
            }
        }
    }
}

impl BuildRunner for SystemRunner {
    fn run(&mut self, plan: &BuildPlan) -> BuildOutcome {
        let start = Instant::now();

        let outcome = match plan {
            BuildPlan::Docker(invocation) => self.run_docker(invocation),
            BuildPlan::Local(local) => self.run_local(local),
        };

        tracing::debug!(
            "build finished in {:.2}s: {}",
            start.elapsed().as_secs_f64(),
            outcome
        );
        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::plan::WorkingPaths;
    use std::collections::BTreeMap;
    use std::path::{Path, PathBuf};
    use std::time::Duration;
    use tempfile::TempDir;

    fn invocation(executable: &str, args: &[&str]) -> BuildPlan {
        BuildPlan::Docker(BuildInvocation::new(
            executable,
            args.iter().map(|a| a.to_string()).collect(),
            WorkingPaths {
                source_path: PathBuf::from("."),
                cargo_registry: PathBuf::from("registry"),
                cargo_downloads: PathBuf::from("git"),
            },
        ))
    }

    #[test]
    fn test_outcome_failure_rules() {
        assert!(!BuildOutcome::success().is_failure());
        assert!(BuildOutcome::exited(1).is_failure());
        assert!(BuildOutcome::exited(101).is_failure());
        assert!(BuildOutcome::spawn_failed("not found").is_failure());
        assert!(!BuildOutcome::default().is_failure());
    }

    #[test]
    fn test_outcome_display() {
        assert_eq!(BuildOutcome::exited(2).to_string(), "exit status 2");
        assert_eq!(BuildOutcome::spawn_failed("boom").to_string(), "boom");
    }

    #[test]
    fn test_missing_executable_is_spawn_error() {
        let outcome = SystemRunner::new().run(&invocation("sls-rust-no-such-docker", &[]));

        assert!(outcome.is_failure());
        assert!(outcome.exit_status.is_none());
        assert!(outcome.spawn_error.unwrap().contains("failed to spawn"));
    }

    #[cfg(unix)]
    #[test]
    fn test_exit_codes() {
        assert_eq!(
            SystemRunner::new().run(&invocation("true", &[])),
            BuildOutcome::success()
        );
        assert_eq!(
            SystemRunner::new().run(&invocation("sh", &["-c", "exit 3"])),
            BuildOutcome::exited(3)
        );
    }

    #[test]
    fn test_negative_exit_code_is_failure() {
        assert!(BuildOutcome::exited(-1073741819).is_failure());
    }

    #[test]
    fn test_cancelled_before_start_never_spawns() {
        let mut runner = SystemRunner::new();
        runner.cancel_token().cancel();

        // Spawning this would fail with a different error.
        let outcome = runner.run(&invocation("sls-rust-no-such-docker", &[]));
        assert_eq!(outcome.spawn_error.as_deref(), Some(CANCELLED));
    }

    #[cfg(unix)]
    #[test]
    fn test_cancel_stops_running_build() {
        let mut runner = SystemRunner::new();
        let token = runner.cancel_token();
        let canceller = std::thread::spawn(move || {
            std::thread::sleep(Duration::from_millis(100));
            token.cancel();
        });

        let start = Instant::now();
        let outcome = runner.run(&invocation("sleep", &["30"]));
        canceller.join().unwrap();

        assert_eq!(outcome.spawn_error.as_deref(), Some(CANCELLED));
        assert!(outcome.exit_status.is_none());
        assert!(start.elapsed() < Duration::from_secs(10));
    }

    fn local_build(source: &Path, executable: &str) -> BuildPlan {
        BuildPlan::Local(LocalBuild {
            invocation: BuildInvocation::new(
                executable,
                Vec::new(),
                WorkingPaths {
                    source_path: source.to_path_buf(),
                    cargo_registry: PathBuf::from("registry"),
                    cargo_downloads: PathBuf::from("git"),
                },
            ),
            env: BTreeMap::from([("TARGET_CC".to_string(), "cc".to_string())]),
            output_dir: source.join("target/release"),
            artifact_dir: source.join("target/lambda/release"),
            binaries: vec!["api".to_string()],
        })
    }

    #[cfg(unix)]
    #[test]
    fn test_local_build_bundles_binaries() {
        let tmp = TempDir::new().unwrap();
        let output_dir = tmp.path().join("target/release");
        std::fs::create_dir_all(&output_dir).unwrap();
        std::fs::write(output_dir.join("api"), b"\x7fELF binary").unwrap();

        let outcome = SystemRunner::new().run(&local_build(tmp.path(), "true"));

        assert_eq!(outcome, BuildOutcome::success());
        assert!(tmp.path().join("target/lambda/release/api.zip").is_file());
    }

    #[cfg(unix)]
    #[test]
    fn test_local_bundling_error_fails_with_status_one() {
        let tmp = TempDir::new().unwrap();

        let outcome = SystemRunner::new().run(&local_build(tmp.path(), "true"));

        assert!(outcome.is_failure());
        assert_eq!(outcome.exit_status, Some(1));
        assert!(outcome.spawn_error.unwrap().contains("failed to read file"));
        assert!(!tmp.path().join("target/lambda/release/api.zip").exists());
    }

    #[cfg(unix)]
    #[test]
    fn test_local_cargo_failure_skips_bundling() {
        let tmp = TempDir::new().unwrap();

        let outcome = SystemRunner::new().run(&local_build(tmp.path(), "false"));

        assert_eq!(outcome, BuildOutcome::exited(1));
        assert!(!tmp.path().join("target/lambda").exists());
    }
}

//! Subprocess runner implementation
//!
//! Executes untrusted submissions as short-lived child processes under a hard
//! wall-clock timeout. Each child is started in its own process group, so the
//! timeout kill also takes down anything the submission spawned and no orphans
//! survive the budget. `kill_on_drop` covers the cancellation path: if the
//! judging task is aborted mid-run, the child goes with it.

use std::process::Stdio;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use async_trait::async_trait;
use nix::sys::signal::{killpg, Signal};
use nix::unistd::Pid;
use tokio::process::Command;
use tokio::time::timeout;
use tracing::debug;

use super::{CommandSpec, RunLimits, RunOutcome, RunStatus, Runner};

/// Runner that executes commands as sandboxed child processes.
pub struct SubprocessRunner;

impl SubprocessRunner {
    pub fn new() -> Self {
        Self
    }

    pub async fn execute(&self, spec: &CommandSpec, limits: &RunLimits) -> Result<RunOutcome> {
        debug!(
            "spawning {} {:?} (time budget {}ms)",
            spec.program, spec.args, limits.time_ms
        );

        let mut cmd = Command::new(&spec.program);
        cmd.args(&spec.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .process_group(0);

        if let Some(dir) = &spec.work_dir {
            cmd.current_dir(dir);
        }

        if let Some(memory_mb) = limits.memory_mb {
            let bytes = memory_mb * 1024 * 1024;
            // Applied in the child between fork and exec.
            unsafe {
                cmd.pre_exec(move || {
                    nix::sys::resource::setrlimit(
                        nix::sys::resource::Resource::RLIMIT_AS,
                        bytes,
                        bytes,
                    )
                    .map_err(|e| std::io::Error::from_raw_os_error(e as i32))
                });
            }
        }

        let start = Instant::now();
        let child = cmd
            .spawn()
            .with_context(|| format!("failed to spawn {}", spec.program))?;
        let pid = child.id();

        match timeout(Duration::from_millis(limits.time_ms), child.wait_with_output()).await {
            Ok(output) => {
                let output = output.context("failed to collect child output")?;
                let duration_ms = start.elapsed().as_millis() as u64;

                let status = match output.status.code() {
                    Some(code) => RunStatus::Exited(code),
                    None => {
                        use std::os::unix::process::ExitStatusExt;
                        RunStatus::Signaled(output.status.signal().unwrap_or(-1))
                    }
                };

                Ok(RunOutcome {
                    status,
                    duration_ms,
                    stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
                    stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
                })
            }
            Err(_) => {
                // Budget expired: kill the whole process group. Dropping the
                // wait future already killed the direct child, but the
                // submission may have forked.
                if let Some(pid) = pid {
                    let _ = killpg(Pid::from_raw(pid as i32), Signal::SIGKILL);
                }
                debug!("{} killed after {}ms budget", spec.program, limits.time_ms);

                Ok(RunOutcome {
                    status: RunStatus::TimeLimitExceeded,
                    duration_ms: start.elapsed().as_millis() as u64,
                    stdout: String::new(),
                    stderr: String::new(),
                })
            }
        }
    }
}

impl Default for SubprocessRunner {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Runner for SubprocessRunner {
    async fn run(&self, cmd: &CommandSpec, limits: &RunLimits) -> Result<RunOutcome> {
        self.execute(cmd, limits).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sh(script: &str) -> CommandSpec {
        CommandSpec::new("sh").with_args(["-c", script])
    }

    #[tokio::test]
    async fn test_captures_stdout_on_clean_exit() {
        let runner = SubprocessRunner::new();
        let outcome = runner
            .execute(&sh("echo hello"), &RunLimits::default())
            .await
            .unwrap();
        assert_eq!(outcome.status, RunStatus::Exited(0));
        assert_eq!(outcome.stdout, "hello\n");
    }

    #[tokio::test]
    async fn test_reports_nonzero_exit_with_stderr() {
        let runner = SubprocessRunner::new();
        let outcome = runner
            .execute(&sh("echo oops >&2; exit 3"), &RunLimits::default())
            .await
            .unwrap();
        assert_eq!(outcome.status, RunStatus::Exited(3));
        assert_eq!(outcome.stderr, "oops\n");
    }

    #[tokio::test]
    async fn test_timeout_kills_within_budget() {
        let runner = SubprocessRunner::new();
        let start = Instant::now();
        let outcome = runner
            .execute(&sh("sleep 30"), &RunLimits::new(200, None))
            .await
            .unwrap();
        assert_eq!(outcome.status, RunStatus::TimeLimitExceeded);
        // Returned promptly, not after the sleep finished.
        assert!(start.elapsed() < Duration::from_secs(5));
    }

    #[tokio::test]
    async fn test_timeout_kills_grandchildren() {
        let runner = SubprocessRunner::new();
        // The shell forks a background sleep; the group kill must reach it.
        let outcome = runner
            .execute(&sh("sleep 30 & wait"), &RunLimits::new(200, None))
            .await
            .unwrap();
        assert_eq!(outcome.status, RunStatus::TimeLimitExceeded);
    }

    #[tokio::test]
    async fn test_missing_program_is_runner_error() {
        let runner = SubprocessRunner::new();
        let spec = CommandSpec::new("definitely-not-a-real-binary");
        assert!(runner.execute(&spec, &RunLimits::default()).await.is_err());
    }

    #[tokio::test]
    async fn test_runs_in_work_dir() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("marker.txt"), "here").unwrap();
        let runner = SubprocessRunner::new();
        let spec = sh("cat marker.txt").with_work_dir(dir.path());
        let outcome = runner.execute(&spec, &RunLimits::default()).await.unwrap();
        assert_eq!(outcome.stdout, "here");
    }
}

//! Runner module - Execution abstraction layer
//!
//! A runner executes one prepared command (interpreter + harnessed source)
//! and reports what the process did: exit status, captured output, wall-clock
//! time. It does NOT:
//! - Generate harnesses or decode result lines
//! - Compare outputs or determine verdicts
//! - Know which language it is running
//!
//! The orchestrator talks to the `Runner` trait so its grading logic can be
//! exercised against a scripted fake without spawning processes.

pub mod subprocess;

use std::path::PathBuf;

use anyhow::Result;
use async_trait::async_trait;

/// Command specification for execution
#[derive(Debug, Clone)]
pub struct CommandSpec {
    /// Program path or name
    pub program: String,
    /// Arguments to the program
    pub args: Vec<String>,
    /// Working directory (the submission's workspace)
    pub work_dir: Option<PathBuf>,
}

impl CommandSpec {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            work_dir: None,
        }
    }

    pub fn with_args(mut self, args: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.args = args.into_iter().map(|a| a.into()).collect();
        self
    }

    pub fn with_work_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.work_dir = Some(dir.into());
        self
    }

    /// Create from a command vector (first element is program, rest are args)
    pub fn from_vec(cmd: &[String]) -> Self {
        let mut iter = cmd.iter();
        let program = iter.next().cloned().unwrap_or_default();
        let args: Vec<String> = iter.cloned().collect();
        Self {
            program,
            args,
            work_dir: None,
        }
    }
}

/// Resource limits for one execution
#[derive(Debug, Clone)]
pub struct RunLimits {
    /// Wall-clock limit in milliseconds
    pub time_ms: u64,
    /// Address-space limit in MB (None = unlimited)
    pub memory_mb: Option<u64>,
}

impl RunLimits {
    pub fn new(time_ms: u64, memory_mb: Option<u64>) -> Self {
        Self { time_ms, memory_mb }
    }
}

impl Default for RunLimits {
    fn default() -> Self {
        Self {
            time_ms: 2000,
            memory_mb: None,
        }
    }
}

/// Raw execution status, with no verdict interpretation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunStatus {
    /// Process exited on its own with the given exit code
    Exited(i32),
    /// Wall-clock budget expired; the process group was killed
    TimeLimitExceeded,
    /// Killed by a signal it did not survive
    Signaled(i32),
}

impl RunStatus {
    pub fn is_success(&self) -> bool {
        matches!(self, RunStatus::Exited(0))
    }
}

/// Outcome of running a command
#[derive(Debug, Clone)]
pub struct RunOutcome {
    pub status: RunStatus,
    /// Wall-clock time in milliseconds
    pub duration_ms: u64,
    pub stdout: String,
    pub stderr: String,
}

impl RunOutcome {
    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }
}

/// Runner trait for executing prepared commands
#[async_trait]
pub trait Runner: Send + Sync {
    /// Run a command with the given limits. `Err` means the runner itself
    /// failed (e.g. the interpreter binary is missing), not that the
    /// submission misbehaved; submission misbehavior is a `RunOutcome`.
    async fn run(&self, cmd: &CommandSpec, limits: &RunLimits) -> Result<RunOutcome>;
}

// Re-exports
pub use subprocess::SubprocessRunner;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_spec_from_vec() {
        let cmd = CommandSpec::from_vec(&[
            "python3".to_string(),
            "main.py".to_string(),
        ]);
        assert_eq!(cmd.program, "python3");
        assert_eq!(cmd.args, vec!["main.py"]);
    }

    #[test]
    fn test_run_status_success() {
        assert!(RunStatus::Exited(0).is_success());
        assert!(!RunStatus::Exited(1).is_success());
        assert!(!RunStatus::TimeLimitExceeded.is_success());
        assert!(!RunStatus::Signaled(9).is_success());
    }
}

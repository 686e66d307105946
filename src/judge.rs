//! Execution orchestrator
//!
//! Takes one submission plus its test cases and produces the aggregate
//! verdict. Test cases run strictly in order, each under its own wall-clock
//! budget, and a single case's timeout or crash never aborts the rest of the
//! batch. The orchestrator is total over well-formed input: only
//! configuration problems surface as errors, everything else becomes a
//! per-case outcome.
//!
//! The orchestrator holds no state between invocations, so concurrent
//! submissions need no locking; each one works out of its own temporary
//! workspace.

use std::path::{Path, PathBuf};
use std::time::Instant;

use serde_json::Value;
use tracing::debug;

use crate::comparator;
use crate::error::JudgeError;
use crate::harness::{self, HarnessKind};
use crate::languages::{self, LanguageConfig};
use crate::runner::{CommandSpec, RunLimits, RunOutcome, RunStatus, Runner, SubprocessRunner};
use crate::verdict::{AggregateVerdict, CaseId, ExecutionOutcome, JudgeMode, TestCase, Verdict};
use crate::workspace::Workspace;

/// Default cap on submission source size.
pub const DEFAULT_MAX_SOURCE_BYTES: usize = 65536;

/// Error details are truncated before they leave the judge.
const MAX_ERROR_DETAIL_CHARS: usize = 4096;

/// One judge invocation's worth of input, assembled at the worker boundary.
#[derive(Debug, Clone)]
pub struct Submission {
    pub source: String,
    pub language: String,
    /// The function the harness calls; supplied by the problem repository.
    pub function_name: String,
    pub test_cases: Vec<TestCase>,
    pub mode: JudgeMode,
}

/// The judge. Generic over the runner so grading logic is testable against a
/// scripted fake; production code uses the subprocess runner.
pub struct Judge<R = SubprocessRunner> {
    runner: R,
    max_source_bytes: usize,
}

impl Judge<SubprocessRunner> {
    pub fn new() -> Self {
        Self::with_runner(SubprocessRunner::new())
    }
}

impl Default for Judge<SubprocessRunner> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: Runner> Judge<R> {
    pub fn with_runner(runner: R) -> Self {
        Self {
            runner,
            max_source_bytes: DEFAULT_MAX_SOURCE_BYTES,
        }
    }

    pub fn max_source_bytes(mut self, limit: usize) -> Self {
        self.max_source_bytes = limit;
        self
    }

    /// Judge one submission against its test cases.
    pub async fn run(&self, submission: &Submission) -> Result<AggregateVerdict, JudgeError> {
        let config = languages::get_language_config(&submission.language)
            .ok_or_else(|| JudgeError::UnsupportedLanguage(submission.language.clone()))?;
        let kind = match (config.enabled, config.harness) {
            (true, Some(kind)) => kind,
            _ => return Err(JudgeError::LanguageNotEnabled(config.name.clone())),
        };
        if submission.test_cases.is_empty() {
            return Err(JudgeError::EmptyBatch);
        }
        if submission.source.len() > self.max_source_bytes {
            return Err(JudgeError::SourceTooLarge {
                actual: submission.source.len(),
                limit: self.max_source_bytes,
            });
        }

        let mut outcomes = Vec::with_capacity(submission.test_cases.len());
        for (idx, tc) in submission.test_cases.iter().enumerate() {
            let case_id = match submission.mode {
                JudgeMode::Graded => CaseId::Number(idx + 1),
                JudgeMode::Custom => CaseId::Custom,
            };
            let outcome = self.run_case(submission, &config, kind, tc, case_id).await;
            debug!(
                "case {:?}: status={} passed={} ({}ms)",
                case_id, outcome.status, outcome.passed, outcome.duration_ms
            );
            outcomes.push(outcome);
        }

        let success = outcomes.iter().all(|o| o.passed);
        Ok(AggregateVerdict { success, outcomes })
    }

    async fn run_case(
        &self,
        submission: &Submission,
        config: &LanguageConfig,
        kind: HarnessKind,
        tc: &TestCase,
        case_id: CaseId,
    ) -> ExecutionOutcome {
        let started = Instant::now();
        let mut outcome = ExecutionOutcome {
            test_case: case_id,
            input: tc.input.clone(),
            expected: match submission.mode {
                JudgeMode::Graded => tc.expected.clone(),
                JudgeMode::Custom => None,
            },
            actual: None,
            passed: false,
            duration_ms: 0,
            status: Verdict::RuntimeError,
            error: None,
            hidden: tc.hidden,
        };

        let encoded = harness::encode_input(&tc.input);
        let epilogue = harness::generate(kind, &submission.function_name, &encoded);
        let program_text = format!("{}\n{}", submission.source, epilogue);

        match self.execute_case(config, &program_text).await {
            Err(err) => {
                // Runner-level failure (missing interpreter, workspace IO):
                // isolated to this case like any other fault.
                outcome.duration_ms = started.elapsed().as_millis() as u64;
                outcome.status = Verdict::RuntimeError;
                outcome.error = Some(truncate_detail(format!("{:#}", err)));
            }
            Ok((run, workspace_path)) => {
                outcome.duration_ms = run.duration_ms;
                match run.status {
                    RunStatus::TimeLimitExceeded => {
                        outcome.status = Verdict::TimeLimitExceeded;
                        outcome.error =
                            Some(format!("exceeded time limit of {}ms", config.time_limit_ms));
                    }
                    RunStatus::Exited(0) => {
                        grade(&mut outcome, submission.mode, tc, &run.stdout);
                    }
                    RunStatus::Exited(_) | RunStatus::Signaled(_) => {
                        outcome.status = classify_fault(&run, config);
                        outcome.error = Some(sanitize_detail(&run, &workspace_path));
                    }
                }
            }
        }

        outcome
    }

    /// Write the harnessed program into a fresh workspace and run it. The
    /// workspace is removed when this function returns, on every path.
    async fn execute_case(
        &self,
        config: &LanguageConfig,
        program_text: &str,
    ) -> anyhow::Result<(RunOutcome, PathBuf)> {
        let workspace = Workspace::create()?;
        workspace.write_source(&config.source_file, program_text)?;

        let cmd = CommandSpec::from_vec(&config.run_command).with_work_dir(workspace.path());
        let limits = RunLimits::new(config.time_limit_ms, config.memory_limit_mb);

        let run = self.runner.run(&cmd, &limits).await?;
        Ok((run, workspace.path().to_path_buf()))
    }
}

/// Decode the harness result line and decide pass/fail. In custom mode a
/// clean execution passes unconditionally; in graded mode the comparator has
/// the final word.
fn grade(outcome: &mut ExecutionOutcome, mode: JudgeMode, tc: &TestCase, stdout: &str) {
    let expected = tc.expected.as_ref().unwrap_or(&Value::Null);
    let line = harness::result_line(stdout);

    let passed = match line.and_then(|l| serde_json::from_str::<Value>(l).ok()) {
        Some(value) => {
            let passed = match mode {
                JudgeMode::Custom => true,
                JudgeMode::Graded => comparator::values_equal(&value, expected),
            };
            outcome.actual = Some(value);
            passed
        }
        None => {
            // Output is not structured data; fall back to trimmed text.
            let raw = line.unwrap_or("").trim().to_string();
            let passed = match mode {
                JudgeMode::Custom => true,
                JudgeMode::Graded => comparator::raw_equal(&raw, expected),
            };
            outcome.actual = Some(Value::String(raw));
            passed
        }
    };

    outcome.passed = passed;
    outcome.status = if passed {
        Verdict::Accepted
    } else {
        Verdict::WrongAnswer
    };
}

/// Distinguish out-of-memory kills from ordinary crashes. Only meaningful
/// for languages that run under an address-space limit.
fn classify_fault(run: &RunOutcome, config: &LanguageConfig) -> Verdict {
    if config.memory_limit_mb.is_some() {
        let sigkill = nix::sys::signal::Signal::SIGKILL as i32;
        let out_of_memory = matches!(run.status, RunStatus::Signaled(sig) if sig == sigkill)
            || run.stderr.contains("MemoryError")
            || run.stderr.contains("heap out of memory");
        if out_of_memory {
            return Verdict::MemoryLimitExceeded;
        }
    }
    Verdict::RuntimeError
}

/// Failure detail shown to users: workspace paths scrubbed, bounded length.
fn sanitize_detail(run: &RunOutcome, workspace: &Path) -> String {
    let raw = if run.stderr.trim().is_empty() {
        match run.status {
            RunStatus::Exited(code) => format!("process exited with code {}", code),
            RunStatus::Signaled(sig) => format!("process killed by signal {}", sig),
            RunStatus::TimeLimitExceeded => "exceeded time limit".to_string(),
        }
    } else {
        run.stderr.clone()
    };

    truncate_detail(raw.replace(&workspace.display().to_string(), "<sandbox>"))
}

fn truncate_detail(detail: String) -> String {
    if detail.chars().count() > MAX_ERROR_DETAIL_CHARS {
        detail.chars().take(MAX_ERROR_DETAIL_CHARS).collect()
    } else {
        detail
    }
}

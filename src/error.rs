//! Judge error taxonomy
//!
//! Only configuration problems escape the orchestrator as errors. Everything
//! that goes wrong while running a single test case (timeout, crash,
//! undecodable output) is folded into that case's outcome instead, so the
//! batch always runs to completion.

use thiserror::Error;

/// Configuration errors, detected before any code is executed.
#[derive(Debug, Error)]
pub enum JudgeError {
    /// The requested language has no runner at all.
    #[error("unsupported language: {0}")]
    UnsupportedLanguage(String),

    /// The language is known but its runner is not enabled on this worker
    /// (compiled languages awaiting a compile pipeline).
    #[error("language not enabled on this worker: {0}")]
    LanguageNotEnabled(String),

    /// A graded run with nothing to grade is a caller bug, not a verdict.
    #[error("empty test case batch")]
    EmptyBatch,

    #[error("source too large: {actual} bytes (limit {limit})")]
    SourceTooLarge { actual: usize, limit: usize },

    /// The ad hoc testcase supplied for a custom run was not valid JSON.
    #[error("invalid custom testcase: {0}")]
    InvalidCustomTestcase(String),
}

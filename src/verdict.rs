//! Verdict and result model
//!
//! The shared data contract between the orchestrator and its caller: one
//! outcome per test case plus the aggregate verdict for the batch. Everything
//! here is created fresh per judge invocation and discarded once the caller
//! has consumed it.

use std::fmt;

use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

/// Sentinel substituted for hidden test case details at the worker boundary.
pub const HIDDEN_SENTINEL: &str = "[HIDDEN]";

/// Verdict for a single test case.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    Accepted,
    WrongAnswer,
    TimeLimitExceeded,
    MemoryLimitExceeded,
    RuntimeError,
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Verdict::Accepted => "accepted",
            Verdict::WrongAnswer => "wrong_answer",
            Verdict::TimeLimitExceeded => "time_limit_exceeded",
            Verdict::MemoryLimitExceeded => "memory_limit_exceeded",
            Verdict::RuntimeError => "runtime_error",
        };
        write!(f, "{}", s)
    }
}

/// Whether a batch affects persisted statistics (graded) or is an ad hoc
/// "run" against a user-supplied input (custom).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JudgeMode {
    #[default]
    Graded,
    Custom,
}

/// One (input, expected) pair with a visibility flag.
///
/// `input` and `expected` live in the JSON value domain: numbers, strings,
/// booleans, null, sequences and string-keyed mappings. `expected` is absent
/// for custom runs, where comparison is skipped entirely.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestCase {
    pub input: Value,
    #[serde(default)]
    pub expected: Option<Value>,
    #[serde(default)]
    pub hidden: bool,
}

/// Which test case an outcome belongs to: the 1-based position within the
/// batch, or `custom` for an ad hoc run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaseId {
    Number(usize),
    Custom,
}

impl Serialize for CaseId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            CaseId::Number(n) => serializer.serialize_u64(*n as u64),
            CaseId::Custom => serializer.serialize_str("custom"),
        }
    }
}

impl<'de> Deserialize<'de> for CaseId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct CaseIdVisitor;

        impl Visitor<'_> for CaseIdVisitor {
            type Value = CaseId;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a test case number or the string \"custom\"")
            }

            fn visit_u64<E: de::Error>(self, v: u64) -> Result<CaseId, E> {
                Ok(CaseId::Number(v as usize))
            }

            fn visit_i64<E: de::Error>(self, v: i64) -> Result<CaseId, E> {
                if v < 0 {
                    return Err(E::custom("negative test case number"));
                }
                Ok(CaseId::Number(v as usize))
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<CaseId, E> {
                if v == "custom" {
                    Ok(CaseId::Custom)
                } else {
                    Err(E::custom(format!("unknown case id: {}", v)))
                }
            }
        }

        deserializer.deserialize_any(CaseIdVisitor)
    }
}

/// Outcome of running one test case.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionOutcome {
    pub test_case: CaseId,
    pub input: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expected: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub actual: Option<Value>,
    pub passed: bool,
    pub duration_ms: u64,
    pub status: Verdict,
    /// Sanitized failure detail (stderr tail for runtime errors).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub hidden: bool,
}

impl ExecutionOutcome {
    /// Replace the payload fields of a hidden case with the fixed sentinel.
    /// Presentation-layer contract: applied at the worker boundary for
    /// unprivileged callers, never inside the orchestrator.
    pub fn redacted(mut self) -> Self {
        if self.hidden {
            self.input = Value::String(HIDDEN_SENTINEL.into());
            if self.expected.is_some() {
                self.expected = Some(Value::String(HIDDEN_SENTINEL.into()));
            }
            if self.actual.is_some() {
                self.actual = Some(Value::String(HIDDEN_SENTINEL.into()));
            }
        }
        self
    }
}

/// Redact every hidden case in a batch of outcomes.
pub fn redact_hidden(outcomes: Vec<ExecutionOutcome>) -> Vec<ExecutionOutcome> {
    outcomes.into_iter().map(ExecutionOutcome::redacted).collect()
}

/// Aggregate verdict for one judge invocation.
#[derive(Debug, Serialize, Deserialize)]
pub struct AggregateVerdict {
    /// True iff every test case in the batch passed. For a custom run this
    /// means "executed without raising an error".
    pub success: bool,
    pub outcomes: Vec<ExecutionOutcome>,
}

impl AggregateVerdict {
    /// Status summary for the submission record: the first failing case's
    /// status, or `Accepted` when everything passed.
    pub fn summary_status(&self) -> Verdict {
        self.outcomes
            .iter()
            .find(|o| !o.passed)
            .map(|o| o.status)
            .unwrap_or(Verdict::Accepted)
    }

    /// Slowest test case in the batch, in milliseconds.
    pub fn max_duration_ms(&self) -> u64 {
        self.outcomes.iter().map(|o| o.duration_ms).max().unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn outcome(passed: bool, status: Verdict, hidden: bool) -> ExecutionOutcome {
        ExecutionOutcome {
            test_case: CaseId::Number(1),
            input: json!([1, 2]),
            expected: Some(json!(3)),
            actual: Some(json!(4)),
            passed,
            duration_ms: 10,
            status,
            error: None,
            hidden,
        }
    }

    #[test]
    fn test_verdict_display() {
        assert_eq!(Verdict::Accepted.to_string(), "accepted");
        assert_eq!(Verdict::WrongAnswer.to_string(), "wrong_answer");
        assert_eq!(
            Verdict::TimeLimitExceeded.to_string(),
            "time_limit_exceeded"
        );
    }

    #[test]
    fn test_case_id_serialization() {
        assert_eq!(
            serde_json::to_value(CaseId::Number(3)).unwrap(),
            json!(3)
        );
        assert_eq!(
            serde_json::to_value(CaseId::Custom).unwrap(),
            json!("custom")
        );
    }

    #[test]
    fn test_case_id_roundtrip() {
        let n: CaseId = serde_json::from_value(json!(7)).unwrap();
        assert_eq!(n, CaseId::Number(7));
        let c: CaseId = serde_json::from_value(json!("custom")).unwrap();
        assert_eq!(c, CaseId::Custom);
        assert!(serde_json::from_value::<CaseId>(json!("bogus")).is_err());
    }

    #[test]
    fn test_redaction_replaces_hidden_payload() {
        let redacted = outcome(false, Verdict::WrongAnswer, true).redacted();
        assert_eq!(redacted.input, json!(HIDDEN_SENTINEL));
        assert_eq!(redacted.expected, Some(json!(HIDDEN_SENTINEL)));
        assert_eq!(redacted.actual, Some(json!(HIDDEN_SENTINEL)));
        // verdict and timing stay visible
        assert_eq!(redacted.status, Verdict::WrongAnswer);
        assert_eq!(redacted.duration_ms, 10);
    }

    #[test]
    fn test_redaction_keeps_public_payload() {
        let public = outcome(true, Verdict::Accepted, false).redacted();
        assert_eq!(public.input, json!([1, 2]));
        assert_eq!(public.actual, Some(json!(4)));
    }

    #[test]
    fn test_summary_status_first_failure() {
        let verdict = AggregateVerdict {
            success: false,
            outcomes: vec![
                outcome(true, Verdict::Accepted, false),
                outcome(false, Verdict::TimeLimitExceeded, false),
                outcome(false, Verdict::WrongAnswer, false),
            ],
        };
        assert_eq!(verdict.summary_status(), Verdict::TimeLimitExceeded);
    }

    #[test]
    fn test_summary_status_all_passed() {
        let verdict = AggregateVerdict {
            success: true,
            outcomes: vec![outcome(true, Verdict::Accepted, false)],
        };
        assert_eq!(verdict.summary_status(), Verdict::Accepted);
        assert_eq!(verdict.max_duration_ms(), 10);
    }
}

//! Output comparison
//!
//! All "is this actually the same value" policy lives here, so the runners
//! and the orchestrator never have to care how a particular interpreter
//! happens to format its output.

use serde_json::{Number, Value};

/// Deep structural equality over the JSON value domain: scalar equality for
/// numbers/strings/booleans/null, element-wise ordered equality for
/// sequences, key-set plus per-key equality for mappings.
pub fn values_equal(actual: &Value, expected: &Value) -> bool {
    match (actual, expected) {
        (Value::Number(a), Value::Number(b)) => numbers_equal(a, b),
        (Value::Array(a), Value::Array(b)) => {
            a.len() == b.len() && a.iter().zip(b).all(|(x, y)| values_equal(x, y))
        }
        (Value::Object(a), Value::Object(b)) => {
            a.len() == b.len()
                && a.iter()
                    .all(|(k, va)| b.get(k).is_some_and(|vb| values_equal(va, vb)))
        }
        _ => actual == expected,
    }
}

/// Numbers compare across integer/float representations: a Python harness
/// may serialize `1.0` where the expected value was written as `1`.
fn numbers_equal(a: &Number, b: &Number) -> bool {
    if let (Some(x), Some(y)) = (a.as_i64(), b.as_i64()) {
        return x == y;
    }
    if let (Some(x), Some(y)) = (a.as_u64(), b.as_u64()) {
        return x == y;
    }
    match (a.as_f64(), b.as_f64()) {
        (Some(x), Some(y)) => x == y,
        _ => false,
    }
}

/// Defensive fallback for runner output that is not valid JSON: trimmed
/// string equality against the expected value's canonical rendering (or its
/// bare content when the expected value is itself a string).
pub fn raw_equal(actual: &str, expected: &Value) -> bool {
    let expected_text = match expected {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    };
    actual.trim() == expected_text.trim()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_scalars() {
        assert!(values_equal(&json!(42), &json!(42)));
        assert!(values_equal(&json!("a"), &json!("a")));
        assert!(values_equal(&json!(true), &json!(true)));
        assert!(values_equal(&json!(null), &json!(null)));
        assert!(!values_equal(&json!(42), &json!(43)));
        assert!(!values_equal(&json!("a"), &json!(null)));
    }

    #[test]
    fn test_integer_float_normalization() {
        assert!(values_equal(&json!(1.0), &json!(1)));
        assert!(values_equal(&json!(1), &json!(1.0)));
        assert!(!values_equal(&json!(1.5), &json!(1)));
    }

    #[test]
    fn test_large_integers() {
        assert!(values_equal(
            &json!(9_007_199_254_740_993_i64),
            &json!(9_007_199_254_740_993_i64)
        ));
        assert!(!values_equal(
            &json!(9_007_199_254_740_993_i64),
            &json!(9_007_199_254_740_992_i64)
        ));
    }

    #[test]
    fn test_sequences_are_ordered() {
        assert!(values_equal(&json!([0, 1]), &json!([0, 1])));
        assert!(!values_equal(&json!([1, 0]), &json!([0, 1])));
        assert!(!values_equal(&json!([0, 1, 2]), &json!([0, 1])));
    }

    #[test]
    fn test_nested_structures() {
        let a = json!({"pairs": [[2, 7], [11, 15]], "target": 9.0});
        let b = json!({"target": 9, "pairs": [[2, 7], [11, 15]]});
        assert!(values_equal(&a, &b));
    }

    #[test]
    fn test_mapping_key_sets() {
        assert!(!values_equal(&json!({"a": 1}), &json!({"a": 1, "b": 2})));
        assert!(!values_equal(&json!({"a": 1, "b": 2}), &json!({"a": 1})));
    }

    #[test]
    fn test_raw_fallback() {
        assert!(raw_equal("  hello \n", &json!("hello")));
        assert!(raw_equal("[0,1]", &json!([0, 1])));
        assert!(!raw_equal("hello", &json!("world")));
    }
}

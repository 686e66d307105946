//! Harness generation
//!
//! Wraps a submitted function with the input-decoding and output-serializing
//! boilerplate for its language, so that every runner speaks the same
//! protocol: the harness prints the function's return value as one JSON line
//! at the end of stdout, and the judge reads it back with [`result_line`].
//!
//! Generation is a pure function of (function name, encoded input) and is
//! unit-tested without ever spawning a process. Inputs are embedded as a JSON
//! string literal and decoded by the target language's own JSON library,
//! never spliced into the source as bare literals, which would break on
//! values like `null` that not every language can spell.

use serde::Deserialize;
use serde_json::Value;

/// Which harness dialect a language uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HarnessKind {
    Javascript,
    Python,
}

/// Encode a structured input for transport into the generated harness.
pub fn encode_input(input: &Value) -> String {
    input.to_string()
}

/// Generate the harness epilogue appended to the user's source.
///
/// A sequence input spreads into one argument per element; any other value is
/// passed as the single argument.
pub fn generate(kind: HarnessKind, function_name: &str, encoded_input: &str) -> String {
    match kind {
        HarnessKind::Javascript => javascript(function_name, encoded_input),
        HarnessKind::Python => python(function_name, encoded_input),
    }
}

fn javascript(function_name: &str, encoded_input: &str) -> String {
    let payload = string_literal(encoded_input);
    format!(
        "\n\
         const __judge_input = JSON.parse({payload});\n\
         const __judge_args = Array.isArray(__judge_input) ? __judge_input : [__judge_input];\n\
         const __judge_result = {function_name}(...__judge_args);\n\
         console.log(JSON.stringify(__judge_result === undefined ? null : __judge_result));\n"
    )
}

fn python(function_name: &str, encoded_input: &str) -> String {
    let payload = string_literal(encoded_input);
    format!(
        "\n\
         import json as __judge_json\n\
         __judge_input = __judge_json.loads({payload})\n\
         __judge_args = __judge_input if isinstance(__judge_input, list) else [__judge_input]\n\
         print(__judge_json.dumps({function_name}(*__judge_args)))\n"
    )
}

/// Quote arbitrary text as a string literal valid in both JS and Python
/// source. JSON string escaping is a subset of both languages' escape rules.
fn string_literal(text: &str) -> String {
    Value::String(text.to_string()).to_string()
}

/// Extract the harness's result line from captured stdout: the last
/// non-empty line. Anything the submission printed before returning is
/// tolerated; the harness call is the final statement, so its output line is
/// always last.
pub fn result_line(stdout: &str) -> Option<&str> {
    stdout.lines().rev().find(|line| !line.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_javascript_harness_shape() {
        let harness = generate(HarnessKind::Javascript, "twoSum", "[[2,7,11,15],9]");
        assert!(harness.contains("twoSum(...__judge_args)"));
        assert!(harness.contains(r#"JSON.parse("[[2,7,11,15],9]")"#));
    }

    #[test]
    fn test_python_harness_shape() {
        let harness = generate(HarnessKind::Python, "two_sum", "[[2,7,11,15],9]");
        assert!(harness.contains("two_sum(*__judge_args)"));
        assert!(harness.contains(r#"__judge_json.loads("[[2,7,11,15],9]")"#));
    }

    #[test]
    fn test_inputs_never_spliced_as_bare_literals() {
        // Python has no `null`/`true` tokens; the payload must stay inside a
        // string literal for its own json module to decode.
        let encoded = encode_input(&json!([null, true, false]));
        let harness = generate(HarnessKind::Python, "f", &encoded);
        assert!(harness.contains(r#""[null,true,false]""#));
        assert!(!harness.contains("f(null"));
    }

    #[test]
    fn test_string_literal_escaping() {
        let encoded = encode_input(&json!(["quote \" backslash \\ newline \n"]));
        let literal = string_literal(&encoded);
        // The embedded literal must itself be a single JSON token that
        // decodes back to the encoded text.
        let decoded: String = serde_json::from_str(&literal).unwrap();
        assert_eq!(decoded, encoded);
    }

    #[test]
    fn test_scalar_input_is_single_argument() {
        let harness = generate(HarnessKind::Javascript, "f", &encode_input(&json!(5)));
        // The arity decision is made at runtime by the harness itself.
        assert!(harness.contains("Array.isArray"));
    }

    #[test]
    fn test_result_line_takes_last_nonempty() {
        assert_eq!(result_line("debug\n[0,1]\n"), Some("[0,1]"));
        assert_eq!(result_line("[0,1]\n\n\n"), Some("[0,1]"));
        assert_eq!(result_line("\n  \n"), None);
        assert_eq!(result_line(""), None);
    }
}

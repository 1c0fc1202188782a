//! Deterministic repair of near-valid JSON returned by the model.
//!
//! Each pass is a pure text transform. They are applied in a fixed order:
//! strip code fences, balance the outer braces, parse; on failure drop
//! trailing commas and parse once more.

use crate::utils::{looks_truncated, truncate_for_log};
use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use serde_json::{Map, Value};
use tracing::{debug, warn};

/// A whole string literal, or a comma followed only by whitespace and a
/// closing bracket. Matching literals first keeps their contents untouched.
static TRAILING_COMMA: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#""(?:[^"\\]|\\.)*"|,\s*([}\]])"#).expect("static regex is valid")
});

/// How a JSON object was recovered from raw model output.
#[derive(Debug, Clone, PartialEq)]
pub enum Repair {
    /// The trimmed output parsed as-is.
    Clean(Map<String, Value>),
    /// One or more repair passes were needed.
    Repaired(Map<String, Value>),
    /// Nothing parseable could be recovered.
    Failed,
}

/// Remove markdown code-fence markers wherever they appear.
pub fn strip_code_fences(raw: &str) -> String {
    raw.replace("```json", "")
        .replace("```JSON", "")
        .replace("```", "")
        .trim()
        .to_string()
}

/// Best-effort brace balancing for output that lost its first or last brace.
pub fn balance_braces(text: &str) -> String {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return String::new();
    }
    let mut out = String::with_capacity(trimmed.len() + 2);
    if !trimmed.starts_with('{') {
        out.push('{');
    }
    out.push_str(trimmed);
    if !trimmed.ends_with('}') {
        out.push('}');
    }
    out
}

/// Drop commas that directly precede a closing `}` or `]`.
pub fn strip_trailing_commas(text: &str) -> String {
    TRAILING_COMMA
        .replace_all(text, |caps: &Captures<'_>| match caps.get(1) {
            Some(close) => close.as_str().to_string(),
            None => caps[0].to_string(),
        })
        .into_owned()
}

fn parse_object(text: &str) -> Result<Map<String, Value>, serde_json::Error> {
    match serde_json::from_str::<Value>(text)? {
        Value::Object(map) => Ok(map),
        other => Err(serde::de::Error::custom(format!(
            "expected a JSON object, got {}",
            kind_of(&other)
        ))),
    }
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// Recover a JSON object from untrusted model output.
///
/// Never panics and never returns an error: unrecoverable output is
/// [`Repair::Failed`].
pub fn repair_json(raw: &str) -> Repair {
    let original = raw.trim();
    let balanced = balance_braces(&strip_code_fences(original));
    if balanced.is_empty() {
        warn!("Model returned an empty response");
        return Repair::Failed;
    }
    let changed = balanced != original;

    let first_err = match parse_object(&balanced) {
        Ok(map) if changed => {
            debug!("Recovered JSON after fence/brace repair");
            return Repair::Repaired(map);
        }
        Ok(map) => return Repair::Clean(map),
        Err(e) => e,
    };
    warn!(
        error = %first_err,
        truncated = looks_truncated(&first_err),
        raw = %truncate_for_log(&balanced, 300),
        "JSON decode failed; retrying without trailing commas"
    );

    let cleaned = strip_trailing_commas(&balanced);
    match parse_object(&cleaned) {
        Ok(map) => Repair::Repaired(map),
        Err(e) => {
            warn!(
                error = %e,
                raw = %truncate_for_log(&cleaned, 300),
                "Second JSON decode failed; giving up"
            );
            Repair::Failed
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const VALID: &str = r#"{"company_name": "Acme", "investors": ["Foo", "Bar"], "amount_raised_usd": 5000000}"#;

    fn expected() -> Map<String, Value> {
        json!({"company_name": "Acme", "investors": ["Foo", "Bar"], "amount_raised_usd": 5000000})
            .as_object()
            .cloned()
            .unwrap()
    }

    #[test]
    fn test_valid_json_is_clean() {
        assert_eq!(repair_json(VALID), Repair::Clean(expected()));
        assert_eq!(repair_json(&format!("  \n{VALID}\n ")), Repair::Clean(expected()));
    }

    #[test]
    fn test_code_fence_is_stripped() {
        let fenced = format!("```json\n{VALID}\n```");
        assert_eq!(repair_json(&fenced), Repair::Repaired(expected()));

        let bare_fence = format!("```\n{VALID}\n```");
        assert_eq!(repair_json(&bare_fence), Repair::Repaired(expected()));
    }

    #[test]
    fn test_missing_outer_braces_are_restored() {
        let no_close = VALID.trim_end_matches('}');
        assert_eq!(repair_json(no_close), Repair::Repaired(expected()));

        let no_open = VALID.trim_start_matches('{');
        assert_eq!(repair_json(no_open), Repair::Repaired(expected()));
    }

    #[test]
    fn test_balancing_valid_json_is_a_no_op() {
        assert_eq!(balance_braces(VALID), VALID);
        assert_eq!(strip_code_fences(VALID), VALID);
    }

    #[test]
    fn test_trailing_commas_are_removed_on_second_pass() {
        let raw = r#"{"company_name": "Acme", "investors": ["Foo", "Bar", ], "amount_raised_usd": 5000000,
        }"#;
        assert_eq!(repair_json(raw), Repair::Repaired(expected()));
    }

    #[test]
    fn test_strip_trailing_commas() {
        assert_eq!(strip_trailing_commas(r#"{"a": [1, 2,], "b": 3,}"#), r#"{"a": [1, 2], "b": 3}"#);
        assert_eq!(strip_trailing_commas(r#"{"a": 1}"#), r#"{"a": 1}"#);
    }

    #[test]
    fn test_commas_inside_strings_survive() {
        assert_eq!(
            strip_trailing_commas(r#"{"company_name": "Acme, }", "note": "a \", ]",}"#),
            r#"{"company_name": "Acme, }", "note": "a \", ]"}"#
        );

        let raw = r#"{"company_name": "Acme, }", "investors": ["Foo",],}"#;
        let Repair::Repaired(map) = repair_json(raw) else {
            panic!("expected a repaired object");
        };
        assert_eq!(map["company_name"], json!("Acme, }"));
        assert_eq!(map["investors"], json!(["Foo"]));
    }

    #[test]
    fn test_unrecoverable_output_fails() {
        assert_eq!(repair_json(""), Repair::Failed);
        assert_eq!(repair_json("```json\n```"), Repair::Failed);
        assert_eq!(repair_json("I could not find any funding information."), Repair::Failed);
        assert_eq!(repair_json(r#"{"company_name": "Acme", "investors": ["Foo""#), Repair::Failed);
    }

    #[test]
    fn test_non_object_json_fails() {
        assert_eq!(repair_json("[1, 2, 3]"), Repair::Failed);
    }
}

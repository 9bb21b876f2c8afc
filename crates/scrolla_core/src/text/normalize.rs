//! Text normalization for model replies and curated atom content.
//!
//! # Responsibility
//! - Flatten `Text` values (plain string or line list) into one string.
//! - Coerce untyped JSON reply values under strict or lenient policy.
//! - Remove leaked answers from quiz content.
//!
//! # Invariants
//! - `Lines` input never produces blank lines in the output.
//! - `Generation` mode never trims a plain string; `Curation` always does.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::error::Error;
use std::fmt::{Display, Formatter};

const ANSWER_MARKERS: [&str; 4] = ["Answer:", "answer:", "Ans:", "Correct:"];
const UNKNOWN_SENTINEL: &str = "unknown";

/// Error raised when text input cannot be normalized.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TextError {
    /// Value is neither a string nor a list of strings.
    TypeKind { found: &'static str },
    /// Reply could not be parsed as structured data by any strategy.
    Malformed(String),
}

impl Display for TextError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::TypeKind { found } => {
                write!(f, "expected string or list of strings, got {found}")
            }
            Self::Malformed(message) => write!(f, "malformed structured reply: {message}"),
        }
    }
}

impl Error for TextError {}

/// Whether plain strings are trimmed during normalization.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NormalizeMode {
    /// Keep plain strings verbatim; used right after model generation.
    Generation,
    /// Trim plain strings; used by curation before comparing content.
    Curation,
}

/// How to treat values that are not text at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strictness {
    Strict,
    /// Coerce to empty string so a malformed reply never aborts a run.
    Lenient,
}

/// Text-or-lines value as returned by generative collaborators.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Text {
    Plain(String),
    Lines(Vec<String>),
}

impl Text {
    /// Flattens this value into a single string.
    pub fn normalize(&self, mode: NormalizeMode) -> String {
        match self {
            Self::Plain(value) => match mode {
                NormalizeMode::Generation => value.clone(),
                NormalizeMode::Curation => value.trim().to_string(),
            },
            Self::Lines(lines) => join_lines(lines.iter().map(String::as_str)),
        }
    }

    /// Returns whether this value carries real content.
    ///
    /// Empty strings, empty lists and the `unknown` sentinel are unfilled.
    pub fn is_filled(&self) -> bool {
        let flat = self.normalize(NormalizeMode::Curation);
        !flat.is_empty() && !flat.eq_ignore_ascii_case(UNKNOWN_SENTINEL)
    }

    /// Converts a JSON reply value into `Text` when it is string-like.
    ///
    /// Non-string list items are rendered with their JSON text.
    pub fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::String(text) => Some(Self::Plain(text.clone())),
            Value::Array(items) => Some(Self::Lines(items.iter().map(value_to_line).collect())),
            _ => None,
        }
    }
}

impl From<String> for Text {
    fn from(value: String) -> Self {
        Self::Plain(value)
    }
}

impl From<&str> for Text {
    fn from(value: &str) -> Self {
        Self::Plain(value.to_string())
    }
}

/// Normalizes an untyped JSON value into text.
///
/// # Errors
/// - Returns `TextError::TypeKind` for non-text values under `Strict`.
pub fn normalize_value(
    value: &Value,
    mode: NormalizeMode,
    strictness: Strictness,
) -> Result<String, TextError> {
    match Text::from_value(value) {
        Some(text) => Ok(text.normalize(mode)),
        None => match strictness {
            Strictness::Strict => Err(TextError::TypeKind {
                found: value_kind(value),
            }),
            Strictness::Lenient => Ok(String::new()),
        },
    }
}

/// Truncates quiz content at the earliest leaked-answer marker.
///
/// Content without any marker is returned unchanged.
pub fn strip_answer_leak(content: &str) -> String {
    let cut = ANSWER_MARKERS
        .iter()
        .filter_map(|marker| content.find(marker))
        .min();
    match cut {
        Some(index) => content[..index].trim().to_string(),
        None => content.to_string(),
    }
}

/// Counts whitespace-separated words.
pub fn word_count(content: &str) -> usize {
    content.split_whitespace().count()
}

fn join_lines<'a>(lines: impl Iterator<Item = &'a str>) -> String {
    lines
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

fn value_to_line(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::{
        normalize_value, strip_answer_leak, NormalizeMode, Strictness, Text, TextError,
    };
    use serde_json::json;

    #[test]
    fn lines_join_trimmed_non_empty_entries() {
        let text = Text::Lines(vec![
            "  first ".to_string(),
            String::new(),
            "   ".to_string(),
            "second".to_string(),
        ]);
        assert_eq!(text.normalize(NormalizeMode::Generation), "first\nsecond");
        assert_eq!(text.normalize(NormalizeMode::Curation), "first\nsecond");
    }

    #[test]
    fn plain_text_is_trimmed_only_in_curation_mode() {
        let text = Text::from("  padded  ");
        assert_eq!(text.normalize(NormalizeMode::Generation), "  padded  ");
        assert_eq!(text.normalize(NormalizeMode::Curation), "padded");
    }

    #[test]
    fn null_fails_strict_and_coerces_lenient() {
        let err = normalize_value(&json!(null), NormalizeMode::Generation, Strictness::Strict)
            .expect_err("null must be rejected in strict mode");
        assert_eq!(err, TextError::TypeKind { found: "null" });

        let coerced =
            normalize_value(&json!(null), NormalizeMode::Generation, Strictness::Lenient)
                .expect("lenient mode never fails");
        assert_eq!(coerced, "");
    }

    #[test]
    fn list_values_render_non_string_items() {
        let flat = normalize_value(
            &json!(["push", 3, "pop"]),
            NormalizeMode::Curation,
            Strictness::Strict,
        )
        .unwrap();
        assert_eq!(flat, "push\n3\npop");
    }

    #[test]
    fn unknown_sentinel_is_not_filled() {
        assert!(!Text::from("Unknown").is_filled());
        assert!(!Text::Lines(vec![" ".to_string()]).is_filled());
        assert!(Text::from("LIFO order").is_filled());
    }

    #[test]
    fn answer_leak_is_cut_at_earliest_marker() {
        assert_eq!(
            strip_answer_leak("Does pop remove the top item? Answer: yes. Correct: yes"),
            "Does pop remove the top item?"
        );
        assert_eq!(
            strip_answer_leak("Is a stack FIFO? Correct: no Ans: no"),
            "Is a stack FIFO?"
        );
        assert_eq!(strip_answer_leak(" no marker here "), " no marker here ");
    }
}

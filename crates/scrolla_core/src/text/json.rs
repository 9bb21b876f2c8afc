//! Progressive, lenient parsing of structured model replies.
//!
//! # Responsibility
//! - Recover a JSON value from replies wrapped in prose or code fences.
//! - Repair common defects: stray backslashes, missing separators,
//!   single-quoted strings, literal keywords and trailing commas.
//!
//! # Invariants
//! - Strategies run from strictest to most permissive; the first success wins.
//! - A reply that no strategy can parse yields `TextError::Malformed`.

use super::normalize::TextError;
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

static CODE_FENCE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"```(?:json)?\s*").expect("valid code fence regex"));
static MISSING_SEPARATOR_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"([}\]"'0-9])\s+(["{\[])"#).expect("valid missing separator regex")
});

/// Parses a model reply into a JSON value using progressively lenient passes.
///
/// # Errors
/// - Returns `TextError::Malformed` when every strategy fails.
pub fn parse_lenient(reply: &str) -> Result<Value, TextError> {
    let trimmed = reply.trim().trim_matches('\u{feff}');
    if trimmed.is_empty() {
        return Err(TextError::Malformed("empty reply".to_string()));
    }

    if let Ok(value) = serde_json::from_str::<Value>(trimmed) {
        return Ok(value);
    }

    let embedded = extract_embedded(trimmed);
    if let Some(candidate) = embedded {
        if let Ok(value) = serde_json::from_str::<Value>(candidate) {
            return Ok(value);
        }
    }

    let mut attempts = vec![trimmed];
    attempts.extend(embedded);

    let cleaned: Vec<String> = attempts.iter().map(|text| clean_json_text(text)).collect();
    for candidate in &cleaned {
        if let Ok(value) = serde_json::from_str::<Value>(candidate) {
            return Ok(value);
        }
    }

    for candidate in attempts
        .iter()
        .copied()
        .chain(cleaned.iter().map(String::as_str))
    {
        if let Ok(value) = serde_json::from_str::<Value>(&relax_literal(candidate)) {
            return Ok(value);
        }
    }

    Err(TextError::Malformed(format!(
        "no strategy recovered JSON from {} chars",
        trimmed.chars().count()
    )))
}

/// Locates the JSON payload inside prose: a fenced block first, then the
/// outermost object or array slice.
fn extract_embedded(text: &str) -> Option<&str> {
    if let Some(start) = text.find("```") {
        let body_start = text[start + 3..]
            .find('\n')
            .map_or(start + 3, |offset| start + 3 + offset + 1);
        if let Some(end) = text[body_start..].find("```") {
            let block = text[body_start..body_start + end].trim();
            if !block.is_empty() {
                return Some(block);
            }
        }
    }

    let open = text.find(['{', '['])?;
    let closer = if text[open..].starts_with('{') { '}' } else { ']' };
    let close = text.rfind(closer)?;
    (open < close).then(|| &text[open..=close])
}

/// Strips code fences, escapes stray backslashes and inserts missing
/// separators between adjacent values.
fn clean_json_text(text: &str) -> String {
    let without_fences = CODE_FENCE_RE.replace_all(text, "");
    let escaped = escape_stray_backslashes(&without_fences);
    MISSING_SEPARATOR_RE
        .replace_all(&escaped, "$1, $2")
        .into_owned()
}

fn escape_stray_backslashes(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars().peekable();
    while let Some(ch) = chars.next() {
        if ch != '\\' {
            out.push(ch);
            continue;
        }
        match chars.peek() {
            Some(&next) if matches!(next, '\\' | '"' | '/' | 'b' | 'f' | 'n' | 'r' | 't' | 'u') => {
                out.push('\\');
                out.push(next);
                chars.next();
            }
            _ => out.push_str("\\\\"),
        }
    }
    out
}

/// Rewrites literal-style syntax into JSON: single-quoted strings become
/// double-quoted, `True/False/None` become `true/false/null`, and trailing
/// commas before a closing bracket are dropped.
fn relax_literal(text: &str) -> String {
    let chars: Vec<char> = text.chars().collect();
    let mut out = String::with_capacity(text.len());
    let mut index = 0;

    while index < chars.len() {
        let ch = chars[index];
        match ch {
            '"' | '\'' => {
                index = copy_string(&chars, index, &mut out);
            }
            ',' => {
                let next = chars[index + 1..]
                    .iter()
                    .find(|candidate| !candidate.is_whitespace());
                if !matches!(next, Some('}') | Some(']')) {
                    out.push(',');
                }
                index += 1;
            }
            c if c.is_ascii_alphabetic() => {
                let start = index;
                while index < chars.len()
                    && (chars[index].is_ascii_alphanumeric() || chars[index] == '_')
                {
                    index += 1;
                }
                let word: String = chars[start..index].iter().collect();
                out.push_str(match word.as_str() {
                    "True" => "true",
                    "False" => "false",
                    "None" => "null",
                    other => other,
                });
            }
            other => {
                out.push(other);
                index += 1;
            }
        }
    }

    out
}

/// Copies one quoted string starting at `start` as a JSON string literal and
/// returns the index just past its closing quote.
fn copy_string(chars: &[char], start: usize, out: &mut String) -> usize {
    let quote = chars[start];
    let mut index = start + 1;
    out.push('"');

    while index < chars.len() {
        let ch = chars[index];
        if ch == '\\' && index + 1 < chars.len() {
            let next = chars[index + 1];
            if next == '\'' {
                out.push('\'');
            } else {
                out.push('\\');
                out.push(next);
            }
            index += 2;
            continue;
        }
        if ch == quote {
            index += 1;
            break;
        }
        match ch {
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            other => out.push(other),
        }
        index += 1;
    }

    out.push('"');
    index
}

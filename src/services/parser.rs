//! Tolerant parsing of inference-service output
//!
//! The inference service gives no format guarantee: the same pass can come
//! back as bare JSON, JSON inside a fenced code block, JSON buried in prose,
//! or no JSON at all. The fallback chain here never fails and never returns
//! null. Downstream consumers always get a value of the expected shape, at
//! worst the caller-supplied default with the degraded flag raised.

use serde_json::Value;

/// Shape a pass expects from the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExpectedShape {
    Object,
    Array,
}

/// Outcome of the fallback chain.
#[derive(Debug, Clone, PartialEq)]
pub enum StructuredOutcome {
    /// One of the parse strategies succeeded.
    Parsed(Value),
    /// Every strategy failed; this carries the caller-supplied default.
    Degraded(Value),
}

impl StructuredOutcome {
    pub fn is_degraded(&self) -> bool {
        matches!(self, Self::Degraded(_))
    }

    pub fn into_value(self) -> Value {
        match self {
            Self::Parsed(value) | Self::Degraded(value) => value,
        }
    }
}

/// Run the fallback chain, first success wins:
/// 1. the whole input as JSON of the expected shape,
/// 2. the inner content of the first fenced block tagged `json`,
/// 3. the first balanced `{...}` / `[...]` substring that parses,
/// 4. the default, flagged degraded.
pub fn parse_structured(raw: &str, shape: ExpectedShape, default: Value) -> StructuredOutcome {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return StructuredOutcome::Degraded(default);
    }

    if let Some(value) = parse_as_shape(trimmed, shape) {
        return StructuredOutcome::Parsed(value);
    }

    if let Some(inner) = fenced_json_block(trimmed) {
        if let Some(value) = parse_as_shape(inner.trim(), shape) {
            return StructuredOutcome::Parsed(value);
        }
    }

    // A balanced candidate that fails to parse must not mask a later valid
    // one, so try them in order.
    for candidate in balanced_candidates(trimmed, shape) {
        if let Some(value) = parse_as_shape(candidate, shape) {
            return StructuredOutcome::Parsed(value);
        }
    }

    StructuredOutcome::Degraded(default)
}

fn parse_as_shape(input: &str, shape: ExpectedShape) -> Option<Value> {
    let value: Value = serde_json::from_str(input).ok()?;
    match (shape, &value) {
        (ExpectedShape::Object, Value::Object(_)) => Some(value),
        (ExpectedShape::Array, Value::Array(_)) => Some(value),
        _ => None,
    }
}

/// Inner content of the first fenced code block tagged `json`.
fn fenced_json_block(s: &str) -> Option<&str> {
    let mut rest = s;
    while let Some(open) = rest.find("```") {
        let after = &rest[open + 3..];
        let newline = after.find('\n')?;
        let tag = after[..newline].trim();
        let body = &after[newline + 1..];
        let close = body.find("```")?;
        if tag.eq_ignore_ascii_case("json") {
            return Some(&body[..close]);
        }
        rest = &body[close + 3..];
    }
    None
}

/// Balanced `{...}` or `[...]` substrings in order of appearance.
///
/// Nesting is tracked by depth with string/escape awareness, so braces inside
/// string literals do not unbalance a candidate.
fn balanced_candidates(raw: &str, shape: ExpectedShape) -> Vec<&str> {
    let (open, close) = match shape {
        ExpectedShape::Object => ('{', '}'),
        ExpectedShape::Array => ('[', ']'),
    };

    let mut result = Vec::new();
    let mut start: Option<usize> = None;
    let mut depth: usize = 0;
    let mut in_string = false;
    let mut escape = false;

    for (index, ch) in raw.char_indices() {
        if let Some(begin) = start {
            if in_string {
                if escape {
                    escape = false;
                } else if ch == '\\' {
                    escape = true;
                } else if ch == '"' {
                    in_string = false;
                }
                continue;
            }

            if ch == '"' {
                in_string = true;
            } else if ch == open {
                depth += 1;
            } else if ch == close {
                if depth == 0 {
                    result.push(&raw[begin..index + ch.len_utf8()]);
                    start = None;
                } else {
                    depth -= 1;
                }
            }
        } else if ch == open {
            start = Some(index);
            depth = 0;
            in_string = false;
            escape = false;
        }
    }

    result
}

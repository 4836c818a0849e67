//! Decoding of raw model output into a JSON object.
//!
//! ## Why is this necessary?
//!
//! Even well-prompted chat models occasionally decorate their answer:
//!
//! - Wrapping the JSON in ` ```json ... ``` ` fences despite the prompt
//!   saying "JSON only"
//! - Emitting Python-literal style output (single quotes, `None`, `True`,
//!   trailing commas) instead of strict JSON
//! - Returning a bare array or scalar instead of the requested object
//!
//! Decoding is a best-effort structured decode with two strategies tried
//! in fixed priority order, first success wins: strict JSON, then a
//! permissive literal normalisation. If all strategies fail, or the
//! successful result is not object-shaped, decoding fails with
//! [`ExtractError::ExtractionFormat`]. Each step is a pure function.

use crate::error::ExtractError;
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{Map, Value};

// ── Fence stripping ──────────────────────────────────────────────────────

static RE_OUTER_FENCES: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)^```(?:json)?\s*(.*?)\s*```\s*$").unwrap());

/// Strip one outer markdown code fence (with optional `json` language tag)
/// from the raw response text.
///
/// Idempotent: already-unfenced input is returned unchanged (modulo outer
/// whitespace trimming).
pub fn strip_code_fences(input: &str) -> String {
    let trimmed = input.trim();
    if let Some(caps) = RE_OUTER_FENCES.captures(trimmed) {
        caps[1].to_string()
    } else {
        trimmed.to_string()
    }
}

// ── Parser strategies ────────────────────────────────────────────────────

/// Parse cleaned response text into a JSON object.
///
/// Strategies, in priority order:
/// 1. Strict JSON (`serde_json`)
/// 2. Permissive literal parse: the text is normalised from Python-literal
///    conventions (single-quoted strings, `None`/`True`/`False`, trailing
///    commas) to JSON, then parsed strictly.
///
/// Only object-shaped results are acceptable; an array or scalar fails
/// with [`ExtractError::ExtractionFormat`] even when it parses.
pub fn parse_object(text: &str) -> Result<Map<String, Value>, ExtractError> {
    let value = match serde_json::from_str::<Value>(text) {
        Ok(v) => v,
        Err(strict_err) => {
            let normalised = normalise_literal(text);
            serde_json::from_str::<Value>(&normalised).map_err(|_| {
                ExtractError::ExtractionFormat {
                    detail: format!("not valid JSON ({strict_err}) and literal fallback failed"),
                }
            })?
        }
    };

    match value {
        Value::Object(map) => Ok(map),
        other => Err(ExtractError::ExtractionFormat {
            detail: format!("parsed to {}, expected an object", shape_name(&other)),
        }),
    }
}

fn shape_name(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// Rewrite Python-literal conventions to strict JSON.
///
/// Outside strings: `None` → `null`, `True` → `true`, `False` → `false`,
/// and trailing commas before `}` / `]` are dropped. Single-quoted strings
/// become double-quoted with the necessary re-escaping. String contents are
/// never touched beyond quote conversion.
fn normalise_literal(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let chars: Vec<char> = input.chars().collect();
    let mut i = 0;

    while i < chars.len() {
        match chars[i] {
            '"' => {
                // Double-quoted string: copy verbatim, honouring escapes.
                out.push('"');
                i += 1;
                while i < chars.len() {
                    let c = chars[i];
                    out.push(c);
                    i += 1;
                    if c == '\\' && i < chars.len() {
                        out.push(chars[i]);
                        i += 1;
                    } else if c == '"' {
                        break;
                    }
                }
            }
            '\'' => {
                // Single-quoted string: convert to double-quoted.
                out.push('"');
                i += 1;
                while i < chars.len() {
                    let c = chars[i];
                    i += 1;
                    match c {
                        '\\' if i < chars.len() => {
                            let next = chars[i];
                            i += 1;
                            if next == '\'' {
                                // \' needs no escape inside double quotes
                                out.push('\'');
                            } else {
                                out.push('\\');
                                out.push(next);
                            }
                        }
                        '\'' => {
                            out.push('"');
                            break;
                        }
                        '"' => out.push_str("\\\""),
                        _ => out.push(c),
                    }
                }
            }
            ',' => {
                // Drop the comma when the next significant char closes a
                // collection (trailing comma).
                let mut j = i + 1;
                while j < chars.len() && chars[j].is_whitespace() {
                    j += 1;
                }
                if j < chars.len() && (chars[j] == '}' || chars[j] == ']') {
                    i += 1;
                } else {
                    out.push(',');
                    i += 1;
                }
            }
            c if c.is_ascii_alphabetic() => {
                let start = i;
                while i < chars.len() && (chars[i].is_ascii_alphanumeric() || chars[i] == '_') {
                    i += 1;
                }
                let word: String = chars[start..i].iter().collect();
                match word.as_str() {
                    "None" => out.push_str("null"),
                    "True" => out.push_str("true"),
                    "False" => out.push_str("false"),
                    _ => out.push_str(&word),
                }
            }
            c => {
                out.push(c);
                i += 1;
            }
        }
    }

    out
}

// ── Tests ────────────────────────────────────────────────────────────────

//! Literal parsing of rendered expression output.
//!
//! Rendered expressions come back as plain strings; guards and several
//! processors need them as data again. Accepted forms are JSON plus the
//! scripting-style spellings route authors actually write: `True`, `False`,
//! `None`, and single-quoted strings or lists.

use serde_json::Value;

/// Parse a rendered string as a data literal. Returns `None` when the
/// string is not a recognizable literal.
pub fn parse_literal(text: &str) -> Option<Value> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return None;
    }

    match trimmed {
        "True" => return Some(Value::Bool(true)),
        "False" => return Some(Value::Bool(false)),
        "None" => return Some(Value::Null),
        _ => {}
    }

    if let Ok(value) = serde_json::from_str::<Value>(trimmed) {
        return Some(value);
    }

    // Single-quoted containers and scripting-style keywords: normalize to
    // JSON and retry. Only attempted when no double quotes are present, so
    // mixed quoting never produces a silently mangled value.
    if !trimmed.contains('"') {
        if let Ok(value) = serde_json::from_str::<Value>(&normalize(trimmed)) {
            return Some(value);
        }
    }

    None
}

/// Rewrite a scripting-style literal as JSON: single quotes become double
/// quotes, and bare `True`/`False`/`None` tokens become their JSON
/// spellings. String content is never rewritten, so `'True story'` keeps
/// its capital T.
fn normalize(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut word = String::new();
    let mut in_string = false;
    for c in text.chars() {
        if c == '\'' {
            flush_token(&mut out, &mut word);
            in_string = !in_string;
            out.push('"');
        } else if in_string {
            out.push(c);
        } else if c.is_ascii_alphanumeric() || c == '_' {
            word.push(c);
        } else {
            flush_token(&mut out, &mut word);
            out.push(c);
        }
    }
    flush_token(&mut out, &mut word);
    out
}

fn flush_token(out: &mut String, word: &mut String) {
    match word.as_str() {
        "True" => out.push_str("true"),
        "False" => out.push_str("false"),
        "None" => out.push_str("null"),
        _ => out.push_str(word),
    }
    word.clear();
}

/// Parse a rendered guard result as a boolean literal.
///
/// Guards must produce an actual boolean, not merely something truthy;
/// anything else is a configuration defect the caller classifies.
pub fn parse_bool(text: &str) -> Option<bool> {
    match text.trim() {
        "True" | "true" => Some(true),
        "False" | "false" => Some(false),
        _ => None,
    }
}

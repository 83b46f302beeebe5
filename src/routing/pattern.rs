//! URL rule parsing and path matching.
//!
//! # Responsibilities
//! - Parse rule strings with typed placeholders (`<string:id>`, `<int:n>`,
//!   `<path:rest>`)
//! - Match decoded request paths and extract typed view arguments
//! - Produce the specificity sort key used by the route table
//!
//! # Design Decisions
//! - No regex; segment-by-segment comparison keeps matching O(n)
//! - Percent-decoding happens per segment, so an encoded slash never
//!   changes the segment structure
//! - The sort key replaces each placeholder with a space, which sorts
//!   before every printable literal; descending order then prefers
//!   literal-heavy rules among shared prefixes

use percent_encoding::percent_decode_str;
use serde_json::Value;

use crate::error::EngineError;

/// Placeholder converter type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaceholderKind {
    /// Any single segment, captured as a string.
    Str,
    /// A single segment that must parse as an integer.
    Int,
    /// The remainder of the path, slashes included. Must be the last
    /// segment of the rule.
    Path,
}

#[derive(Debug, Clone)]
enum Segment {
    Literal(String),
    Placeholder { kind: PlaceholderKind, name: String },
}

/// A parsed URL rule.
#[derive(Debug, Clone)]
pub struct RulePattern {
    rule: String,
    segments: Vec<Segment>,
    sort_key: String,
}

impl RulePattern {
    /// Parse a rule string. Malformed rules are configuration defects.
    pub fn parse(rule: &str) -> Result<Self, EngineError> {
        if !rule.starts_with('/') {
            return Err(EngineError::config_defect(format!(
                "route rule must start with '/': {rule}"
            )));
        }

        let mut segments = Vec::new();
        let raw_segments: Vec<&str> = if rule == "/" {
            Vec::new()
        } else {
            rule[1..].split('/').collect()
        };

        for (idx, raw) in raw_segments.iter().enumerate() {
            if raw.starts_with('<') && raw.ends_with('>') && raw.len() > 2 {
                let inner = &raw[1..raw.len() - 1];
                let (kind_name, var_name) = match inner.split_once(':') {
                    Some((k, n)) => (k, n),
                    None => ("string", inner),
                };
                let kind = match kind_name {
                    "string" => PlaceholderKind::Str,
                    "int" => PlaceholderKind::Int,
                    "path" => PlaceholderKind::Path,
                    other => {
                        return Err(EngineError::config_defect(format!(
                            "unknown placeholder type '{other}' in rule: {rule}"
                        )))
                    }
                };
                if var_name.is_empty()
                    || !var_name
                        .chars()
                        .all(|c| c.is_ascii_alphanumeric() || c == '_')
                {
                    return Err(EngineError::config_defect(format!(
                        "invalid placeholder name in rule: {rule}"
                    )));
                }
                if kind == PlaceholderKind::Path && idx != raw_segments.len() - 1 {
                    return Err(EngineError::config_defect(format!(
                        "path placeholder must be the final segment: {rule}"
                    )));
                }
                segments.push(Segment::Placeholder {
                    kind,
                    name: var_name.to_string(),
                });
            } else if raw.is_empty() {
                return Err(EngineError::config_defect(format!(
                    "empty segment in rule: {rule}"
                )));
            } else {
                segments.push(Segment::Literal((*raw).to_string()));
            }
        }

        let sort_key = if segments.is_empty() {
            "/".to_string()
        } else {
            segments.iter().fold(String::new(), |mut key, seg| {
                key.push('/');
                match seg {
                    Segment::Literal(text) => key.push_str(text),
                    Segment::Placeholder { .. } => key.push(' '),
                }
                key
            })
        };

        Ok(RulePattern {
            rule: rule.to_string(),
            segments,
            sort_key,
        })
    }

    /// The rule string as authored.
    pub fn rule(&self) -> &str {
        &self.rule
    }

    /// Key for specificity ordering; sort descending.
    pub fn sort_key(&self) -> &str {
        &self.sort_key
    }

    /// Match a request path, returning extracted view arguments on success.
    pub fn matches(&self, path: &str) -> Option<serde_json::Map<String, Value>> {
        let trimmed = if path.len() > 1 {
            path.strip_suffix('/').unwrap_or(path)
        } else {
            path
        };
        let parts: Vec<String> = if trimmed == "/" {
            Vec::new()
        } else {
            trimmed
                .strip_prefix('/')?
                .split('/')
                .map(|seg| percent_decode_str(seg).decode_utf8_lossy().into_owned())
                .collect()
        };

        let mut view_args = serde_json::Map::new();
        let mut part_idx = 0;

        for (seg_idx, segment) in self.segments.iter().enumerate() {
            match segment {
                Segment::Literal(text) => {
                    if parts.get(part_idx)? != text {
                        return None;
                    }
                    part_idx += 1;
                }
                Segment::Placeholder { kind, name } => match kind {
                    PlaceholderKind::Str => {
                        let part = parts.get(part_idx)?;
                        if part.is_empty() {
                            return None;
                        }
                        view_args.insert(name.clone(), Value::String(part.clone()));
                        part_idx += 1;
                    }
                    PlaceholderKind::Int => {
                        let number: i64 = parts.get(part_idx)?.parse().ok()?;
                        view_args.insert(name.clone(), Value::from(number));
                        part_idx += 1;
                    }
                    PlaceholderKind::Path => {
                        // Final segment by construction; consume the rest.
                        debug_assert_eq!(seg_idx, self.segments.len() - 1);
                        if part_idx >= parts.len() {
                            return None;
                        }
                        let rest = parts[part_idx..].join("/");
                        view_args.insert(name.clone(), Value::String(rest));
                        part_idx = parts.len();
                    }
                },
            }
        }

        if part_idx == parts.len() {
            Some(view_args)
        } else {
            None
        }
    }
}

//! Condition evaluation.
//!
//! # Responsibilities
//! - Render each condition's expression against a context
//! - Compare rendered values against their expected sets
//! - Aggregate with match-all or match-any semantics
//!
//! # Design Decisions
//! - Comparison is exact string membership, case-sensitive, no coercion
//! - A record with both or neither expectation key is a 500-class
//!   configuration error, never a silent skip
//! - An empty condition list is a non-match, not vacuously true

use serde::Serialize;

use crate::config::ConditionConfig;
use crate::error::EngineError;
use crate::template::TemplateEngine;

/// Count how many condition records match the context.
///
/// Returns the raw match count when `match_all` is satisfied (or not
/// requested), else 0. Callers that score partial matches (config file
/// selection) use the count directly; boolean callers use [`evaluate`].
pub fn matched_count<S: Serialize>(
    records: &[ConditionConfig],
    templates: &TemplateEngine,
    ctx: &S,
    match_all: bool,
) -> Result<usize, EngineError> {
    let mut matched = 0;
    for record in records {
        let expectation = match (&record.match_when, &record.match_when_not) {
            (Some(allow), None) => Expectation::In(allow),
            (None, Some(deny)) => Expectation::NotIn(deny),
            _ => {
                return Err(EngineError::config_defect(
                    "one (and only one) of 'match_when' or 'match_when_not' must be present",
                ))
            }
        };
        let value = templates.render_string(&record.evaluate, ctx)?;
        let hit = match expectation {
            Expectation::In(allow) => allow.iter().any(|v| v == &value),
            Expectation::NotIn(deny) => !deny.iter().any(|v| v == &value),
        };
        if hit {
            matched += 1;
        }
    }
    if matched == records.len() || !match_all {
        Ok(matched)
    } else {
        Ok(0)
    }
}

/// Evaluate a condition list to a boolean.
///
/// `match_all` requires every record to match; otherwise one match
/// suffices. An empty list evaluates false either way.
pub fn evaluate<S: Serialize>(
    records: &[ConditionConfig],
    templates: &TemplateEngine,
    ctx: &S,
    match_all: bool,
) -> Result<bool, EngineError> {
    Ok(matched_count(records, templates, ctx, match_all)? > 0)
}

enum Expectation<'a> {
    In(&'a [String]),
    NotIn(&'a [String]),
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn templates() -> TemplateEngine {
        let dir = tempfile::tempdir().unwrap();
        TemplateEngine::new(dir.path())
    }

    fn record(v: serde_json::Value) -> ConditionConfig {
        serde_json::from_value(v).unwrap()
    }

    #[test]
    fn test_match_all_requires_every_record() {
        let tmpl = templates();
        let ctx = json!({"kind": "image", "size": "large"});
        let records = vec![
            record(json!({"evaluate": "{{ kind }}", "match_when": ["image", "video"]})),
            record(json!({"evaluate": "{{ size }}", "match_when": ["large"]})),
        ];
        assert!(evaluate(&records, &tmpl, &ctx, true).unwrap());

        let records = vec![
            record(json!({"evaluate": "{{ kind }}", "match_when": ["image"]})),
            record(json!({"evaluate": "{{ size }}", "match_when": ["small"]})),
        ];
        assert!(!evaluate(&records, &tmpl, &ctx, true).unwrap());
        // Match-any still passes on the same list.
        assert!(evaluate(&records, &tmpl, &ctx, false).unwrap());
    }

    #[test]
    fn test_match_when_not() {
        let tmpl = templates();
        let ctx = json!({"kind": "audio"});
        let records = vec![record(
            json!({"evaluate": "{{ kind }}", "match_when_not": ["image", "video"]}),
        )];
        assert!(evaluate(&records, &tmpl, &ctx, true).unwrap());

        let records = vec![record(
            json!({"evaluate": "{{ kind }}", "match_when_not": ["audio"]}),
        )];
        assert!(!evaluate(&records, &tmpl, &ctx, true).unwrap());
    }

    #[test]
    fn test_comparison_is_exact_and_case_sensitive() {
        let tmpl = templates();
        let ctx = json!({"kind": "Image"});
        let records = vec![record(
            json!({"evaluate": "{{ kind }}", "match_when": ["image"]}),
        )];
        assert!(!evaluate(&records, &tmpl, &ctx, true).unwrap());
    }

    #[test]
    fn test_empty_list_is_a_non_match() {
        let tmpl = templates();
        assert!(!evaluate(&[], &tmpl, &json!({}), true).unwrap());
        assert!(!evaluate(&[], &tmpl, &json!({}), false).unwrap());
    }

    #[test]
    fn test_both_or_neither_expectation_is_fatal() {
        let tmpl = templates();
        let both = vec![record(json!({
            "evaluate": "{{ kind }}",
            "match_when": ["a"],
            "match_when_not": ["b"]
        }))];
        let err = evaluate(&both, &tmpl, &json!({}), true).unwrap_err();
        assert_eq!(err.status(), 500);

        let neither = vec![record(json!({"evaluate": "{{ kind }}"}))];
        let err = evaluate(&neither, &tmpl, &json!({}), true).unwrap_err();
        assert_eq!(err.status(), 500);
    }

    #[test]
    fn test_matched_count_scores_partial_matches() {
        let tmpl = templates();
        let ctx = json!({"a": "1", "b": "2"});
        let records = vec![
            record(json!({"evaluate": "{{ a }}", "match_when": ["1"]})),
            record(json!({"evaluate": "{{ b }}", "match_when": ["x"]})),
        ];
        assert_eq!(matched_count(&records, &tmpl, &ctx, false).unwrap(), 1);
        assert_eq!(matched_count(&records, &tmpl, &ctx, true).unwrap(), 0);
    }
}

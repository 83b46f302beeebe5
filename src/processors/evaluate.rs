//! Evaluation processors: condition checks and inline template rendering.

use async_trait::async_trait;
use serde_json::Value;

use crate::conditions;
use crate::config::ConditionConfig;
use crate::error::EngineError;
use crate::processors::{Processor, ProcessorValue, StepContext};

/// `evaluate.conditions` — evaluate a condition list located at the dotted
/// key path named by `conditions`, aggregated per the required bool
/// `match_all`.
///
/// With `abort_on_match`, a positive match becomes a soft miss so the
/// step's `on_fail` policy can turn it into an abort.
pub struct Conditions;

#[async_trait]
impl Processor for Conditions {
    async fn run(&self, step: &StepContext<'_>) -> Result<Option<ProcessorValue>, EngineError> {
        let match_all = match step.param("match_all").and_then(Value::as_bool) {
            Some(flag) => flag,
            None => {
                tracing::warn!(
                    step = %step.name,
                    "evaluate.conditions is missing or has invalid 'match_all'"
                );
                return Ok(None);
            }
        };

        let merged = step.merged();
        let records = step
            .param_str("conditions")
            .and_then(|path| descend(&merged, path))
            .and_then(|found| serde_json::from_value::<Vec<ConditionConfig>>(found.clone()).ok());
        let records = match records {
            Some(records) if !records.is_empty() => records,
            _ => {
                tracing::warn!(step = %step.name, "invalid or empty condition keys");
                return Ok(None);
            }
        };

        let matched =
            conditions::evaluate(&records, &step.services.templates, &merged, match_all)?;
        let abort_on_match = step
            .param("abort_on_match")
            .and_then(Value::as_bool)
            .unwrap_or(false);
        if abort_on_match && matched {
            return Ok(None);
        }
        Ok(Some(ProcessorValue::Json(Value::Bool(matched))))
    }
}

/// `evaluate.template` — render the `value` expression to a string.
///
/// A render failure is logged and becomes a soft miss, not an abort;
/// downstream guards can test for the missing key.
pub struct Template;

#[async_trait]
impl Processor for Template {
    async fn run(&self, step: &StepContext<'_>) -> Result<Option<ProcessorValue>, EngineError> {
        let template = match step.param_str("value") {
            Some(template) => template,
            None => {
                tracing::warn!(step = %step.name, "'value' not set for evaluate.template");
                return Ok(None);
            }
        };
        match step.services.templates.render_string(template, &step.merged()) {
            Ok(rendered) => Ok(Some(ProcessorValue::Rendered(rendered))),
            Err(err) => {
                tracing::warn!(step = %step.name, error = %err, "invalid template provided");
                Ok(None)
            }
        }
    }
}

/// Walk a dotted key path through objects and array indices.
fn descend<'a>(value: &'a Value, path: &str) -> Option<&'a Value> {
    let mut current = value;
    for key in path.split('.') {
        current = match current {
            Value::Object(map) => map.get(key)?,
            Value::Array(items) => items.get(key.parse::<usize>().ok()?)?,
            _ => return None,
        };
    }
    Some(current)
}

//! String manipulation processors.

use async_trait::async_trait;
use serde_json::Value;

use crate::error::EngineError;
use crate::processors::{Processor, ProcessorValue, StepContext};

/// `string.replace` — replace occurrences of `old` with `new` inside the
/// context entry sharing this step's name, preserving the entry's shape.
///
/// Structured values round-trip through their JSON serialization; raw
/// responses are edited in the body with the content-length header kept
/// in sync. A missing source entry is a soft miss.
pub struct Replace;

#[async_trait]
impl Processor for Replace {
    async fn run(&self, step: &StepContext<'_>) -> Result<Option<ProcessorValue>, EngineError> {
        let (old, new) = match (step.param_str("old"), step.param_str("new")) {
            (Some(old), Some(new)) => (old, new),
            _ => {
                return Err(EngineError::config_defect(format!(
                    "string.replace for '{}' requires 'old' and 'new'",
                    step.name
                )))
            }
        };

        let current = match step.context.get(step.name) {
            Some(value) => value,
            None => return Ok(None),
        };

        let replaced = match current {
            ProcessorValue::Rendered(text) => {
                ProcessorValue::Rendered(text.replace(old, new))
            }
            ProcessorValue::Json(Value::String(text)) => {
                ProcessorValue::Json(Value::String(text.replace(old, new)))
            }
            ProcessorValue::Json(value) => {
                let serialized = serde_json::to_string(value).map_err(|e| {
                    EngineError::config_defect(format!("unserializable value for '{}': {e}", step.name))
                })?;
                let edited = serialized.replace(old, new);
                let value: Value = serde_json::from_str(&edited).map_err(|e| {
                    EngineError::config_defect(format!(
                        "string.replace for '{}' broke the value's JSON shape: {e}",
                        step.name
                    ))
                })?;
                ProcessorValue::Json(value)
            }
            ProcessorValue::Raw(raw) => {
                let mut raw = raw.clone();
                let edited = raw.text().replace(old, new);
                raw.body = edited.into_bytes();
                raw.set_header("content-length", raw.body.len().to_string());
                ProcessorValue::Raw(raw)
            }
        };
        Ok(Some(replaced))
    }
}

//! File-backed data processors.

use async_trait::async_trait;
use serde_json::Value;

use crate::conditions;
use crate::config::loader::{load_json_documents, load_json_file};
use crate::config::ConditionConfig;
use crate::error::EngineError;
use crate::processors::{Processor, ProcessorValue, RawResponse, StepContext};

/// `file.load_json` — load the first JSON file found among the declared
/// paths.
///
/// Searches `path` (single) then `paths` (list), all relative to the
/// instance directory. A file that exists but fails to parse still counts
/// as found and contributes an empty object, matching the tolerant loader.
pub struct LoadJson;

#[async_trait]
impl Processor for LoadJson {
    async fn run(&self, step: &StepContext<'_>) -> Result<Option<ProcessorValue>, EngineError> {
        for path in candidate_paths(step) {
            let full = step.services.config.instance_file(&path);
            if full.exists() {
                let value =
                    load_json_file(&full).unwrap_or_else(|| Value::Object(Default::default()));
                return Ok(Some(ProcessorValue::Json(value)));
            }
        }
        Ok(None)
    }
}

/// `file.create_json_response` — wrap `file.load_json` as a raw 200
/// response, so routes can stream JSON instead of rendering it.
pub struct CreateJsonResponse;

#[async_trait]
impl Processor for CreateJsonResponse {
    async fn run(&self, step: &StepContext<'_>) -> Result<Option<ProcessorValue>, EngineError> {
        let mut response = RawResponse::new(200);
        for path in candidate_paths(step) {
            let full = step.services.config.instance_file(&path);
            if full.exists() {
                if let Some(value) = load_json_file(&full) {
                    response = RawResponse::json(&value);
                }
                break;
            }
        }
        Ok(Some(ProcessorValue::Raw(response)))
    }
}

/// `file.load_matched_json` — walk `location` recursively and return the
/// JSON document whose `match_conditions` score highest against the
/// current data.
pub struct LoadMatchedJson;

#[async_trait]
impl Processor for LoadMatchedJson {
    async fn run(&self, step: &StepContext<'_>) -> Result<Option<ProcessorValue>, EngineError> {
        let location = match step.param_str("location") {
            Some(location) => location,
            None => {
                tracing::warn!(step = %step.name, "'location' not set for file.load_matched_json");
                return Ok(None);
            }
        };
        let dir = step.services.config.instance_file(location);
        let merged = step.merged();

        let mut best: Option<(usize, Value)> = None;
        for (path, document) in load_json_documents(&dir, true) {
            let records = match document.get("match_conditions") {
                Some(found) => match serde_json::from_value::<Vec<ConditionConfig>>(found.clone())
                {
                    Ok(records) => records,
                    Err(err) => {
                        tracing::warn!(
                            path = %path.display(),
                            error = %err,
                            "invalid 'match_conditions'; skipping file"
                        );
                        continue;
                    }
                },
                None => continue,
            };
            let score = match conditions::matched_count(
                &records,
                &step.services.templates,
                &merged,
                true,
            ) {
                Ok(score) => score,
                Err(err) => {
                    tracing::warn!(
                        path = %path.display(),
                        error = %err,
                        "unable to evaluate 'match_conditions'; skipping file"
                    );
                    continue;
                }
            };
            tracing::debug!(path = %path.display(), score, "scored match_conditions");
            if score > 0 && best.as_ref().map_or(true, |(top, _)| score > *top) {
                best = Some((score, document));
            }
        }

        Ok(best.map(|(_, document)| ProcessorValue::Json(document)))
    }
}

fn candidate_paths(step: &StepContext<'_>) -> Vec<String> {
    let mut paths = Vec::new();
    if let Some(path) = step.param_str("path") {
        paths.push(path.to_string());
    }
    if let Some(Value::Array(list)) = step.param("paths") {
        paths.extend(list.iter().filter_map(Value::as_str).map(str::to_string));
    }
    paths
}

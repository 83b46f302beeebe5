//! Outbound HTTP processors.
//!
//! These are the pipeline's window onto upstream services. They stay at
//! the input/output contract: a URL in, JSON data or a raw pass-through
//! response out, with upstream failures surfaced as classified aborts.

use async_trait::async_trait;

use crate::error::EngineError;
use crate::processors::{Processor, ProcessorValue, RawResponse, StepContext};

/// `request.api_json` — GET a URL and store the decoded JSON body.
///
/// Connection failures abort 503; an upstream error status passes through
/// as the abort code; an undecodable body is a soft miss.
pub struct ApiJson;

#[async_trait]
impl Processor for ApiJson {
    async fn run(&self, step: &StepContext<'_>) -> Result<Option<ProcessorValue>, EngineError> {
        let response = fetch(step).await?;
        if response.status().as_u16() >= 400 {
            let status = response.status().as_u16();
            tracing::warn!(step = %step.name, status, "upstream returned an error status");
            return Err(EngineError::abort(status));
        }
        match response.json::<serde_json::Value>().await {
            Ok(value) => Ok(Some(ProcessorValue::Json(value))),
            Err(err) => {
                tracing::warn!(step = %step.name, error = %err, "upstream body is not valid JSON");
                Ok(None)
            }
        }
    }
}

/// `request.fetch` — GET a URL and capture the response verbatim (status,
/// headers, body) for pass-through streaming.
///
/// Error statuses are kept in the captured shape; the response assembler
/// decides whether to propagate them.
pub struct Fetch;

#[async_trait]
impl Processor for Fetch {
    async fn run(&self, step: &StepContext<'_>) -> Result<Option<ProcessorValue>, EngineError> {
        let response = fetch(step).await?;
        let mut raw = RawResponse::new(response.status().as_u16());
        for (name, value) in response.headers() {
            if let Ok(text) = value.to_str() {
                raw.set_header(name.as_str(), text);
            }
        }
        raw.body = response
            .bytes()
            .await
            .map_err(|err| {
                tracing::warn!(step = %step.name, error = %err, "failed reading upstream body");
                EngineError::abort(502)
            })?
            .to_vec();
        Ok(Some(ProcessorValue::Raw(raw)))
    }
}

async fn fetch(step: &StepContext<'_>) -> Result<reqwest::Response, EngineError> {
    let url = step.param_str("url").ok_or_else(|| {
        EngineError::config_defect(format!("'url' not set for step '{}'", step.name))
    })?;
    step.services.http.get(url).send().await.map_err(|err| {
        tracing::warn!(step = %step.name, url, error = %err, "upstream request failed");
        EngineError::abort(503)
    })
}

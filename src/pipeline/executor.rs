//! Pipeline execution: the per-step state machine.
//!
//! # Responsibilities
//! - Run a route's steps strictly in declared order
//! - Expand templated parameters against the accumulated context
//! - Evaluate `when` guards and skip gated steps
//! - Dispatch processors and apply per-step failure policy
//!
//! # Design Decisions
//! - No parallelism: a later step's parameters may reference any earlier
//!   step's result by name, so declared order is the ordering guarantee
//! - Expansion and guard failures are pipeline-fatal (broken route config);
//!   an unresolvable processor only skips its own step
//! - The executor is the sole writer of the context; one insert per
//!   successfully stored step

use std::sync::Arc;

use serde_json::Value;

use crate::config::StepConfig;
use crate::error::EngineError;
use crate::pipeline::context::PipelineContext;
use crate::processors::{ProcessorValue, Registry, Services, StepContext};
use crate::routing::CompiledRoute;
use crate::template::parse_bool;

enum StepOutcome {
    Stored(ProcessorValue),
    Skipped,
}

/// Drives one route's pipeline for one request.
pub struct PipelineExecutor {
    services: Arc<Services>,
    registry: Arc<Registry>,
}

impl PipelineExecutor {
    pub fn new(services: Arc<Services>, registry: Arc<Registry>) -> Self {
        PipelineExecutor { services, registry }
    }

    /// Run every step in order, returning the final context. A terminal
    /// error aborts the whole pipeline; nothing partial is rendered.
    pub async fn run(
        &self,
        route: &CompiledRoute,
        mut context: PipelineContext,
    ) -> Result<PipelineContext, EngineError> {
        for step in &route.steps {
            match self.run_step(step, &context).await? {
                StepOutcome::Stored(value) => {
                    tracing::debug!(step = %step.name, processor = %step.processor, "step stored");
                    context.insert(step.name.clone(), value);
                }
                StepOutcome::Skipped => {}
            }
        }
        Ok(context)
    }

    async fn run_step(
        &self,
        step: &StepConfig,
        context: &PipelineContext,
    ) -> Result<StepOutcome, EngineError> {
        // PARAM_EXPAND: templated expansion against the context so far.
        let document = Value::Object(step.params.clone());
        let params = match self.services.templates.render_json(&document, context)? {
            Value::Object(map) => map,
            other => {
                return Err(EngineError::bad_input(format!(
                    "params for step '{}' expanded to a non-object: {other}",
                    step.name
                )))
            }
        };

        // GUARD_CHECK: `when` must render to a boolean literal.
        if let Some(when) = &step.when {
            let rendered = self
                .services
                .templates
                .render_string(when, context)
                .map_err(|err| {
                    EngineError::config_defect(format!(
                        "unable to render 'when' for step '{}': {err}",
                        step.name
                    ))
                })?;
            match parse_bool(&rendered) {
                Some(true) => {}
                Some(false) => {
                    tracing::debug!(step = %step.name, "guard evaluated false; skipping step");
                    return Ok(StepOutcome::Skipped);
                }
                None => {
                    return Err(EngineError::config_defect(format!(
                        "'when' for step '{}' did not evaluate to a boolean: {rendered}",
                        step.name
                    )))
                }
            }
        }

        // DISPATCH: an unknown processor skips the step, nothing more.
        let processor = match self.registry.resolve(&step.processor) {
            Ok(processor) => processor,
            Err(err) => {
                tracing::warn!(
                    step = %step.name,
                    processor = %step.processor,
                    error = %err,
                    "could not resolve processor; skipping step"
                );
                return Ok(StepOutcome::Skipped);
            }
        };

        let step_context = StepContext {
            name: &step.name,
            params,
            context,
            services: &self.services,
        };

        // RESULT_STORE / failure policy.
        match processor.run(&step_context).await {
            Ok(Some(value)) => Ok(StepOutcome::Stored(value)),
            Ok(None) => match step.on_fail {
                Some(code) => {
                    let status = if code == 0 { 503 } else { code };
                    tracing::warn!(
                        step = %step.name,
                        processor = %step.processor,
                        status,
                        "processor produced no result; aborting per on_fail"
                    );
                    Err(EngineError::abort(status))
                }
                None => {
                    tracing::debug!(step = %step.name, "processor produced no result; continuing");
                    Ok(StepOutcome::Skipped)
                }
            },
            Err(err) => match step.on_fail {
                Some(0) => Err(EngineError::abort(err.status())),
                Some(code) => {
                    tracing::warn!(
                        step = %step.name,
                        original = err.status(),
                        overridden = code,
                        "abort code overridden by on_fail"
                    );
                    Err(EngineError::abort(code))
                }
                None => Err(err),
            },
        }
    }
}

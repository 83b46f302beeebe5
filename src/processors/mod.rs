//! Data processor subsystem.
//!
//! # Data Flow
//! ```text
//! step declaration ("processor": "module.action")
//!     → registry.rs (identifier → Arc<dyn Processor>)
//!     → Processor::run(StepContext)
//!     → Option<ProcessorValue> stored in the pipeline context
//! ```
//!
//! # Design Decisions
//! - Processors are registered explicitly at startup, never discovered
//!   by reflection; unknown identifiers are typed resolution errors
//! - `Ok(None)` is a soft miss the step's `on_fail` policy interprets;
//!   `Err` is a classified abort
//! - Processors receive the accumulated context read-only plus their own
//!   expanded parameters; the executor is the only context writer

pub mod evaluate;
pub mod file;
pub mod registry;
pub mod request;
pub mod string;
pub mod value;

use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;

use crate::config::EngineConfig;
use crate::error::EngineError;
use crate::pipeline::context::PipelineContext;
use crate::template::TemplateEngine;

pub use registry::Registry;
pub use value::{ProcessorValue, RawResponse};

/// Shared engine services handed to every processor invocation.
pub struct Services {
    pub config: EngineConfig,
    pub templates: TemplateEngine,
    pub http: reqwest::Client,
}

impl Services {
    pub fn new(config: EngineConfig) -> Result<Self, EngineError> {
        let templates = TemplateEngine::new(&config.templates_path());
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.fetch_timeout_secs))
            .build()
            .map_err(|e| EngineError::config_defect(format!("http client setup failed: {e}")))?;
        Ok(Services {
            config,
            templates,
            http,
        })
    }
}

/// Everything one step invocation can see.
pub struct StepContext<'a> {
    /// The step's declared name (also the key its result is stored under).
    pub name: &'a str,
    /// The step's parameters after templated expansion.
    pub params: serde_json::Map<String, Value>,
    /// Context accumulated from all previously stored steps plus the
    /// reserved request keys.
    pub context: &'a PipelineContext,
    pub services: &'a Services,
}

impl StepContext<'_> {
    pub fn param(&self, key: &str) -> Option<&Value> {
        self.params.get(key)
    }

    pub fn param_str(&self, key: &str) -> Option<&str> {
        self.params.get(key).and_then(Value::as_str)
    }

    /// The full mapping a processor evaluates expressions against: the
    /// accumulated context with the step's own params merged in on top.
    pub fn merged(&self) -> Value {
        let mut merged = match self.context.to_value() {
            Value::Object(map) => map,
            _ => serde_json::Map::new(),
        };
        for (key, value) in &self.params {
            merged.insert(key.clone(), value.clone());
        }
        Value::Object(merged)
    }
}

/// One executable data processor.
#[async_trait]
pub trait Processor: Send + Sync {
    async fn run(&self, step: &StepContext<'_>) -> Result<Option<ProcessorValue>, EngineError>;
}

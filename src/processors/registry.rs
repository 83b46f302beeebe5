//! Processor registry and identifier resolution.
//!
//! # Responsibilities
//! - Map "module.action" identifiers to executable processors
//! - Classify unknown identifiers as typed, non-fatal resolution errors
//!
//! # Design Decisions
//! - Populated once at startup by explicit registration
//! - Lookup failure never aborts a pipeline; the executor logs and skips
//!   the step so partially-available route configs degrade gracefully

use std::collections::HashMap;
use std::sync::Arc;

use crate::error::EngineError;
use crate::processors::{evaluate, file, request, string, Processor};

/// Immutable map from processor identifier to implementation.
pub struct Registry {
    actions: HashMap<String, Arc<dyn Processor>>,
}

impl Registry {
    /// An empty registry; useful for tests exercising resolution failures.
    pub fn new() -> Self {
        Registry {
            actions: HashMap::new(),
        }
    }

    /// A registry with every built-in processor registered.
    pub fn with_builtins() -> Self {
        let mut registry = Registry::new();
        registry.register("file.load_json", Arc::new(file::LoadJson));
        registry.register("file.create_json_response", Arc::new(file::CreateJsonResponse));
        registry.register("file.load_matched_json", Arc::new(file::LoadMatchedJson));
        registry.register("evaluate.conditions", Arc::new(evaluate::Conditions));
        registry.register("evaluate.template", Arc::new(evaluate::Template));
        registry.register("string.replace", Arc::new(string::Replace));
        registry.register("request.api_json", Arc::new(request::ApiJson));
        registry.register("request.fetch", Arc::new(request::Fetch));
        registry
    }

    /// Register (or replace) a processor under a dotted identifier.
    pub fn register(&mut self, id: &str, processor: Arc<dyn Processor>) {
        self.actions.insert(id.to_string(), processor);
    }

    /// Resolve a dotted identifier. Unknown identifiers (or identifiers
    /// with no action part) yield a typed resolution error the caller
    /// treats as non-fatal.
    pub fn resolve(&self, id: &str) -> Result<Arc<dyn Processor>, EngineError> {
        if !id.contains('.') {
            return Err(EngineError::Resolution(format!("{id} (no action defined)")));
        }
        self.actions
            .get(id)
            .cloned()
            .ok_or_else(|| EngineError::Resolution(id.to_string()))
    }

    pub fn len(&self) -> usize {
        self.actions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::with_builtins()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtins_resolve() {
        let registry = Registry::with_builtins();
        assert!(registry.resolve("file.load_json").is_ok());
        assert!(registry.resolve("evaluate.conditions").is_ok());
        assert!(registry.resolve("request.fetch").is_ok());
    }

    #[test]
    fn test_unknown_identifier_is_typed_error() {
        let registry = Registry::with_builtins();
        assert!(matches!(
            registry.resolve("nosuch.action"),
            Err(EngineError::Resolution(_))
        ));
        assert!(matches!(
            registry.resolve("dotless"),
            Err(EngineError::Resolution(_))
        ));
    }
}

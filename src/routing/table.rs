//! Route table: loading, specificity ordering, resolution.
//!
//! # Responsibilities
//! - Collect route documents from the instance routes directory
//! - Compile rules and steps, dropping broken entries with warnings
//! - Sort rules by specificity and resolve request paths to one route
//!
//! # Design Decisions
//! - Immutable after construction (thread-safe without locks)
//! - A missing routes directory yields the built-in welcome fallback; an
//!   existing directory with no matching rules yields 404s instead
//! - First matching rule in specificity order wins; a path match with the
//!   wrong method keeps scanning and reports 405 only if nothing else fits

use std::sync::Arc;

use serde_json::Value;

use crate::config::loader::load_json_documents;
use crate::config::{EngineConfig, RouteConfig, StepConfig};
use crate::error::EngineError;
use crate::routing::pattern::RulePattern;

/// How a route produces its response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutputMode {
    /// Render this template file with the final context.
    Template(String),
    /// Stream the raw response stored under this context key.
    Stream(String),
}

/// A fully validated route shared by all rules it was declared with.
#[derive(Debug)]
pub struct CompiledRoute {
    /// The rules this route was registered under, as authored.
    pub rules: Vec<String>,
    /// Accepted methods, uppercased.
    pub methods: Vec<String>,
    /// Declared output; `None` means the route config is invalid and any
    /// request reaching assembly fails 404-class.
    pub output: Option<OutputMode>,
    /// Ordered pipeline steps.
    pub steps: Vec<StepConfig>,
}

/// Result of resolving a request path.
#[derive(Debug, Clone)]
pub struct RouteMatch {
    pub route: Arc<CompiledRoute>,
    /// Typed values extracted from rule placeholders.
    pub view_args: serde_json::Map<String, Value>,
    /// The rule that matched.
    pub rule: String,
}

struct RouteEntry {
    pattern: RulePattern,
    route: Arc<CompiledRoute>,
}

/// The specificity-ordered route table.
pub struct RouteTable {
    entries: Vec<RouteEntry>,
}

impl RouteTable {
    /// Load all route documents from the configured routes directory.
    pub fn load(config: &EngineConfig) -> Self {
        let dir = config.routes_path();
        if !dir.is_dir() {
            tracing::warn!(
                path = %dir.display(),
                "routes directory not found; using welcome home page route"
            );
            return Self::fallback(config);
        }

        let mut entries = Vec::new();
        for (path, document) in load_json_documents(&dir, false) {
            // A file may hold one route document or a list of them.
            let documents = match document {
                Value::Array(items) => items,
                other => vec![other],
            };
            for doc in documents {
                let has_route_key = doc
                    .as_object()
                    .is_some_and(|m| m.contains_key("route") || m.contains_key("routes"));
                if !has_route_key {
                    continue;
                }
                match serde_json::from_value::<RouteConfig>(doc) {
                    Ok(route_config) => {
                        Self::compile_into(&mut entries, &route_config);
                    }
                    Err(err) => {
                        tracing::warn!(
                            path = %path.display(),
                            error = %err,
                            "invalid route document; skipping"
                        );
                    }
                }
            }
        }

        tracing::info!(rules = entries.len(), "route table loaded");
        entries.sort_by(|a, b| b.pattern.sort_key().cmp(a.pattern.sort_key()));
        RouteTable { entries }
    }

    /// Built-in table used when no route configuration exists at all.
    fn fallback(config: &EngineConfig) -> Self {
        let route = Arc::new(CompiledRoute {
            rules: vec!["/".to_string()],
            methods: vec!["GET".to_string()],
            output: Some(OutputMode::Template(config.default_template.clone())),
            steps: Vec::new(),
        });
        let pattern = RulePattern::parse("/").expect("root rule is always valid");
        RouteTable {
            entries: vec![RouteEntry { pattern, route }],
        }
    }

    fn compile_into(entries: &mut Vec<RouteEntry>, config: &RouteConfig) {
        let rules = config.route.to_vec();
        let output = match (&config.template, &config.stream) {
            (Some(template), None) => Some(OutputMode::Template(template.clone())),
            (None, Some(stream)) => Some(OutputMode::Stream(stream.clone())),
            (Some(template), Some(_)) => {
                tracing::warn!(
                    rules = ?rules,
                    "route declares both 'template' and 'stream'; using template"
                );
                Some(OutputMode::Template(template.clone()))
            }
            (None, None) => {
                tracing::warn!(rules = ?rules, "route declares neither 'template' nor 'stream'");
                None
            }
        };

        let steps: Vec<StepConfig> = config
            .data
            .iter()
            .filter_map(StepConfig::from_document)
            .collect();

        let route = Arc::new(CompiledRoute {
            rules: rules.clone(),
            methods: config
                .methods
                .iter()
                .map(|m| m.to_ascii_uppercase())
                .collect(),
            output,
            steps,
        });

        for rule in &rules {
            match RulePattern::parse(rule) {
                Ok(pattern) => entries.push(RouteEntry {
                    pattern,
                    route: route.clone(),
                }),
                Err(err) => {
                    tracing::warn!(rule = %rule, error = %err, "unparsable route rule; skipping");
                }
            }
        }
    }

    /// Number of registered rules.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Resolve a request path and method to exactly one route.
    pub fn resolve(&self, path: &str, method: &str) -> Result<RouteMatch, EngineError> {
        let method = method.to_ascii_uppercase();
        let mut path_matched = false;

        for entry in &self.entries {
            if let Some(view_args) = entry.pattern.matches(path) {
                if entry.route.methods.iter().any(|m| m == &method) {
                    return Ok(RouteMatch {
                        route: entry.route.clone(),
                        view_args,
                        rule: entry.pattern.rule().to_string(),
                    });
                }
                path_matched = true;
            }
        }

        if path_matched {
            Err(EngineError::MethodNotAllowed {
                method,
                path: path.to_string(),
            })
        } else {
            Err(EngineError::NotFound(path.to_string()))
        }
    }
}

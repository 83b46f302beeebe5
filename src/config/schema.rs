//! Configuration schema definitions.
//!
//! Two layers of configuration exist:
//! - [`EngineConfig`]: the engine's own settings, loaded once from TOML.
//! - Route documents: per-route JSON files under the instance routes
//!   directory, deserialized into [`RouteConfig`] / [`StepConfig`].

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Root configuration for the page assembly engine.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Root of the site instance (route configs, templates, data files).
    pub instance_path: PathBuf,

    /// Route config directory, relative to the instance path.
    pub routes_dir: String,

    /// Template directory, relative to the instance path.
    pub templates_dir: String,

    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,

    /// Per-request timeout in seconds.
    pub request_timeout_secs: u64,

    /// Timeout for outbound processor HTTP calls, in seconds.
    pub fetch_timeout_secs: u64,

    /// Debug mode: failures surface as JSON diagnostics instead of the
    /// error template.
    pub debug: bool,

    /// Template rendered when no route configs exist at all.
    pub default_template: String,

    /// Template rendered for aborted requests in non-debug mode.
    pub error_template: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            instance_path: PathBuf::from("instance"),
            routes_dir: "config/routes".to_string(),
            templates_dir: "templates".to_string(),
            bind_address: "0.0.0.0:8080".to_string(),
            request_timeout_secs: 30,
            fetch_timeout_secs: 10,
            debug: false,
            default_template: "home.html".to_string(),
            error_template: "error.html".to_string(),
        }
    }
}

impl EngineConfig {
    /// Absolute path to the routes directory.
    pub fn routes_path(&self) -> PathBuf {
        self.instance_path.join(&self.routes_dir)
    }

    /// Absolute path to the templates directory.
    pub fn templates_path(&self) -> PathBuf {
        self.instance_path.join(&self.templates_dir)
    }

    /// Resolve a path from a route config against the instance directory.
    /// Leading slashes are stripped so configs can use either form.
    pub fn instance_file(&self, relative: &str) -> PathBuf {
        self.instance_path.join(relative.trim_start_matches('/'))
    }
}

/// One route document as authored in a JSON config file.
#[derive(Debug, Clone, Deserialize)]
pub struct RouteConfig {
    /// One or more URL rules with typed placeholders
    /// (e.g. `/browse/<string:id>`).
    #[serde(alias = "routes")]
    pub route: OneOrMany<String>,

    /// Accepted HTTP methods; defaults to GET. Compared case-insensitively.
    #[serde(default = "default_methods")]
    pub methods: Vec<String>,

    /// Template file to render the final context through.
    #[serde(default)]
    pub template: Option<String>,

    /// Context key whose raw response is streamed back instead of rendering.
    #[serde(default)]
    pub stream: Option<String>,

    /// Ordered data processor steps. Kept as raw documents here; entries
    /// missing mandatory keys are dropped with a warning at table load.
    #[serde(default)]
    pub data: Vec<serde_json::Map<String, serde_json::Value>>,
}

/// A config value that may be written as a scalar or a list.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum OneOrMany<T> {
    One(T),
    Many(Vec<T>),
}

impl<T: Clone> OneOrMany<T> {
    pub fn to_vec(&self) -> Vec<T> {
        match self {
            OneOrMany::One(v) => vec![v.clone()],
            OneOrMany::Many(vs) => vs.clone(),
        }
    }
}

fn default_methods() -> Vec<String> {
    vec!["GET".to_string()]
}

/// A validated pipeline step declaration.
///
/// `name` and `processor` are mandatory; everything else under `params` is
/// processor-specific and may contain templated strings expanded against the
/// accumulated context before dispatch.
#[derive(Debug, Clone)]
pub struct StepConfig {
    /// Context key the step's result is stored under.
    pub name: String,

    /// Dotted processor identifier, "module.action".
    pub processor: String,

    /// Guard expression; the step is skipped when it renders false.
    pub when: Option<String>,

    /// Failure policy: 0 keeps the processor's own abort code, any other
    /// value overrides it, absence propagates the failure verbatim.
    pub on_fail: Option<u16>,

    /// Remaining processor-specific parameters.
    pub params: serde_json::Map<String, serde_json::Value>,
}

impl StepConfig {
    /// Validate a raw step document. Returns `None` (after logging) when a
    /// mandatory key is missing, so one broken entry never sinks the route.
    pub fn from_document(doc: &serde_json::Map<String, serde_json::Value>) -> Option<Self> {
        let name = match doc.get("name").and_then(|v| v.as_str()) {
            Some(n) => n.to_string(),
            None => {
                tracing::warn!(step = ?doc, "step declaration missing 'name'; dropping entry");
                return None;
            }
        };
        let processor = match doc.get("processor").and_then(|v| v.as_str()) {
            Some(p) => p.to_string(),
            None => {
                tracing::warn!(step = %name, "step declaration missing 'processor'; dropping entry");
                return None;
            }
        };
        let when = doc.get("when").and_then(|v| v.as_str()).map(str::to_string);
        let on_fail = match doc.get("on_fail") {
            None => None,
            Some(v) => match v.as_u64() {
                Some(code) if code <= u16::MAX as u64 => Some(code as u16),
                _ => {
                    tracing::error!(
                        step = %name,
                        on_fail = %v,
                        "invalid on_fail, must be an integer status code; dropping entry"
                    );
                    return None;
                }
            },
        };

        let mut params = doc.clone();
        for reserved in ["name", "processor", "when", "on_fail"] {
            params.remove(reserved);
        }

        Some(StepConfig {
            name,
            processor,
            when,
            on_fail,
            params,
        })
    }
}

/// One condition record consumed by the condition evaluator.
///
/// Exactly one of `match_when` / `match_when_not` must be present; the
/// evaluator rejects records with both or neither.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ConditionConfig {
    /// Expression rendered against the context; compared as a string.
    pub evaluate: String,

    /// Accepted rendered values.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub match_when: Option<Vec<String>>,

    /// Rejected rendered values.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub match_when_not: Option<Vec<String>>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn doc(v: serde_json::Value) -> serde_json::Map<String, serde_json::Value> {
        v.as_object().unwrap().clone()
    }

    #[test]
    fn test_route_config_single_rule() {
        let route: RouteConfig = serde_json::from_value(json!({
            "route": "/about",
            "template": "about.html"
        }))
        .unwrap();
        assert_eq!(route.route.to_vec(), vec!["/about"]);
        assert_eq!(route.methods, vec!["GET"]);
        assert!(route.data.is_empty());
    }

    #[test]
    fn test_route_config_rule_list() {
        let route: RouteConfig = serde_json::from_value(json!({
            "route": ["/a", "/b/<string:id>"],
            "stream": "item"
        }))
        .unwrap();
        assert_eq!(route.route.to_vec().len(), 2);
        assert_eq!(route.stream.as_deref(), Some("item"));
    }

    #[test]
    fn test_step_config_extracts_params() {
        let step = StepConfig::from_document(&doc(json!({
            "name": "info",
            "processor": "file.load_json",
            "when": "{{ view_args.id }}",
            "on_fail": 404,
            "paths": ["about.json"]
        })))
        .unwrap();
        assert_eq!(step.name, "info");
        assert_eq!(step.processor, "file.load_json");
        assert_eq!(step.on_fail, Some(404));
        assert!(step.params.contains_key("paths"));
        assert!(!step.params.contains_key("name"));
    }

    #[test]
    fn test_step_config_missing_mandatory_keys() {
        assert!(StepConfig::from_document(&doc(json!({"processor": "x.y"}))).is_none());
        assert!(StepConfig::from_document(&doc(json!({"name": "x"}))).is_none());
    }

    #[test]
    fn test_instance_file_strips_leading_slash() {
        let config = EngineConfig::default();
        assert_eq!(
            config.instance_file("/about.json"),
            config.instance_file("about.json")
        );
    }
}

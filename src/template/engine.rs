//! Expression and template evaluation.
//!
//! # Responsibilities
//! - Render expression strings against a context mapping
//! - Render template files for the response assembler
//! - Expand templated JSON documents (serialize, render, re-parse)
//!
//! # Design Decisions
//! - Undefined variables render as empty string, never an error; several
//!   guards rely on "undefined evaluates falsy" (chainable lenient mode)
//! - Syntax errors are classified apart from other render failures
//! - A JSON re-parse failure after expansion is a 400-class error, since
//!   request-supplied values are what break the intermediate serialization

use std::path::Path;

use minijinja::{Environment, ErrorKind, UndefinedBehavior};
use serde::Serialize;

use crate::error::EngineError;
use crate::template::literal::parse_literal;

/// Template engine wrapping a minijinja environment rooted at the instance
/// templates directory. Immutable after construction, safe to share.
pub struct TemplateEngine {
    env: Environment<'static>,
}

impl TemplateEngine {
    pub fn new(templates_path: &Path) -> Self {
        let mut env = Environment::new();
        env.set_undefined_behavior(UndefinedBehavior::Chainable);
        env.set_loader(minijinja::path_loader(templates_path));
        Self { env }
    }

    /// Render an expression string against a context.
    ///
    /// References to undefined context keys render as empty string; only a
    /// broken template is an error.
    pub fn render_string<S: Serialize>(
        &self,
        template: &str,
        ctx: &S,
    ) -> Result<String, EngineError> {
        self.env
            .render_str(template, ctx)
            .map_err(classify_render_error)
    }

    /// Render an expression and parse the output back into a data literal.
    ///
    /// With `fallback` the raw rendered string is returned when the output
    /// is not a literal; without it, a non-literal is an error.
    pub fn render_literal<S: Serialize>(
        &self,
        template: &str,
        ctx: &S,
        fallback: bool,
    ) -> Result<serde_json::Value, EngineError> {
        let rendered = self.render_string(template, ctx)?;
        match parse_literal(&rendered) {
            Some(value) => Ok(value),
            None if fallback => Ok(serde_json::Value::String(rendered)),
            None => Err(EngineError::config_defect(format!(
                "expression did not evaluate to a literal: {rendered}"
            ))),
        }
    }

    /// Expand every templated string leaf of a JSON document.
    ///
    /// The document is serialized, rendered as one template, and re-parsed.
    /// A re-parse failure means a rendered value corrupted the intermediate
    /// JSON (e.g. a path segment carrying a raw escape sequence) and is
    /// classified as bad input, not an internal defect.
    pub fn render_json<S: Serialize>(
        &self,
        document: &serde_json::Value,
        ctx: &S,
    ) -> Result<serde_json::Value, EngineError> {
        let serialized = serde_json::to_string(document)
            .map_err(|e| EngineError::config_defect(format!("unserializable step config: {e}")))?;
        let rendered = self.render_string(&serialized, ctx)?;
        serde_json::from_str(&rendered).map_err(|e| {
            EngineError::bad_input(format!("expanded config is no longer valid JSON: {e}"))
        })
    }

    /// Render a template file by name. Missing templates are classified
    /// apart from render failures (501 vs 500 at the response boundary).
    pub fn render_file<S: Serialize>(&self, name: &str, ctx: &S) -> Result<String, EngineError> {
        let template = self.env.get_template(name).map_err(|e| {
            if e.kind() == ErrorKind::TemplateNotFound {
                EngineError::TemplateMissing(name.to_string())
            } else {
                classify_render_error(e)
            }
        })?;
        template.render(ctx).map_err(classify_render_error)
    }
}

fn classify_render_error(err: minijinja::Error) -> EngineError {
    match err.kind() {
        ErrorKind::SyntaxError => EngineError::TemplateSyntax(err.to_string()),
        ErrorKind::TemplateNotFound => EngineError::TemplateMissing(err.to_string()),
        _ => EngineError::Template(err.to_string()),
    }
}

//! Response assembly.
//!
//! # Responsibilities
//! - Turn the final pipeline context into the outbound response, per the
//!   route's declared output mode (template render or raw pass-through)
//! - Render classified failures as error responses
//!
//! # Design Decisions
//! - Streamed responses copy only content-type, content-disposition and
//!   content-length; everything else from upstream is dropped
//! - A failure-shaped stream value propagates its own status; a missing
//!   or unusable one is a 503 ("upstream unavailable")
//! - Debug mode (and JSON-preferring clients) get structured diagnostics;
//!   otherwise the configured error template is rendered

use axum::body::Body;
use axum::http::header::{HeaderName, HeaderValue, CONTENT_TYPE};
use axum::http::StatusCode;
use axum::response::Response;
use serde_json::json;

use crate::error::{status_name, EngineError};
use crate::pipeline::PipelineContext;
use crate::processors::{ProcessorValue, Services};
use crate::routing::{CompiledRoute, OutputMode};

/// Headers copied from a streamed upstream response.
const STREAM_HEADER_ALLOWLIST: [&str; 3] =
    ["content-type", "content-disposition", "content-length"];

/// Produce the outbound response for a completed pipeline.
pub fn assemble(
    route: &CompiledRoute,
    context: &PipelineContext,
    services: &Services,
) -> Result<Response, EngineError> {
    match &route.output {
        Some(OutputMode::Template(name)) => render_template(name, context, services),
        Some(OutputMode::Stream(key)) => stream(key, context),
        None => {
            tracing::error!(rules = ?route.rules, "route declares no template or stream output");
            Err(EngineError::NotFound(format!(
                "route '{}' has no output declared",
                route.rules.join(", ")
            )))
        }
    }
}

fn render_template(
    name: &str,
    context: &PipelineContext,
    services: &Services,
) -> Result<Response, EngineError> {
    let html = services.templates.render_file(name, context)?;
    let mut response = Response::new(Body::from(html));
    response.headers_mut().insert(
        CONTENT_TYPE,
        HeaderValue::from_static("text/html; charset=utf-8"),
    );
    Ok(response)
}

fn stream(key: &str, context: &PipelineContext) -> Result<Response, EngineError> {
    let raw = match context.get(key) {
        Some(ProcessorValue::Raw(raw)) => raw,
        Some(_) => {
            tracing::error!(key, "stream variable is not a raw response; unable to stream");
            return Err(EngineError::abort(503));
        }
        None => {
            tracing::error!(key, "stream variable references an unavailable context entry");
            return Err(EngineError::abort(503));
        }
    };
    if !raw.is_ok() {
        return Err(EngineError::abort(raw.status));
    }

    let mut response = Response::new(Body::from(raw.body.clone()));
    *response.status_mut() = StatusCode::from_u16(raw.status).unwrap_or(StatusCode::OK);
    for name in STREAM_HEADER_ALLOWLIST {
        if let Some(value) = raw.header(name) {
            match (
                HeaderName::from_bytes(name.as_bytes()),
                HeaderValue::from_str(value),
            ) {
                (Ok(header), Ok(value)) => {
                    response.headers_mut().insert(header, value);
                }
                _ => {
                    tracing::warn!(header = name, "dropping unrepresentable upstream header");
                }
            }
        }
    }
    Ok(response)
}

/// Render a classified failure as the outbound error response.
pub fn error_response(err: &EngineError, wants_json: bool, services: &Services) -> Response {
    let code = err.status();
    let name = status_name(code);
    let description = err.to_string();
    let status = StatusCode::from_u16(code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

    let (body, content_type) = if services.config.debug || wants_json {
        let payload = json!({"code": code, "name": name, "description": description});
        (payload.to_string(), "application/json")
    } else {
        let page_context = json!({"code": code, "name": name, "description": description});
        match services
            .templates
            .render_file(&services.config.error_template, &page_context)
        {
            Ok(html) => (html, "text/html; charset=utf-8"),
            Err(render_err) => {
                tracing::warn!(
                    template = %services.config.error_template,
                    error = %render_err,
                    "error template unavailable; falling back to plain text"
                );
                (format!("{code} {name}"), "text/plain; charset=utf-8")
            }
        }
    };

    let mut response = Response::new(Body::from(body));
    *response.status_mut() = status;
    if let Ok(value) = HeaderValue::from_str(content_type) {
        response.headers_mut().insert(CONTENT_TYPE, value);
    }
    response
}

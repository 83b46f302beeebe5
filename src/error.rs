//! Engine error taxonomy.
//!
//! # Responsibilities
//! - Classify every failure the engine can produce
//! - Map each class to an outbound HTTP status
//!
//! # Design Decisions
//! - One crate-wide enum; processors and subsystems return it directly
//! - Aborts carry an explicit status so `on_fail` overrides stay trivial
//! - Resolution failures are typed but non-fatal (the executor skips the step)

use thiserror::Error;

/// Classified engine failure. Every variant maps to an HTTP status via
/// [`EngineError::status`].
#[derive(Debug, Error)]
pub enum EngineError {
    /// Malformed route/step/condition declaration. Status is 400 for
    /// request-shaped input corrupting the config, 500 for authoring defects.
    #[error("configuration error: {message}")]
    Configuration { message: String, status: u16 },

    /// Unknown processor identifier. Logged and skipped by the executor,
    /// never surfaced to the client on its own.
    #[error("no processor registered for '{0}'")]
    Resolution(String),

    /// A processor explicitly signaled an HTTP-style failure.
    #[error("processor aborted with status {status}")]
    Abort { status: u16 },

    /// No route rule matches the request path.
    #[error("no route matches '{0}'")]
    NotFound(String),

    /// A rule matched the path but not the request method.
    #[error("method {method} not allowed for '{path}'")]
    MethodNotAllowed { method: String, path: String },

    /// The route names a template file that does not exist.
    #[error("template '{0}' not found")]
    TemplateMissing(String),

    /// The template could not be parsed.
    #[error("template syntax error: {0}")]
    TemplateSyntax(String),

    /// Any other template rendering failure.
    #[error("template rendering failed: {0}")]
    Template(String),
}

impl EngineError {
    /// Configuration defect authored into the route config (500 class).
    pub fn config_defect(message: impl Into<String>) -> Self {
        EngineError::Configuration {
            message: message.into(),
            status: 500,
        }
    }

    /// Configuration breakage caused by request-supplied values (400 class).
    pub fn bad_input(message: impl Into<String>) -> Self {
        EngineError::Configuration {
            message: message.into(),
            status: 400,
        }
    }

    /// Explicit abort with an HTTP-style status code.
    pub fn abort(status: u16) -> Self {
        EngineError::Abort { status }
    }

    /// The HTTP status this failure surfaces as.
    pub fn status(&self) -> u16 {
        match self {
            EngineError::Configuration { status, .. } => *status,
            EngineError::Resolution(_) => 500,
            EngineError::Abort { status } => *status,
            EngineError::NotFound(_) => 404,
            EngineError::MethodNotAllowed { .. } => 405,
            EngineError::TemplateMissing(_) => 501,
            EngineError::TemplateSyntax(_) | EngineError::Template(_) => 500,
        }
    }
}

/// Human-readable name for a status code, used on error pages.
pub fn status_name(code: u16) -> &'static str {
    match code {
        400 => "Bad Request",
        401 => "Unauthorized",
        403 => "Forbidden",
        404 => "Not Found",
        405 => "Method Not Allowed",
        500 => "Internal Server Error",
        501 => "Not Implemented",
        502 => "Bad Gateway",
        503 => "Service Unavailable",
        504 => "Gateway Timeout",
        _ => "Error",
    }
}

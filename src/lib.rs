//! Configuration-driven page assembly engine.
//!
//! Serves web pages declared entirely in JSON route configuration: each
//! route names an ordered pipeline of data processors whose results build
//! up a per-request context, rendered through a template or streamed raw.
//!
//! # Architecture Overview
//!
//! ```text
//!     Client Request
//!     ──────────────▶ http (Axum server, timeout, request ID)
//!                         │
//!                         ▼
//!                     routing (specificity-ordered rule table)
//!                         │ view_args + request components
//!                         ▼
//!                     pipeline (ordered steps, one shared context)
//!                         │ expand params → guard → dispatch → store
//!                         ▼
//!                     processors (file / request / evaluate / string)
//!                         │ final context
//!                         ▼
//!     Client Response ◀── response (template render | raw stream | error)
//!
//!     Cross-cutting: config, template engine, conditions, lifecycle,
//!     observability
//! ```

// Core subsystems
pub mod config;
pub mod http;
pub mod pipeline;
pub mod processors;
pub mod response;
pub mod routing;

// Evaluation
pub mod conditions;
pub mod template;

// Cross-cutting concerns
pub mod error;
pub mod lifecycle;
pub mod observability;

pub use config::EngineConfig;
pub use error::EngineError;
pub use http::{Engine, HttpServer};
pub use lifecycle::Shutdown;

//! Expression evaluation subsystem.
//!
//! Wraps the template language (minijinja) behind a small surface the rest
//! of the engine uses: string rendering, literal round-trips, and templated
//! JSON expansion.

pub mod engine;
pub mod literal;

pub use engine::TemplateEngine;
pub use literal::{parse_bool, parse_literal};

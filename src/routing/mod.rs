//! Route resolution subsystem.
//!
//! Declarative JSON route documents are compiled into an immutable,
//! specificity-ordered table that resolves each request path to exactly
//! one route definition (or the built-in welcome fallback when no route
//! configuration exists at all).

pub mod pattern;
pub mod table;

pub use pattern::RulePattern;
pub use table::{CompiledRoute, OutputMode, RouteMatch, RouteTable};

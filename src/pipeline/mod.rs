//! Pipeline execution subsystem.
//!
//! One request, one isolated context, one strictly sequential pass over
//! the route's declared steps. Nothing here is shared across requests.

pub mod context;
pub mod executor;

pub use context::{PipelineContext, REQUEST_KEY, VIEW_ARGS_KEY};
pub use executor::PipelineExecutor;

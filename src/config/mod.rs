//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! engine config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → EngineConfig (immutable)
//!     → shared via Arc to all subsystems
//!
//! route config files (JSON, one or many per file)
//!     → loader.rs (tolerant per-file parse)
//!     → schema.rs (RouteConfig / StepConfig validation)
//!     → routing::RouteTable (specificity-sorted, immutable)
//! ```
//!
//! # Design Decisions
//! - Engine config is immutable once loaded; changes require a restart
//! - All engine config fields have defaults to allow minimal configs
//! - Route documents are validated tolerantly: a malformed file or step
//!   entry is dropped with a warning rather than failing startup

pub mod loader;
pub mod schema;

pub use schema::ConditionConfig;
pub use schema::EngineConfig;
pub use schema::RouteConfig;
pub use schema::StepConfig;

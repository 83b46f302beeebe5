//! Observability subsystem.
//!
//! Structured logging only: every request carries an x-request-id from the
//! HTTP layer, and all subsystems log through `tracing`.

pub mod logging;

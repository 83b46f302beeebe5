//! HTTP surface of the engine.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, timeout, request ID, trace layers)
//!     → Engine::respond (route resolution → pipeline → assembly)
//!     → response to client (or rendered error page)
//! ```

pub mod server;

pub use server::{Engine, HttpServer};

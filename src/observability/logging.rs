//! Structured logging.
//!
//! # Responsibilities
//! - Initialize the tracing subscriber once at startup
//! - Configure log level from the environment, with sensible defaults
//!
//! # Design Decisions
//! - `RUST_LOG` wins when set; otherwise debug mode widens the default
//!   filter to include tower-http request traces

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Install the global tracing subscriber.
pub fn init(debug: bool) {
    let default_filter = if debug {
        "page_engine=debug,tower_http=debug"
    } else {
        "page_engine=info"
    };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

//! Page engine entry point.
//!
//! Loads configuration, builds the engine, binds the listener, and serves
//! until interrupted.

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use tokio::net::TcpListener;

use page_engine::config::loader::load_config;
use page_engine::{observability, Engine, EngineConfig, HttpServer, Shutdown};

#[derive(Parser, Debug)]
#[command(name = "page-engine", about = "Configuration-driven page assembly engine")]
struct Args {
    /// Path to the engine TOML config file.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Override the bind address (e.g., 127.0.0.1:8080).
    #[arg(long)]
    bind: Option<String>,

    /// Override the instance directory.
    #[arg(long)]
    instance: Option<PathBuf>,

    /// Enable debug mode (JSON error diagnostics, verbose logging).
    #[arg(long)]
    debug: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => load_config(path)?,
        None => EngineConfig::default(),
    };
    if let Some(bind) = args.bind {
        config.bind_address = bind;
    }
    if let Some(instance) = args.instance {
        config.instance_path = instance;
    }
    if args.debug {
        config.debug = true;
    }

    observability::logging::init(config.debug);

    tracing::info!(
        instance = %config.instance_path.display(),
        bind_address = %config.bind_address,
        debug = config.debug,
        "configuration loaded"
    );

    let engine = Arc::new(Engine::new(config.clone())?);
    tracing::info!(rules = engine.routes().len(), "engine ready");

    let listener = TcpListener::bind(&config.bind_address).await?;

    let shutdown = Arc::new(Shutdown::new());
    tokio::spawn({
        let shutdown = shutdown.clone();
        async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::info!("interrupt received; shutting down");
                shutdown.trigger();
            }
        }
    });

    let server = HttpServer::new(engine);
    server.run(listener, shutdown).await?;

    tracing::info!("shutdown complete");
    Ok(())
}

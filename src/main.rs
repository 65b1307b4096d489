//! Cartback API Server
//!
//! Run with: cargo run --bin cartback
//!
//! # Configuration
//!
//! Settings come from a TOML file (`--config`, or the first of
//! `~/.config/cartback/config.toml`, `/etc/cartback/config.toml`,
//! `./config.toml`) with `CARTBACK_*` environment overrides.
//! `RUST_LOG` takes precedence over the configured log level.

use cartback::api::{serve, AppState};
use cartback::config::{Config, LoggingConfig};
use cartback::store::Store;
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser)]
#[command(name = "cartback")]
#[command(author, version, about = "Cart-abandonment recovery API server")]
struct Args {
    /// Config file (skips the default search path)
    #[arg(short, long)]
    config: Option<PathBuf>,
}

fn init_tracing(logging: &LoggingConfig) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "cartback={level},tower_http={level}",
            level = logging.level
        ))
    });
    let json = logging.format.eq_ignore_ascii_case("json");

    tracing_subscriber::registry()
        .with(filter)
        .with(json.then(|| tracing_subscriber::fmt::layer().json()))
        .with((!json).then(tracing_subscriber::fmt::layer))
        .init();
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => Config::load_with_env(path)?,
        None => Config::load_default(),
    };

    init_tracing(&config.logging);

    tracing::info!("Starting Cartback API server v{}", env!("CARGO_PKG_VERSION"));

    let store_config = config.database.store_config();
    match &store_config.path {
        Some(path) => tracing::info!("Database: {:?}", path),
        None => tracing::info!("Database: in memory"),
    }

    let store = Arc::new(Store::open(&store_config)?);
    tracing::info!("Store opened");

    let state = Arc::new(AppState::new(store, config));
    serve(state).await?;

    tracing::info!("Cartback API server stopped");
    Ok(())
}

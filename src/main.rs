//! parley server binary.
//!
//! Loads configuration from CLI arguments and/or a JSON config file,
//! initializes operator logging, binds the listener, and serves until an
//! interrupt or terminate signal arrives.

use std::sync::Arc;

use parley::config::ServerConfig;
use parley::server::Server;
use parley::shutdown::{self, Shutdown};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load configuration
    let config = ServerConfig::load()?;

    // Initialize logging
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    info!(
        port = config.port,
        log_file = %config.log_file_path.display(),
        "Starting parley server"
    );

    let shutdown = Arc::new(Shutdown::new());
    tokio::spawn(shutdown::listen_for_signals(Arc::clone(&shutdown)));

    let server = Server::bind(&config, Arc::clone(&shutdown)).await?;
    server.run().await?;

    Ok(())
}

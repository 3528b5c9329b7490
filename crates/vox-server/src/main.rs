use std::sync::Arc;

use tracing::{info, warn};

use vox_server::{Server, ServerConfig};
use vox_world::{FlatGenerator, World};

#[tokio::main]
async fn main() {
    let config = match ServerConfig::load("server.toml") {
        Ok(c) => c,
        Err(e) => {
            if std::path::Path::new("server.toml").exists() {
                eprintln!("Failed to load server.toml: {e}");
                std::process::exit(1);
            }
            ServerConfig::default()
        }
    };

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.logging.level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .init();

    let seed = if config.world.seed == 0 {
        rand::random()
    } else {
        config.world.seed
    };

    info!(
        "vox-server v{} starting on {}:{}",
        env!("CARGO_PKG_VERSION"),
        config.server.address,
        config.server.port
    );
    info!("Max players: {}", config.server.max_players);
    info!("World seed: {seed}");

    let world = World::new(seed, Box::new(FlatGenerator::default()));
    let server = match Server::bind(config, world).await {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Failed to start server: {e}");
            std::process::exit(1);
        }
    };

    let (shutdown_tx, shutdown_rx) = tokio::sync::watch::channel(false);
    let shutdown_tx = Arc::new(shutdown_tx);
    let shutdown_tx_ctrlc = shutdown_tx.clone();
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                info!("Shutdown signal received");
                let _ = shutdown_tx_ctrlc.send(true);
            }
            Err(e) => warn!("failed to listen for shutdown signal: {e}"),
        }
    });

    server.run(shutdown_rx).await;
    info!("Server shut down.");
}

//! REST API server example
//!
//! Runs playlist-dl with the REST API enabled and shuts down gracefully on
//! Ctrl+C / SIGTERM.
//!
//! ```text
//! SPOTIFY_ACCESS_TOKEN=... cargo run --example rest_api_server
//! ```
//!
//! After starting, you can:
//! - View Swagger UI at http://localhost:8000/swagger-ui/
//! - List playlists via GET http://localhost:8000/playlists
//! - Batch-download via GET http://localhost:8000/playlists/{id}/download-all-stream
//! - Stream lifecycle events via GET http://localhost:8000/events

use playlist_dl::config::{ApiConfig, BatchConfig, Config, ServerIntegrationConfig};
use playlist_dl::{Orchestrator, run_with_shutdown};
use std::net::SocketAddr;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let mut config = match std::env::args().nth(1) {
        Some(path) => Config::from_json_file(path)?,
        None => Config::default(),
    };

    if let Ok(token) = std::env::var("SPOTIFY_ACCESS_TOKEN") {
        config.catalog.access_token = Some(token);
    }

    if config.catalog.access_token.is_none() {
        tracing::warn!("SPOTIFY_ACCESS_TOKEN not set; catalog routes will answer 401");
    }

    let config = Config {
        batch: BatchConfig {
            output_dir: "music".into(),
            ..config.batch
        },
        server: ServerIntegrationConfig {
            api: ApiConfig {
                bind_address: "127.0.0.1:8000".parse::<SocketAddr>()?,
                cors_origins: vec!["*".to_string()],
                ..config.server.api
            },
        },
        ..config
    };

    let orchestrator = Arc::new(Orchestrator::new(config).await?);

    println!("Starting playlist-dl REST API server");
    println!("Swagger UI: http://localhost:8000/swagger-ui/");
    println!("Events stream: http://localhost:8000/events");
    println!();
    println!("Example commands:");
    println!("  # List playlists");
    println!("  curl http://localhost:8000/playlists");
    println!();
    println!("  # Download one track");
    println!("  curl -X POST http://localhost:8000/tracks/download \\");
    println!("    -H 'Content-Type: application/json' \\");
    println!("    -d '{{\"name\": \"Yesterday\", \"artist\": \"The Beatles\"}}' -OJ");
    println!();
    println!("  # Download a whole playlist, streaming progress");
    println!("  curl -N http://localhost:8000/playlists/<id>/download-all-stream");

    run_with_shutdown(orchestrator).await?;

    Ok(())
}

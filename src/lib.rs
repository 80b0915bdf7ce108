//! # playlist-dl
//!
//! Backend library for acquiring audio for the tracks of a playlist.
//!
//! ## Design Philosophy
//!
//! playlist-dl is designed to be:
//! - **Pluggable** - The catalog, media resolver, media fetcher and artifact sink are traits
//! - **Library-first** - No CLI or UI, purely a Rust crate for embedding
//! - **Stream-driven** - Batch jobs report progress as an ordered event stream; the
//!   consumer cancels a job by dropping the stream
//!
//! ## Quick Start
//!
//! ```no_run
//! use futures::StreamExt;
//! use playlist_dl::{Config, Orchestrator, ProgressEvent};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut config = Config::default();
//!     config.catalog.access_token = Some("spotify-access-token".to_string());
//!
//!     let orchestrator = Orchestrator::new(config).await?;
//!
//!     let mut progress = orchestrator.run_batch("37i9dQZF1DXcBWIGoYBM5M");
//!     while let Some(event) = progress.next().await {
//!         match event {
//!             ProgressEvent::Progress { index, total, song, status, .. } => {
//!                 println!("[{index}/{total}] {song}: {status}");
//!             }
//!             ProgressEvent::Done { .. } => println!("done"),
//!             ProgressEvent::Error { error } => eprintln!("batch failed: {error}"),
//!         }
//!     }
//!
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]

/// REST API module
pub mod api;
/// Playlist and track catalog providers
pub mod catalog;
/// Configuration types
pub mod config;
/// Error types
pub mod error;
/// Media resolution and fetching
pub mod media;
/// Filename and search-query derivation
pub mod naming;
/// Single-track and batch acquisition
pub mod orchestrator;
/// Core types and events
pub mod types;

// Re-export commonly used types
pub use catalog::{CatalogProvider, SpotifyCatalog, StaticCatalog};
pub use config::{Config, FileCollisionAction};
pub use error::{AcquisitionError, ApiError, BatchError, Error, ErrorDetail, Result, ToHttpStatus};
pub use media::{
    FetchRequest, HttpMediaBackend, MediaFetcher, MediaResolver, UnavailableMedia, YtDlp,
    YtDlpFetcher, YtDlpResolver,
};
pub use orchestrator::{
    ArtifactSink, BatchJobState, BatchProgress, BatchStream, Components, DirectorySink, JobStatus,
    Orchestrator, percent,
};
pub use types::{
    AcquisitionState, Artifact, ArtifactMetadata, Event, MediaSource, Playlist, ProgressEvent,
    ResolvedMedia, Track, TrackKey, TrackOutcome, TrackView,
};

/// Helper function to serve the API until a termination signal arrives.
///
/// Spawns the API server, waits for a termination signal and then calls the
/// orchestrator's `shutdown()` method, which stops new work from being accepted
/// and waits for in-flight acquisitions.
///
/// - **Unix:** listens for SIGTERM and SIGINT, with fallbacks if signal registration fails.
/// - **Windows/other:** listens for Ctrl+C via `tokio::signal::ctrl_c()`.
///
/// # Example
///
/// ```no_run
/// use playlist_dl::{Config, Orchestrator, run_with_shutdown};
/// use std::sync::Arc;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let orchestrator = Arc::new(Orchestrator::new(Config::default()).await?);
///     run_with_shutdown(orchestrator).await?;
///     Ok(())
/// }
/// ```
pub async fn run_with_shutdown(orchestrator: std::sync::Arc<Orchestrator>) -> Result<()> {
    let server = orchestrator.spawn_api_server();

    tokio::select! {
        _ = wait_for_signal() => {}
        joined = server => {
            return match joined {
                Ok(result) => result,
                Err(e) => Err(Error::ApiServerError(e.to_string())),
            };
        }
    }

    orchestrator.shutdown().await
}

#[cfg(unix)]
async fn wait_for_signal() {
    use tokio::signal::unix::{SignalKind, signal};

    // Registration may fail in restricted environments (containers, tests)
    let sigterm_result = signal(SignalKind::terminate());
    let sigint_result = signal(SignalKind::interrupt());

    match (sigterm_result, sigint_result) {
        (Ok(mut sigterm), Ok(mut sigint)) => {
            tokio::select! {
                _ = sigterm.recv() => {
                    tracing::info!("Received SIGTERM signal");
                }
                _ = sigint.recv() => {
                    tracing::info!("Received SIGINT signal (Ctrl+C)");
                }
            }
        }
        (Err(e), _) => {
            tracing::warn!(error = %e, "Could not register SIGTERM handler, waiting for SIGINT only");
            if let Ok(mut sigint) = signal(SignalKind::interrupt()) {
                sigint.recv().await;
                tracing::info!("Received SIGINT signal (Ctrl+C)");
            } else {
                tracing::error!("Could not register any signal handlers, using ctrl_c fallback");
                tokio::signal::ctrl_c().await.ok();
            }
        }
        (_, Err(e)) => {
            tracing::warn!(error = %e, "Could not register SIGINT handler, waiting for SIGTERM only");
            if let Ok(mut sigterm) = signal(SignalKind::terminate()) {
                sigterm.recv().await;
                tracing::info!("Received SIGTERM signal");
            } else {
                tracing::error!("Could not register any signal handlers, using ctrl_c fallback");
                tokio::signal::ctrl_c().await.ok();
            }
        }
    }
}

#[cfg(not(unix))]
async fn wait_for_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => {
            tracing::info!("Received Ctrl+C signal");
        }
        Err(e) => {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C signal");
        }
    }
}

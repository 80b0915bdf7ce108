//! Acquisition orchestrator split into focused submodules.
//!
//! The `Orchestrator` struct and its methods are organized by concern:
//! - [`single`] - Interactive single-track download (resolve, then fetch)
//! - [`batch`] - Sequential batch download of a playlist with streamed progress
//! - [`registry`] - Busy-track and active-batch bookkeeping shared by both paths
//! - [`stream`] - The consumer handle of a batch's progress events
//! - [`progress`] - Presentation-side progress state folded from events
//! - [`sink`] - Destination of batch artifacts

mod batch;
mod progress;
mod registry;
mod single;
mod sink;
mod stream;

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
pub(crate) mod test_helpers;
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests;

pub use batch::{BatchJobState, JobStatus};
pub use progress::{BatchProgress, percent};
pub use sink::{ArtifactSink, DirectorySink};
pub use stream::BatchStream;

use crate::catalog::{CatalogProvider, SpotifyCatalog};
use crate::config::Config;
use crate::error::{Error, Result};
use crate::media::{MediaFetcher, MediaResolver, UnavailableMedia, YtDlp};
use crate::types::{AcquisitionState, Event, Playlist, Track, TrackView};
use registry::{BatchRegistry, TrackRegistry};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

/// How long [`Orchestrator::shutdown`] waits for in-flight work
const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(30);

/// Buffer of the lifecycle event broadcast channel
const EVENT_CHANNEL_CAPACITY: usize = 1000;

/// Pluggable collaborators for [`Orchestrator::with_components`]
#[derive(Clone)]
pub struct Components {
    /// Playlist and track lookups
    pub catalog: Arc<dyn CatalogProvider>,
    /// Query to media location
    pub resolver: Arc<dyn MediaResolver>,
    /// Media location to artifact
    pub fetcher: Arc<dyn MediaFetcher>,
    /// Destination of batch artifacts
    pub sink: Arc<dyn ArtifactSink>,
}

/// Collaborators the orchestrator drives
#[derive(Clone)]
pub(crate) struct Collaborators {
    pub(crate) catalog: Arc<dyn CatalogProvider>,
    pub(crate) resolver: Arc<dyn MediaResolver>,
    pub(crate) fetcher: Arc<dyn MediaFetcher>,
    pub(crate) sink: Arc<dyn ArtifactSink>,
}

/// Per-track and per-batch job state
#[derive(Clone)]
pub(crate) struct JobState {
    /// Acquisition state of every track that is not idle
    pub(crate) tracks: TrackRegistry,
    /// Running batch jobs keyed by playlist ID
    pub(crate) batches: BatchRegistry,
    /// Flag to indicate whether new work is accepted (set to false during shutdown)
    pub(crate) accepting_new: Arc<AtomicBool>,
}

/// Main orchestrator instance (cloneable - all fields are Arc-wrapped)
#[derive(Clone)]
pub struct Orchestrator {
    /// Event broadcast channel sender (multiple subscribers supported)
    pub(crate) event_tx: tokio::sync::broadcast::Sender<Event>,
    /// Configuration (wrapped in Arc for sharing across tasks)
    pub(crate) config: Arc<Config>,
    /// Catalog, media and sink implementations
    pub(crate) collaborators: Collaborators,
    /// Busy tracks and active batches
    pub(crate) jobs: JobState,
}

impl std::fmt::Debug for Orchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Orchestrator")
            .field("catalog", &self.collaborators.catalog.name())
            .field("resolver", &self.collaborators.resolver.name())
            .field("fetcher", &self.collaborators.fetcher.name())
            .field("sink", &self.collaborators.sink.name())
            .field("accepting", &self.is_accepting())
            .field("active_batches", &self.jobs.batches.len())
            .finish()
    }
}

impl Orchestrator {
    /// Create an orchestrator with the default collaborators
    ///
    /// - [`SpotifyCatalog`] using `config.catalog`
    /// - yt-dlp resolver and fetcher (from `media.ytdlp_path` or PATH); when no
    ///   binary is found every acquisition fails with a track-level error
    /// - [`DirectorySink`] writing under `batch.output_dir`
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid or the output
    /// directories cannot be created.
    pub async fn new(config: Config) -> Result<Self> {
        config.validate()?;

        for dir in [&config.batch.output_dir, &config.media.temp_dir] {
            tokio::fs::create_dir_all(dir).await.map_err(|e| {
                Error::Io(std::io::Error::new(
                    e.kind(),
                    format!("Failed to create directory '{}': {}", dir.display(), e),
                ))
            })?;
        }

        let catalog: Arc<dyn CatalogProvider> = Arc::new(SpotifyCatalog::new(&config.catalog)?);

        let (resolver, fetcher): (Arc<dyn MediaResolver>, Arc<dyn MediaFetcher>) =
            match YtDlp::from_config(&config.media) {
                Some(ytdlp) => {
                    let (resolver, fetcher) = ytdlp.backends(&config.media);
                    (Arc::new(resolver), Arc::new(fetcher))
                }
                None => (Arc::new(UnavailableMedia), Arc::new(UnavailableMedia)),
            };

        let sink: Arc<dyn ArtifactSink> = Arc::new(DirectorySink::new(
            config.batch.output_dir.clone(),
            config.batch.file_collision,
            config.media.audio_format.clone(),
        ));

        Ok(Self::with_components(
            config,
            Components {
                catalog,
                resolver,
                fetcher,
                sink,
            },
        ))
    }

    /// Create an orchestrator around caller-supplied collaborators
    ///
    /// Nothing is validated or created on disk.
    pub fn with_components(config: Config, components: Components) -> Self {
        let (event_tx, _rx) = tokio::sync::broadcast::channel(EVENT_CHANNEL_CAPACITY);

        tracing::info!(
            catalog = components.catalog.name(),
            resolver = components.resolver.name(),
            fetcher = components.fetcher.name(),
            sink = components.sink.name(),
            "Orchestrator initialized"
        );

        Self {
            jobs: JobState {
                tracks: TrackRegistry::new(event_tx.clone()),
                batches: BatchRegistry::default(),
                accepting_new: Arc::new(AtomicBool::new(true)),
            },
            event_tx,
            config: Arc::new(config),
            collaborators: Collaborators {
                catalog: components.catalog,
                resolver: components.resolver,
                fetcher: components.fetcher,
                sink: components.sink,
            },
        }
    }

    /// Subscribe to lifecycle events
    ///
    /// Multiple subscribers are supported. Each subscriber receives all events independently.
    /// A subscriber that falls behind by more than 1000 events receives
    /// `RecvError::Lagged`.
    pub fn subscribe(&self) -> tokio::sync::broadcast::Receiver<Event> {
        self.event_tx.subscribe()
    }

    /// Get the current configuration
    pub fn get_config(&self) -> Arc<Config> {
        Arc::clone(&self.config)
    }

    /// Whether new downloads and batches are accepted
    pub fn is_accepting(&self) -> bool {
        self.jobs.accepting_new.load(Ordering::SeqCst)
    }

    /// Current acquisition state of a track
    pub fn track_state(&self, track: &Track) -> AcquisitionState {
        self.jobs.tracks.state(&track.key())
    }

    /// State of the batch running for `playlist_id`, if any
    pub fn batch_state(&self, playlist_id: &str) -> Option<BatchJobState> {
        self.jobs.batches.get(playlist_id)
    }

    /// Every running batch, ordered by playlist ID
    pub fn active_batches(&self) -> Vec<BatchJobState> {
        self.jobs.batches.snapshot()
    }

    /// Playlists from the catalog
    pub async fn list_playlists(&self) -> Result<Vec<Playlist>> {
        self.collaborators.catalog.list_playlists().await
    }

    /// Tracks of a playlist together with their acquisition state
    ///
    /// `downloaded` is set for tracks the artifact sink already holds for this playlist.
    pub async fn list_tracks(&self, playlist_id: &str) -> Result<Vec<TrackView>> {
        let catalog = &self.collaborators.catalog;
        let playlist = catalog.get_playlist(playlist_id).await?;
        let tracks = catalog.list_tracks(playlist_id).await?;

        let mut views = Vec::with_capacity(tracks.len());
        for track in tracks {
            let state = self.track_state(&track);
            let downloaded = self
                .collaborators
                .sink
                .contains(&playlist, &crate::naming::track_stem(&track))
                .await;
            views.push(TrackView::new(track, state, downloaded));
        }
        Ok(views)
    }

    /// Emit an event to all subscribers
    ///
    /// If there are no active subscribers, the event is silently dropped.
    pub(crate) fn emit_event(&self, event: Event) {
        self.event_tx.send(event).ok();
    }

    /// Gracefully shut down the orchestrator
    ///
    /// 1. Stops accepting new downloads and batches
    /// 2. Running batches stop before their next track and emit an error event
    /// 3. Waits up to 30 seconds for in-flight acquisitions to finish
    /// 4. Broadcasts [`Event::Shutdown`]
    pub async fn shutdown(&self) -> Result<()> {
        tracing::info!("Initiating graceful shutdown");

        self.jobs.accepting_new.store(false, Ordering::SeqCst);
        tracing::info!("Stopped accepting new downloads");

        match tokio::time::timeout(SHUTDOWN_TIMEOUT, self.wait_for_idle()).await {
            Ok(()) => tracing::info!("All in-flight work completed"),
            Err(_) => tracing::warn!(
                active_batches = self.jobs.batches.len(),
                busy_tracks = self.jobs.tracks.busy_count(),
                "Timeout waiting for in-flight work, proceeding with shutdown"
            ),
        }

        self.emit_event(Event::Shutdown);
        tracing::info!("Shutdown complete");
        Ok(())
    }

    async fn wait_for_idle(&self) {
        while !self.jobs.batches.is_empty() || self.jobs.tracks.busy_count() > 0 {
            tokio::time::sleep(Duration::from_millis(50)).await;
        }
    }

    /// Spawn the REST API server in a background task
    ///
    /// Listens on `server.api.bind_address` (default: 127.0.0.1:8000).
    pub fn spawn_api_server(self: &Arc<Self>) -> tokio::task::JoinHandle<Result<()>> {
        let orchestrator = self.clone();
        let config = self.config.clone();

        tokio::spawn(async move { crate::api::start_api_server(orchestrator, config).await })
    }
}

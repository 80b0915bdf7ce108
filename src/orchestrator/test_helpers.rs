//! Shared test helpers: scripted collaborators and a ready-made orchestrator.

use crate::catalog::{CatalogProvider, StaticCatalog};
use crate::config::Config;
use crate::error::{AcquisitionError, Error, Result};
use crate::media::{FetchRequest, MediaFetcher, MediaResolver};
use crate::orchestrator::{ArtifactSink, Components, Orchestrator};
use crate::types::{Artifact, ArtifactMetadata, MediaSource, Playlist, ResolvedMedia, Track};
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// What the scripted resolver answers for a query
#[derive(Clone, Debug)]
pub(crate) enum Scripted {
    Found,
    NotFound,
    Transport(&'static str),
}

/// Resolver answering from a script; unscripted queries are found
#[derive(Default)]
pub(crate) struct ScriptedResolver {
    script: Mutex<HashMap<String, Scripted>>,
    delay: Mutex<Duration>,
    calls: AtomicUsize,
    queries: Mutex<Vec<(String, String)>>,
}

impl ScriptedResolver {
    pub(crate) fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub(crate) fn script(&self, query: &str, outcome: Scripted) {
        self.script
            .lock()
            .unwrap()
            .insert(query.to_string(), outcome);
    }

    pub(crate) fn set_delay(&self, delay: Duration) {
        *self.delay.lock().unwrap() = delay;
    }

    pub(crate) fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub(crate) fn queries(&self) -> Vec<(String, String)> {
        self.queries.lock().unwrap().clone()
    }
}

#[async_trait]
impl MediaResolver for ScriptedResolver {
    async fn resolve(&self, query: &str, author: &str) -> Result<MediaSource> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.queries
            .lock()
            .unwrap()
            .push((query.to_string(), author.to_string()));

        let delay = *self.delay.lock().unwrap();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        let outcome = self
            .script
            .lock()
            .unwrap()
            .get(query)
            .cloned()
            .unwrap_or(Scripted::Found);

        match outcome {
            Scripted::Found => Ok(MediaSource::Found(ResolvedMedia {
                url: format!("https://media.test/{}", urlencoding::encode(query)),
                title: query.to_string(),
            })),
            Scripted::NotFound => Ok(MediaSource::NotFound),
            Scripted::Transport(reason) => Err(Error::Other(reason.to_string())),
        }
    }

    fn name(&self) -> &'static str {
        "scripted"
    }
}

/// Fetcher returning a small payload; URLs containing a failing marker error out
#[derive(Default)]
pub(crate) struct ScriptedFetcher {
    failing: Mutex<HashSet<String>>,
    delay: Mutex<Duration>,
    calls: AtomicUsize,
}

impl ScriptedFetcher {
    pub(crate) fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Fail fetches for media resolved from `query`
    pub(crate) fn fail_for(&self, query: &str) {
        self.failing
            .lock()
            .unwrap()
            .insert(format!("https://media.test/{}", urlencoding::encode(query)));
    }

    pub(crate) fn set_delay(&self, delay: Duration) {
        *self.delay.lock().unwrap() = delay;
    }

    pub(crate) fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl MediaFetcher for ScriptedFetcher {
    async fn fetch(&self, media: &ResolvedMedia, request: &FetchRequest) -> Result<Artifact> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        let delay = *self.delay.lock().unwrap();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        if self.failing.lock().unwrap().contains(&media.url) {
            return Err(AcquisitionError::Fetch("connection reset".to_string()).into());
        }

        Ok(Artifact {
            stem: crate::naming::sanitize_file_name(&request.filename),
            extension: "mp3".to_string(),
            bytes: media.url.as_bytes().to_vec(),
            metadata: ArtifactMetadata {
                title: request.title(),
                artist: request.author.clone(),
                album: request.album.clone(),
            },
        })
    }

    fn name(&self) -> &'static str {
        "scripted"
    }
}

/// Sink keeping delivered artifacts in memory
#[derive(Default)]
pub(crate) struct CollectingSink {
    delivered: Mutex<Vec<(String, Artifact)>>,
    existing: Mutex<HashSet<String>>,
    failing: Mutex<HashSet<String>>,
}

impl CollectingSink {
    pub(crate) fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Report `stem` as already present
    pub(crate) fn preload(&self, stem: &str) {
        self.existing.lock().unwrap().insert(stem.to_string());
    }

    /// Refuse to take artifacts with `stem`
    pub(crate) fn fail_for(&self, stem: &str) {
        self.failing.lock().unwrap().insert(stem.to_string());
    }

    pub(crate) fn delivered_stems(&self) -> Vec<String> {
        self.delivered
            .lock()
            .unwrap()
            .iter()
            .map(|(_, a)| a.stem.clone())
            .collect()
    }
}

#[async_trait]
impl ArtifactSink for CollectingSink {
    async fn deliver(&self, playlist: &Playlist, artifact: Artifact) -> Result<()> {
        if self.failing.lock().unwrap().contains(&artifact.stem) {
            return Err(Error::Io(std::io::Error::other("disk full")));
        }
        self.delivered
            .lock()
            .unwrap()
            .push((playlist.id.clone(), artifact));
        Ok(())
    }

    async fn contains(&self, _playlist: &Playlist, stem: &str) -> bool {
        self.existing.lock().unwrap().contains(stem)
    }

    fn name(&self) -> &'static str {
        "collecting"
    }
}

/// Catalog that fails every lookup
pub(crate) struct FailingCatalog;

#[async_trait]
impl CatalogProvider for FailingCatalog {
    async fn list_playlists(&self) -> Result<Vec<Playlist>> {
        Err(Error::Catalog("catalog unavailable".to_string()))
    }

    async fn get_playlist(&self, _playlist_id: &str) -> Result<Playlist> {
        Err(Error::Catalog("catalog unavailable".to_string()))
    }

    async fn list_tracks(&self, _playlist_id: &str) -> Result<Vec<Track>> {
        Err(Error::Catalog("catalog unavailable".to_string()))
    }

    fn name(&self) -> &'static str {
        "failing"
    }
}

/// Orchestrator wired to scripted collaborators
pub(crate) struct Harness {
    pub(crate) orchestrator: Orchestrator,
    pub(crate) resolver: Arc<ScriptedResolver>,
    pub(crate) fetcher: Arc<ScriptedFetcher>,
    pub(crate) sink: Arc<CollectingSink>,
}

/// Config with short timeouts suitable for tests
pub(crate) fn test_config() -> Config {
    let mut config = Config::default();
    config.media.resolve_timeout = Duration::from_secs(2);
    config.media.fetch_timeout = Duration::from_secs(2);
    config
}

/// `count` tracks named "track 1".."track N" by "artist 1".."artist N"
pub(crate) fn numbered_tracks(count: usize) -> Vec<Track> {
    (1..=count)
        .map(|i| Track::new(format!("track {i}"), format!("artist {i}")))
        .collect()
}

pub(crate) fn create_harness(catalog: Arc<dyn CatalogProvider>, config: Config) -> Harness {
    let resolver = ScriptedResolver::new();
    let fetcher = ScriptedFetcher::new();
    let sink = CollectingSink::new();

    let orchestrator = Orchestrator::with_components(
        config,
        Components {
            catalog,
            resolver: resolver.clone(),
            fetcher: fetcher.clone(),
            sink: sink.clone(),
        },
    );

    Harness {
        orchestrator,
        resolver,
        fetcher,
        sink,
    }
}

/// Harness over a catalog holding playlist "p1" with `tracks`
pub(crate) fn create_test_orchestrator(tracks: Vec<Track>) -> Harness {
    let catalog = StaticCatalog::new().with_playlist(Playlist::new("p1", "Test Playlist"), tracks);
    create_harness(Arc::new(catalog), test_config())
}

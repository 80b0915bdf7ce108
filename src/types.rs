//! Core types for playlist-dl

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::error::AcquisitionError;

/// A playlist as reported by the catalog provider
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Playlist {
    /// Catalog ID of the playlist
    pub id: String,
    /// Display name
    pub name: String,
}

impl Playlist {
    /// Create a new playlist
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }
}

/// A single song, identified by name and artist
///
/// Tracks are owned by the catalog provider. The orchestrator reads their
/// identity and tracks their transient [`AcquisitionState`] separately.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
pub struct Track {
    /// Track name
    pub name: String,
    /// Primary artist
    pub artist: String,
    /// Album name, if known
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub album: Option<String>,
}

impl Track {
    /// Create a track without album information
    pub fn new(name: impl Into<String>, artist: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            artist: artist.into(),
            album: None,
        }
    }

    /// Attach an album name
    pub fn with_album(mut self, album: impl Into<String>) -> Self {
        self.album = Some(album.into());
        self
    }

    /// Identity used for busy tracking
    pub fn key(&self) -> TrackKey {
        TrackKey {
            name: self.name.clone(),
            artist: self.artist.clone(),
        }
    }

    /// `"{name} by {artist}"`, the unsanitized artifact name
    pub fn display_name(&self) -> String {
        format!("{} by {}", self.name, self.artist)
    }
}

/// Identity of a track (name + artist)
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
pub struct TrackKey {
    /// Track name
    pub name: String,
    /// Primary artist
    pub artist: String,
}

/// Transient acquisition state of a track
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum AcquisitionState {
    /// Nothing in flight
    #[default]
    Idle,
    /// Waiting for the resolver
    Searching,
    /// Waiting for the fetcher
    Downloading,
    /// Last attempt failed; a new attempt may be started
    Failed,
}

impl AcquisitionState {
    /// Whether an acquisition is in flight for the track
    pub fn is_busy(&self) -> bool {
        matches!(self, AcquisitionState::Searching | AcquisitionState::Downloading)
    }
}

/// Track as shown by the API: identity plus current state
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct TrackView {
    /// Track name
    pub name: String,
    /// Primary artist
    pub artist: String,
    /// Album name, if known
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub album: Option<String>,
    /// Current acquisition state
    pub state: AcquisitionState,
    /// Whether the playlist's output already holds this track
    #[serde(default)]
    pub downloaded: bool,
}

impl TrackView {
    /// Combine a track with its current state and whether it is already downloaded
    pub fn new(track: Track, state: AcquisitionState, downloaded: bool) -> Self {
        Self {
            name: track.name,
            artist: track.artist,
            album: track.album,
            state,
            downloaded,
        }
    }
}

/// A concrete, downloadable media location
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ResolvedMedia {
    /// URL the fetcher retrieves
    pub url: String,
    /// Title reported by the resolver
    pub title: String,
}

/// Outcome of one resolution attempt
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum MediaSource {
    /// A match was found
    Found(ResolvedMedia),
    /// The resolver answered but had no match
    NotFound,
}

/// Tags carried by an artifact
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ArtifactMetadata {
    /// Track title
    pub title: String,
    /// Artist, if known
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub artist: Option<String>,
    /// Album, if known
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub album: Option<String>,
}

/// Downloaded media for one track
///
/// Ownership passes to the caller (or the batch's sink); the orchestrator
/// keeps no reference once it has been produced.
#[derive(Clone, PartialEq, Eq)]
pub struct Artifact {
    /// Sanitized file stem, `"{name} by {artist}"`
    pub stem: String,
    /// File extension without the dot (e.g. "mp3")
    pub extension: String,
    /// Media payload
    pub bytes: Vec<u8>,
    /// Tags describing the payload
    pub metadata: ArtifactMetadata,
}

impl Artifact {
    /// `"{stem}.{extension}"`
    pub fn file_name(&self) -> String {
        format!("{}.{}", self.stem, self.extension)
    }

    /// MIME type derived from the extension
    pub fn content_type(&self) -> &'static str {
        match self.extension.to_ascii_lowercase().as_str() {
            "mp3" => "audio/mpeg",
            "m4a" | "aac" => "audio/mp4",
            "opus" | "ogg" | "vorbis" => "audio/ogg",
            "flac" => "audio/flac",
            "wav" => "audio/wav",
            "webm" => "audio/webm",
            _ => "application/octet-stream",
        }
    }

    /// Payload size in bytes
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Whether the payload is empty
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

impl std::fmt::Debug for Artifact {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Artifact")
            .field("stem", &self.stem)
            .field("extension", &self.extension)
            .field("bytes", &self.bytes.len())
            .field("metadata", &self.metadata)
            .finish()
    }
}

/// Result of processing one track inside a batch
#[derive(Clone, Debug, PartialEq)]
pub enum TrackOutcome {
    /// Artifact fetched and delivered; the fetch took `duration` seconds
    Downloaded {
        /// Seconds spent fetching
        duration: f64,
    },
    /// The sink already holds this track; nothing was fetched
    AlreadyPresent,
    /// Track-level failure; the batch continues
    Failed(AcquisitionError),
}

impl TrackOutcome {
    /// Status string for the progress event
    pub fn status(&self) -> String {
        match self {
            TrackOutcome::Downloaded { .. } => "downloaded".to_string(),
            TrackOutcome::AlreadyPresent => "skipped".to_string(),
            TrackOutcome::Failed(error) => error.status_label(),
        }
    }

    /// Fetch duration in seconds, rounded to two decimals; 0 unless downloaded
    pub fn duration(&self) -> f64 {
        match self {
            TrackOutcome::Downloaded { duration } => round_seconds(*duration),
            TrackOutcome::AlreadyPresent | TrackOutcome::Failed(_) => 0.0,
        }
    }

    /// Whether the track failed
    pub fn is_failure(&self) -> bool {
        matches!(self, TrackOutcome::Failed(_))
    }
}

fn round_seconds(secs: f64) -> f64 {
    if secs.is_finite() && secs > 0.0 {
        (secs * 100.0).round() / 100.0
    } else {
        0.0
    }
}

/// One event on a batch's progress stream
///
/// Serialized untagged, so the wire form is exactly one of
/// `{index, total, song, status, duration}`, `{done: true}` or `{error}`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(untagged)]
pub enum ProgressEvent {
    /// One track finished (successfully or not)
    Progress {
        /// 1-based position in the playlist
        index: usize,
        /// Number of tracks in the batch
        total: usize,
        /// Track name
        song: String,
        /// "downloaded", "skipped", "not found", "search error: ...", "error: ..."
        status: String,
        /// Seconds spent fetching, two decimals
        duration: f64,
    },
    /// All tracks processed
    Done {
        /// Always `true`
        done: bool,
    },
    /// Batch aborted
    Error {
        /// Human-readable reason
        error: String,
    },
}

impl ProgressEvent {
    /// The terminal success event
    pub fn done() -> Self {
        ProgressEvent::Done { done: true }
    }

    /// A terminal failure event
    pub fn error(message: impl Into<String>) -> Self {
        ProgressEvent::Error {
            error: message.into(),
        }
    }

    /// Progress event for a processed track
    pub fn progress(index: usize, total: usize, track: &Track, outcome: &TrackOutcome) -> Self {
        ProgressEvent::Progress {
            index,
            total,
            song: track.name.clone(),
            status: outcome.status(),
            duration: outcome.duration(),
        }
    }

    /// Whether the stream ends after this event
    pub fn is_terminal(&self) -> bool {
        !matches!(self, ProgressEvent::Progress { .. })
    }
}

/// Lifecycle event broadcast to every subscriber
///
/// Subscribe with [`Orchestrator::subscribe`](crate::Orchestrator::subscribe).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    /// A track's acquisition state changed
    TrackStateChanged {
        /// Track name
        name: String,
        /// Track artist
        artist: String,
        /// New state
        state: AcquisitionState,
    },

    /// A batch job started processing tracks
    BatchStarted {
        /// Playlist ID
        playlist_id: String,
        /// Number of tracks
        total: usize,
    },

    /// A batch job processed every track
    BatchFinished {
        /// Playlist ID
        playlist_id: String,
        /// Tracks delivered
        succeeded: usize,
        /// Tracks that failed
        failed: usize,
    },

    /// A batch job aborted with a batch-level error
    BatchFailed {
        /// Playlist ID
        playlist_id: String,
        /// Error message
        error: String,
    },

    /// The consumer went away before the batch finished
    BatchCancelled {
        /// Playlist ID
        playlist_id: String,
        /// Tracks processed before cancellation
        processed: usize,
    },

    /// The orchestrator stopped accepting new work
    Shutdown,
}

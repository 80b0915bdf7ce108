//! Error types for playlist-dl
//!
//! This module provides the error taxonomy for the library:
//! - Track-level acquisition errors, which never abort a batch
//! - Batch-level errors, which abort the whole batch
//! - HTTP status code mapping and structured JSON bodies for the API

use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;

/// Result type alias for playlist-dl operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for playlist-dl
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error with context about which setting is invalid
    #[error("configuration error: {message}")]
    Config {
        /// Human-readable error message describing the configuration issue
        message: String,
        /// The configuration key that caused the error (e.g., "media.ytdlp_path")
        key: Option<String>,
    },

    /// Track-level acquisition failure (resolve, fetch, delivery, busy)
    #[error("acquisition error: {0}")]
    Acquisition(#[from] AcquisitionError),

    /// Batch-level failure (catalog lookup, concurrent batch)
    #[error("batch error: {0}")]
    Batch(#[from] BatchError),

    /// Catalog provider failed to answer a lookup
    #[error("catalog error: {0}")]
    Catalog(String),

    /// The catalog requires credentials that were not configured
    #[error("not authenticated")]
    NotAuthenticated,

    /// Requested playlist or resource does not exist
    #[error("not found: {0}")]
    NotFound(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Network error
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// External tool execution failed (yt-dlp)
    #[error("external tool error: {0}")]
    ExternalTool(String),

    /// Operation not supported (missing binary, not configured, etc.)
    #[error("not supported: {0}")]
    NotSupported(String),

    /// API server error
    #[error("API server error: {0}")]
    ApiServerError(String),

    /// Shutdown in progress - not accepting new work
    #[error("shutdown in progress: not accepting new downloads")]
    ShuttingDown,

    /// Other error
    #[error("{0}")]
    Other(String),
}

/// Errors scoped to a single track
///
/// Inside a batch these are recorded in the progress event for that track and
/// the batch moves on. In an interactive download they clear the track's busy
/// flag and surface to the caller.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AcquisitionError {
    /// The resolver answered, but had no match for the query
    #[error("no media found for \"{query}\"")]
    ResolveNotFound {
        /// The search query that produced no match
        query: String,
    },

    /// The resolver could not be reached or failed while searching
    #[error("media search failed: {0}")]
    ResolveTransport(String),

    /// Retrieving the media payload failed
    #[error("media fetch failed: {0}")]
    Fetch(String),

    /// The artifact was fetched but could not be handed over
    #[error("artifact delivery failed: {0}")]
    Delivery(String),

    /// The track already has an acquisition in flight
    #[error("\"{name}\" by {artist} is already being downloaded")]
    TrackBusy {
        /// Track name
        name: String,
        /// Track artist
        artist: String,
    },
}

impl AcquisitionError {
    /// Whether a fresh attempt may succeed where this one failed
    ///
    /// `ResolveNotFound` is terminal for the track; transport, fetch and
    /// delivery failures are transient. Nothing in this crate retries
    /// automatically; this only informs the caller.
    pub fn is_transient(&self) -> bool {
        match self {
            AcquisitionError::ResolveNotFound { .. } => false,
            AcquisitionError::ResolveTransport(_)
            | AcquisitionError::Fetch(_)
            | AcquisitionError::Delivery(_)
            | AcquisitionError::TrackBusy { .. } => true,
        }
    }

    /// Status string written into the progress event for this failure
    pub fn status_label(&self) -> String {
        match self {
            AcquisitionError::ResolveNotFound { .. } => "not found".to_string(),
            AcquisitionError::ResolveTransport(reason) => format!("search error: {reason}"),
            AcquisitionError::Fetch(reason) => format!("error: {reason}"),
            AcquisitionError::Delivery(reason) => format!("delivery error: {reason}"),
            AcquisitionError::TrackBusy { .. } => "skipped: already in progress".to_string(),
        }
    }
}

/// Errors that abort a whole batch job
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BatchError {
    /// The playlist or its tracks could not be looked up
    #[error("catalog lookup failed: {0}")]
    CatalogLookup(String),

    /// The playlist does not exist in the catalog
    #[error("playlist {playlist_id} not found")]
    PlaylistNotFound {
        /// Requested playlist ID
        playlist_id: String,
    },

    /// A batch for this playlist is already running
    #[error("a batch download for playlist {playlist_id} is already running")]
    ConcurrentBatchRejected {
        /// Playlist whose batch is already active
        playlist_id: String,
    },
}

/// API error response format
///
/// # Example JSON Response
///
/// ```json
/// {
///   "error": {
///     "code": "track_busy",
///     "message": "acquisition error: \"Song\" by Artist is already being downloaded",
///     "details": { "name": "Song", "artist": "Artist" }
///   }
/// }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ApiError {
    /// The error details
    pub error: ErrorDetail,
}

/// Detailed error information for API responses
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ErrorDetail {
    /// Machine-readable error code (e.g., "not_found", "track_busy")
    pub code: String,

    /// Human-readable error message
    pub message: String,

    /// Optional additional context about the error
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl ApiError {
    /// Create a new API error with code and message
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error: ErrorDetail {
                code: code.into(),
                message: message.into(),
                details: None,
            },
        }
    }

    /// Create a "validation error" error
    pub fn validation(message: impl Into<String>) -> Self {
        Self::new("validation_error", message)
    }

    /// Create an "unauthorized" error
    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new("unauthorized", message)
    }
}

/// Convert errors to HTTP status codes for API responses
pub trait ToHttpStatus {
    /// Get the HTTP status code for this error
    fn status_code(&self) -> u16;

    /// Get the machine-readable error code
    fn error_code(&self) -> &str;
}

impl ToHttpStatus for Error {
    fn status_code(&self) -> u16 {
        match self {
            Error::Config { .. } => 400,
            Error::NotAuthenticated => 401,

            Error::NotFound(_) => 404,
            Error::Acquisition(AcquisitionError::ResolveNotFound { .. }) => 404,
            Error::Batch(BatchError::PlaylistNotFound { .. }) => 404,

            Error::Acquisition(AcquisitionError::TrackBusy { .. }) => 409,
            Error::Batch(BatchError::ConcurrentBatchRejected { .. }) => 409,

            Error::Io(_) => 500,
            Error::Serialization(_) => 500,
            Error::ApiServerError(_) => 500,
            Error::Other(_) => 500,
            Error::Acquisition(AcquisitionError::Delivery(_)) => 500,

            // Upstream collaborators failed
            Error::Acquisition(AcquisitionError::ResolveTransport(_)) => 502,
            Error::Acquisition(AcquisitionError::Fetch(_)) => 502,
            Error::Batch(BatchError::CatalogLookup(_)) => 502,
            Error::Catalog(_) => 502,
            Error::Network(_) => 502,

            Error::ShuttingDown => 503,
            Error::ExternalTool(_) => 503,

            Error::NotSupported(_) => 501,
        }
    }

    fn error_code(&self) -> &str {
        match self {
            Error::Config { .. } => "config_error",
            Error::Acquisition(e) => match e {
                AcquisitionError::ResolveNotFound { .. } => "media_not_found",
                AcquisitionError::ResolveTransport(_) => "resolve_failed",
                AcquisitionError::Fetch(_) => "fetch_failed",
                AcquisitionError::Delivery(_) => "delivery_failed",
                AcquisitionError::TrackBusy { .. } => "track_busy",
            },
            Error::Batch(e) => match e {
                BatchError::CatalogLookup(_) => "catalog_lookup_failed",
                BatchError::PlaylistNotFound { .. } => "playlist_not_found",
                BatchError::ConcurrentBatchRejected { .. } => "batch_already_running",
            },
            Error::Catalog(_) => "catalog_error",
            Error::NotAuthenticated => "not_authenticated",
            Error::NotFound(_) => "not_found",
            Error::Io(_) => "io_error",
            Error::Network(_) => "network_error",
            Error::Serialization(_) => "serialization_error",
            Error::ExternalTool(_) => "external_tool_error",
            Error::NotSupported(_) => "not_supported",
            Error::ApiServerError(_) => "api_server_error",
            Error::ShuttingDown => "shutting_down",
            Error::Other(_) => "internal_error",
        }
    }
}

impl From<Error> for ApiError {
    fn from(error: Error) -> Self {
        let code = error.error_code().to_string();
        let message = error.to_string();

        let details = match &error {
            Error::Acquisition(AcquisitionError::ResolveNotFound { query }) => {
                Some(serde_json::json!({ "query": query }))
            }
            Error::Acquisition(AcquisitionError::TrackBusy { name, artist }) => {
                Some(serde_json::json!({ "name": name, "artist": artist }))
            }
            Error::Batch(BatchError::PlaylistNotFound { playlist_id })
            | Error::Batch(BatchError::ConcurrentBatchRejected { playlist_id }) => {
                Some(serde_json::json!({ "playlist_id": playlist_id }))
            }
            Error::Config { key: Some(key), .. } => Some(serde_json::json!({ "key": key })),
            _ => None,
        };

        ApiError {
            error: ErrorDetail {
                code,
                message,
                details,
            },
        }
    }
}

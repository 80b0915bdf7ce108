//! Route handlers for the REST API
//!
//! Handlers are organized by domain:
//! - [`catalog`] — Playlists and tracks
//! - [`media`] — Search, fetch and single-track downloads
//! - [`batch`] — Whole-playlist downloads and running jobs
//! - [`system`] — Health, events, OpenAPI

use serde::{Deserialize, Serialize};

mod batch;
mod catalog;
mod media;
mod system;

pub use batch::*;
pub use catalog::*;
pub use media::*;
pub use system::*;

// ============================================================================
// Query/Request Types (shared across handlers)
// ============================================================================

/// Query parameters for GET /youtube/search
#[derive(Debug, Deserialize, Serialize, utoipa::IntoParams, utoipa::ToSchema)]
#[into_params(parameter_in = Query)]
pub struct SearchQuery {
    /// Free-text search query, e.g. "Yesterday Lyrics"
    pub query: String,
    /// Artist hint appended to the query
    #[serde(default)]
    pub author: Option<String>,
}

/// Response for GET /youtube/search
///
/// A miss is reported as `{"title": "Not Found", "url": "No video found"}`.
#[derive(Debug, Deserialize, Serialize, PartialEq, Eq, utoipa::ToSchema)]
pub struct SearchResult {
    /// Media title, or "Not Found"
    pub title: String,
    /// Media URL, or "No video found"
    pub url: String,
}

/// Request body for POST /youtube/download-audio
#[derive(Debug, Deserialize, Serialize, utoipa::ToSchema)]
pub struct DownloadAudioRequest {
    /// Media URL from a previous search
    pub url: String,
    /// Desired file name without extension
    pub filename: String,
    /// Artist tag
    #[serde(default)]
    pub author: Option<String>,
    /// Album tag
    #[serde(default)]
    pub album: Option<String>,
}

//! Trait definitions for media resolution and fetching

use crate::types::{Artifact, MediaSource, ResolvedMedia, Track};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Artist tag written when the request carries no author
pub(crate) const DEFAULT_ARTIST_TAG: &str = "unknown artist";

/// Album tag written when the request carries no album
pub(crate) const DEFAULT_ALBUM_TAG: &str = "downloaded single";

/// What the fetched artifact should be called and tagged with
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct FetchRequest {
    /// Desired file name without extension; sanitized by the fetcher
    pub filename: String,
    /// Artist tag
    #[serde(default)]
    pub author: Option<String>,
    /// Album tag
    #[serde(default)]
    pub album: Option<String>,
}

impl FetchRequest {
    /// Request named `"{name} by {artist}"` and tagged from the track
    pub fn for_track(track: &Track) -> Self {
        Self {
            filename: track.display_name(),
            author: Some(track.artist.clone()),
            album: track.album.clone(),
        }
    }

    /// Title tag: the filename with underscores read as spaces
    pub fn title(&self) -> String {
        self.filename.replace('_', " ").trim().to_string()
    }

    /// Artist tag, falling back to "unknown artist"
    pub fn artist_tag(&self) -> &str {
        self.author
            .as_deref()
            .filter(|a| !a.trim().is_empty())
            .unwrap_or(DEFAULT_ARTIST_TAG)
    }

    /// Album tag, falling back to "downloaded single"
    pub fn album_tag(&self) -> &str {
        self.album
            .as_deref()
            .filter(|a| !a.trim().is_empty())
            .unwrap_or(DEFAULT_ALBUM_TAG)
    }
}

/// Turns a search query into a media location
///
/// Implementations perform exactly one outbound lookup per call and never
/// retry on their own.
///
/// # Examples
///
/// ```no_run
/// use playlist_dl::media::{MediaResolver, YtDlp};
/// use playlist_dl::config::MediaConfig;
/// use playlist_dl::types::MediaSource;
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let (resolver, _) = YtDlp::from_path().expect("yt-dlp not found").backends(&MediaConfig::default());
/// match resolver.resolve("Yesterday Lyrics", "The Beatles").await? {
///     MediaSource::Found(media) => println!("{} -> {}", media.title, media.url),
///     MediaSource::NotFound => println!("no match"),
/// }
/// # Ok(())
/// # }
/// ```
#[async_trait]
pub trait MediaResolver: Send + Sync {
    /// Search for media matching `query`, narrowed by `author`
    ///
    /// # Returns
    ///
    /// `MediaSource::NotFound` when the backend answered without a match.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend could not be reached or failed while
    /// searching. This is distinct from a `NotFound` answer.
    async fn resolve(&self, query: &str, author: &str) -> crate::Result<MediaSource>;

    /// Human-readable name for logging
    fn name(&self) -> &'static str;
}

/// Retrieves the payload for a resolved media location
#[async_trait]
pub trait MediaFetcher: Send + Sync {
    /// Fetch `media` and package it as an artifact named per `request`
    ///
    /// # Errors
    ///
    /// Returns an error if the transfer fails. No partial artifact is ever
    /// returned.
    async fn fetch(&self, media: &ResolvedMedia, request: &FetchRequest)
    -> crate::Result<Artifact>;

    /// Human-readable name for logging
    fn name(&self) -> &'static str;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_for_track_uses_display_name_and_tags() {
        let track = Track::new("Yesterday", "The Beatles").with_album("Help!");
        let request = FetchRequest::for_track(&track);

        assert_eq!(request.filename, "Yesterday by The Beatles");
        assert_eq!(request.artist_tag(), "The Beatles");
        assert_eq!(request.album_tag(), "Help!");
    }

    #[test]
    fn missing_tags_fall_back() {
        let request = FetchRequest {
            filename: "Some_Song".to_string(),
            author: None,
            album: Some("  ".to_string()),
        };

        assert_eq!(request.title(), "Some Song");
        assert_eq!(request.artist_tag(), "unknown artist");
        assert_eq!(request.album_tag(), "downloaded single");
    }
}

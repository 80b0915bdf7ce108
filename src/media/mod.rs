//! Media resolution and fetching
//!
//! A track becomes audio in two steps:
//!
//! 1. A [`MediaResolver`] turns a search query into a concrete media location
//!    ([`MediaSource::Found`](crate::types::MediaSource::Found)) or reports that
//!    nothing matched ([`MediaSource::NotFound`](crate::types::MediaSource::NotFound)).
//!    Transport failures are errors, never `NotFound`.
//! 2. A [`MediaFetcher`] retrieves the payload for a resolved location and
//!    returns a complete [`Artifact`](crate::types::Artifact), or an error with
//!    no partial artifact.
//!
//! ## Implementations
//!
//! - [`YtDlpResolver`] / [`YtDlpFetcher`]: shell out to the `yt-dlp` binary
//! - [`HttpMediaBackend`]: a remote service exposing `/youtube/search` and
//!   `/youtube/download-audio`
//! - [`UnavailableMedia`]: stand-in when no backend is available
//!
//! ## Usage
//!
//! ```no_run
//! use playlist_dl::media::{FetchRequest, MediaFetcher, MediaResolver, YtDlp};
//! use playlist_dl::config::MediaConfig;
//! use playlist_dl::types::{MediaSource, Track};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = MediaConfig::default();
//!     let ytdlp = YtDlp::from_path().expect("yt-dlp not found in PATH");
//!     let (resolver, fetcher) = ytdlp.backends(&config);
//!
//!     let track = Track::new("Yesterday", "The Beatles");
//!     if let MediaSource::Found(media) = resolver.resolve("Yesterday Lyrics", &track.artist).await? {
//!         let artifact = fetcher.fetch(&media, &FetchRequest::for_track(&track)).await?;
//!         std::fs::write(artifact.file_name(), &artifact.bytes)?;
//!     }
//!     Ok(())
//! }
//! ```

mod http;
mod noop;
mod parser;
mod traits;
mod ytdlp;

pub use http::{HttpMediaBackend, NOT_FOUND_TITLE, NOT_FOUND_URL};
pub use noop::UnavailableMedia;
pub use traits::{FetchRequest, MediaFetcher, MediaResolver};
pub use ytdlp::{YtDlp, YtDlpFetcher, YtDlpResolver};

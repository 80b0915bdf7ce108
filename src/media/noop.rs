//! Media backend stand-in for graceful degradation

use super::traits::{FetchRequest, MediaFetcher, MediaResolver};
use crate::types::{Artifact, MediaSource, ResolvedMedia};
use async_trait::async_trait;

/// Resolver and fetcher used when no media backend is available
///
/// Every call fails with `Error::NotSupported`, which the orchestrator reports
/// as a track-level failure. Playlists can still be browsed.
#[derive(Clone, Copy, Debug, Default)]
pub struct UnavailableMedia;

#[async_trait]
impl MediaResolver for UnavailableMedia {
    async fn resolve(&self, _query: &str, _author: &str) -> crate::Result<MediaSource> {
        Err(crate::Error::NotSupported(
            "media search requires the yt-dlp binary. \
             Configure media.ytdlp_path or ensure yt-dlp is in PATH."
                .into(),
        ))
    }

    fn name(&self) -> &'static str {
        "unavailable"
    }
}

#[async_trait]
impl MediaFetcher for UnavailableMedia {
    async fn fetch(
        &self,
        _media: &ResolvedMedia,
        _request: &FetchRequest,
    ) -> crate::Result<Artifact> {
        Err(crate::Error::NotSupported(
            "media download requires the yt-dlp binary. \
             Configure media.ytdlp_path or ensure yt-dlp is in PATH."
                .into(),
        ))
    }

    fn name(&self) -> &'static str {
        "unavailable"
    }
}

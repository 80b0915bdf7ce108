//! Interactive single-track acquisition.

use crate::error::{AcquisitionError, Error, Result};
use crate::media::FetchRequest;
use crate::naming::search_query;
use crate::types::{Artifact, MediaSource, ResolvedMedia, Track};
use std::time::{Duration, Instant};
use tokio::time::timeout;

use super::Orchestrator;
use super::registry::TrackClaim;

/// A fetched artifact and how long the fetch took
pub(crate) struct Acquired {
    pub(crate) artifact: Artifact,
    pub(crate) fetch_time: Duration,
}

/// Keep a track-level error as is; wrap anything else with `wrap`
fn classify(e: Error, wrap: fn(String) -> AcquisitionError) -> AcquisitionError {
    match e {
        Error::Acquisition(error) => error,
        other => wrap(other.to_string()),
    }
}

impl Orchestrator {
    /// Resolve and fetch one track
    ///
    /// The track moves `Idle → Searching → Downloading → Idle` on success, or
    /// ends in `Failed` on any error. Exactly one resolve attempt is made,
    /// followed by at most one fetch; nothing is retried.
    ///
    /// # Errors
    ///
    /// - `AcquisitionError::TrackBusy` if the track already has an acquisition
    ///   in flight (from another call or a running batch). The call is rejected,
    ///   not queued, and the in-flight acquisition is unaffected.
    /// - `AcquisitionError::ResolveNotFound` if the resolver found no match
    /// - `AcquisitionError::ResolveTransport` / `Fetch` on collaborator failures
    ///   or timeouts
    /// - `Error::ShuttingDown` once [`shutdown`](Self::shutdown) has been called
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use playlist_dl::{Config, Orchestrator, Track};
    ///
    /// # #[tokio::main]
    /// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
    /// let orchestrator = Orchestrator::new(Config::default()).await?;
    ///
    /// let artifact = orchestrator
    ///     .download_track(&Track::new("Yesterday", "The Beatles"))
    ///     .await?;
    /// std::fs::write(artifact.file_name(), &artifact.bytes)?;
    /// # Ok(())
    /// # }
    /// ```
    pub async fn download_track(&self, track: &Track) -> Result<Artifact> {
        if !self.is_accepting() {
            return Err(Error::ShuttingDown);
        }

        let claim = self.jobs.tracks.try_claim(track).ok_or_else(|| {
            tracing::debug!(track = %track.name, artist = %track.artist, "Rejected download: track is busy");
            AcquisitionError::TrackBusy {
                name: track.name.clone(),
                artist: track.artist.clone(),
            }
        })?;

        match self.acquire(track, &claim).await {
            Ok(acquired) => {
                claim.finish(true);
                tracing::info!(
                    track = %track.name,
                    artist = %track.artist,
                    bytes = acquired.artifact.len(),
                    fetch_secs = acquired.fetch_time.as_secs_f64(),
                    "Track downloaded"
                );
                Ok(acquired.artifact)
            }
            Err(e) => {
                claim.finish(false);
                tracing::warn!(track = %track.name, artist = %track.artist, error = %e, "Track download failed");
                Err(e.into())
            }
        }
    }

    /// One resolve, then at most one fetch, each bounded by its timeout
    pub(crate) async fn acquire(
        &self,
        track: &Track,
        claim: &TrackClaim,
    ) -> std::result::Result<Acquired, AcquisitionError> {
        let query = search_query(track, &self.config.media.search_suffix);

        let media = match self.resolve_bounded(&query, &track.artist).await? {
            MediaSource::Found(media) => media,
            MediaSource::NotFound => return Err(AcquisitionError::ResolveNotFound { query }),
        };
        tracing::debug!(track = %track.name, url = %media.url, title = %media.title, "Resolved media");

        claim.downloading();

        let started = Instant::now();
        let artifact = self
            .fetch_bounded(&media, &FetchRequest::for_track(track))
            .await?;

        Ok(Acquired {
            artifact,
            fetch_time: started.elapsed(),
        })
    }

    async fn resolve_bounded(
        &self,
        query: &str,
        author: &str,
    ) -> std::result::Result<MediaSource, AcquisitionError> {
        let limit = self.config.media.resolve_timeout;

        timeout(limit, self.collaborators.resolver.resolve(query, author))
            .await
            .map_err(|_| {
                AcquisitionError::ResolveTransport(format!(
                    "search timed out after {:.1}s",
                    limit.as_secs_f64()
                ))
            })?
            .map_err(|e| classify(e, AcquisitionError::ResolveTransport))
    }

    async fn fetch_bounded(
        &self,
        media: &ResolvedMedia,
        request: &FetchRequest,
    ) -> std::result::Result<Artifact, AcquisitionError> {
        let limit = self.config.media.fetch_timeout;

        timeout(limit, self.collaborators.fetcher.fetch(media, request))
            .await
            .map_err(|_| {
                AcquisitionError::Fetch(format!(
                    "download timed out after {:.1}s",
                    limit.as_secs_f64()
                ))
            })?
            .map_err(|e| classify(e, AcquisitionError::Fetch))
    }

    /// Search for media directly, without busy tracking
    ///
    /// Backs the `/youtube/search` endpoint. `NotFound` is a normal answer.
    pub async fn search_media(&self, query: &str, author: &str) -> Result<MediaSource> {
        Ok(self.resolve_bounded(query, author).await?)
    }

    /// Fetch an already-resolved media location, without busy tracking
    ///
    /// Backs the `/youtube/download-audio` endpoint.
    pub async fn fetch_media(&self, media: &ResolvedMedia, request: &FetchRequest) -> Result<Artifact> {
        if !self.is_accepting() {
            return Err(Error::ShuttingDown);
        }
        Ok(self.fetch_bounded(media, request).await?)
    }
}

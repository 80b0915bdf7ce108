//! Batch acquisition over every track of a playlist.

use crate::config::FileCollisionAction;
use crate::error::{AcquisitionError, BatchError, Error};
use crate::types::{Event, Playlist, ProgressEvent, Track, TrackOutcome};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use utoipa::ToSchema;

use super::Orchestrator;
use super::registry::BatchClaim;
use super::stream::BatchStream;

/// Lifecycle status of a batch job
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    /// Looking up the playlist and its tracks
    Starting,
    /// Processing tracks
    Running,
    /// Every track processed
    Done,
    /// Aborted by a batch-level error
    Failed,
    /// The consumer went away
    Cancelled,
}

/// Snapshot of a running batch job
///
/// Only the job itself mutates its state; readers get copies through
/// [`Orchestrator::batch_state`] and [`Orchestrator::active_batches`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct BatchJobState {
    /// Playlist being processed
    pub playlist_id: String,
    /// Number of tracks (0 until the track list is known)
    pub total: usize,
    /// 1-based index of the track being processed (0 before the first)
    pub current_index: usize,
    /// Name of the track being processed
    pub current_track: String,
    /// Lifecycle status
    pub status: JobStatus,
    /// Whether the job is still running
    pub active: bool,
}

impl BatchJobState {
    pub(crate) fn starting(playlist_id: &str) -> Self {
        Self {
            playlist_id: playlist_id.to_string(),
            total: 0,
            current_index: 0,
            current_track: String::new(),
            status: JobStatus::Starting,
            active: true,
        }
    }
}

impl Orchestrator {
    /// Start a batch download of every track in a playlist
    ///
    /// Returns immediately; the job runs on a spawned task and reports through
    /// the returned stream. Events arrive in playlist order, one
    /// [`ProgressEvent::Progress`] per track with a 1-based `index`, then a
    /// single [`ProgressEvent::Done`]. A batch-level failure yields one
    /// [`ProgressEvent::Error`] and ends the stream without `Done`.
    ///
    /// Only one batch per playlist runs at a time. Starting another for the same
    /// playlist yields a stream holding a single error event.
    ///
    /// Dropping the stream cancels the job: no new track is started once the
    /// consumer is gone. A resolve or fetch already in flight is allowed to
    /// finish and its result is discarded.
    ///
    /// Must be called from within a Tokio runtime.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use futures::StreamExt;
    /// use playlist_dl::{Config, Orchestrator, ProgressEvent, BatchProgress};
    ///
    /// # #[tokio::main]
    /// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
    /// let orchestrator = Orchestrator::new(Config::default()).await?;
    /// let mut progress = BatchProgress::default();
    ///
    /// let mut events = orchestrator.run_batch("37i9dQZF1DXcBWIGoYBM5M");
    /// while let Some(event) = events.next().await {
    ///     progress.apply(&event);
    ///     println!("{}% {:?}", progress.percent, progress.current_song);
    /// }
    /// # Ok(())
    /// # }
    /// ```
    pub fn run_batch(&self, playlist_id: &str) -> BatchStream {
        let (tx, rx) = mpsc::channel(self.config.batch.channel_capacity.max(1));
        let stream = BatchStream::new(rx);

        if !self.is_accepting() {
            tx.try_send(ProgressEvent::error(Error::ShuttingDown.to_string()))
                .ok();
            return stream;
        }

        let Some(claim) = self.jobs.batches.try_start(playlist_id) else {
            let error = BatchError::ConcurrentBatchRejected {
                playlist_id: playlist_id.to_string(),
            };
            tracing::warn!(playlist_id, "Rejected batch: one is already running for this playlist");
            tx.try_send(ProgressEvent::error(error.to_string())).ok();
            return stream;
        };

        let orchestrator = self.clone();
        let playlist_id = playlist_id.to_string();
        tokio::spawn(async move { orchestrator.drive_batch(playlist_id, claim, tx).await });

        stream
    }

    async fn drive_batch(
        self,
        playlist_id: String,
        claim: BatchClaim,
        tx: mpsc::Sender<ProgressEvent>,
    ) {
        let (playlist, tracks) = match self.load_playlist(&playlist_id).await {
            Ok(loaded) => loaded,
            Err(e) => {
                tracing::warn!(playlist_id = %playlist_id, error = %e, "Batch aborted: catalog lookup failed");
                self.abort_batch(claim, &playlist_id, e.to_string(), &tx)
                    .await;
                return;
            }
        };

        let total = tracks.len();
        claim.update(|state| {
            state.total = total;
            state.status = JobStatus::Running;
        });
        self.emit_event(Event::BatchStarted {
            playlist_id: playlist_id.clone(),
            total,
        });
        tracing::info!(playlist_id = %playlist_id, playlist = %playlist.name, total, "Starting batch download");

        let delay = self.config.batch.event_delay;
        let mut succeeded = 0usize;
        let mut failed = 0usize;

        for (position, track) in tracks.iter().enumerate() {
            let index = position + 1;

            if tx.is_closed() {
                self.cancel_batch(claim, &playlist_id, position);
                return;
            }
            if !self.is_accepting() {
                self.abort_batch(claim, &playlist_id, Error::ShuttingDown.to_string(), &tx)
                    .await;
                return;
            }

            claim.update(|state| {
                state.current_index = index;
                state.current_track = track.name.clone();
            });

            let outcome = self.process_track(&playlist, track).await;
            match &outcome {
                TrackOutcome::Failed(error) => {
                    failed += 1;
                    tracing::warn!(
                        playlist_id = %playlist_id,
                        index,
                        total,
                        track = %track.name,
                        artist = %track.artist,
                        error = %error,
                        "Track failed, continuing with next"
                    );
                }
                _ => {
                    succeeded += 1;
                    tracing::info!(
                        playlist_id = %playlist_id,
                        index,
                        total,
                        track = %track.name,
                        artist = %track.artist,
                        status = %outcome.status(),
                        "Track processed"
                    );
                }
            }

            if tx
                .send(ProgressEvent::progress(index, total, track, &outcome))
                .await
                .is_err()
            {
                self.cancel_batch(claim, &playlist_id, index);
                return;
            }

            if !delay.is_zero() && index < total {
                tokio::time::sleep(delay).await;
            }
        }

        // Release the slot before `Done` so a consumer may immediately start another run
        claim.finish(JobStatus::Done);
        self.emit_event(Event::BatchFinished {
            playlist_id: playlist_id.clone(),
            succeeded,
            failed,
        });
        tracing::info!(playlist_id = %playlist_id, succeeded, failed, "Batch download finished");

        tx.send(ProgressEvent::done()).await.ok();
    }

    async fn load_playlist(&self, playlist_id: &str) -> Result<(Playlist, Vec<Track>), BatchError> {
        let catalog = &self.collaborators.catalog;

        let lookup = async {
            let playlist = catalog.get_playlist(playlist_id).await?;
            let tracks = catalog.list_tracks(playlist_id).await?;
            Ok::<_, Error>((playlist, tracks))
        };

        lookup.await.map_err(|e| match e {
            Error::NotFound(_) => BatchError::PlaylistNotFound {
                playlist_id: playlist_id.to_string(),
            },
            other => BatchError::CatalogLookup(other.to_string()),
        })
    }

    /// Acquire one track and hand it to the sink; never aborts the batch
    async fn process_track(&self, playlist: &Playlist, track: &Track) -> TrackOutcome {
        let sink = &self.collaborators.sink;

        if self.config.batch.file_collision != FileCollisionAction::Overwrite
            && sink.contains(playlist, &crate::naming::track_stem(track)).await
        {
            return TrackOutcome::AlreadyPresent;
        }

        let Some(claim) = self.jobs.tracks.try_claim(track) else {
            return TrackOutcome::Failed(AcquisitionError::TrackBusy {
                name: track.name.clone(),
                artist: track.artist.clone(),
            });
        };

        let acquired = match self.acquire(track, &claim).await {
            Ok(acquired) => acquired,
            Err(e) => {
                claim.finish(false);
                return TrackOutcome::Failed(e);
            }
        };

        match sink.deliver(playlist, acquired.artifact).await {
            Ok(()) => {
                claim.finish(true);
                TrackOutcome::Downloaded {
                    duration: acquired.fetch_time.as_secs_f64(),
                }
            }
            Err(e) => {
                claim.finish(false);
                TrackOutcome::Failed(match e {
                    Error::Acquisition(error) => error,
                    other => AcquisitionError::Delivery(other.to_string()),
                })
            }
        }
    }

    async fn abort_batch(
        &self,
        claim: BatchClaim,
        playlist_id: &str,
        message: String,
        tx: &mpsc::Sender<ProgressEvent>,
    ) {
        claim.finish(JobStatus::Failed);
        self.emit_event(Event::BatchFailed {
            playlist_id: playlist_id.to_string(),
            error: message.clone(),
        });
        tx.send(ProgressEvent::error(message)).await.ok();
    }

    fn cancel_batch(&self, claim: BatchClaim, playlist_id: &str, processed: usize) {
        claim.finish(JobStatus::Cancelled);
        self.emit_event(Event::BatchCancelled {
            playlist_id: playlist_id.to_string(),
            processed,
        });
        tracing::info!(playlist_id, processed, "Batch cancelled: consumer closed the stream");
    }
}

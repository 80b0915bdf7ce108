//! Busy-track and active-batch bookkeeping shared by both acquisition paths.

use crate::types::{AcquisitionState, Event, Track, TrackKey};
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::broadcast;

use super::batch::{BatchJobState, JobStatus};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    // State stays consistent across a panicking holder; every update is a single insert/remove
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Most `Failed` tracks remembered at once; older failures fall back to `Idle`
pub(crate) const MAX_FAILED_TRACKS: usize = 1024;

/// Non-idle track states, plus the order in which tracks failed
#[derive(Default)]
struct TrackTable {
    states: HashMap<TrackKey, AcquisitionState>,
    failed: VecDeque<TrackKey>,
}

impl TrackTable {
    fn put(&mut self, key: &TrackKey, state: AcquisitionState) {
        let previous = if state == AcquisitionState::Idle {
            self.states.remove(key)
        } else {
            self.states.insert(key.clone(), state)
        };

        if previous == Some(AcquisitionState::Failed) {
            self.failed.retain(|k| k != key);
        }
        if state == AcquisitionState::Failed {
            self.failed.push_back(key.clone());
            while self.failed.len() > MAX_FAILED_TRACKS {
                if let Some(oldest) = self.failed.pop_front() {
                    self.states.remove(&oldest);
                }
            }
        }
    }
}

/// Per-track acquisition state, keyed by track identity
///
/// Claiming a track is the only way to move it out of `Idle`/`Failed`, so at
/// most one acquisition per track is in flight across interactive downloads
/// and every batch. Only the latest [`MAX_FAILED_TRACKS`] failures are kept.
#[derive(Clone)]
pub(crate) struct TrackRegistry {
    table: Arc<Mutex<TrackTable>>,
    event_tx: broadcast::Sender<Event>,
}

impl TrackRegistry {
    pub(crate) fn new(event_tx: broadcast::Sender<Event>) -> Self {
        Self {
            table: Arc::new(Mutex::new(TrackTable::default())),
            event_tx,
        }
    }

    /// Current state; unknown tracks are `Idle`
    pub(crate) fn state(&self, key: &TrackKey) -> AcquisitionState {
        lock(&self.table).states.get(key).copied().unwrap_or_default()
    }

    /// Number of tracks with an acquisition in flight
    pub(crate) fn busy_count(&self) -> usize {
        lock(&self.table).states.values().filter(|s| s.is_busy()).count()
    }

    /// Move the track to `Searching`, unless it is already busy
    pub(crate) fn try_claim(&self, track: &Track) -> Option<TrackClaim> {
        let key = track.key();
        {
            let mut table = lock(&self.table);
            if table.states.get(&key).is_some_and(AcquisitionState::is_busy) {
                return None;
            }
            table.put(&key, AcquisitionState::Searching);
        }
        self.emit(&key, AcquisitionState::Searching);

        Some(TrackClaim {
            registry: self.clone(),
            key,
            finished: false,
        })
    }

    fn set(&self, key: &TrackKey, state: AcquisitionState) {
        lock(&self.table).put(key, state);
        self.emit(key, state);
    }

    fn emit(&self, key: &TrackKey, state: AcquisitionState) {
        self.event_tx
            .send(Event::TrackStateChanged {
                name: key.name.clone(),
                artist: key.artist.clone(),
                state,
            })
            .ok();
    }
}

/// Exclusive hold on one track's acquisition
///
/// Dropping an unfinished claim (e.g. the caller's future was abandoned)
/// returns the track to `Idle`.
pub(crate) struct TrackClaim {
    registry: TrackRegistry,
    key: TrackKey,
    finished: bool,
}

impl TrackClaim {
    /// Resolution succeeded; the fetch is starting
    pub(crate) fn downloading(&self) {
        self.registry.set(&self.key, AcquisitionState::Downloading);
    }

    /// Release the track, marking the outcome
    pub(crate) fn finish(mut self, success: bool) {
        let state = if success {
            AcquisitionState::Idle
        } else {
            AcquisitionState::Failed
        };
        self.registry.set(&self.key, state);
        self.finished = true;
    }
}

impl Drop for TrackClaim {
    fn drop(&mut self) {
        if !self.finished {
            self.registry.set(&self.key, AcquisitionState::Idle);
        }
    }
}

/// Active batch jobs, one per playlist at most
#[derive(Clone, Default)]
pub(crate) struct BatchRegistry {
    active: Arc<Mutex<HashMap<String, BatchJobState>>>,
}

impl BatchRegistry {
    /// Register a batch for `playlist_id`; `None` if one is already active
    pub(crate) fn try_start(&self, playlist_id: &str) -> Option<BatchClaim> {
        let mut active = lock(&self.active);
        if active.contains_key(playlist_id) {
            return None;
        }
        active.insert(playlist_id.to_string(), BatchJobState::starting(playlist_id));

        Some(BatchClaim {
            registry: self.clone(),
            playlist_id: playlist_id.to_string(),
        })
    }

    pub(crate) fn get(&self, playlist_id: &str) -> Option<BatchJobState> {
        lock(&self.active).get(playlist_id).cloned()
    }

    pub(crate) fn snapshot(&self) -> Vec<BatchJobState> {
        let mut jobs: Vec<_> = lock(&self.active).values().cloned().collect();
        jobs.sort_by(|a, b| a.playlist_id.cmp(&b.playlist_id));
        jobs
    }

    pub(crate) fn len(&self) -> usize {
        lock(&self.active).len()
    }

    pub(crate) fn is_empty(&self) -> bool {
        lock(&self.active).is_empty()
    }
}

/// Ownership of one playlist's batch slot; released on drop
pub(crate) struct BatchClaim {
    registry: BatchRegistry,
    playlist_id: String,
}

impl BatchClaim {
    /// Mutate this job's state; only the owning job holds a claim
    pub(crate) fn update(&self, f: impl FnOnce(&mut BatchJobState)) {
        if let Some(state) = lock(&self.registry.active).get_mut(&self.playlist_id) {
            f(state);
        }
    }

    /// Final status before the slot is released
    pub(crate) fn finish(self, status: JobStatus) {
        self.update(|state| {
            state.status = status;
            state.active = false;
        });
    }
}

impl Drop for BatchClaim {
    fn drop(&mut self) {
        lock(&self.registry.active).remove(&self.playlist_id);
    }
}

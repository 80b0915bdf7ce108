//! Presentation-side view of a batch, driven only by its events.

use crate::types::ProgressEvent;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Whole-number completion percentage for `index` of `total`
///
/// Always in `0..=100`; `total == 0` yields 0.
///
/// # Examples
///
/// ```
/// use playlist_dl::percent;
///
/// assert_eq!(percent(1, 3), 33);
/// assert_eq!(percent(2, 3), 67);
/// assert_eq!(percent(0, 0), 0);
/// assert_eq!(percent(5, 4), 100);
/// ```
#[must_use]
pub fn percent(index: usize, total: usize) -> u8 {
    if total == 0 {
        return 0;
    }
    let ratio = index as f64 / total as f64 * 100.0;
    if !ratio.is_finite() {
        return 0;
    }
    ratio.round().clamp(0.0, 100.0) as u8
}

/// Batch progress as a UI would show it
///
/// Owned by the presentation layer and updated only through
/// [`apply`](Self::apply); nothing else mutates it.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct BatchProgress {
    /// A batch is running
    pub active: bool,
    /// Name of the most recently processed track
    pub current_song: Option<String>,
    /// 1-based index of the most recently processed track
    pub current_index: usize,
    /// Number of tracks in the batch
    pub total: usize,
    /// Completion percentage, 0 to 100
    pub percent: u8,
    /// Set when the batch ended with an error
    pub error: Option<String>,
    /// Set when the batch ended with `Done`
    pub finished: bool,
}

impl BatchProgress {
    /// State for a batch that has just been requested
    pub fn started() -> Self {
        Self {
            active: true,
            ..Self::default()
        }
    }

    /// Fold one event into the view
    pub fn apply(&mut self, event: &ProgressEvent) {
        match event {
            ProgressEvent::Progress {
                index, total, song, ..
            } => {
                self.active = true;
                self.current_song = Some(song.clone());
                self.current_index = *index;
                self.total = *total;
                self.percent = percent(*index, *total);
            }
            ProgressEvent::Done { .. } => {
                self.active = false;
                self.finished = true;
                self.current_song = None;
            }
            ProgressEvent::Error { error } => {
                *self = Self {
                    error: Some(error.clone()),
                    ..Self::default()
                };
            }
        }
    }

    /// Mark a stream that closed without `Done` or `Error`
    pub fn interrupted(&mut self) {
        if self.active {
            *self = Self {
                error: Some("progress stream closed unexpectedly".to_string()),
                ..Self::default()
            };
        }
    }
}

//! Batch handlers.

use crate::api::AppState;
use crate::orchestrator::BatchJobState;
use axum::{
    Json,
    extract::{Path, State},
    response::sse::{Event as SseEvent, KeepAlive, Sse},
};
use std::convert::Infallible;
use tokio_stream::StreamExt;

/// GET /playlists/:id/download-all-stream - Batch-download a playlist
///
/// Each progress event is one data-only SSE frame (`data: {json}`). The
/// stream ends after `{"done": true}` or `{"error": ...}`. Disconnecting
/// cancels the batch before its next track.
#[utoipa::path(
    get,
    path = "/playlists/{id}/download-all-stream",
    tag = "batch",
    params(
        ("id" = String, Path, description = "Playlist ID")
    ),
    responses(
        (status = 200, description = "Progress events (text/event-stream), each a ProgressEvent", content_type = "text/event-stream", body = crate::types::ProgressEvent)
    )
)]
pub async fn download_all_stream(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Sse<impl tokio_stream::Stream<Item = Result<SseEvent, Infallible>>> {
    tracing::info!(playlist_id = %id, "Batch download requested");

    let stream = state
        .orchestrator
        .run_batch(&id)
        .filter_map(|event| match serde_json::to_string(&event) {
            Ok(json_data) => Some(Ok(SseEvent::default().data(json_data))),
            Err(e) => {
                tracing::warn!("Failed to serialize progress event to JSON: {}", e);
                None
            }
        });

    Sse::new(stream).keep_alive(KeepAlive::default())
}

/// GET /batches - Running batch jobs
#[utoipa::path(
    get,
    path = "/batches",
    tag = "batch",
    responses(
        (status = 200, description = "Running batch jobs ordered by playlist ID", body = Vec<crate::orchestrator::BatchJobState>)
    )
)]
pub async fn list_batches(State(state): State<AppState>) -> Json<Vec<BatchJobState>> {
    Json(state.orchestrator.active_batches())
}

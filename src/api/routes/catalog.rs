//! Catalog handlers.

use crate::api::AppState;
use crate::error::Error;
use crate::types::{Playlist, TrackView};
use axum::{
    Json,
    extract::{Path, State},
};

/// GET /playlists - List playlists
#[utoipa::path(
    get,
    path = "/playlists",
    tag = "catalog",
    responses(
        (status = 200, description = "Playlists of the authenticated catalog user", body = Vec<crate::types::Playlist>),
        (status = 401, description = "Catalog credentials missing or rejected", body = crate::error::ApiError),
        (status = 502, description = "Catalog unavailable", body = crate::error::ApiError)
    )
)]
pub async fn list_playlists(State(state): State<AppState>) -> Result<Json<Vec<Playlist>>, Error> {
    let playlists = state.orchestrator.list_playlists().await?;
    Ok(Json(playlists))
}

/// GET /playlists/:id/tracks - List a playlist's tracks
#[utoipa::path(
    get,
    path = "/playlists/{id}/tracks",
    tag = "catalog",
    params(
        ("id" = String, Path, description = "Playlist ID")
    ),
    responses(
        (status = 200, description = "Tracks with their current acquisition state", body = Vec<crate::types::TrackView>),
        (status = 404, description = "Playlist not found", body = crate::error::ApiError),
        (status = 502, description = "Catalog unavailable", body = crate::error::ApiError)
    )
)]
pub async fn list_playlist_tracks(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Vec<TrackView>>, Error> {
    let tracks = state.orchestrator.list_tracks(&id).await?;
    Ok(Json(tracks))
}

//! Media handlers: search, fetch and interactive single-track downloads.

use super::{DownloadAudioRequest, SearchQuery, SearchResult};
use crate::api::AppState;
use crate::error::ApiError;
use crate::media::{FetchRequest, NOT_FOUND_TITLE, NOT_FOUND_URL};
use crate::naming::content_disposition;
use crate::types::{Artifact, MediaSource, ResolvedMedia, Track};
use axum::{
    Json,
    extract::{Query, State},
    http::header,
    response::{IntoResponse, Response},
};

/// Serve an artifact as a file attachment
fn artifact_response(artifact: Artifact) -> Response {
    let headers = [
        (header::CONTENT_TYPE, artifact.content_type().to_string()),
        (
            header::CONTENT_DISPOSITION,
            content_disposition(&artifact.file_name()),
        ),
    ];
    (headers, artifact.bytes).into_response()
}

/// GET /youtube/search - Resolve a query to a media location
#[utoipa::path(
    get,
    path = "/youtube/search",
    tag = "media",
    params(SearchQuery),
    responses(
        (status = 200, description = "Best match, or the Not Found sentinel", body = SearchResult),
        (status = 400, description = "Empty query", body = crate::error::ApiError),
        (status = 502, description = "Resolver failed", body = crate::error::ApiError)
    )
)]
pub async fn search_media(
    State(state): State<AppState>,
    Query(params): Query<SearchQuery>,
) -> Response {
    if params.query.trim().is_empty() {
        return ApiError::validation("query must not be empty").into_response();
    }

    let author = params.author.unwrap_or_default();
    match state.orchestrator.search_media(&params.query, &author).await {
        Ok(MediaSource::Found(media)) => Json(SearchResult {
            title: media.title,
            url: media.url,
        })
        .into_response(),
        Ok(MediaSource::NotFound) => Json(SearchResult {
            title: NOT_FOUND_TITLE.to_string(),
            url: NOT_FOUND_URL.to_string(),
        })
        .into_response(),
        Err(e) => e.into_response(),
    }
}

/// POST /youtube/download-audio - Fetch an already-resolved media location
#[utoipa::path(
    post,
    path = "/youtube/download-audio",
    tag = "media",
    request_body = DownloadAudioRequest,
    responses(
        (status = 200, description = "Audio file as an attachment", content_type = "audio/mpeg"),
        (status = 400, description = "Missing url or filename, or url is not http(s)", body = crate::error::ApiError),
        (status = 502, description = "Fetch failed", body = crate::error::ApiError),
        (status = 503, description = "Shutting down", body = crate::error::ApiError)
    )
)]
pub async fn download_audio(
    State(state): State<AppState>,
    Json(request): Json<DownloadAudioRequest>,
) -> Response {
    if request.url.trim().is_empty() || request.filename.trim().is_empty() {
        return ApiError::validation("url and filename are required").into_response();
    }
    if !request.url.starts_with("http") {
        return ApiError::validation("url must be an http(s) URL").into_response();
    }

    let media = ResolvedMedia {
        url: request.url,
        title: request.filename.clone(),
    };
    let fetch = FetchRequest {
        filename: request.filename,
        author: request.author,
        album: request.album,
    };

    match state.orchestrator.fetch_media(&media, &fetch).await {
        Ok(artifact) => artifact_response(artifact),
        Err(e) => e.into_response(),
    }
}

/// POST /tracks/download - Resolve and fetch one track
#[utoipa::path(
    post,
    path = "/tracks/download",
    tag = "media",
    request_body = crate::types::Track,
    responses(
        (status = 200, description = "Audio file as an attachment", content_type = "audio/mpeg"),
        (status = 400, description = "Missing name or artist", body = crate::error::ApiError),
        (status = 404, description = "No media found for the track", body = crate::error::ApiError),
        (status = 409, description = "Track is already being downloaded", body = crate::error::ApiError),
        (status = 502, description = "Resolver or fetcher failed", body = crate::error::ApiError),
        (status = 503, description = "Shutting down", body = crate::error::ApiError)
    )
)]
pub async fn download_track(
    State(state): State<AppState>,
    Json(track): Json<Track>,
) -> Response {
    if track.name.trim().is_empty() || track.artist.trim().is_empty() {
        return ApiError::validation("name and artist are required").into_response();
    }

    match state.orchestrator.download_track(&track).await {
        Ok(artifact) => artifact_response(artifact),
        Err(e) => e.into_response(),
    }
}

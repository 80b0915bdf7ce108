//! OpenAPI documentation and schema generation
//!
//! This module defines the OpenAPI specification for the playlist-dl REST API
//! using utoipa for compile-time spec generation.

use utoipa::OpenApi;

/// OpenAPI documentation for the playlist-dl REST API
///
/// The spec can be accessed via:
/// - `/openapi.json` - JSON format OpenAPI specification
/// - `/swagger-ui` - Interactive Swagger UI documentation
#[derive(OpenApi)]
#[openapi(
    info(
        title = "playlist-dl REST API",
        version = "0.1.0",
        description = "REST API for browsing playlists, downloading single tracks and batch-downloading playlists with streamed progress",
        license(
            name = "MIT OR Apache-2.0"
        )
    ),
    servers(
        (url = "http://localhost:8000", description = "Local development server")
    ),
    paths(
        // Catalog
        crate::api::routes::list_playlists,
        crate::api::routes::list_playlist_tracks,

        // Media
        crate::api::routes::search_media,
        crate::api::routes::download_audio,
        crate::api::routes::download_track,

        // Batch
        crate::api::routes::download_all_stream,
        crate::api::routes::list_batches,

        // System
        crate::api::routes::health_check,
        crate::api::routes::openapi_spec,
        crate::api::routes::event_stream,
    ),
    components(schemas(
        // Core types from types.rs
        crate::types::Playlist,
        crate::types::Track,
        crate::types::TrackView,
        crate::types::AcquisitionState,
        crate::types::ResolvedMedia,
        crate::types::ArtifactMetadata,
        crate::types::ProgressEvent,
        crate::types::Event,

        // Orchestrator state
        crate::orchestrator::BatchJobState,
        crate::orchestrator::JobStatus,
        crate::orchestrator::BatchProgress,

        // Config types from config.rs
        crate::config::Config,
        crate::config::CatalogConfig,
        crate::config::MediaConfig,
        crate::config::BatchConfig,
        crate::config::FileCollisionAction,
        crate::config::ServerIntegrationConfig,
        crate::config::ApiConfig,

        // API request/response types
        crate::api::routes::SearchResult,
        crate::api::routes::DownloadAudioRequest,

        // Error types from error.rs
        crate::error::ApiError,
        crate::error::ErrorDetail,
    )),
    tags(
        (name = "catalog", description = "Catalog - Playlists and their tracks"),
        (name = "media", description = "Media - Search, fetch and single-track downloads"),
        (name = "batch", description = "Batch - Whole-playlist downloads with streamed progress"),
        (name = "system", description = "System endpoints - Health checks, OpenAPI spec, events"),
    ),
    modifiers(&SecurityAddon)
)]
pub struct ApiDoc;

/// Security addon to add API key authentication scheme to OpenAPI spec
struct SecurityAddon;

impl utoipa::Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = &mut openapi.components {
            components.add_security_scheme(
                "api_key",
                utoipa::openapi::security::SecurityScheme::ApiKey(
                    utoipa::openapi::security::ApiKey::Header(
                        utoipa::openapi::security::ApiKeyValue::new("X-Api-Key"),
                    ),
                ),
            );
        }
    }
}

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_openapi_spec_lists_every_route() {
        let spec = ApiDoc::openapi();
        let paths: Vec<&str> = spec.paths.paths.keys().map(String::as_str).collect();

        for expected in [
            "/playlists",
            "/playlists/{id}/tracks",
            "/playlists/{id}/download-all-stream",
            "/youtube/search",
            "/youtube/download-audio",
            "/tracks/download",
            "/batches",
            "/health",
            "/openapi.json",
            "/events",
        ] {
            assert!(paths.contains(&expected), "missing path {expected}");
        }
    }

    #[test]
    fn test_openapi_spec_has_components() {
        let components = ApiDoc::openapi().components.unwrap();

        assert!(components.schemas.contains_key("ProgressEvent"));
        assert!(components.schemas.contains_key("TrackView"));
        assert!(components.schemas.contains_key("ApiError"));
        assert!(
            components.security_schemes.contains_key("api_key"),
            "Should have 'api_key' security scheme defined"
        );
    }

    #[test]
    fn test_openapi_spec_has_tags() {
        let tags = ApiDoc::openapi().tags.unwrap();
        let tag_names: Vec<&str> = tags.iter().map(|t| t.name.as_str()).collect();

        assert_eq!(tag_names, vec!["catalog", "media", "batch", "system"]);
    }

    #[test]
    fn test_openapi_spec_info() {
        let spec = ApiDoc::openapi();

        assert_eq!(spec.info.title, "playlist-dl REST API");
        assert_eq!(spec.info.version, "0.1.0");
        assert!(spec.info.description.is_some());
    }

    #[test]
    fn test_openapi_spec_version() {
        let json = serde_json::to_value(ApiDoc::openapi()).expect("Should serialize to JSON");
        let version = json.get("openapi").and_then(|v| v.as_str());
        assert!(
            version.unwrap().starts_with("3."),
            "Should use OpenAPI 3.x version"
        );
    }
}

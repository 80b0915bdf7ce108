//! Remote media backend over HTTP

use super::traits::{FetchRequest, MediaFetcher, MediaResolver};
use crate::error::{AcquisitionError, Error, Result};
use crate::naming::{file_name_from_disposition, sanitize_file_name};
use crate::types::{Artifact, ArtifactMetadata, MediaSource, ResolvedMedia};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

/// Title the search endpoint returns when nothing matched
pub const NOT_FOUND_TITLE: &str = "Not Found";

/// URL the search endpoint returns when nothing matched
pub const NOT_FOUND_URL: &str = "No video found";

/// Extension assumed when the download response does not name its file
const DEFAULT_EXTENSION: &str = "mp3";

/// Client for a service exposing `GET /youtube/search` and
/// `POST /youtube/download-audio`
///
/// The routes served by this crate's own API are compatible, so one instance
/// can delegate resolution and fetching to another.
#[derive(Clone, Debug)]
pub struct HttpMediaBackend {
    client: reqwest::Client,
    base_url: String,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    title: String,
    #[serde(default)]
    url: String,
}

#[derive(Debug, Serialize)]
struct DownloadBody<'a> {
    url: &'a str,
    filename: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    author: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    album: Option<&'a str>,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: serde_json::Value,
}

impl ErrorBody {
    fn message(&self) -> String {
        match &self.error {
            serde_json::Value::String(s) => s.clone(),
            serde_json::Value::Object(detail) => detail
                .get("message")
                .and_then(|m| m.as_str())
                .map(str::to_string)
                .unwrap_or_else(|| self.error.to_string()),
            other => other.to_string(),
        }
    }
}

impl HttpMediaBackend {
    /// Create a backend client
    ///
    /// `timeout` bounds each request; downloads may take minutes.
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client cannot be created
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::Other(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    fn describe(e: &reqwest::Error) -> String {
        if e.is_timeout() {
            "request timed out".to_string()
        } else if e.is_connect() {
            format!("connection failed: {e}")
        } else {
            e.to_string()
        }
    }
}

#[async_trait]
impl MediaResolver for HttpMediaBackend {
    async fn resolve(&self, query: &str, author: &str) -> Result<MediaSource> {
        let url = format!("{}/youtube/search", self.base_url);
        debug!(url = %url, query, author, "remote media search");

        let response = self
            .client
            .get(&url)
            .query(&[("query", query), ("author", author)])
            .send()
            .await
            .map_err(|e| AcquisitionError::ResolveTransport(Self::describe(&e)))?;

        // A miss arrives as the sentinel body; any non-2xx, 404 included, is a transport failure
        let status = response.status();
        if !status.is_success() {
            return Err(AcquisitionError::ResolveTransport(format!(
                "search returned HTTP {status}"
            ))
            .into());
        }

        let body: SearchResponse = response
            .json()
            .await
            .map_err(|e| AcquisitionError::ResolveTransport(format!("invalid search response: {e}")))?;

        if body.url.trim().is_empty() || body.url == NOT_FOUND_URL {
            return Ok(MediaSource::NotFound);
        }

        Ok(MediaSource::Found(ResolvedMedia {
            url: body.url,
            title: body.title,
        }))
    }

    fn name(&self) -> &'static str {
        "http"
    }
}

#[async_trait]
impl MediaFetcher for HttpMediaBackend {
    async fn fetch(&self, media: &ResolvedMedia, request: &FetchRequest) -> Result<Artifact> {
        let url = format!("{}/youtube/download-audio", self.base_url);
        debug!(url = %url, media = %media.url, "remote media download");

        let body = DownloadBody {
            url: &media.url,
            filename: &request.filename,
            author: request.author.as_deref(),
            album: request.album.as_deref(),
        };

        let response = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| AcquisitionError::Fetch(Self::describe(&e)))?;

        let status = response.status();
        let is_json = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|v| v.starts_with("application/json"));
        let served_name = response
            .headers()
            .get(reqwest::header::CONTENT_DISPOSITION)
            .and_then(|v| v.to_str().ok())
            .and_then(file_name_from_disposition);

        // The backend reports failures as `{"error": ...}`, sometimes with a 200
        if is_json || !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            let reason = serde_json::from_str::<ErrorBody>(&text)
                .map(|b| b.message())
                .unwrap_or_else(|_| format!("download returned HTTP {status}"));
            return Err(AcquisitionError::Fetch(reason).into());
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| AcquisitionError::Fetch(format!("reading download body: {}", Self::describe(&e))))?;

        let extension = served_name
            .as_deref()
            .and_then(|name| std::path::Path::new(name).extension())
            .and_then(|ext| ext.to_str())
            .map(str::to_ascii_lowercase)
            .unwrap_or_else(|| DEFAULT_EXTENSION.to_string());

        Ok(Artifact {
            stem: sanitize_file_name(&request.filename),
            extension,
            bytes: bytes.to_vec(),
            metadata: ArtifactMetadata {
                title: request.title(),
                artist: request.author.clone(),
                album: request.album.clone(),
            },
        })
    }

    fn name(&self) -> &'static str {
        "http"
    }
}

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_json, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn backend(server: &MockServer) -> HttpMediaBackend {
        HttpMediaBackend::new(server.uri(), Duration::from_secs(5)).unwrap()
    }

    fn media() -> ResolvedMedia {
        ResolvedMedia {
            url: "https://www.youtube.com/watch?v=abc".to_string(),
            title: "Song".to_string(),
        }
    }

    fn request() -> FetchRequest {
        FetchRequest {
            filename: "Song by Artist".to_string(),
            author: Some("Artist".to_string()),
            album: None,
        }
    }

    #[tokio::test]
    async fn search_hit_is_found() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/youtube/search"))
            .and(query_param("query", "Song Lyrics"))
            .and(query_param("author", "Artist"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "title": "Song (Lyrics)",
                "url": "https://www.youtube.com/watch?v=abc"
            })))
            .mount(&server)
            .await;

        let source = backend(&server).resolve("Song Lyrics", "Artist").await.unwrap();
        assert_eq!(
            source,
            MediaSource::Found(ResolvedMedia {
                url: "https://www.youtube.com/watch?v=abc".to_string(),
                title: "Song (Lyrics)".to_string(),
            })
        );
    }

    #[tokio::test]
    async fn sentinel_response_is_not_found() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/youtube/search"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "title": NOT_FOUND_TITLE,
                "url": NOT_FOUND_URL
            })))
            .mount(&server)
            .await;

        let source = backend(&server).resolve("x", "y").await.unwrap();
        assert_eq!(source, MediaSource::NotFound);
    }

    #[tokio::test]
    async fn search_server_error_is_transport_not_not_found() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/youtube/search"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        match backend(&server).resolve("x", "y").await {
            Err(Error::Acquisition(AcquisitionError::ResolveTransport(reason))) => {
                assert!(reason.contains("500"), "got: {reason}");
            }
            other => panic!("expected transport error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn missing_search_route_is_transport_error() {
        let server = MockServer::start().await;

        match backend(&server).resolve("Song Lyrics", "Artist").await {
            Err(Error::Acquisition(AcquisitionError::ResolveTransport(reason))) => {
                assert!(reason.contains("404"), "got: {reason}");
            }
            other => panic!("expected transport error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn unreachable_backend_is_transport_error() {
        let backend = HttpMediaBackend::new("http://127.0.0.1:9", Duration::from_secs(2)).unwrap();

        assert!(matches!(
            backend.resolve("x", "y").await,
            Err(Error::Acquisition(AcquisitionError::ResolveTransport(_)))
        ));
    }

    #[tokio::test]
    async fn download_returns_bytes_named_from_request() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/youtube/download-audio"))
            .and(body_json(json!({
                "url": "https://www.youtube.com/watch?v=abc",
                "filename": "Song by Artist",
                "author": "Artist"
            })))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("content-type", "audio/mpeg")
                    .insert_header("content-disposition", "attachment; filename=\"Song_by_Artist.mp3\"")
                    .set_body_bytes(b"ID3fake".to_vec()),
            )
            .mount(&server)
            .await;

        let artifact = backend(&server).fetch(&media(), &request()).await.unwrap();

        assert_eq!(artifact.file_name(), "Song by Artist.mp3");
        assert_eq!(artifact.bytes, b"ID3fake");
        assert_eq!(artifact.metadata.artist.as_deref(), Some("Artist"));
    }

    #[tokio::test]
    async fn json_error_body_is_fetch_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/youtube/download-audio"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({ "error": "MP3 file not found after download." })),
            )
            .mount(&server)
            .await;

        match backend(&server).fetch(&media(), &request()).await {
            Err(Error::Acquisition(AcquisitionError::Fetch(reason))) => {
                assert_eq!(reason, "MP3 file not found after download.");
            }
            other => panic!("expected fetch error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn structured_api_error_body_is_fetch_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/youtube/download-audio"))
            .respond_with(ResponseTemplate::new(502).set_body_json(json!({
                "error": { "code": "fetch_failed", "message": "upstream broke" }
            })))
            .mount(&server)
            .await;

        match backend(&server).fetch(&media(), &request()).await {
            Err(Error::Acquisition(AcquisitionError::Fetch(reason))) => {
                assert_eq!(reason, "upstream broke");
            }
            other => panic!("expected fetch error, got {other:?}"),
        }
    }
}

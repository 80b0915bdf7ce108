//! Configuration types for playlist-dl

use serde::{Deserialize, Serialize};
use std::{net::SocketAddr, path::PathBuf, time::Duration};
use utoipa::ToSchema;

/// Main configuration for the [`Orchestrator`](crate::Orchestrator)
///
/// Fields are organized into logical sub-configs:
/// - [`catalog`](CatalogConfig) — playlist/track lookups
/// - [`media`](MediaConfig) — resolving and fetching audio
/// - [`batch`](BatchConfig) — batch output and stream behaviour
/// - [`server`](ServerIntegrationConfig) — REST API
#[derive(Clone, Debug, Default, Serialize, Deserialize, ToSchema)]
pub struct Config {
    /// Catalog provider settings
    #[serde(default)]
    pub catalog: CatalogConfig,

    /// Media resolver and fetcher settings
    #[serde(default)]
    pub media: MediaConfig,

    /// Batch job settings
    #[serde(default)]
    pub batch: BatchConfig,

    /// API and external server integration
    #[serde(default)]
    pub server: ServerIntegrationConfig,
}

impl Config {
    /// Read a JSON configuration file; absent fields take their defaults
    pub fn from_json_file(path: impl AsRef<std::path::Path>) -> crate::Result<Self> {
        let raw = std::fs::read_to_string(path.as_ref())?;
        let config = serde_json::from_str(&raw)?;
        Ok(config)
    }

    /// Reject settings that would make the orchestrator misbehave
    pub fn validate(&self) -> crate::Result<()> {
        if self.catalog.page_size == 0 {
            return Err(crate::Error::Config {
                message: "page size must be at least 1".to_string(),
                key: Some("catalog.page_size".to_string()),
            });
        }
        if self.batch.channel_capacity == 0 {
            return Err(crate::Error::Config {
                message: "channel capacity must be at least 1".to_string(),
                key: Some("batch.channel_capacity".to_string()),
            });
        }
        if self.media.audio_format.trim().is_empty() {
            return Err(crate::Error::Config {
                message: "audio format must not be empty".to_string(),
                key: Some("media.audio_format".to_string()),
            });
        }
        Ok(())
    }
}

/// Catalog provider configuration (Spotify Web API)
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct CatalogConfig {
    /// Base URL of the catalog API (default: "https://api.spotify.com/v1")
    #[serde(default = "default_catalog_api_base")]
    pub api_base: String,

    /// Bearer token for the catalog API
    ///
    /// Obtaining the token (OAuth) is the host application's job.
    #[serde(default)]
    pub access_token: Option<String>,

    /// Number of tracks requested per page (default: 100)
    #[serde(default = "default_page_size")]
    pub page_size: usize,

    /// Per-request timeout (default: 15 seconds)
    #[serde(default = "default_catalog_timeout", with = "duration_serde")]
    pub request_timeout: Duration,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            api_base: default_catalog_api_base(),
            access_token: None,
            page_size: default_page_size(),
            request_timeout: default_catalog_timeout(),
        }
    }
}

/// Media resolution and fetching configuration
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct MediaConfig {
    /// Path to the yt-dlp executable (auto-detected if None)
    #[serde(default)]
    pub ytdlp_path: Option<PathBuf>,

    /// Word appended to the track name when searching (default: "Lyrics")
    #[serde(default = "default_search_suffix")]
    pub search_suffix: String,

    /// Audio container the fetcher produces (default: "mp3")
    #[serde(default = "default_audio_format")]
    pub audio_format: String,

    /// Audio quality passed to the extractor (default: "192")
    #[serde(default = "default_audio_quality")]
    pub audio_quality: String,

    /// Upper bound for one resolve call (default: 30 seconds)
    #[serde(default = "default_resolve_timeout", with = "duration_serde")]
    pub resolve_timeout: Duration,

    /// Upper bound for one fetch call (default: 300 seconds)
    #[serde(default = "default_fetch_timeout", with = "duration_serde")]
    pub fetch_timeout: Duration,

    /// Scratch directory for extractor output (default: "./temp")
    #[serde(default = "default_temp_dir")]
    pub temp_dir: PathBuf,
}

impl Default for MediaConfig {
    fn default() -> Self {
        Self {
            ytdlp_path: None,
            search_suffix: default_search_suffix(),
            audio_format: default_audio_format(),
            audio_quality: default_audio_quality(),
            resolve_timeout: default_resolve_timeout(),
            fetch_timeout: default_fetch_timeout(),
            temp_dir: default_temp_dir(),
        }
    }
}

/// Batch job configuration
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct BatchConfig {
    /// Root directory for batch output, one sub-folder per playlist (default: "./music")
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,

    /// Progress events buffered ahead of a slow consumer (default: 16)
    #[serde(default = "default_channel_capacity")]
    pub channel_capacity: usize,

    /// What to do when an output file already exists
    #[serde(default)]
    pub file_collision: FileCollisionAction,

    /// Pause after each progress event, in milliseconds (default: 0)
    #[serde(default, with = "millis_serde")]
    pub event_delay: Duration,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            output_dir: default_output_dir(),
            channel_capacity: default_channel_capacity(),
            file_collision: FileCollisionAction::default(),
            event_delay: Duration::ZERO,
        }
    }
}

/// File collision handling strategy
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum FileCollisionAction {
    /// Append (1), (2), etc. to filename (default)
    #[default]
    Rename,
    /// Overwrite existing file
    Overwrite,
    /// Leave the existing file and report a delivery failure
    Skip,
}

/// API and external server integration configuration
#[derive(Clone, Debug, Default, Serialize, Deserialize, ToSchema)]
pub struct ServerIntegrationConfig {
    /// REST API configuration
    #[serde(default)]
    pub api: ApiConfig,
}

/// REST API configuration
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct ApiConfig {
    /// Address to bind to (default: 127.0.0.1:8000)
    #[serde(default = "default_bind_address")]
    pub bind_address: SocketAddr,

    /// Optional API key for authentication
    #[serde(default)]
    pub api_key: Option<String>,

    /// Enable CORS for browser access (default: true)
    #[serde(default = "default_true")]
    pub cors_enabled: bool,

    /// Allowed CORS origins (default: ["http://localhost:4200"])
    #[serde(default = "default_cors_origins")]
    pub cors_origins: Vec<String>,

    /// Enable Swagger UI at /swagger-ui (default: true)
    #[serde(default = "default_true")]
    pub swagger_ui: bool,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
            api_key: None,
            cors_enabled: true,
            cors_origins: default_cors_origins(),
            swagger_ui: true,
        }
    }
}

fn default_catalog_api_base() -> String {
    "https://api.spotify.com/v1".to_string()
}

fn default_page_size() -> usize {
    100
}

fn default_catalog_timeout() -> Duration {
    Duration::from_secs(15)
}

fn default_search_suffix() -> String {
    "Lyrics".to_string()
}

fn default_audio_format() -> String {
    "mp3".to_string()
}

fn default_audio_quality() -> String {
    "192".to_string()
}

fn default_resolve_timeout() -> Duration {
    Duration::from_secs(30)
}

fn default_fetch_timeout() -> Duration {
    Duration::from_secs(300)
}

fn default_temp_dir() -> PathBuf {
    PathBuf::from("./temp")
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("./music")
}

fn default_channel_capacity() -> usize {
    16
}

fn default_bind_address() -> SocketAddr {
    SocketAddr::from(([127, 0, 0, 1], 8000))
}

fn default_cors_origins() -> Vec<String> {
    vec!["http://localhost:4200".to_string()]
}

fn default_true() -> bool {
    true
}

// Duration serialization helper
mod duration_serde {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u64(duration.as_secs())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = u64::deserialize(deserializer)?;
        Ok(Duration::from_secs(secs))
    }
}

// Millisecond Duration serialization helper
mod millis_serde {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u64(duration.as_millis() as u64)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let millis = u64::deserialize(deserializer)?;
        Ok(Duration::from_millis(millis))
    }
}

//! yt-dlp backed resolver and fetcher

use super::parser::{ExitStatus, last_error_line, parse_search_output};
use super::traits::{FetchRequest, MediaFetcher, MediaResolver};
use crate::config::MediaConfig;
use crate::error::{AcquisitionError, Error, Result};
use crate::naming::{command_safe_name, sanitize_file_name};
use crate::types::{Artifact, ArtifactMetadata, MediaSource, ResolvedMedia};
use async_trait::async_trait;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use tokio::process::Command;
use tracing::debug;

/// Handle on the external `yt-dlp` binary
///
/// # Examples
///
/// ```no_run
/// use playlist_dl::media::YtDlp;
/// use playlist_dl::config::MediaConfig;
/// use std::path::PathBuf;
///
/// // Create with explicit path
/// let ytdlp = YtDlp::new(PathBuf::from("/usr/local/bin/yt-dlp"));
///
/// // Or auto-discover from PATH
/// let ytdlp = YtDlp::from_path().expect("yt-dlp not found in PATH");
/// let (resolver, fetcher) = ytdlp.backends(&MediaConfig::default());
/// ```
#[derive(Clone, Debug)]
pub struct YtDlp {
    binary_path: PathBuf,
}

impl YtDlp {
    /// Create a handle with an explicit binary path
    pub fn new(binary_path: PathBuf) -> Self {
        Self { binary_path }
    }

    /// Attempt to find yt-dlp in PATH
    ///
    /// Returns `None` if the binary is not found.
    pub fn from_path() -> Option<Self> {
        which::which("yt-dlp").ok().map(Self::new)
    }

    /// Use `media.ytdlp_path` if set, otherwise search PATH
    pub fn from_config(config: &MediaConfig) -> Option<Self> {
        match &config.ytdlp_path {
            Some(path) => Some(Self::new(path.clone())),
            None => Self::from_path(),
        }
    }

    /// Path of the binary this handle runs
    pub fn binary_path(&self) -> &Path {
        &self.binary_path
    }

    /// Build a resolver and fetcher sharing this binary
    pub fn backends(&self, config: &MediaConfig) -> (YtDlpResolver, YtDlpFetcher) {
        (
            YtDlpResolver::new(self.clone()),
            YtDlpFetcher::new(self.clone(), config),
        )
    }

    fn command(&self) -> Command {
        let mut command = Command::new(&self.binary_path);
        command.kill_on_drop(true);
        command
    }
}

/// Resolver that runs a one-result yt-dlp search
#[derive(Clone, Debug)]
pub struct YtDlpResolver {
    ytdlp: YtDlp,
}

impl YtDlpResolver {
    /// Create a resolver
    pub fn new(ytdlp: YtDlp) -> Self {
        Self { ytdlp }
    }

    pub(crate) fn search_args(query: &str, author: &str) -> Vec<OsString> {
        let terms = if author.trim().is_empty() {
            query.trim().to_string()
        } else {
            format!("{} {}", query.trim(), author.trim())
        };

        [
            "--dump-json",
            "--flat-playlist",
            "--no-warnings",
            "--skip-download",
        ]
        .into_iter()
        .map(OsString::from)
        .chain(std::iter::once(OsString::from(format!("ytsearch1:{terms}"))))
        .collect()
    }
}

#[async_trait]
impl MediaResolver for YtDlpResolver {
    async fn resolve(&self, query: &str, author: &str) -> Result<MediaSource> {
        debug!(query, author, binary = %self.ytdlp.binary_path.display(), "running yt-dlp search");

        let output = self
            .ytdlp
            .command()
            .args(Self::search_args(query, author))
            .output()
            .await
            .map_err(|e| Error::ExternalTool(format!("Failed to execute yt-dlp: {}", e)))?;

        parse_search_output(
            &output.stdout,
            &output.stderr,
            ExitStatus::from(output.status.success()),
        )
    }

    fn name(&self) -> &'static str {
        "yt-dlp"
    }
}

/// Fetcher that downloads and converts audio with yt-dlp
///
/// Each fetch runs in its own scratch directory under `media.temp_dir`, which is
/// removed once the payload has been read into memory.
#[derive(Clone, Debug)]
pub struct YtDlpFetcher {
    ytdlp: YtDlp,
    audio_format: String,
    audio_quality: String,
    temp_dir: PathBuf,
}

impl YtDlpFetcher {
    /// Create a fetcher using the audio settings from `config`
    pub fn new(ytdlp: YtDlp, config: &MediaConfig) -> Self {
        Self {
            ytdlp,
            audio_format: config.audio_format.clone(),
            audio_quality: config.audio_quality.clone(),
            temp_dir: config.temp_dir.clone(),
        }
    }

    pub(crate) fn fetch_args(
        &self,
        url: &str,
        output_template: &Path,
        request: &FetchRequest,
    ) -> Vec<OsString> {
        let tags = format!(
            "Metadata:-metadata title={} -metadata artist={} -metadata album={}",
            shell_quote(&request.title()),
            shell_quote(request.artist_tag()),
            shell_quote(request.album_tag()),
        );

        let mut args: Vec<OsString> = [
            "-f",
            "bestaudio/best",
            "--no-playlist",
            "--no-warnings",
            "--quiet",
            "-x",
            "--audio-format",
            self.audio_format.as_str(),
            "--audio-quality",
            self.audio_quality.as_str(),
            "--embed-metadata",
            "--embed-thumbnail",
            "--convert-thumbnails",
            "jpg",
            "--postprocessor-args",
            tags.as_str(),
            "-o",
        ]
        .into_iter()
        .map(OsString::from)
        .collect();
        args.push(output_template.as_os_str().to_os_string());
        // Everything after `--` is a URL, never an option
        args.push(OsString::from("--"));
        args.push(OsString::from(url));
        args
    }
}

#[async_trait]
impl MediaFetcher for YtDlpFetcher {
    async fn fetch(&self, media: &ResolvedMedia, request: &FetchRequest) -> Result<Artifact> {
        tokio::fs::create_dir_all(&self.temp_dir).await?;
        let scratch = tempfile::Builder::new()
            .prefix("fetch-")
            .tempdir_in(&self.temp_dir)?;

        let safe_name = command_safe_name(&request.filename);
        let template = scratch.path().join(format!("{safe_name}.%(ext)s"));
        let expected = scratch
            .path()
            .join(format!("{safe_name}.{}", self.audio_format));

        debug!(url = %media.url, output = %expected.display(), "running yt-dlp download");

        let output = self
            .ytdlp
            .command()
            .args(self.fetch_args(&media.url, &template, request))
            .output()
            .await
            .map_err(|e| Error::ExternalTool(format!("Failed to execute yt-dlp: {}", e)))?;

        if !output.status.success() {
            return Err(AcquisitionError::Fetch(last_error_line(&output.stderr)).into());
        }

        let bytes = match tokio::fs::read(&expected).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(AcquisitionError::Fetch(
                    "audio file not found after download".to_string(),
                )
                .into());
            }
            Err(e) => return Err(e.into()),
        };

        Ok(Artifact {
            stem: sanitize_file_name(&request.filename),
            extension: self.audio_format.clone(),
            bytes,
            metadata: ArtifactMetadata {
                title: request.title(),
                artist: request.author.clone(),
                album: request.album.clone(),
            },
        })
    }

    fn name(&self) -> &'static str {
        "yt-dlp"
    }
}

/// Quote a value for yt-dlp's shell-style argument splitting
fn shell_quote(value: &str) -> String {
    format!("'{}'", value.replace('\'', r#"'"'"'"#))
}

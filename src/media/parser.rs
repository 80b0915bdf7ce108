//! Parser for yt-dlp command output

use crate::error::AcquisitionError;
use crate::types::{MediaSource, ResolvedMedia};
use serde::Deserialize;
use std::str;

/// Reason reported when a successful search printed something other than JSON lines
const UNPARSEABLE_OUTPUT: &str = "unparseable search output";

/// Exit status of an external command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitStatus {
    /// The command exited successfully (exit code 0)
    Success,
    /// The command exited with a non-zero exit code
    Failure,
}

impl From<bool> for ExitStatus {
    fn from(success: bool) -> Self {
        if success {
            Self::Success
        } else {
            Self::Failure
        }
    }
}

/// One entry of `--dump-json --flat-playlist` output
#[derive(Debug, Deserialize)]
struct SearchEntry {
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    url: Option<String>,
    #[serde(default)]
    webpage_url: Option<String>,
}

impl SearchEntry {
    fn into_media(self) -> Option<ResolvedMedia> {
        let url = self
            .webpage_url
            .filter(|u| u.starts_with("http"))
            .or(self.url.filter(|u| u.starts_with("http")))
            .or_else(|| {
                self.id
                    .as_deref()
                    .filter(|id| !id.is_empty())
                    .map(|id| format!("https://www.youtube.com/watch?v={id}"))
            })?;

        Some(ResolvedMedia {
            title: self.title.unwrap_or_default(),
            url,
        })
    }
}

/// Parse output from a `yt-dlp --dump-json "ytsearchN:..."` search
///
/// The first usable entry wins. Empty output means the search ran and found
/// nothing. A non-zero exit, or output that is not JSON lines, is a transport
/// failure.
pub fn parse_search_output(
    stdout: &[u8],
    stderr: &[u8],
    exit_status: ExitStatus,
) -> crate::Result<MediaSource> {
    if exit_status == ExitStatus::Failure {
        return Err(AcquisitionError::ResolveTransport(last_error_line(stderr)).into());
    }

    let unparseable = || AcquisitionError::ResolveTransport(UNPARSEABLE_OUTPUT.to_string());

    let output = str::from_utf8(stdout).map_err(|_| unparseable())?;
    let lines: Vec<&str> = output
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect();

    if lines.is_empty() {
        return Ok(MediaSource::NotFound);
    }

    let entries: Vec<SearchEntry> = lines
        .iter()
        .filter_map(|line| serde_json::from_str::<SearchEntry>(line).ok())
        .collect();

    if entries.is_empty() {
        return Err(unparseable().into());
    }

    Ok(match entries.into_iter().find_map(SearchEntry::into_media) {
        Some(media) => MediaSource::Found(media),
        None => MediaSource::NotFound,
    })
}

/// Most useful line of yt-dlp's stderr for an error message
pub fn last_error_line(stderr: &[u8]) -> String {
    let output = str::from_utf8(stderr).unwrap_or_default();
    let lines: Vec<&str> = output
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .collect();

    lines
        .iter()
        .rev()
        .find(|l| l.starts_with("ERROR:"))
        .or_else(|| lines.last())
        .map(|l| l.trim_start_matches("ERROR:").trim().to_string())
        .unwrap_or_else(|| "yt-dlp exited with an error".to_string())
}

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;

    #[test]
    fn first_entry_with_url_wins() {
        let stdout = br#"{"id": "abc", "title": "Yesterday (Lyrics)", "url": "https://www.youtube.com/watch?v=abc"}
{"id": "def", "title": "Other", "url": "https://www.youtube.com/watch?v=def"}
"#;

        let source = parse_search_output(stdout, b"", ExitStatus::Success).unwrap();
        assert_eq!(
            source,
            MediaSource::Found(ResolvedMedia {
                url: "https://www.youtube.com/watch?v=abc".to_string(),
                title: "Yesterday (Lyrics)".to_string(),
            })
        );
    }

    #[test]
    fn bare_id_becomes_watch_url() {
        let stdout = br#"{"id": "xyz", "title": "T", "url": "xyz"}"#;

        match parse_search_output(stdout, b"", ExitStatus::Success).unwrap() {
            MediaSource::Found(media) => {
                assert_eq!(media.url, "https://www.youtube.com/watch?v=xyz");
            }
            MediaSource::NotFound => panic!("expected a match"),
        }
    }

    #[test]
    fn empty_output_is_not_found() {
        let source = parse_search_output(b"\n", b"", ExitStatus::Success).unwrap();
        assert_eq!(source, MediaSource::NotFound);
    }

    #[test]
    fn unparseable_output_is_transport_error() {
        for stdout in [&b"Traceback (most recent call last):\n"[..], &[0xff, 0xfe, 0x00][..]] {
            match parse_search_output(stdout, b"", ExitStatus::Success) {
                Err(Error::Acquisition(AcquisitionError::ResolveTransport(reason))) => {
                    assert_eq!(reason, "unparseable search output");
                }
                other => panic!("expected transport error, got {other:?}"),
            }
        }
    }

    #[test]
    fn failure_exit_is_transport_error() {
        let stderr = b"WARNING: something\nERROR: Unable to download API page: HTTP Error 429\n";

        match parse_search_output(b"", stderr, ExitStatus::Failure) {
            Err(Error::Acquisition(AcquisitionError::ResolveTransport(reason))) => {
                assert_eq!(reason, "Unable to download API page: HTTP Error 429");
            }
            other => panic!("expected transport error, got {other:?}"),
        }
    }

    #[test]
    fn last_error_line_falls_back_to_generic_message() {
        assert_eq!(last_error_line(b""), "yt-dlp exited with an error");
        assert_eq!(last_error_line(b"boom\n"), "boom");
    }
}

//! Filename, search-query and output-path derivation

use crate::config::FileCollisionAction;
use crate::error::{AcquisitionError, Result};
use crate::types::Track;
use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

/// Maximum number of rename attempts when resolving file collisions
const MAX_RENAME_ATTEMPTS: u32 = 9999;

/// Stem used when sanitizing leaves nothing behind
const FALLBACK_STEM: &str = "untitled";

static RESERVED_CHARS: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r#"[<>:"/\\|?*']"#).ok());

static NON_WORD_CHARS: LazyLock<Option<Regex>> = LazyLock::new(|| Regex::new(r"[^\w\s-]").ok());

/// Strip characters that are not allowed in file names
///
/// Removes `< > : " / \ | ? * '` and control characters, then trims
/// surrounding whitespace and dots. An empty result becomes `"untitled"`.
///
/// # Examples
///
/// ```
/// use playlist_dl::naming::sanitize_file_name;
///
/// assert_eq!(sanitize_file_name("AC/DC: Live?"), "ACDC Live");
/// assert_eq!(sanitize_file_name("???"), "untitled");
/// ```
#[must_use]
pub fn sanitize_file_name(name: &str) -> String {
    let stripped = match RESERVED_CHARS.as_ref() {
        Some(re) => re.replace_all(name, "").into_owned(),
        None => name
            .chars()
            .filter(|c| !"<>:\"/\\|?*'".contains(*c))
            .collect(),
    };
    let cleaned: String = stripped.chars().filter(|c| !c.is_control()).collect();
    let trimmed = cleaned.trim().trim_matches('.').trim();

    if trimmed.is_empty() {
        FALLBACK_STEM.to_string()
    } else {
        trimmed.to_string()
    }
}

/// Sanitized artifact stem for a track: `"{name} by {artist}"`
#[must_use]
pub fn track_stem(track: &Track) -> String {
    sanitize_file_name(&track.display_name())
}

/// Resolver query for a track: `"{name} {suffix}"`
///
/// An empty suffix yields the bare track name.
#[must_use]
pub fn search_query(track: &Track, suffix: &str) -> String {
    let suffix = suffix.trim();
    if suffix.is_empty() {
        track.name.trim().to_string()
    } else {
        format!("{} {}", track.name.trim(), suffix)
    }
}

/// Name safe to hand to an external process as an output template
///
/// Keeps word characters, whitespace and `-`; whitespace runs become `_`.
#[must_use]
pub fn command_safe_name(name: &str) -> String {
    let stripped = match NON_WORD_CHARS.as_ref() {
        Some(re) => re.replace_all(name, "").into_owned(),
        None => name
            .chars()
            .filter(|c| c.is_alphanumeric() || *c == '_' || *c == '-' || c.is_whitespace())
            .collect(),
    };
    let joined = stripped.split_whitespace().collect::<Vec<_>>().join("_");

    if joined.is_empty() {
        FALLBACK_STEM.to_string()
    } else {
        joined
    }
}

/// `Content-Disposition` value for serving a file as an attachment
///
/// Carries an ASCII fallback plus the RFC 5987 `filename*` form so
/// non-ASCII names survive.
#[must_use]
pub fn content_disposition(file_name: &str) -> String {
    let ascii: String = file_name
        .chars()
        .map(|c| {
            if c.is_ascii() && !c.is_ascii_control() && c != '"' && c != '\\' {
                c
            } else {
                '_'
            }
        })
        .collect();
    format!(
        "attachment; filename=\"{}\"; filename*=UTF-8''{}",
        ascii,
        urlencoding::encode(file_name)
    )
}

/// Extract the filename from a `Content-Disposition` header value
///
/// Prefers the RFC 5987 `filename*` parameter over the plain `filename`.
#[must_use]
pub fn file_name_from_disposition(value: &str) -> Option<String> {
    let mut plain = None;

    for part in value.split(';') {
        let part = part.trim();
        if let Some(encoded) = part.strip_prefix("filename*=") {
            // charset'lang'encoded-filename
            let encoded = encoded.rsplit('\'').next().unwrap_or(encoded);
            if let Ok(decoded) = urlencoding::decode(encoded) {
                return Some(decoded.into_owned());
            }
        } else if let Some(name) = part.strip_prefix("filename=") {
            plain = Some(name.trim_matches('"').to_string());
        }
    }

    plain.filter(|name| !name.is_empty())
}

/// Get a unique path for a file, handling collisions according to the specified action
///
/// For `Rename` this may append ` (1)`, ` (2)`, ... to the stem. For `Skip` an
/// existing file is a delivery error. `Overwrite` returns the path unchanged.
///
/// # Examples
///
/// ```
/// use playlist_dl::naming::get_unique_path;
/// use playlist_dl::config::FileCollisionAction;
/// use std::path::Path;
///
/// let path = Path::new("/tmp/Song by Artist.mp3");
/// let unique = get_unique_path(path, FileCollisionAction::Rename).unwrap();
/// // If the file exists, returns "/tmp/Song by Artist (1).mp3", and so on.
/// ```
pub fn get_unique_path(path: &Path, action: FileCollisionAction) -> Result<PathBuf> {
    match action {
        FileCollisionAction::Overwrite => Ok(path.to_path_buf()),
        FileCollisionAction::Skip => {
            if path.exists() {
                return Err(AcquisitionError::Delivery(format!(
                    "{} already exists",
                    path.display()
                ))
                .into());
            }
            Ok(path.to_path_buf())
        }
        FileCollisionAction::Rename => {
            if !path.exists() {
                return Ok(path.to_path_buf());
            }

            let stem = path.file_stem().and_then(|s| s.to_str()).ok_or_else(|| {
                AcquisitionError::Delivery(format!("cannot extract file stem from {}", path.display()))
            })?;
            let extension = path.extension().and_then(|e| e.to_str());
            let parent = path.parent().ok_or_else(|| {
                AcquisitionError::Delivery(format!("{} has no parent directory", path.display()))
            })?;

            for i in 1..=MAX_RENAME_ATTEMPTS {
                let new_name = match extension {
                    Some(ext) => format!("{} ({}).{}", stem, i, ext),
                    None => format!("{} ({})", stem, i),
                };
                let new_path = parent.join(new_name);
                if !new_path.exists() {
                    return Ok(new_path);
                }
            }

            Err(AcquisitionError::Delivery(format!(
                "no free file name for {} after {MAX_RENAME_ATTEMPTS} attempts",
                path.display()
            ))
            .into())
        }
    }
}

use crate::common::workspace::ScratchWorkspace;
use crate::config::settings::{MAX_TARGET_MB, OUTPUT_SUFFIX};
use serde::Serialize;
use std::path::{Path, PathBuf};
use utoipa::ToSchema;
use validator::Validate;

const DEFAULT_BASE_NAME: &str = "video";
const DEFAULT_EXTENSION: &str = "bin";
const MAX_EXTENSION_LEN: usize = 10;

/// The uploaded file, already persisted inside its scratch workspace.
#[derive(Debug)]
pub struct SavedUpload {
    pub workspace: ScratchWorkspace,
    pub input_path: PathBuf,
    pub original_name: String,
    pub size: u64,
}

/// Target size as it arrived in the form, before any checks.
#[derive(Debug, Validate)]
pub struct TargetSize {
    #[validate(range(min = 1, max = MAX_TARGET_MB, message = "invalid target_mb"))]
    pub megabytes: u32,
}

/// A request that passed every input check; nothing downstream re-validates.
#[derive(Debug)]
pub struct CompressRequest {
    pub upload: SavedUpload,
    pub target_mb: u32,
}

#[derive(Debug, PartialEq, Eq)]
pub enum TargetSizeError {
    /// Absent, empty, or not a plain run of digits.
    Missing,
    /// Digits, but outside `1..=MAX_TARGET_MB`.
    OutOfRange,
}

/// Parses the `target_mb` form value. Only unsigned decimal digits are accepted.
pub fn parse_target_mb(raw: Option<&str>) -> Result<u32, TargetSizeError> {
    let raw = raw.map(str::trim).unwrap_or_default();
    if raw.is_empty() || !raw.bytes().all(|b| b.is_ascii_digit()) {
        return Err(TargetSizeError::Missing);
    }

    let megabytes = raw.parse::<u32>().map_err(|_| TargetSizeError::OutOfRange)?;
    TargetSize { megabytes }
        .validate()
        .map_err(|_| TargetSizeError::OutOfRange)?;
    Ok(megabytes)
}

/// Extension for the scratch copy of the upload.
///
/// Taken from the original filename, else guessed from the part's content
/// type, else a generic one. Only ASCII alphanumerics survive.
pub fn input_extension(original_name: &str, content_type: Option<&str>) -> String {
    let from_name = Path::new(base_name(original_name))
        .extension()
        .and_then(|e| e.to_str())
        .and_then(sanitize_extension);

    from_name
        .or_else(|| {
            content_type
                .and_then(mime_guess::get_mime_extensions_str)
                .and_then(|exts| exts.first())
                .and_then(|e| sanitize_extension(e))
        })
        .unwrap_or_else(|| DEFAULT_EXTENSION.to_string())
}

fn sanitize_extension(ext: &str) -> Option<String> {
    let cleaned: String = ext
        .chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .take(MAX_EXTENSION_LEN)
        .collect::<String>()
        .to_ascii_lowercase();
    (!cleaned.is_empty()).then_some(cleaned)
}

/// `<stem>_compressed.mp4`, safe to place inside a quoted header parameter.
pub fn download_name(original_name: &str) -> String {
    let stem = Path::new(base_name(original_name))
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or_default();

    let cleaned: String = stem
        .chars()
        .map(|c| {
            if (c.is_ascii_graphic() && c != '"' && c != '\\') || c == ' ' {
                c
            } else {
                '_'
            }
        })
        .collect();

    let cleaned = cleaned.trim();
    let stem = if cleaned.is_empty() { DEFAULT_BASE_NAME } else { cleaned };
    format!("{}{}", stem, OUTPUT_SUFFIX)
}

/// Browsers may send a full client-side path; keep only the last component.
fn base_name(name: &str) -> &str {
    name.rsplit(['/', '\\']).next().unwrap_or(name)
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ToolStatus {
    pub name: String,
    pub available: bool,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ToolchainStatus {
    pub prober: ToolStatus,
    pub encoder: ToolStatus,
}

impl ToolchainStatus {
    pub fn is_ready(&self) -> bool {
        self.prober.available && self.encoder.available
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_digits_within_range() {
        assert_eq!(parse_target_mb(Some("25")), Ok(25));
        assert_eq!(parse_target_mb(Some(" 1 ")), Ok(1));
        assert_eq!(parse_target_mb(Some("4096")), Ok(MAX_TARGET_MB));
    }

    #[test]
    fn rejects_non_digits() {
        for raw in ["", "  ", "abc", "2.5", "-3", "+5", "1e3"] {
            assert_eq!(parse_target_mb(Some(raw)), Err(TargetSizeError::Missing), "{raw:?}");
        }
        assert_eq!(parse_target_mb(None), Err(TargetSizeError::Missing));
    }

    #[test]
    fn rejects_out_of_range() {
        assert_eq!(parse_target_mb(Some("0")), Err(TargetSizeError::OutOfRange));
        assert_eq!(parse_target_mb(Some("4097")), Err(TargetSizeError::OutOfRange));
        assert_eq!(parse_target_mb(Some("5000")), Err(TargetSizeError::OutOfRange));
        assert_eq!(
            parse_target_mb(Some("99999999999999999999")),
            Err(TargetSizeError::OutOfRange)
        );
    }

    #[test]
    fn range_bound_follows_max_target_constant() {
        let at_max = MAX_TARGET_MB.to_string();
        let above_max = (MAX_TARGET_MB + 1).to_string();

        assert_eq!(parse_target_mb(Some(&at_max)), Ok(MAX_TARGET_MB));
        assert_eq!(parse_target_mb(Some(&above_max)), Err(TargetSizeError::OutOfRange));
    }

    #[test]
    fn extension_from_filename() {
        assert_eq!(input_extension("holiday.MOV", None), "mov");
        assert_eq!(input_extension("a.b.mkv", Some("video/mp4")), "mkv");
        assert_eq!(input_extension("C:\\clips\\raw.webm", None), "webm");
    }

    #[test]
    fn extension_falls_back_to_content_type_then_generic() {
        let guessed = input_extension("clip", Some("video/mp4"));
        assert_eq!(mime_guess::from_ext(&guessed).first_raw(), Some("video/mp4"));
        assert_eq!(input_extension("clip", Some("application/x-unknown-thing")), "bin");
        assert_eq!(input_extension("clip", None), "bin");
        assert_eq!(input_extension("clip.$$", None), "bin");
    }

    #[test]
    fn download_name_uses_original_stem() {
        assert_eq!(download_name("holiday.mov"), "holiday_compressed.mp4");
        assert_eq!(download_name("dir/sub/trip.final.mkv"), "trip.final_compressed.mp4");
        assert_eq!(download_name("my clip.mp4"), "my clip_compressed.mp4");
    }

    #[test]
    fn download_name_defaults_and_sanitizes() {
        assert_eq!(download_name(""), "video_compressed.mp4");
        assert_eq!(download_name(".mp4"), ".mp4_compressed.mp4");
        assert_eq!(download_name("we\"ird.mp4"), "we_ird_compressed.mp4");
        assert_eq!(download_name("café.mp4"), "caf__compressed.mp4");
    }
}

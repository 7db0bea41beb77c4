use crate::config::env::{self, EnvKey};
use std::path::PathBuf;
use std::time::Duration;

/// Largest target size a request may ask for, in megabytes.
pub const MAX_TARGET_MB: u32 = 4096;

/// Video codec handed to the encoder. Audio is always dropped.
pub const VIDEO_CODEC: &str = "libx265";

/// Suffix appended to the original base name of the download.
pub const OUTPUT_SUFFIX: &str = "_compressed.mp4";

pub const OUTPUT_MEDIA_TYPE: &str = "video/mp4";

const BYTES_PER_MB: usize = 1024 * 1024;

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub server_host: String,
    pub server_port: u16,
    pub scratch_root: PathBuf,
    pub max_upload_bytes: usize,
    pub scratch_ttl: Duration,
    pub sweep_interval: Duration,
    pub ffprobe_bin: String,
    pub ffmpeg_bin: String,
}

impl AppConfig {
    pub fn new() -> Self {
        let scratch_root = env::get(EnvKey::ScratchDir)
            .map(PathBuf::from)
            .unwrap_or_else(|_| default_scratch_root());
        let max_upload_mb: usize = env::get_parsed(EnvKey::MaxUploadMb, 8192);

        Self {
            server_host: env::get_or(EnvKey::ServerHost, "0.0.0.0"),
            server_port: env::get_parsed(EnvKey::ServerPort, 3000),
            scratch_root,
            max_upload_bytes: max_upload_mb.saturating_mul(BYTES_PER_MB),
            scratch_ttl: Duration::from_secs(env::get_parsed(EnvKey::ScratchTtlSecs, 6 * 60 * 60)),
            sweep_interval: Duration::from_secs(
                env::get_parsed(EnvKey::SweepIntervalSecs, 600u64).max(1),
            ),
            ffprobe_bin: env::get_or(EnvKey::FfprobeBin, "ffprobe"),
            ffmpeg_bin: env::get_or(EnvKey::FfmpegBin, "ffmpeg"),
        }
    }

    /// Same defaults as [`AppConfig::new`] without reading the environment,
    /// rooted at the given scratch directory.
    pub fn with_scratch_root(scratch_root: impl Into<PathBuf>) -> Self {
        Self {
            server_host: "127.0.0.1".to_string(),
            server_port: 3000,
            scratch_root: scratch_root.into(),
            max_upload_bytes: 8192 * BYTES_PER_MB,
            scratch_ttl: Duration::from_secs(6 * 60 * 60),
            sweep_interval: Duration::from_secs(600),
            ffprobe_bin: "ffprobe".to_string(),
            ffmpeg_bin: "ffmpeg".to_string(),
        }
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server_host, self.server_port)
    }
}

fn default_scratch_root() -> PathBuf {
    std::env::temp_dir().join("video-compressor")
}

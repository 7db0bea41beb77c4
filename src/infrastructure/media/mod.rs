//! External media tools.
//!
//! The compress pipeline only talks to the two traits below, so tests can
//! swap in fakes without spawning processes.

use async_trait::async_trait;
use std::path::{Path, PathBuf};

pub mod ffmpeg;
pub mod ffprobe;

pub use ffmpeg::Ffmpeg;
pub use ffprobe::Ffprobe;

#[derive(Debug, thiserror::Error)]
pub enum MediaError {
    #[error("{0} not found")]
    ToolMissing(String),

    #[error("encoder exited with {}", exit_label(.code))]
    EncoderExit { code: Option<i32> },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

fn exit_label(code: &Option<i32>) -> String {
    match code {
        Some(c) => format!("status {}", c),
        None => "a signal".to_string(),
    }
}

/// One encoder invocation: read `input`, write `output` at `bitrate_kbps`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodeSpec {
    pub input: PathBuf,
    pub output: PathBuf,
    pub bitrate_kbps: u64,
}

#[async_trait]
pub trait DurationProber: Send + Sync {
    fn tool_name(&self) -> &str;

    /// Whether the executable can be resolved right now.
    fn is_available(&self) -> bool;

    /// Container duration in seconds.
    ///
    /// Unreadable media yields `Ok(0.0)`; only a missing executable is an error.
    async fn probe_duration(&self, path: &Path) -> Result<f64, MediaError>;
}

#[async_trait]
pub trait VideoEncoder: Send + Sync {
    fn tool_name(&self) -> &str;

    fn is_available(&self) -> bool;

    async fn encode(&self, spec: &EncodeSpec) -> Result<(), MediaError>;
}

pub(crate) fn resolve(program: &str) -> bool {
    which::which(program).is_ok()
}

/// Writes an executable shell script standing in for a media tool.
#[cfg(all(test, unix))]
pub(crate) fn script_tool(dir: &Path, body: &str) -> String {
    use std::os::unix::fs::PermissionsExt;

    let path = dir.join("tool.sh");
    std::fs::write(&path, format!("#!/bin/sh\n{}\n", body)).unwrap();
    std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
    path.to_string_lossy().into_owned()
}

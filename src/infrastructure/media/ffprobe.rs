use super::{resolve, DurationProber, MediaError};
use async_trait::async_trait;
use std::io::ErrorKind;
use std::path::Path;
use std::process::Stdio;
use tokio::process::Command;
use tracing::{debug, warn};

#[derive(Debug, Clone)]
pub struct Ffprobe {
    program: String,
}

impl Ffprobe {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

#[async_trait]
impl DurationProber for Ffprobe {
    fn tool_name(&self) -> &str {
        &self.program
    }

    fn is_available(&self) -> bool {
        resolve(&self.program)
    }

    async fn probe_duration(&self, path: &Path) -> Result<f64, MediaError> {
        let output = Command::new(&self.program)
            .args([
                "-v",
                "error",
                "-show_entries",
                "format=duration",
                "-of",
                "default=noprint_wrappers=1:nokey=1",
            ])
            .arg(path)
            .stdin(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .output()
            .await;

        let output = match output {
            Ok(o) => o,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(MediaError::ToolMissing(self.program.clone()));
            }
            Err(e) => {
                warn!("Failed to run {}: {}", self.program, e);
                return Ok(0.0);
            }
        };

        if !output.status.success() {
            warn!("{} exited with {} for {}", self.program, output.status, path.display());
            return Ok(0.0);
        }

        let duration = parse_duration(&String::from_utf8_lossy(&output.stdout));
        debug!("Probed {}: {}s", path.display(), duration);
        Ok(duration)
    }
}

/// Parses the bare `format=duration` value; anything unusable becomes 0.0.
pub fn parse_duration(stdout: &str) -> f64 {
    stdout
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|d| d.is_finite())
        .unwrap_or(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    #[cfg(unix)]
    use crate::infrastructure::media::script_tool;

    #[test]
    fn parses_plain_duration() {
        assert_eq!(parse_duration("12.345000\n"), 12.345);
    }

    #[test]
    fn unavailable_duration_is_zero() {
        assert_eq!(parse_duration("N/A\n"), 0.0);
        assert_eq!(parse_duration(""), 0.0);
        assert_eq!(parse_duration("nan"), 0.0);
    }

    #[tokio::test]
    async fn missing_program_is_reported() {
        let prober = Ffprobe::new("definitely-not-a-real-ffprobe-binary");
        assert!(!prober.is_available());

        let result = prober.probe_duration(Path::new("/nonexistent.mp4")).await;
        assert!(matches!(result, Err(MediaError::ToolMissing(name)) if name == "definitely-not-a-real-ffprobe-binary"));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn failing_tool_yields_zero_duration() {
        let prober = Ffprobe::new("false");
        assert!(prober.is_available());

        let duration = prober.probe_duration(Path::new("/nonexistent.mp4")).await.unwrap();
        assert_eq!(duration, 0.0);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn reads_duration_printed_by_tool() {
        let dir = tempfile::tempdir().unwrap();
        let prober = Ffprobe::new(script_tool(dir.path(), "echo 12.5"));

        let duration = prober.probe_duration(Path::new("/clip.mp4")).await.unwrap();
        assert_eq!(duration, 12.5);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn unreadable_output_yields_zero_duration() {
        let dir = tempfile::tempdir().unwrap();
        let prober = Ffprobe::new(script_tool(dir.path(), "echo N/A"));

        let duration = prober.probe_duration(Path::new("/clip.mp4")).await.unwrap();
        assert_eq!(duration, 0.0);
    }
}

use super::{resolve, EncodeSpec, MediaError, VideoEncoder};
use crate::config::settings::VIDEO_CODEC;
use async_trait::async_trait;
use std::ffi::OsString;
use std::io::ErrorKind;
use std::process::Stdio;
use tokio::process::Command;
use tracing::{debug, info, warn};

/// Lines of encoder output kept in the log when an encode fails.
const DIAGNOSTIC_TAIL_LINES: usize = 20;

#[derive(Debug, Clone)]
pub struct Ffmpeg {
    program: String,
}

impl Ffmpeg {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

/// Single-pass bitrate-targeted encode with the audio stream dropped.
pub fn encode_args(spec: &EncodeSpec) -> Vec<OsString> {
    vec![
        "-y".into(),
        "-i".into(),
        spec.input.clone().into_os_string(),
        "-c:v".into(),
        VIDEO_CODEC.into(),
        "-b:v".into(),
        format!("{}k", spec.bitrate_kbps).into(),
        "-an".into(),
        spec.output.clone().into_os_string(),
    ]
}

#[async_trait]
impl VideoEncoder for Ffmpeg {
    fn tool_name(&self) -> &str {
        &self.program
    }

    fn is_available(&self) -> bool {
        resolve(&self.program)
    }

    async fn encode(&self, spec: &EncodeSpec) -> Result<(), MediaError> {
        info!(
            "🎥 Encoding {} -> {} at {}k",
            spec.input.display(),
            spec.output.display(),
            spec.bitrate_kbps
        );

        let output = Command::new(&self.program)
            .args(encode_args(spec))
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| {
                if e.kind() == ErrorKind::NotFound {
                    MediaError::ToolMissing(self.program.clone())
                } else {
                    MediaError::Io(e)
                }
            })?;

        let diagnostics = combined_output(&output.stdout, &output.stderr);

        if !output.status.success() {
            warn!(
                "{} exited with {}:\n{}",
                self.program,
                output.status,
                tail(&diagnostics, DIAGNOSTIC_TAIL_LINES)
            );
            return Err(MediaError::EncoderExit {
                code: output.status.code(),
            });
        }

        debug!("{} output:\n{}", self.program, tail(&diagnostics, DIAGNOSTIC_TAIL_LINES));
        Ok(())
    }
}

fn combined_output(stdout: &[u8], stderr: &[u8]) -> String {
    let mut text = String::from_utf8_lossy(stdout).into_owned();
    text.push_str(&String::from_utf8_lossy(stderr));
    text
}

fn tail(text: &str, lines: usize) -> String {
    let all: Vec<&str> = text.lines().collect();
    all[all.len().saturating_sub(lines)..].join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    #[cfg(unix)]
    use crate::infrastructure::media::script_tool;
    use std::path::PathBuf;

    fn spec() -> EncodeSpec {
        EncodeSpec {
            input: PathBuf::from("/scratch/vc_1/abc.mov"),
            output: PathBuf::from("/scratch/vc_1/clip_compressed.mp4"),
            bitrate_kbps: 1945,
        }
    }

    #[test]
    fn args_target_bitrate_and_drop_audio() {
        let args: Vec<String> = encode_args(&spec())
            .into_iter()
            .map(|a| a.into_string().unwrap())
            .collect();

        assert_eq!(
            args,
            vec![
                "-y",
                "-i",
                "/scratch/vc_1/abc.mov",
                "-c:v",
                "libx265",
                "-b:v",
                "1945k",
                "-an",
                "/scratch/vc_1/clip_compressed.mp4",
            ]
        );
    }

    #[test]
    fn tail_keeps_last_lines() {
        assert_eq!(tail("a\nb\nc\nd", 2), "c\nd");
        assert_eq!(tail("a", 5), "a");
        assert_eq!(tail("", 5), "");
    }

    #[tokio::test]
    async fn missing_program_is_reported() {
        let encoder = Ffmpeg::new("definitely-not-a-real-ffmpeg-binary");
        assert!(!encoder.is_available());

        let result = encoder.encode(&spec()).await;
        assert!(matches!(result, Err(MediaError::ToolMissing(_))));
    }

    #[test]
    fn exit_error_mentions_code() {
        let err = MediaError::EncoderExit { code: Some(187) };
        assert_eq!(err.to_string(), "encoder exited with status 187");
        let err = MediaError::EncoderExit { code: None };
        assert_eq!(err.to_string(), "encoder exited with a signal");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn failing_tool_reports_exit_code() {
        let encoder = Ffmpeg::new("false");
        assert!(encoder.is_available());

        let result = encoder.encode(&spec()).await;
        assert!(matches!(result, Err(MediaError::EncoderExit { code: Some(1) })));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn custom_exit_code_is_carried_through() {
        let dir = tempfile::tempdir().unwrap();
        let encoder = Ffmpeg::new(script_tool(dir.path(), "echo 'x265 [error]' >&2\nexit 187"));

        let result = encoder.encode(&spec()).await;
        assert!(matches!(result, Err(MediaError::EncoderExit { code: Some(187) })));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn killed_tool_has_no_exit_code() {
        let dir = tempfile::tempdir().unwrap();
        let encoder = Ffmpeg::new(script_tool(dir.path(), "kill -KILL $$"));

        let result = encoder.encode(&spec()).await;
        assert!(matches!(result, Err(MediaError::EncoderExit { code: None })));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn successful_tool_writes_last_argument() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("clip_compressed.mp4");
        let encoder = Ffmpeg::new(script_tool(
            dir.path(),
            "for last; do :; done\nprintf encoded > \"$last\"",
        ));

        let target = EncodeSpec {
            output: output.clone(),
            ..spec()
        };
        encoder.encode(&target).await.unwrap();

        assert_eq!(std::fs::read(&output).unwrap(), b"encoded");
    }
}

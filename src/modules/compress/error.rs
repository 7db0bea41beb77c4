use crate::common::response::ApiError;
use crate::common::upload::UploadError;
use crate::infrastructure::media::MediaError;
use axum::http::StatusCode;

/// Terminal failure of a compress request.
#[derive(Debug, thiserror::Error)]
pub enum CompressError {
    #[error("{0}")]
    RejectedInput(&'static str),

    #[error("unable to read duration")]
    ProbeFailed,

    #[error("ffprobe/ffmpeg not found")]
    ToolMissing,

    #[error("ffmpeg failed: {}", exit_label(.exit_code))]
    EncodeFailed { exit_code: Option<i32> },

    /// A malformed or oversized multipart body, with the status axum assigned.
    #[error("{0}")]
    Upload(String, StatusCode),

    #[error("internal error: {0}")]
    Io(String),
}

fn exit_label(code: &Option<i32>) -> String {
    match code {
        Some(c) => c.to_string(),
        None => "terminated by signal".to_string(),
    }
}

impl CompressError {
    pub const MISSING_INPUT: Self = Self::RejectedInput("missing file or target_mb");
    pub const INVALID_TARGET: Self = Self::RejectedInput("invalid target_mb");

    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::RejectedInput(_) | Self::ProbeFailed => StatusCode::BAD_REQUEST,
            Self::Upload(_, status) => *status,
            Self::ToolMissing | Self::EncodeFailed { .. } | Self::Io(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl From<MediaError> for CompressError {
    fn from(e: MediaError) -> Self {
        match e {
            MediaError::ToolMissing(_) => Self::ToolMissing,
            MediaError::EncoderExit { code } => Self::EncodeFailed { exit_code: code },
            MediaError::Io(e) => Self::Io(e.to_string()),
        }
    }
}

impl From<UploadError> for CompressError {
    fn from(e: UploadError) -> Self {
        match e {
            UploadError::Stream(e) => Self::Upload(e.body_text(), e.status()),
            UploadError::Storage(e) => Self::Io(e.to_string()),
        }
    }
}

impl From<std::io::Error> for CompressError {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e.to_string())
    }
}

impl From<CompressError> for ApiError {
    fn from(e: CompressError) -> Self {
        ApiError(e.to_string(), e.status_code())
    }
}

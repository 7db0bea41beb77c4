use super::dto::{
    input_extension, parse_target_mb, CompressRequest, SavedUpload, TargetSizeError,
    ToolchainStatus,
};
use super::error::CompressError;
use super::service::CompressService;
use super::stream::attachment_response;
use crate::common::response::{ApiError, ApiResponse, ApiSuccess};
use crate::common::upload::{stream_to_file, UploadError};
use crate::common::workspace::ScratchWorkspace;
use crate::state::AppState;
use axum::{
    extract::{Multipart, State},
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};
use tracing::{info, warn};
use uuid::Uuid;

const INDEX_HTML: &str = include_str!("../../../assets/index.html");

/// Landing page with the drop zone and target size field
#[utoipa::path(
    get,
    path = "/",
    responses(
        (status = 200, description = "Upload page", content_type = "text/html", body = String)
    ),
    tag = "Compress"
)]
pub async fn index() -> Html<&'static str> {
    Html(INDEX_HTML)
}

/// Compress an uploaded video to roughly `target_mb` megabytes
///
/// Takes multipart fields `file` and `target_mb` and answers with the
/// encoded mp4 as an attachment. Failures come back as plain text.
#[utoipa::path(
    post,
    path = "/compress",
    request_body(content = String, content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "Encoded video", content_type = "video/mp4", body = Vec<u8>),
        (status = 400, description = "Missing or invalid input, or unreadable duration", body = String),
        (status = 413, description = "Upload exceeds the body limit", body = String),
        (status = 500, description = "Media tools missing or encoder failure", body = String)
    ),
    tag = "Compress"
)]
pub async fn compress_video(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Response, ApiError> {
    CompressService::ensure_toolchain(&state).await?;

    let req = read_form(&state, multipart).await.inspect_err(|e| {
        warn!("Rejected compress request: {}", e);
    })?;

    let video = CompressService::compress(&state, req).await.inspect_err(|e| {
        warn!("Compress failed: {}", e);
    })?;

    Ok(attachment_response(video).await?)
}

/// Reads the multipart form into an already-validated request.
///
/// The upload is written into a fresh workspace as it streams in; any
/// rejection afterwards drops the workspace with it.
async fn read_form(
    state: &AppState,
    mut multipart: Multipart,
) -> Result<CompressRequest, CompressError> {
    let mut upload: Option<SavedUpload> = None;
    let mut target: Option<String> = None;

    while let Some(field) = multipart.next_field().await.map_err(UploadError::from)? {
        let name = field.name().unwrap_or("").to_string();

        match name.as_str() {
            "file" if upload.is_none() => {
                let original_name = field.file_name().unwrap_or("").to_string();
                if original_name.is_empty() {
                    continue;
                }

                let extension = input_extension(&original_name, field.content_type());
                let workspace =
                    ScratchWorkspace::create(&state.config.scratch_root, &state.workspaces)
                        .await?;
                let input_path =
                    workspace.file(&format!("{}.{}", Uuid::new_v4().simple(), extension));

                let size = stream_to_file(field, &input_path).await?;
                info!(
                    "[{}] Saved upload {} ({} bytes)",
                    workspace.id(),
                    original_name,
                    size
                );

                upload = Some(SavedUpload {
                    workspace,
                    input_path,
                    original_name,
                    size,
                });
            }
            "target_mb" => {
                target = Some(field.text().await.map_err(UploadError::from)?);
            }
            _ => {}
        }
    }

    let Some(upload) = upload else {
        return Err(CompressError::MISSING_INPUT);
    };

    let target_mb = parse_target_mb(target.as_deref()).map_err(|e| match e {
        TargetSizeError::Missing => CompressError::MISSING_INPUT,
        TargetSizeError::OutOfRange => CompressError::INVALID_TARGET,
    })?;

    Ok(CompressRequest { upload, target_mb })
}

/// Report whether the media tools resolve on this host
#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Toolchain status", body = ApiResponse<ToolchainStatus>)
    ),
    tag = "Compress"
)]
pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let status = CompressService::toolchain_status(&state).await;

    let message = if status.is_ready() {
        "Toolchain ready"
    } else {
        "Toolchain incomplete"
    };

    ApiSuccess(ApiResponse::success(status, message), StatusCode::OK)
}

use super::bitrate::compute_bitrate_kbps;
use super::dto::{download_name, CompressRequest, ToolStatus, ToolchainStatus};
use super::error::CompressError;
use crate::common::workspace::ScratchWorkspace;
use crate::infrastructure::media::EncodeSpec;
use crate::state::AppState;
use std::path::{Path, PathBuf};
use tracing::{error, info, warn};

/// The encoded artifact, still living inside the request's workspace.
///
/// Dropping it removes the workspace, output included.
#[derive(Debug)]
pub struct CompressedVideo {
    pub workspace: ScratchWorkspace,
    pub output_path: PathBuf,
    pub download_name: String,
}

pub struct CompressService;

impl CompressService {
    /// Resolves both tools once, off the async workers (PATH lookups hit
    /// the file system).
    pub async fn toolchain_status(state: &AppState) -> ToolchainStatus {
        let prober = state.prober.clone();
        let encoder = state.encoder.clone();
        let (prober_ok, encoder_ok) =
            tokio::task::spawn_blocking(move || (prober.is_available(), encoder.is_available()))
                .await
                .unwrap_or_else(|e| {
                    error!("Toolchain check panicked: {}", e);
                    (false, false)
                });

        ToolchainStatus {
            prober: ToolStatus {
                name: state.prober.tool_name().to_string(),
                available: prober_ok,
            },
            encoder: ToolStatus {
                name: state.encoder.tool_name().to_string(),
                available: encoder_ok,
            },
        }
    }

    /// Both external tools must resolve before any upload is read.
    pub async fn ensure_toolchain(state: &AppState) -> Result<(), CompressError> {
        let status = Self::toolchain_status(state).await;
        if status.is_ready() {
            Ok(())
        } else {
            warn!(
                "Toolchain unavailable: {}={}, {}={}",
                status.prober.name,
                status.prober.available,
                status.encoder.name,
                status.encoder.available
            );
            Err(CompressError::ToolMissing)
        }
    }

    /// Probe, plan, encode. The input copy is gone when this returns,
    /// whatever the outcome; the workspace goes with the error on failure.
    pub async fn compress(
        state: &AppState,
        req: CompressRequest,
    ) -> Result<CompressedVideo, CompressError> {
        let CompressRequest { upload, target_mb } = req;
        let workspace = upload.workspace;
        let id = workspace.id();

        let duration = match state.prober.probe_duration(&upload.input_path).await {
            Ok(d) => d,
            Err(e) => {
                remove_input(&upload.input_path).await;
                return Err(e.into());
            }
        };
        if duration.is_nan() || duration <= 0.0 {
            info!("[{}] Rejected: unreadable duration ({})", id, duration);
            remove_input(&upload.input_path).await;
            return Err(CompressError::ProbeFailed);
        }
        info!("[{}] Probed {:.3}s", id, duration);

        let bitrate_kbps = compute_bitrate_kbps(target_mb, duration);
        info!("[{}] Planned {}k for {}MB", id, bitrate_kbps, target_mb);

        let download_name = download_name(&upload.original_name);
        let spec = EncodeSpec {
            input: upload.input_path.clone(),
            output: workspace.file(&download_name),
            bitrate_kbps,
        };

        let encoded = state.encoder.encode(&spec).await;
        remove_input(&spec.input).await;
        encoded?;

        info!("[{}] Encoded {}", id, spec.output.display());
        Ok(CompressedVideo {
            workspace,
            output_path: spec.output,
            download_name,
        })
    }
}

async fn remove_input(path: &Path) {
    if let Err(e) = tokio::fs::remove_file(path).await {
        if e.kind() != std::io::ErrorKind::NotFound {
            warn!("Failed to remove input {}: {}", path.display(), e);
        }
    }
}

use crate::common::workspace::WorkspaceRegistry;
use crate::config::settings::AppConfig;
use crate::infrastructure::media::{DurationProber, Ffmpeg, Ffprobe, VideoEncoder};
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub config: AppConfig,
    pub prober: Arc<dyn DurationProber>,
    pub encoder: Arc<dyn VideoEncoder>,
    pub workspaces: WorkspaceRegistry,
}

impl AppState {
    pub fn new(
        config: AppConfig,
        prober: Arc<dyn DurationProber>,
        encoder: Arc<dyn VideoEncoder>,
    ) -> Self {
        Self {
            config,
            prober,
            encoder,
            workspaces: WorkspaceRegistry::new(),
        }
    }

    /// State backed by the real ffprobe/ffmpeg executables named in `config`.
    pub fn with_system_tools(config: AppConfig) -> Self {
        let prober = Arc::new(Ffprobe::new(config.ffprobe_bin.clone()));
        let encoder = Arc::new(Ffmpeg::new(config.ffmpeg_bin.clone()));
        Self::new(config, prober, encoder)
    }
}

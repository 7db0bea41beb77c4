use std::env;
use std::str::FromStr;

pub enum EnvKey {
    ServerHost,
    ServerPort,
    ScratchDir,
    MaxUploadMb,
    ScratchTtlSecs,
    SweepIntervalSecs,
    FfprobeBin,
    FfmpegBin,
}

impl EnvKey {
    pub fn as_str(&self) -> &'static str {
        match self {
            EnvKey::ServerHost => "APP_HOST",
            EnvKey::ServerPort => "APP_PORT",
            EnvKey::ScratchDir => "SCRATCH_DIR",
            EnvKey::MaxUploadMb => "MAX_UPLOAD_MB",
            EnvKey::ScratchTtlSecs => "SCRATCH_TTL_SECS",
            EnvKey::SweepIntervalSecs => "SWEEP_INTERVAL_SECS",
            EnvKey::FfprobeBin => "FFPROBE_BIN",
            EnvKey::FfmpegBin => "FFMPEG_BIN",
        }
    }
}

pub fn get(key: EnvKey) -> Result<String, env::VarError> {
    env::var(key.as_str())
}

pub fn get_or(key: EnvKey, default: &str) -> String {
    env::var(key.as_str()).unwrap_or_else(|_| default.to_string())
}

pub fn get_parsed<T: FromStr>(key: EnvKey, default: T) -> T {
    match get(key) {
        Ok(val) => val.trim().parse::<T>().unwrap_or(default),
        Err(_) => default,
    }
}

use crate::common::workspace::{workspace_id, WorkspaceRegistry, WORKSPACE_PREFIX};
use crate::config::settings::AppConfig;
use anyhow::{Context, Result};
use std::path::Path;
use std::time::{Duration, SystemTime};
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, error, info, warn};

/// Periodically removes workspaces left behind by requests that never
/// released them (crashes, killed workers). Workspaces still listed in
/// `live` are never touched.
pub async fn start_scratch_janitor(config: AppConfig, live: WorkspaceRegistry) {
    info!(
        "🧹 Starting scratch janitor on {} (every {:?}, ttl {:?})",
        config.scratch_root.display(),
        config.sweep_interval,
        config.scratch_ttl
    );

    let mut ticker = interval(config.sweep_interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        ticker.tick().await;

        match sweep_stale_workspaces(&config.scratch_root, config.scratch_ttl, &live).await {
            Ok(0) => debug!("Janitor found nothing to remove"),
            Ok(removed) => info!("🧹 Removed {} stale workspace(s)", removed),
            Err(e) => error!("❌ Scratch sweep failed: {:#}", e),
        }
    }
}

/// Deletes workspace directories under `root` untouched for longer than
/// `ttl`. Returns how many were removed. A missing root is not an error.
///
/// An output being appended to does not bump its directory's mtime, so a
/// long encode looks stale; workspaces owned by a request are skipped.
pub async fn sweep_stale_workspaces(
    root: &Path,
    ttl: Duration,
    live: &WorkspaceRegistry,
) -> Result<usize> {
    let mut entries = match tokio::fs::read_dir(root).await {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(0),
        Err(e) => {
            return Err(e).with_context(|| format!("reading {}", root.display()));
        }
    };

    let now = SystemTime::now();
    let mut removed = 0;

    while let Some(entry) = entries.next_entry().await? {
        let name = entry.file_name();
        let Some(name) = name.to_str() else { continue };
        if !name.starts_with(WORKSPACE_PREFIX) {
            continue;
        }
        if workspace_id(name).is_some_and(|id| live.is_live(id)) {
            debug!("Skipping live workspace {}", name);
            continue;
        }

        let metadata = match entry.metadata().await {
            Ok(m) if m.is_dir() => m,
            Ok(_) => continue,
            Err(e) => {
                warn!("Skipping {}: {}", name, e);
                continue;
            }
        };

        let age = metadata
            .modified()
            .ok()
            .and_then(|modified| now.duration_since(modified).ok())
            .unwrap_or_default();
        if age < ttl {
            continue;
        }

        match tokio::fs::remove_dir_all(entry.path()).await {
            Ok(()) => {
                debug!("Removed stale workspace {} (age {:?})", name, age);
                removed += 1;
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => warn!("Failed to remove {}: {}", name, e),
        }
    }

    Ok(removed)
}

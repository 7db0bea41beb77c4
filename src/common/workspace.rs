use std::collections::HashSet;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tracing::{debug, error};
use uuid::Uuid;

/// Directory name prefix shared by every per-request workspace.
/// The janitor only ever touches entries carrying it.
pub const WORKSPACE_PREFIX: &str = "vc_";

/// Ids of the workspaces a request still owns.
///
/// Shared between the handlers and the janitor: a workspace stays listed
/// from creation until it is released, however long its encode runs.
#[derive(Clone, Debug, Default)]
pub struct WorkspaceRegistry {
    live: Arc<Mutex<HashSet<Uuid>>>,
}

impl WorkspaceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_live(&self, id: Uuid) -> bool {
        self.live.lock().map(|set| set.contains(&id)).unwrap_or(false)
    }

    pub fn len(&self) -> usize {
        self.live.lock().map(|set| set.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn register(&self, id: Uuid) {
        if let Ok(mut set) = self.live.lock() {
            set.insert(id);
        }
    }

    fn unregister(&self, id: Uuid) {
        if let Ok(mut set) = self.live.lock() {
            set.remove(&id);
        }
    }
}

/// Recovers the workspace id from a directory name under the scratch root.
pub fn workspace_id(dir_name: &str) -> Option<Uuid> {
    dir_name
        .strip_prefix(WORKSPACE_PREFIX)
        .and_then(|rest| Uuid::parse_str(rest).ok())
}

/// Per-request scratch directory.
///
/// Holds the uploaded input and the encoded output. The directory and
/// everything in it is removed when the value is released or dropped, so
/// every exit path of a request (success, rejection, encoder failure,
/// client abort) gives its disk space back.
#[derive(Debug)]
pub struct ScratchWorkspace {
    id: Uuid,
    path: PathBuf,
    registry: WorkspaceRegistry,
    released: bool,
}

impl ScratchWorkspace {
    pub async fn create(root: &Path, registry: &WorkspaceRegistry) -> io::Result<Self> {
        tokio::fs::create_dir_all(root).await?;

        let id = Uuid::new_v4();
        let path = root.join(format!("{}{}", WORKSPACE_PREFIX, id.simple()));
        tokio::fs::create_dir(&path).await?;
        registry.register(id);

        debug!("Created scratch workspace {}", path.display());
        Ok(Self {
            id,
            path,
            registry: registry.clone(),
            released: false,
        })
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn file(&self, name: &str) -> PathBuf {
        self.path.join(name)
    }

    /// Removes the directory and waits for it to be gone.
    pub async fn release(mut self) {
        self.released = true;
        self.registry.unregister(self.id);
        match tokio::fs::remove_dir_all(&self.path).await {
            Ok(()) => debug!("Removed scratch workspace {}", self.path.display()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => error!("Failed to remove scratch workspace {}: {}", self.path.display(), e),
        }
    }
}

impl Drop for ScratchWorkspace {
    fn drop(&mut self) {
        if self.released {
            return;
        }
        self.registry.unregister(self.id);

        let path = std::mem::take(&mut self.path);
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                handle.spawn_blocking(move || remove_workspace_dir(&path));
            }
            Err(_) => remove_workspace_dir(&path),
        }
    }
}

fn remove_workspace_dir(path: &Path) {
    match std::fs::remove_dir_all(path) {
        Ok(()) => debug!("Removed scratch workspace {}", path.display()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => {}
        Err(e) => error!("Failed to remove scratch workspace {}: {}", path.display(), e),
    }
}

/// Polls until `path` no longer exists, for removals running off-task.
#[cfg(test)]
pub(crate) async fn wait_until_removed(path: &Path) -> bool {
    for _ in 0..100 {
        if !path.exists() {
            return true;
        }
        tokio::time::sleep(std::time::Duration::from_millis(10)).await;
    }
    !path.exists()
}

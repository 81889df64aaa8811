use crate::error::{Result, RunwayError};
use crate::paths;
use crate::progress::ProgressState;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

// ---------------------------------------------------------------------------
// ProgressStore
// ---------------------------------------------------------------------------

/// Persistence port for [`ProgressState`]. Implementations must make `save`
/// atomic: after a crash the store holds either the previous state or the new
/// one.
pub trait ProgressStore {
    /// The persisted state, or `None` when no campaign was ever started.
    fn load(&self) -> Result<Option<ProgressState>>;
    fn save(&self, state: &ProgressState) -> Result<()>;
    fn clear(&self) -> Result<()>;
}

/// Load the persisted state, treating a document that no longer parses as
/// absent. I/O failures still propagate.
pub fn load_or_discard(store: &impl ProgressStore) -> Result<Option<ProgressState>> {
    match store.load() {
        Err(RunwayError::Yaml(e)) => {
            tracing::warn!(error = %e, "local progress is unreadable; starting without a campaign");
            Ok(None)
        }
        other => other,
    }
}

// ---------------------------------------------------------------------------
// FileStore
// ---------------------------------------------------------------------------

/// Stores the whole state as `.runway/state.yaml` under a root directory.
#[derive(Debug, Clone)]
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    pub fn new(root: &Path) -> Self {
        Self {
            path: paths::state_path(root),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ProgressStore for FileStore {
    fn load(&self) -> Result<Option<ProgressState>> {
        let Some(data) = crate::io::read_optional(&self.path)? else {
            return Ok(None);
        };
        let state: ProgressState = serde_yaml::from_str(&data)?;
        Ok(Some(state))
    }

    fn save(&self, state: &ProgressState) -> Result<()> {
        let data = serde_yaml::to_string(state)?;
        crate::io::atomic_write(&self.path, data.as_bytes())
    }

    fn clear(&self) -> Result<()> {
        match std::fs::remove_file(&self.path) {
            Err(e) if e.kind() != std::io::ErrorKind::NotFound => Err(e.into()),
            _ => Ok(()),
        }
    }
}

// ---------------------------------------------------------------------------
// MemoryStore
// ---------------------------------------------------------------------------

/// In-memory store. Clones share the same slot, so a test can keep a handle
/// and inspect what a session persisted.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    slot: Arc<Mutex<Option<ProgressState>>>,
    writes: Arc<Mutex<usize>>,
    read_only: bool,
}

impl MemoryStore {
    pub fn with_state(state: ProgressState) -> Self {
        let store = Self::default();
        *store.slot.lock().unwrap_or_else(|e| e.into_inner()) = Some(state);
        store
    }

    /// A store whose writes always fail, for exercising persistence errors.
    pub fn read_only(self) -> Self {
        Self {
            read_only: true,
            ..self
        }
    }

    pub fn snapshot(&self) -> Option<ProgressState> {
        self.slot.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    pub fn write_count(&self) -> usize {
        *self.writes.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn check_writable(&self) -> Result<()> {
        if self.read_only {
            return Err(std::io::Error::new(
                std::io::ErrorKind::PermissionDenied,
                "store is read-only",
            )
            .into());
        }
        *self.writes.lock().unwrap_or_else(|e| e.into_inner()) += 1;
        Ok(())
    }
}

impl ProgressStore for MemoryStore {
    fn load(&self) -> Result<Option<ProgressState>> {
        Ok(self.snapshot())
    }

    fn save(&self, state: &ProgressState) -> Result<()> {
        self.check_writable()?;
        *self.slot.lock().unwrap_or_else(|e| e.into_inner()) = Some(state.clone());
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        self.check_writable()?;
        *self.slot.lock().unwrap_or_else(|e| e.into_inner()) = None;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

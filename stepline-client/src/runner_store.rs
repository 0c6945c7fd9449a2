//! Per-pipeline global runner selection
//!
//! Maps a pipeline id to the runner path used when the pipeline's
//! mobile-automation steps don't pin one themselves.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use tracing::debug;

use crate::error::{ClientError, Result};

/// Storage for the selected global runner of each pipeline
pub trait RunnerStore: Send + Sync {
    fn runner_for(&self, pipeline_id: &str) -> Result<Option<String>>;

    fn set_runner(&self, pipeline_id: &str, runner_path: &str) -> Result<()>;

    /// Returns whether a selection was removed
    fn clear_runner(&self, pipeline_id: &str) -> Result<bool>;
}

/// In-process store, lost on exit
#[derive(Debug, Default)]
pub struct MemoryRunnerStore {
    runners: Mutex<HashMap<String, String>>,
}

impl MemoryRunnerStore {
    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, String>> {
        self.runners.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl RunnerStore for MemoryRunnerStore {
    fn runner_for(&self, pipeline_id: &str) -> Result<Option<String>> {
        Ok(self.lock().get(pipeline_id).cloned())
    }

    fn set_runner(&self, pipeline_id: &str, runner_path: &str) -> Result<()> {
        self.lock()
            .insert(pipeline_id.to_string(), runner_path.to_string());
        Ok(())
    }

    fn clear_runner(&self, pipeline_id: &str) -> Result<bool> {
        Ok(self.lock().remove(pipeline_id).is_some())
    }
}

/// JSON object on disk, `{ "<pipeline_id>": "<runner_path>" }`
///
/// A missing file reads as empty. Every write rewrites the whole file.
#[derive(Debug)]
pub struct FileRunnerStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl FileRunnerStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load(&self) -> Result<HashMap<String, String>> {
        if !self.path.exists() {
            return Ok(HashMap::new());
        }
        let text = fs::read_to_string(&self.path).map_err(|e| {
            ClientError::Store(format!("Failed to read {}: {}", self.path.display(), e))
        })?;
        if text.trim().is_empty() {
            return Ok(HashMap::new());
        }
        serde_json::from_str(&text).map_err(|e| {
            ClientError::Store(format!("Failed to parse {}: {}", self.path.display(), e))
        })
    }

    fn save(&self, runners: &HashMap<String, String>) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| {
                ClientError::Store(format!("Failed to create {}: {}", parent.display(), e))
            })?;
        }
        let text = serde_json::to_string_pretty(runners)
            .map_err(|e| ClientError::Store(e.to_string()))?;
        fs::write(&self.path, text).map_err(|e| {
            ClientError::Store(format!("Failed to write {}: {}", self.path.display(), e))
        })?;
        debug!("Saved {} runner selection(s) to {}", runners.len(), self.path.display());
        Ok(())
    }
}

impl RunnerStore for FileRunnerStore {
    fn runner_for(&self, pipeline_id: &str) -> Result<Option<String>> {
        let _guard = self.lock.lock().unwrap_or_else(|e| e.into_inner());
        Ok(self.load()?.remove(pipeline_id))
    }

    fn set_runner(&self, pipeline_id: &str, runner_path: &str) -> Result<()> {
        let _guard = self.lock.lock().unwrap_or_else(|e| e.into_inner());
        let mut runners = self.load()?;
        runners.insert(pipeline_id.to_string(), runner_path.to_string());
        self.save(&runners)
    }

    fn clear_runner(&self, pipeline_id: &str) -> Result<bool> {
        let _guard = self.lock.lock().unwrap_or_else(|e| e.into_inner());
        let mut runners = self.load()?;
        let removed = runners.remove(pipeline_id).is_some();
        if removed {
            self.save(&runners)?;
        }
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_store() {
        let store = MemoryRunnerStore::default();
        assert_eq!(store.runner_for("p1").unwrap(), None);

        store.set_runner("p1", "acme/runners/pixel").unwrap();
        assert_eq!(
            store.runner_for("p1").unwrap().as_deref(),
            Some("acme/runners/pixel")
        );

        assert!(store.clear_runner("p1").unwrap());
        assert!(!store.clear_runner("p1").unwrap());
        assert_eq!(store.runner_for("p1").unwrap(), None);
    }

    #[test]
    fn test_file_store_persists_across_instances() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("runners.json");

        let store = FileRunnerStore::new(&path);
        assert_eq!(store.runner_for("p1").unwrap(), None);
        store.set_runner("p1", "acme/runners/pixel").unwrap();
        store.set_runner("p2", "acme/runners/iphone").unwrap();

        let reopened = FileRunnerStore::new(&path);
        assert_eq!(
            reopened.runner_for("p2").unwrap().as_deref(),
            Some("acme/runners/iphone")
        );
        assert!(reopened.clear_runner("p1").unwrap());
        assert_eq!(store.runner_for("p1").unwrap(), None);
    }

    #[test]
    fn test_file_store_rejects_corrupt_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("runners.json");
        fs::write(&path, "not json").unwrap();

        let err = FileRunnerStore::new(&path).runner_for("p1").unwrap_err();
        assert!(matches!(err, ClientError::Store(_)));
    }
}

//! Persistent task store boundary.
//!
//! The scheduler core does not own task persistence; it only needs a
//! record store that can load the task list and write back notification
//! state changes. [`JsonTaskStore`] is the file-backed implementation.

use std::fs;
use std::path::PathBuf;

use crate::error::CoreError;
use crate::task::{NotificationState, Task};

/// Simple record-store interface for tasks.
pub trait TaskStore {
    fn load(&self) -> Result<Vec<Task>, CoreError>;
    fn save(&self, tasks: &[Task]) -> Result<(), CoreError>;

    /// Update one task's notification state and persist.
    fn set_notification_state(
        &self,
        task_id: &str,
        state: NotificationState,
    ) -> Result<(), CoreError> {
        let mut tasks = self.load()?;
        let task = tasks
            .iter_mut()
            .find(|t| t.id == task_id)
            .ok_or_else(|| CoreError::TaskNotFound(task_id.to_string()))?;
        task.notification_state = state;
        self.save(&tasks)
    }
}

/// JSON-file task store. A missing file reads as an empty task list.
pub struct JsonTaskStore {
    path: PathBuf,
}

impl JsonTaskStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl TaskStore for JsonTaskStore {
    fn load(&self) -> Result<Vec<Task>, CoreError> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }
        let raw = fs::read_to_string(&self.path)?;
        serde_json::from_str(&raw).map_err(|e| CoreError::Serialize(e.to_string()))
    }

    fn save(&self, tasks: &[Task]) -> Result<(), CoreError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let raw =
            serde_json::to_string_pretty(tasks).map_err(|e| CoreError::Serialize(e.to_string()))?;
        fs::write(&self.path, raw)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_loads_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonTaskStore::new(dir.path().join("tasks.json"));
        assert!(store.load().unwrap().is_empty());
    }

    #[test]
    fn save_load_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonTaskStore::new(dir.path().join("tasks.json"));

        let tasks = vec![Task::new("a"), Task::new("b")];
        store.save(&tasks).unwrap();

        let loaded = store.load().unwrap();
        assert_eq!(loaded.len(), 2);
        assert_eq!(loaded[0].id, tasks[0].id);
    }

    #[test]
    fn set_notification_state_persists() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonTaskStore::new(dir.path().join("tasks.json"));

        let task = Task::new("a");
        let id = task.id.clone();
        store.save(&[task]).unwrap();

        store
            .set_notification_state(&id, NotificationState::Scheduled)
            .unwrap();

        let loaded = store.load().unwrap();
        assert_eq!(loaded[0].notification_state, NotificationState::Scheduled);
    }

    #[test]
    fn unknown_task_state_update_errors() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonTaskStore::new(dir.path().join("tasks.json"));
        store.save(&[]).unwrap();

        let err = store
            .set_notification_state("nope", NotificationState::Failed)
            .unwrap_err();
        assert!(matches!(err, CoreError::TaskNotFound(_)));
    }
}

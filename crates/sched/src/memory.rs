//! In-process alert registry.
//!
//! Backs the worker binary and tests. An optional capacity mimics the
//! platform ceiling, except that a full registry reports `AddFailed`
//! instead of silently dropping the alert the way the real platform does.

use std::collections::HashMap;

use tokio::sync::Mutex;

use crate::registry::{AlertRegistry, RegistryError, ScheduledAlert};

pub struct MemoryRegistry {
    alerts: Mutex<HashMap<String, ScheduledAlert>>,
    capacity: Option<usize>,
}

impl MemoryRegistry {
    pub fn new() -> Self {
        Self {
            alerts: Mutex::new(HashMap::new()),
            capacity: None,
        }
    }

    /// Registry that rejects adds beyond `capacity` outstanding alerts.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            alerts: Mutex::new(HashMap::new()),
            capacity: Some(capacity),
        }
    }
}

impl Default for MemoryRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl AlertRegistry for MemoryRegistry {
    async fn pending(&self) -> Result<Vec<ScheduledAlert>, RegistryError> {
        Ok(self.alerts.lock().await.values().cloned().collect())
    }

    async fn add(&self, alert: ScheduledAlert) -> Result<(), RegistryError> {
        let mut alerts = self.alerts.lock().await;
        if let Some(cap) = self.capacity {
            if alerts.len() >= cap && !alerts.contains_key(&alert.identifier()) {
                return Err(RegistryError::AddFailed(format!(
                    "registry full ({} alerts)",
                    cap
                )));
            }
        }
        alerts.insert(alert.identifier(), alert);
        Ok(())
    }

    async fn remove(&self, identifiers: &[String]) {
        let mut alerts = self.alerts.lock().await;
        for id in identifiers {
            alerts.remove(id);
        }
    }

    async fn remove_matching(&self, task_id: &str) {
        let prefix = format!("{}#", task_id);
        self.alerts
            .lock()
            .await
            .retain(|id, _| !id.starts_with(&prefix));
    }

    async fn remove_all(&self) {
        self.alerts.lock().await.clear();
    }

    async fn count(&self) -> Result<usize, RegistryError> {
        Ok(self.alerts.lock().await.len())
    }
}

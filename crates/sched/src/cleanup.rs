//! Capacity reconciliation for the alert registry.
//!
//! The platform silently drops alerts past its hard cap rather than
//! erroring, so the scheduler proactively evicts before adding: expired
//! alerts first, then the earliest-firing future alerts down to the
//! target count. The eviction is global across all tasks, not
//! per-task-fair — a simplicity tradeoff that guarantees the registry
//! stays under the ceiling at the cost of a heavily-recurring task's
//! tail occurrences.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use tracing::{debug, info};

use tickler_core::config::SchedulerConfig;

use crate::registry::{AlertRegistry, RegistryError};

/// What one `reconcile` pass removed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EvictionReport {
    /// Outstanding alert count observed at the start of the pass.
    pub inspected: usize,
    /// Alerts whose firing instant was already in the past.
    pub expired_removed: usize,
    /// Future alerts evicted earliest-first to reach the target count.
    pub future_removed: usize,
}

impl EvictionReport {
    pub fn removed(&self) -> usize {
        self.expired_removed + self.future_removed
    }
}

pub struct CleanupPolicy {
    config: SchedulerConfig,
}

impl CleanupPolicy {
    pub fn new(config: SchedulerConfig) -> Self {
        Self { config }
    }

    /// Bring the registry back under the soft threshold.
    ///
    /// No-op while the count is at or below the threshold. Otherwise
    /// evicts every expired alert, then the earliest-firing future
    /// alerts until `target_count` remain. An alert that is the sole
    /// remaining alert for its task is never evicted in the second
    /// phase — a task must not be stranded without its one reminder.
    pub async fn reconcile(
        &self,
        registry: &dyn AlertRegistry,
        now: DateTime<Utc>,
    ) -> Result<EvictionReport, RegistryError> {
        let inspected = registry.count().await?;
        if inspected <= self.config.soft_threshold {
            debug!(
                count = inspected,
                soft_threshold = self.config.soft_threshold,
                "registry under threshold, no eviction"
            );
            return Ok(EvictionReport {
                inspected,
                ..EvictionReport::default()
            });
        }

        let pending = registry.pending().await?;
        let (expired, mut future): (Vec<_>, Vec<_>) =
            pending.into_iter().partition(|a| a.fires_at < now);

        let expired_ids: Vec<String> = expired.iter().map(|a| a.identifier()).collect();
        if !expired_ids.is_empty() {
            registry.remove(&expired_ids).await;
        }

        let mut evicted = Vec::new();
        if future.len() > self.config.target_count {
            // Enumeration order is unspecified; sort before evicting.
            future.sort_by_key(|a| a.fires_at);

            let mut per_task: HashMap<&str, usize> = HashMap::new();
            for alert in &future {
                *per_task.entry(alert.task_id.as_str()).or_insert(0) += 1;
            }

            let excess = future.len() - self.config.target_count;
            for alert in &future {
                if evicted.len() == excess {
                    break;
                }
                let remaining = per_task.entry(alert.task_id.as_str()).or_insert(0);
                if *remaining <= 1 {
                    continue;
                }
                *remaining -= 1;
                evicted.push(alert.identifier());
            }

            if !evicted.is_empty() {
                registry.remove(&evicted).await;
            }
        }

        let report = EvictionReport {
            inspected,
            expired_removed: expired_ids.len(),
            future_removed: evicted.len(),
        };
        info!(
            inspected = report.inspected,
            expired_removed = report.expired_removed,
            future_removed = report.future_removed,
            "registry reconciled"
        );
        Ok(report)
    }
}

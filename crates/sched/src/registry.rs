//! Alert registry boundary and the materialized alert unit.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use tickler_core::task::Priority;

/// Errors surfaced by the platform alert facility.
#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    /// The user has not granted alert permission. Fatal to scheduling
    /// until resolved by the user; never retried automatically.
    #[error("alert permission not granted")]
    PermissionDenied,

    /// A single alert failed to register. Transient; retried only via
    /// the next full re-schedule, never within the same batch.
    #[error("alert registration failed: {0}")]
    AddFailed(String),

    /// The registry itself is unreachable. Aborts the whole batch.
    #[error("alert registry unavailable: {0}")]
    Unavailable(String),
}

/// Opaque data the registry needs to render an alert. Irrelevant to
/// scheduling logic.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlertPayload {
    pub title: String,
    #[serde(default)]
    pub priority: Priority,
}

impl AlertPayload {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            priority: Priority::Normal,
        }
    }
}

/// One materialized occurrence awaiting delivery.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduledAlert {
    /// Owning task.
    pub task_id: String,
    /// 0-based index within the task's current scheduling batch.
    pub sequence_number: u32,
    /// Absolute firing instant.
    pub fires_at: DateTime<Utc>,
    pub payload: AlertPayload,
}

impl ScheduledAlert {
    /// Registry identifier. Per-task cancellation matches on the
    /// `"{task_id}#"` prefix.
    pub fn identifier(&self) -> String {
        format!("{}#{}", self.task_id, self.sequence_number)
    }
}

/// The platform facility holding pending alerts.
///
/// Assumed eventually consistent: an `add` may not be visible to an
/// immediately following `pending`/`count`, so the scheduler never relies
/// on read-after-write within a single scheduling call. Removal is best
/// effort and does not report per-identifier outcomes.
#[async_trait::async_trait]
pub trait AlertRegistry: Send + Sync {
    /// Enumerate all pending alerts, in unspecified order.
    async fn pending(&self) -> Result<Vec<ScheduledAlert>, RegistryError>;

    /// Register one alert.
    async fn add(&self, alert: ScheduledAlert) -> Result<(), RegistryError>;

    /// Remove alerts by identifier. Unknown identifiers are ignored.
    async fn remove(&self, identifiers: &[String]);

    /// Remove every alert owned by the given task.
    async fn remove_matching(&self, task_id: &str);

    /// Remove every pending alert.
    async fn remove_all(&self);

    /// Number of outstanding alerts.
    async fn count(&self) -> Result<usize, RegistryError>;
}

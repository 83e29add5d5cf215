//! Task record and notification state marker.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::rule::RecurrenceRule;

/// Whether a task currently has alerts materialized for it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum NotificationState {
    /// No alerts scheduled (non-recurring without due date, or never scheduled).
    #[default]
    None,
    /// At least one alert registered in the last scheduling run.
    Scheduled,
    /// The last scheduling run registered zero alerts.
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    Low,
    #[default]
    Normal,
    High,
}

/// A task record. The core only reads and writes the identity, the
/// recurrence fields, and the notification state; everything else is
/// payload for the alert registry to render.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub priority: Priority,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub recurrence: RecurrenceRule,
    #[serde(default)]
    pub notification_state: NotificationState,
}

impl Task {
    /// Create a new non-recurring task with a fresh id.
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            title: title.into(),
            priority: Priority::Normal,
            due_date: None,
            recurrence: RecurrenceRule::never(),
            notification_state: NotificationState::None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_task_has_unique_id_and_defaults() {
        let a = Task::new("water the plants");
        let b = Task::new("water the plants");
        assert_ne!(a.id, b.id);
        assert_eq!(a.notification_state, NotificationState::None);
        assert!(!a.recurrence.kind.is_recurring());
    }

    #[test]
    fn task_json_roundtrip() {
        let task = Task::new("standup");
        let json = serde_json::to_string(&task).unwrap();
        let back: Task = serde_json::from_str(&json).unwrap();
        assert_eq!(back.id, task.id);
        assert_eq!(back.title, task.title);
    }
}

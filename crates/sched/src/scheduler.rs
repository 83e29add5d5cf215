//! Orchestrates occurrence sequences into registry alerts for one task.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{info, warn};

use tickler_core::config::SchedulerConfig;
use tickler_core::rule::{InvalidRule, RecurrenceRule};
use tickler_recur::upcoming;

use crate::cleanup::CleanupPolicy;
use crate::registry::{AlertPayload, AlertRegistry, RegistryError, ScheduledAlert};

/// Errors that stop a scheduling call before or during the batch.
#[derive(Debug, thiserror::Error)]
pub enum ScheduleError {
    /// Rule validation failed; detected before any registry I/O.
    #[error(transparent)]
    InvalidRule(#[from] InvalidRule),

    /// The rule produced zero occurrences (e.g. its end date already
    /// passed). Reported, not retried.
    #[error("rule produced no upcoming occurrence")]
    NoOccurrenceFound,

    /// Systemic registry failure; the remaining batch is abandoned.
    #[error(transparent)]
    Registry(#[from] RegistryError),
}

/// Outcome of one scheduling batch. `succeeded == 0` is the caller's
/// signal to surface a user-visible failure; partial success is logged
/// only.
#[derive(Debug, Clone, Default)]
pub struct SchedulingReport {
    pub attempted: usize,
    pub succeeded: usize,
    pub first_failure: Option<String>,
}

impl SchedulingReport {
    pub fn is_complete(&self) -> bool {
        self.succeeded == self.attempted
    }
}

/// Schedules one task's upcoming occurrences as registry alerts.
///
/// Callers must serialize `schedule` calls per task (an edit-then-save
/// flow must wait for the previous report); calls for different tasks
/// may interleave freely.
pub struct NotificationScheduler {
    registry: Arc<dyn AlertRegistry>,
    cleanup: CleanupPolicy,
    config: SchedulerConfig,
}

impl NotificationScheduler {
    pub fn new(registry: Arc<dyn AlertRegistry>, config: SchedulerConfig) -> Self {
        Self {
            registry,
            cleanup: CleanupPolicy::new(config.clone()),
            config,
        }
    }

    /// Materialize the rule's upcoming occurrences as alerts for
    /// `task_id`, replacing any alerts the task already owns.
    pub async fn schedule(
        &self,
        task_id: &str,
        rule: &RecurrenceRule,
        payload: AlertPayload,
    ) -> Result<SchedulingReport, ScheduleError> {
        self.schedule_at(task_id, rule, payload, Utc::now()).await
    }

    /// Like [`schedule`](Self::schedule) with an explicit reference
    /// instant. Exposed for deterministic tests and replay.
    pub async fn schedule_at(
        &self,
        task_id: &str,
        rule: &RecurrenceRule,
        payload: AlertPayload,
        now: DateTime<Utc>,
    ) -> Result<SchedulingReport, ScheduleError> {
        rule.validate()?;

        // Cancel-then-recreate: at most one live alert set per task, so
        // an edited rule never double-fires.
        self.registry.remove_matching(task_id).await;

        // Always reconcile before adding, to guarantee headroom.
        self.cleanup.reconcile(self.registry.as_ref(), now).await?;

        if !rule.kind.is_recurring() {
            return Ok(SchedulingReport::default());
        }

        let cap = self.config.max_per_task.min(self.config.platform_alert_cap);
        let occurrences = upcoming(rule, &now, cap);
        if occurrences.is_empty() {
            return Err(ScheduleError::NoOccurrenceFound);
        }

        self.add_batch(task_id, &occurrences, payload).await
    }

    /// Single-shot pipeline for a non-recurring task with a due date.
    pub async fn schedule_once(
        &self,
        task_id: &str,
        fires_at: DateTime<Utc>,
        payload: AlertPayload,
    ) -> Result<SchedulingReport, ScheduleError> {
        let now = Utc::now();
        self.registry.remove_matching(task_id).await;
        self.cleanup.reconcile(self.registry.as_ref(), now).await?;

        if fires_at <= now {
            return Err(ScheduleError::NoOccurrenceFound);
        }
        self.add_batch(task_id, &[fires_at], payload).await
    }

    /// Best-effort cancellation of all alerts owned by a task.
    pub async fn cancel(&self, task_id: &str) {
        self.registry.remove_matching(task_id).await;
    }

    async fn add_batch(
        &self,
        task_id: &str,
        instants: &[DateTime<Utc>],
        payload: AlertPayload,
    ) -> Result<SchedulingReport, ScheduleError> {
        let attempted = instants.len();
        let mut succeeded = 0;
        let mut first_failure = None;

        for (index, fires_at) in instants.iter().enumerate() {
            let alert = ScheduledAlert {
                task_id: task_id.to_string(),
                sequence_number: index as u32,
                fires_at: *fires_at,
                payload: payload.clone(),
            };
            match self.registry.add(alert).await {
                Ok(()) => succeeded += 1,
                Err(e @ RegistryError::AddFailed(_)) => {
                    // One failed alert must not abort the rest.
                    warn!(
                        task_id = %task_id,
                        sequence = index,
                        error = %e,
                        "alert registration failed"
                    );
                    if first_failure.is_none() {
                        first_failure = Some(e.to_string());
                    }
                }
                Err(e) => {
                    warn!(
                        task_id = %task_id,
                        sequence = index,
                        error = %e,
                        "registry failure, abandoning batch"
                    );
                    return Err(e.into());
                }
            }
        }

        let report = SchedulingReport {
            attempted,
            succeeded,
            first_failure,
        };
        if report.is_complete() {
            info!(task_id = %task_id, scheduled = succeeded, "alerts scheduled");
        } else {
            warn!(
                task_id = %task_id,
                attempted = report.attempted,
                succeeded = report.succeeded,
                "partial scheduling"
            );
        }
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryRegistry;
    use chrono::{Duration, TimeZone};
    use tickler_core::rule::RecurrenceKind;

    fn config() -> SchedulerConfig {
        SchedulerConfig::default()
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 1, 5, 9, 0, 0).unwrap()
    }

    fn daily() -> RecurrenceRule {
        RecurrenceRule::every(RecurrenceKind::Daily, 1)
    }

    /// Registry wrapper that fails every add after the first `allow`.
    struct FlakyRegistry {
        inner: MemoryRegistry,
        allow: std::sync::atomic::AtomicUsize,
    }

    #[async_trait::async_trait]
    impl AlertRegistry for FlakyRegistry {
        async fn pending(&self) -> Result<Vec<ScheduledAlert>, RegistryError> {
            self.inner.pending().await
        }
        async fn add(&self, alert: ScheduledAlert) -> Result<(), RegistryError> {
            use std::sync::atomic::Ordering;
            if self.allow.fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
                .is_err()
            {
                return Err(RegistryError::AddFailed("flaky".to_string()));
            }
            self.inner.add(alert).await
        }
        async fn remove(&self, identifiers: &[String]) {
            self.inner.remove(identifiers).await
        }
        async fn remove_matching(&self, task_id: &str) {
            self.inner.remove_matching(task_id).await
        }
        async fn remove_all(&self) {
            self.inner.remove_all().await
        }
        async fn count(&self) -> Result<usize, RegistryError> {
            self.inner.count().await
        }
    }

    /// Registry that is down entirely.
    struct DeadRegistry;

    #[async_trait::async_trait]
    impl AlertRegistry for DeadRegistry {
        async fn pending(&self) -> Result<Vec<ScheduledAlert>, RegistryError> {
            Err(RegistryError::Unavailable("down".to_string()))
        }
        async fn add(&self, _alert: ScheduledAlert) -> Result<(), RegistryError> {
            Err(RegistryError::Unavailable("down".to_string()))
        }
        async fn remove(&self, _identifiers: &[String]) {}
        async fn remove_matching(&self, _task_id: &str) {}
        async fn remove_all(&self) {}
        async fn count(&self) -> Result<usize, RegistryError> {
            Err(RegistryError::Unavailable("down".to_string()))
        }
    }

    #[tokio::test]
    async fn schedules_batch_in_sequence_order() {
        let reg = Arc::new(MemoryRegistry::new());
        let sched = NotificationScheduler::new(reg.clone(), config());

        let report = sched
            .schedule_at("t1", &daily(), AlertPayload::new("water plants"), now())
            .await
            .unwrap();

        assert_eq!(report.attempted, 64);
        assert_eq!(report.succeeded, 64);
        assert!(report.first_failure.is_none());

        let mut alerts = reg.pending().await.unwrap();
        alerts.sort_by_key(|a| a.sequence_number);
        for pair in alerts.windows(2) {
            // Ascending sequence number implies ascending firing instant.
            assert!(pair[1].fires_at > pair[0].fires_at);
        }
    }

    #[tokio::test]
    async fn rescheduling_is_idempotent() {
        let reg = Arc::new(MemoryRegistry::new());
        let sched = NotificationScheduler::new(reg.clone(), config());
        let rule = daily();

        sched
            .schedule_at("t1", &rule, AlertPayload::new("a"), now())
            .await
            .unwrap();
        let first: Vec<_> = {
            let mut p = reg.pending().await.unwrap();
            p.sort_by_key(|a| a.sequence_number);
            p.iter().map(|a| a.fires_at).collect()
        };

        sched
            .schedule_at("t1", &rule, AlertPayload::new("a"), now())
            .await
            .unwrap();
        let second: Vec<_> = {
            let mut p = reg.pending().await.unwrap();
            p.sort_by_key(|a| a.sequence_number);
            p.iter().map(|a| a.fires_at).collect()
        };

        assert_eq!(first, second);
        assert_eq!(reg.count().await.unwrap(), 64);
    }

    #[tokio::test]
    async fn invalid_rule_fails_before_registry_io() {
        let sched = NotificationScheduler::new(Arc::new(DeadRegistry), config());
        let bad = RecurrenceRule::every(RecurrenceKind::SpecificWeekdays, 1);

        // A dead registry would error on any I/O; validation must win.
        let err = sched
            .schedule_at("t1", &bad, AlertPayload::new("x"), now())
            .await
            .unwrap_err();
        assert!(matches!(err, ScheduleError::InvalidRule(_)));
    }

    #[tokio::test]
    async fn expired_rule_reports_no_occurrence() {
        let reg = Arc::new(MemoryRegistry::new());
        let sched = NotificationScheduler::new(reg, config());
        let rule = RecurrenceRule {
            end_date: Some(now() - Duration::days(1)),
            ..daily()
        };

        let err = sched
            .schedule_at("t1", &rule, AlertPayload::new("x"), now())
            .await
            .unwrap_err();
        assert!(matches!(err, ScheduleError::NoOccurrenceFound));
    }

    #[tokio::test]
    async fn non_recurring_rule_schedules_nothing() {
        let reg = Arc::new(MemoryRegistry::new());
        let sched = NotificationScheduler::new(reg.clone(), config());

        let report = sched
            .schedule_at("t1", &RecurrenceRule::never(), AlertPayload::new("x"), now())
            .await
            .unwrap();
        assert_eq!(report.attempted, 0);
        assert_eq!(reg.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn per_alert_failures_do_not_abort_the_batch() {
        let reg = Arc::new(FlakyRegistry {
            inner: MemoryRegistry::new(),
            allow: std::sync::atomic::AtomicUsize::new(3),
        });
        let sched = NotificationScheduler::new(reg, config());

        let report = sched
            .schedule_at("t1", &daily(), AlertPayload::new("x"), now())
            .await
            .unwrap();

        assert_eq!(report.attempted, 64);
        assert_eq!(report.succeeded, 3);
        assert!(report.first_failure.is_some());
    }

    #[tokio::test]
    async fn capped_registry_yields_partial_success() {
        // Rule yields more occurrences than the cap; registry has only
        // 10 free slots. Attempted is capped at the platform max,
        // succeeded at the free headroom.
        let reg = Arc::new(MemoryRegistry::with_capacity(64));
        for i in 0..54u32 {
            reg.add(ScheduledAlert {
                task_id: "other".to_string(),
                sequence_number: i,
                fires_at: now() + Duration::days(i as i64 + 1),
                payload: AlertPayload::new("other"),
            })
            .await
            .unwrap();
        }

        // Thresholds above the current count so cleanup frees nothing.
        let cfg = SchedulerConfig {
            platform_alert_cap: 64,
            soft_threshold: 64,
            target_count: 60,
            max_per_task: 64,
        };
        let sched = NotificationScheduler::new(reg.clone(), cfg);

        let report = sched
            .schedule_at("t1", &RecurrenceRule::every(RecurrenceKind::Hourly, 1),
                AlertPayload::new("x"), now())
            .await
            .unwrap();

        assert_eq!(report.attempted, 64);
        assert_eq!(report.succeeded, 10);
        assert!(report.first_failure.is_some());
    }

    #[tokio::test]
    async fn unavailable_registry_aborts() {
        let sched = NotificationScheduler::new(Arc::new(DeadRegistry), config());
        let err = sched
            .schedule_at("t1", &daily(), AlertPayload::new("x"), now())
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ScheduleError::Registry(RegistryError::Unavailable(_))
        ));
    }

    #[tokio::test]
    async fn schedule_once_registers_single_alert() {
        let reg = Arc::new(MemoryRegistry::new());
        let sched = NotificationScheduler::new(reg.clone(), config());

        let fires_at = Utc::now() + Duration::hours(2);
        let report = sched
            .schedule_once("t1", fires_at, AlertPayload::new("dentist"))
            .await
            .unwrap();

        assert_eq!(report.attempted, 1);
        assert_eq!(report.succeeded, 1);
        let pending = reg.pending().await.unwrap();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].sequence_number, 0);
    }

    #[tokio::test]
    async fn schedule_once_in_the_past_is_rejected() {
        let reg = Arc::new(MemoryRegistry::new());
        let sched = NotificationScheduler::new(reg, config());

        let err = sched
            .schedule_once("t1", Utc::now() - Duration::hours(1), AlertPayload::new("x"))
            .await
            .unwrap_err();
        assert!(matches!(err, ScheduleError::NoOccurrenceFound));
    }

    #[tokio::test]
    async fn cancel_removes_only_that_task() {
        let reg = Arc::new(MemoryRegistry::new());
        let sched = NotificationScheduler::new(reg.clone(), config());

        sched
            .schedule_at("t1", &daily(), AlertPayload::new("a"), now())
            .await
            .unwrap();
        sched
            .schedule_at("t2", &daily(), AlertPayload::new("b"), now())
            .await
            .unwrap();

        sched.cancel("t1").await;

        let remaining = reg.pending().await.unwrap();
        assert!(!remaining.is_empty());
        assert!(remaining.iter().all(|a| a.task_id == "t2"));
    }
}

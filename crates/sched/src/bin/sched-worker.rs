//! sched-worker — materializes task reminders as registry alerts.
//!
//! Loads the task list from the JSON store, optionally imports new tasks
//! from an NL parse-result file, schedules every task against the alert
//! registry, and writes updated notification states back to the store.

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use tracing::{info, warn};

use tickler_core::config::{load_dotenv, Config};
use tickler_core::store::{JsonTaskStore, TaskStore};
use tickler_core::task::{NotificationState, Task};
use tickler_parse::ParsedTask;
use tickler_sched::{AlertPayload, AlertRegistry, MemoryRegistry, NotificationScheduler, ScheduleError};

// ── CLI ─────────────────────────────────────────────────────────────

/// Schedules reminder alerts for every task in the store.
#[derive(Parser, Debug)]
#[command(name = "sched-worker", version, about)]
struct Cli {
    /// Path to the JSON task store (overrides TICKLER_TASKS_FILE).
    #[arg(long, env = "TICKLER_TASKS_FILE")]
    tasks_file: Option<PathBuf>,

    /// JSON file of NL parse results to import as new tasks first.
    #[arg(long)]
    import: Option<PathBuf>,
}

// ── main ────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    load_dotenv();
    let cli = Cli::parse();
    let config = Config::from_env();
    config.log_summary();

    let store = JsonTaskStore::new(
        cli.tasks_file
            .unwrap_or_else(|| config.store.tasks_file.clone()),
    );
    let mut tasks = store.load()?;

    if let Some(path) = &cli.import {
        let raw = std::fs::read_to_string(path)?;
        let parsed: Vec<ParsedTask> = serde_json::from_str(&raw)?;
        info!(count = parsed.len(), path = %path.display(), "importing parsed tasks");
        for p in parsed {
            match (tickler_parse::recurrence_rule(&p), tickler_parse::due_instant(&p)) {
                (Ok(rule), Ok(due)) => {
                    let mut task = Task::new(p.clean_title.clone());
                    task.due_date = due;
                    task.recurrence = rule;
                    tasks.push(task);
                }
                (Err(e), _) | (_, Err(e)) => {
                    warn!(title = %p.clean_title, error = %e, "skipping unparseable task");
                }
            }
        }
    }

    let registry = Arc::new(MemoryRegistry::with_capacity(
        config.scheduler.platform_alert_cap,
    ));
    let scheduler = NotificationScheduler::new(registry.clone(), config.scheduler.clone());

    for task in &mut tasks {
        let payload = AlertPayload {
            title: task.title.clone(),
            priority: task.priority,
        };

        let outcome = if task.recurrence.kind.is_recurring() {
            scheduler.schedule(&task.id, &task.recurrence, payload).await
        } else if let Some(due) = task.due_date {
            scheduler.schedule_once(&task.id, due, payload).await
        } else {
            task.notification_state = NotificationState::None;
            continue;
        };

        task.notification_state = match outcome {
            Ok(report) if report.succeeded > 0 => NotificationState::Scheduled,
            Ok(report) if report.attempted > 0 => {
                warn!(task_id = %task.id, attempted = report.attempted, "no alert registered");
                NotificationState::Failed
            }
            Ok(_) => NotificationState::None,
            Err(ScheduleError::NoOccurrenceFound) => {
                info!(task_id = %task.id, "no upcoming occurrence");
                NotificationState::None
            }
            Err(e) => {
                warn!(task_id = %task.id, error = %e, "scheduling failed");
                NotificationState::Failed
            }
        };
    }

    store.save(&tasks)?;
    info!(
        tasks = tasks.len(),
        outstanding = registry.count().await?,
        "scheduling pass complete"
    );

    Ok(())
}

use std::env;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Load .env file (silently ignores if missing).
pub fn load_dotenv() {
    dotenvy::dotenv().ok();
}

fn env_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_usize(key: &str, default: usize) -> usize {
    env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

// ── Top-level config ──────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub scheduler: SchedulerConfig,
    pub store: StoreConfig,
}

impl Config {
    /// Build config from environment variables (call `load_dotenv()` first).
    pub fn from_env() -> Self {
        Self {
            scheduler: SchedulerConfig::from_env(),
            store: StoreConfig::from_env(),
        }
    }

    /// Print a summary for startup logs.
    pub fn log_summary(&self) {
        tracing::info!("Config loaded:");
        tracing::info!(
            "  scheduler:  cap={}, soft_threshold={}, target={}, max_per_task={}",
            self.scheduler.platform_alert_cap,
            self.scheduler.soft_threshold,
            self.scheduler.target_count,
            self.scheduler.max_per_task,
        );
        tracing::info!("  store:      tasks_file={}", self.store.tasks_file.display());
    }
}

// ── Scheduler limits ──────────────────────────────────────────

/// Alert-capacity limits. The platform silently drops alerts past
/// `platform_alert_cap`, so the cleanup policy reconciles down to
/// `target_count` whenever the registry exceeds `soft_threshold`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchedulerConfig {
    /// Hard platform ceiling on outstanding alerts.
    pub platform_alert_cap: usize,
    /// Registry count above which cleanup kicks in.
    pub soft_threshold: usize,
    /// Count cleanup evicts down to.
    pub target_count: usize,
    /// Maximum occurrences materialized per task in one batch.
    pub max_per_task: usize,
}

impl SchedulerConfig {
    pub fn from_env() -> Self {
        let cap = env_usize("TICKLER_ALERT_CAP", 64);
        let soft = env_usize("TICKLER_SOFT_THRESHOLD", 50);
        let target = env_usize("TICKLER_TARGET_COUNT", 45);
        let max_per_task = env_usize("TICKLER_MAX_PER_TASK", 64);

        // An inverted band would make cleanup oscillate; fall back to defaults.
        if target > soft || soft > cap {
            tracing::warn!(
                cap,
                soft_threshold = soft,
                target_count = target,
                "inconsistent alert limits in env, using defaults"
            );
            return Self::default();
        }

        Self {
            platform_alert_cap: cap,
            soft_threshold: soft,
            target_count: target,
            max_per_task: max_per_task.min(cap),
        }
    }
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            platform_alert_cap: 64,
            soft_threshold: 50,
            target_count: 45,
            max_per_task: 64,
        }
    }
}

// ── Store ─────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    pub tasks_file: PathBuf,
}

impl StoreConfig {
    fn from_env() -> Self {
        Self {
            tasks_file: PathBuf::from(env_or("TICKLER_TASKS_FILE", "data/tasks.json")),
        }
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            tasks_file: PathBuf::from("data/tasks.json"),
        }
    }
}

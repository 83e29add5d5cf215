//! Bounded notification scheduling against a capped alert registry.
//!
//! This crate provides:
//! - `AlertRegistry` trait for the platform facility holding pending alerts
//! - `MemoryRegistry`, the in-process registry implementation
//! - `CleanupPolicy` that evicts expired and earliest-firing alerts to
//!   keep the registry under the platform cap
//! - `NotificationScheduler` that materializes a task's upcoming
//!   occurrences as registry alerts and reports partial failures

pub mod cleanup;
pub mod memory;
pub mod registry;
pub mod scheduler;

pub use cleanup::{CleanupPolicy, EvictionReport};
pub use memory::MemoryRegistry;
pub use registry::{AlertPayload, AlertRegistry, RegistryError, ScheduledAlert};
pub use scheduler::{NotificationScheduler, ScheduleError, SchedulingReport};

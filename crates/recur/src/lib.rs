//! Occurrence computation for recurring tasks.
//!
//! This crate provides:
//! - `next_occurrence` — pure per-kind next-occurrence arithmetic,
//!   generic over the caller's `chrono::TimeZone`
//! - `upcoming` — bounded, strictly-increasing occurrence sequences
//!
//! All date math is wall-clock in the supplied timezone: naive local
//! date/time is advanced, then re-resolved through the zone, so a daily
//! rule keeps its local firing time across DST transitions.

mod calculator;
mod sequencer;


pub use calculator::next_occurrence;
pub use sequencer::upcoming;

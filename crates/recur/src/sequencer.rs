//! Bounded occurrence sequences.

use chrono::{DateTime, TimeZone};
use tracing::debug;

use tickler_core::rule::RecurrenceRule;

use crate::calculator::next_occurrence;

/// Produce up to `max_count` upcoming occurrences strictly after `after`,
/// in strictly increasing order.
///
/// Each result is fed back in as the new reference instant, so the
/// sequence stops at the first `None` from the calculator (end date
/// reached, no constructible instant). A non-recurring rule returns an
/// empty sequence without invoking the calculator at all.
pub fn upcoming<Tz: TimeZone>(
    rule: &RecurrenceRule,
    after: &DateTime<Tz>,
    max_count: usize,
) -> Vec<DateTime<Tz>> {
    if !rule.kind.is_recurring() || max_count == 0 {
        return Vec::new();
    }

    let mut out = Vec::with_capacity(max_count.min(64));
    let mut cursor = after.clone();

    while out.len() < max_count {
        match next_occurrence(rule, &cursor) {
            Some(next) if next > cursor => {
                cursor = next.clone();
                out.push(next);
            }
            Some(_) => {
                // A non-advancing result would loop forever; stop here.
                debug!(kind = %rule.kind, "calculator returned non-advancing occurrence");
                break;
            }
            None => break,
        }
    }

    out
}

//! Next-occurrence arithmetic, one branch per recurrence kind.

use chrono::{
    DateTime, Datelike, Days, Duration, LocalResult, NaiveDate, NaiveDateTime, NaiveTime,
    TimeZone, Timelike, Utc, Weekday,
};

use tickler_core::rule::{
    weekday_from_ordinal, RecurrenceKind, RecurrenceRule, TimeOfDay,
};

/// Hard cutoff for the specific-weekdays forward scan. Any valid weekday
/// set matches within 7 days; the extra week covers degenerate inputs
/// without looping forever.
const WEEKDAY_SCAN_LIMIT_DAYS: u64 = 14;

/// How many month steps to probe before giving up on a day-of-month that
/// keeps landing on nonexistent dates.
const MONTH_PROBE_LIMIT: u32 = 48;

/// How many year steps to probe (covers a Feb 29 anchor's leap cycle).
const YEAR_PROBE_LIMIT: u32 = 8;

/// Compute the next occurrence strictly after `after`, or `None` when the
/// rule is non-recurring, its end date has passed, or no valid instant
/// can be constructed.
pub fn next_occurrence<Tz: TimeZone>(
    rule: &RecurrenceRule,
    after: &DateTime<Tz>,
) -> Option<DateTime<Tz>> {
    let tz = after.timezone();
    let local = after.naive_local();

    if let Some(end) = rule.end_date {
        if end <= after.with_timezone(&Utc) {
            return None;
        }
    }

    let anchor_local = rule
        .anchor_due_date
        .map(|a| a.with_timezone(&tz).naive_local());

    let candidate = match rule.kind {
        RecurrenceKind::None => return None,
        RecurrenceKind::Hourly | RecurrenceKind::CustomInterval => next_hourly(rule, local)?,
        RecurrenceKind::Daily => next_daily(rule, local)?,
        RecurrenceKind::MultipleDailyTimes => next_at_times(&rule.specific_times, local, 1)?,
        RecurrenceKind::Weekly => next_weekly(rule, local, anchor_local)?,
        RecurrenceKind::SpecificWeekdays => next_specific_weekdays(rule, local)?,
        RecurrenceKind::Monthly => next_monthly(rule, local)?,
        RecurrenceKind::Yearly => next_yearly(rule, local, anchor_local)?,
    };

    let resolved = resolve_local(&tz, candidate)?;

    if let Some(end) = rule.end_date {
        if resolved.with_timezone(&Utc) > end {
            return None;
        }
    }

    Some(resolved)
}

/// Map a naive local instant back into the zone. Ambiguous wall-clock
/// times (DST fall-back) take the earlier offset; nonexistent times
/// (spring-forward gap) are unrepresentable and yield `None`.
fn resolve_local<Tz: TimeZone>(tz: &Tz, naive: NaiveDateTime) -> Option<DateTime<Tz>> {
    match tz.from_local_datetime(&naive) {
        LocalResult::Single(t) => Some(t),
        LocalResult::Ambiguous(earlier, _) => Some(earlier),
        LocalResult::None => None,
    }
}

fn to_naive_time(t: TimeOfDay) -> Option<NaiveTime> {
    NaiveTime::from_hms_opt(t.hour, t.minute, 0)
}

fn truncate_minute(local: NaiveDateTime) -> Option<NaiveDateTime> {
    local.with_second(0)?.with_nanosecond(0)
}

// ── Hourly / CustomInterval ───────────────────────────────────

fn next_hourly(rule: &RecurrenceRule, local: NaiveDateTime) -> Option<NaiveDateTime> {
    let cand = truncate_minute(local.checked_add_signed(Duration::hours(rule.interval as i64))?)?;

    let Some(range) = rule.time_range else {
        return Some(cand);
    };
    let start = to_naive_time(range.start)?;
    let end = to_naive_time(range.end)?;

    if cand.date() == local.date() {
        if cand.time() < start {
            // Window hasn't opened yet today.
            return Some(cand.date().and_time(start));
        }
        if cand.time() <= end {
            return Some(cand);
        }
    }

    // No slot left today: start of tomorrow's window.
    let next_day = local.date().checked_add_days(Days::new(1))?;
    Some(next_day.and_time(start))
}

// ── Daily / MultipleDailyTimes ────────────────────────────────

fn next_daily(rule: &RecurrenceRule, local: NaiveDateTime) -> Option<NaiveDateTime> {
    if rule.specific_times.is_empty() {
        return local.checked_add_days(Days::new(rule.interval as u64));
    }
    next_at_times(&rule.specific_times, local, rule.interval)
}

/// Earliest projected time strictly after `local` today, else the
/// earliest time `day_step` days ahead.
fn next_at_times(
    times: &[TimeOfDay],
    local: NaiveDateTime,
    day_step: u32,
) -> Option<NaiveDateTime> {
    let mut slots: Vec<NaiveTime> = times.iter().copied().filter_map(to_naive_time).collect();
    slots.sort();
    let first = *slots.first()?;

    for slot in &slots {
        if *slot > local.time() {
            return Some(local.date().and_time(*slot));
        }
    }

    let next = local
        .date()
        .checked_add_days(Days::new(day_step.max(1) as u64))?;
    Some(next.and_time(first))
}

// ── Weekly ────────────────────────────────────────────────────

fn next_weekly(
    rule: &RecurrenceRule,
    local: NaiveDateTime,
    anchor: Option<NaiveDateTime>,
) -> Option<NaiveDateTime> {
    let template = anchor.unwrap_or(local);
    let weekday = template.weekday();
    let time = template.time();

    // First instant strictly after `local` on the target weekday, then
    // the remaining interval weeks on top.
    let mut date = local.date();
    for _ in 0..=7 {
        if date.weekday() == weekday {
            let cand = date.and_time(time);
            if cand > local {
                let extra_days = (rule.interval.max(1) as u64 - 1) * 7;
                return cand.checked_add_days(Days::new(extra_days));
            }
        }
        date = date.succ_opt()?;
    }
    None
}

// ── SpecificWeekdays ──────────────────────────────────────────

fn next_specific_weekdays(rule: &RecurrenceRule, local: NaiveDateTime) -> Option<NaiveDateTime> {
    let wanted: Vec<Weekday> = rule
        .specific_weekdays
        .iter()
        .filter_map(|&ord| weekday_from_ordinal(ord))
        .collect();
    if wanted.is_empty() {
        return None;
    }

    let slot_time = rule.specific_times.first().copied().and_then(to_naive_time);

    for offset in 0..WEEKDAY_SCAN_LIMIT_DAYS {
        let date = local.date().checked_add_days(Days::new(offset))?;
        if !wanted.contains(&date.weekday()) {
            continue;
        }
        // Today still counts if its slot is strictly in the future.
        let cand = date.and_time(slot_time.unwrap_or_else(|| local.time()));
        if cand > local {
            return Some(cand);
        }
    }
    None
}

// ── Monthly ───────────────────────────────────────────────────

fn next_monthly(rule: &RecurrenceRule, local: NaiveDateTime) -> Option<NaiveDateTime> {
    let time = local.time();
    let mut year = local.year();
    let mut month = local.month();

    match rule.monthly_day {
        Some(day) => {
            // Try the requested day this month first, then step by
            // `interval` months. Months without that day are skipped
            // outright — day 31 never clamps to Feb 28.
            for _ in 0..MONTH_PROBE_LIMIT {
                if let Some(date) = NaiveDate::from_ymd_opt(year, month, day) {
                    let cand = date.and_time(time);
                    if cand > local {
                        return Some(cand);
                    }
                }
                step_months(&mut year, &mut month, rule.interval);
            }
            None
        }
        None => {
            // Same day-of-month as `after`, `interval` months ahead.
            // Nonexistent target days skip to the next interval step.
            let day = local.day();
            for _ in 0..MONTH_PROBE_LIMIT {
                step_months(&mut year, &mut month, rule.interval);
                if let Some(date) = NaiveDate::from_ymd_opt(year, month, day) {
                    return Some(date.and_time(time));
                }
            }
            None
        }
    }
}

fn step_months(year: &mut i32, month: &mut u32, by: u32) {
    let total = (*year as i64) * 12 + (*month as i64 - 1) + by as i64;
    *year = total.div_euclid(12) as i32;
    *month = (total.rem_euclid(12) + 1) as u32;
}

// ── Yearly ────────────────────────────────────────────────────

fn next_yearly(
    rule: &RecurrenceRule,
    local: NaiveDateTime,
    anchor: Option<NaiveDateTime>,
) -> Option<NaiveDateTime> {
    let template = anchor.unwrap_or(local);
    let (month, day, time) = (template.month(), template.day(), template.time());

    let mut year = local.year();
    for _ in 0..YEAR_PROBE_LIMIT {
        year = year.checked_add(rule.interval as i32)?;
        // Feb 29 simply skips non-leap years.
        if let Some(date) = NaiveDate::from_ymd_opt(year, month, day) {
            let cand = date.and_time(time);
            if cand > local {
                return Some(cand);
            }
        }
    }
    None
}

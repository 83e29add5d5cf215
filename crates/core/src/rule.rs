//! Recurrence data model: describes how a task repeats.
//!
//! A [`RecurrenceRule`] is pure data plus validation — the actual
//! occurrence arithmetic lives in the `tickler-recur` crate. Rules are
//! treated as immutable once handed to a scheduling operation; editing a
//! task's recurrence means cancelling its alerts and re-scheduling from
//! scratch, never patching in place.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc, Weekday};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Validation failures on [`RecurrenceRule`] construction.
///
/// These are detected before any registry I/O; an invalid rule is never
/// scheduled.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum InvalidRule {
    #[error("interval must be >= 1")]
    ZeroInterval,

    #[error("specific_weekdays must be non-empty for kind specific_weekdays")]
    EmptyWeekdays,

    #[error("specific_weekdays only applies to kind specific_weekdays")]
    UnexpectedWeekdays,

    #[error("weekday ordinal out of range 1..=7 (1=Sunday): {0}")]
    WeekdayOutOfRange(u32),

    #[error("monthly_day out of range 1..=31: {0}")]
    MonthlyDayOutOfRange(u32),

    #[error("time of day out of range: {0:02}:{1:02}")]
    TimeOutOfRange(u32, u32),

    #[error("time_range start must be strictly before end")]
    EmptyTimeRange,
}

// ── Recurrence kind ───────────────────────────────────────────

/// Discriminant selecting which occurrence algorithm applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum RecurrenceKind {
    /// Non-recurring task.
    #[default]
    None,
    Hourly,
    Daily,
    Weekly,
    Monthly,
    Yearly,
    /// Every N hours, optionally restricted to a daily time window.
    CustomInterval,
    /// Fires on a fixed set of weekdays.
    SpecificWeekdays,
    /// Fires at several fixed times every day.
    MultipleDailyTimes,
}

impl RecurrenceKind {
    /// Whether this kind produces any occurrences at all.
    pub fn is_recurring(&self) -> bool {
        !matches!(self, RecurrenceKind::None)
    }
}

impl fmt::Display for RecurrenceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            RecurrenceKind::None => "none",
            RecurrenceKind::Hourly => "hourly",
            RecurrenceKind::Daily => "daily",
            RecurrenceKind::Weekly => "weekly",
            RecurrenceKind::Monthly => "monthly",
            RecurrenceKind::Yearly => "yearly",
            RecurrenceKind::CustomInterval => "custom_interval",
            RecurrenceKind::SpecificWeekdays => "specific_weekdays",
            RecurrenceKind::MultipleDailyTimes => "multiple_daily_times",
        };
        write!(f, "{}", s)
    }
}

impl FromStr for RecurrenceKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "none" => Ok(RecurrenceKind::None),
            "hourly" => Ok(RecurrenceKind::Hourly),
            "daily" => Ok(RecurrenceKind::Daily),
            "weekly" => Ok(RecurrenceKind::Weekly),
            "monthly" => Ok(RecurrenceKind::Monthly),
            "yearly" => Ok(RecurrenceKind::Yearly),
            "custom_interval" => Ok(RecurrenceKind::CustomInterval),
            "specific_weekdays" => Ok(RecurrenceKind::SpecificWeekdays),
            "multiple_daily_times" => Ok(RecurrenceKind::MultipleDailyTimes),
            other => Err(format!("unknown recurrence kind: '{}'", other)),
        }
    }
}

// ── Time of day ───────────────────────────────────────────────

/// Wall-clock time of day, minute precision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TimeOfDay {
    pub hour: u32,
    pub minute: u32,
}

impl TimeOfDay {
    pub fn new(hour: u32, minute: u32) -> Self {
        Self { hour, minute }
    }

    pub fn is_valid(&self) -> bool {
        self.hour < 24 && self.minute < 60
    }
}

impl fmt::Display for TimeOfDay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.hour, self.minute)
    }
}

/// Daily firing window for hourly-style rules. Wrap-around across
/// midnight (e.g. 22:00–06:00) is not supported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeRange {
    pub start: TimeOfDay,
    pub end: TimeOfDay,
}

// ── Weekday ordinals ──────────────────────────────────────────

/// Convert a platform weekday ordinal (1=Sunday…7=Saturday) to a
/// [`chrono::Weekday`].
pub fn weekday_from_ordinal(ordinal: u32) -> Option<Weekday> {
    match ordinal {
        1 => Some(Weekday::Sun),
        2 => Some(Weekday::Mon),
        3 => Some(Weekday::Tue),
        4 => Some(Weekday::Wed),
        5 => Some(Weekday::Thu),
        6 => Some(Weekday::Fri),
        7 => Some(Weekday::Sat),
        _ => None,
    }
}

/// Inverse of [`weekday_from_ordinal`].
pub fn ordinal_of(weekday: Weekday) -> u32 {
    weekday.num_days_from_sunday() + 1
}

// ── Rule ──────────────────────────────────────────────────────

/// How a task repeats. Pure data plus validation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecurrenceRule {
    pub kind: RecurrenceKind,

    /// Step multiplier: every N hours for `Hourly`/`CustomInterval`,
    /// every N days/weeks/months/years otherwise.
    #[serde(default = "default_interval")]
    pub interval: u32,

    /// Weekday ordinals (1=Sunday…7=Saturday); `SpecificWeekdays` only.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub specific_weekdays: Vec<u32>,

    /// Ordered times of day for `MultipleDailyTimes`, optionally also
    /// used by `Daily` and `SpecificWeekdays`.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub specific_times: Vec<TimeOfDay>,

    /// Restricts `Hourly`/`CustomInterval` firing to a daily window.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_range: Option<TimeRange>,

    /// Day of month (1–31) for `Monthly`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub monthly_day: Option<u32>,

    /// Anchors weekday/day-of-month/month-day computations, e.g.
    /// "every Tuesday" anchored to the weekday of the original due date.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub anchor_due_date: Option<DateTime<Utc>>,

    /// No occurrences are produced after this instant.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_date: Option<DateTime<Utc>>,
}

fn default_interval() -> u32 {
    1
}

impl Default for RecurrenceRule {
    fn default() -> Self {
        Self::never()
    }
}

impl RecurrenceRule {
    /// A non-recurring rule.
    pub fn never() -> Self {
        Self {
            kind: RecurrenceKind::None,
            interval: 1,
            specific_weekdays: Vec::new(),
            specific_times: Vec::new(),
            time_range: None,
            monthly_day: None,
            anchor_due_date: None,
            end_date: None,
        }
    }

    /// A simple rule of the given kind with default fields.
    pub fn every(kind: RecurrenceKind, interval: u32) -> Self {
        Self {
            kind,
            interval,
            ..Self::never()
        }
    }

    /// Check all construction invariants.
    pub fn validate(&self) -> Result<(), InvalidRule> {
        if self.interval == 0 {
            return Err(InvalidRule::ZeroInterval);
        }

        if self.kind == RecurrenceKind::SpecificWeekdays {
            if self.specific_weekdays.is_empty() {
                return Err(InvalidRule::EmptyWeekdays);
            }
        } else if !self.specific_weekdays.is_empty() {
            return Err(InvalidRule::UnexpectedWeekdays);
        }

        for &ord in &self.specific_weekdays {
            if weekday_from_ordinal(ord).is_none() {
                return Err(InvalidRule::WeekdayOutOfRange(ord));
            }
        }

        for t in &self.specific_times {
            if !t.is_valid() {
                return Err(InvalidRule::TimeOutOfRange(t.hour, t.minute));
            }
        }

        if let Some(range) = &self.time_range {
            for t in [range.start, range.end] {
                if !t.is_valid() {
                    return Err(InvalidRule::TimeOutOfRange(t.hour, t.minute));
                }
            }
            if range.start >= range.end {
                return Err(InvalidRule::EmptyTimeRange);
            }
        }

        if let Some(day) = self.monthly_day {
            if !(1..=31).contains(&day) {
                return Err(InvalidRule::MonthlyDayOutOfRange(day));
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn never_rule_is_valid() {
        assert_eq!(RecurrenceRule::never().validate(), Ok(()));
    }

    #[test]
    fn zero_interval_rejected() {
        let rule = RecurrenceRule::every(RecurrenceKind::Daily, 0);
        assert_eq!(rule.validate(), Err(InvalidRule::ZeroInterval));
    }

    #[test]
    fn specific_weekdays_requires_weekdays() {
        let rule = RecurrenceRule::every(RecurrenceKind::SpecificWeekdays, 1);
        assert_eq!(rule.validate(), Err(InvalidRule::EmptyWeekdays));
    }

    #[test]
    fn weekdays_rejected_on_other_kinds() {
        let rule = RecurrenceRule {
            specific_weekdays: vec![3],
            ..RecurrenceRule::every(RecurrenceKind::Daily, 1)
        };
        assert_eq!(rule.validate(), Err(InvalidRule::UnexpectedWeekdays));
    }

    #[test]
    fn weekday_ordinal_bounds() {
        let rule = RecurrenceRule {
            specific_weekdays: vec![8],
            ..RecurrenceRule::every(RecurrenceKind::SpecificWeekdays, 1)
        };
        assert_eq!(rule.validate(), Err(InvalidRule::WeekdayOutOfRange(8)));
    }

    #[test]
    fn monthly_day_bounds() {
        let rule = RecurrenceRule {
            monthly_day: Some(32),
            ..RecurrenceRule::every(RecurrenceKind::Monthly, 1)
        };
        assert_eq!(rule.validate(), Err(InvalidRule::MonthlyDayOutOfRange(32)));
    }

    #[test]
    fn inverted_time_range_rejected() {
        let rule = RecurrenceRule {
            time_range: Some(TimeRange {
                start: TimeOfDay::new(20, 0),
                end: TimeOfDay::new(8, 0),
            }),
            ..RecurrenceRule::every(RecurrenceKind::CustomInterval, 2)
        };
        assert_eq!(rule.validate(), Err(InvalidRule::EmptyTimeRange));
    }

    #[test]
    fn bad_specific_time_rejected() {
        let rule = RecurrenceRule {
            specific_times: vec![TimeOfDay::new(24, 0)],
            ..RecurrenceRule::every(RecurrenceKind::MultipleDailyTimes, 1)
        };
        assert_eq!(rule.validate(), Err(InvalidRule::TimeOutOfRange(24, 0)));
    }

    #[test]
    fn kind_roundtrips_through_strings() {
        for kind in [
            RecurrenceKind::None,
            RecurrenceKind::Hourly,
            RecurrenceKind::Daily,
            RecurrenceKind::Weekly,
            RecurrenceKind::Monthly,
            RecurrenceKind::Yearly,
            RecurrenceKind::CustomInterval,
            RecurrenceKind::SpecificWeekdays,
            RecurrenceKind::MultipleDailyTimes,
        ] {
            assert_eq!(kind.to_string().parse::<RecurrenceKind>(), Ok(kind));
        }
    }

    #[test]
    fn weekday_ordinals_roundtrip() {
        for ord in 1..=7 {
            let wd = weekday_from_ordinal(ord).unwrap();
            assert_eq!(ordinal_of(wd), ord);
        }
        assert!(weekday_from_ordinal(0).is_none());
        assert!(weekday_from_ordinal(8).is_none());
    }
}

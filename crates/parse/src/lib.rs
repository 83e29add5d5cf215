//! Boundary types for the natural-language task parser.
//!
//! The NL collaborator is a black box returning a structured parse with
//! optional, string-typed fields. This crate is the single place where
//! those strings become a validated [`RecurrenceRule`]; nothing stringly
//! typed leaks past [`recurrence_rule`].

use std::str::FromStr;

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use tickler_core::rule::{InvalidRule, RecurrenceKind, RecurrenceRule, TimeOfDay, TimeRange};

/// Structured parse result from the NL collaborator. Everything optional
/// and string-typed at the boundary.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParsedTask {
    pub clean_title: String,
    /// "YYYY-MM-DD".
    #[serde(default)]
    pub due_date: Option<String>,
    /// "HH:MM".
    #[serde(default)]
    pub due_time: Option<String>,
    #[serde(default)]
    pub recurrence_kind: Option<String>,
    #[serde(default)]
    pub interval: Option<String>,
    /// Weekday names ("tuesday") or ordinals ("3", 1=Sunday).
    #[serde(default)]
    pub specific_weekdays: Option<Vec<String>>,
    #[serde(default)]
    pub specific_times: Option<Vec<String>>,
    #[serde(default)]
    pub range_start: Option<String>,
    #[serde(default)]
    pub range_end: Option<String>,
    #[serde(default)]
    pub monthly_day: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseError {
    #[error("unknown recurrence kind: '{0}'")]
    UnknownKind(String),

    #[error("invalid interval: '{0}'")]
    BadInterval(String),

    #[error("invalid time '{0}', expected HH:MM")]
    BadTime(String),

    #[error("invalid weekday: '{0}'")]
    BadWeekday(String),

    #[error("invalid day of month: '{0}'")]
    BadMonthlyDay(String),

    #[error("invalid date '{0}', expected YYYY-MM-DD")]
    BadDate(String),

    #[error(transparent)]
    Invalid(#[from] InvalidRule),
}

/// Translate a parse result into a validated recurrence rule.
///
/// A missing or "none" kind yields the non-recurring rule. Every other
/// combination passes through [`RecurrenceRule::validate`] before being
/// returned, so invalid combinations (e.g. `specific_weekdays` kind with
/// no weekdays) fail here rather than at scheduling time.
pub fn recurrence_rule(parsed: &ParsedTask) -> Result<RecurrenceRule, ParseError> {
    let kind = match parsed.recurrence_kind.as_deref() {
        None | Some("") => return Ok(RecurrenceRule::never()),
        Some(raw) => {
            let normalized = raw.trim().to_lowercase().replace([' ', '-'], "_");
            RecurrenceKind::from_str(&normalized)
                .map_err(|_| ParseError::UnknownKind(raw.to_string()))?
        }
    };

    let interval = match parsed.interval.as_deref() {
        None | Some("") => 1,
        Some(raw) => raw
            .trim()
            .parse::<u32>()
            .map_err(|_| ParseError::BadInterval(raw.to_string()))?,
    };

    let specific_weekdays = parsed
        .specific_weekdays
        .as_deref()
        .unwrap_or_default()
        .iter()
        .map(|s| parse_weekday(s))
        .collect::<Result<Vec<_>, _>>()?;

    let specific_times = parsed
        .specific_times
        .as_deref()
        .unwrap_or_default()
        .iter()
        .map(|s| parse_time_of_day(s))
        .collect::<Result<Vec<_>, _>>()?;

    let time_range = match (&parsed.range_start, &parsed.range_end) {
        (Some(start), Some(end)) => Some(TimeRange {
            start: parse_time_of_day(start)?,
            end: parse_time_of_day(end)?,
        }),
        _ => None,
    };

    let monthly_day = match parsed.monthly_day.as_deref() {
        None | Some("") => None,
        Some(raw) => Some(
            raw.trim()
                .parse::<u32>()
                .map_err(|_| ParseError::BadMonthlyDay(raw.to_string()))?,
        ),
    };

    let rule = RecurrenceRule {
        kind,
        interval,
        specific_weekdays,
        specific_times,
        time_range,
        monthly_day,
        anchor_due_date: due_instant(parsed)?,
        end_date: None,
    };
    rule.validate()?;
    Ok(rule)
}

/// Combine `due_date` and `due_time` into an instant (UTC at this
/// boundary). A date without a time defaults to 09:00.
pub fn due_instant(parsed: &ParsedTask) -> Result<Option<DateTime<Utc>>, ParseError> {
    let Some(date_raw) = parsed.due_date.as_deref().filter(|s| !s.is_empty()) else {
        return Ok(None);
    };
    let date = NaiveDate::parse_from_str(date_raw.trim(), "%Y-%m-%d")
        .map_err(|_| ParseError::BadDate(date_raw.to_string()))?;

    let time = match parsed.due_time.as_deref().filter(|s| !s.is_empty()) {
        Some(raw) => {
            let t = parse_time_of_day(raw)?;
            NaiveTime::from_hms_opt(t.hour, t.minute, 0)
                .ok_or_else(|| ParseError::BadTime(raw.to_string()))?
        }
        None => NaiveTime::from_hms_opt(9, 0, 0).unwrap_or_default(),
    };

    Ok(Some(DateTime::from_naive_utc_and_offset(
        date.and_time(time),
        Utc,
    )))
}

/// Parse "HH:MM" into a [`TimeOfDay`].
pub fn parse_time_of_day(raw: &str) -> Result<TimeOfDay, ParseError> {
    let bad = || ParseError::BadTime(raw.to_string());
    let (h, m) = raw.trim().split_once(':').ok_or_else(bad)?;
    let time = TimeOfDay::new(
        h.parse().map_err(|_| bad())?,
        m.parse().map_err(|_| bad())?,
    );
    if !time.is_valid() {
        return Err(bad());
    }
    Ok(time)
}

/// Parse a weekday name or ordinal into the platform ordinal
/// (1=Sunday…7=Saturday).
pub fn parse_weekday(raw: &str) -> Result<u32, ParseError> {
    let s = raw.trim().to_lowercase();
    if let Ok(ord) = s.parse::<u32>() {
        if (1..=7).contains(&ord) {
            return Ok(ord);
        }
        return Err(ParseError::BadWeekday(raw.to_string()));
    }
    match s.as_str() {
        "sunday" | "sun" => Ok(1),
        "monday" | "mon" => Ok(2),
        "tuesday" | "tue" => Ok(3),
        "wednesday" | "wed" => Ok(4),
        "thursday" | "thu" => Ok(5),
        "friday" | "fri" => Ok(6),
        "saturday" | "sat" => Ok(7),
        _ => Err(ParseError::BadWeekday(raw.to_string())),
    }
}

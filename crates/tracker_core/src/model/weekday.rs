//! Weekday mask: day-of-week enumeration and schedule helpers.
//!
//! # Responsibility
//! - Map calendar dates to exactly one `WeekdayType`.
//! - Render schedules as human-readable labels.
//! - Encode schedules as single-digit codes for storage.
//!
//! # Invariants
//! - Canonical order is Monday → Sunday, both for display and for storage.
//! - Storage codes are `1` (Monday) through `7` (Sunday).

use chrono::{Datelike, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::str::FromStr;

/// Set of weekdays a tracker is scheduled on, iterated Monday-first.
pub type Schedule = BTreeSet<WeekdayType>;

/// Label used when a schedule covers the whole week.
pub const EVERY_DAY_LABEL: &str = "Every day";

/// Day of week, declared in canonical Monday-first order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WeekdayType {
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
    Saturday,
    Sunday,
}

impl WeekdayType {
    /// All weekdays in canonical order.
    pub const ALL: [WeekdayType; 7] = [
        Self::Monday,
        Self::Tuesday,
        Self::Wednesday,
        Self::Thursday,
        Self::Friday,
        Self::Saturday,
        Self::Sunday,
    ];

    /// Single-digit storage code.
    pub fn code(self) -> char {
        match self {
            Self::Monday => '1',
            Self::Tuesday => '2',
            Self::Wednesday => '3',
            Self::Thursday => '4',
            Self::Friday => '5',
            Self::Saturday => '6',
            Self::Sunday => '7',
        }
    }

    /// Parses one storage code. Returns `None` for anything outside `1..=7`.
    pub fn from_code(code: char) -> Option<Self> {
        match code {
            '1' => Some(Self::Monday),
            '2' => Some(Self::Tuesday),
            '3' => Some(Self::Wednesday),
            '4' => Some(Self::Thursday),
            '5' => Some(Self::Friday),
            '6' => Some(Self::Saturday),
            '7' => Some(Self::Sunday),
            _ => None,
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            Self::Monday => "Monday",
            Self::Tuesday => "Tuesday",
            Self::Wednesday => "Wednesday",
            Self::Thursday => "Thursday",
            Self::Friday => "Friday",
            Self::Saturday => "Saturday",
            Self::Sunday => "Sunday",
        }
    }

    pub fn short_title(self) -> &'static str {
        match self {
            Self::Monday => "Mon",
            Self::Tuesday => "Tue",
            Self::Wednesday => "Wed",
            Self::Thursday => "Thu",
            Self::Friday => "Fri",
            Self::Saturday => "Sat",
            Self::Sunday => "Sun",
        }
    }
}

impl Display for WeekdayType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.title())
    }
}

/// Error for weekday text that names no known day.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseWeekdayError(pub String);

impl Display for ParseWeekdayError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "unknown weekday `{}`; expected a name (mon, monday) or a code 1-7",
            self.0
        )
    }
}

impl Error for ParseWeekdayError {}

impl FromStr for WeekdayType {
    type Err = ParseWeekdayError;

    /// Accepts full names, three-letter names (case-insensitive) or storage codes.
    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let normalized = value.trim().to_ascii_lowercase();
        let mut chars = normalized.chars();
        if let (Some(code), None) = (chars.next(), chars.next()) {
            if let Some(day) = Self::from_code(code) {
                return Ok(day);
            }
        }

        Self::ALL
            .into_iter()
            .find(|day| {
                normalized == day.title().to_ascii_lowercase()
                    || normalized == day.short_title().to_ascii_lowercase()
            })
            .ok_or_else(|| ParseWeekdayError(value.to_string()))
    }
}

/// Returns the weekday of `date` in the proleptic Gregorian calendar.
///
/// Independent of locale and time zone: `date` is already a calendar day.
pub fn weekday_for(date: NaiveDate) -> WeekdayType {
    match date.weekday() {
        Weekday::Mon => WeekdayType::Monday,
        Weekday::Tue => WeekdayType::Tuesday,
        Weekday::Wed => WeekdayType::Wednesday,
        Weekday::Thu => WeekdayType::Thursday,
        Weekday::Fri => WeekdayType::Friday,
        Weekday::Sat => WeekdayType::Saturday,
        Weekday::Sun => WeekdayType::Sunday,
    }
}

/// Renders a schedule for display.
///
/// - `None` for an empty schedule.
/// - [`EVERY_DAY_LABEL`] when all seven days are present.
/// - Otherwise short names joined by `", "` in canonical order.
pub fn label_text(schedule: &Schedule) -> Option<String> {
    if schedule.is_empty() {
        return None;
    }
    if schedule.len() == WeekdayType::ALL.len() {
        return Some(EVERY_DAY_LABEL.to_string());
    }

    let titles = schedule
        .iter()
        .map(|day| day.short_title())
        .collect::<Vec<_>>();
    Some(titles.join(", "))
}

/// Encodes a schedule as concatenated storage codes, e.g. `"135"`.
pub fn encode_schedule(schedule: &Schedule) -> String {
    schedule.iter().map(|day| day.code()).collect()
}

/// Decodes concatenated storage codes.
///
/// Returns the first unknown character as error. Repeated codes collapse.
pub fn decode_schedule(value: &str) -> Result<Schedule, char> {
    value
        .chars()
        .map(|code| WeekdayType::from_code(code).ok_or(code))
        .collect()
}

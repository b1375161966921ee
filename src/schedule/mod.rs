//! Per-message schedules
//!
//! A schedule overrides when a single message fires: an optional custom
//! interval plus zero or more wall-clock windows and day-of-week filters.
//! A schedule with no windows and no day filters is always active. Windows
//! may span midnight (`22:00`–`06:00`). Day filters accept specific
//! weekdays or the aggregate tokens `WEEKDAY` and `WEEKEND`.

use chrono::{Datelike, NaiveDateTime, NaiveTime, Weekday};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Wall-clock format accepted by time range bounds.
const TIME_FORMAT: &str = "%H:%M";

// ============================================================================
// Time ranges
// ============================================================================

/// An inclusive wall-clock window, possibly spanning midnight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeRange {
    pub start: NaiveTime,
    pub end: NaiveTime,
}

impl TimeRange {
    pub fn new(start: NaiveTime, end: NaiveTime) -> Self {
        Self { start, end }
    }

    /// Parse `HH:MM` bounds. A malformed bound rejects the whole range.
    pub fn parse(start: &str, end: &str) -> Result<Self, chrono::ParseError> {
        Ok(Self {
            start: NaiveTime::parse_from_str(start.trim(), TIME_FORMAT)?,
            end: NaiveTime::parse_from_str(end.trim(), TIME_FORMAT)?,
        })
    }

    /// Whether `time` falls inside the window.
    ///
    /// `start > end` means the window spans midnight: it covers
    /// `start..24:00` plus `00:00..=end`.
    pub fn contains(&self, time: NaiveTime) -> bool {
        if self.start <= self.end {
            time >= self.start && time <= self.end
        } else {
            time >= self.start || time <= self.end
        }
    }
}

impl fmt::Display for TimeRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} - {}",
            self.start.format(TIME_FORMAT),
            self.end.format(TIME_FORMAT)
        )
    }
}

// ============================================================================
// Day filters
// ============================================================================

/// One calendar constraint: a specific weekday or an aggregate token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ActiveDay {
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
    Saturday,
    Sunday,
    /// Monday through Friday.
    Weekday,
    /// Saturday and Sunday.
    Weekend,
}

impl ActiveDay {
    /// Parse a day token, case-insensitively.
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_uppercase().as_str() {
            "MONDAY" => Some(Self::Monday),
            "TUESDAY" => Some(Self::Tuesday),
            "WEDNESDAY" => Some(Self::Wednesday),
            "THURSDAY" => Some(Self::Thursday),
            "FRIDAY" => Some(Self::Friday),
            "SATURDAY" => Some(Self::Saturday),
            "SUNDAY" => Some(Self::Sunday),
            "WEEKDAY" => Some(Self::Weekday),
            "WEEKEND" => Some(Self::Weekend),
            _ => None,
        }
    }

    /// Whether `weekday` satisfies this entry.
    pub fn matches(&self, weekday: Weekday) -> bool {
        let weekend = matches!(weekday, Weekday::Sat | Weekday::Sun);
        match self {
            Self::Monday => weekday == Weekday::Mon,
            Self::Tuesday => weekday == Weekday::Tue,
            Self::Wednesday => weekday == Weekday::Wed,
            Self::Thursday => weekday == Weekday::Thu,
            Self::Friday => weekday == Weekday::Fri,
            Self::Saturday => weekday == Weekday::Sat,
            Self::Sunday => weekday == Weekday::Sun,
            Self::Weekday => !weekend,
            Self::Weekend => weekend,
        }
    }
}

// ============================================================================
// Message schedule
// ============================================================================

/// Scheduling override for a single message index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessageSchedule {
    /// Index of the message this schedule pins.
    pub message_index: usize,
    /// Firing period in ticks; `None` inherits the catalog default.
    pub custom_interval_ticks: Option<u64>,
    /// Active wall-clock windows. Empty means no time constraint.
    pub active_time_ranges: Vec<TimeRange>,
    /// Active days. Empty means no day constraint.
    pub active_days: Vec<ActiveDay>,
}

impl MessageSchedule {
    pub fn new(message_index: usize, custom_interval_ticks: Option<u64>) -> Self {
        Self {
            message_index,
            custom_interval_ticks,
            active_time_ranges: Vec::new(),
            active_days: Vec::new(),
        }
    }

    pub fn has_custom_interval(&self) -> bool {
        self.custom_interval_ticks.is_some()
    }

    /// The firing period this schedule runs at.
    pub fn effective_interval(&self, default_ticks: u64) -> u64 {
        self.custom_interval_ticks.unwrap_or(default_ticks)
    }

    /// Whether the schedule is active at `now`.
    ///
    /// No windows and no day filters means always active. Otherwise the
    /// time constraint and the day constraint must each hold, where an
    /// empty set holds vacuously.
    pub fn is_active_at(&self, now: NaiveDateTime) -> bool {
        if self.active_time_ranges.is_empty() && self.active_days.is_empty() {
            return true;
        }

        let time_ok = self.active_time_ranges.is_empty()
            || self
                .active_time_ranges
                .iter()
                .any(|range| range.contains(now.time()));

        let day_ok = self.active_days.is_empty()
            || self.active_days.iter().any(|day| day.matches(now.weekday()));

        time_ok && day_ok
    }
}

impl fmt::Display for MessageSchedule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "schedule for message {}", self.message_index)?;
        match self.custom_interval_ticks {
            Some(ticks) => write!(f, ", every {ticks} ticks")?,
            None => write!(f, ", default interval")?,
        }
        if !self.active_time_ranges.is_empty() {
            let ranges: Vec<String> = self
                .active_time_ranges
                .iter()
                .map(TimeRange::to_string)
                .collect();
            write!(f, ", active {}", ranges.join(", "))?;
        }
        if !self.active_days.is_empty() {
            write!(f, ", days {:?}", self.active_days)?;
        }
        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================

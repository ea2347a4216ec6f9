use std::{collections::BTreeSet, fmt};

use chrono::{DateTime, NaiveDate, Weekday};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

/// Recurrence frequency. Only weekly schedules occur in collection calendars.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Frequency {
    Weekly,
}

impl Frequency {
    /// RRULE token.
    pub fn as_str(self) -> &'static str {
        match self {
            Frequency::Weekly => "WEEKLY",
        }
    }
}

impl fmt::Display for Frequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Two-letter BYDAY code of a weekday.
pub fn weekday_code(day: Weekday) -> &'static str {
    match day {
        Weekday::Mon => "MO",
        Weekday::Tue => "TU",
        Weekday::Wed => "WE",
        Weekday::Thu => "TH",
        Weekday::Fri => "FR",
        Weekday::Sat => "SA",
        Weekday::Sun => "SU",
    }
}

/// Structured form of one schema entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecurrenceDescriptor {
    /// Waste type, unique within the schema
    pub label: String,
    /// First collection, always on `weekday`
    pub start_date: NaiveDate,
    pub frequency: Frequency,
    /// Every N weeks, at least 1
    pub interval: u32,
    pub weekday: Weekday,
    /// Last possible collection (inclusive)
    pub until: NaiveDate,
    /// Extra collections outside the rule
    #[serde(default)]
    pub additional_dates: BTreeSet<NaiveDate>,
    /// Collections dropped from the rule, all on `weekday`
    #[serde(default)]
    pub exception_dates: BTreeSet<NaiveDate>,
}

impl RecurrenceDescriptor {
    /// The RRULE this descriptor expands to.
    pub fn recurrence_rule(&self) -> RecurrenceRule {
        RecurrenceRule {
            frequency: self.frequency,
            interval: self.interval,
            by_day: self.weekday,
            until: self.until,
        }
    }
}

/// Recurrence rule, rendered as an RRULE value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecurrenceRule {
    pub frequency: Frequency,
    pub interval: u32,
    pub by_day: Weekday,
    /// Date-valued, matching the date-valued DTSTART of the event
    pub until: NaiveDate,
}

impl fmt::Display for RecurrenceRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "FREQ={};BYDAY={};INTERVAL={};UNTIL={}",
            self.frequency,
            weekday_code(self.by_day),
            self.interval,
            self.until.format("%Y%m%d")
        )
    }
}

/// One VEVENT of the generated calendar.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecurringEvent {
    pub uid: String,
    pub label: String,
    pub title: String,
    pub start_date: NaiveDate,
    pub recurrence_rule: RecurrenceRule,
    #[serde(skip_serializing_if = "BTreeSet::is_empty")]
    pub additional_dates: BTreeSet<NaiveDate>,
    #[serde(skip_serializing_if = "BTreeSet::is_empty")]
    pub exception_dates: BTreeSet<NaiveDate>,
    /// Batch stamp shared by every event of the same calendar
    pub created: DateTime<Tz>,
}

/// In-memory calendar document, events ordered by `(start_date, label)`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Calendar {
    pub events: Vec<RecurringEvent>,
    pub created: DateTime<Tz>,
}

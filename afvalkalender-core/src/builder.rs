use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use tracing::debug;

use crate::{Calendar, Error, RecurrenceDescriptor, RecurringEvent, Result};

/// Timezone the batch stamp is taken in.
pub const DEFAULT_TIMEZONE: &str = "Europe/Amsterdam";

/// Resolve an IANA timezone name.
pub fn resolve_timezone(name: &str) -> Result<Tz> {
    name.parse::<Tz>()
        .map_err(|e| Error::Timezone(format!("{}: {}", name, e)))
}

/// Turns parsed descriptors into a calendar document.
///
/// The creation stamp is fixed at construction and shared by every event the
/// builder emits, so one run yields one consistent DTSTAMP/UID batch.
pub struct CalendarBuilder {
    created: DateTime<Tz>,
}

impl CalendarBuilder {
    /// Builder stamped with a fixed creation time.
    pub fn new(created: DateTime<Tz>) -> Self {
        Self { created }
    }

    /// Builder stamped with the current time in `timezone`.
    pub fn now(timezone: Tz) -> Self {
        Self::new(Utc::now().with_timezone(&timezone))
    }

    /// The stamp shared by every event of this batch.
    pub fn created(&self) -> DateTime<Tz> {
        self.created
    }

    /// One event per descriptor, ordered by start date then label.
    pub fn build(&self, descriptors: impl IntoIterator<Item = RecurrenceDescriptor>) -> Calendar {
        let mut descriptors: Vec<_> = descriptors.into_iter().collect();
        descriptors.sort_by(|a, b| (a.start_date, &a.label).cmp(&(b.start_date, &b.label)));

        let events = descriptors
            .into_iter()
            .map(|descriptor| self.build_event(descriptor))
            .collect();

        Calendar {
            events,
            created: self.created,
        }
    }

    fn build_event(&self, descriptor: RecurrenceDescriptor) -> RecurringEvent {
        let recurrence_rule = descriptor.recurrence_rule();
        let uid = format!(
            "{}-{}",
            self.created.format("%Y%m%dT%H%M%S%.6f%z"),
            descriptor.label
        );

        debug!("Event {}: {}", descriptor.label, recurrence_rule);

        RecurringEvent {
            uid,
            title: title_case(&descriptor.label),
            label: descriptor.label,
            start_date: descriptor.start_date,
            recurrence_rule,
            additional_dates: descriptor.additional_dates,
            exception_dates: descriptor.exception_dates,
            created: self.created,
        }
    }
}

/// First character upper case, the rest lower case.
pub fn title_case(label: &str) -> String {
    let mut chars = label.chars();
    match chars.next() {
        Some(first) => first
            .to_uppercase()
            .chain(chars.flat_map(char::to_lowercase))
            .collect(),
        None => String::new(),
    }
}

use std::collections::BTreeSet;

use chrono::{NaiveDate, Utc};
use tracing::debug;

use crate::{Calendar, RecurringEvent};

/// Maximum content line length in octets (RFC 5545, section 3.1).
const MAX_LINE_OCTETS: usize = 75;

const DATE_FORMAT: &str = "%Y%m%d";
const UTC_FORMAT: &str = "%Y%m%dT%H%M%SZ";

/// Options for the generated calendar file.
#[derive(Debug, Clone)]
pub struct IcsOptions {
    pub product_id: String,
    /// X-WR-CALNAME
    pub calendar_name: Option<String>,
    /// Put in front of every event title in SUMMARY
    pub summary_prefix: Option<String>,
}

impl Default for IcsOptions {
    fn default() -> Self {
        Self {
            product_id: "-//Afvalkalender//".to_string(),
            calendar_name: Some("Afvalkalender".to_string()),
            summary_prefix: Some("Afvalkalender".to_string()),
        }
    }
}

/// Serializes a [`Calendar`] to iCalendar text.
pub struct IcsWriter {
    options: IcsOptions,
}

impl IcsWriter {
    /// Writer with the given header and summary options.
    pub fn new(options: IcsOptions) -> Self {
        Self { options }
    }

    /// Options this writer renders with.
    pub fn options(&self) -> &IcsOptions {
        &self.options
    }

    /// Render the whole calendar as CRLF-terminated, folded iCalendar text.
    pub fn generate(&self, calendar: &Calendar) -> String {
        let mut ics_content = String::new();

        push_line(&mut ics_content, "BEGIN:VCALENDAR");
        push_line(&mut ics_content, "VERSION:2.0");
        push_line(
            &mut ics_content,
            &format!("PRODID:{}", self.options.product_id),
        );
        push_line(&mut ics_content, "CALSCALE:GREGORIAN");

        if let Some(ref name) = self.options.calendar_name {
            push_line(
                &mut ics_content,
                &format!("X-WR-CALNAME:{}", escape_text(name)),
            );
        }
        push_line(
            &mut ics_content,
            &format!("X-WR-TIMEZONE:{}", calendar.created.timezone().name()),
        );

        for event in &calendar.events {
            self.add_event(&mut ics_content, event);
        }

        push_line(&mut ics_content, "END:VCALENDAR");

        debug!(
            "Generated {} bytes for {} events",
            ics_content.len(),
            calendar.events.len()
        );

        ics_content
    }

    fn add_event(&self, ics_content: &mut String, event: &RecurringEvent) {
        let dtstamp = event.created.with_timezone(&Utc).format(UTC_FORMAT);

        push_line(ics_content, "BEGIN:VEVENT");
        push_line(ics_content, &format!("UID:{}", escape_text(&event.uid)));
        push_line(ics_content, &format!("DTSTAMP:{}", dtstamp));
        push_line(
            ics_content,
            &format!("DTSTART;VALUE=DATE:{}", event.start_date.format(DATE_FORMAT)),
        );
        push_line(
            ics_content,
            &format!("SUMMARY:{}", escape_text(&self.summary(event))),
        );
        push_line(ics_content, &format!("RRULE:{}", event.recurrence_rule));

        // Empty sets leave the property out entirely
        if !event.additional_dates.is_empty() {
            push_line(
                ics_content,
                &format!("RDATE;VALUE=DATE:{}", date_list(&event.additional_dates)),
            );
        }
        if !event.exception_dates.is_empty() {
            push_line(
                ics_content,
                &format!("EXDATE;VALUE=DATE:{}", date_list(&event.exception_dates)),
            );
        }

        push_line(ics_content, "END:VEVENT");
    }

    /// SUMMARY text of an event, prefixed when a prefix is configured.
    pub fn summary(&self, event: &RecurringEvent) -> String {
        match self.options.summary_prefix {
            Some(ref prefix) => format!("{} {}", prefix, event.title),
            None => event.title.clone(),
        }
    }
}

impl Default for IcsWriter {
    fn default() -> Self {
        Self::new(IcsOptions::default())
    }
}

fn date_list(dates: &BTreeSet<NaiveDate>) -> String {
    dates
        .iter()
        .map(|date| date.format(DATE_FORMAT).to_string())
        .collect::<Vec<_>>()
        .join(",")
}

fn push_line(ics_content: &mut String, line: &str) {
    ics_content.push_str(&fold_line(line));
    ics_content.push_str("\r\n");
}

/// Escape a TEXT property value.
pub fn escape_text(text: &str) -> String {
    text.replace('\\', "\\\\")
        .replace("\r\n", "\\n")
        .replace('\r', "\\n")
        .replace('\n', "\\n")
        .replace(',', "\\,")
        .replace(';', "\\;")
}

/// Folds a content line longer than 75 octets with CRLF + space, never
/// splitting a UTF-8 character.
pub fn fold_line(line: &str) -> String {
    if line.len() <= MAX_LINE_OCTETS {
        return line.to_string();
    }

    let mut result = String::with_capacity(line.len() + line.len() / MAX_LINE_OCTETS * 3);
    let mut current_len = 0;

    for c in line.chars() {
        let char_len = c.len_utf8();
        if current_len + char_len > MAX_LINE_OCTETS {
            result.push_str("\r\n ");
            // The leading space counts towards the next line
            current_len = 1;
        }
        result.push(c);
        current_len += char_len;
    }

    result
}

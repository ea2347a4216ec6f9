use chrono::{NaiveDate, Weekday};
use thiserror::Error;

/// Failure to turn one rule text into a recurrence descriptor.
///
/// Every variant names the label of the schema entry it came from, so a
/// transcription mistake in the hand-written schema can be traced back.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("Rule for {label} does not match `<rule> van <start> tot <end>`: {text:?}")]
    Template { label: String, text: String },

    #[error("Rule for {label} contains {separator:?} {count} times, at most {max} allowed")]
    Ambiguous {
        label: String,
        separator: &'static str,
        count: usize,
        max: usize,
    },

    #[error("Rule for {label} has malformed date {value:?}, expected YYYY-MM-DD")]
    Date { label: String, value: String },

    #[error("Rule for {label} names no weekday: {clause:?}")]
    MissingWeekday { label: String, clause: String },

    #[error("Rule for {label} names unknown weekday {name:?}")]
    UnknownWeekday { label: String, name: String },

    #[error("Parsing of rule for {label} failed: no weekly frequency in {clause:?}")]
    MissingFrequency { label: String, clause: String },

    #[error("Rule for {label} has invalid interval {value:?}")]
    InvalidInterval { label: String, value: String },

    #[error("Start date {date} of {label} is a {actual}, not a {expected} as the rule says")]
    StartWeekday {
        label: String,
        date: NaiveDate,
        expected: Weekday,
        actual: Weekday,
    },

    #[error("Exception date {date} of {label} is a {actual}, not a {expected} as the rule says")]
    ExceptionWeekday {
        label: String,
        date: NaiveDate,
        expected: Weekday,
        actual: Weekday,
    },

    #[error("End date {until} of {label} lies before its start date {start}")]
    UntilBeforeStart {
        label: String,
        start: NaiveDate,
        until: NaiveDate,
    },
}

impl ParseError {
    /// Label of the schema entry that failed to parse.
    pub fn label(&self) -> &str {
        match self {
            ParseError::Template { label, .. }
            | ParseError::Ambiguous { label, .. }
            | ParseError::Date { label, .. }
            | ParseError::MissingWeekday { label, .. }
            | ParseError::UnknownWeekday { label, .. }
            | ParseError::MissingFrequency { label, .. }
            | ParseError::InvalidInterval { label, .. }
            | ParseError::StartWeekday { label, .. }
            | ParseError::ExceptionWeekday { label, .. }
            | ParseError::UntilBeforeStart { label, .. } => label,
        }
    }
}

#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error("JSON parsing failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Unknown timezone: {0}")]
    Timezone(String),

    #[error("Invalid configuration: {0}")]
    Config(String),
}

/// Result alias over the crate [`Error`].
pub type Result<T> = std::result::Result<T, Error>;

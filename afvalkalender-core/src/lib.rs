//! Afvalkalender Core Library
//!
//! Turns a hand-written waste-collection schema (Dutch rule sentences such as
//! `Elke week op maandag van 2024-01-01 tot 2024-12-31`) into an iCalendar
//! document with one recurring event per waste type.

/// Calendar assembly from parsed descriptors
pub mod builder;
/// Error types
pub mod error;
/// iCalendar serialization
pub mod ics;
/// Dutch rule sentence parser
pub mod parser;
/// Schema and settings loading
pub mod schema;
/// Domain types
pub mod types;

// Re-export core types and error handling
pub use builder::{CalendarBuilder, DEFAULT_TIMEZONE, resolve_timezone};
pub use error::{Error, ParseError, Result};
pub use ics::{IcsOptions, IcsWriter};
pub use parser::RuleParser;
pub use schema::Settings;
pub use types::*;

/// Commonly used items
pub mod prelude {
    pub use crate::{builder::*, ics::*, parser::*, schema::*, types::*};
}

use std::{collections::BTreeMap, fs, path::Path};

use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info};

use crate::{
    DEFAULT_TIMEZONE, Error, IcsOptions, RecurrenceDescriptor, Result, RuleParser,
    resolve_timezone,
};

/// Schema file looked up next to the executable.
pub const DEFAULT_SCHEMA_FILE: &str = "schema.json";

/// Calendar file written next to the executable.
pub const OUTPUT_FILE: &str = "afvalkalender.ics";

const DEFAULT_CALENDAR_NAME: &str = "Afvalkalender";

fn default_timezone() -> String {
    DEFAULT_TIMEZONE.to_string()
}

fn default_calendar_name() -> String {
    DEFAULT_CALENDAR_NAME.to_string()
}

/// Hand-written collection schema.
///
/// Either the full form
///
/// ```json
/// { "timezone": "Europe/Amsterdam", "schema": { "gft": "Elke week op maandag van 2024-01-01 tot 2024-12-31" } }
/// ```
///
/// or just the `schema` object on its own.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default = "default_timezone")]
    pub timezone: String,
    #[serde(default = "default_calendar_name")]
    pub calendar_name: String,
    /// Waste type -> rule text
    pub schema: BTreeMap<String, String>,
}

impl Settings {
    /// Settings with default timezone and calendar name around a bare schema.
    pub fn from_schema(schema: BTreeMap<String, String>) -> Self {
        Self {
            timezone: default_timezone(),
            calendar_name: default_calendar_name(),
            schema,
        }
    }

    /// Load settings from a JSON file.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path_ref = path.as_ref();
        let content = fs::read_to_string(path_ref).map_err(|err| {
            Error::Config(format!(
                "Cannot read schema file {}: {}",
                path_ref.display(),
                err
            ))
        })?;
        debug!("Loaded schema from {}", path_ref.display());
        Self::from_json(&content)
    }

    /// Read either the full settings object or a bare label-to-rule map.
    pub fn from_json(json_data: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(json_data)?;

        let settings = if value.get("schema").is_some_and(Value::is_object) {
            serde_json::from_value(value)?
        } else {
            Self::from_schema(serde_json::from_value(value)?)
        };

        Ok(settings)
    }

    /// Resolve the configured timezone.
    pub fn timezone(&self) -> Result<Tz> {
        resolve_timezone(&self.timezone)
    }

    /// Writer options carrying the configured calendar name.
    pub fn ics_options(&self) -> IcsOptions {
        IcsOptions {
            calendar_name: Some(self.calendar_name.clone()),
            ..IcsOptions::default()
        }
    }

    /// Parse every entry. The first failing entry, in label order, aborts.
    pub fn parse_schema(&self) -> Result<Vec<RecurrenceDescriptor>> {
        if self.schema.is_empty() {
            return Err(Error::Config("Schema has no entries".to_string()));
        }

        let descriptors = self
            .schema
            .iter()
            .map(|(label, text)| {
                if label.trim().is_empty() {
                    return Err(Error::Config(format!("Empty label for rule {:?}", text)));
                }
                Ok(RuleParser::parse(label, text)?)
            })
            .collect::<Result<Vec<_>>>()?;

        info!("Parsed {} schema entries", descriptors.len());
        Ok(descriptors)
    }
}

use std::{
    fs,
    path::{Path, PathBuf},
};

use afvalkalender_core::{
    CalendarBuilder, IcsWriter, RecurrenceDescriptor, Settings,
    schema::{DEFAULT_SCHEMA_FILE, OUTPUT_FILE},
};
use anyhow::{Context, Result};
use chrono::DateTime;
use chrono_tz::Tz;

/// Arguments of the generate command
#[derive(Debug, Default)]
pub struct GenerateParams {
    pub schema: Option<PathBuf>,
    pub output: Option<PathBuf>,
}

/// Directory of the resolved executable, where schema and calendar live.
fn install_dir() -> Result<PathBuf> {
    let exe = std::env::current_exe()
        .and_then(|path| path.canonicalize())
        .context("Cannot locate the executable")?;

    exe.parent()
        .map(Path::to_path_buf)
        .context("Executable has no parent directory")
}

fn schema_path(schema: Option<PathBuf>) -> Result<PathBuf> {
    match schema {
        Some(path) => Ok(path),
        None => Ok(install_dir()?.join(DEFAULT_SCHEMA_FILE)),
    }
}

/// Generate the calendar file
pub fn generate_command(params: GenerateParams) -> Result<()> {
    let schema = schema_path(params.schema)?;
    let output = match params.output {
        Some(path) => path,
        None => install_dir()?.join(OUTPUT_FILE),
    };

    let count = generate_calendar(&schema, &output, None)?;
    println!("✓ {} ophaalschema's geschreven naar {}", count, output.display());

    Ok(())
}

/// Parse the schema at `schema`, build the calendar and write it to `output`.
///
/// Nothing is written unless every entry parses. `created` overrides the
/// batch stamp, otherwise the current time in the schema's timezone is used.
pub fn generate_calendar(
    schema: &Path,
    output: &Path,
    created: Option<DateTime<Tz>>,
) -> Result<usize> {
    let settings = Settings::from_path(schema)?;
    let descriptors = settings
        .parse_schema()
        .with_context(|| format!("Invalid schema {}", schema.display()))?;

    let builder = match created {
        Some(created) => CalendarBuilder::new(created),
        None => CalendarBuilder::now(settings.timezone()?),
    };
    tracing::info!("Building calendar stamped {}", builder.created());

    let calendar = builder.build(descriptors);
    let ics_content = IcsWriter::new(settings.ics_options()).generate(&calendar);

    fs::write(output, ics_content)
        .with_context(|| format!("Cannot write {}", output.display()))?;
    tracing::info!("Wrote {} events to {}", calendar.events.len(), output.display());

    Ok(calendar.events.len())
}

/// Validate the schema and print what each entry means
pub fn check_command(schema: Option<PathBuf>) -> Result<()> {
    let schema = schema_path(schema)?;
    let descriptors = check_schema(&schema)?;

    println!("Schema {}:", schema.display());
    for descriptor in &descriptors {
        println!("  {}: {}", descriptor.label, descriptor);
    }
    println!("✓ {} regels in orde", descriptors.len());

    Ok(())
}

pub fn check_schema(schema: &Path) -> Result<Vec<RecurrenceDescriptor>> {
    let settings = Settings::from_path(schema)?;
    settings.timezone()?;
    settings
        .parse_schema()
        .with_context(|| format!("Invalid schema {}", schema.display()))
}

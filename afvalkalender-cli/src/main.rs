mod commands;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "afvalkalender")]
#[command(about = "Genereer een ICS-afvalkalender uit een ophaalschema")]
#[command(version)]
struct Cli {
    /// Without a subcommand the calendar is generated next to the executable
    #[command(subcommand)]
    command: Option<Commands>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate the ICS file from the schema
    Generate {
        /// Schema file (default: schema.json next to the executable)
        #[arg(short, long)]
        schema: Option<PathBuf>,

        /// Output file (default: afvalkalender.ics next to the executable)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Parse and validate the schema without writing anything
    Check {
        /// Schema file (default: schema.json next to the executable)
        #[arg(short, long)]
        schema: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_level = if cli.verbose { "debug" } else { "info" };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("afvalkalender={}", log_level).into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    match cli.command {
        None => commands::generate_command(commands::GenerateParams::default()),

        Some(Commands::Generate { schema, output }) => {
            commands::generate_command(commands::GenerateParams { schema, output })
        }

        Some(Commands::Check { schema }) => commands::check_command(schema),
    }
}

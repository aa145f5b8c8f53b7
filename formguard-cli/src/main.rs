//! formguard command line
//!
//! Usage:
//!   formguard strength 'correct horse'
//!   formguard validate form.json --today 2024-06-14
//!
//! `validate` prints per-field messages as JSON and exits with status 1
//! when the form would be rejected.

use anyhow::Result;
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use formguard_cli::{read_config, read_form, validate_form};
use formguard_engine::EngineConfig;
use formguard_verify::mock::InMemoryVerifier;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "formguard")]
#[command(about = "Validate registration forms and score passwords")]
struct Args {
    #[command(subcommand)]
    command: Command,

    /// Enable verbose debug logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Score a password and print the report as JSON
    Strength { password: String },

    /// Validate a registration form document
    Validate {
        /// Path to the form document (JSON)
        form: PathBuf,

        /// Engine config (JSON); defaults apply to missing keys
        #[arg(long)]
        config: Option<PathBuf>,

        /// Date age rules measure against (YYYY-MM-DD); defaults to today
        #[arg(long)]
        today: Option<NaiveDate>,
    },
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let args = Args::parse();
    let default_level = if args.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact()
        .init();

    match args.command {
        Command::Strength { password } => {
            let report = formguard_rules::score(&password);
            println!("{}", serde_json::to_string_pretty(&report)?);
            Ok(ExitCode::SUCCESS)
        }
        Command::Validate {
            form,
            config,
            today,
        } => {
            let config = match config {
                Some(path) => read_config(&path)?,
                None => EngineConfig::default(),
            };
            let doc = read_form(&form)?;
            let today = today.unwrap_or_else(|| chrono::Local::now().date_naive());
            let report =
                validate_form(&doc, config, today, Arc::new(InMemoryVerifier::new())).await?;

            println!("{}", serde_json::to_string_pretty(&report)?);
            if report.valid {
                info!("{} is valid", form.display());
                Ok(ExitCode::SUCCESS)
            } else {
                info!("{} has {} invalid fields", form.display(), report.errors.len());
                Ok(ExitCode::FAILURE)
            }
        }
    }
}

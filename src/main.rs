//! # movie-report CLI
//!
//! The `movie-report` binary turns a CSV column of TMDB movie ids into a
//! sorted `.xlsx` report plus a dead-letter CSV.
//!
//! ## Usage
//!
//! ```bash
//! movie-report --config ./config/movie-report.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `movie-report run` | Fetch every id and write the report and dead-letter files |
//! | `movie-report run --dry-run` | Read and validate the input only |
//! | `movie-report check` | Show resolved paths and whether the run can start |
//!
//! ## Examples
//!
//! ```bash
//! # Run with the default config and a key from .env
//! movie-report run
//!
//! # Override paths and concurrency, machine-readable progress
//! movie-report run --input ids.csv --report out.xlsx --concurrency 4 --progress json
//!
//! # Verbose logging
//! RUST_LOG=movie_report=debug movie-report run
//! ```

use anyhow::bail;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use movie_report::config::{self, API_KEY_ENV};
use movie_report::pipeline;
use movie_report::progress::ProgressMode;

/// Enrich TMDB movie ids into a spreadsheet report.
#[derive(Parser)]
#[command(
    name = "movie-report",
    about = "Enrich TMDB movie ids into a sorted spreadsheet report with a dead-letter trail",
    version
)]
struct Cli {
    /// Path to configuration file (TOML).
    ///
    /// Defaults to `./config/movie-report.toml` when that file exists, and
    /// to built-in defaults otherwise.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch every id in the input and write both output files.
    ///
    /// Individual lookup or input failures never fail the run; they are
    /// listed in the dead-letter file.
    Run {
        /// Input CSV with an `ID` column.
        #[arg(long)]
        input: Option<PathBuf>,

        /// Output workbook path.
        #[arg(long)]
        report: Option<PathBuf>,

        /// Output dead-letter CSV path.
        #[arg(long)]
        dead_letter: Option<PathBuf>,

        /// Maximum lookups in flight.
        #[arg(long)]
        concurrency: Option<usize>,

        /// Progress on stderr. Defaults to human on a TTY, off otherwise.
        #[arg(long, value_enum)]
        progress: Option<ProgressMode>,

        /// Validate the input and print counts without fetching or writing.
        #[arg(long)]
        dry_run: bool,
    },

    /// Show the effective configuration and whether a run can start.
    Check,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let mut cfg = config::resolve_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Run {
            input,
            report,
            dead_letter,
            concurrency,
            progress,
            dry_run,
        } => {
            if let Some(input) = input {
                cfg.paths.input = input;
            }
            if let Some(report) = report {
                cfg.paths.report = report;
            }
            if let Some(dead_letter) = dead_letter {
                cfg.paths.dead_letter = dead_letter;
            }
            if let Some(concurrency) = concurrency {
                cfg.pipeline.concurrency = concurrency;
            }
            cfg.validate()?;

            if dry_run {
                pipeline::dry_run(&cfg)?;
            } else {
                let reporter = progress
                    .unwrap_or_else(ProgressMode::default_for_tty)
                    .reporter();
                pipeline::run_report(&cfg, reporter.as_ref()).await?;
            }
        }
        Commands::Check => {
            let input_exists = cfg.paths.input.exists();
            let key_set = config::load_api_key().is_ok();

            println!("input: {}", cfg.paths.input.display());
            println!("report: {}", cfg.paths.report.display());
            println!("dead letter: {}", cfg.paths.dead_letter.display());
            println!("tmdb: {}", cfg.tmdb.base_url);
            println!("concurrency: {}", cfg.pipeline.concurrency);
            println!("input exists: {}", if input_exists { "yes" } else { "no" });
            println!("{}: {}", API_KEY_ENV, if key_set { "set" } else { "missing" });

            if !input_exists || !key_set {
                bail!("not ready to run");
            }
            println!("ok");
        }
    }

    Ok(())
}

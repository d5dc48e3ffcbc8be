//! End-to-end run orchestration.
//!
//! [`run_pipeline`] is the pure core: validate → fetch → transform →
//! aggregate, with no file or environment access. [`run_report`] wraps it
//! with the input reader, credential check, and the two writers, and is
//! what `movie-report run` calls.
//!
//! A run always completes once its preconditions hold: individual record
//! failures end up in the ledger, never in the exit status.

use anyhow::{Context, Result};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{info, warn};

use crate::aggregate::aggregate;
use crate::client::MovieClient;
use crate::config::{load_api_key, Config};
use crate::coordinator::fetch_all;
use crate::dead_letter::write_dead_letter;
use crate::input::read_id_tokens;
use crate::models::{FetchFailureCause, RawToken, RunOutput};
use crate::progress::{ProgressEvent, ProgressReporter};
use crate::report::write_report;
use crate::transform::make_movie_row;
use crate::validate::validate_tokens;

/// Summary counters of one run. Advisory only.
#[derive(Debug, Clone, PartialEq)]
pub struct RunStats {
    /// Rows written to the report.
    pub processed: usize,
    /// Accepted ids whose lookup failed.
    pub failed: usize,
    /// Input rows rejected by validation.
    pub skipped: usize,
    pub elapsed: Duration,
    /// Accepted ids per second.
    pub rate: f64,
}

impl RunStats {
    fn new(output: &RunOutput, skipped: usize, accepted: usize, elapsed: Duration) -> Self {
        let secs = elapsed.as_secs_f64();
        let rate = if secs > 0.0 {
            accepted as f64 / secs
        } else {
            0.0
        };
        Self {
            processed: output.report.len(),
            failed: output.ledger.len() - skipped,
            skipped,
            elapsed,
            rate,
        }
    }
}

/// Run every stage over `tokens` and return the assembled output.
pub async fn run_pipeline(
    tokens: Vec<RawToken>,
    client: Arc<MovieClient>,
    concurrency: usize,
    progress: &dyn ProgressReporter,
) -> (RunOutput, RunStats) {
    let started = Instant::now();

    let validated = validate_tokens(tokens);
    let accepted = validated.ids.len();
    let skipped = validated.rejects.len();
    progress.report(ProgressEvent::Validated {
        accepted: accepted as u64,
        rejected: skipped as u64,
    });
    if accepted == 0 {
        warn!("No valid movie ids in input; the report will be empty");
    }

    let fetched = fetch_all(client, &validated.ids, concurrency, progress).await;
    for failure in &fetched.failures {
        if let FetchFailureCause::Crashed(message) = &failure.cause {
            warn!(movie_id = failure.id, "lookup crashed: {}", message);
        }
    }

    let rows = fetched
        .payloads
        .iter()
        .map(|(id, payload)| make_movie_row(*id, payload))
        .collect();
    let output = aggregate(rows, validated.rejects, fetched.failures);

    let stats = RunStats::new(&output, skipped, accepted, started.elapsed());
    (output, stats)
}

/// Read the configured input, run the pipeline, and write both artifacts.
///
/// The credential is checked before anything is fetched. Both files are
/// written even when empty.
pub async fn run_report(config: &Config, progress: &dyn ProgressReporter) -> Result<RunStats> {
    let paths = &config.paths;
    let tokens = read_id_tokens(&paths.input)?;
    let api_key = load_api_key()?;
    let client = Arc::new(MovieClient::from_config(config, api_key)?);

    info!(
        input = %paths.input.display(),
        rows = tokens.len(),
        concurrency = config.pipeline.concurrency,
        "starting run"
    );

    let (output, stats) =
        run_pipeline(tokens, client, config.pipeline.concurrency, progress).await;

    write_report(&output.report, &paths.report)?;
    write_dead_letter(&output.ledger, &paths.dead_letter).with_context(|| {
        format!(
            "Failed to write dead-letter file: {}",
            paths.dead_letter.display()
        )
    })?;

    info!(
        processed = stats.processed,
        failed = stats.failed,
        skipped = stats.skipped,
        elapsed_ms = stats.elapsed.as_millis() as u64,
        "run finished"
    );

    println!("run {}", paths.input.display());
    println!("  processed: {} movies", stats.processed);
    println!("  failed lookups: {}", stats.failed);
    println!("  skipped rows: {}", stats.skipped);
    println!(
        "  elapsed: {:.2}s ({:.1} ids/s)",
        stats.elapsed.as_secs_f64(),
        stats.rate
    );
    println!("  report: {}", paths.report.display());
    println!("  dead letter: {}", paths.dead_letter.display());
    println!("ok");

    Ok(stats)
}

/// Read and validate the input without fetching or writing anything.
pub fn dry_run(config: &Config) -> Result<()> {
    let tokens = read_id_tokens(&config.paths.input)?;
    let validated = validate_tokens(tokens);

    println!("run {} (dry-run)", config.paths.input.display());
    println!("  rows read: {}", validated.token_count());
    println!("  ids accepted: {}", validated.ids.len());
    println!("  rows skipped: {}", validated.rejects.len());
    for reject in &validated.rejects {
        println!(
            "    row {}: {:?} ({})",
            reject.row_number, reject.raw_value, reject.reason
        );
    }
    println!("ok");

    Ok(())
}

//! Run progress reporting.
//!
//! Reports observable progress during `movie-report run` so users see how
//! many ids were accepted and how many lookups are done. Progress is emitted
//! on **stderr** so stdout remains parseable for scripts.

use std::io::Write;

/// A single progress event.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ProgressEvent {
    /// Input validation finished.
    Validated { accepted: u64, rejected: u64 },
    /// Fetch phase: n lookups resolved out of total.
    Fetching { n: u64, total: u64 },
}

/// Reports run progress. Implementations write to stderr (human or JSON).
pub trait ProgressReporter: Send + Sync {
    /// Emit a progress event. Called from the coordinator loop.
    fn report(&self, event: ProgressEvent);
}

/// Human-friendly progress on stderr: "fetching  1,234 / 5,000 movies".
pub struct StderrProgress;

impl ProgressReporter for StderrProgress {
    fn report(&self, event: ProgressEvent) {
        let line = match &event {
            ProgressEvent::Validated { accepted, rejected } => format!(
                "validated  {} ids accepted, {} rows skipped\n",
                format_number(*accepted),
                format_number(*rejected)
            ),
            ProgressEvent::Fetching { n, total } => format!(
                "fetching  {} / {} movies\n",
                format_number(*n),
                format_number(*total)
            ),
        };
        let mut stderr = std::io::stderr().lock();
        let _ = stderr.write_all(line.as_bytes());
        let _ = stderr.flush();
    }
}

/// One JSON object per event, newline-delimited, on stderr.
pub struct JsonProgress;

impl ProgressReporter for JsonProgress {
    fn report(&self, event: ProgressEvent) {
        if let Ok(line) = serde_json::to_string(&event_json(&event)) {
            let mut stderr = std::io::stderr().lock();
            let _ = writeln!(stderr, "{}", line);
            let _ = stderr.flush();
        }
    }
}

fn event_json(event: &ProgressEvent) -> serde_json::Value {
    match event {
        ProgressEvent::Validated { accepted, rejected } => serde_json::json!({
            "event": "progress",
            "phase": "validated",
            "accepted": accepted,
            "rejected": rejected
        }),
        ProgressEvent::Fetching { n, total } => serde_json::json!({
            "event": "progress",
            "phase": "fetching",
            "n": n,
            "total": total
        }),
    }
}

/// Discards every event.
pub struct NoProgress;

impl ProgressReporter for NoProgress {
    fn report(&self, _event: ProgressEvent) {}
}

/// Group digits in thousands: `1234567` → `"1,234,567"`.
pub(crate) fn format_number(n: u64) -> String {
    let digits = n.to_string();
    let head = digits.len() % 3;
    let mut grouped = String::from(&digits[..head]);
    for (i, group) in digits.as_bytes()[head..].chunks(3).enumerate() {
        if head > 0 || i > 0 {
            grouped.push(',');
        }
        grouped.push_str(std::str::from_utf8(group).unwrap_or_default());
    }
    grouped
}

/// `--progress` values.
#[derive(Clone, Copy, Debug, Eq, PartialEq, clap::ValueEnum)]
pub enum ProgressMode {
    /// No progress output.
    Off,
    /// Status lines on stderr.
    Human,
    /// JSON lines on stderr.
    Json,
}

impl ProgressMode {
    /// Human output for an interactive stderr, nothing when piped.
    pub fn default_for_tty() -> Self {
        match atty::is(atty::Stream::Stderr) {
            true => Self::Human,
            false => Self::Off,
        }
    }

    pub fn reporter(&self) -> Box<dyn ProgressReporter> {
        match self {
            Self::Off => Box::new(NoProgress),
            Self::Human => Box::new(StderrProgress),
            Self::Json => Box::new(JsonProgress),
        }
    }
}

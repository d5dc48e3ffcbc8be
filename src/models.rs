//! Core data models used throughout movie-report.
//!
//! These types represent the input tokens, rows, and failure records that
//! flow through the fetch-transform-aggregate pipeline.

use std::fmt;

/// A TMDB movie identifier. Always positive once accepted by the validator.
pub type MovieId = u64;

/// Reason string written to the dead-letter ledger for every fetch failure.
pub const FETCH_FAILED: &str = "fetch-failed";

/// One cell of the input `ID` column, tagged with its 1-based row number.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawToken {
    pub raw: String,
    pub row_number: usize,
}

impl RawToken {
    pub fn new(raw: impl Into<String>, row_number: usize) -> Self {
        Self {
            raw: raw.into(),
            row_number,
        }
    }
}

/// Why an input token was rejected before any fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RejectReason {
    Blank,
    NonNumeric,
    NonPositive,
    Duplicate,
}

impl RejectReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            RejectReason::Blank => "blank",
            RejectReason::NonNumeric => "non-numeric",
            RejectReason::NonPositive => "non-positive",
            RejectReason::Duplicate => "duplicate",
        }
    }
}

impl fmt::Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An input token that did not become an identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RejectRecord {
    /// The trimmed token text.
    pub raw_value: String,
    pub row_number: usize,
    pub reason: RejectReason,
}

/// What went wrong during a fetch. Only used for logs and the run summary;
/// the ledger always renders [`FETCH_FAILED`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchFailureCause {
    /// The service answered 404.
    NotFound,
    /// A non-retryable status other than 404.
    Unrecoverable { status: u16 },
    /// Every attempt hit a transient failure.
    RetriesExhausted { attempts: u32, last_error: String },
    /// The fetch task panicked or was aborted.
    Crashed(String),
}

impl fmt::Display for FetchFailureCause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FetchFailureCause::NotFound => write!(f, "not found"),
            FetchFailureCause::Unrecoverable { status } => {
                write!(f, "unrecoverable status {}", status)
            }
            FetchFailureCause::RetriesExhausted {
                attempts,
                last_error,
            } => write!(f, "gave up after {} attempts: {}", attempts, last_error),
            FetchFailureCause::Crashed(msg) => write!(f, "fetch task crashed: {}", msg),
        }
    }
}

/// A valid identifier whose lookup ended in a terminal failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchFailure {
    pub id: MovieId,
    pub cause: FetchFailureCause,
}

impl FetchFailure {
    pub fn new(id: MovieId, cause: FetchFailureCause) -> Self {
        Self { id, cause }
    }
}

/// One entry of the dead-letter ledger.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureRecord {
    Rejected(RejectRecord),
    FetchFailed(FetchFailure),
}

impl FailureRecord {
    /// The `(ID, Reason, RowNumber)` triple written to the dead-letter file.
    ///
    /// Fetch failures carry the numeric id and an empty row number; rejects
    /// carry the raw token and the row it came from.
    pub fn ledger_fields(&self) -> (String, &'static str, String) {
        match self {
            FailureRecord::Rejected(r) => (
                r.raw_value.clone(),
                r.reason.as_str(),
                r.row_number.to_string(),
            ),
            FailureRecord::FetchFailed(f) => (f.id.to_string(), FETCH_FAILED, String::new()),
        }
    }
}

impl From<RejectRecord> for FailureRecord {
    fn from(r: RejectRecord) -> Self {
        FailureRecord::Rejected(r)
    }
}

impl From<FetchFailure> for FailureRecord {
    fn from(f: FetchFailure) -> Self {
        FailureRecord::FetchFailed(f)
    }
}

/// A normalized report row built from one TMDB payload.
#[derive(Debug, Clone, PartialEq)]
pub struct MovieRow {
    pub id: MovieId,
    pub title: String,
    pub vote_average: f64,
    /// Sorted ascending, no duplicates.
    pub genres: Vec<String>,
    pub is_action: bool,
}

/// The aggregated result of one run: what the writers get to see.
#[derive(Debug, Clone, Default)]
pub struct RunOutput {
    /// Rows sorted ascending by id.
    pub report: Vec<MovieRow>,
    /// Rejects in input order, then fetch failures.
    pub ledger: Vec<FailureRecord>,
}

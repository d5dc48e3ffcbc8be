//! Final merge of rows and failure records.
//!
//! [`aggregate`] is the only place where the report and the dead-letter
//! ledger are assembled; writers receive the finished [`RunOutput`] and
//! never see partial results.

use crate::models::{FailureRecord, FetchFailure, MovieRow, RejectRecord, RunOutput};

/// Sort rows by id and concatenate the failure stages.
///
/// The ledger lists input rejects first (input order), then fetch failures
/// in the order given.
pub fn aggregate(
    mut rows: Vec<MovieRow>,
    rejects: Vec<RejectRecord>,
    fetch_failures: Vec<FetchFailure>,
) -> RunOutput {
    rows.sort_by_key(|row| row.id);
    debug_assert!(
        rows.windows(2).all(|w| w[0].id != w[1].id),
        "report rows must have unique ids"
    );

    let ledger = rejects
        .into_iter()
        .map(FailureRecord::from)
        .chain(fetch_failures.into_iter().map(FailureRecord::from))
        .collect();

    RunOutput {
        report: rows,
        ledger,
    }
}

//! Bounded-concurrency fan-out of movie lookups.
//!
//! Every accepted id gets its own task in a [`JoinSet`]; a [`Semaphore`]
//! keeps at most `concurrency` lookups in flight. Each lookup runs in a
//! nested task so a panic is caught as a [`JoinError`] and attributed to
//! its id instead of tearing down the run. Results are merged only by the
//! single loop in [`fetch_all`], so workers never touch shared containers.

use serde_json::Value;
use std::any::Any;
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::{JoinError, JoinSet};
use tracing::{debug, error};

use crate::client::{FetchOutcome, MovieClient};
use crate::models::{FetchFailure, FetchFailureCause, MovieId};
use crate::progress::{ProgressEvent, ProgressReporter};

/// Everything the fetch stage produced.
#[derive(Debug, Default)]
pub struct FetchResults {
    /// Successful payloads, in completion order.
    pub payloads: Vec<(MovieId, Value)>,
    /// Terminal failures, sorted by id.
    pub failures: Vec<FetchFailure>,
}

/// Fetch every id with at most `concurrency` lookups in flight.
///
/// Returns once every id has resolved. Each id appears exactly once in
/// either `payloads` or `failures`.
pub async fn fetch_all(
    client: Arc<MovieClient>,
    ids: &[MovieId],
    concurrency: usize,
    progress: &dyn ProgressReporter,
) -> FetchResults {
    let total = ids.len() as u64;
    let limit = Arc::new(Semaphore::new(concurrency.clamp(1, Semaphore::MAX_PERMITS)));
    let mut pending: HashSet<MovieId> = ids.iter().copied().collect();
    let mut tasks = JoinSet::new();

    for &id in ids {
        let client = client.clone();
        let limit = limit.clone();
        tasks.spawn(async move {
            let permit = match limit.acquire_owned().await {
                Ok(permit) => permit,
                Err(e) => return (id, Err(e.to_string())),
            };
            let lookup = tokio::spawn(async move { client.fetch(id).await });
            let result = lookup.await.map_err(describe_join_error);
            drop(permit);
            (id, result)
        });
    }

    let mut results = FetchResults::default();
    let mut done = 0u64;

    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok((id, result)) => {
                pending.remove(&id);
                record(&mut results, id, result);
            }
            Err(e) => error!("Fetch worker failed: {}", describe_join_error(e)),
        }
        done += 1;
        progress.report(ProgressEvent::Fetching { n: done, total });
    }

    // A worker that died outside the lookup loses its id; account for it here.
    for id in pending {
        results.failures.push(FetchFailure::new(
            id,
            FetchFailureCause::Crashed("worker lost before reporting".to_string()),
        ));
    }

    results.failures.sort_by_key(|f| f.id);
    results
}

fn record(results: &mut FetchResults, id: MovieId, result: Result<FetchOutcome, String>) {
    match result {
        Ok(outcome) => match outcome.into_result(id) {
            Ok(payload) => results.payloads.push((id, payload)),
            Err(failure) => {
                debug!(movie_id = id, cause = %failure.cause, "lookup failed");
                results.failures.push(failure);
            }
        },
        Err(message) => {
            error!("Lookup for movie {} crashed: {}", id, message);
            results
                .failures
                .push(FetchFailure::new(id, FetchFailureCause::Crashed(message)));
        }
    }
}

fn describe_join_error(e: JoinError) -> String {
    if e.is_panic() {
        panic_message(e.into_panic())
    } else {
        e.to_string()
    }
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        format!("panicked: {}", s)
    } else if let Some(s) = payload.downcast_ref::<String>() {
        format!("panicked: {}", s)
    } else {
        "panicked".to_string()
    }
}

//! Identifier validation and deduplication.
//!
//! Turns raw `ID` cells into the set of movie ids to fetch. Every token
//! that is not accepted produces exactly one [`RejectRecord`], so the
//! caller can account for every input row.
//!
//! # Classification
//!
//! Tokens are trimmed (whitespace and a stray byte-order mark) and then
//! checked in this order:
//!
//! | Check | Reason |
//! |-------|--------|
//! | empty after trimming | `blank` |
//! | not a signed 64-bit integer | `non-numeric` |
//! | `<= 0` | `non-positive` |
//! | already accepted earlier | `duplicate` |
//!
//! The first occurrence of an id wins; later ones are duplicates.

use std::collections::HashSet;

use crate::models::{MovieId, RawToken, RejectReason, RejectRecord};

/// Output of [`validate_tokens`].
#[derive(Debug, Clone, Default)]
pub struct ValidatedIds {
    /// Accepted ids in first-occurrence order.
    pub ids: Vec<MovieId>,
    /// Rejected tokens in input order.
    pub rejects: Vec<RejectRecord>,
}

impl ValidatedIds {
    /// Number of input tokens this result accounts for.
    pub fn token_count(&self) -> usize {
        self.ids.len() + self.rejects.len()
    }
}

/// Classify every token, accepting each valid id once.
pub fn validate_tokens<I>(tokens: I) -> ValidatedIds
where
    I: IntoIterator<Item = RawToken>,
{
    let mut seen: HashSet<MovieId> = HashSet::new();
    let mut out = ValidatedIds::default();

    for token in tokens {
        let value = normalize(&token.raw);
        match classify(value, &seen) {
            Ok(id) => {
                seen.insert(id);
                out.ids.push(id);
            }
            Err(reason) => {
                if matches!(reason, RejectReason::NonNumeric | RejectReason::NonPositive) {
                    tracing::warn!(
                        "Skipping {} ID '{}' on row {}.",
                        reason,
                        value,
                        token.row_number
                    );
                }
                out.rejects.push(RejectRecord {
                    raw_value: value.to_string(),
                    row_number: token.row_number,
                    reason,
                });
            }
        }
    }

    out
}

fn normalize(raw: &str) -> &str {
    raw.trim_matches(|c: char| c.is_whitespace() || c == '\u{feff}')
}

fn classify(value: &str, seen: &HashSet<MovieId>) -> Result<MovieId, RejectReason> {
    if value.is_empty() {
        return Err(RejectReason::Blank);
    }
    let parsed: i64 = value.parse().map_err(|_| RejectReason::NonNumeric)?;
    if parsed <= 0 {
        return Err(RejectReason::NonPositive);
    }
    let id = parsed as MovieId;
    if seen.contains(&id) {
        return Err(RejectReason::Duplicate);
    }
    Ok(id)
}

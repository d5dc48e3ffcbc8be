//! Input file reader.
//!
//! Reads the `ID` column of a header-delimited CSV file into [`RawToken`]s.
//! The reader does no validation of the values themselves; that is the
//! validator's job. Row numbers are 1-based with the header on row 1, so
//! the first data row is row 2.

use anyhow::{anyhow, bail, Context, Result};
use std::fs::File;
use std::io::Read;
use std::path::Path;

use crate::models::RawToken;

/// Header of the column holding movie ids.
pub const ID_COLUMN: &str = "ID";

/// Read every `ID` cell of the CSV file at `path`.
///
/// # Errors
///
/// A missing or unreadable file, malformed CSV, or a header row without an
/// `ID` column. These abort the run before any lookup.
pub fn read_id_tokens(path: &Path) -> Result<Vec<RawToken>> {
    if !path.exists() {
        bail!("Input file not found at: {}", path.display());
    }
    let file = File::open(path)
        .with_context(|| format!("Failed to open input file: {}", path.display()))?;
    read_id_tokens_from(file)
        .with_context(|| format!("Failed to read input file: {}", path.display()))
}

/// Same as [`read_id_tokens`] for any reader.
pub fn read_id_tokens_from<R: Read>(reader: R) -> Result<Vec<RawToken>> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(reader);

    let column = csv_reader
        .headers()?
        .iter()
        .position(|h| normalize_header(h) == ID_COLUMN)
        .ok_or_else(|| anyhow!("missing the required '{}' header", ID_COLUMN))?;

    let mut tokens = Vec::new();
    for (index, record) in csv_reader.records().enumerate() {
        let record = record?;
        // Short rows have no cell for the column; treat them as blank.
        let raw = record.get(column).unwrap_or("");
        tokens.push(RawToken::new(raw, index + 2));
    }

    Ok(tokens)
}

fn normalize_header(name: &str) -> &str {
    name.trim_start_matches('\u{feff}').trim()
}

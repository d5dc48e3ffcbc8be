//! Dead-letter CSV writer.
//!
//! One line per ledger entry under the header `ID,Reason,RowNumber`:
//!
//! | Entry | ID | Reason | RowNumber |
//! |-------|----|--------|-----------|
//! | input reject | raw token | `blank`, `non-numeric`, `non-positive`, `duplicate` | source row |
//! | fetch failure | movie id | `fetch-failed` | empty |

use anyhow::Result;
use std::io::Write;
use std::path::Path;

use crate::atomic_write::write_atomic;
use crate::models::FailureRecord;

pub const DEAD_LETTER_HEADER: [&str; 3] = ["ID", "Reason", "RowNumber"];

/// Atomically write the ledger to `path`. An empty ledger still produces
/// a file containing the header.
pub fn write_dead_letter(ledger: &[FailureRecord], path: &Path) -> Result<()> {
    write_atomic(path, |file| write_ledger(ledger, file))
}

/// Render the ledger as CSV into any writer.
pub fn write_ledger<W: Write>(ledger: &[FailureRecord], out: W) -> Result<()> {
    let mut writer = csv::Writer::from_writer(out);
    writer.write_record(DEAD_LETTER_HEADER)?;
    for record in ledger {
        let (id, reason, row_number) = record.ledger_fields();
        writer.write_record([id.as_str(), reason, row_number.as_str()])?;
    }
    writer.flush()?;
    Ok(())
}

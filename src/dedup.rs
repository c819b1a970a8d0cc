//! Duplicate-row removal.
//!
//! Rows are grouped by the verbatim address value (`"A@x.com"` and
//! `"a@x.com"` are different groups); within a group the first row by row
//! identity survives.

use tracing::{debug, info};

use crate::store::{Result, RowStore};

/// Row counts around one deduplication.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub struct DedupReport {
    pub before: u64,
    pub after: u64,
    pub removed: u64,
}

/// Deletes duplicate rows in one set-based statement.
///
/// `removed` is `before - after`, both taken with the same row count the
/// validation pipeline uses; it is only exact when nobody else writes to the
/// table meanwhile.
pub fn dedupe<S: RowStore + ?Sized>(store: &mut S) -> Result<DedupReport> {
    let before = store.count_rows()?;
    let deleted = store.delete_duplicates()?;
    let after = store.count_rows()?;
    let removed = before.saturating_sub(after);
    debug!(before, after, deleted, "duplicate delete executed");
    info!("Removed duplicates: {removed} row(s) deleted");
    Ok(DedupReport {
        before,
        after,
        removed,
    })
}

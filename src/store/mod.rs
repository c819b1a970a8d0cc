//! Row store: the table holding the email rows.
//!
//! Provides the [`RowStore`] trait, a [`PostgresRowStore`] for production
//! and, behind `with-sqlite` (always in tests), a [`SqliteRowStore`].

pub mod error;
mod ident;
mod postgres;
#[cfg(any(test, feature = "with-sqlite"))]
mod sqlite;

pub use self::postgres::PostgresRowStore;
pub use error::{Result, StoreError};
pub use ident::{Ident, TableLayout, TableName};
#[cfg(any(test, feature = "with-sqlite"))]
pub use sqlite::SqliteRowStore;
#[cfg(test)]
pub(crate) use sqlite::fixtures as sqlite_fixtures;

/// Status value written for a valid address.
pub const STATUS_VALID: &str = "Valid";

/// Default name of the status column.
pub const DEFAULT_STATUS_COLUMN: &str = "Status";

/// Row subsets the pipeline counts and scans.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusFilter {
    /// Status is NULL or empty.
    Unchecked,
    /// Status is exactly [`STATUS_VALID`].
    Valid,
}

impl StatusFilter {
    /// SQL predicate over the status column. Only the fixed status literal
    /// is inlined; it is shared by both dialects.
    pub(crate) fn predicate(self, status: &Ident) -> String {
        match self {
            Self::Unchecked => format!("({status} IS NULL OR {status} = '')"),
            Self::Valid => format!("{status} = '{STATUS_VALID}'"),
        }
    }
}

/// Storage operations needed by deduplication and validation.
///
/// All calls are blocking and issued one at a time. Every write is its own
/// committed statement, so an interrupted run keeps what it wrote.
pub trait RowStore {
    /// Total number of rows in the table.
    fn count_rows(&mut self) -> Result<u64>;

    /// Number of rows matching `filter`.
    fn count_status(&mut self, filter: StatusFilter) -> Result<u64>;

    /// Address column of every row matching `filter`, in row-identity order.
    /// `None` stands for a NULL address.
    fn scan_addresses(&mut self, filter: StatusFilter) -> Result<Vec<Option<String>>>;

    /// Write `status` on every unchecked row whose address equals `address`
    /// (NULL-safe). Rows that already carry a status are never rewritten.
    /// Returns the number of rows updated.
    fn set_status(&mut self, address: Option<&str>, status: &str) -> Result<u64>;

    fn has_status_column(&mut self) -> Result<bool>;

    fn add_status_column(&mut self) -> Result<()>;

    fn drop_status_column(&mut self) -> Result<()>;

    /// Delete every row but the first (by row identity) of each group of
    /// identical addresses, in one statement. Returns the rows deleted.
    fn delete_duplicates(&mut self) -> Result<u64>;
}

impl<S: RowStore + ?Sized> RowStore for &mut S {
    fn count_rows(&mut self) -> Result<u64> {
        (**self).count_rows()
    }

    fn count_status(&mut self, filter: StatusFilter) -> Result<u64> {
        (**self).count_status(filter)
    }

    fn scan_addresses(&mut self, filter: StatusFilter) -> Result<Vec<Option<String>>> {
        (**self).scan_addresses(filter)
    }

    fn set_status(&mut self, address: Option<&str>, status: &str) -> Result<u64> {
        (**self).set_status(address, status)
    }

    fn has_status_column(&mut self) -> Result<bool> {
        (**self).has_status_column()
    }

    fn add_status_column(&mut self) -> Result<()> {
        (**self).add_status_column()
    }

    fn drop_status_column(&mut self) -> Result<()> {
        (**self).drop_status_column()
    }

    fn delete_duplicates(&mut self) -> Result<u64> {
        (**self).delete_duplicates()
    }
}

/// `DELETE` keeping the first row of each address group, ordered by the
/// backend's row identity column (`ctid`, `rowid`).
pub(crate) fn dedup_statement(layout: &TableLayout, row_id: &str) -> String {
    let TableLayout { table, email, .. } = layout;
    format!(
        "DELETE FROM {table} \
         WHERE {row_id} IN ( \
           SELECT row_ident FROM ( \
             SELECT {row_id} AS row_ident, ROW_NUMBER() OVER (PARTITION BY {email} ORDER BY {row_id}) AS row_num \
             FROM {table} \
           ) AS duplicates \
           WHERE row_num > 1 \
         )"
    )
}

pub(crate) fn count_to_u64(count: i64) -> u64 {
    u64::try_from(count).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn layout() -> TableLayout {
        TableLayout::new("emails", "email", "Status").unwrap()
    }

    #[test]
    fn predicates_quote_the_column() {
        let layout = layout();
        assert_eq!(
            StatusFilter::Unchecked.predicate(&layout.status),
            "(\"Status\" IS NULL OR \"Status\" = '')"
        );
        assert_eq!(
            StatusFilter::Valid.predicate(&layout.status),
            "\"Status\" = 'Valid'"
        );
    }

    #[test]
    fn dedup_statement_partitions_by_email() {
        let sql = dedup_statement(&layout(), "ctid");
        assert!(sql.starts_with("DELETE FROM \"emails\""));
        assert!(sql.contains("PARTITION BY \"email\" ORDER BY ctid"));
        assert!(sql.contains("row_num > 1"));
    }
}

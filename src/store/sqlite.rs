//! `SQLite`-backed implementation of [`RowStore`].
//!
//! Row identity is `rowid`, so `WITHOUT ROWID` tables are not supported.

use std::path::Path;

use rusqlite::{Connection, OptionalExtension, params};

use super::error::Result;
use super::{RowStore, StatusFilter, TableLayout, count_to_u64, dedup_statement};

/// `SQLite` row store over one connection.
///
/// Create with [`SqliteRowStore::open`] for a database file or
/// [`SqliteRowStore::in_memory`] for tests.
pub struct SqliteRowStore {
    conn: Connection,
    layout: TableLayout,
}

impl SqliteRowStore {
    /// Open an existing `SQLite` database at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Sqlite`](super::StoreError::Sqlite) if the file
    /// cannot be opened.
    pub fn open(path: &Path, layout: TableLayout) -> Result<Self> {
        let conn = Connection::open(path)?;
        Ok(Self { conn, layout })
    }

    /// Create an empty in-memory database (for testing).
    pub fn in_memory(layout: TableLayout) -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        Ok(Self { conn, layout })
    }

    /// Raw connection, for seeding fixtures.
    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    pub fn layout(&self) -> &TableLayout {
        &self.layout
    }

    fn query_count(&self, sql: &str) -> Result<u64> {
        let count: i64 = self.conn.query_row(sql, [], |row| row.get(0))?;
        Ok(count_to_u64(count))
    }
}

impl RowStore for SqliteRowStore {
    fn count_rows(&mut self) -> Result<u64> {
        let sql = format!("SELECT COUNT(*) FROM {}", self.layout.table);
        self.query_count(&sql)
    }

    fn count_status(&mut self, filter: StatusFilter) -> Result<u64> {
        let sql = format!(
            "SELECT COUNT(*) FROM {} WHERE {}",
            self.layout.table,
            filter.predicate(&self.layout.status)
        );
        self.query_count(&sql)
    }

    fn scan_addresses(&mut self, filter: StatusFilter) -> Result<Vec<Option<String>>> {
        let TableLayout {
            table,
            email,
            status,
        } = &self.layout;
        let sql = format!(
            "SELECT CAST({email} AS TEXT) FROM {table} WHERE {} ORDER BY rowid",
            filter.predicate(status)
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let addresses = stmt
            .query_map([], |row| row.get::<_, Option<String>>(0))?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(addresses)
    }

    fn set_status(&mut self, address: Option<&str>, status_value: &str) -> Result<u64> {
        let TableLayout {
            table,
            email,
            status,
        } = &self.layout;
        let unchecked = StatusFilter::Unchecked.predicate(status);
        let sql = format!("UPDATE {table} SET {status} = ?1 WHERE {email} IS ?2 AND {unchecked}");
        let updated = self.conn.execute(&sql, params![status_value, address])?;
        Ok(updated as u64)
    }

    fn has_status_column(&mut self) -> Result<bool> {
        let schema = self
            .layout
            .table
            .schema
            .as_ref()
            .map_or("main", |s| s.as_str());
        let found = self
            .conn
            .query_row(
                "SELECT 1 FROM pragma_table_info(?1, ?2) WHERE name = ?3",
                params![
                    self.layout.table.name.as_str(),
                    schema,
                    self.layout.status.as_str()
                ],
                |_| Ok(()),
            )
            .optional()?;
        Ok(found.is_some())
    }

    fn add_status_column(&mut self) -> Result<()> {
        let sql = format!(
            "ALTER TABLE {} ADD COLUMN {} TEXT",
            self.layout.table, self.layout.status
        );
        self.conn.execute_batch(&sql)?;
        Ok(())
    }

    fn drop_status_column(&mut self) -> Result<()> {
        let sql = format!(
            "ALTER TABLE {} DROP COLUMN {}",
            self.layout.table, self.layout.status
        );
        self.conn.execute_batch(&sql)?;
        Ok(())
    }

    fn delete_duplicates(&mut self) -> Result<u64> {
        let sql = dedup_statement(&self.layout, "rowid");
        let deleted = self.conn.execute(&sql, [])?;
        Ok(deleted as u64)
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;

    /// In-memory `emails(email TEXT)` table holding `rows`.
    pub fn store_with(rows: &[Option<&str>]) -> SqliteRowStore {
        let layout = TableLayout::new("emails", "email", "Status").unwrap();
        let store = SqliteRowStore::in_memory(layout).unwrap();
        store
            .connection()
            .execute_batch("CREATE TABLE emails (id INTEGER PRIMARY KEY, email TEXT)")
            .unwrap();
        for row in rows {
            store
                .connection()
                .execute("INSERT INTO emails (email) VALUES (?1)", [row])
                .unwrap();
        }
        store
    }

    /// `(email, Status)` pairs in row order.
    pub fn dump(store: &SqliteRowStore) -> Vec<(Option<String>, Option<String>)> {
        let mut stmt = store
            .connection()
            .prepare("SELECT email, \"Status\" FROM emails ORDER BY rowid")
            .unwrap();
        stmt.query_map([], |row| Ok((row.get(0)?, row.get(1)?)))
            .unwrap()
            .map(|r| r.unwrap())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::fixtures::store_with;
    use super::*;

    #[test]
    fn status_column_lifecycle() {
        let mut store = store_with(&[Some("a@x.com")]);
        assert!(!store.has_status_column().unwrap());
        store.add_status_column().unwrap();
        assert!(store.has_status_column().unwrap());
        store.drop_status_column().unwrap();
        assert!(!store.has_status_column().unwrap());
    }

    #[test]
    fn counts_by_status() {
        let mut store = store_with(&[Some("a@x.com"), Some("b@x.com"), Some("c@x.com")]);
        store.add_status_column().unwrap();
        store
            .connection()
            .execute_batch(
                "UPDATE emails SET \"Status\" = 'Valid' WHERE email = 'a@x.com';
                 UPDATE emails SET \"Status\" = '' WHERE email = 'b@x.com';",
            )
            .unwrap();
        assert_eq!(store.count_rows().unwrap(), 3);
        assert_eq!(store.count_status(StatusFilter::Valid).unwrap(), 1);
        assert_eq!(store.count_status(StatusFilter::Unchecked).unwrap(), 2);
    }

    #[test]
    fn set_status_matches_null_addresses() {
        let mut store = store_with(&[None, Some("a@x.com"), None]);
        store.add_status_column().unwrap();
        assert_eq!(store.set_status(None, "Failed: NullEmail").unwrap(), 2);
        assert_eq!(
            store.scan_addresses(StatusFilter::Unchecked).unwrap(),
            [Some("a@x.com".to_string())]
        );
    }

    #[test]
    fn set_status_leaves_checked_rows_alone() {
        let mut store = store_with(&[Some("a@x.com"), Some("a@x.com"), Some("a@x.com")]);
        store.add_status_column().unwrap();
        store
            .connection()
            .execute_batch(
                "UPDATE emails SET \"Status\" = 'Failed: SMTPFailed' WHERE id = 1;
                 UPDATE emails SET \"Status\" = '' WHERE id = 3;",
            )
            .unwrap();
        assert_eq!(store.set_status(Some("a@x.com"), "Valid").unwrap(), 2);
        assert_eq!(
            fixtures::dump(&store)
                .into_iter()
                .map(|(_, status)| status)
                .collect::<Vec<_>>(),
            [
                Some("Failed: SMTPFailed".to_string()),
                Some("Valid".to_string()),
                Some("Valid".to_string()),
            ]
        );
    }

    #[test]
    fn scan_follows_row_order() {
        let mut store = store_with(&[Some("z@x.com"), Some("a@x.com"), None]);
        store.add_status_column().unwrap();
        assert_eq!(
            store.scan_addresses(StatusFilter::Unchecked).unwrap(),
            [Some("z@x.com".to_string()), Some("a@x.com".to_string()), None]
        );
    }

    #[test]
    fn missing_table_is_an_error() {
        let layout = TableLayout::new("nope", "email", "Status").unwrap();
        let mut store = SqliteRowStore::in_memory(layout).unwrap();
        assert!(matches!(
            store.count_rows(),
            Err(crate::store::StoreError::Sqlite(_))
        ));
    }
}

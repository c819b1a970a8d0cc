//! `PostgreSQL`-backed implementation of [`RowStore`].
//!
//! Uses the sync `postgres` crate over a single client; the pipeline is
//! single-threaded so no lock is involved. Row identity is `ctid`.

use postgres::{Client, NoTls};
use tracing::debug;

use super::error::Result;
use super::{RowStore, StatusFilter, TableLayout, count_to_u64, dedup_statement};

/// `PostgreSQL` row store over one connection.
pub struct PostgresRowStore {
    client: Client,
    layout: TableLayout,
}

impl PostgresRowStore {
    /// Connect with an already assembled connection config.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Postgres`](super::StoreError::Postgres) if the
    /// server cannot be reached or refuses the credentials.
    pub fn connect(config: &postgres::Config, layout: TableLayout) -> Result<Self> {
        let client = config.connect(NoTls)?;
        Ok(Self::from_client(client, layout))
    }

    pub fn from_client(client: Client, layout: TableLayout) -> Self {
        Self { client, layout }
    }

    pub fn layout(&self) -> &TableLayout {
        &self.layout
    }

    fn query_count(&mut self, sql: &str) -> Result<u64> {
        let row = self.client.query_one(sql, &[])?;
        Ok(count_to_u64(row.get(0)))
    }
}

impl RowStore for PostgresRowStore {
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
            "SELECT {email}::text FROM {table} WHERE {} ORDER BY ctid",
            filter.predicate(status)
        );
        let rows = self.client.query(&sql, &[])?;
        Ok(rows.iter().map(|row| row.get(0)).collect())
    }

    fn set_status(&mut self, address: Option<&str>, status_value: &str) -> Result<u64> {
        let TableLayout {
            table,
            email,
            status,
        } = &self.layout;
        let unchecked = StatusFilter::Unchecked.predicate(status);
        let sql = format!(
            "UPDATE {table} SET {status} = $1 \
             WHERE {email}::text IS NOT DISTINCT FROM $2 AND {unchecked}"
        );
        let updated = self.client.execute(&sql, &[&status_value, &address])?;
        debug!(?address, status = status_value, updated, "status written");
        Ok(updated)
    }

    fn has_status_column(&mut self) -> Result<bool> {
        let schema = self.layout.table.schema.as_ref().map(|s| s.as_str());
        let row = self.client.query_one(
            "SELECT COUNT(*) FROM information_schema.columns \
             WHERE table_name::text = $1 \
               AND column_name::text = $2 \
               AND table_schema::text = COALESCE($3::text, current_schema()::text)",
            &[
                &self.layout.table.name.as_str(),
                &self.layout.status.as_str(),
                &schema,
            ],
        )?;
        Ok(row.get::<_, i64>(0) > 0)
    }

    fn add_status_column(&mut self) -> Result<()> {
        let sql = format!(
            "ALTER TABLE {} ADD COLUMN {} TEXT",
            self.layout.table, self.layout.status
        );
        self.client.batch_execute(&sql)?;
        Ok(())
    }

    fn drop_status_column(&mut self) -> Result<()> {
        let sql = format!(
            "ALTER TABLE {} DROP COLUMN {}",
            self.layout.table, self.layout.status
        );
        self.client.batch_execute(&sql)?;
        Ok(())
    }

    fn delete_duplicates(&mut self) -> Result<u64> {
        let sql = dedup_statement(&self.layout, "ctid");
        Ok(self.client.execute(&sql, &[])?)
    }
}

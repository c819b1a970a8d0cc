//! Row store error types.

/// Errors produced by [`RowStore`](crate::store::RowStore) operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Underlying `PostgreSQL` failure (connection, query, DDL).
    #[error("postgres error: {0}")]
    Postgres(#[from] postgres::Error),

    /// Underlying `SQLite` failure.
    #[cfg(any(test, feature = "with-sqlite"))]
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// A configured table or column name failed the identifier allow-list.
    #[error("invalid identifier {name:?}: {reason}")]
    InvalidIdentifier { name: String, reason: &'static str },
}

/// Convenience alias used throughout the store module.
pub type Result<T> = std::result::Result<T, StoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sqlite_error_displays_context() {
        let inner = rusqlite::Error::SqliteFailure(
            rusqlite::ffi::Error::new(1),
            Some("no such table: emails".into()),
        );
        let msg = StoreError::Sqlite(inner).to_string();
        assert!(msg.starts_with("sqlite error"), "got: {msg}");
    }

    #[test]
    fn invalid_identifier_names_the_input() {
        let err = StoreError::InvalidIdentifier {
            name: "a;b".into(),
            reason: "forbidden character",
        };
        assert_eq!(err.to_string(), "invalid identifier \"a;b\": forbidden character");
    }
}

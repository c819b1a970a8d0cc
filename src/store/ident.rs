//! Operator-supplied SQL identifiers.
//!
//! Table and column names come from configuration and cannot be bound as
//! query parameters, so they go through an allow-list and are always
//! emitted double-quoted.

use std::fmt;

use super::error::{Result, StoreError};

const MAX_LEN: usize = 63;

/// A single validated identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ident(String);

impl Ident {
    pub fn new(raw: &str) -> Result<Self> {
        let invalid = |reason| StoreError::InvalidIdentifier {
            name: raw.to_string(),
            reason,
        };
        if raw.is_empty() {
            return Err(invalid("empty"));
        }
        if raw.trim() != raw {
            return Err(invalid("leading or trailing whitespace"));
        }
        if raw.len() > MAX_LEN {
            return Err(invalid("longer than 63 bytes"));
        }
        if !raw
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '$' | ' '))
        {
            return Err(invalid("forbidden character"));
        }
        Ok(Self(raw.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Renders the quoted form, ready to splice into SQL.
impl fmt::Display for Ident {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "\"{}\"", self.0.replace('"', "\"\""))
    }
}

/// Table name, optionally schema-qualified (`schema.table`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableName {
    pub schema: Option<Ident>,
    pub name: Ident,
}

impl TableName {
    pub fn parse(raw: &str) -> Result<Self> {
        match raw.split_once('.') {
            Some((schema, name)) => Ok(Self {
                schema: Some(Ident::new(schema)?),
                name: Ident::new(name)?,
            }),
            None => Ok(Self {
                schema: None,
                name: Ident::new(raw)?,
            }),
        }
    }
}

impl fmt::Display for TableName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.schema {
            Some(schema) => write!(f, "{schema}.{}", self.name),
            None => write!(f, "{}", self.name),
        }
    }
}

/// The three identifiers every query needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableLayout {
    pub table: TableName,
    pub email: Ident,
    pub status: Ident,
}

impl TableLayout {
    pub fn new(table: &str, email_column: &str, status_column: &str) -> Result<Self> {
        Ok(Self {
            table: TableName::parse(table)?,
            email: Ident::new(email_column)?,
            status: Ident::new(status_column)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quotes_plain_names() {
        assert_eq!(Ident::new("Status").unwrap().to_string(), "\"Status\"");
        assert_eq!(Ident::new("e-mail addr").unwrap().to_string(), "\"e-mail addr\"");
    }

    #[test]
    fn rejects_injection_attempts() {
        for raw in [
            "emails\"; DROP TABLE x; --",
            "a;b",
            "a'b",
            "",
            " padded",
            "tab\tname",
        ] {
            assert!(Ident::new(raw).is_err(), "{raw:?} should be rejected");
        }
    }

    #[test]
    fn rejects_overlong() {
        assert!(Ident::new(&"x".repeat(64)).is_err());
        assert!(Ident::new(&"x".repeat(63)).is_ok());
    }

    #[test]
    fn schema_qualified_table() {
        let table = TableName::parse("crm.contacts").unwrap();
        assert_eq!(table.schema.as_ref().map(Ident::as_str), Some("crm"));
        assert_eq!(table.to_string(), "\"crm\".\"contacts\"");
        assert!(TableName::parse("a.b.c").is_err());
    }
}

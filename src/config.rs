//! TOML configuration, loaded once at startup.
//!
//! ```toml
//! db_name = "crm"
//! db_user = "crm"
//! db_password = "secret"
//! db_host = "localhost"
//! table_name = "public.contacts"
//! email_column_name = "email"
//! ```

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

use crate::classify::ChecksEnabled;
use crate::inspector::InspectorOptions;
use crate::smtp_verify::SmtpProbeOptions;
use crate::store::{DEFAULT_STATUS_COLUMN, StoreError, TableLayout};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error(transparent)]
    Identifier(#[from] StoreError),
}

/// Database coordinates, table layout and probe settings.
#[derive(Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AppConfig {
    pub db_name: String,
    pub db_user: String,
    #[serde(default)]
    pub db_password: String,
    pub db_host: String,
    #[serde(default = "default_db_port")]
    pub db_port: u16,
    pub table_name: String,
    pub email_column_name: String,
    #[serde(default = "default_status_column")]
    pub status_column_name: String,
    #[serde(default)]
    pub helo_domain: Option<String>,
    #[serde(default)]
    pub mail_from: Option<String>,
    #[serde(default = "default_smtp_timeout_ms")]
    pub smtp_timeout_ms: u64,
    #[serde(default = "default_catchall_probes")]
    pub catchall_probes: u8,
    /// Appended to the built-in disposable list.
    #[serde(default)]
    pub disposable_domains: Vec<String>,
}

fn default_db_port() -> u16 {
    5432
}

fn default_status_column() -> String {
    DEFAULT_STATUS_COLUMN.to_string()
}

fn default_smtp_timeout_ms() -> u64 {
    5_000
}

fn default_catchall_probes() -> u8 {
    1
}

impl fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppConfig")
            .field("db_name", &self.db_name)
            .field("db_user", &self.db_user)
            .field("db_password", &"<redacted>")
            .field("db_host", &self.db_host)
            .field("db_port", &self.db_port)
            .field("table_name", &self.table_name)
            .field("email_column_name", &self.email_column_name)
            .field("status_column_name", &self.status_column_name)
            .field("helo_domain", &self.helo_domain)
            .field("mail_from", &self.mail_from)
            .field("smtp_timeout_ms", &self.smtp_timeout_ms)
            .field("catchall_probes", &self.catchall_probes)
            .field("disposable_domains", &self.disposable_domains.len())
            .finish()
    }
}

impl AppConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        raw.parse()
    }

    /// Connection parameters for the `postgres` client.
    pub fn postgres_config(&self) -> postgres::Config {
        let mut config = postgres::Config::new();
        config
            .host(&self.db_host)
            .port(self.db_port)
            .user(&self.db_user)
            .dbname(&self.db_name)
            .application_name(env!("CARGO_PKG_NAME"));
        if !self.db_password.is_empty() {
            config.password(&self.db_password);
        }
        config
    }

    /// Validated identifiers for the target table.
    pub fn table_layout(&self) -> Result<TableLayout, ConfigError> {
        Ok(TableLayout::new(
            &self.table_name,
            &self.email_column_name,
            &self.status_column_name,
        )?)
    }

    pub fn probe_options(&self) -> SmtpProbeOptions {
        let mut probe = SmtpProbeOptions {
            timeout_ms: self.smtp_timeout_ms,
            catchall_probes: self.catchall_probes,
            ..SmtpProbeOptions::default()
        };
        if let Some(helo) = &self.helo_domain {
            probe.helo_domain = helo.clone();
        }
        if let Some(from) = &self.mail_from {
            probe.mail_from = from.clone();
        }
        probe
    }

    pub fn inspector_options(&self, checks: ChecksEnabled) -> InspectorOptions {
        InspectorOptions {
            checks,
            probe: self.probe_options(),
            disposable_domains: self.disposable_domains.clone(),
        }
    }
}

impl std::str::FromStr for AppConfig {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let config: AppConfig = toml::from_str(s)?;
        config.table_layout()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINIMAL: &str = r#"
        db_name = "crm"
        db_user = "crm"
        db_password = "hunter2"
        db_host = "db.internal"
        table_name = "public.contacts"
        email_column_name = "email"
    "#;

    #[test]
    fn defaults_are_applied() {
        let config: AppConfig = MINIMAL.parse().unwrap();
        assert_eq!(config.db_port, 5432);
        assert_eq!(config.status_column_name, "Status");
        assert_eq!(config.smtp_timeout_ms, 5_000);
        assert_eq!(config.catchall_probes, 1);
        assert!(config.disposable_domains.is_empty());
        assert!(config.helo_domain.is_none());
    }

    #[test]
    fn optional_keys_override() {
        let raw = format!(
            "{MINIMAL}\ndb_port = 6543\nstatus_column_name = \"check\"\nhelo_domain = \"probe.example\"\nmail_from = \"bounce@probe.example\"\nsmtp_timeout_ms = 1500\ncatchall_probes = 2\ndisposable_domains = [\"trash.example\"]\n"
        );
        let config: AppConfig = raw.parse().unwrap();
        assert_eq!(config.db_port, 6543);

        let probe = config.probe_options();
        assert_eq!(probe.helo_domain, "probe.example");
        assert_eq!(probe.mail_from, "bounce@probe.example");
        assert_eq!(probe.timeout_ms, 1500);
        assert_eq!(probe.catchall_probes, 2);

        let layout = config.table_layout().unwrap();
        assert_eq!(layout.status.to_string(), "\"check\"");

        let options = config.inspector_options(ChecksEnabled::default());
        assert_eq!(options.disposable_domains, ["trash.example"]);
    }

    #[test]
    fn password_is_not_logged() {
        let config: AppConfig = MINIMAL.parse().unwrap();
        let debug = format!("{config:?}");
        assert!(!debug.contains("hunter2"));
        assert!(debug.contains("db.internal"));
    }

    #[test]
    fn postgres_config_carries_coordinates() {
        let config: AppConfig = MINIMAL.parse().unwrap();
        let pg = config.postgres_config();
        assert_eq!(pg.get_dbname(), Some("crm"));
        assert_eq!(pg.get_user(), Some("crm"));
        assert_eq!(pg.get_ports(), [5432]);
        assert_eq!(pg.get_password(), Some(&b"hunter2"[..]));
    }

    #[test]
    fn missing_key_is_rejected() {
        let err = "db_name = \"crm\"".parse::<AppConfig>().unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn unsafe_identifier_is_rejected() {
        let raw = MINIMAL.replace("\"email\"", "\"email\\\"; DROP TABLE x; --\"");
        let err = raw.parse::<AppConfig>().unwrap_err();
        assert!(matches!(err, ConfigError::Identifier(_)));
    }

    #[test]
    fn unreadable_file() {
        let err = AppConfig::load(Path::new("/nonexistent/mailclean.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }
}

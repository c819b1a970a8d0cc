#![forbid(unsafe_code)]
//! mailclean : dédoublonnage et validation d'une table d'adresses e-mail.
//!
//! [`dedupe`] supprime les doublons exacts d'une colonne e-mail ;
//! [`validate`] classe chaque ligne non vérifiée (syntaxe, jetable, MX,
//! SMTP, catch-all) et écrit le résultat dans une colonne de statut.

pub mod classify;
pub mod config;
pub mod dedup;
pub mod disposable;
pub mod inspector;
pub mod mx;
pub mod pipeline;
pub mod smtp_verify;
pub mod store;
pub mod validator;

pub use classify::{ChecksEnabled, Classification, FailureCode, classify};
pub use config::{AppConfig, ConfigError};
pub use dedup::{DedupReport, dedupe};
pub use inspector::{
    AddressInspector, InspectorError, InspectorOptions, MxOutcome, NetworkInspector, SmtpOutcome,
};
pub use mx::{Error as MxError, MxRecord, MxStatus, check_mx};
pub use pipeline::{
    NoProgress, ProgressSink, RowStatus, ValidationPolicy, ValidationRun, prepare_status_column,
    validate,
};
pub use store::{PostgresRowStore, RowStore, StatusFilter, StoreError, TableLayout};
#[cfg(feature = "with-sqlite")]
pub use store::SqliteRowStore;
pub use validator::{ParsedAddress, check_syntax};

//! SMTP deliverability probing.
//!
//! [`SmtpProber`] executes a minimal SMTP dialogue against the MX hosts (with
//! A/AAAA fallback), optionally through a SOCKS proxy, and classifies the
//! observed behaviour into [`Existence`] variants.

mod dns;
mod error;
mod options;
mod probe;
mod proxy;
mod session;
mod types;
mod util;

pub use error::SmtpVerifyError;
pub use options::SmtpProbeOptions;
pub use probe::SmtpProber;
pub use proxy::{ProxyConfig, ProxyError, ProxyKind, Route};
pub use types::{Existence, SmtpProbeReport};

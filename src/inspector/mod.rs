//! Address inspection seam.
//!
//! The classifier only talks to [`AddressInspector`]; [`NetworkInspector`]
//! is the production implementation (local syntax and disposable checks,
//! DNS for MX, an SMTP dialogue for reachability and catch-all).

mod network;

pub use network::{InspectorError, InspectorOptions, NetworkInspector};

use crate::validator::ParsedAddress;

/// Outcome of an MX lookup. `error` is set when the lookup itself failed
/// (timeout, SERVFAIL...), in which case `present` is `false`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MxOutcome {
    pub present: bool,
    pub error: Option<String>,
}

impl MxOutcome {
    pub fn present() -> Self {
        Self {
            present: true,
            error: None,
        }
    }

    pub fn absent() -> Self {
        Self::default()
    }

    pub fn failed(error: impl ToString) -> Self {
        Self {
            present: false,
            error: Some(error.to_string()),
        }
    }
}

/// Outcome of an SMTP probe.
///
/// `error` means reachability itself is unknown. `catch_all_error` only
/// concerns catch-all detection on a mailbox that was accepted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SmtpOutcome {
    pub reachable: bool,
    pub catch_all: bool,
    pub error: Option<String>,
    pub catch_all_error: Option<String>,
}

impl SmtpOutcome {
    pub fn reachable() -> Self {
        Self {
            reachable: true,
            ..Self::default()
        }
    }

    pub fn catch_all() -> Self {
        Self {
            reachable: true,
            catch_all: true,
            ..Self::default()
        }
    }

    /// Mailbox accepted, catch-all detection inconclusive.
    pub fn catch_all_unknown(reason: impl ToString) -> Self {
        Self {
            reachable: true,
            catch_all_error: Some(reason.to_string()),
            ..Self::default()
        }
    }

    pub fn unreachable() -> Self {
        Self::default()
    }

    pub fn failed(error: impl ToString) -> Self {
        Self {
            error: Some(error.to_string()),
            ..Self::default()
        }
    }
}

/// Checks the classifier needs from the outside world.
///
/// Implementations report failures inside the outcomes rather than through
/// `Result`: an inspection problem is a property of the row, never a reason
/// to stop the run.
pub trait AddressInspector {
    fn check_syntax(&self, address: &str) -> ParsedAddress;
    fn is_disposable(&self, domain: &str) -> bool;
    fn check_mx(&self, domain: &str) -> MxOutcome;
    fn check_smtp(&self, domain: &str, local: &str) -> SmtpOutcome;
}

impl<T: AddressInspector + ?Sized> AddressInspector for &T {
    fn check_syntax(&self, address: &str) -> ParsedAddress {
        (**self).check_syntax(address)
    }

    fn is_disposable(&self, domain: &str) -> bool {
        (**self).is_disposable(domain)
    }

    fn check_mx(&self, domain: &str) -> MxOutcome {
        (**self).check_mx(domain)
    }

    fn check_smtp(&self, domain: &str, local: &str) -> SmtpOutcome {
        (**self).check_smtp(domain, local)
    }
}

#[cfg(test)]
pub(crate) mod testing;

//! Failure classification of a single address.

mod code;

pub use code::{FailureCode, UnknownLabel};

use tracing::debug;

use crate::inspector::AddressInspector;

/// Opt-in network checks. Syntax and disposable checks always run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ChecksEnabled {
    pub mx: bool,
    pub smtp: bool,
    pub catch_all: bool,
}

impl ChecksEnabled {
    pub fn needs_smtp_probe(&self) -> bool {
        self.smtp || self.catch_all
    }
}

/// Classifier output for one address.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Classification {
    pub code: FailureCode,
    /// Inspector-level errors behind some of the bits in `code`; kept for
    /// diagnostics, not persisted.
    pub inspector_errors: Vec<String>,
}

impl Classification {
    fn terminal(code: FailureCode) -> Self {
        Self {
            code,
            inspector_errors: Vec::new(),
        }
    }

    pub fn is_valid(&self) -> bool {
        self.code.is_valid()
    }
}

/// Runs the check sequence on `address`.
///
/// Empty and syntactically invalid addresses stop the sequence with a single
/// bit. Past syntax every enabled check runs and contributes its own bit, so
/// the code describes every reason the address is undesirable. An inspector
/// error only fails the check it happened in.
pub fn classify<I>(address: &str, checks: &ChecksEnabled, inspector: &I) -> Classification
where
    I: AddressInspector + ?Sized,
{
    let address = address.trim();
    if address.is_empty() {
        return Classification::terminal(FailureCode::NULL);
    }

    let parsed = inspector.check_syntax(address);
    if !parsed.valid {
        debug!(address, reasons = ?parsed.reasons, "syntax rejected");
        return Classification::terminal(FailureCode::BAD_SYNTAX);
    }
    let domain = parsed.lookup_domain();

    let mut result = Classification::default();

    if inspector.is_disposable(domain) {
        result.code |= FailureCode::DISPOSABLE;
    }

    if checks.mx {
        let mx = inspector.check_mx(domain);
        if let Some(err) = mx.error {
            debug!(address, error = %err, "MX lookup failed");
            result.inspector_errors.push(format!("mx: {err}"));
            result.code |= FailureCode::NO_MX;
        } else if !mx.present {
            result.code |= FailureCode::NO_MX;
        }
    }

    if checks.needs_smtp_probe() {
        let smtp = inspector.check_smtp(domain, &parsed.local);
        if let Some(err) = &smtp.error {
            debug!(address, error = %err, "SMTP probe failed");
            result.inspector_errors.push(format!("smtp: {err}"));
        }
        if checks.smtp && (smtp.error.is_some() || !smtp.reachable) {
            result.code |= FailureCode::SMTP_UNREACHABLE;
        }
        if checks.catch_all && smtp.catch_all {
            result.code |= FailureCode::CATCH_ALL;
        }
        if checks.catch_all {
            if let Some(err) = &smtp.catch_all_error {
                debug!(address, error = %err, "catch-all detection inconclusive");
                result.inspector_errors.push(format!("catch-all: {err}"));
            }
        }
    }

    result
}

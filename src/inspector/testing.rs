//! Scripted inspector for classifier and pipeline tests.

use std::cell::RefCell;
use std::collections::HashMap;

use super::{AddressInspector, MxOutcome, SmtpOutcome};
use crate::disposable::DisposableDomains;
use crate::validator::{self, ParsedAddress};

/// Offline inspector: real syntax and disposable checks, canned MX/SMTP
/// answers per domain. Unknown domains have MX and are reachable.
#[derive(Default)]
pub(crate) struct ScriptedInspector {
    disposable: DisposableDomains,
    mx: HashMap<String, MxOutcome>,
    smtp: HashMap<String, SmtpOutcome>,
    pub calls: RefCell<Vec<String>>,
}

impl ScriptedInspector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mx(mut self, domain: &str, outcome: MxOutcome) -> Self {
        self.mx.insert(domain.to_string(), outcome);
        self
    }

    pub fn smtp(mut self, domain: &str, outcome: SmtpOutcome) -> Self {
        self.smtp.insert(domain.to_string(), outcome);
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.borrow().clone()
    }
}

impl AddressInspector for ScriptedInspector {
    fn check_syntax(&self, address: &str) -> ParsedAddress {
        self.calls.borrow_mut().push(format!("syntax:{address}"));
        validator::check_syntax(address)
    }

    fn is_disposable(&self, domain: &str) -> bool {
        self.calls.borrow_mut().push(format!("disposable:{domain}"));
        self.disposable.contains(domain)
    }

    fn check_mx(&self, domain: &str) -> MxOutcome {
        self.calls.borrow_mut().push(format!("mx:{domain}"));
        self.mx.get(domain).cloned().unwrap_or_else(MxOutcome::present)
    }

    fn check_smtp(&self, domain: &str, local: &str) -> SmtpOutcome {
        self.calls.borrow_mut().push(format!("smtp:{local}@{domain}"));
        self.smtp
            .get(domain)
            .cloned()
            .unwrap_or_else(SmtpOutcome::reachable)
    }
}

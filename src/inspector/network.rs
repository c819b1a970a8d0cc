use thiserror::Error;
use tracing::debug;

use super::{AddressInspector, MxOutcome, SmtpOutcome};
use crate::classify::ChecksEnabled;
use crate::disposable::DisposableDomains;
use crate::mx::{self, MxResolver};
use crate::smtp_verify::{
    Existence, ProxyConfig, ProxyError, Route, SmtpProbeOptions, SmtpProber, SmtpVerifyError,
};
use crate::validator::{self, ParsedAddress};

#[derive(Debug, Error)]
pub enum InspectorError {
    #[error(transparent)]
    Mx(#[from] mx::Error),
    #[error(transparent)]
    Smtp(#[from] SmtpVerifyError),
    #[error(transparent)]
    Proxy(#[from] ProxyError),
}

/// What the network inspector should prepare for.
#[derive(Debug, Clone, Default)]
pub struct InspectorOptions {
    pub checks: ChecksEnabled,
    pub probe: SmtpProbeOptions,
    pub disposable_domains: Vec<String>,
}

impl InspectorOptions {
    pub fn new(checks: ChecksEnabled) -> Self {
        Self {
            checks,
            ..Self::default()
        }
    }

    /// Route SMTP probes through a SOCKS proxy given as URL.
    pub fn with_proxy(mut self, proxy: &str) -> Result<Self, ProxyError> {
        let proxy: ProxyConfig = proxy.parse()?;
        self.probe.route = Route::Proxy(proxy);
        Ok(self)
    }
}

/// Production [`AddressInspector`].
///
/// Network clients are only built for the checks that are enabled, once,
/// and reused for every row.
pub struct NetworkInspector {
    disposable: DisposableDomains,
    mx: Option<MxResolver>,
    smtp: Option<SmtpProber>,
}

impl NetworkInspector {
    pub fn new(options: InspectorOptions) -> Result<Self, InspectorError> {
        let InspectorOptions {
            checks,
            mut probe,
            disposable_domains,
        } = options;

        let mx = if checks.mx {
            Some(MxResolver::from_system_conf()?)
        } else {
            None
        };

        if !checks.catch_all {
            probe.catchall_probes = 0;
        } else if probe.catchall_probes == 0 {
            probe.catchall_probes = 1;
        }
        let smtp = if checks.smtp || checks.catch_all {
            debug!(route = ?probe.route, "preparing SMTP prober");
            Some(SmtpProber::new(probe)?)
        } else {
            None
        };

        Ok(Self {
            disposable: DisposableDomains::new(disposable_domains),
            mx,
            smtp,
        })
    }
}

impl AddressInspector for NetworkInspector {
    fn check_syntax(&self, address: &str) -> ParsedAddress {
        validator::check_syntax(address)
    }

    fn is_disposable(&self, domain: &str) -> bool {
        self.disposable.contains(domain)
    }

    fn check_mx(&self, domain: &str) -> MxOutcome {
        let Some(resolver) = &self.mx else {
            return MxOutcome::failed("MX check not enabled");
        };
        match resolver.check(domain) {
            Ok(status) if status.has_records() => MxOutcome::present(),
            Ok(_) => MxOutcome::absent(),
            Err(err) => MxOutcome::failed(err),
        }
    }

    fn check_smtp(&self, domain: &str, local: &str) -> SmtpOutcome {
        let Some(prober) = &self.smtp else {
            return SmtpOutcome::failed("SMTP check not enabled");
        };
        match prober.probe(local, domain) {
            Ok(report) => {
                debug!(
                    domain,
                    result = %report.result,
                    mx_tried = ?report.mx_tried,
                    "SMTP probe finished"
                );
                if matches!(report.result, Existence::Indeterminate(_))
                    || report.catch_all_note.is_some()
                {
                    debug!(domain, transcript = ?report.transcript, "SMTP dialogue");
                }
                outcome_from(report.result, report.catch_all_note)
            }
            Err(err) => SmtpOutcome::failed(err),
        }
    }
}

fn outcome_from(existence: Existence, catch_all_note: Option<String>) -> SmtpOutcome {
    match existence {
        Existence::Exists => match catch_all_note {
            Some(note) => SmtpOutcome::catch_all_unknown(note),
            None => SmtpOutcome::reachable(),
        },
        Existence::CatchAll => SmtpOutcome::catch_all(),
        Existence::DoesNotExist => SmtpOutcome::unreachable(),
        Existence::Indeterminate(reason) => SmtpOutcome::failed(reason),
    }
}

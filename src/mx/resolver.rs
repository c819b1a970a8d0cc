use trust_dns_resolver::Resolver;
use trust_dns_resolver::error::{ResolveError, ResolveErrorKind};

use super::{Error, MxRecord, MxStatus};

/// MX lookups against the system resolver.
///
/// Building a resolver reads `/etc/resolv.conf` and spins up its runtime, so
/// one instance is meant to serve a whole validation run.
pub struct MxResolver {
    inner: Resolver,
}

impl MxResolver {
    pub fn from_system_conf() -> Result<Self, Error> {
        let inner = Resolver::from_system_conf().map_err(Error::ResolverInit)?;
        Ok(Self { inner })
    }

    /// Lookup MX records for `domain`.
    ///
    /// The domain is normalized via IDNA before querying DNS. The resulting
    /// [`MxStatus`] contains the sorted list of records (ascending preference).
    /// An NXDOMAIN / empty answer is reported as [`MxStatus::NoRecords`], not
    /// as an error.
    pub fn check(&self, domain: &str) -> Result<MxStatus, Error> {
        let ascii = normalize_domain(domain)?;
        resolve_with(&self.inner, &ascii)
    }
}

/// One-shot lookup; builds a fresh resolver.
pub fn check_mx(domain: &str) -> Result<MxStatus, Error> {
    MxResolver::from_system_conf()?.check(domain)
}

pub(crate) fn resolve_with<R>(resolver: &R, ascii_domain: &str) -> Result<MxStatus, Error>
where
    R: LookupMx,
{
    let mut records = match resolver.lookup_mx(ascii_domain) {
        Ok(records) => records,
        Err(err) if is_no_records(&err) => Vec::new(),
        Err(source) => {
            return Err(Error::Lookup {
                domain: ascii_domain.to_string(),
                source,
            });
        }
    };

    records.sort();
    records.dedup();

    if records.is_empty() {
        Ok(MxStatus::NoRecords)
    } else {
        Ok(MxStatus::Records(records))
    }
}

fn is_no_records(err: &ResolveError) -> bool {
    matches!(err.kind(), ResolveErrorKind::NoRecordsFound { .. })
}

pub(crate) fn normalize_domain(domain: &str) -> Result<String, Error> {
    let trimmed = domain.trim();
    if trimmed.is_empty() {
        return Err(Error::EmptyDomain);
    }
    idna::domain_to_ascii(trimmed).map_err(|source| Error::InvalidDomain {
        domain: trimmed.to_string(),
        source,
    })
}

pub(crate) fn normalize_exchange(exchange: String) -> String {
    let trimmed = exchange.trim_end_matches('.');
    trimmed.to_ascii_lowercase()
}

pub(crate) trait LookupMx {
    fn lookup_mx(&self, domain: &str) -> Result<Vec<MxRecord>, ResolveError>;
}

impl LookupMx for Resolver {
    fn lookup_mx(&self, domain: &str) -> Result<Vec<MxRecord>, ResolveError> {
        let lookup = Resolver::mx_lookup(self, domain)?;
        let mut records = Vec::new();
        for mx in lookup.iter() {
            let exchange = normalize_exchange(mx.exchange().to_utf8());
            records.push(MxRecord::new(mx.preference(), exchange));
        }
        Ok(records)
    }
}

#[cfg(test)]
impl LookupMx for crate::mx::tests::StubResolver {
    fn lookup_mx(&self, domain: &str) -> Result<Vec<MxRecord>, ResolveError> {
        (self.on_lookup)(domain)
    }
}

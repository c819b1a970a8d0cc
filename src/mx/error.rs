use thiserror::Error;
use trust_dns_resolver::error::ResolveError;

/// Failures of an MX lookup. A domain without MX records is not an error,
/// see [`MxStatus::NoRecords`](super::MxStatus::NoRecords).
#[derive(Debug, Error)]
pub enum MxError {
    #[error("empty domain")]
    EmptyDomain,
    #[error("invalid domain '{domain}'")]
    InvalidDomain {
        domain: String,
        #[source]
        source: idna::Errors,
    },
    #[error("cannot load system resolver configuration: {0}")]
    ResolverInit(#[source] std::io::Error),
    #[error("MX lookup for {domain} failed: {source}")]
    Lookup {
        domain: String,
        #[source]
        source: ResolveError,
    },
}

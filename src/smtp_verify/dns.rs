use std::net::{SocketAddr, ToSocketAddrs};

use trust_dns_resolver::Resolver;
use trust_dns_resolver::error::ResolveErrorKind;

use crate::smtp_verify::error::SmtpVerifyError;

#[derive(Debug, Clone)]
pub struct HostCandidate {
    pub host: String,
    pub preference: u16,
    pub addresses: Vec<SocketAddr>,
}

pub fn build_resolver() -> Result<Resolver, SmtpVerifyError> {
    Resolver::from_system_conf().map_err(|err| SmtpVerifyError::ResolverInit { source: err })
}

pub fn resolve_hosts(
    resolver: &Resolver,
    domain: &str,
    max_hosts: usize,
    allow_ipv6: bool,
) -> Result<Vec<HostCandidate>, SmtpVerifyError> {
    let mut hosts = lookup_mx(resolver, domain, allow_ipv6)?;
    if hosts.is_empty() {
        // RFC 5321 §5.1: implicit MX, the domain itself
        let addresses = resolve_addrs(domain, allow_ipv6)?;
        if addresses.is_empty() {
            return Err(SmtpVerifyError::NoSmtpServers);
        }
        hosts.push(HostCandidate {
            host: domain.to_string(),
            preference: 0,
            addresses,
        });
    }

    order_candidates(&mut hosts, max_hosts);
    Ok(hosts)
}

pub(crate) fn order_candidates(hosts: &mut Vec<HostCandidate>, max_hosts: usize) {
    hosts.sort_by_key(|h| h.preference);
    hosts.truncate(max_hosts.max(1));
}

fn lookup_mx(
    resolver: &Resolver,
    domain: &str,
    allow_ipv6: bool,
) -> Result<Vec<HostCandidate>, SmtpVerifyError> {
    let mut out = Vec::new();
    match resolver.mx_lookup(domain) {
        Ok(lookup) => {
            for record in lookup.iter() {
                let host = record.exchange().to_utf8();
                let host_trimmed = host.trim_end_matches('.').to_string();
                // a dangling MX host is skipped, not fatal
                let Ok(addrs) = resolve_addrs(&host_trimmed, allow_ipv6) else {
                    continue;
                };
                if addrs.is_empty() {
                    continue;
                }
                out.push(HostCandidate {
                    host: host_trimmed,
                    preference: record.preference(),
                    addresses: addrs,
                });
            }
        }
        Err(err) => match err.kind() {
            ResolveErrorKind::NoRecordsFound { .. } => {}
            _ => return Err(SmtpVerifyError::Lookup { source: err }),
        },
    }
    Ok(out)
}

fn resolve_addrs(domain: &str, allow_ipv6: bool) -> Result<Vec<SocketAddr>, SmtpVerifyError> {
    let query = format!("{domain}:25");
    let iter = query
        .to_socket_addrs()
        .map_err(|err| SmtpVerifyError::Io { source: err })?;
    Ok(iter.filter(|addr| allow_ipv6 || !addr.is_ipv6()).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candidate(host: &str, preference: u16) -> HostCandidate {
        HostCandidate {
            host: host.to_string(),
            preference,
            addresses: vec![SocketAddr::from(([127, 0, 0, 1], 25))],
        }
    }

    #[test]
    fn candidates_sorted_and_capped() {
        let mut hosts = vec![candidate("c", 30), candidate("a", 10), candidate("b", 20)];
        order_candidates(&mut hosts, 2);
        let names: Vec<_> = hosts.iter().map(|h| h.host.as_str()).collect();
        assert_eq!(names, ["a", "b"]);
    }

    #[test]
    fn zero_cap_keeps_one() {
        let mut hosts = vec![candidate("a", 10), candidate("b", 20)];
        order_candidates(&mut hosts, 0);
        assert_eq!(hosts.len(), 1);
    }
}

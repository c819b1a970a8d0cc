use std::time::Duration;

use super::proxy::Route;

/// Configuration knobs for [`SmtpProber`](super::SmtpProber).
#[derive(Debug, Clone)]
pub struct SmtpProbeOptions {
    pub helo_domain: String,
    pub mail_from: String,
    pub timeout_ms: u64,
    pub max_mx: usize,
    /// Random recipients tried after the target is accepted; 0 disables
    /// catch-all detection.
    pub catchall_probes: u8,
    pub ipv6: bool,
    pub route: Route,
}

impl Default for SmtpProbeOptions {
    fn default() -> Self {
        Self {
            helo_domain: "localhost".to_string(),
            mail_from: String::new(),
            timeout_ms: 5_000,
            max_mx: 3,
            catchall_probes: 1,
            ipv6: false,
            route: Route::Direct,
        }
    }
}

impl SmtpProbeOptions {
    /// Return the timeout as a [`Duration`]. A zero timeout disables the
    /// connection/read deadline. A proxy-level timeout wins.
    pub fn timeout(&self) -> Option<Duration> {
        if let Route::Proxy(proxy) = &self.route {
            if let Some(timeout) = proxy.timeout {
                return Some(timeout);
            }
        }
        if self.timeout_ms == 0 {
            None
        } else {
            Some(Duration::from_millis(self.timeout_ms))
        }
    }

    pub fn helo_name<'a>(&'a self, fallback: &'a str) -> &'a str {
        if self.helo_domain.trim().is_empty() {
            fallback
        } else {
            self.helo_domain.as_str()
        }
    }

    pub fn envelope_sender(&self, domain: &str) -> String {
        if self.mail_from.is_empty() {
            format!("postmaster@{domain}")
        } else {
            self.mail_from.clone()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::smtp_verify::ProxyConfig;

    #[test]
    fn zero_timeout_disables_deadline() {
        let opts = SmtpProbeOptions {
            timeout_ms: 0,
            ..SmtpProbeOptions::default()
        };
        assert_eq!(opts.timeout(), None);
    }

    #[test]
    fn proxy_timeout_overrides() {
        let proxy: ProxyConfig = "socks5://127.0.0.1:1080?timeout=9s".parse().unwrap();
        let opts = SmtpProbeOptions {
            route: Route::Proxy(proxy),
            ..SmtpProbeOptions::default()
        };
        assert_eq!(opts.timeout(), Some(Duration::from_secs(9)));
    }

    #[test]
    fn envelope_falls_back_to_postmaster() {
        let opts = SmtpProbeOptions::default();
        assert_eq!(opts.envelope_sender("example.com"), "postmaster@example.com");
        assert_eq!(opts.helo_name("example.com"), "localhost");
    }
}

//! Known disposable-mailbox domains.
//!
//! The built-in table covers the common throwaway providers; operators can
//! extend it from configuration (`disposable_domains`).

use std::collections::HashSet;

use phf::phf_set;

const BUILTIN: phf::Set<&'static str> = phf_set! {
    "0-mail.com",
    "10minutemail.com",
    "10minutemail.net",
    "20minutemail.com",
    "33mail.com",
    "anonbox.net",
    "burnermail.io",
    "discard.email",
    "dispostable.com",
    "dropmail.me",
    "emailondeck.com",
    "fakeinbox.com",
    "getairmail.com",
    "getnada.com",
    "guerrillamail.biz",
    "guerrillamail.com",
    "guerrillamail.de",
    "guerrillamail.info",
    "guerrillamail.net",
    "guerrillamail.org",
    "guerrillamailblock.com",
    "harakirimail.com",
    "inboxbear.com",
    "incognitomail.org",
    "jetable.org",
    "knowndisposable.com",
    "mailcatch.com",
    "maildrop.cc",
    "mailinator.com",
    "mailinator.net",
    "mailnesia.com",
    "mailsac.com",
    "mintemail.com",
    "moakt.com",
    "mohmal.com",
    "mytemp.email",
    "nada.email",
    "sharklasers.com",
    "spam4.me",
    "spambog.com",
    "spamgourmet.com",
    "temp-mail.io",
    "temp-mail.org",
    "tempail.com",
    "tempmail.com",
    "tempmail.net",
    "tempmailo.com",
    "tempr.email",
    "throwawaymail.com",
    "trash-mail.com",
    "trashmail.com",
    "trashmail.de",
    "trashmail.net",
    "wegwerfmail.de",
    "yopmail.com",
    "yopmail.fr",
    "yopmail.net",
};

/// Disposable-domain lookup: built-in table plus operator additions.
#[derive(Debug, Clone, Default)]
pub struct DisposableDomains {
    extra: HashSet<String>,
}

impl DisposableDomains {
    pub fn new<I, S>(extra: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            extra: extra
                .into_iter()
                .map(|d| normalize(d.as_ref()))
                .filter(|d| !d.is_empty())
                .collect(),
        }
    }

    /// Matches the domain itself or any parent domain
    /// (`x.mailinator.com` counts as `mailinator.com`).
    pub fn contains(&self, domain: &str) -> bool {
        let domain = normalize(domain);
        let mut candidate = domain.as_str();
        loop {
            if BUILTIN.contains(candidate) || self.extra.contains(candidate) {
                return true;
            }
            match candidate.split_once('.') {
                Some((_, parent)) if parent.contains('.') => candidate = parent,
                _ => return false,
            }
        }
    }
}

fn normalize(domain: &str) -> String {
    domain.trim().trim_end_matches('.').to_ascii_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_match_is_case_insensitive() {
        let list = DisposableDomains::default();
        assert!(list.contains("Mailinator.COM"));
        assert!(list.contains("yopmail.com."));
        assert!(!list.contains("example.com"));
    }

    #[test]
    fn subdomains_inherit() {
        let list = DisposableDomains::default();
        assert!(list.contains("eu.guerrillamail.com"));
        // a bare TLD never matches
        assert!(!list.contains("com"));
    }

    #[test]
    fn operator_additions() {
        let list = DisposableDomains::new(["Junk.Example", " "]);
        assert!(list.contains("junk.example"));
        assert!(list.contains("a.junk.example"));
        assert!(!list.contains("example"));
    }
}

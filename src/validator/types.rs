/// Result of the two-layer syntax check on a single address.
///
/// `local` and `domain` are filled whenever the input splits on a single
/// `@`, even when the address is rejected, so callers can still log them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedAddress {
    pub original: String,
    pub local: String,
    pub domain: String,
    pub ascii_domain: String,
    pub valid: bool,
    pub reasons: Vec<String>,
}

impl ParsedAddress {
    pub(crate) fn rejected(original: &str, reason: impl Into<String>) -> Self {
        let (local, domain) = original.split_once('@').unwrap_or((original, ""));
        Self {
            original: original.to_string(),
            local: local.to_string(),
            domain: domain.to_ascii_lowercase(),
            ascii_domain: String::new(),
            valid: false,
            reasons: vec![reason.into()],
        }
    }

    /// Domain to hand to DNS/SMTP lookups: the IDNA form when available.
    pub fn lookup_domain(&self) -> &str {
        if self.ascii_domain.is_empty() {
            &self.domain
        } else {
            &self.ascii_domain
        }
    }
}

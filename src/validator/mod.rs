//! Two-layer address syntax check.
//!
//! A cheap pattern match rejects obviously malformed input first; only
//! addresses that pass it go through the stricter grammar check
//! (length limits, atext local part, IDNA domain labels).

mod domain;
mod local;
mod types;

use std::sync::LazyLock;

use regex::Regex;

pub use types::ParsedAddress;

use domain::check_domain;
use local::is_local_atext;

static ADDRESS_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z0-9_.-]+@([A-Za-z0-9_-]+\.)+[A-Za-z0-9_-]+$")
        .expect("address pattern compiles")
});

/// Cheap structural pre-check.
pub fn matches_pattern(email: &str) -> bool {
    ADDRESS_PATTERN.is_match(email.trim())
}

/// Full syntax check: pattern first, then the grammar parse.
pub fn check_syntax(email: &str) -> ParsedAddress {
    let input = email.trim();
    if !matches_pattern(input) {
        return ParsedAddress::rejected(input, "does not match address pattern");
    }
    parse_address(input)
}

/// Grammar layer on its own (RFC 5321/5322 subset).
pub fn parse_address(email: &str) -> ParsedAddress {
    let input = email.trim();

    let mut reasons = Vec::new();

    if input.len() > 254 {
        reasons.push(format!("total length {} > 254", input.len()));
    }

    let parts: Vec<&str> = input.split('@').collect();
    if parts.len() != 2 {
        return ParsedAddress::rejected(input, "must contain exactly one '@'");
    }
    let (local, domain) = (parts[0], parts[1]);

    if local.is_empty() || local.len() > 64 {
        reasons.push(format!(
            "local part length {} invalid (1..=64)",
            local.len()
        ));
    }

    let ascii_domain = check_domain(domain, &mut reasons).unwrap_or_default();

    if !is_local_atext(local) {
        reasons.push("invalid local part".into());
    }

    ParsedAddress {
        original: input.to_string(),
        local: local.to_string(),
        domain: domain.to_lowercase(),
        ascii_domain,
        valid: reasons.is_empty(),
        reasons,
    }
}

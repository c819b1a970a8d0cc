use std::fmt;
use std::ops::{BitOr, BitOrAssign};
use std::str::FromStr;

use thiserror::Error;

/// Bit set of the reasons an address was rejected. Zero means valid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct FailureCode(u32);

impl FailureCode {
    pub const NONE: Self = Self(0);
    pub const NULL: Self = Self(1 << 0);
    pub const BAD_SYNTAX: Self = Self(1 << 1);
    pub const NO_MX: Self = Self(1 << 2);
    pub const DISPOSABLE: Self = Self(1 << 3);
    pub const SMTP_UNREACHABLE: Self = Self(1 << 4);
    pub const CATCH_ALL: Self = Self(1 << 5);

    /// Canonical label order. Labels are always rendered by walking this
    /// table, whatever order the bits were set in.
    const NAMED: [(Self, &'static str); 6] = [
        (Self::NULL, "NullEmail"),
        (Self::BAD_SYNTAX, "InvalidSyntax"),
        (Self::NO_MX, "NoMXRecord"),
        (Self::DISPOSABLE, "Disposable"),
        (Self::SMTP_UNREACHABLE, "SMTPFailed"),
        (Self::CATCH_ALL, "CatchAll"),
    ];

    const ALL_BITS: u32 = (1 << 6) - 1;

    pub const fn bits(self) -> u32 {
        self.0
    }

    /// `None` when unknown bits are set.
    pub const fn from_bits(bits: u32) -> Option<Self> {
        if bits & !Self::ALL_BITS == 0 {
            Some(Self(bits))
        } else {
            None
        }
    }

    pub const fn is_valid(self) -> bool {
        self.0 == 0
    }

    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    pub fn insert(&mut self, other: Self) {
        self.0 |= other.0;
    }

    /// Set flags with their names, in canonical order.
    pub fn iter(self) -> impl Iterator<Item = (Self, &'static str)> {
        Self::NAMED
            .into_iter()
            .filter(move |(flag, _)| self.contains(*flag))
    }

    /// `+`-joined flag names; empty for a valid address.
    pub fn label(self) -> String {
        self.iter()
            .map(|(_, name)| name)
            .collect::<Vec<_>>()
            .join("+")
    }
}

impl BitOr for FailureCode {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl BitOrAssign for FailureCode {
    fn bitor_assign(&mut self, rhs: Self) {
        self.insert(rhs);
    }
}

impl fmt::Display for FailureCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label())
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown failure label '{0}'")]
pub struct UnknownLabel(pub String);

impl FromStr for FailureCode {
    type Err = UnknownLabel;

    /// Parses a label back; names may appear in any order.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut code = Self::NONE;
        for part in s.split('+').map(str::trim).filter(|p| !p.is_empty()) {
            let (flag, _) = Self::NAMED
                .iter()
                .find(|(_, name)| *name == part)
                .ok_or_else(|| UnknownLabel(part.to_string()))?;
            code |= *flag;
        }
        Ok(code)
    }
}

use std::fmt;
use std::str::FromStr;

use crate::classify::{FailureCode, UnknownLabel};
use crate::store::STATUS_VALID;

const FAILED_PREFIX: &str = "Failed: ";

/// Terminal state written into the status column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowStatus {
    Valid,
    Failed(FailureCode),
}

impl From<FailureCode> for RowStatus {
    fn from(code: FailureCode) -> Self {
        if code.is_valid() {
            Self::Valid
        } else {
            Self::Failed(code)
        }
    }
}

impl RowStatus {
    pub fn is_valid(self) -> bool {
        matches!(self, Self::Valid)
    }
}

impl fmt::Display for RowStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Valid => f.write_str(STATUS_VALID),
            Self::Failed(code) => write!(f, "{FAILED_PREFIX}{code}"),
        }
    }
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum StatusParseError {
    #[error("unrecognised status {0:?}")]
    Unrecognised(String),
    #[error(transparent)]
    Label(#[from] UnknownLabel),
}

impl FromStr for RowStatus {
    type Err = StatusParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s == STATUS_VALID {
            return Ok(Self::Valid);
        }
        let label = s
            .strip_prefix(FAILED_PREFIX)
            .ok_or_else(|| StatusParseError::Unrecognised(s.to_string()))?;
        let code: FailureCode = label.parse()?;
        if code.is_valid() {
            return Err(StatusParseError::Unrecognised(s.to_string()));
        }
        Ok(Self::Failed(code))
    }
}

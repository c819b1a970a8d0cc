use std::fmt;

/// Classification of the observed SMTP behaviour for a mailbox.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Existence {
    /// The target address was accepted and no random alias was.
    Exists,
    /// The target address was rejected with a definitive SMTP status code.
    DoesNotExist,
    /// The SMTP server appears to accept any address (catch-all behaviour).
    CatchAll,
    /// The verification could not be concluded. The accompanying string holds
    /// a human-readable reason (temporary failures, timeouts, policies, etc.).
    Indeterminate(String),
}

impl fmt::Display for Existence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Exists => f.write_str("Exists"),
            Self::DoesNotExist => f.write_str("DoesNotExist"),
            Self::CatchAll => f.write_str("CatchAll"),
            Self::Indeterminate(reason) => write!(f, "Indeterminate ({reason})"),
        }
    }
}

/// Final report produced by [`SmtpProber::probe`](super::SmtpProber::probe).
#[derive(Debug, Clone, PartialEq)]
pub struct SmtpProbeReport {
    pub result: Existence,
    pub mx_tried: Vec<String>,
    pub transcript: Vec<String>,
    /// Set when `result` is [`Existence::Exists`] but the catch-all aliases
    /// got no definitive answer.
    pub catch_all_note: Option<String>,
}

impl SmtpProbeReport {
    pub fn new(
        result: Existence,
        mx_tried: Vec<String>,
        transcript: Vec<String>,
        catch_all_note: Option<String>,
    ) -> Self {
        Self {
            result,
            mx_tried,
            transcript,
            catch_all_note,
        }
    }
}

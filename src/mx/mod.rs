//! DNS MX resolution.
//!
//! [`MxResolver`] wraps a system resolver built once per process; [`check_mx`]
//! is a one-shot convenience around it.

mod error;
mod resolver;
mod types;

pub use error::MxError as Error;
pub use resolver::{MxResolver, check_mx};
pub use types::{MxRecord, MxStatus};

//! Validation pipeline: classify every unchecked row and persist its status.
//!
//! A run is resumable. Only rows with a NULL or empty status are selected and
//! every status is committed as soon as it is computed, so re-running after
//! an interruption picks up the remainder. `force` wipes all statuses first.

mod progress;
mod status;

pub use progress::{NoProgress, ProgressSink};
pub use status::{RowStatus, StatusParseError};

use tracing::{debug, info, warn};

use crate::classify::{ChecksEnabled, classify};
use crate::inspector::AddressInspector;
use crate::store::{Result, RowStore, StatusFilter};

/// What a validation run does.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationPolicy {
    pub checks: ChecksEnabled,
    /// Reset every status before counting.
    pub force: bool,
    /// SOCKS proxy URL for the SMTP probe; consumed when the inspector is
    /// built, the pipeline itself never dials out.
    pub proxy: Option<String>,
}

/// Accounting for one run.
///
/// `*_before` and `unchecked` are the baseline taken before any row is
/// processed; `valid` and `invalid` are running totals seeded from it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize)]
pub struct ValidationRun {
    pub total: u64,
    pub valid_before: u64,
    pub invalid_before: u64,
    pub unchecked: u64,
    pub processed: u64,
    pub valid: u64,
    pub invalid: u64,
}

impl ValidationRun {
    fn baseline(total: u64, valid_before: u64, unchecked: u64) -> Self {
        // unchecked + valid + invalid == total
        let invalid_before = total.saturating_sub(valid_before).saturating_sub(unchecked);
        Self {
            total,
            valid_before,
            invalid_before,
            unchecked,
            processed: 0,
            valid: valid_before,
            invalid: invalid_before,
        }
    }

    /// Rows that already had a terminal status when the run started.
    pub fn already_done(&self) -> u64 {
        self.total - self.unchecked.min(self.total)
    }

    /// `valid + invalid == total`. Fails only if someone else wrote to the
    /// table during the run.
    pub fn is_consistent(&self) -> bool {
        self.valid + self.invalid == self.total
    }

    fn record(&mut self, status: RowStatus) {
        self.processed += 1;
        if status.is_valid() {
            self.valid += 1;
        } else {
            self.invalid += 1;
        }
    }
}

/// Makes sure the status column exists, recreating it empty when `force`.
pub fn prepare_status_column<S: RowStore + ?Sized>(store: &mut S, force: bool) -> Result<()> {
    let exists = store.has_status_column()?;
    if force && exists {
        info!("dropping previous validation statuses");
        store.drop_status_column()?;
    }
    if force || !exists {
        debug!("adding status column");
        store.add_status_column()?;
    }
    Ok(())
}

/// Runs validation over every unchecked row of `store`.
///
/// Store errors abort the run and are returned as is; whatever was written
/// before stays written. Check failures never abort, they become the row's
/// status.
pub fn validate<S, I, P>(
    store: &mut S,
    inspector: &I,
    policy: &ValidationPolicy,
    progress: &mut P,
) -> Result<ValidationRun>
where
    S: RowStore + ?Sized,
    I: AddressInspector + ?Sized,
    P: ProgressSink + ?Sized,
{
    prepare_status_column(store, policy.force)?;

    let valid_before = store.count_status(StatusFilter::Valid)?;
    let unchecked = store.count_status(StatusFilter::Unchecked)?;
    let total = store.count_rows()?;
    let mut run = ValidationRun::baseline(total, valid_before, unchecked);
    info!(
        total,
        valid_before,
        invalid_before = run.invalid_before,
        unchecked,
        "validating emails"
    );

    let addresses = store.scan_addresses(StatusFilter::Unchecked)?;
    progress.start(total, run.already_done());

    for address in addresses {
        let raw = address.as_deref().unwrap_or_default();
        let classification = classify(raw, &policy.checks, inspector);
        let status = RowStatus::from(classification.code);
        debug!(
            address = raw,
            code = classification.code.bits(),
            %status,
            "validation result"
        );
        store.set_status(address.as_deref(), &status.to_string())?;
        run.record(status);
        progress.advance();
    }

    progress.finish();

    if !run.is_consistent() {
        warn!(
            valid = run.valid,
            invalid = run.invalid,
            total = run.total,
            "counts do not add up; was the table modified during the run?"
        );
    }
    info!(
        "Validation Complete: {} valid, {} invalid",
        run.valid, run.invalid
    );
    Ok(run)
}

use indicatif::ProgressBar;

/// Receives overall progress of a validation run.
///
/// `start` gets the table size and the rows already done before this run,
/// so a resumed run shows true overall completion.
pub trait ProgressSink {
    fn start(&mut self, total: u64, already_done: u64);
    fn advance(&mut self);
    fn finish(&mut self);
}

/// Discards progress.
#[derive(Debug, Default)]
pub struct NoProgress;

impl ProgressSink for NoProgress {
    fn start(&mut self, _total: u64, _already_done: u64) {}
    fn advance(&mut self) {}
    fn finish(&mut self) {}
}

impl ProgressSink for ProgressBar {
    fn start(&mut self, total: u64, already_done: u64) {
        self.set_length(total);
        self.set_position(already_done);
    }

    fn advance(&mut self) {
        self.inc(1);
    }

    fn finish(&mut self) {
        ProgressBar::finish(self);
    }
}

//! Scan pipeline: search, pre-filter, fetch, extract, classify, persist.

pub mod runner;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

pub use runner::ScanRunner;

/// Cooperative cancellation flag, checked between batches. A cancelled
/// run finishes its current batch so no message is half-processed.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }
}

/// Summary of one scan run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunReport {
    /// Messages classified and stored this run.
    pub processed: u64,
    /// Messages skipped: already analyzed, no candidate attachments, or
    /// no supported attachment after parsing.
    pub skipped: u64,
    /// Messages that failed to fetch or parse.
    pub errored: u64,
    /// True when the run stopped early through a cancel token.
    pub cancelled: bool,
}

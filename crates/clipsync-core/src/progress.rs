use crate::analysis::{CleanupResult, DeletionCandidate};

/// Trait for reporting cleanup progress.
///
/// The CLI implements it with an indicatif bar. All methods have default
/// no-op implementations.
pub trait CleanupReporter: Send + Sync {
    fn on_plan_ready(&self, _candidates: usize, _total_bytes: u64) {}
    fn on_file_deleted(&self, _candidate: &DeletionCandidate, _dry_run: bool) {}
    fn on_file_failed(&self, _candidate: &DeletionCandidate, _error: &str) {}
    fn on_cleanup_complete(&self, _result: &CleanupResult) {}
}

/// No-op progress reporter for silent operation.
pub struct SilentReporter;

impl CleanupReporter for SilentReporter {}

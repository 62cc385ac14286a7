pub mod cleaner;
pub mod detector;

pub use cleaner::{
    CleanupPlan, CleanupResult, ConfirmFn, DeletionCandidate, DuplicateCleaner, SkippedFile,
    DEFAULT_CLEANUP_SIMILARITY, DEFAULT_SIZE_VARIANCE,
};
pub use detector::{
    DuplicateDetector, DuplicateGroup, DuplicateStatistics, GroupMember,
    DEFAULT_DUPLICATE_THRESHOLD,
};

/// First `max` characters of `text`, on char boundaries.
pub(crate) fn truncate(text: &str, max: usize) -> &str {
    match text.char_indices().nth(max) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

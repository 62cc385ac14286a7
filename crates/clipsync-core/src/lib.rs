pub mod analysis;
pub mod config;
pub mod error;
pub mod inventory;
pub mod matching;
pub mod progress;
pub mod scanner;
pub mod storage;

pub use analysis::{CleanupResult, DuplicateCleaner, DuplicateDetector, DuplicateGroup};
pub use config::AppConfig;
pub use error::Error;
pub use inventory::{FileRecord, FileSizes, Inventory, InventoryEntry};
pub use matching::{FuzzyMatcher, MatchResult, MatchType, TitleCandidates};
pub use progress::{CleanupReporter, SilentReporter};
pub use storage::DeletionAuditLog;

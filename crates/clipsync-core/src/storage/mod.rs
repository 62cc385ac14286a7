pub mod audit_log;
pub mod models;

pub use audit_log::{DeletionAuditLog, CSV_HEADER, DEFAULT_MAX_ENTRIES};
pub use models::{AuditAction, AuditEntry, AuditLogDocument, AuditStatistics};

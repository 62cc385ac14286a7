use chrono::{Local, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::fmt;

pub const AUDIT_LOG_VERSION: &str = "1.0";

const ISO_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.6f";

/// Current local time as a naive ISO-8601 string.
pub fn now_iso() -> String {
    Local::now().naive_local().format(ISO_FORMAT).to_string()
}

pub fn to_iso(time: &NaiveDateTime) -> String {
    time.format(ISO_FORMAT).to_string()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum AuditAction {
    Delete,
    Skip,
    Error,
}

impl AuditAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuditAction::Delete => "DELETE",
            AuditAction::Skip => "SKIP",
            AuditAction::Error => "ERROR",
        }
    }
}

impl fmt::Display for AuditAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One immutable audit record. Field order is also the CSV column order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditEntry {
    pub timestamp: String,
    pub action: AuditAction,
    pub filename: String,
    pub full_path: String,
    pub size: u64,
    pub mtime: String,
    pub reason: String,
    pub similarity_score: f64,
    pub size_variance: f64,
    pub kept_file: String,
    #[serde(default)]
    pub dry_run: bool,
}

/// On-disk shape of the audit log file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditLogDocument {
    #[serde(default = "default_version")]
    pub version: String,
    #[serde(default)]
    pub created: String,
    #[serde(default)]
    pub last_updated: String,
    #[serde(default)]
    pub total_entries: usize,
    #[serde(default)]
    pub entries: Vec<AuditEntry>,
}

fn default_version() -> String {
    AUDIT_LOG_VERSION.to_string()
}

impl AuditLogDocument {
    pub fn fresh() -> Self {
        let now = now_iso();
        Self {
            version: default_version(),
            created: now.clone(),
            last_updated: now,
            total_entries: 0,
            entries: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AuditStatistics {
    pub total_entries: usize,
    /// Real deletions only.
    pub files_deleted: usize,
    pub files_skipped: usize,
    pub errors: usize,
    pub dry_run_deletions: usize,
    pub total_bytes_freed: u64,
    pub total_gb_freed: f64,
    pub log_created: String,
    pub last_updated: String,
}

/// Bytes to GiB, rounded to two decimals.
pub fn bytes_to_gb(bytes: u64) -> f64 {
    (bytes as f64 / 1024f64.powi(3) * 100.0).round() / 100.0
}

use std::cell::OnceCell;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use super::models::{
    bytes_to_gb, now_iso, to_iso, AuditAction, AuditEntry, AuditLogDocument, AuditStatistics,
};
use crate::analysis::cleaner::{DeletionCandidate, SkippedFile};
use crate::error::Error;

pub const DEFAULT_MAX_ENTRIES: usize = 10_000;

pub const CSV_HEADER: [&str; 11] = [
    "timestamp",
    "action",
    "filename",
    "full_path",
    "size",
    "mtime",
    "reason",
    "similarity_score",
    "size_variance",
    "kept_file",
    "dry_run",
];

/// File-backed, append-only record of cleanup activity.
///
/// The file is read on first use and kept in memory afterwards; every
/// mutation rewrites the whole file. Nothing here locks the file, so two
/// processes sharing one log path can lose each other's entries.
#[derive(Debug)]
pub struct DeletionAuditLog {
    path: PathBuf,
    max_entries: usize,
    document: OnceCell<AuditLogDocument>,
}

impl DeletionAuditLog {
    pub fn open(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            max_entries: DEFAULT_MAX_ENTRIES,
            document: OnceCell::new(),
        }
    }

    pub fn with_max_entries(mut self, max_entries: usize) -> Self {
        self.max_entries = max_entries;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn max_entries(&self) -> usize {
        self.max_entries
    }

    pub fn len(&self) -> usize {
        self.document().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn log_deletion(&mut self, candidate: &DeletionCandidate, dry_run: bool) -> Result<(), Error> {
        self.append(AuditEntry {
            timestamp: now_iso(),
            action: AuditAction::Delete,
            filename: candidate.name.clone(),
            full_path: candidate.full_path.display().to_string(),
            size: candidate.size,
            mtime: to_iso(&candidate.modified_at),
            reason: candidate.reason.clone(),
            similarity_score: candidate.similarity_score,
            size_variance: candidate.size_variance,
            kept_file: candidate.kept_file.clone(),
            dry_run,
        })?;
        debug!("Audit DELETE: {} (dry_run={})", candidate.name, dry_run);
        Ok(())
    }

    pub fn log_skip(&mut self, skipped: &SkippedFile, dry_run: bool) -> Result<(), Error> {
        self.append(AuditEntry {
            timestamp: now_iso(),
            action: AuditAction::Skip,
            filename: skipped.name.clone(),
            full_path: skipped.full_path.display().to_string(),
            size: skipped.size,
            mtime: to_iso(&skipped.modified_at),
            reason: skipped.reason.clone(),
            similarity_score: skipped.similarity_score,
            size_variance: skipped.size_variance,
            kept_file: skipped.kept_file.clone(),
            dry_run,
        })?;
        debug!("Audit SKIP: {} - {}", skipped.name, skipped.reason);
        Ok(())
    }

    pub fn log_error(&mut self, filename: &str, full_path: &Path, message: &str) -> Result<(), Error> {
        self.append(AuditEntry {
            timestamp: now_iso(),
            action: AuditAction::Error,
            filename: filename.to_string(),
            full_path: full_path.display().to_string(),
            size: 0,
            mtime: String::new(),
            reason: message.to_string(),
            similarity_score: 0.0,
            size_variance: 0.0,
            kept_file: String::new(),
            dry_run: false,
        })?;
        debug!("Audit ERROR: {} - {}", filename, message);
        Ok(())
    }

    /// Most recent entries first.
    pub fn get_recent_entries(&self, limit: usize) -> Vec<AuditEntry> {
        self.document()
            .entries
            .iter()
            .rev()
            .take(limit)
            .cloned()
            .collect()
    }

    pub fn get_statistics(&self) -> AuditStatistics {
        let doc = self.document();

        let mut stats = AuditStatistics {
            total_entries: doc.entries.len(),
            files_deleted: 0,
            files_skipped: 0,
            errors: 0,
            dry_run_deletions: 0,
            total_bytes_freed: 0,
            total_gb_freed: 0.0,
            log_created: doc.created.clone(),
            last_updated: doc.last_updated.clone(),
        };

        for entry in &doc.entries {
            match (entry.action, entry.dry_run) {
                (AuditAction::Delete, false) => {
                    stats.files_deleted += 1;
                    stats.total_bytes_freed += entry.size;
                }
                (AuditAction::Delete, true) => stats.dry_run_deletions += 1,
                (AuditAction::Skip, _) => stats.files_skipped += 1,
                (AuditAction::Error, _) => stats.errors += 1,
            }
        }
        stats.total_gb_freed = bytes_to_gb(stats.total_bytes_freed);
        stats
    }

    /// Write every entry as one CSV row. The header is written even when the log is empty.
    pub fn export_csv(&self, output: &Path) -> Result<usize, Error> {
        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_path(output)?;
        writer.write_record(CSV_HEADER)?;

        let entries = &self.document().entries;
        for entry in entries {
            writer.serialize(entry)?;
        }
        writer.flush()?;

        info!("Exported {} audit entries to {}", entries.len(), output.display());
        Ok(entries.len())
    }

    /// Reset to an empty log and persist it. Operator-invoked only.
    pub fn clear(&mut self) -> Result<(), Error> {
        self.document = OnceCell::from(AuditLogDocument::fresh());
        self.save()?;
        warn!("Audit log cleared: {}", self.path.display());
        Ok(())
    }

    fn append(&mut self, entry: AuditEntry) -> Result<(), Error> {
        let max_entries = self.max_entries;
        self.update(|doc| {
            doc.entries.push(entry);
            rotate(&mut doc.entries, max_entries);
        });
        self.save()
    }

    fn save(&mut self) -> Result<(), Error> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let json = self.update(|doc| {
            doc.last_updated = now_iso();
            doc.total_entries = doc.entries.len();
            serde_json::to_string_pretty(doc)
        })?;
        fs::write(&self.path, json)?;
        Ok(())
    }

    /// The in-memory document, read from disk on first access.
    fn document(&self) -> &AuditLogDocument {
        self.document.get_or_init(|| load_document(&self.path))
    }

    fn update<R>(&mut self, f: impl FnOnce(&mut AuditLogDocument) -> R) -> R {
        let mut doc = self
            .document
            .take()
            .unwrap_or_else(|| load_document(&self.path));
        let out = f(&mut doc);
        self.document = OnceCell::from(doc);
        out
    }
}

fn rotate(entries: &mut Vec<AuditEntry>, max_entries: usize) {
    if entries.len() > max_entries {
        let excess = entries.len() - max_entries;
        entries.drain(..excess);
        info!("Audit log rotated: dropped {} oldest entries", excess);
    }
}

/// Read the log file, substituting a fresh document when it is missing or unreadable.
fn load_document(path: &Path) -> AuditLogDocument {
    if !path.exists() {
        return AuditLogDocument::fresh();
    }

    let parsed = fs::read_to_string(path)
        .map_err(Error::from)
        .and_then(|text| serde_json::from_str::<AuditLogDocument>(&text).map_err(Error::from));

    match parsed {
        Ok(mut doc) => {
            doc.total_entries = doc.entries.len();
            debug!("Loaded {} audit entries from {}", doc.total_entries, path.display());
            doc
        }
        Err(err) => {
            warn!(
                "Failed to load audit log {}, starting a new one: {}",
                path.display(),
                err
            );
            AuditLogDocument::fresh()
        }
    }
}

use chrono::NaiveDateTime;
use std::collections::HashSet;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, error, info, warn};

use super::detector::{DuplicateDetector, DuplicateGroup};
use super::truncate;
use crate::error::Error;
use crate::inventory::{FileSizes, Inventory};
use crate::matching::Algorithm;
use crate::progress::CleanupReporter;
use crate::storage::models::bytes_to_gb;
use crate::storage::DeletionAuditLog;

pub const DEFAULT_CLEANUP_SIMILARITY: f64 = 0.85;
pub const DEFAULT_SIZE_VARIANCE: f64 = 0.10;

const MIB: f64 = 1024.0 * 1024.0;

/// A non-keeper group member with its match score, size variance and keeper.
/// Used both for deletion candidates and for members the size gate held back.
#[derive(Debug, Clone, PartialEq)]
pub struct DeletionCandidate {
    pub name: String,
    pub full_path: PathBuf,
    pub size: u64,
    pub modified_at: NaiveDateTime,
    pub reason: String,
    pub similarity_score: f64,
    pub size_variance: f64,
    pub kept_file: String,
}

/// A non-keeper group member held back by the size gate.
pub type SkippedFile = DeletionCandidate;

#[derive(Debug, Clone, Default)]
pub struct CleanupPlan {
    pub candidates: Vec<DeletionCandidate>,
    pub groups: Vec<DuplicateGroup>,
    pub skipped: Vec<SkippedFile>,
    /// Inventory size the plan was built from.
    pub files_analyzed: usize,
}

impl CleanupPlan {
    pub fn total_bytes(&self) -> u64 {
        self.candidates.iter().map(|c| c.size).sum()
    }
}

/// Outcome of one cleanup run. In dry-run mode the deletion counters
/// describe what would have been removed.
#[derive(Debug, Clone, Default)]
pub struct CleanupResult {
    pub dry_run: bool,
    /// The confirmation callback declined; nothing was touched.
    pub aborted: bool,
    pub groups_seen: usize,
    pub files_analyzed: usize,
    pub files_deleted: usize,
    pub files_skipped: usize,
    pub bytes_freed: u64,
    pub deleted_files: Vec<DeletionCandidate>,
    pub skipped_files: Vec<SkippedFile>,
    /// `(name, error message)` per failed deletion.
    pub errors: Vec<(String, String)>,
}

impl CleanupResult {
    pub fn new(dry_run: bool) -> Self {
        Self {
            dry_run,
            ..Self::default()
        }
    }

    pub fn gb_freed(&self) -> f64 {
        bytes_to_gb(self.bytes_freed)
    }
}

/// Callback shown the full candidate list before a live run; `false` aborts.
pub type ConfirmFn<'a> = &'a dyn Fn(&[DeletionCandidate]) -> bool;

/// Deletes filename duplicates whose sizes also agree.
///
/// A member is only deletable when its name matched the group anchor and its
/// size is within `size_variance_threshold` of the keeper's.
#[derive(Debug)]
pub struct DuplicateCleaner {
    similarity_threshold: f64,
    size_variance_threshold: f64,
    detector: DuplicateDetector,
}

impl Default for DuplicateCleaner {
    fn default() -> Self {
        Self::new(DEFAULT_CLEANUP_SIMILARITY, DEFAULT_SIZE_VARIANCE)
    }
}

impl DuplicateCleaner {
    pub fn new(similarity_threshold: f64, size_variance_threshold: f64) -> Self {
        Self {
            similarity_threshold,
            size_variance_threshold,
            detector: DuplicateDetector::new(similarity_threshold),
        }
    }

    pub fn with_algorithm(mut self, algorithm: Algorithm) -> Self {
        self.detector = self.detector.with_algorithm(algorithm);
        self
    }

    pub fn similarity_threshold(&self) -> f64 {
        self.similarity_threshold
    }

    pub fn size_variance_threshold(&self) -> f64 {
        self.size_variance_threshold
    }

    pub fn detector(&self) -> &DuplicateDetector {
        &self.detector
    }

    /// `(passes, variance)` where variance is `(max - min) / max`.
    /// An unknown (zero) size can't be verified and always fails with 1.0.
    pub fn check_size_variance(&self, size_a: u64, size_b: u64) -> (bool, f64) {
        if size_a == 0 || size_b == 0 {
            return (false, 1.0);
        }

        let max = size_a.max(size_b) as f64;
        let min = size_a.min(size_b) as f64;
        let variance = (max - min) / max;

        (variance <= self.size_variance_threshold, variance)
    }

    pub fn find_cleanup_candidates(&self, inventory: &Inventory, sizes: &FileSizes) -> CleanupPlan {
        let groups = self.detector.find_duplicates(inventory, Some(sizes));
        let mut candidates = Vec::new();
        let mut skipped = Vec::new();

        for group in &groups {
            let keeper_size = group.keeper().map_or(0, |keeper| keeper.size);

            for (member, score) in group.members_with_scores() {
                if member.name == group.recommended {
                    continue;
                }

                let (passes, variance) = self.check_size_variance(keeper_size, member.size);
                if !passes {
                    debug!(
                        "Size check failed for '{}': variance {:.1}% exceeds {:.1}%",
                        member.name,
                        variance * 100.0,
                        self.size_variance_threshold * 100.0
                    );
                    skipped.push(SkippedFile {
                        name: member.name.clone(),
                        full_path: member.full_path.clone(),
                        size: member.size,
                        modified_at: member.modified_at,
                        reason: format!(
                            "size variance {:.1}% exceeds {:.1}% (kept '{}')",
                            variance * 100.0,
                            self.size_variance_threshold * 100.0,
                            group.recommended
                        ),
                        similarity_score: score,
                        size_variance: variance,
                        kept_file: group.recommended.clone(),
                    });
                    continue;
                }

                candidates.push(DeletionCandidate {
                    name: member.name.clone(),
                    full_path: member.full_path.clone(),
                    size: member.size,
                    modified_at: member.modified_at,
                    reason: format!("duplicate of '{}'", group.recommended),
                    similarity_score: score,
                    size_variance: variance,
                    kept_file: group.recommended.clone(),
                });
            }
        }

        CleanupPlan {
            candidates,
            groups,
            skipped,
            files_analyzed: inventory.len(),
        }
    }

    /// Plan and execute (or simulate) a cleanup.
    pub fn cleanup(
        &self,
        inventory: &Inventory,
        sizes: &FileSizes,
        dry_run: bool,
        confirm: Option<ConfirmFn<'_>>,
        audit: &mut DeletionAuditLog,
        reporter: &dyn CleanupReporter,
    ) -> CleanupResult {
        let plan = self.find_cleanup_candidates(inventory, sizes);
        self.execute(plan, dry_run, confirm, audit, reporter)
    }

    /// Execute (or simulate) a plan from [`find_cleanup_candidates`].
    ///
    /// Size-gate skips are audited even when nothing is deletable. Per-file
    /// failures are recorded in the result and the audit log; they never stop
    /// the batch. `confirm` is only consulted for live runs.
    ///
    /// [`find_cleanup_candidates`]: DuplicateCleaner::find_cleanup_candidates
    pub fn execute(
        &self,
        plan: CleanupPlan,
        dry_run: bool,
        confirm: Option<ConfirmFn<'_>>,
        audit: &mut DeletionAuditLog,
        reporter: &dyn CleanupReporter,
    ) -> CleanupResult {
        let mut result = CleanupResult::new(dry_run);
        result.groups_seen = plan.groups.len();
        result.files_analyzed = plan.files_analyzed;
        result.files_skipped = plan.skipped.len();
        result.skipped_files = plan.skipped.clone();

        if !plan.candidates.is_empty() && !dry_run {
            if let Some(confirm) = confirm {
                if !confirm(&plan.candidates) {
                    info!("Cleanup cancelled by user; no files were touched");
                    result.aborted = true;
                    return result;
                }
            }
        }

        for skipped in &plan.skipped {
            if let Err(err) = audit.log_skip(skipped, dry_run) {
                warn!("Failed to record skip for '{}': {}", skipped.name, err);
            }
        }

        if plan.candidates.is_empty() {
            info!("No duplicate files to delete");
            reporter.on_cleanup_complete(&result);
            return result;
        }

        reporter.on_plan_ready(plan.candidates.len(), plan.total_bytes());

        for candidate in plan.candidates {
            if !dry_run {
                if let Err(err) = delete_file(&candidate.full_path) {
                    let message = err.to_string();
                    if let Err(audit_err) =
                        audit.log_error(&candidate.name, &candidate.full_path, &message)
                    {
                        warn!("Failed to record error for '{}': {}", candidate.name, audit_err);
                    }
                    reporter.on_file_failed(&candidate, &message);
                    result.errors.push((candidate.name.clone(), message));
                    continue;
                }
                info!(
                    "Deleted {} ({:.1} MB)",
                    candidate.name,
                    candidate.size as f64 / MIB
                );
            } else {
                info!("[DRY-RUN] Would delete: {}", candidate.name);
            }

            if let Err(err) = audit.log_deletion(&candidate, dry_run) {
                warn!("Failed to record deletion of '{}': {}", candidate.name, err);
            }
            reporter.on_file_deleted(&candidate, dry_run);

            result.files_deleted += 1;
            result.bytes_freed += candidate.size;
            result.deleted_files.push(candidate);
        }

        info!(
            "Cleanup finished: {} deleted, {} skipped, {} errors, {:.2} GB freed (dry_run={})",
            result.files_deleted,
            result.files_skipped,
            result.errors.len(),
            result.gb_freed(),
            dry_run
        );
        reporter.on_cleanup_complete(&result);
        result
    }

    /// Fixed-layout preview of a plan. Members of a group that are neither
    /// kept nor candidates were held back by the size gate.
    pub fn generate_preview(&self, candidates: &[DeletionCandidate], groups: &[DuplicateGroup]) -> String {
        let deletable: HashSet<(&str, &Path)> = candidates
            .iter()
            .map(|c| (c.name.as_str(), c.full_path.as_path()))
            .collect();
        let total_bytes: u64 = candidates.iter().map(|c| c.size).sum();

        let mut lines = vec!["=".repeat(70)];
        lines.push("DUPLICATE CLEANUP PREVIEW".to_string());
        lines.push("=".repeat(70));
        lines.push(String::new());
        lines.push(format!("Duplicate groups found: {}", groups.len()));
        lines.push(format!("Files to delete: {}", candidates.len()));
        lines.push(format!("Space to reclaim: {:.2} GB", total_bytes as f64 / (MIB * 1024.0)));
        lines.push(String::new());

        for (i, group) in groups.iter().enumerate() {
            lines.push(format!(
                "Group {}: \"{}...\"",
                i + 1,
                truncate(&group.canonical_name, 40)
            ));
            lines.push("-".repeat(50));

            for member in &group.members {
                let marker = if member.name == group.recommended {
                    "[KEEP]  "
                } else if deletable.contains(&(member.name.as_str(), member.full_path.as_path())) {
                    "[DELETE]"
                } else {
                    "[SKIP]  "
                };

                lines.push(format!("  {} {}", marker, truncate(&member.name, 50)));
                lines.push(format!(
                    "          ({}, {:.1} MB)",
                    member.modified_at.format("%Y-%m-%d"),
                    member.size as f64 / MIB
                ));
            }
            lines.push(String::new());
        }

        lines.push("=".repeat(70));
        lines.push(format!(
            "WARNING: {} files will be permanently deleted!",
            candidates.len()
        ));
        lines.push("=".repeat(70));

        lines.join("\n")
    }
}

/// Remove one file, classifying the failure.
fn delete_file(path: &Path) -> Result<(), Error> {
    if !path.exists() {
        warn!("File does not exist: {}", path.display());
        return Err(Error::FileMissing(path.to_path_buf()));
    }

    fs::remove_file(path).map_err(|err| {
        error!("Failed to delete '{}': {}", path.display(), err);
        match err.kind() {
            io::ErrorKind::PermissionDenied => Error::PermissionDenied {
                path: path.to_path_buf(),
                source: err,
            },
            io::ErrorKind::NotFound => Error::FileMissing(path.to_path_buf()),
            _ => Error::Io(err),
        }
    })
}

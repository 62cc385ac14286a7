use clipsync_core::analysis::{CleanupResult, DeletionCandidate};
use clipsync_core::CleanupReporter;
use indicatif::{ProgressBar, ProgressStyle};
use std::sync::Mutex;

/// CLI cleanup reporter: one bar over the candidate list.
pub struct CliReporter {
    bar: Mutex<Option<ProgressBar>>,
}

impl CliReporter {
    pub fn new() -> Self {
        Self {
            bar: Mutex::new(None),
        }
    }

    fn with_bar(&self, f: impl FnOnce(&ProgressBar)) {
        if let Ok(guard) = self.bar.lock() {
            if let Some(pb) = guard.as_ref() {
                f(pb);
            }
        }
    }

    fn finish_bar(&self) {
        if let Ok(mut guard) = self.bar.lock() {
            if let Some(pb) = guard.take() {
                pb.finish_and_clear();
            }
        }
    }
}

impl CleanupReporter for CliReporter {
    fn on_plan_ready(&self, candidates: usize, total_bytes: u64) {
        let pb = ProgressBar::new(candidates as u64);
        let style = ProgressStyle::with_template(
            "  {spinner:.cyan} Removing [{bar:30.cyan/dim}] {pos}/{len} files {msg}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("━╸─")
        .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏");
        pb.set_style(style);
        pb.set_message(format!(
            "({:.2} GB)",
            total_bytes as f64 / (1024.0 * 1024.0 * 1024.0)
        ));
        pb.enable_steady_tick(std::time::Duration::from_millis(80));

        if let Ok(mut guard) = self.bar.lock() {
            if let Some(old) = guard.replace(pb) {
                old.finish_and_clear();
            }
        }
    }

    fn on_file_deleted(&self, _candidate: &DeletionCandidate, _dry_run: bool) {
        self.with_bar(|pb| pb.inc(1));
    }

    fn on_file_failed(&self, candidate: &DeletionCandidate, error: &str) {
        self.with_bar(|pb| {
            pb.println(format!("  \x1b[31m✗\x1b[0m {}: {}", candidate.name, error));
            pb.inc(1);
        });
    }

    fn on_cleanup_complete(&self, result: &CleanupResult) {
        self.finish_bar();
        let freed = if result.dry_run { "would be freed" } else { "freed" };
        eprintln!(
            "  \x1b[32m✓\x1b[0m Cleanup complete: {} files, {:.2} GB {}",
            result.files_deleted,
            result.gb_freed(),
            freed
        );
    }
}

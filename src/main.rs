mod cli;
mod logging;
mod progress;
mod prompt;

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::process;

use anyhow::{bail, Context};
use clap::Parser;
use clipsync_core::analysis::{DeletionCandidate, DuplicateCleaner, DuplicateDetector};
use clipsync_core::config::{check_unit_interval, load_configuration};
use clipsync_core::matching::{FuzzyMatcher, MatchType, TitleCandidates};
use clipsync_core::scanner::{build_inventory, scan_media_folder};
use clipsync_core::{AppConfig, DeletionAuditLog, FileSizes, Inventory};
use cli::{AuditArgs, CleanupArgs, Cli, Commands, DuplicatesArgs, MatchArgs, MediaArgs};
use colored::*;
use dotenv::dotenv;
use progress::CliReporter;
use prompt::{prompt_confirm, prompt_phrase};
use tracing::{error, info, warn};

fn main() {
    dotenv().ok();

    let args = Cli::parse();
    let _guard = logging::init_logger(args.verbose);

    let config = match load_configuration() {
        Ok(config) => config,
        Err(err) => {
            error!("Error loading configuration: {}", err);
            process::exit(1);
        }
    };

    let outcome = match args.command {
        Some(Commands::Duplicates(args)) => run_duplicates(&config, &args),
        Some(Commands::Cleanup(args)) => run_cleanup(&config, &args),
        Some(Commands::Match(args)) => run_match(&config, &args),
        Some(Commands::Audit(args)) => run_audit(&config, &args),
        Some(Commands::ExportAudit { output }) => run_export_audit(&config, &output),
        Some(Commands::ClearAudit) => run_clear_audit(&config),
        Some(Commands::PrintConfig) => {
            println!("Configuration: {:#?}", config);
            Ok(())
        }
        None => cli::write_usage(&mut io::stdout()).context("Failed to print usage"),
    };

    if let Err(err) = outcome {
        error!("Error: {:#}", err);
        process::exit(1);
    }
}

fn media_folder(config: &AppConfig, args: &MediaArgs) -> anyhow::Result<PathBuf> {
    match &args.media_folder {
        Some(folder) => Ok(folder.clone()),
        None if !config.media_folder.is_empty() => Ok(PathBuf::from(&config.media_folder)),
        None => bail!("No media folder configured; set media_folder or pass --media-folder"),
    }
}

fn load_inventory(config: &AppConfig, args: &MediaArgs) -> anyhow::Result<(Inventory, FileSizes)> {
    let folder = media_folder(config, args)?;
    let records = scan_media_folder(&folder, &config.video_extensions, true)
        .with_context(|| format!("Failed to scan {}", folder.display()))?;
    Ok(build_inventory(&records))
}

fn open_audit_log(config: &AppConfig) -> DeletionAuditLog {
    DeletionAuditLog::open(&config.cleanup.audit_log)
        .with_max_entries(config.cleanup.max_audit_entries)
}

fn run_duplicates(config: &AppConfig, args: &DuplicatesArgs) -> anyhow::Result<()> {
    if !config.duplicates.enabled {
        warn!("Duplicate detection is disabled in configuration");
        return Ok(());
    }

    let (inventory, sizes) = load_inventory(config, &args.media)?;
    let detector = DuplicateDetector::new(config.duplicates.threshold)
        .with_algorithm(config.matching.algorithm);

    let groups = detector.find_duplicates(&inventory, Some(&sizes));
    let report = detector.generate_report(&groups);
    println!("{}", report);

    let stats = detector.get_statistics(&groups);
    info!(
        "{} groups, {} files in groups, {} duplicates, {} to keep",
        format!("{}", stats.total_groups).red(),
        stats.total_files_in_groups,
        format!("{}", stats.total_duplicates).red(),
        format!("{}", stats.files_to_keep).green(),
    );

    if let Some(path) = &args.report {
        write_report(path, &report)?;
        info!("Report saved to {}", path.display());
    }
    Ok(())
}

fn write_report(path: &Path, report: &str) -> anyhow::Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    fs::write(path, report).with_context(|| format!("Failed to write {}", path.display()))
}

fn run_cleanup(config: &AppConfig, args: &CleanupArgs) -> anyhow::Result<()> {
    let dry_run = !args.force;
    if !dry_run && !config.cleanup.enabled {
        bail!("Cleanup is disabled; set cleanup.enabled = true to delete files");
    }

    let similarity = args.similarity.unwrap_or(config.cleanup.similarity_threshold);
    let size_variance = args.size_variance.unwrap_or(config.cleanup.size_variance);
    check_unit_interval("similarity", similarity)?;
    check_unit_interval("size-variance", size_variance)?;

    let (inventory, sizes) = load_inventory(config, &args.media)?;
    let cleaner = DuplicateCleaner::new(similarity, size_variance)
        .with_algorithm(config.matching.algorithm);

    let plan = cleaner.find_cleanup_candidates(&inventory, &sizes);
    if plan.candidates.is_empty() {
        info!("No duplicate files to delete");
    } else {
        println!("{}", cleaner.generate_preview(&plan.candidates, &plan.groups));
        if dry_run {
            println!(
                "{}",
                "Dry run: nothing will be deleted. Re-run with --force to delete.".yellow()
            );
        }
    }

    let confirm = |candidates: &[DeletionCandidate]| {
        let question = format!("{} files will be permanently deleted.", candidates.len());
        prompt_phrase(&question, "DELETE").unwrap_or_else(|err| {
            error!("Failed to read confirmation: {}", err);
            false
        })
    };
    let confirm_fn: Option<&dyn Fn(&[DeletionCandidate]) -> bool> =
        if config.cleanup.require_confirmation {
            Some(&confirm)
        } else {
            None
        };

    let mut audit = open_audit_log(config);
    let reporter = CliReporter::new();
    let result = cleaner.execute(plan, dry_run, confirm_fn, &mut audit, &reporter);

    if result.aborted {
        println!("{}", "Cleanup cancelled.".yellow());
        return Ok(());
    }

    let mode = if result.dry_run { "[DRY-RUN] " } else { "" };
    info!(
        "{}{} groups, {} files analyzed, {} deleted, {} skipped, {} freed",
        mode,
        result.groups_seen,
        result.files_analyzed,
        format!("{}", result.files_deleted).red(),
        result.files_skipped,
        format!("{:.2} GB", result.gb_freed()).green(),
    );
    for (name, message) in &result.errors {
        error!("{}: {}", name, message);
    }
    info!("Audit log: {}", audit.path().display());
    Ok(())
}

fn run_match(config: &AppConfig, args: &MatchArgs) -> anyhow::Result<()> {
    let text = fs::read_to_string(&args.titles)
        .with_context(|| format!("Failed to read {}", args.titles.display()))?;

    let titles = text
        .lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(idx, line)| (line.trim(), idx as u32 + 1));
    let candidates = TitleCandidates::from_titles(titles);
    info!("Loaded {} titles", candidates.len());

    let (inventory, _) = load_inventory(config, &args.media)?;
    let filenames: Vec<&str> = inventory.iter().map(|(_, entry)| entry.name.as_str()).collect();

    let matcher = FuzzyMatcher::new(config.matching.similarity_threshold)
        .with_algorithm(config.matching.algorithm)
        .with_fuzzy(config.matching.fuzzy_enabled);
    info!("Matching with {}", matcher.algorithm_name());

    let results = matcher.batch_find_matches(&filenames, &candidates);
    let mut matched = 0;
    for result in &results {
        if result.matched {
            matched += 1;
            let row = result.matched_row.map_or(String::from("-"), |r| r.to_string());
            let kind = match result.match_type {
                MatchType::Exact => result.match_type.to_string().green(),
                MatchType::Fuzzy => result.match_type.to_string().yellow(),
                _ => result.match_type.to_string().cyan(),
            };
            println!(
                "{:>5}  {:.2}  {:<22} {} -> {}",
                row, result.score, kind, result.original_filename, result.matched_title
            );
        } else {
            println!(
                "{:>5}  {:.2}  {:<22} {}",
                "-",
                result.score,
                "none".red(),
                result.original_filename
            );
            for alt in &result.alternatives {
                println!("{:>13} row {} ({:.2}) {}", "?", alt.row, alt.score, alt.title);
            }
        }
    }

    info!("{} of {} files matched", matched, results.len());
    Ok(())
}

fn run_audit(config: &AppConfig, args: &AuditArgs) -> anyhow::Result<()> {
    let audit = open_audit_log(config);
    let stats = audit.get_statistics();

    println!("Audit log: {}", audit.path().display());
    println!("  entries:           {}", stats.total_entries);
    println!("  files deleted:     {}", stats.files_deleted);
    println!("  dry-run deletions: {}", stats.dry_run_deletions);
    println!("  files skipped:     {}", stats.files_skipped);
    println!("  errors:            {}", stats.errors);
    println!("  space freed:       {:.2} GB", stats.total_gb_freed);
    println!("  created:           {}", stats.log_created);
    println!("  last updated:      {}", stats.last_updated);

    let recent = audit.get_recent_entries(args.limit);
    if !recent.is_empty() {
        println!();
        println!("Most recent {} entries:", recent.len());
    }
    for entry in recent {
        let action = match entry.action.as_str() {
            "DELETE" if entry.dry_run => "DELETE (dry-run)".yellow(),
            "DELETE" => "DELETE".red(),
            "ERROR" => "ERROR".red().bold(),
            other => other.cyan(),
        };
        println!("  {}  {:<18} {}  {}", entry.timestamp, action, entry.filename, entry.reason);
    }
    Ok(())
}

fn run_export_audit(config: &AppConfig, output: &Path) -> anyhow::Result<()> {
    let audit = open_audit_log(config);
    let count = audit.export_csv(output)?;
    println!("Exported {} entries to {}", count, output.display());
    Ok(())
}

fn run_clear_audit(config: &AppConfig) -> anyhow::Result<()> {
    let mut audit = open_audit_log(config);
    let question = format!(
        "Are you SURE you want to erase the audit log at {}?",
        audit.path().display()
    );
    if prompt_confirm(&question, Some(false))? {
        audit.clear()?;
        println!("Audit log cleared");
    }
    Ok(())
}

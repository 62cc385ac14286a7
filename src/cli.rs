use clap::{Args, CommandFactory, Parser, Subcommand};
use std::io::{self, Write};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "clipsync")]
#[command(about = "Find and safely remove duplicate media files", long_about = None)]
pub struct Cli {
    /// Log at debug level unless TRACING_LEVEL is set
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Scan the media folder and report duplicate groups
    Duplicates(DuplicatesArgs),
    /// Preview, and with --force execute, duplicate removal
    Cleanup(CleanupArgs),
    /// Match media filenames against a list of titles, one per line
    Match(MatchArgs),
    /// Show audit log statistics and recent entries
    Audit(AuditArgs),
    /// Export the audit log as CSV
    ExportAudit {
        /// Output CSV path
        output: PathBuf,
    },
    /// Erase the audit log
    ClearAudit,
    /// Print configuration values
    PrintConfig,
}

#[derive(Debug, Args)]
pub struct MediaArgs {
    /// Override the configured media folder
    #[arg(long)]
    pub media_folder: Option<PathBuf>,
}

#[derive(Debug, Args)]
pub struct DuplicatesArgs {
    #[command(flatten)]
    pub media: MediaArgs,

    /// Also write the report to this file
    #[arg(long)]
    pub report: Option<PathBuf>,
}

#[derive(Debug, Args)]
pub struct CleanupArgs {
    #[command(flatten)]
    pub media: MediaArgs,

    /// Actually delete files instead of a dry run
    #[arg(long)]
    pub force: bool,

    /// Filename similarity threshold (0.0-1.0)
    #[arg(long)]
    pub similarity: Option<f64>,

    /// Allowed size difference between copies (0.0-1.0)
    #[arg(long)]
    pub size_variance: Option<f64>,
}

#[derive(Debug, Args)]
pub struct MatchArgs {
    #[command(flatten)]
    pub media: MediaArgs,

    /// Text file with one title per line; the line number is the row
    pub titles: PathBuf,
}

#[derive(Debug, Args)]
pub struct AuditArgs {
    /// Number of recent entries to show
    #[arg(long, default_value_t = 20)]
    pub limit: usize,
}

/// Long help, printed when no subcommand is given.
pub fn write_usage(out: &mut impl Write) -> io::Result<()> {
    Cli::command().write_long_help(out)
}

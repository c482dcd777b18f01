//! Command-line interface module for extsort.
//!
//! This module handles:
//! - Argument parsing
//! - Target directory validation
//! - Run log setup
//! - Orchestration of listing, filtering and organizing
//! - Console reporting

use crate::config::{ConfigError, OrganizerConfig};
use crate::file_lister::list_files;
use crate::file_organizer::{FileOrganizer, OrganizeError, OrganizeReport, Outcome};
use crate::file_system::{DryRunFs, FileSystem, RealFs};
use crate::output::OutputFormatter;
use crate::run_log::{FileRunLog, LOG_DIR_NAME, RunLog};
use clap::{ArgAction, Parser};
use indicatif::ProgressBar;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::Level;

/// Sort the files of a directory into subdirectories named after their extension.
#[derive(Debug, Clone, Default, Parser)]
#[command(name = "extsort", version, about)]
pub struct Cli {
    /// Directory to organize. Defaults to the current directory.
    pub directory: Option<PathBuf>,

    /// Show what would happen without moving anything.
    #[arg(long)]
    pub dry_run: bool,

    /// Write a timestamped run log (into <DIRECTORY>/logs unless --log-dir is given).
    #[arg(long)]
    pub log: bool,

    /// Directory for run logs. Implies --log.
    #[arg(long, value_name = "DIR")]
    pub log_dir: Option<PathBuf>,

    /// Configuration file to use instead of the standard locations.
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Increase diagnostic output (-v info, -vv debug).
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,
}

/// Errors that end a CLI run.
#[derive(Debug, Error)]
pub enum CliError {
    #[error("The directory '{}' does not exist or is not a directory.", .0.display())]
    InvalidTarget(PathBuf),
    #[error("Could not resolve the target directory: {0}")]
    CurrentDir(#[source] io::Error),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Organize(#[from] OrganizeError),
}

impl CliError {
    /// Process exit status for this error.
    ///
    /// `1` when nothing was attempted, `2` when the run stopped part way.
    pub fn exit_code(&self) -> u8 {
        match self {
            CliError::Organize(OrganizeError::ListFailed { .. }) => 1,
            CliError::Organize(_) => 2,
            _ => 1,
        }
    }
}

/// What a successful run found and did.
#[derive(Debug, Clone)]
pub struct RunSummary {
    pub target: PathBuf,
    pub files_found: usize,
    pub files_excluded: usize,
    pub report: OrganizeReport,
    pub log_file: Option<PathBuf>,
    pub dry_run: bool,
}

/// Run log used by the CLI: prints each outcome and forwards every record to
/// the optional log file.
struct ConsoleLog {
    file: Option<FileRunLog>,
    progress: Option<ProgressBar>,
    dry_run: bool,
}

impl RunLog for ConsoleLog {
    fn record(&mut self, level: Level, message: &str) {
        if let Some(file) = self.file.as_mut() {
            file.record(level, message);
        }
    }

    fn outcome(&mut self, outcome: &Outcome) {
        let dry_run = self.dry_run;
        match &self.progress {
            Some(pb) => {
                pb.suspend(|| OutputFormatter::outcome(outcome, dry_run));
                pb.inc(1);
            }
            None => OutputFormatter::outcome(outcome, dry_run),
        }
        self.record(outcome.level(), &outcome.to_string());
    }
}

/// Runs the CLI with parsed arguments.
///
/// # Examples
///
/// ```no_run
/// use extsort::cli::{Cli, run};
/// use std::path::PathBuf;
///
/// let cli = Cli {
///     directory: Some(PathBuf::from("/path/to/directory")),
///     dry_run: true,
///     ..Default::default()
/// };
/// match run(&cli) {
///     Ok(summary) => println!("{} file(s) found", summary.files_found),
///     Err(e) => eprintln!("Error: {}", e),
/// }
/// ```
pub fn run(cli: &Cli) -> Result<RunSummary, CliError> {
    let target = resolve_target(cli.directory.as_deref())?;

    let config = OrganizerConfig::load(cli.config.as_deref())?;
    let filters = config.compile_filters()?;

    let mut console = ConsoleLog {
        file: open_run_log(cli, &config, &target),
        progress: None,
        dry_run: cli.dry_run,
    };
    let log_file = console.file.as_ref().map(|f| f.path().to_path_buf());
    if let Some(path) = &log_file {
        OutputFormatter::plain(&format!("Logging to {}", path.display()));
        console.info(&format!("Logging started. Log file: {}", path.display()));
    }

    if cli.dry_run {
        OutputFormatter::dry_run_notice(&format!(
            "Analyzing contents of: {}",
            target.display()
        ));
    } else {
        OutputFormatter::info(&format!("Organizing files in directory: {}", target.display()));
    }
    console.info(&format!("Starting organization in directory: {}", target.display()));

    let real_fs = RealFs;
    let dry_run_fs = DryRunFs::new(&real_fs);
    let fs: &dyn FileSystem = if cli.dry_run { &dry_run_fs } else { &real_fs };

    let listed = list_files(fs, &target).inspect_err(|e| console.error(&e.to_string()))?;
    let files_listed = listed.len();
    let own_log = log_file.as_deref().and_then(|p| std::fs::canonicalize(p).ok());
    let files: Vec<_> = listed
        .into_iter()
        .filter(|file| filters.should_include(file.path()))
        .filter(|file| !is_own_log(file.path(), own_log.as_deref()))
        .collect();
    let files_excluded = files_listed - files.len();

    OutputFormatter::plain(&format!("Found {} file(s).", files.len()));
    console.info(&format!("Found {} file(s) in directory.", files.len()));
    if files_excluded > 0 {
        OutputFormatter::plain(&format!(
            "Excluded {} file(s) by filter rules.",
            files_excluded
        ));
        console.info(&format!("Excluded {} file(s) by filter rules.", files_excluded));
    }

    let mut summary = RunSummary {
        target: target.clone(),
        files_found: files.len(),
        files_excluded,
        report: OrganizeReport::default(),
        log_file,
        dry_run: cli.dry_run,
    };

    if files.is_empty() {
        OutputFormatter::plain("No files to organize.");
        console.info("No files found to organize. Exiting.");
        return Ok(summary);
    }

    console.progress = Some(OutputFormatter::create_progress_bar(files.len() as u64));
    let result = FileOrganizer::new(fs).organize_files(&files, &target, &mut console);
    if let Some(pb) = console.progress.take() {
        pb.finish_and_clear();
    }

    let report = match result {
        Ok(report) => report,
        Err(e) => {
            console.error("File organization stopped before completion.");
            return Err(e.into());
        }
    };

    print_report(&report, cli.dry_run);
    console.info(&format!(
        "Moved: {}, already organized: {}, conflicts: {}.",
        report.moved_count(),
        report.skipped_count(),
        report.conflict_count()
    ));
    console.info("File organization completed successfully.");

    summary.report = report;
    Ok(summary)
}

/// Resolves the target directory and checks that it is a directory.
///
/// `None` means the current working directory.
pub fn resolve_target(directory: Option<&Path>) -> Result<PathBuf, CliError> {
    let target = match directory {
        Some(dir) => dir.to_path_buf(),
        None => std::env::current_dir().map_err(CliError::CurrentDir)?,
    };

    if !target.is_dir() {
        return Err(CliError::InvalidTarget(target));
    }

    std::path::absolute(&target).map_err(CliError::CurrentDir)
}

/// Picks the log directory from the flags, then the config, then
/// `<target>/logs`. Returns `None` when logging is off.
fn log_directory(cli: &Cli, config: &OrganizerConfig, target: &Path) -> Option<PathBuf> {
    if cli.dry_run {
        return None;
    }
    if let Some(dir) = &cli.log_dir {
        return Some(dir.clone());
    }
    if !(cli.log || config.logging.enabled) {
        return None;
    }
    Some(
        config
            .logging
            .directory
            .clone()
            .unwrap_or_else(|| target.join(LOG_DIR_NAME)),
    )
}

/// True when `path` is the log file this run is writing to.
///
/// Only called for listed files; the name is compared first so most files
/// never hit `canonicalize`.
fn is_own_log(path: &Path, own_log: Option<&Path>) -> bool {
    let Some(own_log) = own_log else {
        return false;
    };
    if path.file_name() != own_log.file_name() {
        return false;
    }
    std::fs::canonicalize(path).is_ok_and(|p| p == own_log)
}

fn open_run_log(cli: &Cli, config: &OrganizerConfig, target: &Path) -> Option<FileRunLog> {
    let dir = log_directory(cli, config, target)?;
    match FileRunLog::create(&dir) {
        Ok(log) => Some(log),
        Err(e) => {
            tracing::warn!(dir = %dir.display(), error = %e, "could not open run log");
            OutputFormatter::warning(&format!(
                "Could not open a log file in {}: {}. Continuing without a log.",
                dir.display(),
                e
            ));
            None
        }
    }
}

fn print_report(report: &OrganizeReport, dry_run: bool) {
    let moved = report.moved_count();
    if moved > 0 {
        OutputFormatter::summary_table(&report.category_counts(), moved);
    }

    let totals = format!(
        "Moved: {}, already organized: {}, conflicts: {}.",
        moved,
        report.skipped_count(),
        report.conflict_count()
    );

    if dry_run {
        OutputFormatter::dry_run_notice(&totals);
        OutputFormatter::success("Dry run complete. No files were modified.");
    } else {
        OutputFormatter::plain(&totals);
        OutputFormatter::success("Files have been organized by extension.");
    }
}

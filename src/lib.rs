//! extsort - sort the files of a directory by extension
//!
//! Files directly inside a target directory are moved into subdirectories
//! named after their lowercase extension (`no_extension` when there is
//! none). Files already in place are skipped and occupied destinations are
//! never overwritten, so running twice changes nothing the second time.

pub mod cli;
pub mod config;
pub mod file_category;
pub mod file_lister;
pub mod file_organizer;
pub mod file_system;
pub mod output;
pub mod run_log;

pub use config::{CompiledFilters, ConfigError, OrganizerConfig};
pub use file_category::{Category, FileEntry, NO_EXTENSION};
pub use file_lister::list_files;
pub use file_organizer::{FileOrganizer, OrganizeError, OrganizeReport, OrganizeResult, Outcome};
pub use file_system::{DryRunFs, FileSystem, MemoryFs, RealFs};
pub use run_log::{FileRunLog, MemoryRunLog, NullRunLog, RunLog};

pub use cli::{Cli, CliError, RunSummary, run};

//! Sorting files into per-extension subdirectories.
//!
//! For every listed file the organizer derives its category, makes sure the
//! category directory exists under the target directory and renames the
//! file into it. Files already sitting in their category directory are left
//! alone, and a file whose destination is occupied is never overwritten.

use crate::file_category::{Category, FileEntry};
use crate::file_system::FileSystem;
use crate::run_log::RunLog;
use std::collections::BTreeMap;
use std::fmt;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::Level;

/// Errors that stop an organization run.
#[derive(Debug, Error)]
pub enum OrganizeError {
    /// The directory to organize could not be read.
    #[error("Failed to list directory {}: {source}", .path.display())]
    ListFailed {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    /// Failed to create a category directory.
    #[error("Failed to create directory {} for {}: {source}", .path.display(), .file.display())]
    DirectoryCreationFailed {
        path: PathBuf,
        file: PathBuf,
        #[source]
        source: io::Error,
    },
    /// Failed to move a file to its category directory.
    #[error("Failed to move {} to {}: {source}", .file.display(), .destination.display())]
    FileMoveFailure {
        file: PathBuf,
        destination: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl OrganizeError {
    /// The file being processed when the error occurred, if any.
    pub fn file(&self) -> Option<&Path> {
        match self {
            Self::ListFailed { .. } => None,
            Self::DirectoryCreationFailed { file, .. } | Self::FileMoveFailure { file, .. } => {
                Some(file.as_path())
            }
        }
    }
}

/// Result type for file organization operations.
pub type OrganizeResult<T> = Result<T, OrganizeError>;

/// What happened to a single file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// The file was renamed into its category directory.
    Moved {
        file: PathBuf,
        destination: PathBuf,
        category: Category,
    },
    /// The file already lives in its category directory.
    AlreadyOrganized { file: PathBuf },
    /// Something already occupies the destination; the file was left in place.
    Conflict { file: PathBuf, existing: PathBuf },
}

impl Outcome {
    pub fn file(&self) -> &Path {
        match self {
            Self::Moved { file, .. }
            | Self::AlreadyOrganized { file }
            | Self::Conflict { file, .. } => file.as_path(),
        }
    }

    /// Severity used when the outcome is written to a run log.
    pub fn level(&self) -> Level {
        match self {
            Self::Conflict { .. } => Level::WARN,
            _ => Level::INFO,
        }
    }

    fn file_name(&self) -> String {
        self.file()
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Moved { destination, .. } => {
                let folder = destination.parent().unwrap_or(destination);
                write!(f, "Moved '{}' to '{}'.", self.file_name(), folder.display())
            }
            Self::AlreadyOrganized { .. } => write!(
                f,
                "Skipping '{}' as it is already in the correct folder.",
                self.file_name()
            ),
            Self::Conflict { existing, .. } => write!(
                f,
                "Conflict: '{}' already exists. Skipped '{}'.",
                existing.display(),
                self.file_name()
            ),
        }
    }
}

/// Everything one organizer call did, in processing order.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct OrganizeReport {
    pub outcomes: Vec<Outcome>,
    /// Category directories that did not exist before this call.
    pub created_dirs: Vec<PathBuf>,
}

impl OrganizeReport {
    pub fn moved_count(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| matches!(o, Outcome::Moved { .. }))
            .count()
    }

    pub fn skipped_count(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| matches!(o, Outcome::AlreadyOrganized { .. }))
            .count()
    }

    pub fn conflict_count(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| matches!(o, Outcome::Conflict { .. }))
            .count()
    }

    /// Number of moved files per category, sorted by category name.
    pub fn category_counts(&self) -> BTreeMap<String, usize> {
        let mut counts = BTreeMap::new();
        for outcome in &self.outcomes {
            if let Outcome::Moved { category, .. } = outcome {
                *counts.entry(category.to_string()).or_insert(0) += 1;
            }
        }
        counts
    }
}

/// Moves files into category subdirectories of a target directory.
pub struct FileOrganizer<'a> {
    fs: &'a dyn FileSystem,
}

impl<'a> FileOrganizer<'a> {
    pub fn new(fs: &'a dyn FileSystem) -> Self {
        Self { fs }
    }

    /// Organizes `files` into subdirectories of `target_dir`, in order.
    ///
    /// Each outcome is recorded on `log` as it happens. The target directory
    /// itself is not validated here.
    ///
    /// # Arguments
    ///
    /// * `files` - Files to organize, handled in order
    /// * `target_dir` - Directory that holds the category folders
    /// * `log` - Receives one record per outcome and any failure
    ///
    /// # Returns
    ///
    /// An [`OrganizeReport`] with one outcome per file and the category
    /// folders created along the way.
    ///
    /// # Errors
    ///
    /// Stops at the first directory creation or rename failure and returns
    /// it; files after the failing one are not touched. A source file that
    /// vanished since listing is such a failure, not a skip.
    ///
    /// # Examples
    ///
    /// ```
    /// use extsort::file_lister::list_files;
    /// use extsort::file_organizer::FileOrganizer;
    /// use extsort::file_system::MemoryFs;
    /// use extsort::run_log::NullRunLog;
    /// use std::path::Path;
    ///
    /// let fs = MemoryFs::new();
    /// fs.add_file("/inbox/doc.txt");
    ///
    /// let target = Path::new("/inbox");
    /// let files = list_files(&fs, target).unwrap();
    /// let report = FileOrganizer::new(&fs)
    ///     .organize_files(&files, target, &mut NullRunLog)
    ///     .unwrap();
    ///
    /// assert_eq!(report.moved_count(), 1);
    /// assert!(fs.is_file("/inbox/txt/doc.txt"));
    /// ```
    pub fn organize_files(
        &self,
        files: &[FileEntry],
        target_dir: &Path,
        log: &mut dyn RunLog,
    ) -> OrganizeResult<OrganizeReport> {
        let mut report = OrganizeReport::default();

        for file in files {
            match self.organize_file(file, target_dir, &mut report.created_dirs) {
                Ok(outcome) => {
                    tracing::debug!(file = %file.path().display(), ?outcome, "organized file");
                    log.outcome(&outcome);
                    report.outcomes.push(outcome);
                }
                Err(e) => {
                    log.error(&e.to_string());
                    return Err(e);
                }
            }
        }

        Ok(report)
    }

    fn organize_file(
        &self,
        file: &FileEntry,
        target_dir: &Path,
        created_dirs: &mut Vec<PathBuf>,
    ) -> OrganizeResult<Outcome> {
        let category = file.category();
        let category_path = target_dir.join(category.dir_name());

        if file.path().parent() == Some(category_path.as_path()) {
            return Ok(Outcome::AlreadyOrganized {
                file: file.path().to_path_buf(),
            });
        }

        let created = self.fs.ensure_dir(&category_path).map_err(|e| {
            OrganizeError::DirectoryCreationFailed {
                path: category_path.clone(),
                file: file.path().to_path_buf(),
                source: e,
            }
        })?;
        if created {
            created_dirs.push(category_path.clone());
        }

        let file_name = file
            .path()
            .file_name()
            .ok_or_else(|| OrganizeError::FileMoveFailure {
                file: file.path().to_path_buf(),
                destination: category_path.clone(),
                source: io::Error::new(io::ErrorKind::InvalidInput, "file has no name component"),
            })?;
        let destination = category_path.join(file_name);

        if self.fs.exists(&destination) {
            return Ok(Outcome::Conflict {
                file: file.path().to_path_buf(),
                existing: destination,
            });
        }

        self.fs
            .rename(file.path(), &destination)
            .map_err(|e| OrganizeError::FileMoveFailure {
                file: file.path().to_path_buf(),
                destination: destination.clone(),
                source: e,
            })?;

        Ok(Outcome::Moved {
            file: file.path().to_path_buf(),
            destination,
            category,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::file_lister::list_files;
    use crate::file_system::{DryRunFs, MemoryFs, RealFs};
    use crate::run_log::{MemoryRunLog, NullRunLog};
    use std::fs;
    use tempfile::TempDir;

    fn organize(fs: &dyn FileSystem, target: &Path) -> OrganizeResult<OrganizeReport> {
        let files = list_files(fs, target)?;
        FileOrganizer::new(fs).organize_files(&files, target, &mut NullRunLog)
    }

    #[test]
    fn test_moves_files_into_extension_folders() {
        let fs = MemoryFs::new();
        fs.add_file("/d/doc.txt");
        fs.add_file("/d/image.jpg");

        let report = organize(&fs, Path::new("/d")).expect("organize");

        assert!(fs.is_file("/d/txt/doc.txt"));
        assert!(fs.is_file("/d/jpg/image.jpg"));
        assert!(!fs.exists(Path::new("/d/doc.txt")));
        assert!(!fs.exists(Path::new("/d/image.jpg")));
        assert_eq!(report.moved_count(), 2);
        assert_eq!(
            report.created_dirs,
            vec![PathBuf::from("/d/txt"), PathBuf::from("/d/jpg")]
        );
    }

    #[test]
    fn test_extension_case_is_folded() {
        let fs = MemoryFs::new();
        fs.add_file("/d/Photo.JPG");
        fs.add_file("/d/other.jpg");

        let report = organize(&fs, Path::new("/d")).expect("organize");

        assert!(fs.is_file("/d/jpg/Photo.JPG"));
        assert!(fs.is_file("/d/jpg/other.jpg"));
        assert_eq!(report.created_dirs, vec![PathBuf::from("/d/jpg")]);
        assert_eq!(report.category_counts().get("jpg"), Some(&2));
    }

    #[test]
    fn test_file_without_extension() {
        let fs = MemoryFs::new();
        fs.add_file("/d/Makefile");

        organize(&fs, Path::new("/d")).expect("organize");

        assert!(fs.is_file("/d/no_extension/Makefile"));
    }

    #[test]
    fn test_second_run_is_a_no_op() {
        let fs = MemoryFs::new();
        fs.add_file("/d/a.txt");
        fs.add_file("/d/b");

        organize(&fs, Path::new("/d")).expect("first run");
        let report = organize(&fs, Path::new("/d")).expect("second run");

        assert!(report.outcomes.is_empty());
        assert!(report.created_dirs.is_empty());
        assert!(fs.is_file("/d/txt/a.txt"));
        assert!(fs.is_file("/d/no_extension/b"));
    }

    #[test]
    fn test_file_in_its_category_folder_is_skipped() {
        let fs = MemoryFs::new();
        fs.add_file("/d/txt/notes.txt");

        let files = vec![FileEntry::new("/d/txt/notes.txt")];
        let mut log = MemoryRunLog::new();
        let report = FileOrganizer::new(&fs)
            .organize_files(&files, Path::new("/d"), &mut log)
            .expect("organize");

        assert_eq!(
            report.outcomes,
            vec![Outcome::AlreadyOrganized {
                file: PathBuf::from("/d/txt/notes.txt"),
            }]
        );
        assert!(fs.is_file("/d/txt/notes.txt"));
        assert_eq!(
            log.messages_at(Level::INFO),
            vec!["Skipping 'notes.txt' as it is already in the correct folder."]
        );
    }

    #[test]
    fn test_conflict_leaves_both_files() {
        let fs = MemoryFs::new();
        fs.add_file("/d/conflict.txt");
        fs.add_file("/d/txt/conflict.txt");

        let mut log = MemoryRunLog::new();
        let files = list_files(&fs, Path::new("/d")).expect("list");
        let report = FileOrganizer::new(&fs)
            .organize_files(&files, Path::new("/d"), &mut log)
            .expect("organize");

        assert!(fs.is_file("/d/conflict.txt"));
        assert!(fs.is_file("/d/txt/conflict.txt"));
        assert_eq!(report.conflict_count(), 1);
        assert_eq!(report.moved_count(), 0);
        assert_eq!(
            log.messages_at(Level::WARN),
            vec!["Conflict: '/d/txt/conflict.txt' already exists. Skipped 'conflict.txt'."]
        );
    }

    #[test]
    fn test_conflict_with_directory_at_destination() {
        let fs = MemoryFs::new();
        fs.add_file("/d/data.csv");
        fs.add_dir("/d/csv/data.csv");

        let report = organize(&fs, Path::new("/d")).expect("organize");

        assert_eq!(report.conflict_count(), 1);
        assert!(fs.is_file("/d/data.csv"));
    }

    #[test]
    fn test_rename_failure_stops_the_run() {
        let fs = MemoryFs::new();
        fs.add_file("/d/a.txt");
        fs.add_file("/d/b.txt");
        fs.add_file("/d/c.txt");
        fs.fail_rename_of("/d/b.txt");

        let mut log = MemoryRunLog::new();
        let files = list_files(&fs, Path::new("/d")).expect("list");
        let err = FileOrganizer::new(&fs)
            .organize_files(&files, Path::new("/d"), &mut log)
            .unwrap_err();

        assert!(matches!(err, OrganizeError::FileMoveFailure { .. }));
        assert_eq!(err.file(), Some(Path::new("/d/b.txt")));
        assert!(fs.is_file("/d/txt/a.txt"));
        assert!(fs.is_file("/d/b.txt"));
        assert!(fs.is_file("/d/c.txt"));
        assert_eq!(log.messages_at(Level::ERROR).len(), 1);
    }

    #[test]
    fn test_vanished_file_is_an_error() {
        let fs = MemoryFs::new();
        fs.add_file("/d/gone.txt");
        let files = list_files(&fs, Path::new("/d")).expect("list");
        fs.remove("/d/gone.txt");

        let result = FileOrganizer::new(&fs).organize_files(&files, Path::new("/d"), &mut NullRunLog);

        assert!(matches!(result, Err(OrganizeError::FileMoveFailure { .. })));
    }

    #[test]
    fn test_file_blocking_category_folder_is_an_error() {
        let fs = MemoryFs::new();
        fs.add_file("/d/txt");
        fs.add_file("/d/a.txt");

        let files = vec![FileEntry::new("/d/a.txt")];
        let result = FileOrganizer::new(&fs).organize_files(&files, Path::new("/d"), &mut NullRunLog);

        assert!(matches!(
            result,
            Err(OrganizeError::DirectoryCreationFailed { .. })
        ));
        assert!(fs.is_file("/d/a.txt"));
    }

    #[test]
    fn test_moves_are_logged_in_order() {
        let fs = MemoryFs::new();
        fs.add_file("/d/a.md");
        fs.add_file("/d/b.rs");

        let mut log = MemoryRunLog::new();
        let files = list_files(&fs, Path::new("/d")).expect("list");
        FileOrganizer::new(&fs)
            .organize_files(&files, Path::new("/d"), &mut log)
            .expect("organize");

        assert_eq!(
            log.messages_at(Level::INFO),
            vec!["Moved 'a.md' to '/d/md'.", "Moved 'b.rs' to '/d/rs'."]
        );
    }

    #[test]
    fn test_dry_run_matches_real_run_without_mutation() {
        let fs = MemoryFs::new();
        fs.add_file("/d/a.txt");
        fs.add_file("/d/b.txt");
        fs.add_file("/d/c.png");
        fs.add_file("/d/png/c.png");

        let dry = DryRunFs::new(&fs);
        let preview = organize(&dry, Path::new("/d")).expect("dry run");

        assert!(fs.is_file("/d/a.txt"));
        assert!(!fs.exists(Path::new("/d/txt")));

        let report = organize(&fs, Path::new("/d")).expect("real run");
        assert_eq!(preview, report);
    }

    #[test]
    fn test_organize_real_directory() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let base_path = temp_dir.path();
        fs::write(base_path.join("doc.txt"), "text").expect("Failed to write file");
        fs::write(base_path.join("image.jpg"), "jpeg").expect("Failed to write file");

        let report = organize(&RealFs, base_path).expect("organize");

        assert_eq!(report.moved_count(), 2);
        assert!(base_path.join("txt").join("doc.txt").is_file());
        assert!(base_path.join("jpg").join("image.jpg").is_file());
        assert!(!base_path.join("doc.txt").exists());
        assert_eq!(
            fs::read_to_string(base_path.join("txt").join("doc.txt")).unwrap(),
            "text"
        );
    }
}

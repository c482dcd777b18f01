//! Enumeration of the files directly inside a directory.

use crate::file_category::FileEntry;
use crate::file_organizer::{OrganizeError, OrganizeResult};
use crate::file_system::FileSystem;
use std::path::Path;

/// Lists the regular files directly inside `directory`.
///
/// Subdirectories are skipped and never descended into. The order is
/// whatever the filesystem enumerates; an empty directory yields an empty
/// list. The caller is expected to have checked that `directory` is a
/// directory.
///
/// # Arguments
///
/// * `fs` - Filesystem to read from
/// * `directory` - Directory whose direct children are listed
///
/// # Returns
///
/// One [`FileEntry`] per regular file, or [`OrganizeError::ListFailed`] if
/// the directory cannot be read.
pub fn list_files(fs: &dyn FileSystem, directory: &Path) -> OrganizeResult<Vec<FileEntry>> {
    let items = fs
        .read_dir(directory)
        .map_err(|e| OrganizeError::ListFailed {
            path: directory.to_path_buf(),
            source: e,
        })?;

    let files: Vec<FileEntry> = items
        .into_iter()
        .filter(|item| item.is_file)
        .map(|item| FileEntry::new(item.path))
        .collect();

    tracing::debug!(directory = %directory.display(), count = files.len(), "listed files");
    Ok(files)
}

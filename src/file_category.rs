//! Extension-based file categorization.
//!
//! A file's category is its lowercase extension without the leading dot, or
//! [`NO_EXTENSION`] when the name carries none. The category is also the name
//! of the subdirectory the file is sorted into.
//!
//! # Examples
//!
//! ```
//! use extsort::file_category::Category;
//! use std::path::Path;
//!
//! assert_eq!(Category::of(Path::new("photo.JPG")).dir_name(), "jpg");
//! assert_eq!(Category::of(Path::new("archive.tar.gz")).dir_name(), "gz");
//! assert_eq!(Category::of(Path::new("Makefile")).dir_name(), "no_extension");
//! ```

use std::ffi::{OsStr, OsString};
use std::fmt;
use std::path::{Path, PathBuf};

/// Directory name used for files without an extension.
pub const NO_EXTENSION: &str = "no_extension";

/// The destination category of a file.
///
/// Held as an `OsString` so extensions that are not valid UTF-8 keep their
/// bytes and never collapse into one folder.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Category(OsString);

impl Category {
    /// Derives the category of a path from its file name.
    ///
    /// Dot-files such as `.bashrc` and names ending in a bare dot have no
    /// extension. UTF-8 extensions are lowercased with full Unicode rules;
    /// anything else only has its ASCII letters lowercased.
    ///
    /// # Arguments
    ///
    /// * `path` - Path or bare file name of the file to categorize
    pub fn of(path: &Path) -> Self {
        match path.extension() {
            Some(ext) if !ext.is_empty() => match ext.to_str() {
                Some(utf8) => Category(OsString::from(utf8.to_lowercase())),
                None => Category(ext.to_ascii_lowercase()),
            },
            _ => Category(OsString::from(NO_EXTENSION)),
        }
    }

    /// Returns the subdirectory name for this category.
    pub fn dir_name(&self) -> &OsStr {
        &self.0
    }

    /// Returns true for the sentinel category of extension-less files.
    pub fn is_no_extension(&self) -> bool {
        self.0 == NO_EXTENSION
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0.to_string_lossy())
    }
}

/// A regular file observed in a directory listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileEntry {
    path: PathBuf,
}

impl FileEntry {
    /// Wraps a path known to be a regular file at observation time.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The final path component, lossily converted for display.
    pub fn name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    }

    /// The raw extension, if any, with its original casing.
    pub fn extension(&self) -> Option<&OsStr> {
        self.path.extension()
    }

    pub fn category(&self) -> Category {
        Category::of(&self.path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extension_is_lowercased() {
        assert_eq!(Category::of(Path::new("REPORT.PDF")).dir_name(), "pdf");
        assert_eq!(Category::of(Path::new("Image.JpEg")).dir_name(), "jpeg");
    }

    #[test]
    fn test_only_last_extension_counts() {
        assert_eq!(Category::of(Path::new("backup.tar.gz")).dir_name(), "gz");
    }

    #[test]
    fn test_missing_extension_uses_sentinel() {
        let category = Category::of(Path::new("README"));
        assert_eq!(category.dir_name(), NO_EXTENSION);
        assert!(category.is_no_extension());
    }

    #[test]
    fn test_dotfile_has_no_extension() {
        assert!(Category::of(Path::new(".bashrc")).is_no_extension());
    }

    #[test]
    fn test_trailing_dot_has_no_extension() {
        assert!(Category::of(Path::new("notes.")).is_no_extension());
    }

    #[cfg(unix)]
    #[test]
    fn test_non_utf8_extensions_stay_distinct() {
        use std::os::unix::ffi::OsStrExt;

        let first = Category::of(Path::new(OsStr::from_bytes(b"a.\xffA")));
        let second = Category::of(Path::new(OsStr::from_bytes(b"b.\xfeA")));

        assert_ne!(first, second);
        assert_eq!(first.dir_name().as_bytes(), b"\xffa");
        assert_eq!(second.dir_name().as_bytes(), b"\xfea");
    }

    #[test]
    fn test_non_ascii_extension_is_lowercased() {
        assert_eq!(Category::of(Path::new("notes.ÄBC")).dir_name(), "äbc");
    }

    #[test]
    fn test_file_entry_accessors() {
        let entry = FileEntry::new("/data/inbox/Song.MP3");
        assert_eq!(entry.name(), "Song.MP3");
        assert_eq!(entry.extension(), Some(OsStr::new("MP3")));
        assert_eq!(entry.category().to_string(), "mp3");
        assert_eq!(entry.path(), Path::new("/data/inbox/Song.MP3"));
    }
}

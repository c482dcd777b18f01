//! Run configuration loaded from TOML.
//!
//! Configuration controls two things: whether and where the run log is
//! written, and which listed files are held back from organization.
//! Everything is optional; with no file at all the defaults organize every
//! listed file and keep logging off.
//!
//! # Configuration File Format
//!
//! ```toml
//! [logging]
//! enabled = true
//! directory = "/home/me/.local/state/extsort"
//!
//! [filters]
//! enable_hidden_files = false
//!
//! [filters.exclude]
//! filenames = ["Thumbs.db", ".DS_Store"]
//! patterns = ["~$*", "*.part"]
//! extensions = ["crdownload"]
//! ```

use glob::Pattern;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Name of the per-directory configuration file.
pub const CONFIG_FILE_NAME: &str = ".extsortrc.toml";

/// Errors that can occur during configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Configuration file not found at the specified path.
    #[error("Configuration file not found: {}", .0.display())]
    ConfigNotFound(PathBuf),
    /// Invalid TOML syntax or structure.
    #[error("Invalid configuration in {}: {reason}", .path.display())]
    ConfigInvalid { path: PathBuf, reason: String },
    /// Invalid glob pattern provided.
    #[error("Invalid glob pattern '{pattern}': {reason}")]
    InvalidGlobPattern { pattern: String, reason: String },
    /// IO error while reading configuration.
    #[error("IO error reading configuration {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OrganizerConfig {
    #[serde(default)]
    pub logging: LoggingSettings,
    #[serde(default)]
    pub filters: FilterRules,
}

/// Run log settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LoggingSettings {
    /// Write a run log file. Defaults to false.
    #[serde(default)]
    pub enabled: bool,
    /// Where log files go. Defaults to `<target>/logs`.
    #[serde(default)]
    pub directory: Option<PathBuf>,
}

/// Filter rules applied to listed files before organizing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterRules {
    /// Whether hidden files (starting with ".") are organized. Defaults to true.
    #[serde(default = "default_enable_hidden_files")]
    pub enable_hidden_files: bool,

    #[serde(default)]
    pub exclude: ExcludeRules,
}

fn default_enable_hidden_files() -> bool {
    true
}

impl Default for FilterRules {
    fn default() -> Self {
        Self {
            enable_hidden_files: default_enable_hidden_files(),
            exclude: ExcludeRules::default(),
        }
    }
}

/// Rules for holding files back from organization.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExcludeRules {
    /// Exact file names (e.g. "Thumbs.db").
    #[serde(default)]
    pub filenames: Vec<String>,

    /// Glob patterns matched against the file name (e.g. "*.part").
    #[serde(default)]
    pub patterns: Vec<String>,

    /// Extensions, compared case-insensitively, without the dot.
    #[serde(default)]
    pub extensions: Vec<String>,
}

impl OrganizerConfig {
    /// Load configuration from a file, or search standard locations.
    ///
    /// Search order:
    /// 1. Explicit path if provided
    /// 2. `./.extsortrc.toml` in the current directory
    /// 3. `~/.config/extsort/config.toml`
    /// 4. Built-in defaults
    ///
    /// # Errors
    ///
    /// An explicit path that does not exist is an error; missing files in the
    /// search locations are not.
    pub fn load(config_path: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(path) = config_path {
            return Self::load_from_file(path);
        }

        let local_config = PathBuf::from(CONFIG_FILE_NAME);
        if local_config.is_file() {
            return Self::load_from_file(&local_config);
        }

        if let Ok(home) = std::env::var("HOME") {
            let home_config = PathBuf::from(home)
                .join(".config")
                .join("extsort")
                .join("config.toml");
            if home_config.is_file() {
                return Self::load_from_file(&home_config);
            }
        }

        Ok(Self::default())
    }

    fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::ConfigNotFound(path.to_path_buf()));
        }

        let content = fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;

        Self::parse(&content).map_err(|e| match e {
            ConfigError::ConfigInvalid { reason, .. } => ConfigError::ConfigInvalid {
                path: path.to_path_buf(),
                reason,
            },
            other => other,
        })
    }

    /// Parses configuration from TOML text.
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|e| ConfigError::ConfigInvalid {
            path: PathBuf::new(),
            reason: e.to_string(),
        })
    }

    /// Compile the filter rules for matching.
    ///
    /// # Errors
    ///
    /// Returns an error if any glob pattern is invalid.
    pub fn compile_filters(&self) -> Result<CompiledFilters, ConfigError> {
        CompiledFilters::new(&self.filters)
    }
}

/// Filter rules with patterns compiled and extensions lowercased.
#[derive(Debug, Clone)]
pub struct CompiledFilters {
    enable_hidden_files: bool,
    exclude_filenames: HashSet<String>,
    exclude_extensions: HashSet<String>,
    exclude_patterns: Vec<Pattern>,
}

impl CompiledFilters {
    fn new(rules: &FilterRules) -> Result<Self, ConfigError> {
        let exclude_patterns = rules
            .exclude
            .patterns
            .iter()
            .map(|pattern| {
                Pattern::new(pattern).map_err(|e| ConfigError::InvalidGlobPattern {
                    pattern: pattern.clone(),
                    reason: e.msg.to_string(),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            enable_hidden_files: rules.enable_hidden_files,
            exclude_filenames: rules.exclude.filenames.iter().cloned().collect(),
            exclude_extensions: rules
                .exclude
                .extensions
                .iter()
                .map(|ext| ext.trim_start_matches('.').to_lowercase())
                .collect(),
            exclude_patterns,
        })
    }

    /// Check if a file should be organized.
    ///
    /// The tool's own config file is never organized. Then, with early
    /// termination: hidden files (if disabled), exact names, extensions and
    /// glob patterns exclude; anything else is included.
    pub fn should_include(&self, file_path: &Path) -> bool {
        let file_name = file_path
            .file_name()
            .map(|n| n.to_string_lossy())
            .unwrap_or_default();

        if file_name == CONFIG_FILE_NAME {
            return false;
        }

        if !self.enable_hidden_files && file_name.starts_with('.') {
            return false;
        }

        if self.exclude_filenames.contains(file_name.as_ref()) {
            return false;
        }

        if let Some(ext) = file_path.extension() {
            let ext_lower = ext.to_string_lossy().to_lowercase();
            if self.exclude_extensions.contains(&ext_lower) {
                return false;
            }
        }

        !self
            .exclude_patterns
            .iter()
            .any(|pattern| pattern.matches(&file_name))
    }
}

impl Default for CompiledFilters {
    fn default() -> Self {
        Self {
            enable_hidden_files: true,
            exclude_filenames: HashSet::new(),
            exclude_extensions: HashSet::new(),
            exclude_patterns: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn filters(toml: &str) -> CompiledFilters {
        OrganizerConfig::parse(toml)
            .expect("valid config")
            .compile_filters()
            .expect("valid filters")
    }

    #[test]
    fn test_default_config() {
        let config = OrganizerConfig::default();
        assert!(!config.logging.enabled);
        assert!(config.logging.directory.is_none());
        assert!(config.filters.enable_hidden_files);
    }

    #[test]
    fn test_empty_toml_equals_default() {
        let config = OrganizerConfig::parse("").expect("empty config");
        assert_eq!(config, OrganizerConfig::default());
    }

    #[test]
    fn test_default_filters_include_everything_but_config() {
        let compiled = OrganizerConfig::default().compile_filters().unwrap();

        assert!(compiled.should_include(Path::new("/d/.bashrc")));
        assert!(compiled.should_include(Path::new("/d/Makefile")));
        assert!(!compiled.should_include(Path::new("/d/.extsortrc.toml")));
    }

    #[test]
    fn test_parse_logging_section() {
        let config = OrganizerConfig::parse(
            r#"
            [logging]
            enabled = true
            directory = "/tmp/extsort-logs"
            "#,
        )
        .unwrap();

        assert!(config.logging.enabled);
        assert_eq!(
            config.logging.directory,
            Some(PathBuf::from("/tmp/extsort-logs"))
        );
    }

    #[test]
    fn test_hidden_files_can_be_excluded() {
        let compiled = filters("[filters]\nenable_hidden_files = false\n");

        assert!(!compiled.should_include(Path::new(".DS_Store")));
        assert!(compiled.should_include(Path::new("photo.png")));
    }

    #[test]
    fn test_exclude_filenames_extensions_and_patterns() {
        let compiled = filters(
            r#"
            [filters.exclude]
            filenames = ["Thumbs.db"]
            extensions = [".PART", "tmp"]
            patterns = ["~$*"]
            "#,
        );

        assert!(!compiled.should_include(Path::new("/d/Thumbs.db")));
        assert!(!compiled.should_include(Path::new("/d/movie.part")));
        assert!(!compiled.should_include(Path::new("/d/scratch.TMP")));
        assert!(!compiled.should_include(Path::new("/d/~$report.docx")));
        assert!(compiled.should_include(Path::new("/d/report.docx")));
    }

    #[test]
    fn test_invalid_glob_pattern() {
        let config = OrganizerConfig::parse("[filters.exclude]\npatterns = [\"[\"]\n").unwrap();
        let result = config.compile_filters();
        assert!(matches!(
            result,
            Err(ConfigError::InvalidGlobPattern { .. })
        ));
    }

    #[test]
    fn test_invalid_toml() {
        let result = OrganizerConfig::parse("[logging\nenabled = true");
        assert!(matches!(result, Err(ConfigError::ConfigInvalid { .. })));
    }

    #[test]
    fn test_load_explicit_file() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let path = temp_dir.path().join("config.toml");
        fs::write(&path, "[logging]\nenabled = true\n").expect("Failed to write config");

        let config = OrganizerConfig::load(Some(&path)).expect("load");
        assert!(config.logging.enabled);
    }

    #[test]
    fn test_load_missing_explicit_file() {
        let result = OrganizerConfig::load(Some(Path::new("/no/such/extsort.toml")));
        assert!(matches!(result, Err(ConfigError::ConfigNotFound(_))));
    }
}

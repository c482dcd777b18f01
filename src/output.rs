//! Output formatting and styling module.
//!
//! Every line the CLI shows goes through [`OutputFormatter`], so styling is
//! decided in one place.

use crate::file_organizer::Outcome;
use colored::*;
use indicatif::{ProgressBar, ProgressStyle};
use std::collections::BTreeMap;

/// Manages all CLI output with consistent styling and formatting.
///
/// - Success messages (green with ✓)
/// - Error messages (red with ✗, on stderr)
/// - Warning messages (yellow with ⚠)
/// - Info messages (cyan)
/// - Progress bars and summary tables
pub struct OutputFormatter;

impl OutputFormatter {
    /// Prints a success message in green with a checkmark.
    ///
    /// # Arguments
    ///
    /// * `message` - The message to display
    pub fn success(message: &str) {
        println!("{} {}", "✓".green(), message);
    }

    /// Prints an error message in red with an X mark.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use extsort::output::OutputFormatter;
    /// OutputFormatter::error("Failed to move report.pdf");
    /// ```
    pub fn error(message: &str) {
        eprintln!("{} {}", "✗".red(), message);
    }

    /// Prints a warning message in yellow with a warning symbol.
    pub fn warning(message: &str) {
        println!("{} {}", "⚠".yellow(), message);
    }

    /// Prints an info message in cyan.
    pub fn info(message: &str) {
        println!("{}", message.cyan());
    }

    /// Prints a regular message without styling.
    pub fn plain(message: &str) {
        println!("{}", message);
    }

    /// Prints a section header.
    pub fn header(header: &str) {
        println!("\n{}", header.bold());
    }

    /// Prints one organizer outcome, styled by kind.
    ///
    /// # Arguments
    ///
    /// * `outcome` - The outcome to print
    /// * `dry_run` - Print it as a dry-run notice instead
    pub fn outcome(outcome: &Outcome, dry_run: bool) {
        let message = outcome.to_string();
        if dry_run {
            Self::dry_run_notice(&message);
            return;
        }
        match outcome {
            Outcome::Moved { .. } => Self::success(&message),
            Outcome::AlreadyOrganized { .. } => Self::info(&message),
            Outcome::Conflict { .. } => Self::warning(&message),
        }
    }

    /// Creates and returns a progress bar for file operations.
    ///
    /// # Arguments
    ///
    /// * `total` - Number of steps the bar counts to
    ///
    /// # Returns
    ///
    /// A styled [`ProgressBar`]; falls back to the default style if the
    /// template is rejected.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use extsort::output::OutputFormatter;
    /// let pb = OutputFormatter::create_progress_bar(100);
    /// pb.inc(1);
    /// pb.finish_and_clear();
    /// ```
    pub fn create_progress_bar(total: u64) -> ProgressBar {
        let pb = ProgressBar::new(total);
        let style = ProgressStyle::default_bar()
            .template("{spinner:.cyan} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("█▓░");
        pb.set_style(style);
        pb
    }

    /// Prints a summary table of moved files per category.
    ///
    /// # Arguments
    ///
    /// * `category_counts` - Moved files per category name
    /// * `total_files` - Count shown on the total row
    ///
    /// # Example
    ///
    /// ```no_run
    /// use extsort::output::OutputFormatter;
    /// use std::collections::BTreeMap;
    ///
    /// let mut counts = BTreeMap::new();
    /// counts.insert("pdf".to_string(), 15);
    /// counts.insert("jpg".to_string(), 8);
    /// OutputFormatter::summary_table(&counts, 23);
    /// ```
    pub fn summary_table(category_counts: &BTreeMap<String, usize>, total_files: usize) {
        Self::header("SUMMARY");

        let max_category_len = category_counts
            .keys()
            .map(String::len)
            .max()
            .unwrap_or(0)
            .max(8); // At least "Category" width

        println!(
            "{:<width$} | {}",
            "Category".bold(),
            "Files".bold(),
            width = max_category_len
        );
        println!("{}", "-".repeat(max_category_len + 10));

        for (category, count) in category_counts {
            println!(
                "{:<width$} | {} {}",
                category,
                count.to_string().green(),
                Self::file_word(*count),
                width = max_category_len
            );
        }

        println!("{}", "-".repeat(max_category_len + 10));
        println!(
            "{:<width$} | {} {}",
            "Total".bold(),
            total_files.to_string().green().bold(),
            Self::file_word(total_files),
            width = max_category_len
        );
    }

    /// Prints a dry-run notice message, prefixed with `[DRY RUN]`.
    ///
    /// # Arguments
    ///
    /// * `message` - The message to display
    pub fn dry_run_notice(message: &str) {
        println!("{}", format!("[DRY RUN] {}", message).yellow());
    }

    fn file_word(count: usize) -> &'static str {
        if count == 1 { "file" } else { "files" }
    }
}

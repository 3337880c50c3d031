//! Console output and styling.
//!
//! All user-facing printing goes through [`OutputFormatter`] so colors and
//! layout stay consistent. Diagnostics go through `tracing` instead.

use crate::file_category::Category;
use crate::report::SortReport;
use colored::*;
use indicatif::{ProgressBar, ProgressStyle};
use std::collections::BTreeSet;
use std::path::Path;
use std::time::Duration;

/// Manages all CLI output with consistent styling and formatting.
pub struct OutputFormatter;

impl OutputFormatter {
    /// Prints a success message in green with a checkmark.
    pub fn success(message: &str) {
        println!("{} {}", "✓".green(), message);
    }

    /// Prints an error message in red with an X mark.
    pub fn error(message: &str) {
        eprintln!("{} {}", "✗".red(), message);
    }

    /// Prints a warning message in yellow with a warning symbol.
    pub fn warning(message: &str) {
        println!("{} {}", "⚠".yellow(), message);
    }

    /// Prints a section header.
    pub fn header(header: &str) {
        println!("\n{}", header.bold());
    }

    /// Creates a spinner that counts handled entries.
    ///
    /// The spinner draws to stderr and hides itself when stderr is not a
    /// terminal.
    pub fn create_spinner() -> ProgressBar {
        let spinner = ProgressBar::new_spinner();
        if let Ok(style) =
            ProgressStyle::default_spinner().template("{spinner:.cyan} {pos} entries sorted {msg}")
        {
            spinner.set_style(style);
        }
        spinner.enable_steady_tick(Duration::from_millis(100));
        spinner
    }

    /// Prints the full run report: files per category, then the known and
    /// unknown extensions encountered.
    pub fn print_report(report: &SortReport) {
        Self::header("FILES BY CATEGORY");
        for category in Category::ALL {
            let files = report.files_in(category);
            println!(
                "{} ({})",
                category.description().bold(),
                files.len().to_string().green()
            );
            for file in files {
                println!("  - {}", Self::relative(&report.root, file));
            }
        }

        Self::header("KNOWN EXTENSIONS");
        println!("  {}", Self::join(&report.known_extensions));

        Self::header("UNKNOWN EXTENSIONS");
        println!("  {}", Self::join(&report.unknown_extensions));

        if !report.discarded_archives.is_empty() {
            Self::header("DISCARDED ARCHIVES");
            for archive in &report.discarded_archives {
                Self::warning(&Self::relative(&report.root, archive));
            }
        }

        Self::header("SUMMARY");
        println!("  Placed:  {}", report.total_placed().to_string().green().bold());
        println!("  Renamed: {}", report.renamed.len());
        println!("  Pruned:  {} empty directories", report.pruned_dirs.len());
    }

    fn relative(root: &Path, path: &Path) -> String {
        path.strip_prefix(root)
            .unwrap_or(path)
            .display()
            .to_string()
    }

    fn join(extensions: &BTreeSet<String>) -> String {
        if extensions.is_empty() {
            "(none)".dimmed().to_string()
        } else {
            extensions.iter().cloned().collect::<Vec<_>>().join(", ")
        }
    }
}

//! Command-line interface for desksort.
//!
//! Parses arguments and drives one full run:
//! - configuration loading and filter compilation
//! - category folder setup
//! - the recursive sort
//! - pruning of emptied directories
//! - reporting

use crate::config::{CompiledFilters, ConfigError, SortConfig};
use crate::file_category::CategoryRegistry;
use crate::file_organizer::{OrganizeError, Organizer};
use crate::output::OutputFormatter;
use crate::prune::prune_empty_dirs;
use crate::report::SortReport;
use clap::Parser;
use std::path::PathBuf;
use thiserror::Error;
use tracing::info;

/// Sort a cluttered folder into images, video, documents, audio, archives and other.
#[derive(Debug, Clone, Parser)]
#[command(name = "desksort", version, about)]
pub struct Cli {
    /// Directory to sort.
    pub root: PathBuf,

    /// Configuration file (defaults to .desksortrc.toml, then ~/.config/desksort/config.toml).
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Also write the run report as JSON to this file.
    #[arg(short, long, value_name = "FILE")]
    pub report: Option<PathBuf>,

    /// Do not print the report to the console.
    #[arg(short, long)]
    pub quiet: bool,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace).
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

impl Cli {
    /// Default log filter for the chosen verbosity.
    pub fn log_level(&self) -> &'static str {
        match self.verbose {
            0 => "warn",
            1 => "info",
            2 => "debug",
            _ => "trace",
        }
    }
}

/// Anything that stops a run.
#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Organize(#[from] OrganizeError),
}

/// Runs a full sort of `cli.root` and returns what happened.
///
/// # Examples
///
/// ```no_run
/// use clap::Parser;
/// use desksort::cli::{Cli, run};
///
/// let cli = Cli::parse_from(["desksort", "/path/to/Desktop/Unsorted"]);
/// match run(&cli) {
///     Ok(report) => println!("Sorted {} files", report.total_placed()),
///     Err(e) => eprintln!("Error: {}", e),
/// }
/// ```
pub fn run(cli: &Cli) -> Result<SortReport, CliError> {
    let (config, config_source) = SortConfig::load(cli.config.as_deref())?;
    let mut filters = CompiledFilters::new(&config.filters)?;
    if let Some(path) = &config_source {
        filters.protect(path);
    }
    if let Some(path) = &cli.report {
        filters.protect(path);
    }

    let registry = CategoryRegistry::initialize_with(&cli.root, &config.categories)?;
    let root = registry.root().to_path_buf();
    info!(root = %root.display(), "sorting");

    let mut report = SortReport::new(root.clone());
    let mut organizer = Organizer::new(&registry, &filters);
    let spinner = (!cli.quiet).then(OutputFormatter::create_spinner);
    if let Some(spinner) = &spinner {
        organizer = organizer.with_progress(spinner.clone());
    }

    organizer.walk(&root, &mut report)?;
    if let Some(spinner) = &spinner {
        spinner.finish_and_clear();
    }
    info!(placed = report.total_placed(), "sort finished");

    report.pruned_dirs = prune_empty_dirs(&root)?;
    info!(pruned = report.pruned_dirs.len(), "pruned empty directories");

    if let Some(path) = &cli.report {
        report.save(path)?;
    }

    if !cli.quiet {
        OutputFormatter::print_report(&report);
        if let Some(path) = &cli.report {
            OutputFormatter::success(&format!("Report saved to {}", path.display()));
        }
    }

    Ok(report)
}

//! desksort - sort a cluttered folder by file extension
//!
//! This library walks a directory tree, renames every file to a safe
//! transliterated form, moves it into one of six category folders, unpacks
//! archives into the archives folder and finally removes directories left
//! empty.

pub mod archive;
pub mod cli;
pub mod config;
pub mod file_category;
pub mod file_organizer;
pub mod normalize;
pub mod output;
pub mod prune;
pub mod report;

pub use archive::ArchiveExpander;
pub use config::{CompiledFilters, ConfigError, SortConfig};
pub use file_category::{ArchiveFormat, Category, CategoryRegistry};
pub use file_organizer::{FileOperation, OrganizeError, Organizer};
pub use normalize::normalize;
pub use prune::prune_empty_dirs;
pub use report::SortReport;

pub use cli::{Cli, CliError, run};

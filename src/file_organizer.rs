/// Recursive sorting of a directory tree into category folders.
///
/// The [`Organizer`] walks every directory under the root, skipping the
/// category folders themselves. Plain files are renamed to their normalized
/// form and moved into the folder for their extension; archives are handed to
/// the [`ArchiveExpander`].
use crate::archive::ArchiveExpander;
use crate::config::CompiledFilters;
use crate::file_category::{ArchiveFormat, CategoryRegistry};
use crate::normalize::{extension_of, normalize};
use crate::report::SortReport;
use indicatif::ProgressBar;
use std::ffi::OsStr;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, trace};

/// The filesystem operation that was being attempted when an error occurred.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileOperation {
    List,
    Inspect,
    CreateDir,
    Rename,
    Move,
    Remove,
    RemoveDir,
    WriteReport,
}

impl fmt::Display for FileOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::List => "list",
            Self::Inspect => "inspect",
            Self::CreateDir => "create directory",
            Self::Rename => "rename",
            Self::Move => "move",
            Self::Remove => "remove",
            Self::RemoveDir => "remove directory",
            Self::WriteReport => "write report",
        };
        f.write_str(name)
    }
}

/// Errors that abort a sorting run.
#[derive(Debug, Error)]
pub enum OrganizeError {
    /// The root directory is missing or not a directory.
    #[error("Invalid root directory {}: {source}", path.display())]
    InvalidRoot {
        path: PathBuf,
        source: std::io::Error,
    },
    /// A filesystem call failed.
    #[error("Failed to {operation} {}: {source}", path.display())]
    Io {
        operation: FileOperation,
        path: PathBuf,
        source: std::io::Error,
    },
    /// The destination name is already taken. Nothing is overwritten.
    #[error("Cannot {operation} {}: {} already exists", path.display(), target.display())]
    NameCollision {
        operation: FileOperation,
        path: PathBuf,
        target: PathBuf,
    },
}

impl OrganizeError {
    pub(crate) fn io(operation: FileOperation, path: &Path) -> impl FnOnce(std::io::Error) -> Self {
        let path = path.to_path_buf();
        move |source| Self::Io {
            operation,
            path,
            source,
        }
    }
}

/// Result type for sorting operations.
pub type OrganizeResult<T> = Result<T, OrganizeError>;

/// Walks a tree and sorts everything it finds.
///
/// Holds only shared references to the registry and filters; all per-run
/// state goes into the [`SortReport`] passed to [`Organizer::walk`].
pub struct Organizer<'a> {
    registry: &'a CategoryRegistry,
    filters: &'a CompiledFilters,
    progress: Option<ProgressBar>,
}

impl<'a> Organizer<'a> {
    pub fn new(registry: &'a CategoryRegistry, filters: &'a CompiledFilters) -> Self {
        Self {
            registry,
            filters,
            progress: None,
        }
    }

    /// Ticks `progress` once for every entry handled.
    pub fn with_progress(mut self, progress: ProgressBar) -> Self {
        self.progress = Some(progress);
        self
    }

    /// Sorts every entry directly inside `directory`, recursing into
    /// subdirectories.
    ///
    /// Children are processed in filename order. Category folders are
    /// skipped, as are files rejected by the filters. The first I/O error or
    /// name collision aborts the walk.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use desksort::config::CompiledFilters;
    /// use desksort::file_category::CategoryRegistry;
    /// use desksort::file_organizer::Organizer;
    /// use desksort::report::SortReport;
    /// use std::path::Path;
    ///
    /// let registry = CategoryRegistry::initialize(Path::new("/path/to/Desktop/Unsorted"))?;
    /// let filters = CompiledFilters::default();
    /// let mut report = SortReport::new(registry.root().to_path_buf());
    /// Organizer::new(&registry, &filters).walk(registry.root(), &mut report)?;
    /// # Ok::<(), desksort::file_organizer::OrganizeError>(())
    /// ```
    pub fn walk(&self, directory: &Path, report: &mut SortReport) -> OrganizeResult<()> {
        trace!(dir = %directory.display(), "scanning");

        let mut entries = fs::read_dir(directory)
            .map_err(OrganizeError::io(FileOperation::List, directory))?
            .collect::<Result<Vec<_>, _>>()
            .map_err(OrganizeError::io(FileOperation::List, directory))?;
        entries.sort_by_key(|entry| entry.file_name());

        for entry in entries {
            let full_path = entry.path();

            if self.registry.is_restricted(&full_path) {
                continue;
            }

            let file_type = entry
                .file_type()
                .map_err(OrganizeError::io(FileOperation::Inspect, &full_path))?;

            if file_type.is_dir() {
                self.walk(&full_path, report)?;
                continue;
            }

            if !self.filters.should_include(&full_path) {
                debug!(path = %full_path.display(), "excluded by filters");
                continue;
            }

            let file_name = entry.file_name();
            let lossy_name = file_name.to_string_lossy();

            if let Some(format) = ArchiveFormat::from_extension(extension_of(&lossy_name)) {
                ArchiveExpander::new(self.registry).handle_archive(format, &full_path, report)?;
            } else {
                self.handle_regular_file(&file_name, directory, report)?;
            }

            if let Some(progress) = &self.progress {
                progress.inc(1);
            }
        }

        Ok(())
    }

    /// Renames `filename` inside `containing_dir` to its normalized form, then
    /// moves it into the category folder for its extension.
    ///
    /// Returns the file's final path. A name that is not valid UTF-8 is
    /// converted lossily to build the new name; the file on disk is still
    /// found by its original bytes.
    ///
    /// # Errors
    ///
    /// Returns `OrganizeError::NameCollision` if either the renamed file or the
    /// moved file would replace an existing one.
    pub fn handle_regular_file(
        &self,
        filename: &OsStr,
        containing_dir: &Path,
        report: &mut SortReport,
    ) -> OrganizeResult<PathBuf> {
        let normalized = normalize(&filename.to_string_lossy());
        let original_path = containing_dir.join(filename);
        let renamed_path = containing_dir.join(&normalized);

        if filename != normalized.as_str() {
            rename_checked(FileOperation::Rename, &original_path, &renamed_path)?;
            debug!(from = %filename.to_string_lossy(), to = %normalized, "renamed");
            report.record_rename(original_path, renamed_path.clone());
        }

        let ext = extension_of(&normalized);
        let category = self.registry.category_for(ext);
        let destination = self.registry.destination_for(ext).join(&normalized);

        rename_checked(FileOperation::Move, &renamed_path, &destination)?;
        debug!(
            file = %normalized,
            category = category.dir_name(),
            "moved"
        );

        report.record_extension(ext, self.registry.is_known(ext));
        report.record_placed(category, destination.clone());

        Ok(destination)
    }
}

/// Renames `from` to `to`, refusing to replace an existing entry.
fn rename_checked(operation: FileOperation, from: &Path, to: &Path) -> OrganizeResult<()> {
    if fs::symlink_metadata(to).is_ok() {
        return Err(OrganizeError::NameCollision {
            operation,
            path: from.to_path_buf(),
            target: to.to_path_buf(),
        });
    }

    fs::rename(from, to).map_err(OrganizeError::io(operation, from))
}

//! Summary of a sorting run.
//!
//! Collects where every file ended up and which extensions were seen, so the
//! result can be printed to the console or saved as JSON.

use crate::file_category::Category;
use crate::file_organizer::{FileOperation, OrganizeError, OrganizeResult};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::{Path, PathBuf};

/// A file renamed during normalization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Rename {
    pub from: PathBuf,
    pub to: PathBuf,
}

/// Everything a run did, for display and for the JSON report.
#[derive(Debug, Clone, Serialize)]
pub struct SortReport {
    /// The directory that was sorted.
    pub root: PathBuf,
    /// RFC 3339 timestamp of when the run started.
    pub generated_at: String,
    /// Final location of each file, per category. Archives list every file
    /// unpacked from them.
    pub placed: BTreeMap<Category, Vec<PathBuf>>,
    /// Uppercased extensions that matched a category.
    pub known_extensions: BTreeSet<String>,
    /// Uppercased extensions that fell through to `other`.
    pub unknown_extensions: BTreeSet<String>,
    pub renamed: Vec<Rename>,
    /// Archives that could not be unpacked and were deleted.
    pub discarded_archives: Vec<PathBuf>,
    /// Directories removed by the pruning pass.
    pub pruned_dirs: Vec<PathBuf>,
}

impl SortReport {
    pub fn new(root: PathBuf) -> Self {
        Self {
            root,
            generated_at: chrono::Utc::now().to_rfc3339(),
            placed: BTreeMap::new(),
            known_extensions: BTreeSet::new(),
            unknown_extensions: BTreeSet::new(),
            renamed: Vec::new(),
            discarded_archives: Vec::new(),
            pruned_dirs: Vec::new(),
        }
    }

    /// Records a file (or extracted archive folder) placed in a category.
    pub fn record_placed(&mut self, category: Category, path: PathBuf) {
        self.placed.entry(category).or_default().push(path);
    }

    /// Records an extension as seen. Empty extensions are ignored.
    pub fn record_extension(&mut self, ext: &str, known: bool) {
        if ext.is_empty() {
            return;
        }
        let ext = ext.to_uppercase();
        if known {
            self.known_extensions.insert(ext);
        } else {
            self.unknown_extensions.insert(ext);
        }
    }

    pub fn record_rename(&mut self, from: PathBuf, to: PathBuf) {
        self.renamed.push(Rename { from, to });
    }

    pub fn record_discarded(&mut self, archive: PathBuf) {
        self.discarded_archives.push(archive);
    }

    /// Files placed in a category, empty if none.
    pub fn files_in(&self, category: Category) -> &[PathBuf] {
        self.placed.get(&category).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Total number of entries placed across all categories.
    pub fn total_placed(&self) -> usize {
        self.placed.values().map(Vec::len).sum()
    }

    /// Writes the report as pretty-printed JSON.
    pub fn save(&self, path: &Path) -> OrganizeResult<()> {
        let json = serde_json::to_string_pretty(self).map_err(|e| OrganizeError::Io {
            operation: FileOperation::WriteReport,
            path: path.to_path_buf(),
            source: std::io::Error::new(std::io::ErrorKind::InvalidData, e),
        })?;

        fs::write(path, json).map_err(|e| OrganizeError::Io {
            operation: FileOperation::WriteReport,
            path: path.to_path_buf(),
            source: e,
        })
    }
}

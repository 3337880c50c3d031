//! Removal of directories left empty after sorting.

use crate::file_organizer::{FileOperation, OrganizeError, OrganizeResult};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;
use walkdir::WalkDir;

/// Removes every directory under `root` that holds no files and no
/// surviving subdirectories.
///
/// Directories are visited children-first, so a folder whose only contents
/// were empty folders is removed in the same pass. `root` itself is kept.
/// Category folders get no special treatment. Symlinks are never followed;
/// a symlink counts as a file.
///
/// Returns the removed directories in the order they were deleted.
pub fn prune_empty_dirs(root: &Path) -> OrganizeResult<Vec<PathBuf>> {
    let mut deleted: HashSet<PathBuf> = HashSet::new();
    let mut removed = Vec::new();

    for entry in WalkDir::new(root)
        .min_depth(1)
        .follow_links(false)
        .contents_first(true)
    {
        let entry = entry.map_err(|e| {
            let path = e.path().unwrap_or(root).to_path_buf();
            OrganizeError::Io {
                operation: FileOperation::List,
                path,
                source: e.into(),
            }
        })?;

        if !entry.file_type().is_dir() {
            continue;
        }

        let dir = entry.path();
        if has_surviving_entries(dir, &deleted)? {
            continue;
        }

        fs::remove_dir(dir).map_err(OrganizeError::io(FileOperation::RemoveDir, dir))?;
        debug!(dir = %dir.display(), "pruned empty directory");
        deleted.insert(dir.to_path_buf());
        removed.push(dir.to_path_buf());
    }

    Ok(removed)
}

/// True if `dir` still contains a file, or a subdirectory not yet deleted.
fn has_surviving_entries(dir: &Path, deleted: &HashSet<PathBuf>) -> OrganizeResult<bool> {
    for child in fs::read_dir(dir).map_err(OrganizeError::io(FileOperation::List, dir))? {
        let child = child.map_err(OrganizeError::io(FileOperation::List, dir))?;
        let file_type = child
            .file_type()
            .map_err(OrganizeError::io(FileOperation::Inspect, &child.path()))?;

        if !file_type.is_dir() || !deleted.contains(&child.path()) {
            return Ok(true);
        }
    }
    Ok(false)
}

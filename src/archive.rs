//! Archive expansion into the `archives` category.
//!
//! An archive found during the walk is unpacked into
//! `archives/<normalized name without extension>/` and then deleted. A broken
//! archive is deleted as well; its partial output is cleaned up and the run
//! carries on. An archive whose folder name is already taken is left alone
//! and aborts the run, the same as a file name collision.

use crate::file_category::{ArchiveFormat, Category, CategoryRegistry};
use crate::file_organizer::{FileOperation, OrganizeError, OrganizeResult};
use crate::normalize::{extension_of, normalize};
use crate::report::SortReport;
use flate2::read::MultiGzDecoder;
use std::fs::{self, File};
use std::io::{self, BufReader, Cursor, Read};
use std::path::{Component, Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

/// Size of a tar header block, and offset and value of its magic field.
const TAR_BLOCK_SIZE: u64 = 512;
const USTAR_MAGIC_OFFSET: usize = 257;
const USTAR_MAGIC: &[u8] = b"ustar";

/// Why an archive could not be unpacked.
#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("zip error: {0}")]
    Zip(#[from] zip::result::ZipError),
}

/// Unpacks archives into the archives category folder.
pub struct ArchiveExpander<'a> {
    registry: &'a CategoryRegistry,
}

impl<'a> ArchiveExpander<'a> {
    pub fn new(registry: &'a CategoryRegistry) -> Self {
        Self { registry }
    }

    /// Expands the archive at `full_path`, then deletes it.
    ///
    /// Every extracted file is recorded under [`Category::Archives`]. Returns
    /// the extraction folder, or `None` if the archive was broken and only
    /// deleted.
    ///
    /// # Errors
    ///
    /// Returns `OrganizeError::NameCollision` if the extraction folder already
    /// exists; the archive is then kept. Extraction failures are not errors.
    /// Only failing to clean up a partial extraction or to delete the archive
    /// aborts the run otherwise.
    pub fn handle_archive(
        &self,
        format: ArchiveFormat,
        full_path: &Path,
        report: &mut SortReport,
    ) -> OrganizeResult<Option<PathBuf>> {
        let file_name = full_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let folder_name = archive_folder_name(&file_name, format);
        let target = self
            .registry
            .category_dir(Category::Archives)
            .join(&folder_name);

        if fs::symlink_metadata(&target).is_ok() {
            return Err(OrganizeError::NameCollision {
                operation: FileOperation::Move,
                path: full_path.to_path_buf(),
                target,
            });
        }

        let extracted = match extract(format, full_path, &target, &folder_name) {
            Ok(()) => {
                info!(
                    archive = %full_path.display(),
                    target = %target.display(),
                    "expanded archive"
                );
                let ext = extension_of(&file_name);
                report.record_extension(ext, self.registry.is_known(ext));
                for file in extracted_files(&target)? {
                    report.record_placed(Category::Archives, file);
                }
                Some(target)
            }
            Err(e) => {
                warn!(archive = %full_path.display(), error = %e, "discarding broken archive");
                if target.exists() {
                    fs::remove_dir_all(&target)
                        .map_err(OrganizeError::io(FileOperation::RemoveDir, &target))?;
                }
                report.record_discarded(full_path.to_path_buf());
                None
            }
        };

        fs::remove_file(full_path).map_err(OrganizeError::io(FileOperation::Remove, full_path))?;
        debug!(archive = %full_path.display(), "removed archive");

        Ok(extracted)
    }
}

/// Folder name for an archive's contents: the filename without its archive
/// extension, normalized. `"x.tar.gz"` loses both suffixes.
///
/// A name that would not be a plain folder inside `archives` (empty, `.` or
/// `..`) becomes `"_"`.
///
/// ```
/// use desksort::archive::archive_folder_name;
/// use desksort::file_category::ArchiveFormat;
///
/// assert_eq!(archive_folder_name("Фото.zip", ArchiveFormat::Zip), "Foto");
/// assert_eq!(archive_folder_name("backup.tar.gz", ArchiveFormat::Gzip), "backup");
/// assert_eq!(archive_folder_name("...zip", ArchiveFormat::Zip), "_");
/// ```
pub fn archive_folder_name(file_name: &str, format: ArchiveFormat) -> String {
    let mut stem = strip_suffix_ignore_case(file_name, extension_suffix(file_name));
    if format == ArchiveFormat::Gzip {
        stem = strip_suffix_ignore_case(stem, ".tar");
    }

    let normalized = normalize(stem);
    if is_plain_folder_name(&normalized) {
        normalized
    } else {
        "_".to_string()
    }
}

fn is_plain_folder_name(name: &str) -> bool {
    let mut components = Path::new(name).components();
    matches!(
        (components.next(), components.next()),
        (Some(Component::Normal(_)), None)
    )
}

fn extension_suffix(file_name: &str) -> &str {
    file_name
        .rfind('.')
        .map(|idx| &file_name[idx..])
        .unwrap_or("")
}

fn strip_suffix_ignore_case<'s>(name: &'s str, suffix: &str) -> &'s str {
    if suffix.is_empty() || name.len() < suffix.len() {
        return name;
    }
    let split = name.len() - suffix.len();
    match name.get(split..) {
        Some(tail) if tail.eq_ignore_ascii_case(suffix) => &name[..split],
        _ => name,
    }
}

fn extract(
    format: ArchiveFormat,
    archive: &Path,
    target: &Path,
    stem: &str,
) -> Result<(), ExtractError> {
    let file = BufReader::new(File::open(archive)?);
    fs::create_dir(target)?;

    match format {
        ArchiveFormat::Zip => {
            let mut zip = zip::ZipArchive::new(file)?;
            zip.extract(target)?;
        }
        ArchiveFormat::Tar => {
            tar::Archive::new(file).unpack(target)?;
        }
        ArchiveFormat::Gzip => {
            let mut decoder = MultiGzDecoder::new(file);
            let mut head = Vec::new();
            (&mut decoder)
                .take(TAR_BLOCK_SIZE)
                .read_to_end(&mut head)?;
            let tarball = is_tarball(&head);
            let mut payload = Cursor::new(head).chain(decoder);

            if tarball {
                tar::Archive::new(payload).unpack(target)?;
            } else {
                let mut out = File::create(target.join(stem))?;
                io::copy(&mut payload, &mut out)?;
            }
        }
    }

    Ok(())
}

fn is_tarball(head: &[u8]) -> bool {
    head.get(USTAR_MAGIC_OFFSET..USTAR_MAGIC_OFFSET + USTAR_MAGIC.len())
        .is_some_and(|magic| magic == USTAR_MAGIC)
}

/// Every regular file under `dir`, in path order.
fn extracted_files(dir: &Path) -> OrganizeResult<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in WalkDir::new(dir).follow_links(false).sort_by_file_name() {
        let entry = entry.map_err(|e| {
            let path = e.path().unwrap_or(dir).to_path_buf();
            OrganizeError::Io {
                operation: FileOperation::List,
                path,
                source: e.into(),
            }
        })?;
        if entry.file_type().is_file() {
            files.push(entry.into_path());
        }
    }
    Ok(files)
}

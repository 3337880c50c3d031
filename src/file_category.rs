/// Category registry for sorting files by extension.
///
/// This module owns the fixed set of destination categories, the table that
/// maps uppercased extensions to them, and the set of category folders the
/// walker must never descend into.
use crate::config::CategoryExtensions;
use crate::file_organizer::{FileOperation, OrganizeError, OrganizeResult};
use serde::Serialize;
use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Represents one of the six destination folders.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    /// Image files (JPEG, PNG, JPG, SVG)
    Images,
    /// Video files (AVI, MP4, MOV, MKV)
    Video,
    /// Document files (DOC, DOCX, TXT, PDF, ...)
    Documents,
    /// Audio files (MP3, OGG, WAV, AMR)
    Audio,
    /// Expanded archive contents
    Archives,
    /// Anything with an unknown or missing extension
    Other,
}

impl Category {
    /// Every category, in the order folders are created.
    pub const ALL: [Category; 6] = [
        Category::Images,
        Category::Video,
        Category::Documents,
        Category::Audio,
        Category::Archives,
        Category::Other,
    ];

    /// Returns the directory name for this category.
    ///
    /// # Examples
    ///
    /// ```
    /// use desksort::file_category::Category;
    ///
    /// assert_eq!(Category::Video.dir_name(), "video");
    /// assert_eq!(Category::Other.dir_name(), "other");
    /// ```
    pub fn dir_name(&self) -> &'static str {
        match self {
            Category::Images => "images",
            Category::Video => "video",
            Category::Documents => "documents",
            Category::Audio => "audio",
            Category::Archives => "archives",
            Category::Other => "other",
        }
    }

    /// Returns a human-readable description of this category.
    pub fn description(&self) -> &'static str {
        match self {
            Category::Images => "Images",
            Category::Video => "Video",
            Category::Documents => "Documents",
            Category::Audio => "Audio",
            Category::Archives => "Archives",
            Category::Other => "Other files",
        }
    }

    /// Built-in extensions routed to this category.
    fn builtin_extensions(&self) -> &'static [&'static str] {
        match self {
            Category::Images => &["JPEG", "PNG", "JPG", "SVG"],
            Category::Video => &["AVI", "MP4", "MOV", "MKV"],
            Category::Documents => &[
                "DOC", "DOCX", "TXT", "PDF", "XLSX", "PPTX", "CSV", "XML", "JSON",
            ],
            Category::Audio => &["MP3", "OGG", "WAV", "AMR"],
            Category::Archives => &["TAR", "GZ", "ZIP"],
            Category::Other => &[],
        }
    }
}

/// Archive formats the expander knows how to unpack.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArchiveFormat {
    Tar,
    Gzip,
    Zip,
}

impl ArchiveFormat {
    /// Maps an extension to an archive format, ignoring case.
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_uppercase().as_str() {
            "TAR" => Some(ArchiveFormat::Tar),
            "GZ" => Some(ArchiveFormat::Gzip),
            "ZIP" => Some(ArchiveFormat::Zip),
            _ => None,
        }
    }
}

/// Immutable category configuration for one run.
///
/// Built once by [`CategoryRegistry::initialize`] and then only read, so the
/// walker, the file handler and the archive expander all share the same view
/// of where things go.
#[derive(Debug, Clone)]
pub struct CategoryRegistry {
    root: PathBuf,
    dirs: HashMap<Category, PathBuf>,
    extension_map: HashMap<String, Category>,
    restricted: HashSet<PathBuf>,
}

impl CategoryRegistry {
    /// Creates the category folders under `root` with the built-in table.
    pub fn initialize(root: &Path) -> OrganizeResult<Self> {
        Self::initialize_with(root, &CategoryExtensions::default())
    }

    /// Creates the category folders under `root`, adding `extra` extensions
    /// on top of the built-in table.
    ///
    /// Existing folders are reused. The root is canonicalized so every path
    /// the registry hands out is absolute.
    ///
    /// # Errors
    ///
    /// Returns `OrganizeError::InvalidRoot` if `root` is not an existing
    /// directory, and `OrganizeError::Io` if a folder cannot be created.
    pub fn initialize_with(root: &Path, extra: &CategoryExtensions) -> OrganizeResult<Self> {
        let root = fs::canonicalize(root).map_err(|e| OrganizeError::InvalidRoot {
            path: root.to_path_buf(),
            source: e,
        })?;
        if !root.is_dir() {
            return Err(OrganizeError::InvalidRoot {
                source: std::io::Error::new(
                    std::io::ErrorKind::NotADirectory,
                    "root is not a directory",
                ),
                path: root,
            });
        }

        let mut dirs = HashMap::new();
        for category in Category::ALL {
            let dir = root.join(category.dir_name());
            if !dir.is_dir() {
                fs::create_dir(&dir).map_err(|e| OrganizeError::Io {
                    operation: FileOperation::CreateDir,
                    path: dir.clone(),
                    source: e,
                })?;
                debug!(path = %dir.display(), "created category folder");
            }
            dirs.insert(category, dir);
        }

        let mut extension_map = HashMap::new();
        for category in Category::ALL {
            for ext in category.builtin_extensions() {
                extension_map.insert(ext.to_string(), category);
            }
        }
        for (category, extensions) in extra.iter() {
            for ext in extensions {
                extension_map.insert(ext.to_uppercase(), category);
            }
        }

        let restricted = dirs.values().cloned().collect();

        Ok(Self {
            root,
            dirs,
            extension_map,
            restricted,
        })
    }

    /// The canonical root this registry was built for.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Maps an extension to its category, ignoring case.
    ///
    /// Unknown and empty extensions resolve to [`Category::Other`].
    pub fn category_for(&self, ext: &str) -> Category {
        self.extension_map
            .get(&ext.to_uppercase())
            .copied()
            .unwrap_or(Category::Other)
    }

    /// Returns true if the extension is registered under any category.
    pub fn is_known(&self, ext: &str) -> bool {
        self.extension_map.contains_key(&ext.to_uppercase())
    }

    /// Absolute path of a category folder.
    pub fn category_dir(&self, category: Category) -> &Path {
        // Every category is inserted by `initialize_with`.
        &self.dirs[&category]
    }

    /// Destination folder for a file with the given extension.
    pub fn destination_for(&self, ext: &str) -> &Path {
        self.category_dir(self.category_for(ext))
    }

    /// Returns true if `path` is one of the top-level category folders.
    pub fn is_restricted(&self, path: &Path) -> bool {
        self.restricted.contains(path)
    }
}

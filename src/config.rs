//! Run configuration loaded from TOML.
//!
//! Two things can be tuned without touching the code:
//! - extra extensions per category, merged on top of the built-in table
//! - filters for files that must be left exactly where they are
//!
//! # Configuration File Format
//!
//! ```toml
//! [categories]
//! images = ["GIF", "WEBP"]
//! documents = ["MD", "ODT"]
//!
//! [filters]
//! skip_hidden = false
//!
//! [filters.exclude]
//! filenames = ["desktop.ini"]
//! patterns = ["**/*.part"]
//! regex = ["^~\\$"]
//! ```

use crate::file_category::Category;
use glob::Pattern;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Name of the per-directory configuration file.
pub const LOCAL_CONFIG_FILE: &str = ".desksortrc.toml";

/// Errors that can occur while loading or compiling configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration file not found: {}", .0.display())]
    ConfigNotFound(PathBuf),

    #[error("Invalid configuration: {0}")]
    ConfigInvalid(String),

    #[error("Invalid glob pattern '{pattern}': {reason}")]
    InvalidGlobPattern { pattern: String, reason: String },

    #[error("Invalid regex pattern '{pattern}': {reason}")]
    InvalidRegexPattern { pattern: String, reason: String },

    #[error("Invalid extension '{0}': must be non-empty and contain no dots")]
    InvalidExtension(String),

    #[error("Extension '{extension}' is listed under both {first} and {second}")]
    DuplicateExtension {
        extension: String,
        first: &'static str,
        second: &'static str,
    },

    #[error("IO error reading configuration {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Full configuration for a sorting run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SortConfig {
    pub categories: CategoryExtensions,
    pub filters: FilterRules,
}

/// Extra extensions per category, added on top of the built-in table.
///
/// Files with unknown extensions already land in `other`, so there is no
/// list for it.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CategoryExtensions {
    pub images: Vec<String>,
    pub video: Vec<String>,
    pub documents: Vec<String>,
    pub audio: Vec<String>,
    pub archives: Vec<String>,
}

impl CategoryExtensions {
    /// Iterates over each category and its configured extensions.
    pub fn iter(&self) -> impl Iterator<Item = (Category, &[String])> {
        [
            (Category::Images, self.images.as_slice()),
            (Category::Video, self.video.as_slice()),
            (Category::Documents, self.documents.as_slice()),
            (Category::Audio, self.audio.as_slice()),
            (Category::Archives, self.archives.as_slice()),
        ]
        .into_iter()
    }

    /// Checks that every extension is usable and listed only once.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidExtension` for empty or dotted entries and
    /// `ConfigError::DuplicateExtension` when two categories claim the same one.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut seen: HashMap<String, Category> = HashMap::new();

        for (category, extensions) in self.iter() {
            for ext in extensions {
                let trimmed = ext.trim();
                if trimmed.is_empty() || trimmed.contains('.') {
                    return Err(ConfigError::InvalidExtension(ext.clone()));
                }

                let key = trimmed.to_uppercase();
                if let Some(first) = seen.get(&key)
                    && *first != category
                {
                    return Err(ConfigError::DuplicateExtension {
                        extension: key,
                        first: first.dir_name(),
                        second: category.dir_name(),
                    });
                }
                seen.insert(key, category);
            }
        }

        Ok(())
    }
}

/// Rules for files that should not be touched.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterRules {
    /// Leave files starting with "." where they are. Defaults to false.
    pub skip_hidden: bool,

    /// Rules for excluding files.
    pub exclude: ExcludeRules,
}

/// Rules for excluding files from sorting.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ExcludeRules {
    /// Exact filenames to exclude (e.g., "desktop.ini").
    pub filenames: Vec<String>,

    /// Glob patterns matched against the full path (e.g., "**/*.part").
    pub patterns: Vec<String>,

    /// Regex patterns matched against the filename.
    pub regex: Vec<String>,
}

impl SortConfig {
    /// Load configuration from a file, with fallback to defaults.
    ///
    /// Lookup order:
    /// 1. `config_path`, if provided
    /// 2. `.desksortrc.toml` in the current directory
    /// 3. `~/.config/desksort/config.toml`
    /// 4. Built-in defaults
    ///
    /// Returns the configuration together with the file it came from, if any.
    ///
    /// # Errors
    ///
    /// Returns an error if an explicitly given file is missing, or if any
    /// file found cannot be read or parsed.
    pub fn load(config_path: Option<&Path>) -> Result<(Self, Option<PathBuf>), ConfigError> {
        if let Some(path) = config_path {
            return Ok((Self::load_from_file(path)?, Some(path.to_path_buf())));
        }

        let local_config = PathBuf::from(LOCAL_CONFIG_FILE);
        if local_config.exists() {
            return Ok((Self::load_from_file(&local_config)?, Some(local_config)));
        }

        if let Ok(home) = std::env::var("HOME") {
            let home_config = PathBuf::from(home)
                .join(".config")
                .join("desksort")
                .join("config.toml");
            if home_config.exists() {
                return Ok((Self::load_from_file(&home_config)?, Some(home_config)));
            }
        }

        Ok((Self::default(), None))
    }

    /// Load configuration from a specific file.
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::ConfigNotFound(path.to_path_buf()));
        }

        let content = fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;

        Self::from_toml(&content)
    }

    /// Parse and validate configuration from TOML text.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Self =
            toml::from_str(content).map_err(|e| ConfigError::ConfigInvalid(e.to_string()))?;
        config.categories.validate()?;
        Ok(config)
    }
}

/// Compiled filter rules, ready for matching.
#[derive(Debug, Default)]
pub struct CompiledFilters {
    skip_hidden: bool,
    exclude_filenames: HashSet<String>,
    exclude_patterns: Vec<Pattern>,
    exclude_regexes: Vec<Regex>,
    protected: HashSet<PathBuf>,
}

impl CompiledFilters {
    /// Compile filter rules, validating every pattern up front.
    ///
    /// # Errors
    ///
    /// Returns an error if any glob or regex pattern is invalid.
    pub fn new(rules: &FilterRules) -> Result<Self, ConfigError> {
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

        let exclude_regexes = rules
            .exclude
            .regex
            .iter()
            .map(|pattern| {
                Regex::new(pattern).map_err(|e| ConfigError::InvalidRegexPattern {
                    pattern: pattern.clone(),
                    reason: e.to_string(),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            skip_hidden: rules.skip_hidden,
            exclude_filenames: rules.exclude.filenames.iter().cloned().collect(),
            exclude_patterns,
            exclude_regexes,
            protected: HashSet::new(),
        })
    }

    /// Never move the file at `path`, whatever the rules say.
    ///
    /// Used for the config and report files when they live inside the root.
    /// Paths that do not exist yet are resolved through their parent.
    pub fn protect(&mut self, path: &Path) {
        let resolved = fs::canonicalize(path).ok().or_else(|| {
            let parent = fs::canonicalize(path.parent()?).ok()?;
            Some(parent.join(path.file_name()?))
        });
        if let Some(resolved) = resolved {
            self.protected.insert(resolved);
        }
    }

    /// Check whether a file should be sorted.
    ///
    /// Checks are performed in this order:
    /// 1. Protected paths - never sorted
    /// 2. Hidden file filter
    /// 3. Exact filename match
    /// 4. Glob pattern match against the full path
    /// 5. Regex match against the filename
    pub fn should_include(&self, file_path: &Path) -> bool {
        if self.protected.contains(file_path) {
            return false;
        }

        let file_name = file_path
            .file_name()
            .map(|n| n.to_string_lossy())
            .unwrap_or_default();

        if self.skip_hidden && file_name.starts_with('.') {
            return false;
        }

        if self.exclude_filenames.contains(file_name.as_ref()) {
            return false;
        }

        if self
            .exclude_patterns
            .iter()
            .any(|pattern| pattern.matches_path(file_path))
        {
            return false;
        }

        !self
            .exclude_regexes
            .iter()
            .any(|regex| regex.is_match(&file_name))
    }
}

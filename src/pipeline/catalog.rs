//! Discovery: build the catalog of files to process
//!
//! Scans a single directory (no recursion), keeps regular files whose name
//! ends with the configured suffix, and records their size and mtime. The
//! catalog is built once and never grows afterwards.

use crate::config::PipelineConfig;
use crate::error::DiscoveryError;
use chrono::{DateTime, Utc};
use std::fs;
use std::path::PathBuf;
use tracing::{debug, info};

/// One discovered file and its processing state
#[derive(Debug, Clone)]
pub struct FileRecord {
    /// Full path to the source file
    pub path: PathBuf,

    /// Size in bytes at discovery time
    pub size: u64,

    /// Modification time at discovery time
    pub modified: DateTime<Utc>,

    /// Set once a worker claims this record
    pub claimed: bool,

    /// Set once the claiming worker has resolved it
    pub finished: bool,

    /// Copy succeeded (meaningful only when `finished`)
    pub success: bool,

    /// Bytes credited to the shared progress counter so far
    pub(crate) credited_bytes: u64,
}

impl FileRecord {
    /// Create an unclaimed record
    pub fn new(path: PathBuf, size: u64, modified: DateTime<Utc>) -> Self {
        Self {
            path,
            size,
            modified,
            claimed: false,
            finished: false,
            success: false,
            credited_bytes: 0,
        }
    }

    /// File name as a display string
    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    }
}

/// Result of discovery
#[derive(Debug, Clone, Default)]
pub struct FileCatalog {
    /// Records in discovery order
    pub records: Vec<FileRecord>,

    /// Sum of record sizes
    pub total_bytes: u64,
}

impl FileCatalog {
    /// Scan `config.input_dir` for matching files
    pub fn discover(config: &PipelineConfig) -> Result<Self, DiscoveryError> {
        let read_dir_err = |source| DiscoveryError::ReadDir {
            path: config.input_dir.clone(),
            source,
        };

        let entries = fs::read_dir(&config.input_dir).map_err(read_dir_err)?;
        debug!(
            suffix = config.pattern.suffix(),
            excludes = config.exclude_patterns.len(),
            cap = config.max_files,
            "Scanning input directory"
        );

        let mut catalog = FileCatalog::default();

        for entry in entries {
            if catalog.records.len() >= config.max_files {
                info!(cap = config.max_files, "File cap reached, stopping discovery");
                break;
            }

            // A failing iterator means the directory itself became unreadable
            let entry = entry.map_err(read_dir_err)?;

            let file_type = match entry.file_type() {
                Ok(t) => t,
                Err(e) => {
                    debug!(path = %entry.path().display(), error = %e, "Skipping entry without file type");
                    continue;
                }
            };
            if !file_type.is_file() {
                continue;
            }

            let name = entry.file_name();
            let Some(name) = name.to_str() else {
                debug!(path = %entry.path().display(), "Skipping non-UTF-8 file name");
                continue;
            };

            if !config.pattern.matches(name) || config.is_excluded(name) {
                continue;
            }

            let path = entry.path();
            let metadata = match fs::metadata(&path) {
                Ok(m) => m,
                Err(e) => {
                    debug!(path = %path.display(), error = %e, "Skipping entry without readable metadata");
                    continue;
                }
            };

            let modified = metadata
                .modified()
                .map(DateTime::<Utc>::from)
                .unwrap_or(DateTime::<Utc>::UNIX_EPOCH);

            catalog.total_bytes += metadata.len();
            catalog
                .records
                .push(FileRecord::new(path, metadata.len(), modified));
        }

        debug!(
            files = catalog.records.len(),
            bytes = catalog.total_bytes,
            "Discovery finished"
        );

        Ok(catalog)
    }

    /// Number of discovered files
    pub fn total_files(&self) -> usize {
        self.records.len()
    }

    /// True if nothing matched
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

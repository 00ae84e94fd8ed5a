//! Error types for file-pipeline
//!
//! This module defines the error hierarchy for the pipeline:
//! - Discovery errors (fatal, abort before any worker starts)
//! - Per-file I/O errors (recovered inside the worker)
//! - Configuration and CLI errors
//! - Worker thread errors
//!
//! Only discovery and configuration failures stop a run. Everything that
//! goes wrong with a single file is contained in a [`FileOutcome`].

use std::path::PathBuf;
use thiserror::Error;

/// Top-level error type for the pipeline
#[derive(Error, Debug)]
pub enum PipelineError {
    /// Discovery failed (input directory unreadable)
    #[error("Discovery error: {0}")]
    Discovery(#[from] DiscoveryError),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Worker/concurrency errors
    #[error("Worker error: {0}")]
    Worker(#[from] WorkerError),

    /// Output directory could not be prepared
    #[error("Cannot create output directory '{path}': {source}")]
    OutputDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// I/O errors outside of per-file processing (report writing, etc.)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Report serialization failed
    #[error("Report serialization error: {0}")]
    Report(#[from] serde_json::Error),
}

/// Discovery-stage errors
#[derive(Error, Debug)]
pub enum DiscoveryError {
    /// Input directory could not be listed
    #[error("Could not read input directory '{path}': {source}")]
    ReadDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Per-file I/O errors
///
/// These never leave the worker that hit them; they end up recorded as a
/// failed [`FileOutcome`].
#[derive(Error, Debug)]
pub enum FileIoError {
    /// Source file could not be opened
    #[error("Could not open input file '{path}': {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Output file could not be created
    #[error("Could not create output file '{path}': {source}")]
    Create {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Read failed mid-copy
    #[error("Read failed on '{path}' after {offset} bytes: {source}")]
    Read {
        path: PathBuf,
        offset: u64,
        #[source]
        source: std::io::Error,
    },

    /// Write failed mid-copy
    #[error("Write failed on '{path}' after {offset} bytes: {source}")]
    Write {
        path: PathBuf,
        offset: u64,
        #[source]
        source: std::io::Error,
    },

    /// Output could not be synced to disk after the last chunk
    #[error("Could not close output file '{path}': {source}")]
    Close {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Run was cancelled while this file was in flight
    #[error("Copy of '{path}' cancelled")]
    Cancelled { path: PathBuf },
}

/// Configuration and CLI errors
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Invalid worker count
    #[error("Invalid thread count {count}: must be between 1 and {max}")]
    InvalidWorkerCount { count: usize, max: usize },

    /// Invalid suffix pattern
    #[error("Invalid pattern '{pattern}': {reason}")]
    InvalidPattern { pattern: String, reason: String },

    /// Invalid copy buffer size
    #[error("Invalid buffer size {size}: must be between {min} and {max}")]
    InvalidBufferSize { size: usize, min: usize, max: usize },

    /// Invalid progress interval
    #[error("Invalid progress interval {millis}ms: must be between {min} and {max}")]
    InvalidInterval { millis: u64, min: u64, max: u64 },

    /// Invalid catalog cap
    #[error("Invalid max file count {count}: must be at least 1")]
    InvalidMaxFiles { count: usize },

    /// Invalid exclude pattern
    #[error("Invalid exclude pattern '{pattern}': {reason}")]
    InvalidExcludePattern { pattern: String, reason: String },

    /// Output directory is unusable
    #[error("Invalid output directory '{path}': {reason}")]
    InvalidOutputDir { path: PathBuf, reason: String },
}

/// Worker thread errors
#[derive(Error, Debug)]
pub enum WorkerError {
    /// Worker thread could not be started
    #[error("Failed to spawn worker {id}: {reason}")]
    Spawn { id: usize, reason: String },

    /// Worker panicked
    #[error("Worker {id} panicked: {message}")]
    Panicked { id: usize, message: String },
}

/// Result type alias for PipelineError
pub type Result<T> = std::result::Result<T, PipelineError>;

/// Outcome of processing a single claimed file
#[derive(Debug)]
pub enum FileOutcome {
    /// File copied in full
    Copied { path: PathBuf, bytes: u64 },

    /// File failed; nothing is left under its name in the output directory
    Failed { path: PathBuf, error: FileIoError },
}

impl FileOutcome {
    /// Returns true if this outcome represents success
    pub fn is_success(&self) -> bool {
        matches!(self, FileOutcome::Copied { .. })
    }
}

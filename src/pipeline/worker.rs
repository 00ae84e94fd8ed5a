//! Worker thread logic for the copy stage
//!
//! Each worker:
//! - Claims the next file from the shared [`WorkQueue`]
//! - Copies it into the output directory in fixed-size chunks
//! - Credits progress after every chunk that reaches the output
//! - Removes any output under the file's name when a copy fails or is cancelled
//! - Resolves the claim and notifies the progress tracker
//!
//! Per-file failures are contained here; they never stop the worker.

use crate::config::PipelineConfig;
use crate::error::{FileIoError, FileOutcome, WorkerError};
use crate::pipeline::queue::{Claim, WorkQueue};
use crate::pipeline::tracker::FileEvent;
use crate::storage::{OutputStream, Storage};
use crossbeam_channel::Sender;
use std::io::{ErrorKind, Read, Write};
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use tracing::{debug, info, warn};

/// Statistics collected by a worker
#[derive(Debug, Default)]
pub struct WorkerStats {
    /// Files claimed and resolved
    pub files_processed: AtomicU64,

    /// Files copied in full
    pub files_copied: AtomicU64,

    /// Files that failed
    pub files_failed: AtomicU64,

    /// Bytes written for successful files
    pub bytes_copied: AtomicU64,
}

impl WorkerStats {
    fn record_success(&self, bytes: u64) {
        self.files_processed.fetch_add(1, Ordering::Relaxed);
        self.files_copied.fetch_add(1, Ordering::Relaxed);
        self.bytes_copied.fetch_add(bytes, Ordering::Relaxed);
    }

    fn record_failure(&self) {
        self.files_processed.fetch_add(1, Ordering::Relaxed);
        self.files_failed.fetch_add(1, Ordering::Relaxed);
    }
}

/// Totals across all workers
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct WorkerTotals {
    pub files_processed: u64,
    pub files_copied: u64,
    pub files_failed: u64,
    pub bytes_copied: u64,
}

/// Everything a worker shares with the rest of the pipeline
#[derive(Clone)]
pub struct WorkerContext {
    pub config: Arc<PipelineConfig>,
    pub queue: Arc<WorkQueue>,
    pub storage: Arc<dyn Storage>,
    pub events: Sender<FileEvent>,
}

/// A worker thread that drains the work queue
pub struct Worker {
    /// Worker ID
    id: usize,

    /// Thread handle
    handle: Option<JoinHandle<()>>,

    /// Worker statistics
    stats: Arc<WorkerStats>,
}

impl Worker {
    /// Spawn a new worker thread
    pub fn spawn(id: usize, ctx: WorkerContext) -> Result<Self, WorkerError> {
        let stats = Arc::new(WorkerStats::default());
        let stats_clone = Arc::clone(&stats);

        let handle = thread::Builder::new()
            .name(format!("worker-{}", id))
            .spawn(move || worker_loop(id, ctx, stats_clone))
            .map_err(|e| WorkerError::Spawn {
                id,
                reason: e.to_string(),
            })?;

        Ok(Self {
            id,
            handle: Some(handle),
            stats,
        })
    }

    /// Get worker statistics
    pub fn stats(&self) -> &WorkerStats {
        &self.stats
    }

    /// Wait for the worker to finish
    pub fn join(&mut self) -> Result<(), WorkerError> {
        match self.handle.take() {
            Some(handle) => handle.join().map_err(|payload| WorkerError::Panicked {
                id: self.id,
                message: panic_message(payload.as_ref()),
            }),
            None => Ok(()),
        }
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "Worker thread panicked".to_string()
    }
}

/// Main worker loop
fn worker_loop(id: usize, ctx: WorkerContext, stats: Arc<WorkerStats>) {
    info!(worker = id, "Worker starting");

    while let Some(claim) = ctx.queue.claim_next() {
        let outcome = process_file(&claim, &ctx);
        let success = outcome.is_success();

        ctx.queue.finish(claim.index, success);

        let bytes = match &outcome {
            FileOutcome::Copied { path, bytes } => {
                stats.record_success(*bytes);
                debug!(worker = id, path = %path.display(), bytes = bytes, "File copied");
                *bytes
            }
            FileOutcome::Failed { path, error } => {
                stats.record_failure();
                warn!(worker = id, path = %path.display(), error = %error, "File failed");
                0
            }
        };

        // Tracker may already have exited after seeing the last file resolved
        let _ = ctx.events.send(FileEvent {
            worker: id,
            path: claim.path,
            bytes,
            success,
        });
    }

    info!(
        worker = id,
        files = stats.files_processed.load(Ordering::Relaxed),
        failed = stats.files_failed.load(Ordering::Relaxed),
        "Worker shutting down"
    );
}

/// Copy one claimed file, cleaning up on failure
fn process_file(claim: &Claim, ctx: &WorkerContext) -> FileOutcome {
    let Some(output) = ctx.config.output_path_for(&claim.path) else {
        return FileOutcome::Failed {
            path: claim.path.clone(),
            error: FileIoError::Create {
                path: ctx.config.output_dir.clone(),
                source: std::io::Error::new(ErrorKind::InvalidInput, "source has no file name"),
            },
        };
    };

    match copy_file(claim, &output, ctx) {
        Ok(bytes) => FileOutcome::Copied {
            path: claim.path.clone(),
            bytes,
        },
        Err(error) => {
            // Covers partial copies and stale output from an earlier run
            if let Err(e) = ctx.storage.remove(&output) {
                warn!(path = %output.display(), error = %e, "Failed to remove output");
            }
            FileOutcome::Failed {
                path: claim.path.clone(),
                error,
            }
        }
    }
}

/// Chunked copy; returns the number of bytes written
fn copy_file(claim: &Claim, output: &Path, ctx: &WorkerContext) -> Result<u64, FileIoError> {
    let mut reader = ctx
        .storage
        .open_read(&claim.path)
        .map_err(|source| FileIoError::Open {
            path: claim.path.clone(),
            source,
        })?;

    let mut writer = ctx
        .storage
        .create_write(output)
        .map_err(|source| FileIoError::Create {
            path: output.to_path_buf(),
            source,
        })?;

    let mut buffer = vec![0u8; ctx.config.buffer_size];
    let mut copied = 0u64;

    loop {
        if ctx.queue.is_cancelled() {
            return Err(FileIoError::Cancelled {
                path: claim.path.clone(),
            });
        }

        let n = match reader.read(&mut buffer) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(source) => {
                return Err(FileIoError::Read {
                    path: claim.path.clone(),
                    offset: copied,
                    source,
                })
            }
        };

        writer
            .write_all(&buffer[..n])
            .map_err(|source| FileIoError::Write {
                path: output.to_path_buf(),
                offset: copied,
                source,
            })?;

        copied += n as u64;
        ctx.queue.record_progress(claim.index, n as u64);
    }

    writer.flush().map_err(|source| FileIoError::Write {
        path: output.to_path_buf(),
        offset: copied,
        source,
    })?;
    writer.sync().map_err(|source| FileIoError::Close {
        path: output.to_path_buf(),
        source,
    })?;

    Ok(copied)
}

/// Aggregate statistics from multiple workers
pub fn aggregate_stats(workers: &[Worker]) -> WorkerTotals {
    workers.iter().fold(WorkerTotals::default(), |mut acc, worker| {
        acc.files_processed += worker.stats.files_processed.load(Ordering::Relaxed);
        acc.files_copied += worker.stats.files_copied.load(Ordering::Relaxed);
        acc.files_failed += worker.stats.files_failed.load(Ordering::Relaxed);
        acc.bytes_copied += worker.stats.bytes_copied.load(Ordering::Relaxed);
        acc
    })
}

//! Pipeline coordinator - orchestrates a full run
//!
//! The coordinator is responsible for:
//! - Re-validating the configuration (its fields are public)
//! - Discovery (fatal on failure, before anything else happens)
//! - Preparing the output directory
//! - Starting the workers and the progress tracker
//! - Joining everything and producing the final report
//! - Cancellation (graceful shutdown between chunks)

use crate::config::PipelineConfig;
use crate::error::{PipelineError, Result};
use crate::pipeline::aggregate::FinalReport;
use crate::pipeline::catalog::FileCatalog;
use crate::pipeline::queue::WorkQueue;
use crate::pipeline::tracker::{FileEvent, ProgressTracker};
use crate::pipeline::worker::{aggregate_stats, Worker, WorkerContext, WorkerTotals};
use crate::progress::ProgressReporter;
use crate::storage::{LocalStorage, Storage};
use crossbeam_channel::{unbounded, Sender};
use std::fs;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Result of a finished run
#[derive(Debug)]
pub struct PipelineResult {
    /// Final statistics
    pub report: FinalReport,

    /// Per-worker totals, summed
    pub workers: WorkerTotals,

    /// Workers that could not be joined cleanly
    pub worker_errors: u64,

    /// Whether every discovered file was resolved (vs. cancelled)
    pub completed: bool,
}

/// Coordinates discovery, the worker pool and reporting
pub struct Pipeline {
    /// Configuration
    config: Arc<PipelineConfig>,

    /// Byte-stream I/O used by the workers
    storage: Arc<dyn Storage>,

    /// Shutdown signal
    shutdown: Arc<AtomicBool>,
}

impl Pipeline {
    /// Create a pipeline that copies on the local filesystem
    pub fn new(config: PipelineConfig) -> Self {
        Self::with_storage(config, Arc::new(LocalStorage))
    }

    /// Create a pipeline with a custom storage backend
    pub fn with_storage(config: PipelineConfig, storage: Arc<dyn Storage>) -> Self {
        Self {
            config: Arc::new(config),
            storage,
            shutdown: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Get a clone of the shutdown flag (for signal handlers)
    pub fn shutdown_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.shutdown)
    }

    /// Run the pipeline to completion (or cancellation)
    pub fn run(self) -> Result<PipelineResult> {
        self.config.validate()?;

        info!(
            input = %self.config.input_dir.display(),
            pattern = %self.config.pattern,
            "Stage 1: file discovery"
        );
        let catalog = FileCatalog::discover(&self.config)?;
        info!(
            files = catalog.total_files(),
            bytes = catalog.total_bytes,
            "Discovery complete"
        );

        fs::create_dir_all(&self.config.output_dir).map_err(|source| PipelineError::OutputDir {
            path: self.config.output_dir.clone(),
            source,
        })?;

        let queue = Arc::new(WorkQueue::new(catalog, Arc::clone(&self.shutdown)));
        let (event_tx, event_rx) = unbounded::<FileEvent>();

        let reporter = self.config.show_progress.then(ProgressReporter::new);
        let tracker = ProgressTracker::spawn(
            Arc::clone(&queue),
            event_rx,
            self.config.progress_interval,
            reporter,
        )?;

        info!(workers = self.config.worker_count, "Stage 2: processing");
        let spawned = self.spawn_workers(&queue, event_tx);

        let mut workers = match spawned {
            Ok(workers) => workers,
            Err((e, mut partial)) => {
                // Let the ones already running stop at their next claim
                queue.cancel();
                join_workers(&mut partial);
                let _ = tracker.join();
                return Err(e);
            }
        };

        let worker_errors = join_workers(&mut workers);
        let totals = aggregate_stats(&workers);
        let tracker_stats = tracker.join();
        debug!(
            events = tracker_stats.events,
            renders = tracker_stats.renders,
            "Progress tracker stopped"
        );

        info!("Stage 3: result aggregation");
        let completed = !self.shutdown.load(Ordering::SeqCst) && queue.snapshot().is_complete();
        let report = FinalReport::from_queue(&queue, completed);

        // Copies are already done; a report write failure is only logged
        if let Some(ref path) = self.config.report_path {
            match report.write_json(path) {
                Ok(()) => info!(path = %path.display(), "Report written"),
                Err(e) => warn!(path = %path.display(), error = %e, "Failed to write report"),
            }
        }

        info!(
            files = report.processed_files,
            succeeded = report.success_files,
            failed = report.failures,
            bytes = report.processed_bytes,
            duration_secs = report.elapsed_secs,
            "Pipeline finished"
        );

        Ok(PipelineResult {
            report,
            workers: totals,
            worker_errors,
            completed,
        })
    }

    /// Spawn worker threads; on failure hand back the ones already running
    fn spawn_workers(
        &self,
        queue: &Arc<WorkQueue>,
        events: Sender<FileEvent>,
    ) -> std::result::Result<Vec<Worker>, (PipelineError, Vec<Worker>)> {
        let ctx = WorkerContext {
            config: Arc::clone(&self.config),
            queue: Arc::clone(queue),
            storage: Arc::clone(&self.storage),
            events,
        };

        let mut workers = Vec::with_capacity(self.config.worker_count);
        for id in 0..self.config.worker_count {
            match Worker::spawn(id, ctx.clone()) {
                Ok(worker) => workers.push(worker),
                Err(e) => return Err((e.into(), workers)),
            }
        }

        info!(count = workers.len(), "Workers spawned");
        Ok(workers)
    }
}

/// Join all worker threads; returns how many failed to join cleanly
fn join_workers(workers: &mut [Worker]) -> u64 {
    let mut errors = 0;
    for worker in workers.iter_mut() {
        if let Err(e) = worker.join() {
            warn!(error = %e, "Worker failed to join cleanly");
            errors += 1;
        }
    }
    errors
}

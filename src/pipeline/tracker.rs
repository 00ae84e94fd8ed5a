//! Live progress observer
//!
//! A single thread that watches the run while workers copy. It wakes up on
//! every completed file (via a channel from the workers) and at least once
//! per interval, takes a [`Snapshot`](crate::pipeline::queue::Snapshot) under
//! the job lock, and redraws the progress bar.
//!
//! The channel doubles as the termination signal: once every worker has
//! exited, all senders are gone and the tracker stops.

use crate::error::WorkerError;
use crate::pipeline::queue::WorkQueue;
use crate::progress::ProgressReporter;
use crossbeam_channel::{Receiver, RecvTimeoutError};
use std::path::PathBuf;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tracing::{debug, warn};

/// Sent by a worker each time it resolves a file
#[derive(Debug, Clone)]
pub struct FileEvent {
    pub worker: usize,
    pub path: PathBuf,
    pub bytes: u64,
    pub success: bool,
}

/// Handle to the running observer thread
pub struct ProgressTracker {
    handle: Option<JoinHandle<TrackerStats>>,
}

/// What the tracker saw during the run
#[derive(Debug, Default, Clone, Copy)]
pub struct TrackerStats {
    /// Completion events received
    pub events: u64,

    /// Times the display was refreshed
    pub renders: u64,
}

impl ProgressTracker {
    /// Start observing `queue`
    ///
    /// `reporter` is `None` in quiet mode; events are still drained.
    pub fn spawn(
        queue: Arc<WorkQueue>,
        events: Receiver<FileEvent>,
        interval: Duration,
        reporter: Option<ProgressReporter>,
    ) -> Result<Self, WorkerError> {
        let handle = thread::Builder::new()
            .name("progress".to_string())
            .spawn(move || tracker_loop(queue, events, interval, reporter))
            .map_err(|e| WorkerError::Spawn {
                id: usize::MAX,
                reason: e.to_string(),
            })?;

        Ok(Self {
            handle: Some(handle),
        })
    }

    /// Wait for the tracker to stop
    pub fn join(mut self) -> TrackerStats {
        match self.handle.take().map(JoinHandle::join) {
            Some(Ok(stats)) => stats,
            Some(Err(_)) => {
                warn!("Progress tracker panicked");
                TrackerStats::default()
            }
            None => TrackerStats::default(),
        }
    }
}

fn tracker_loop(
    queue: Arc<WorkQueue>,
    events: Receiver<FileEvent>,
    interval: Duration,
    reporter: Option<ProgressReporter>,
) -> TrackerStats {
    let mut stats = TrackerStats::default();

    loop {
        let disconnected = match events.recv_timeout(interval) {
            Ok(event) => {
                stats.events += 1;
                debug!(
                    worker = event.worker,
                    path = %event.path.display(),
                    bytes = event.bytes,
                    success = event.success,
                    "File resolved"
                );
                false
            }
            Err(RecvTimeoutError::Timeout) => false,
            Err(RecvTimeoutError::Disconnected) => true,
        };

        let snapshot = queue.snapshot();
        if let Some(ref r) = reporter {
            r.update(&snapshot);
        }
        stats.renders += 1;

        if snapshot.is_complete() || disconnected {
            if let Some(ref r) = reporter {
                if snapshot.is_complete() {
                    r.finish("Processing complete");
                } else {
                    r.finish("Processing interrupted");
                }
            }
            break;
        }
    }

    stats
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::catalog::{FileCatalog, FileRecord};
    use chrono::Utc;
    use crossbeam_channel::unbounded;
    use std::sync::atomic::AtomicBool;

    fn queue_with(n: usize) -> Arc<WorkQueue> {
        let records = (0..n)
            .map(|i| FileRecord::new(format!("/in/{i}").into(), 1, Utc::now()))
            .collect();
        let catalog = FileCatalog {
            records,
            total_bytes: n as u64,
        };
        Arc::new(WorkQueue::new(catalog, Arc::new(AtomicBool::new(false))))
    }

    #[test]
    fn test_tracker_exits_on_empty_catalog() {
        let queue = queue_with(0);
        let (_tx, rx) = unbounded::<FileEvent>();

        let tracker =
            ProgressTracker::spawn(queue, rx, Duration::from_millis(10), None).unwrap();
        let stats = tracker.join();
        assert_eq!(stats.events, 0);
        assert_eq!(stats.renders, 1);
    }

    #[test]
    fn test_tracker_exits_when_senders_drop() {
        let queue = queue_with(3);
        let (tx, rx) = unbounded();

        let tracker = ProgressTracker::spawn(
            Arc::clone(&queue),
            rx,
            Duration::from_millis(10),
            None,
        )
        .unwrap();

        let claim = queue.claim_next().unwrap();
        queue.finish(claim.index, true);
        tx.send(FileEvent {
            worker: 0,
            path: claim.path,
            bytes: 1,
            success: true,
        })
        .unwrap();
        drop(tx);

        // Two files never resolved; only the disconnect can end the loop
        let stats = tracker.join();
        assert_eq!(stats.events, 1);
        assert!(stats.renders >= 2);
    }

    #[test]
    fn test_tracker_exits_when_complete() {
        let queue = queue_with(2);
        while let Some(claim) = queue.claim_next() {
            queue.finish(claim.index, true);
        }

        // Sender kept alive: completion alone must stop the tracker
        let (tx, rx) = unbounded::<FileEvent>();
        let tracker =
            ProgressTracker::spawn(queue, rx, Duration::from_millis(10), None).unwrap();
        tracker.join();
        drop(tx);
    }
}

//! Shared job state and the claim protocol
//!
//! All bookkeeping for a run lives in one [`JobState`] behind a single
//! mutex. Nothing outside this module can reach its fields; workers and the
//! progress tracker go through [`WorkQueue`]:
//!
//! - [`WorkQueue::claim_next`] hands out each record exactly once
//! - [`WorkQueue::record_progress`] credits copied bytes chunk by chunk
//! - [`WorkQueue::finish`] resolves a claimed record
//! - [`WorkQueue::snapshot`] reads all counters in one critical section
//!
//! File I/O never happens while the lock is held.

use crate::pipeline::catalog::{FileCatalog, FileRecord};
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Everything that changes during a run; only touched under the lock
#[derive(Debug)]
struct JobState {
    records: Vec<FileRecord>,
    total_files: u64,
    total_bytes: u64,
    processed_files: u64,
    processed_bytes: u64,
    success_files: u64,

    /// Every record before this index has been claimed
    cursor: usize,

    start_time: Instant,
    started_at: DateTime<Utc>,
}

/// A record handed to exactly one worker
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Claim {
    /// Position in the catalog
    pub index: usize,

    /// Source path
    pub path: PathBuf,

    /// Size recorded at discovery
    pub size: u64,
}

/// Consistent view of the counters, taken under the lock
#[derive(Debug, Clone)]
pub struct Snapshot {
    pub total_files: u64,
    pub total_bytes: u64,
    pub processed_files: u64,
    pub processed_bytes: u64,
    pub success_files: u64,
    pub elapsed: Duration,
    pub started_at: DateTime<Utc>,
}

impl Snapshot {
    /// Fraction of bytes done, in `0.0..=1.0` (0 for an empty catalog)
    pub fn fraction(&self) -> f64 {
        if self.total_bytes == 0 {
            0.0
        } else {
            (self.processed_bytes as f64 / self.total_bytes as f64).min(1.0)
        }
    }

    /// Bytes per second since the run started
    pub fn throughput(&self) -> f64 {
        let secs = self.elapsed.as_secs_f64();
        if secs > 0.0 {
            self.processed_bytes as f64 / secs
        } else {
            0.0
        }
    }

    /// Files that were not copied successfully
    pub fn failures(&self) -> u64 {
        self.total_files - self.success_files
    }

    /// Every discovered file has been resolved
    pub fn is_complete(&self) -> bool {
        self.processed_files >= self.total_files
    }
}

/// The catalog exposed as a claimable list
#[derive(Debug)]
pub struct WorkQueue {
    state: Mutex<JobState>,
    shutdown: Arc<AtomicBool>,
}

impl WorkQueue {
    /// Build the queue from a finished catalog
    pub fn new(catalog: FileCatalog, shutdown: Arc<AtomicBool>) -> Self {
        let total_files = catalog.records.len() as u64;

        Self {
            state: Mutex::new(JobState {
                records: catalog.records,
                total_files,
                total_bytes: catalog.total_bytes,
                processed_files: 0,
                processed_bytes: 0,
                success_files: 0,
                cursor: 0,
                start_time: Instant::now(),
                started_at: Utc::now(),
            }),
            shutdown,
        }
    }

    /// Claim the next unclaimed record, or `None` when drained or cancelled
    pub fn claim_next(&self) -> Option<Claim> {
        if self.is_cancelled() {
            return None;
        }

        let mut state = self.state.lock();
        while state.cursor < state.records.len() {
            let index = state.cursor;
            state.cursor += 1;

            let record = &mut state.records[index];
            if !record.claimed {
                record.claimed = true;
                return Some(Claim {
                    index,
                    path: record.path.clone(),
                    size: record.size,
                });
            }
        }
        None
    }

    /// Credit `bytes` just written for the claimed record at `index`
    ///
    /// Credit per record is capped at its discovered size so the running
    /// total can never pass `total_bytes`. Returns the amount credited.
    pub fn record_progress(&self, index: usize, bytes: u64) -> u64 {
        let mut state = self.state.lock();
        let record = &mut state.records[index];
        debug_assert!(record.claimed && !record.finished);

        let credit = bytes.min(record.size - record.credited_bytes);
        record.credited_bytes += credit;
        state.processed_bytes += credit;
        credit
    }

    /// Resolve the claimed record at `index`
    ///
    /// A successful record ends up credited with exactly its discovered size;
    /// a failed one has its partial credit withdrawn. Resolving twice is a
    /// no-op.
    pub fn finish(&self, index: usize, success: bool) {
        let mut state = self.state.lock();
        let state = &mut *state;
        let record = &mut state.records[index];
        debug_assert!(record.claimed);
        if record.finished {
            return;
        }

        if success {
            state.processed_bytes += record.size - record.credited_bytes;
            record.credited_bytes = record.size;
            state.success_files += 1;
        } else {
            state.processed_bytes -= record.credited_bytes;
            record.credited_bytes = 0;
        }

        record.finished = true;
        record.success = success;
        state.processed_files += 1;
    }

    /// Read all counters in one critical section
    pub fn snapshot(&self) -> Snapshot {
        let state = self.state.lock();
        Snapshot {
            total_files: state.total_files,
            total_bytes: state.total_bytes,
            processed_files: state.processed_files,
            processed_bytes: state.processed_bytes,
            success_files: state.success_files,
            elapsed: state.start_time.elapsed(),
            started_at: state.started_at,
        }
    }

    /// Copy of every record, for the final report
    pub fn final_records(&self) -> Vec<FileRecord> {
        self.state.lock().records.clone()
    }

    /// Ask workers to stop at the next claim or chunk boundary
    pub fn cancel(&self) {
        self.shutdown.store(true, Ordering::SeqCst);
    }

    /// True once cancellation was requested
    pub fn is_cancelled(&self) -> bool {
        self.shutdown.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::thread;

    fn catalog(sizes: &[u64]) -> FileCatalog {
        let records: Vec<_> = sizes
            .iter()
            .enumerate()
            .map(|(i, &size)| FileRecord::new(format!("/in/f{i}.txt").into(), size, Utc::now()))
            .collect();
        FileCatalog {
            total_bytes: sizes.iter().sum(),
            records,
        }
    }

    fn queue(sizes: &[u64]) -> WorkQueue {
        WorkQueue::new(catalog(sizes), Arc::new(AtomicBool::new(false)))
    }

    #[test]
    fn test_claim_in_discovery_order() {
        let queue = queue(&[1, 2, 3]);

        let claims: Vec<_> = std::iter::from_fn(|| queue.claim_next()).collect();
        assert_eq!(claims.iter().map(|c| c.index).collect::<Vec<_>>(), vec![0, 1, 2]);
        assert_eq!(claims[1].size, 2);
        assert!(queue.claim_next().is_none());
    }

    #[test]
    fn test_claim_exclusive_under_contention() {
        let queue = Arc::new(queue(&[1; 2000]));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let queue = Arc::clone(&queue);
                thread::spawn(move || {
                    let mut mine = Vec::new();
                    while let Some(claim) = queue.claim_next() {
                        mine.push(claim.index);
                    }
                    mine
                })
            })
            .collect();

        let mut all = Vec::new();
        for h in handles {
            all.extend(h.join().unwrap());
        }

        assert_eq!(all.len(), 2000);
        let unique: HashSet<_> = all.iter().copied().collect();
        assert_eq!(unique.len(), 2000);
        assert!(queue.final_records().iter().all(|r| r.claimed));
    }

    #[test]
    fn test_progress_is_capped_per_record() {
        let queue = queue(&[10, 20]);
        let claim = queue.claim_next().unwrap();

        assert_eq!(queue.record_progress(claim.index, 8), 8);
        // File grew since discovery; credit stops at its recorded size
        assert_eq!(queue.record_progress(claim.index, 8), 2);
        assert_eq!(queue.snapshot().processed_bytes, 10);
    }

    #[test]
    fn test_finish_success_tops_up_to_size() {
        let queue = queue(&[10]);
        let claim = queue.claim_next().unwrap();
        queue.record_progress(claim.index, 4);

        queue.finish(claim.index, true);

        let snap = queue.snapshot();
        assert_eq!(snap.processed_files, 1);
        assert_eq!(snap.success_files, 1);
        assert_eq!(snap.processed_bytes, 10);
        assert!(snap.is_complete());
    }

    #[test]
    fn test_finish_failure_withdraws_credit() {
        let queue = queue(&[10, 20]);
        let a = queue.claim_next().unwrap();
        let b = queue.claim_next().unwrap();

        queue.record_progress(a.index, 10);
        queue.finish(a.index, true);
        queue.record_progress(b.index, 12);
        assert_eq!(queue.snapshot().processed_bytes, 22);

        queue.finish(b.index, false);

        let snap = queue.snapshot();
        assert_eq!(snap.processed_files, 2);
        assert_eq!(snap.success_files, 1);
        assert_eq!(snap.failures(), 1);
        assert_eq!(snap.processed_bytes, 10);

        let records = queue.final_records();
        assert!(records[0].success);
        assert!(records[1].finished && !records[1].success);
    }

    #[test]
    fn test_finish_twice_is_noop() {
        let queue = queue(&[5]);
        let claim = queue.claim_next().unwrap();
        queue.finish(claim.index, true);
        queue.finish(claim.index, true);

        let snap = queue.snapshot();
        assert_eq!(snap.processed_files, 1);
        assert_eq!(snap.processed_bytes, 5);
    }

    #[test]
    fn test_cancel_stops_claims() {
        let queue = queue(&[1, 1, 1]);
        assert!(queue.claim_next().is_some());

        queue.cancel();
        assert!(queue.is_cancelled());
        assert!(queue.claim_next().is_none());
        assert_eq!(queue.final_records().iter().filter(|r| r.claimed).count(), 1);
    }

    #[test]
    fn test_snapshot_math() {
        let snap = Snapshot {
            total_files: 4,
            total_bytes: 1000,
            processed_files: 2,
            processed_bytes: 250,
            success_files: 2,
            elapsed: Duration::from_secs(5),
            started_at: Utc::now(),
        };
        assert!((snap.fraction() - 0.25).abs() < f64::EPSILON);
        assert!((snap.throughput() - 50.0).abs() < 0.001);
        assert_eq!(snap.failures(), 2);
        assert!(!snap.is_complete());
    }

    #[test]
    fn test_empty_queue_is_complete() {
        let queue = queue(&[]);
        let snap = queue.snapshot();
        assert!(snap.is_complete());
        assert_eq!(snap.fraction(), 0.0);
        assert!(queue.claim_next().is_none());
    }
}

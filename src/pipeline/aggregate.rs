//! Final statistics once all workers have joined

use crate::error::Result;
use crate::pipeline::catalog::FileRecord;
use crate::pipeline::queue::{Snapshot, WorkQueue};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

/// Summary of a finished (or interrupted) run
#[derive(Debug, Clone, Serialize)]
pub struct FinalReport {
    pub started_at: DateTime<Utc>,
    pub elapsed_secs: f64,
    pub total_files: u64,
    pub processed_files: u64,
    pub success_files: u64,
    pub failures: u64,
    pub total_bytes: u64,
    pub processed_bytes: u64,
    /// `success_files / total_files`, 0 for an empty catalog
    pub success_rate: f64,
    /// Bytes per second over the whole run
    pub throughput: f64,
    pub completed: bool,
    pub failed_files: Vec<PathBuf>,
}

impl FinalReport {
    /// Read the final state of `queue`; the queue is not modified
    pub fn from_queue(queue: &WorkQueue, completed: bool) -> Self {
        Self::from_parts(&queue.snapshot(), &queue.final_records(), completed)
    }

    /// Build a report from a snapshot and the record list
    pub fn from_parts(snapshot: &Snapshot, records: &[FileRecord], completed: bool) -> Self {
        let success_rate = if snapshot.total_files == 0 {
            0.0
        } else {
            snapshot.success_files as f64 / snapshot.total_files as f64
        };

        let failed_files = records
            .iter()
            .filter(|r| r.finished && !r.success)
            .map(|r| r.path.clone())
            .collect();

        Self {
            started_at: snapshot.started_at,
            elapsed_secs: snapshot.elapsed.as_secs_f64(),
            total_files: snapshot.total_files,
            processed_files: snapshot.processed_files,
            success_files: snapshot.success_files,
            failures: snapshot.failures(),
            total_bytes: snapshot.total_bytes,
            processed_bytes: snapshot.processed_bytes,
            success_rate,
            throughput: snapshot.throughput(),
            completed,
            failed_files,
        }
    }

    /// Write the report as pretty-printed JSON
    pub fn write_json(&self, path: &Path) -> Result<()> {
        let mut writer = BufWriter::new(File::create(path)?);
        serde_json::to_writer_pretty(&mut writer, self)?;
        writer.write_all(b"\n")?;
        writer.flush()?;
        Ok(())
    }
}

//! Concurrent copy pipeline
//!
//! Discovery builds a fixed catalog once; a pool of worker threads then
//! drains it through a claim protocol while a single observer thread renders
//! progress. All shared counters sit behind one lock in [`WorkQueue`].
//!
//! # Architecture
//!
//! ```text
//!                     ┌─────────────────────────┐
//!                     │      FileCatalog        │
//!                     │  - read_dir + suffix    │
//!                     │  - size / mtime         │
//!                     └───────────┬─────────────┘
//!                                 │
//!                     ┌───────────▼─────────────┐
//!                     │  WorkQueue (JobState)   │◄──── snapshot ──┐
//!                     │  - claim_next           │                 │
//!                     │  - record_progress      │        ┌────────┴────────┐
//!                     │  - finish               │        │ ProgressTracker │
//!                     └───────────┬─────────────┘        └────────▲────────┘
//!                                 │                               │
//!       ┌─────────────────────────┼─────────────────────────┐     │
//!       │                         │                         │     │
//! ┌─────▼─────┐             ┌─────▼─────┐             ┌─────▼─────┐
//! │  Worker 1 │             │  Worker 2 │             │  Worker N │── FileEvent
//! │ read/write│             │ read/write│             │ read/write│
//! └───────────┘             └───────────┘             └───────────┘
//! ```

pub mod aggregate;
pub mod catalog;
pub mod coordinator;
pub mod queue;
pub mod tracker;
pub mod worker;

pub use aggregate::FinalReport;
pub use catalog::{FileCatalog, FileRecord};
pub use coordinator::{Pipeline, PipelineResult};
pub use queue::{Claim, Snapshot, WorkQueue};
pub use tracker::{FileEvent, ProgressTracker};
pub use worker::{Worker, WorkerStats, WorkerTotals};

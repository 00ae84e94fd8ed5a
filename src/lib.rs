//! file-pipeline - Concurrent Directory-Processing Pipeline
//!
//! Copies every file in a directory whose name matches a `*.ext` pattern
//! into an output directory, using a fixed pool of worker threads, while a
//! live progress bar reports byte throughput.
//!
//! # Features
//!
//! - **Exclusive claims**: each discovered file is handed to exactly one
//!   worker, however many workers race for it.
//!
//! - **Consistent progress**: every shared counter sits behind one lock, so
//!   the progress bar never shows a torn percentage.
//!
//! - **Contained failures**: a read or write error on one file removes that
//!   file's partial output and marks it failed; the rest of the run goes on.
//!
//! - **Graceful cancellation**: Ctrl-C stops workers at the next chunk
//!   boundary without leaving a corrupt copy behind.
//!
//! # Stages
//!
//! ```text
//!  Stage 1: Discovery      Stage 2: Processing          Stage 3: Aggregation
//! ┌──────────────────┐    ┌─────────────────────┐      ┌──────────────────┐
//! │ read_dir(input)  │───►│ N workers drain the │─────►│ success rate     │
//! │ filter *.ext     │    │ claimable catalog   │      │ throughput       │
//! │ size + mtime     │    │ + progress tracker  │      │ failed files     │
//! └──────────────────┘    └─────────────────────┘      └──────────────────┘
//! ```
//!
//! # Example
//!
//! ```bash
//! file-pipeline -i ./logs -o ./backup -p '*.log' -t 8
//! ```

pub mod config;
pub mod error;
pub mod pipeline;
pub mod progress;
pub mod storage;

pub use config::{CliArgs, PipelineConfig, SuffixPattern};
pub use error::{PipelineError, Result};
pub use pipeline::{FinalReport, Pipeline, PipelineResult};
pub use storage::{LocalStorage, OutputStream, Storage};

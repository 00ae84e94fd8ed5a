//! Progress reporting for the copy pipeline
//!
//! Provides real-time progress display using indicatif progress bars, plus
//! the header and final summary printed around a run.

use crate::config::PipelineConfig;
use crate::pipeline::aggregate::FinalReport;
use crate::pipeline::queue::Snapshot;
use console::style;
use humansize::{format_size, BINARY};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::Path;
use std::time::Duration;

/// Resolution of the bar position (the bar itself is 20 cells wide)
const BAR_SCALE: u64 = 1000;

/// Progress reporter that displays copy status
pub struct ProgressReporter {
    /// Progress bar
    bar: ProgressBar,
}

impl ProgressReporter {
    /// Create a new progress reporter
    pub fn new() -> Self {
        let bar = ProgressBar::new(BAR_SCALE);

        bar.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{elapsed_precise}] [{bar:20.cyan/blue}] {msg}")
                .expect("Invalid progress template")
                .progress_chars("=> ")
                .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏"),
        );

        bar.enable_steady_tick(Duration::from_millis(100));

        Self { bar }
    }

    /// Update the progress display from a consistent snapshot
    pub fn update(&self, snapshot: &Snapshot) {
        self.bar.set_position((snapshot.fraction() * BAR_SCALE as f64) as u64);
        self.bar.set_message(progress_message(snapshot));
    }

    /// Finish the progress display with a final message
    pub fn finish(&self, message: &str) {
        self.bar.finish_with_message(message.to_string());
    }
}

impl Default for ProgressReporter {
    fn default() -> Self {
        Self::new()
    }
}

/// Text shown next to the bar
pub fn progress_message(snapshot: &Snapshot) -> String {
    format!(
        "{:5.1}% ({}/s) | Files: {}/{} | {} / {}",
        snapshot.fraction() * 100.0,
        format_size(snapshot.throughput() as u64, BINARY),
        format_number(snapshot.processed_files),
        format_number(snapshot.total_files),
        format_size(snapshot.processed_bytes, BINARY),
        format_size(snapshot.total_bytes, BINARY),
    )
}

/// Format a number with thousands separators
fn format_number(n: u64) -> String {
    let s = n.to_string();
    let bytes: Vec<_> = s.bytes().rev().collect();

    let chunks: Vec<String> = bytes
        .chunks(3)
        .map(|chunk| {
            chunk
                .iter()
                .rev()
                .map(|&b| b as char)
                .collect::<String>()
        })
        .collect();

    chunks.into_iter().rev().collect::<Vec<_>>().join(",")
}

/// Print the final statistics of a run
pub fn print_summary(report: &FinalReport, output_dir: &Path) {
    let title = if report.completed {
        style("Pipeline Complete").green().bold()
    } else {
        style("Pipeline Interrupted").yellow().bold()
    };

    println!();
    println!("{}", title);
    println!("{}", style("─".repeat(50)).dim());
    println!(
        "  {} {} of {}",
        style("Processed:").bold(),
        format_number(report.processed_files),
        format_number(report.total_files)
    );
    println!(
        "  {} {}",
        style("Succeeded:").bold(),
        format_number(report.success_files)
    );
    if report.failures > 0 {
        println!(
            "  {} {}",
            style("Failed:").yellow().bold(),
            format_number(report.failures)
        );
    } else {
        println!("  {} 0", style("Failed:").bold());
    }
    println!(
        "  {} {:.1}% ({} of {})",
        style("Success Rate:").bold(),
        report.success_rate * 100.0,
        format_number(report.success_files),
        format_number(report.total_files)
    );
    println!(
        "  {} {:.1}s",
        style("Processing Time:").bold(),
        report.elapsed_secs
    );
    println!(
        "  {} {}/s",
        style("Average Speed:").bold(),
        format_size(report.throughput as u64, BINARY)
    );
    println!(
        "  {} {}",
        style("Output Size:").bold(),
        format_size(report.processed_bytes, BINARY)
    );
    println!("  {} {}", style("Output:").bold(), output_dir.display());
    for path in &report.failed_files {
        println!("    {} {}", style("✗").red(), path.display());
    }
    println!();
}

/// Print a header at the start of the run
pub fn print_header(config: &PipelineConfig) {
    println!();
    println!(
        "{} {}",
        style("file-pipeline").cyan().bold(),
        env!("CARGO_PKG_VERSION")
    );
    println!("{}", style("─".repeat(50)).dim());
    println!("  {} {}", style("Input:").bold(), config.input_dir.display());
    println!("  {} {}", style("Output:").bold(), config.output_dir.display());
    println!("  {} {}", style("Pattern:").bold(), config.pattern);
    println!("  {} {}", style("Threads:").bold(), config.worker_count);
    println!();
}

//! Configuration types for file-pipeline
//!
//! This module defines:
//! - CLI argument parsing using clap derive macros
//! - Runtime configuration with validation
//! - Suffix pattern parsing (`*.ext`)

use crate::error::ConfigError;
use clap::Parser;
use regex::Regex;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Maximum worker count
pub const MAX_WORKERS: usize = 16;

/// Default catalog cap
pub const DEFAULT_MAX_FILES: usize = 1000;

/// Default copy chunk size
pub const DEFAULT_BUFFER_SIZE: usize = 4096;

/// Copy chunk size limits
const MIN_BUFFER_SIZE: usize = 512;
const MAX_BUFFER_SIZE: usize = 16 * 1024 * 1024;

/// Progress poll interval limits (milliseconds)
const DEFAULT_INTERVAL_MS: u64 = 100;
const MIN_INTERVAL_MS: u64 = 10;
const MAX_INTERVAL_MS: u64 = 10_000;

/// Concurrent directory-processing pipeline
#[derive(Parser, Debug, Clone)]
#[command(
    name = "file-pipeline",
    version,
    about = "Copy files matching a pattern from one directory to another with a pool of workers",
    long_about = "Discovers files in INPUT whose names end with the pattern suffix, copies them \
                  into OUTPUT using a fixed pool of worker threads, and reports throughput and \
                  success rate.\n\n\
                  Per-file failures are recovered (the partial output is removed) and reflected \
                  in the final statistics.",
    after_help = "EXAMPLES:\n    \
        file-pipeline -i ./logs -o ./backup -p '*.log'\n    \
        file-pipeline -i ./in -o ./out -p '*.txt' -t 8 --report run.json\n    \
        file-pipeline -i ./in -o ./out -p '*.csv' --exclude '^tmp_' --fail-on-error"
)]
pub struct CliArgs {
    /// Input directory to scan (not recursive)
    #[arg(short = 'i', long = "input", value_name = "DIR")]
    pub input: PathBuf,

    /// Output directory (created if missing)
    #[arg(short = 'o', long = "output", value_name = "DIR")]
    pub output: PathBuf,

    /// File pattern in the form '*.ext'
    #[arg(short = 'p', long = "pattern", value_name = "PATTERN")]
    pub pattern: String,

    /// Number of worker threads (1-16)
    #[arg(
        short = 't',
        long = "threads",
        default_value_t = default_workers(),
        value_name = "NUM"
    )]
    pub threads: usize,

    /// Maximum number of files to discover
    #[arg(long, default_value_t = DEFAULT_MAX_FILES, value_name = "NUM")]
    pub max_files: usize,

    /// Copy chunk size in bytes
    #[arg(long, default_value_t = DEFAULT_BUFFER_SIZE, value_name = "BYTES")]
    pub buffer_size: usize,

    /// Progress refresh interval in milliseconds
    #[arg(long, default_value_t = DEFAULT_INTERVAL_MS, value_name = "MS")]
    pub interval_ms: u64,

    /// Skip file names matching this regex (can be repeated)
    #[arg(long = "exclude", value_name = "REGEX", action = clap::ArgAction::Append)]
    pub exclude_patterns: Vec<String>,

    /// Write the final report as JSON to this file
    #[arg(long, value_name = "FILE")]
    pub report: Option<PathBuf>,

    /// Exit with status 2 if any file failed to copy
    #[arg(long)]
    pub fail_on_error: bool,

    /// Quiet mode - suppress header and progress bar
    #[arg(short = 'q', long)]
    pub quiet: bool,

    /// Verbose output (per-file debug logging)
    #[arg(short = 'v', long)]
    pub verbose: bool,
}

fn default_workers() -> usize {
    num_cpus::get().clamp(1, MAX_WORKERS)
}

/// A `*.ext` pattern: a single leading wildcard followed by a literal suffix
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SuffixPattern {
    raw: String,
    suffix: String,
}

impl SuffixPattern {
    /// Parse a pattern of the form `*<suffix>`
    ///
    /// A bare `*` is accepted and matches every file name.
    pub fn parse(pattern: &str) -> Result<Self, ConfigError> {
        let invalid = |reason: &str| ConfigError::InvalidPattern {
            pattern: pattern.to_string(),
            reason: reason.to_string(),
        };

        let suffix = pattern
            .strip_prefix('*')
            .ok_or_else(|| invalid("must start with '*' (e.g. '*.txt')"))?;

        if suffix.contains('*') {
            return Err(invalid("only a single leading '*' is supported"));
        }
        if suffix.contains('/') || suffix.contains(std::path::MAIN_SEPARATOR) {
            return Err(invalid("suffix must not contain a path separator"));
        }

        Ok(Self {
            raw: pattern.to_string(),
            suffix: suffix.to_string(),
        })
    }

    /// Whether a file name ends with this pattern's suffix
    pub fn matches(&self, file_name: &str) -> bool {
        file_name.ends_with(&self.suffix)
    }

    /// The literal suffix after the wildcard
    pub fn suffix(&self) -> &str {
        &self.suffix
    }

}

impl std::fmt::Display for SuffixPattern {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.raw)
    }
}

/// Validated runtime configuration
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Directory scanned during discovery
    pub input_dir: PathBuf,

    /// Directory copies are written to
    pub output_dir: PathBuf,

    /// File name filter
    pub pattern: SuffixPattern,

    /// Number of worker threads
    pub worker_count: usize,

    /// Discovery cap
    pub max_files: usize,

    /// Copy chunk size
    pub buffer_size: usize,

    /// Progress refresh interval
    pub progress_interval: Duration,

    /// Compiled exclude patterns (matched against file names)
    pub exclude_patterns: Vec<Regex>,

    /// Optional JSON report destination
    pub report_path: Option<PathBuf>,

    /// Reflect per-file failures in the exit status
    pub fail_on_error: bool,

    /// Show header and progress bar
    pub show_progress: bool,
}

impl PipelineConfig {
    /// Configuration with defaults for everything but the three required inputs
    pub fn new(
        input_dir: impl Into<PathBuf>,
        output_dir: impl Into<PathBuf>,
        pattern: &str,
    ) -> Result<Self, ConfigError> {
        let config = Self {
            input_dir: input_dir.into(),
            output_dir: output_dir.into(),
            pattern: SuffixPattern::parse(pattern)?,
            worker_count: default_workers(),
            max_files: DEFAULT_MAX_FILES,
            buffer_size: DEFAULT_BUFFER_SIZE,
            progress_interval: Duration::from_millis(DEFAULT_INTERVAL_MS),
            exclude_patterns: Vec::new(),
            report_path: None,
            fail_on_error: false,
            show_progress: false,
        };
        config.validate()?;
        Ok(config)
    }

    /// Create and validate configuration from CLI arguments
    pub fn from_args(args: CliArgs) -> Result<Self, ConfigError> {
        let pattern = SuffixPattern::parse(&args.pattern)?;

        let exclude_patterns = args
            .exclude_patterns
            .iter()
            .map(|p| {
                Regex::new(p).map_err(|e| ConfigError::InvalidExcludePattern {
                    pattern: p.clone(),
                    reason: e.to_string(),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        let config = Self {
            input_dir: args.input,
            output_dir: args.output,
            pattern,
            worker_count: args.threads,
            max_files: args.max_files,
            buffer_size: args.buffer_size,
            progress_interval: Duration::from_millis(args.interval_ms),
            exclude_patterns,
            report_path: args.report,
            fail_on_error: args.fail_on_error,
            show_progress: !args.quiet,
        };
        config.validate()?;
        Ok(config)
    }

    /// Check numeric ranges and directory sanity
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.worker_count == 0 || self.worker_count > MAX_WORKERS {
            return Err(ConfigError::InvalidWorkerCount {
                count: self.worker_count,
                max: MAX_WORKERS,
            });
        }

        if self.max_files == 0 {
            return Err(ConfigError::InvalidMaxFiles {
                count: self.max_files,
            });
        }

        if self.buffer_size < MIN_BUFFER_SIZE || self.buffer_size > MAX_BUFFER_SIZE {
            return Err(ConfigError::InvalidBufferSize {
                size: self.buffer_size,
                min: MIN_BUFFER_SIZE,
                max: MAX_BUFFER_SIZE,
            });
        }

        let millis = self.progress_interval.as_millis() as u64;
        if !(MIN_INTERVAL_MS..=MAX_INTERVAL_MS).contains(&millis) {
            return Err(ConfigError::InvalidInterval {
                millis,
                min: MIN_INTERVAL_MS,
                max: MAX_INTERVAL_MS,
            });
        }

        if self.output_dir.as_os_str().is_empty() {
            return Err(ConfigError::InvalidOutputDir {
                path: self.output_dir.clone(),
                reason: "path is empty".to_string(),
            });
        }

        // Copying a directory onto itself would truncate every source file
        if same_directory(&self.input_dir, &self.output_dir) {
            return Err(ConfigError::InvalidOutputDir {
                path: self.output_dir.clone(),
                reason: "output directory must differ from input directory".to_string(),
            });
        }

        if self.output_dir.exists() && !self.output_dir.is_dir() {
            return Err(ConfigError::InvalidOutputDir {
                path: self.output_dir.clone(),
                reason: "exists and is not a directory".to_string(),
            });
        }

        Ok(())
    }

    /// Check if a file name should be excluded
    pub fn is_excluded(&self, file_name: &str) -> bool {
        self.exclude_patterns.iter().any(|re| re.is_match(file_name))
    }

    /// Output path for a source file: same base name under the output directory
    pub fn output_path_for(&self, source: &Path) -> Option<PathBuf> {
        source.file_name().map(|name| self.output_dir.join(name))
    }
}

fn same_directory(a: &Path, b: &Path) -> bool {
    match (a.canonicalize(), b.canonicalize()) {
        (Ok(a), Ok(b)) => a == b,
        _ => a == b,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_parse_pattern() {
        let pattern = SuffixPattern::parse("*.txt").unwrap();
        assert_eq!(pattern.suffix(), ".txt");
        assert!(pattern.matches("a.txt"));
        assert!(pattern.matches("archive.tar.txt"));
        assert!(!pattern.matches("a.txt.bak"));
        assert!(!pattern.matches("a.log"));
    }

    #[test]
    fn test_parse_pattern_multi_dot_suffix() {
        let pattern = SuffixPattern::parse("*.tar.gz").unwrap();
        assert!(pattern.matches("backup.tar.gz"));
        assert!(!pattern.matches("backup.gz"));
    }

    #[test]
    fn test_bare_wildcard_matches_everything() {
        let pattern = SuffixPattern::parse("*").unwrap();
        assert_eq!(pattern.suffix(), "");
        assert!(pattern.matches("anything"));
    }

    #[test]
    fn test_parse_invalid_pattern() {
        assert!(SuffixPattern::parse(".txt").is_err());
        assert!(SuffixPattern::parse("a*.txt").is_err());
        assert!(SuffixPattern::parse("*.t*t").is_err());
        assert!(SuffixPattern::parse("*/x.txt").is_err());
        assert!(SuffixPattern::parse("").is_err());
    }

    #[test]
    fn test_worker_count_range() {
        let dir = tempdir().unwrap();
        let mut config =
            PipelineConfig::new(dir.path().join("in"), dir.path().join("out"), "*.txt").unwrap();

        config.worker_count = 0;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidWorkerCount { count: 0, .. })
        ));

        config.worker_count = MAX_WORKERS + 1;
        assert!(config.validate().is_err());

        config.worker_count = MAX_WORKERS;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_buffer_and_interval_ranges() {
        let dir = tempdir().unwrap();
        let mut config =
            PipelineConfig::new(dir.path().join("in"), dir.path().join("out"), "*.txt").unwrap();

        config.buffer_size = 1;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidBufferSize { .. })
        ));
        config.buffer_size = DEFAULT_BUFFER_SIZE;

        config.progress_interval = Duration::from_millis(1);
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidInterval { .. })
        ));
    }

    #[test]
    fn test_output_equal_to_input_rejected() {
        let dir = tempdir().unwrap();
        let result = PipelineConfig::new(dir.path(), dir.path(), "*.txt");
        assert!(matches!(
            result,
            Err(ConfigError::InvalidOutputDir { .. })
        ));
    }

    #[test]
    fn test_exclude_pattern() {
        let dir = tempdir().unwrap();
        let mut config =
            PipelineConfig::new(dir.path().join("in"), dir.path().join("out"), "*.txt").unwrap();
        config.exclude_patterns = vec![Regex::new(r"^tmp_").unwrap()];

        assert!(config.is_excluded("tmp_scratch.txt"));
        assert!(!config.is_excluded("notes.txt"));
    }

    #[test]
    fn test_from_args() {
        let dir = tempdir().unwrap();
        let input = dir.path().join("in");
        let output = dir.path().join("out");
        let args = CliArgs::parse_from([
            "file-pipeline",
            "-i",
            input.to_str().unwrap(),
            "-o",
            output.to_str().unwrap(),
            "-p",
            "*.log",
            "-t",
            "4",
            "--exclude",
            "^skip",
            "-q",
        ]);

        let config = PipelineConfig::from_args(args).unwrap();
        assert_eq!(config.worker_count, 4);
        assert_eq!(config.pattern.suffix(), ".log");
        assert_eq!(config.exclude_patterns.len(), 1);
        assert!(!config.show_progress);
        assert_eq!(config.max_files, DEFAULT_MAX_FILES);
    }

    #[test]
    fn test_from_args_bad_regex() {
        let args = CliArgs::parse_from([
            "file-pipeline",
            "-i",
            "in",
            "-o",
            "out",
            "-p",
            "*.log",
            "--exclude",
            "(",
        ]);
        assert!(matches!(
            PipelineConfig::from_args(args),
            Err(ConfigError::InvalidExcludePattern { .. })
        ));
    }

    #[test]
    fn test_output_path_for() {
        let config = PipelineConfig::new("/data/in", "/data/out", "*.txt").unwrap();
        assert_eq!(
            config.output_path_for(Path::new("/data/in/a.txt")),
            Some(PathBuf::from("/data/out/a.txt"))
        );
    }
}

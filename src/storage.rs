//! Byte-stream storage used by the workers
//!
//! Workers never touch `std::fs` directly; they go through [`Storage`] so a
//! run can be pointed at something other than the local disk (tests use this
//! to inject write failures partway through a file).
//!
//! Output streams expose [`OutputStream::sync`] so errors the OS only reports
//! when a file is closed still reach the worker as a per-file failure.

use std::fs::{self, File, OpenOptions};
use std::io::{self, Read, Write};
use std::path::Path;

/// Readable byte stream handed out by a [`Storage`]
pub type Reader = Box<dyn Read + Send>;

/// Writable byte stream that can be forced to stable storage
pub trait OutputStream: Write + Send {
    /// Flush OS buffers; surfaces errors that would otherwise appear on close
    fn sync(&mut self) -> io::Result<()>;
}

impl OutputStream for File {
    fn sync(&mut self) -> io::Result<()> {
        self.sync_all()
    }
}

/// Writable byte stream handed out by a [`Storage`]
pub type Writer = Box<dyn OutputStream>;

/// Open/create/remove operations needed to copy one file
pub trait Storage: Send + Sync {
    /// Open an existing file for reading
    fn open_read(&self, path: &Path) -> io::Result<Reader>;

    /// Create (or truncate) a file for writing
    fn create_write(&self, path: &Path) -> io::Result<Writer>;

    /// Remove a file if present; used to clear output for a failed copy
    fn remove(&self, path: &Path) -> io::Result<()>;
}

/// Local filesystem storage
#[derive(Debug, Default, Clone, Copy)]
pub struct LocalStorage;

impl Storage for LocalStorage {
    fn open_read(&self, path: &Path) -> io::Result<Reader> {
        Ok(Box::new(File::open(path)?))
    }

    fn create_write(&self, path: &Path) -> io::Result<Writer> {
        // Unbuffered: workers already write in fixed-size chunks and credit
        // progress only once a chunk has reached the file
        let file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(path)?;
        Ok(Box::new(file))
    }

    fn remove(&self, path: &Path) -> io::Result<()> {
        match fs::remove_file(path) {
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            other => other,
        }
    }
}

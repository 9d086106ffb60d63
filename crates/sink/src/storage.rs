//! Pluggable storage backends
//!
//! The sink persists bytes through a trait pair so tests can substitute
//! failing or observing doubles without touching the rotation logic:
//!
//! - [`StorageBackend`] opens named targets
//! - [`StorageHandle`] is one open target: buffered writes, flush, close
//!
//! The production implementation is [`FileBackend`], which hands out
//! append-mode files wrapped in a `BufWriter`.

use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

/// Default write buffer size for file handles (64KB)
pub const DEFAULT_BUFFER_SIZE: usize = 64 * 1024;

/// Opens named storage targets
pub trait StorageBackend: Send {
    /// Open the target with the given name, creating it if needed
    fn open(&self, name: &str) -> io::Result<Box<dyn StorageHandle>>;
}

/// One open storage target
///
/// All writes may block; the sink assumes they terminate. Closing flushes
/// any buffered bytes first.
pub trait StorageHandle: Write + Send {
    /// Flush buffered bytes to the underlying target
    fn flush_all(&mut self) -> io::Result<()>;

    /// Flush and close, consuming the handle
    fn close(self: Box<Self>) -> io::Result<()>;

    /// Bytes written since this handle was opened
    fn bytes_written(&self) -> u64;
}

/// File-based storage backend
///
/// Opens `{directory}/{name}` in append mode with buffered writes. The
/// directory is created on first open.
#[derive(Debug, Clone)]
pub struct FileBackend {
    directory: PathBuf,
    buffer_size: usize,
}

impl FileBackend {
    /// Create a backend rooted at `directory`
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: directory.into(),
            buffer_size: DEFAULT_BUFFER_SIZE,
        }
    }

    /// Override the write buffer size
    #[must_use]
    pub fn with_buffer_size(mut self, buffer_size: usize) -> Self {
        self.buffer_size = buffer_size;
        self
    }

    /// The directory this backend writes into
    pub fn directory(&self) -> &Path {
        &self.directory
    }
}

impl StorageBackend for FileBackend {
    fn open(&self, name: &str) -> io::Result<Box<dyn StorageHandle>> {
        fs::create_dir_all(&self.directory)?;

        let path = self.directory.join(name);
        let file = File::options().create(true).append(true).open(&path)?;

        tracing::debug!(path = %path.display(), "opened sink file");

        Ok(Box::new(FileHandle {
            writer: BufWriter::with_capacity(self.buffer_size, file),
            bytes_written: 0,
        }))
    }
}

struct FileHandle {
    writer: BufWriter<File>,
    bytes_written: u64,
}

impl Write for FileHandle {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let n = self.writer.write(buf)?;
        self.bytes_written += n as u64;
        Ok(n)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.writer.flush()
    }
}

impl StorageHandle for FileHandle {
    fn flush_all(&mut self) -> io::Result<()> {
        self.writer.flush()
    }

    fn close(mut self: Box<Self>) -> io::Result<()> {
        self.writer.flush()
    }

    fn bytes_written(&self) -> u64 {
        self.bytes_written
    }
}

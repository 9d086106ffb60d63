//! Rotation hooks invoked when a file is closed
//!
//! The hook is user-supplied code that runs synchronously inside the sink's
//! rotation transition, after the old file is closed and before the new one
//! is opened. The contract places no bound on what the hook does: it may be
//! slow, block forever, or attempt reentrant access to the sink. The sink
//! does not defend against any of that.

/// Snapshot of the file that was just closed, handed to the hook
#[derive(Debug, Clone)]
pub struct RotatedFile {
    /// File name as opened through the storage backend
    pub name: String,

    /// Zero-based index of this file in the rotation sequence
    pub index: u64,

    /// Bytes written to the file while it was open
    pub bytes: u64,

    /// Records written to the file while it was open
    pub records: u64,
}

/// Callback invoked at the moment a file is closed during rotation
///
/// Runs to completion while the sink holds its exclusive section; no writer
/// makes progress until it returns.
pub trait RotationHook: Send + Sync {
    /// Called once per rotation with the closed file's stats
    fn on_close(&self, closed: &RotatedFile);
}

impl<F> RotationHook for F
where
    F: Fn(&RotatedFile) + Send + Sync,
{
    fn on_close(&self, closed: &RotatedFile) {
        self(closed)
    }
}

/// Hook that does nothing
pub struct NoopHook;

impl RotationHook for NoopHook {
    fn on_close(&self, _closed: &RotatedFile) {}
}

//! Tests for the rotating sink

use std::fs;
use std::io::{self, Write};
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use crossbeam::channel::{Receiver, Sender, bounded};
use tempfile::TempDir;

use crate::common::SinkError;
use crate::hook::{NoopHook, RotatedFile, RotationHook};
use crate::record::{LogRecord, SequenceGenerator, Severity};
use crate::rotating::{RotatingSink, SinkConfig, SinkMode};
use crate::storage::{FileBackend, StorageBackend, StorageHandle};

// ============================================================================
// Helpers
// ============================================================================

fn config(threshold: u64, mode: SinkMode) -> SinkConfig {
    SinkConfig::default()
        .with_prefix("test")
        .with_threshold_bytes(threshold)
        .with_mode(mode)
}

fn file_sink(dir: &Path, threshold: u64, mode: SinkMode) -> RotatingSink {
    RotatingSink::open(
        config(threshold, mode),
        Box::new(FileBackend::new(dir)),
        Arc::new(NoopHook),
    )
    .unwrap()
}

/// Build a record whose formatted line is exactly `len` bytes
fn sized_record(seq: u64, len: usize) -> LogRecord {
    let base = LogRecord::new(seq, Severity::Info, 0, String::new())
        .to_line()
        .len();
    assert!(len >= base, "line cannot be shorter than {base} bytes");
    LogRecord::new(seq, Severity::Info, 0, "x".repeat(len - base))
}

/// Read all sink files in `dir`, sorted by file name
fn read_files(dir: &Path) -> Vec<(String, String)> {
    let mut files: Vec<(String, String)> = fs::read_dir(dir)
        .unwrap()
        .map(|entry| {
            let entry = entry.unwrap();
            let name = entry.file_name().to_string_lossy().into_owned();
            let content = fs::read_to_string(entry.path()).unwrap();
            (name, content)
        })
        .collect();
    files.sort();
    files
}

/// Extract the sequence id from a formatted line
fn parse_seq(line: &str) -> u64 {
    line.splitn(4, "] [")
        .nth(2)
        .and_then(|field| field.parse().ok())
        .unwrap_or_else(|| panic!("malformed line: {line:?}"))
}

/// Hook that blocks on its first invocation until released
struct BlockOnceHook {
    entered: Sender<()>,
    release: Receiver<()>,
    fired: AtomicBool,
}

impl BlockOnceHook {
    fn new() -> (Self, Receiver<()>, Sender<()>) {
        let (entered_tx, entered_rx) = bounded(1);
        let (release_tx, release_rx) = bounded(1);
        let hook = Self {
            entered: entered_tx,
            release: release_rx,
            fired: AtomicBool::new(false),
        };
        (hook, entered_rx, release_tx)
    }
}

impl RotationHook for BlockOnceHook {
    fn on_close(&self, _closed: &RotatedFile) {
        if !self.fired.swap(true, Ordering::SeqCst) {
            let _ = self.entered.send(());
            let _ = self.release.recv();
        }
    }
}

/// Backend whose handles fail every write
struct FailingBackend;

impl StorageBackend for FailingBackend {
    fn open(&self, _name: &str) -> io::Result<Box<dyn StorageHandle>> {
        Ok(Box::new(FailingHandle))
    }
}

struct FailingHandle;

impl Write for FailingHandle {
    fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
        Err(io::Error::other("injected write failure"))
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl StorageHandle for FailingHandle {
    fn flush_all(&mut self) -> io::Result<()> {
        Ok(())
    }

    fn close(self: Box<Self>) -> io::Result<()> {
        Ok(())
    }

    fn bytes_written(&self) -> u64 {
        0
    }
}

// ============================================================================
// Open / Close
// ============================================================================

#[test]
fn test_open_creates_initial_file() {
    let dir = TempDir::new().unwrap();
    let sink = file_sink(dir.path(), 1000, SinkMode::Sync);

    assert_eq!(sink.rotation_count(), 0);
    sink.close().unwrap();

    let files = read_files(dir.path());
    assert_eq!(files.len(), 1);
    assert_eq!(files[0].0, "test.00000.log");
    assert!(files[0].1.is_empty());
}

#[test]
fn test_write_after_close_fails_sync() {
    let dir = TempDir::new().unwrap();
    let sink = file_sink(dir.path(), 1000, SinkMode::Sync);
    sink.close().unwrap();

    let result = sink.write(&sized_record(0, 120));
    assert!(matches!(result, Err(SinkError::Closed)));
}

#[test]
fn test_write_after_close_fails_async() {
    let dir = TempDir::new().unwrap();
    let sink = file_sink(dir.path(), 1000, SinkMode::Async);
    sink.close().unwrap();

    let result = sink.write(&sized_record(0, 120));
    assert!(matches!(result, Err(SinkError::Closed)));
}

// ============================================================================
// Rotation Boundary (evaluate-before-write)
// ============================================================================

#[test]
fn test_rotation_boundary_determinism() {
    // threshold 1000, fixed 120-byte records: 120 * 9 = 1080 > 1000, so the
    // 9th record opens file 2 and is never the last record of file 1
    let dir = TempDir::new().unwrap();
    let sink = file_sink(dir.path(), 1000, SinkMode::Sync);

    for seq in 1..=8 {
        sink.write(&sized_record(seq, 120)).unwrap();
        assert_eq!(sink.rotation_count(), 0);
    }

    sink.write(&sized_record(9, 120)).unwrap();
    assert_eq!(sink.rotation_count(), 1);

    sink.close().unwrap();

    let files = read_files(dir.path());
    assert_eq!(files.len(), 2);

    let (ref first_name, ref first) = files[0];
    assert_eq!(first_name, "test.00000.log");
    assert_eq!(first.lines().count(), 8);
    assert_eq!(first.len(), 960);

    let (ref second_name, ref second) = files[1];
    assert_eq!(second_name, "test.00001.log");
    assert_eq!(second.lines().count(), 1);
    assert_eq!(parse_seq(second.lines().next().unwrap()), 9);
}

#[test]
fn test_rotation_count_increments_once_per_transition() {
    // threshold 250, 100-byte records: rotation on writes 3, 5, 7, 9
    let dir = TempDir::new().unwrap();
    let sink = file_sink(dir.path(), 250, SinkMode::Sync);

    let expected = [0, 0, 1, 1, 2, 2, 3, 3, 4, 4];
    for (i, want) in expected.iter().enumerate() {
        sink.write(&sized_record(i as u64, 100)).unwrap();
        assert_eq!(sink.rotation_count(), *want, "after write {}", i + 1);
    }

    sink.close().unwrap();
}

#[test]
fn test_record_larger_than_threshold_lands_alone() {
    let dir = TempDir::new().unwrap();
    let sink = file_sink(dir.path(), 50, SinkMode::Sync);

    for seq in 0..3 {
        sink.write(&sized_record(seq, 120)).unwrap();
    }
    assert_eq!(sink.rotation_count(), 3);
    sink.close().unwrap();

    let files = read_files(dir.path());
    assert_eq!(files.len(), 4);
    // The initial file rotated away empty; every record sits alone
    assert!(files[0].1.is_empty());
    for (name, content) in &files[1..] {
        assert_eq!(content.lines().count(), 1, "{name}");
    }
}

#[test]
fn test_bytes_since_open_overflows_threshold_by_at_most_one_record() {
    let dir = TempDir::new().unwrap();
    let sink = file_sink(dir.path(), 500, SinkMode::Sync);

    for seq in 0..40 {
        sink.write(&sized_record(seq, 90)).unwrap();
    }
    sink.close().unwrap();

    for (name, content) in read_files(dir.path()) {
        assert!(
            content.len() as u64 <= 500 + 90,
            "{name} holds {} bytes",
            content.len()
        );
    }
}

// ============================================================================
// Hook Contract
// ============================================================================

#[test]
fn test_hook_receives_closed_file_stats() {
    let seen: Arc<parking_lot::Mutex<Vec<RotatedFile>>> =
        Arc::new(parking_lot::Mutex::new(Vec::new()));
    let hook = {
        let seen = Arc::clone(&seen);
        move |closed: &RotatedFile| seen.lock().push(closed.clone())
    };

    let dir = TempDir::new().unwrap();
    let sink = RotatingSink::open(
        config(100, SinkMode::Sync),
        Box::new(FileBackend::new(dir.path())),
        Arc::new(hook),
    )
    .unwrap();

    sink.write(&sized_record(0, 60)).unwrap();
    sink.write(&sized_record(1, 60)).unwrap();
    sink.close().unwrap();

    let seen = seen.lock();
    assert_eq!(seen.len(), 1);
    assert_eq!(seen[0].name, "test.00000.log");
    assert_eq!(seen[0].index, 0);
    assert_eq!(seen[0].bytes, 60);
    assert_eq!(seen[0].records, 1);
}

#[test]
fn test_final_close_does_not_invoke_hook() {
    let calls = Arc::new(AtomicBool::new(false));
    let hook = {
        let calls = Arc::clone(&calls);
        move |_closed: &RotatedFile| calls.store(true, Ordering::SeqCst)
    };

    let dir = TempDir::new().unwrap();
    let sink = RotatingSink::open(
        config(10_000, SinkMode::Sync),
        Box::new(FileBackend::new(dir.path())),
        Arc::new(hook),
    )
    .unwrap();

    sink.write(&sized_record(0, 60)).unwrap();
    sink.close().unwrap();

    assert!(!calls.load(Ordering::SeqCst));
}

// ============================================================================
// Concurrency
// ============================================================================

#[test]
fn test_concurrent_writers_no_torn_lines() {
    let dir = TempDir::new().unwrap();
    let sink = Arc::new(file_sink(dir.path(), 2000, SinkMode::Sync));
    let seq = Arc::new(SequenceGenerator::new());

    let mut handles = Vec::new();
    for worker in 0..4 {
        let sink = Arc::clone(&sink);
        let seq = Arc::clone(&seq);
        handles.push(std::thread::spawn(move || {
            for i in 0..250 {
                let message = format!("worker {worker} payload {i} {}", "y".repeat(worker * 13));
                let record = LogRecord::new(seq.next(), Severity::Info, worker, message);
                sink.write(&record).unwrap();
            }
        }));
    }
    for handle in handles {
        handle.join().unwrap();
    }
    sink.close().unwrap();

    let mut seqs = Vec::new();
    for (name, content) in read_files(dir.path()) {
        for line in content.lines() {
            assert!(line.starts_with("[20"), "torn line in {name}: {line:?}");
            seqs.push(parse_seq(line));
        }
    }

    // No torn, lost, or duplicated records across 4 writers
    assert_eq!(seqs.len(), 1000);
    seqs.sort_unstable();
    for (expected, seq) in seqs.iter().enumerate() {
        assert_eq!(*seq, expected as u64);
    }
}

#[test]
fn test_wedged_hook_stalls_writers_but_counter_stays_readable() {
    let (hook, entered, release) = BlockOnceHook::new();
    let dir = TempDir::new().unwrap();
    let sink = Arc::new(
        RotatingSink::open(
            config(150, SinkMode::Sync),
            Box::new(FileBackend::new(dir.path())),
            Arc::new(hook),
        )
        .unwrap(),
    );

    // Third 60-byte record crosses the threshold and wedges inside the hook
    let writer = {
        let sink = Arc::clone(&sink);
        std::thread::spawn(move || {
            for seq in 0..3 {
                sink.write(&sized_record(seq, 60)).unwrap();
            }
        })
    };

    entered
        .recv_timeout(Duration::from_secs(5))
        .expect("hook never entered");

    // Transition incomplete: the counter still reads, and still reads zero
    assert_eq!(sink.rotation_count(), 0);

    let done = Arc::new(AtomicBool::new(false));
    let blocked = {
        let sink = Arc::clone(&sink);
        let done = Arc::clone(&done);
        std::thread::spawn(move || {
            sink.write(&sized_record(100, 60)).unwrap();
            done.store(true, Ordering::SeqCst);
        })
    };

    std::thread::sleep(Duration::from_millis(100));
    assert!(!done.load(Ordering::SeqCst), "writer got past a wedged rotation");
    assert_eq!(sink.rotation_count(), 0);

    release.send(()).unwrap();
    writer.join().unwrap();
    blocked.join().unwrap();

    assert!(done.load(Ordering::SeqCst));
    assert_eq!(sink.rotation_count(), 1);
    sink.close().unwrap();
}

#[test]
fn test_async_writers_unblocked_by_wedged_consumer() {
    let (hook, entered, release) = BlockOnceHook::new();
    let dir = TempDir::new().unwrap();
    let sink = RotatingSink::open(
        config(150, SinkMode::Async),
        Box::new(FileBackend::new(dir.path())),
        Arc::new(hook),
    )
    .unwrap();

    // Every write returns immediately even though the consumer wedges on
    // its first rotation
    for seq in 0..100 {
        sink.write(&sized_record(seq, 60)).unwrap();
    }

    entered
        .recv_timeout(Duration::from_secs(5))
        .expect("consumer never reached the hook");
    assert_eq!(sink.rotation_count(), 0);

    release.send(()).unwrap();
    sink.close().unwrap();

    // 60-byte records against a 150-byte threshold: two records per file
    assert_eq!(sink.rotation_count(), 49);

    let mut seqs = Vec::new();
    for (_, content) in read_files(dir.path()) {
        for line in content.lines() {
            seqs.push(parse_seq(line));
        }
    }
    seqs.sort_unstable();
    assert_eq!(seqs.len(), 100);
    for (expected, seq) in seqs.iter().enumerate() {
        assert_eq!(*seq, expected as u64);
    }
}

#[test]
fn test_async_mode_drains_queue_on_close() {
    let dir = TempDir::new().unwrap();
    let sink = file_sink(dir.path(), 10_000, SinkMode::Async);

    for seq in 0..50 {
        sink.write(&sized_record(seq, 60)).unwrap();
    }
    sink.close().unwrap();

    let files = read_files(dir.path());
    assert_eq!(files.len(), 1);
    assert_eq!(files[0].1.lines().count(), 50);
    assert_eq!(sink.metrics().snapshot().records_written, 50);
}

// ============================================================================
// Error Propagation
// ============================================================================

#[test]
fn test_storage_write_failure_propagates() {
    let sink = RotatingSink::open(
        config(1000, SinkMode::Sync),
        Box::new(FailingBackend),
        Arc::new(NoopHook),
    )
    .unwrap();

    let result = sink.write(&sized_record(0, 120));
    assert!(matches!(result, Err(SinkError::Io(_))));
    assert_eq!(sink.metrics().snapshot().write_errors, 1);
    assert_eq!(sink.metrics().snapshot().records_written, 0);
}

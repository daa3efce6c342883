//! Batch quarantine moves.

use dupsweep::actions::{ensure_destination, move_batch, TransferConfig, TransferError};
use dupsweep::progress::ProgressCallback;
use dupsweep::scanner::FileRecord;
use std::fs;
use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

#[derive(Default)]
struct PhaseLog {
    events: Mutex<Vec<String>>,
}

impl ProgressCallback for PhaseLog {
    fn on_phase_start(&self, phase: &str, total: usize) {
        self.events.lock().unwrap().push(format!("{phase}:{total}"));
    }

    fn on_progress(&self, _current: usize, _name: &str) {}

    fn on_phase_end(&self, phase: &str) {
        self.events.lock().unwrap().push(format!("{phase}:done"));
    }
}

fn records(names: &[&str]) -> Vec<FileRecord> {
    names.iter().map(|n| FileRecord::new(*n, "ab")).collect()
}

#[test]
fn test_batch_keeps_input_order_and_isolates_failures() {
    let dir = TempDir::new().unwrap();
    let dest = dir.path().join("duplicates");
    for name in ["f1", "f2", "f4"] {
        fs::write(dir.path().join(name), name).unwrap();
    }
    ensure_destination(&dest).unwrap();

    let batch = move_batch(
        &records(&["f1", "f2", "f3", "f4"]),
        dir.path(),
        &dest,
        &TransferConfig::default().with_io_threads(2),
    );

    let moved: Vec<&str> = batch.successes.iter().map(|s| s.name.as_str()).collect();
    assert_eq!(moved, ["f1", "f2", "f4"]);
    assert_eq!(batch.failure_count(), 1);
    assert_eq!(batch.failures[0].name, "f3");
    assert!(matches!(batch.failures[0].error, TransferError::NotFound(_)));
    assert_eq!(batch.bytes_moved, 6);
    assert!(dest.join("f4").exists());
}

#[test]
fn test_batch_after_shutdown_moves_nothing() {
    let dir = TempDir::new().unwrap();
    let dest = dir.path().join("duplicates");
    fs::write(dir.path().join("a"), b"x").unwrap();
    fs::write(dir.path().join("b"), b"x").unwrap();
    ensure_destination(&dest).unwrap();

    let config = TransferConfig::default().with_shutdown_flag(Arc::new(AtomicBool::new(true)));
    let batch = move_batch(&records(&["a", "b"]), dir.path(), &dest, &config);

    assert_eq!(batch.success_count(), 0);
    assert!(batch
        .failures
        .iter()
        .all(|f| matches!(f.error, TransferError::Interrupted(_))));
    assert!(dir.path().join("a").exists());
    assert!(dir.path().join("b").exists());
}

#[test]
fn test_batch_reports_moving_phase() {
    let dir = TempDir::new().unwrap();
    let dest = dir.path().join("q");
    fs::write(dir.path().join("a"), b"x").unwrap();
    ensure_destination(&dest).unwrap();
    let log = Arc::new(PhaseLog::default());

    move_batch(
        &records(&["a"]),
        dir.path(),
        &dest,
        &TransferConfig::default().with_progress_callback(log.clone()),
    );

    assert_eq!(*log.events.lock().unwrap(), ["moving:1", "moving:done"]);
}

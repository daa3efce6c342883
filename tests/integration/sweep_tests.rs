//! End-to-end sweeps over real temporary directories.

use dupsweep::duplicates::{find_repeats, FinderError};
use dupsweep::error::ExitCode;
use dupsweep::pipeline::{AbortReason, Pipeline, PipelineConfig, RunOutcome};
use dupsweep::reveal::Revealer;
use dupsweep::scanner::{HashError, Hasher, ScanConfig};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

#[derive(Default)]
struct RecordingRevealer {
    calls: Mutex<Vec<PathBuf>>,
}

impl Revealer for RecordingRevealer {
    fn reveal(&self, path: &Path) -> io::Result<()> {
        self.calls.lock().unwrap().push(path.to_path_buf());
        Ok(())
    }
}

fn setup(files: &[(&str, &[u8])]) -> TempDir {
    let dir = TempDir::new().unwrap();
    for (name, content) in files {
        fs::write(dir.path().join(name), content).unwrap();
    }
    dir
}

fn names_in(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = fs::read_dir(dir)
        .unwrap()
        .map(|e| e.unwrap().file_name().into_string().unwrap())
        .collect();
    names.sort();
    names
}

#[test]
fn test_identical_pair_is_quarantined_together() {
    let dir = setup(&[
        ("a.txt", b"same bytes"),
        ("b.txt", b"same bytes"),
        ("c.txt", b"other bytes"),
    ]);
    let revealer = Arc::new(RecordingRevealer::default());

    let report = Pipeline::new(PipelineConfig::default())
        .with_revealer(revealer.clone())
        .run(dir.path());

    let mut selected: Vec<&str> = report.duplicates.iter().map(|r| r.name.as_str()).collect();
    selected.sort_unstable();
    assert_eq!(selected, ["a.txt", "b.txt"]);
    assert_eq!(report.duplicates[0].digest, report.duplicates[1].digest);

    assert_eq!(report.files_considered, 3);
    assert_eq!(report.moved_count(), 2);
    assert_eq!(report.exit_code(), ExitCode::Success);

    let quarantine = dir.path().join("duplicates");
    assert_eq!(names_in(&quarantine), ["a.txt", "b.txt"]);
    assert_eq!(names_in(dir.path()), ["c.txt", "duplicates"]);
    assert_eq!(fs::read(quarantine.join("a.txt")).unwrap(), b"same bytes");

    let calls = revealer.calls.lock().unwrap();
    assert_eq!(calls.len(), 1);
    assert!(calls[0].is_absolute());
    assert!(calls[0].ends_with("duplicates"));
}

#[test]
fn test_every_copy_of_a_triplicate_moves() {
    let dir = setup(&[
        ("one", b"triple"),
        ("two", b"triple"),
        ("three", b"triple"),
        ("pair_a", b"pair"),
        ("pair_b", b"pair"),
        ("single", b"single"),
    ]);

    let report = Pipeline::new(PipelineConfig::default()).run(dir.path());

    assert_eq!(report.duplicates_found(), 5);
    assert_eq!(report.moved_count(), 5);
    assert_eq!(names_in(dir.path()), ["duplicates", "single"]);
}

#[test]
fn test_unique_files_create_nothing() {
    let dir = setup(&[("a", b"1"), ("b", b"2"), ("c", b"3")]);
    let revealer = Arc::new(RecordingRevealer::default());

    let report = Pipeline::new(PipelineConfig::default())
        .with_revealer(revealer.clone())
        .run(dir.path());

    assert!(matches!(report.outcome, RunOutcome::NoDuplicates));
    assert_eq!(report.exit_code(), ExitCode::NoDuplicates);
    assert_eq!(report.duplicates_found(), 0);
    assert!(!dir.path().join("duplicates").exists());
    assert_eq!(names_in(dir.path()), ["a", "b", "c"]);
    assert!(revealer.calls.lock().unwrap().is_empty());
}

#[test]
fn test_empty_directory() {
    let dir = TempDir::new().unwrap();
    let report = Pipeline::new(PipelineConfig::default()).run(dir.path());

    assert!(matches!(report.outcome, RunOutcome::NoDuplicates));
    assert_eq!(report.files_listed, 0);
    assert!(!dir.path().join("duplicates").exists());
}

#[test]
fn test_second_run_finds_nothing() {
    let dir = setup(&[("x", b"dup"), ("y", b"dup"), ("z", b"unique")]);
    let pipeline = Pipeline::new(PipelineConfig::default());

    let first = pipeline.run(dir.path());
    assert_eq!(first.moved_count(), 2);

    let second = pipeline.run(dir.path());
    assert!(matches!(second.outcome, RunOutcome::NoDuplicates));
    assert_eq!(second.duplicates_found(), 0);
    assert_eq!(second.files_considered, 1);
}

#[test]
fn test_hidden_files_never_considered() {
    let dir = setup(&[
        (".hidden", b"same"),
        (".hidden_too", b"same"),
        ("visible", b"same"),
    ]);

    let report = Pipeline::new(PipelineConfig::default()).run(dir.path());

    assert_eq!(report.files_listed, 3);
    assert_eq!(report.files_excluded, 2);
    assert_eq!(report.files_considered, 1);
    assert!(matches!(report.outcome, RunOutcome::NoDuplicates));
    assert!(dir.path().join(".hidden").exists());
}

#[test]
fn test_hidden_files_included_on_request() {
    let dir = setup(&[(".a", b"same"), ("b", b"same")]);
    let mut config = PipelineConfig::default();
    config.finder = config
        .finder
        .with_scan_config(ScanConfig::new(false, Vec::new(), Default::default()));

    let report = Pipeline::new(config).run(dir.path());
    assert_eq!(report.moved_count(), 2);
}

#[test]
fn test_excluded_extensions_stay_in_place() {
    let dir = setup(&[
        ("movie.MP4", b"video"),
        ("copy.mp4", b"video"),
        ("clip.mkv", b"other"),
        ("clip2.mkv", b"other"),
    ]);
    let mut config = PipelineConfig::default();
    config.finder = config.finder.with_scan_config(ScanConfig::new(
        true,
        vec![".mp4".to_string(), "MKV".to_string()],
        Default::default(),
    ));

    let report = Pipeline::new(config).run(dir.path());

    assert_eq!(report.files_excluded, 4);
    assert!(matches!(report.outcome, RunOutcome::NoDuplicates));
}

#[test]
fn test_quarantine_directory_is_not_rescanned() {
    let dir = setup(&[("a", b"dup"), ("b", b"dup")]);
    fs::create_dir(dir.path().join("duplicates")).unwrap();
    fs::write(dir.path().join("duplicates").join("old"), b"dup").unwrap();

    let report = Pipeline::new(PipelineConfig::default()).run(dir.path());

    assert_eq!(report.files_listed, 2);
    assert_eq!(report.moved_count(), 2);
    assert_eq!(
        names_in(&dir.path().join("duplicates")),
        ["a", "b", "old"]
    );
}

#[test]
fn test_name_collision_is_reported_per_file() {
    let dir = setup(&[("a", b"dup"), ("b", b"dup")]);
    fs::create_dir(dir.path().join("duplicates")).unwrap();
    fs::write(dir.path().join("duplicates").join("a"), b"older").unwrap();

    let report = Pipeline::new(PipelineConfig::default()).run(dir.path());

    assert_eq!(report.moved_count(), 1);
    assert_eq!(report.failures().len(), 1);
    assert_eq!(report.failures()[0].name, "a");
    assert_eq!(report.exit_code(), ExitCode::PartialSuccess);
    assert_eq!(
        fs::read(dir.path().join("duplicates").join("a")).unwrap(),
        b"older"
    );
    assert!(dir.path().join("a").exists());
}

#[test]
fn test_missing_directory_aborts() {
    let dir = TempDir::new().unwrap();
    let missing = dir.path().join("gone");

    let report = Pipeline::new(PipelineConfig::default()).run(&missing);

    assert!(matches!(
        report.outcome,
        RunOutcome::Aborted(AbortReason::Scan(FinderError::DirectoryAccess(_)))
    ));
    assert_eq!(report.exit_code(), ExitCode::GeneralError);
    assert!(!missing.exists());
}

#[test]
fn test_interrupted_before_detection_moves_nothing() {
    let dir = setup(&[("a", b"dup"), ("b", b"dup")]);
    let flag = Arc::new(AtomicBool::new(true));
    let config = PipelineConfig::default().with_shutdown_flag(flag.clone());

    let report = Pipeline::new(config).run(dir.path());

    assert!(matches!(
        report.outcome,
        RunOutcome::Aborted(AbortReason::Scan(FinderError::Interrupted))
    ));
    assert_eq!(report.exit_code(), ExitCode::Interrupted);
    assert!(!dir.path().join("duplicates").exists());
    assert!(flag.load(Ordering::SeqCst));
}

#[cfg(unix)]
#[test]
fn test_unreadable_file_aborts_without_moving() {
    use std::os::unix::fs::PermissionsExt;

    let dir = setup(&[("a", b"dup"), ("b", b"dup")]);
    let locked = dir.path().join("locked");
    fs::write(&locked, b"secret").unwrap();
    fs::set_permissions(&locked, fs::Permissions::from_mode(0o000)).unwrap();

    if fs::File::open(&locked).is_ok() {
        return;
    }

    let report = Pipeline::new(PipelineConfig::default()).run(dir.path());

    assert!(matches!(
        report.outcome,
        RunOutcome::Aborted(AbortReason::Scan(FinderError::HashComputation(
            HashError::PermissionDenied(_)
        )))
    ));
    assert!(!dir.path().join("duplicates").exists());
    assert!(dir.path().join("a").exists());
    assert!(dir.path().join("b").exists());

    fs::set_permissions(&locked, fs::Permissions::from_mode(0o644)).unwrap();
}

#[test]
fn test_same_content_same_digest_across_files() {
    let dir = setup(&[("first", b"content"), ("second", b"content")]);
    let hasher = Hasher::new();

    let a = hasher.hash_hex(&dir.path().join("first")).unwrap();
    let b = hasher.hash_hex(&dir.path().join("second")).unwrap();
    assert_eq!(a, b);
    assert_eq!(a, hasher.hash_hex(&dir.path().join("first")).unwrap());
}

#[test]
fn test_dry_run_reports_without_side_effects() {
    let dir = setup(&[("a", b"dup"), ("b", b"dup")]);
    let revealer = Arc::new(RecordingRevealer::default());
    let config = PipelineConfig {
        dry_run: true,
        ..PipelineConfig::default()
    };

    let report = Pipeline::new(config)
        .with_revealer(revealer.clone())
        .run(dir.path());

    assert!(matches!(report.outcome, RunOutcome::DryRun));
    assert_eq!(report.duplicates_found(), 2);
    assert!(find_repeats(&report.duplicates).len() == 1);
    assert!(!dir.path().join("duplicates").exists());
    assert!(revealer.calls.lock().unwrap().is_empty());
}

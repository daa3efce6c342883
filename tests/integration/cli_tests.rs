//! Runs the compiled binary and checks exit codes and output.

use std::fs;
use std::io::Write;
use std::path::Path;
use std::process::{Command, Output, Stdio};
use tempfile::TempDir;

fn dupsweep(home: &Path) -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_dupsweep"));
    for (key, _) in std::env::vars() {
        if key.starts_with("DUPSWEEP_") {
            cmd.env_remove(key);
        }
    }
    cmd.env("NO_COLOR", "1")
        .env_remove("RUST_LOG")
        .env("HOME", home)
        .env("XDG_CONFIG_HOME", home.join("config"))
        .arg("--no-reveal");
    cmd
}

fn run(cmd: &mut Command) -> Output {
    cmd.stdin(Stdio::null()).output().unwrap()
}

fn fixture(files: &[(&str, &str)]) -> (TempDir, TempDir) {
    let dir = TempDir::new().unwrap();
    for (name, content) in files {
        fs::write(dir.path().join(name), content).unwrap();
    }
    (dir, TempDir::new().unwrap())
}

#[test]
fn test_sweep_exits_success() {
    let (dir, home) = fixture(&[("a.txt", "same"), ("b.txt", "same"), ("c.txt", "diff")]);

    let out = run(dupsweep(home.path()).arg(dir.path()));
    let stdout = String::from_utf8_lossy(&out.stdout);

    assert_eq!(out.status.code(), Some(0));
    assert!(stdout.contains("Duplicates found: 2"), "{stdout}");
    assert!(dir.path().join("duplicates").join("a.txt").exists());
    assert!(dir.path().join("duplicates").join("b.txt").exists());
    assert!(dir.path().join("c.txt").exists());
}

#[test]
fn test_no_duplicates_exit_code() {
    let (dir, home) = fixture(&[("a", "1"), ("b", "2")]);

    let out = run(dupsweep(home.path()).arg(dir.path()));

    assert_eq!(out.status.code(), Some(2));
    assert!(!dir.path().join("duplicates").exists());
}

#[test]
fn test_missing_directory_is_general_error() {
    let (dir, home) = fixture(&[]);

    let out = run(dupsweep(home.path()).arg(dir.path().join("missing")));
    let stderr = String::from_utf8_lossy(&out.stderr);

    assert_eq!(out.status.code(), Some(1));
    assert!(stderr.contains("[DS001] Error"), "{stderr}");
}

#[test]
fn test_json_errors() {
    let (dir, home) = fixture(&[]);

    let out = run(dupsweep(home.path())
        .arg("--json-errors")
        .arg(dir.path().join("missing")));
    let stderr = String::from_utf8_lossy(&out.stderr);
    let start = stderr.find('{').unwrap();
    let value: serde_json::Value = serde_json::from_str(&stderr[start..]).unwrap();

    assert_eq!(value["code"], "DS001");
    assert_eq!(value["exit_code"], 1);
    assert_eq!(value["interrupted"], false);
}

#[test]
fn test_json_output() {
    let (dir, home) = fixture(&[("x", "dup"), ("y", "dup"), ("z", "one")]);

    let out = run(dupsweep(home.path()).args(["--output", "json"]).arg(dir.path()));
    let value: serde_json::Value = serde_json::from_slice(&out.stdout).unwrap();

    assert_eq!(out.status.code(), Some(0));
    assert_eq!(value["outcome"], "completed");
    assert_eq!(value["summary"]["files_considered"], 3);
    assert_eq!(value["summary"]["duplicates_found"], 2);
    assert_eq!(value["summary"]["moved"], 2);
    assert_eq!(value["groups"][0]["files"].as_array().unwrap().len(), 2);
}

#[test]
fn test_dry_run_leaves_files() {
    let (dir, home) = fixture(&[("x", "dup"), ("y", "dup")]);

    let out = run(dupsweep(home.path()).arg("--dry-run").arg(dir.path()));

    assert_eq!(out.status.code(), Some(0));
    assert!(String::from_utf8_lossy(&out.stdout).contains("would be moved"));
    assert!(!dir.path().join("duplicates").exists());
    assert!(dir.path().join("x").exists());
}

#[test]
fn test_quiet_prints_nothing() {
    let (dir, home) = fixture(&[("x", "dup"), ("y", "dup")]);

    let out = run(dupsweep(home.path()).arg("-q").arg(dir.path()));

    assert_eq!(out.status.code(), Some(0));
    assert!(out.stdout.is_empty());
}

#[test]
fn test_prompts_for_directory() {
    let (dir, home) = fixture(&[("x", "dup"), ("y", "dup")]);

    let mut child = dupsweep(home.path())
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .unwrap();
    {
        let mut stdin = child.stdin.take().unwrap();
        writeln!(stdin, "{}", dir.path().display()).unwrap();
    }
    let out = child.wait_with_output().unwrap();
    let stdout = String::from_utf8_lossy(&out.stdout);

    assert_eq!(out.status.code(), Some(0));
    assert!(stdout.starts_with("Enter the directory: "), "{stdout}");
    assert!(dir.path().join("duplicates").join("x").exists());
}

#[test]
fn test_empty_prompt_answer_fails() {
    let (_dir, home) = fixture(&[]);

    let out = run(&mut dupsweep(home.path()));
    let stderr = String::from_utf8_lossy(&out.stderr);

    assert_eq!(out.status.code(), Some(1));
    assert!(stderr.contains("no directory given"), "{stderr}");
}

#[test]
fn test_destination_from_environment() {
    let (dir, home) = fixture(&[("x", "dup"), ("y", "dup")]);

    let out = run(dupsweep(home.path())
        .env("DUPSWEEP_DESTINATION", "quarantine")
        .arg(dir.path()));

    assert_eq!(out.status.code(), Some(0));
    assert!(dir.path().join("quarantine").join("x").exists());
}

#[test]
fn test_config_file_and_cli_precedence() {
    let (dir, home) = fixture(&[("x.mp4", "dup"), ("y.mp4", "dup"), ("a", "z"), ("b", "z")]);
    let config = home.path().join("custom.toml");
    fs::write(
        &config,
        "destination = \"from-file\"\nexclude_extensions = [\"mp4\"]\n",
    )
    .unwrap();

    let out = run(dupsweep(home.path())
        .arg("--config")
        .arg(&config)
        .args(["--destination", "from-cli"])
        .arg(dir.path()));

    assert_eq!(out.status.code(), Some(0));
    let quarantine = dir.path().join("from-cli");
    assert!(quarantine.join("a").exists());
    assert!(quarantine.join("b").exists());
    assert!(dir.path().join("x.mp4").exists());
    assert!(!dir.path().join("from-file").exists());
}

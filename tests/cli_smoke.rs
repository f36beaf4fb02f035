use assert_cmd::prelude::*;
use std::fs::{self, File};
use std::io::Write;
use std::path::Path;
use std::process::Command;
use tempfile::tempdir;

fn has_git() -> bool {
    Command::new("git").arg("--version").output().is_ok()
}

fn git(dir: &Path, args: &[&str]) -> String {
    let out = Command::new("git").args(args).current_dir(dir).output().unwrap();
    assert!(out.status.success(), "git {args:?} failed");
    String::from_utf8(out.stdout).unwrap()
}

fn init_git_repo(dir: &Path) {
    // init and basic identity
    git(dir, &["init"]);
    git(dir, &["config", "core.autocrlf", "false"]);
    git(dir, &["config", "user.email", "you@example.com"]);
    git(dir, &["config", "user.name", "Your Name"]);
}

fn commit_file(dir: &Path, name: &str, content: &str) {
    let path = dir.join(name);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    let mut f = File::create(&path).unwrap();
    f.write_all(content.as_bytes()).unwrap();
    f.sync_all().unwrap();
    git(dir, &["add", "."]);
    git(dir, &["commit", "-m", &format!("add {name}")]);
}

fn commit_count(dir: &Path) -> usize {
    git(dir, &["rev-list", "--count", "HEAD"]).trim().parse().unwrap()
}

#[test]
fn plan_json_lists_every_day() {
    let mut cmd = Command::cargo_bin("gfill").unwrap();
    cmd.args([
        "plan",
        "--start",
        "2024-01-01",
        "--end",
        "2024-01-03",
        "--per-day-min",
        "1",
        "--per-day-max",
        "1",
        "--json",
    ]);
    let out = cmd.assert().success().get_output().stdout.clone();
    let v: serde_json::Value = serde_json::from_slice(&out).unwrap();
    assert_eq!(v["total_commits"], 3);
    let days: Vec<_> = v["days"]
        .as_array()
        .unwrap()
        .iter()
        .map(|d| d["date"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(days, vec!["2024-01-01", "2024-01-02", "2024-01-03"]);
}

#[test]
fn plan_sample_size_is_reproducible() {
    let run = || {
        let mut cmd = Command::cargo_bin("gfill").unwrap();
        cmd.args([
            "plan",
            "--start",
            "2023-01-01",
            "--end",
            "2023-12-31",
            "--sample-size",
            "100",
            "--seed",
            "2023",
            "--json",
        ]);
        let out = cmd.assert().success().get_output().stdout.clone();
        serde_json::from_slice::<serde_json::Value>(&out).unwrap()
    };
    let first = run();
    assert_eq!(first["total_commits"], 100);
    assert_eq!(first["days"], run()["days"]);
}

#[test]
fn end_date_today_is_rejected() {
    let today = chrono::Local::now().date_naive().to_string();
    let mut cmd = Command::cargo_bin("gfill").unwrap();
    cmd.args(["plan", "--start", "2020-01-01", "--end", &today, "--timezone", "local"]);
    let assert = cmd.assert().code(1);
    let stderr = String::from_utf8_lossy(&assert.get_output().stderr).into_owned();
    assert!(stderr.contains("End date must be earlier than today."));
}

#[test]
fn invalid_work_hours_are_a_config_error() {
    let mut cmd = Command::cargo_bin("gfill").unwrap();
    cmd.args(["--dry-run", "backfill", "--work-hours", "18-9"]);
    cmd.assert().code(1);
}

#[test]
fn backfill_creates_dated_commits() {
    let dir = tempdir().unwrap();
    if !has_git() {
        return;
    }
    init_git_repo(dir.path());
    commit_file(dir.path(), "README.md", "hello\n");

    let mut cmd = Command::cargo_bin("gfill").unwrap();
    cmd.arg("--repo").arg(dir.path()).args([
        "--timezone",
        "UTC",
        "backfill",
        "--start",
        "2024-01-01",
        "--end",
        "2024-01-03",
        "--per-day-min",
        "1",
        "--per-day-max",
        "1",
    ]);
    cmd.assert().success();

    assert_eq!(commit_count(dir.path()), 4);
    let log = git(dir.path(), &["log", "--grep", "^backfill:", "--format=%aI %cI"]);
    let stamps: Vec<_> = log.lines().collect();
    assert_eq!(stamps.len(), 3);
    for line in &stamps {
        let (author, committer) = line.split_once(' ').unwrap();
        assert_eq!(author, committer);
        let hour: u32 = author[11..13].parse().unwrap();
        assert!((10..=19).contains(&hour), "hour {hour} outside window");
        assert!(author.ends_with("+00:00"));
    }
    let keep = fs::read_to_string(dir.path().join("keep.log")).unwrap();
    assert_eq!(keep.lines().count(), 3);
}

#[test]
fn backfill_seeds_an_empty_repository() {
    let dir = tempdir().unwrap();
    if !has_git() {
        return;
    }
    init_git_repo(dir.path());

    let mut cmd = Command::cargo_bin("gfill").unwrap();
    cmd.arg("--repo").arg(dir.path()).args([
        "--timezone",
        "+09:00",
        "backfill",
        "--start",
        "2024-02-28",
        "--end",
        "2024-02-29",
        "--per-day-min",
        "2",
        "--per-day-max",
        "2",
        "--json",
    ]);
    let out = cmd.assert().success().get_output().stdout.clone();
    let v: serde_json::Value = serde_json::from_slice(&out).unwrap();
    assert_eq!(v["commits"], 4);
    assert_eq!(commit_count(dir.path()), 5);
}

#[test]
fn backfill_json_keeps_git_output_off_stdout() {
    let dir = tempdir().unwrap();
    if !has_git() {
        return;
    }
    init_git_repo(dir.path());
    commit_file(dir.path(), "README.md", "hello\n");

    let mut cmd = Command::cargo_bin("gfill").unwrap();
    cmd.arg("--repo").arg(dir.path()).args([
        "--timezone",
        "UTC",
        "backfill",
        "--start",
        "2024-01-01",
        "--end",
        "2024-01-01",
        "--per-day-min",
        "1",
        "--per-day-max",
        "1",
        "--json",
    ]);
    let assert = cmd.assert().success();
    let output = assert.get_output();
    let v: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(v["commits"], 1);
    assert_eq!(v["dry_run"], false);
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("backfill: 2024-01-01 (1/1)"));
    assert_eq!(commit_count(dir.path()), 2);
}

#[test]
fn dry_run_backfill_changes_nothing() {
    let dir = tempdir().unwrap();
    if !has_git() {
        return;
    }
    init_git_repo(dir.path());
    commit_file(dir.path(), "README.md", "hello\n");

    let mut cmd = Command::cargo_bin("gfill").unwrap();
    cmd.arg("--repo").arg(dir.path()).args([
        "--dry-run",
        "backfill",
        "--start",
        "2024-01-01",
        "--end",
        "2024-01-03",
    ]);
    let out = cmd.assert().success().get_output().stdout.clone();
    assert!(String::from_utf8_lossy(&out).contains("[dry-run] Planned total commits:"));
    assert_eq!(commit_count(dir.path()), 1);
    assert!(!dir.path().join("keep.log").exists());
}

#[test]
fn non_repository_is_rejected() {
    let dir = tempdir().unwrap();
    let mut cmd = Command::cargo_bin("gfill").unwrap();
    cmd.arg("--repo").arg(dir.path()).args([
        "--dry-run",
        "backfill",
        "--start",
        "2024-01-01",
        "--end",
        "2024-01-02",
    ]);
    cmd.assert().code(1);
}

#[test]
fn activity_requires_an_action() {
    let mut cmd = Command::cargo_bin("gfill").unwrap();
    cmd.args(["--dry-run", "activity"]);
    let assert = cmd.assert().code(1);
    let stderr = String::from_utf8_lossy(&assert.get_output().stderr).into_owned();
    assert!(stderr.contains("--create-issue"));
}

#[test]
fn automate_dry_run_reports_plan_without_changes() {
    let dir = tempdir().unwrap();
    if !has_git() {
        return;
    }
    init_git_repo(dir.path());
    commit_file(dir.path(), "README.md", "hello\n");
    git(dir.path(), &["remote", "add", "origin", "https://example.invalid/o/r.git"]);

    let mut cmd = Command::cargo_bin("gfill").unwrap();
    cmd.arg("--repo").arg(dir.path()).args([
        "--dry-run",
        "automate",
        "--years",
        "2020",
        "--sample-size",
        "2",
        "--snippet-count",
        "1",
        "--issue-count",
        "1",
        "--json",
    ]);
    let out = cmd.assert().success().get_output().stdout.clone();
    let v: serde_json::Value = serde_json::from_slice(&out).unwrap();
    assert_eq!(v["dry_run"], true);
    assert_eq!(v["commits"], 3);
    assert_eq!(v["branches"][0], "backfill/2020-activity");
    assert_eq!(v["branches"][1], "feature/python-snippet");
    assert_eq!(commit_count(dir.path()), 1);
    assert!(!dir.path().join("snippets").exists());
}

#[test]
fn automate_rejects_too_many_snippets() {
    let mut cmd = Command::cargo_bin("gfill").unwrap();
    cmd.args(["--dry-run", "automate", "--snippet-count", "8"]);
    cmd.assert().code(1);
}

#[test]
fn automate_without_remote_fails() {
    let dir = tempdir().unwrap();
    if !has_git() {
        return;
    }
    init_git_repo(dir.path());
    commit_file(dir.path(), "README.md", "hello\n");

    let mut cmd = Command::cargo_bin("gfill").unwrap();
    cmd.arg("--repo").arg(dir.path()).args([
        "--dry-run",
        "automate",
        "--years",
        "2020",
        "--sample-size",
        "1",
    ]);
    let assert = cmd.assert().code(1);
    let stderr = String::from_utf8_lossy(&assert.get_output().stderr).into_owned();
    assert!(stderr.contains("Remote 'origin' not configured"));
}

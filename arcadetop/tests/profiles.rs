//! Tests for profile save and reuse through the CLI (non-interactive paths only)
use std::fs;
use std::path::{Path, PathBuf};

use assert_cmd::Command;

fn run_arcadetop(config: &Path, args: &[&str]) -> (bool, String) {
    let output = Command::cargo_bin("arcadetop")
        .unwrap()
        .env("XDG_CONFIG_HOME", config)
        .args(args)
        .output()
        .expect("run arcadetop");
    let text = format!(
        "{}{}",
        String::from_utf8_lossy(&output.stdout),
        String::from_utf8_lossy(&output.stderr)
    );
    (output.status.success(), text)
}

fn profiles_path(config: &Path) -> PathBuf {
    config.join("arcadetop").join("profiles.json")
}

#[test]
fn profile_created_on_first_use() {
    let td = tempfile::tempdir().unwrap();
    let (ok, _) = run_arcadetop(td.path(), &["--profile", "unittest", "http://example:1", "--dry-run"]);
    assert!(ok);
    let data = fs::read_to_string(profiles_path(td.path())).expect("profiles.json created");
    assert!(data.contains("unittest"), "profiles.json missing profile entry: {data}");
}

#[test]
fn profile_overwrite_only_when_changed() {
    let td = tempfile::tempdir().unwrap();
    run_arcadetop(td.path(), &["--profile", "prod", "http://one", "--dry-run"]);
    let first = fs::read_to_string(profiles_path(td.path())).unwrap();

    run_arcadetop(td.path(), &["--profile", "prod", "http://one", "--dry-run"]);
    let second = fs::read_to_string(profiles_path(td.path())).unwrap();
    assert_eq!(first, second, "Profile file changed despite identical input");

    // --save skips the overwrite prompt
    run_arcadetop(td.path(), &["--profile", "prod", "--save", "http://two", "--dry-run"]);
    let third = fs::read_to_string(profiles_path(td.path())).unwrap();
    assert!(third.contains("two"), "Updated URL not written: {third}");
}

#[test]
fn changed_profile_kept_when_prompt_declined() {
    let td = tempfile::tempdir().unwrap();
    run_arcadetop(td.path(), &["--profile", "den", "http://one", "--dry-run"]);
    // stdin is empty, so the prompt reads as "no"
    run_arcadetop(td.path(), &["--profile", "den", "http://two", "--dry-run"]);
    let data = fs::read_to_string(profiles_path(td.path())).unwrap();
    assert!(data.contains("one") && !data.contains("two"), "{data}");
}

#[test]
fn saved_profile_supplies_both_endpoints() {
    let td = tempfile::tempdir().unwrap();
    run_arcadetop(
        td.path(),
        &["-P", "attic", "-w", "ws://10.1.1.1:81/", "http://10.1.1.1", "--dry-run"],
    );
    let data = fs::read_to_string(profiles_path(td.path())).unwrap();
    assert!(data.contains("ws://10.1.1.1:81/"), "{data}");

    let (ok, text) = run_arcadetop(td.path(), &["-P", "attic", "--dry-run"]);
    assert!(ok, "{text}");
    assert!(text.contains("api:  http://10.1.1.1/"), "{text}");
    assert!(text.contains("feed: ws://10.1.1.1:81/"), "{text}");
}

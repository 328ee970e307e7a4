use std::path::PathBuf;

use assert_cmd::Command;
use predicates::prelude::*;

fn replay_file() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../demos/replay.json")
}

#[test]
fn test_bad_mappings_exit_before_sampling() {
    let dir = tempfile::tempdir().unwrap();
    let mut cmd = Command::cargo_bin("roast").unwrap();

    cmd.arg("--replay")
        .arg(replay_file())
        .arg("--mappings")
        .arg(dir.path())
        .arg("--port")
        .arg("0");
    cmd.assert()
        .code(2)
        .stderr(predicate::str::contains("failed to read the mappings"))
        .stderr(predicate::str::contains("replaying").not())
        .stderr(predicate::str::contains("serving on").not());
}

#[test]
fn test_attach_failure_exits() {
    let mut cmd = Command::cargo_bin("roast").unwrap();

    cmd.args(["--pid", "2147483647", "--port", "0"]);
    cmd.assert()
        .code(3)
        .stderr(predicate::str::contains("unable to attach to process 2147483647"))
        .stderr(predicate::str::contains("serving on").not());
}

#[test]
fn test_missing_replay_file_exits() {
    let dir = tempfile::tempdir().unwrap();
    let mut cmd = Command::cargo_bin("roast").unwrap();

    cmd.arg("--replay").arg(dir.path().join("missing.json"));
    cmd.assert().code(3);
}

use predicates::str::contains;
use tempfile::tempdir;

const DATABASE: &str = r#"{
    "comments": [
        {"module": "target.exe", "address": "0x1000", "text": "init"},
        {"module": "helper.dll", "address": "0x1000", "text": "not ours"}
    ],
    "bookmarks": [{"module": "target.exe", "address": "0x2000"}],
    "labels": [{"address": "0x3000", "text": "g_counter"}],
    "functions": [{"start": "0x3000", "end": "0x3050"}]
}"#;

/// init-program, import, and show-program should work end to end.
#[test]
fn import_round_trip_through_binary() {
    let dir = tempdir().expect("tempdir");
    let program = dir.path().join("target.db");
    let database = dir.path().join("target.json");
    std::fs::write(&database, DATABASE).expect("write database");

    assert_cmd::cargo::cargo_bin_cmd!("dbimport")
        .arg("init-program")
        .arg("--program")
        .arg(&program)
        .arg("--name")
        .arg("target.exe")
        .arg("--base")
        .arg("0x400000")
        .assert()
        .success()
        .stdout(contains("Image base: 0x400000"));

    assert_cmd::cargo::cargo_bin_cmd!("dbimport")
        .arg("import")
        .arg("--program")
        .arg(&program)
        .arg("--database")
        .arg(&database)
        .assert()
        .success()
        .stdout(contains("Imported 1 new comments"))
        .stdout(contains("Imported 1 new bookmarks"))
        .stdout(contains("1 functions, 0 labels"));

    let output = assert_cmd::cargo::cargo_bin_cmd!("dbimport")
        .arg("show-program")
        .arg("--program")
        .arg(&program)
        .arg("--json")
        .output()
        .expect("run show-program");
    assert!(output.status.success());
    let snapshot: serde_json::Value =
        serde_json::from_slice(&output.stdout).expect("show-program emits JSON");
    assert_eq!(snapshot["comments"][0]["address"], "0x401000");
    assert_eq!(snapshot["comments"][0]["text"], "init");
    assert_eq!(snapshot["symbols"][0]["name"], "g_counter");
    assert_eq!(snapshot["symbols"][0]["kind"], "function");
    assert_eq!(snapshot["bookmarks"].as_array().map(|b| b.len()), Some(1));
}

/// A second import reports zero new annotations in JSON mode.
#[test]
fn second_import_is_a_no_op() {
    let dir = tempdir().expect("tempdir");
    let program = dir.path().join("target.db");
    let database = dir.path().join("target.json");
    std::fs::write(&database, DATABASE).expect("write database");

    assert_cmd::cargo::cargo_bin_cmd!("dbimport")
        .args(["init-program", "--name", "target.exe", "--base", "0x400000", "--program"])
        .arg(&program)
        .assert()
        .success();

    for _ in 0..2 {
        assert_cmd::cargo::cargo_bin_cmd!("dbimport")
            .arg("import")
            .arg("--program")
            .arg(&program)
            .arg("--database")
            .arg(&database)
            .assert()
            .success();
    }

    let output = assert_cmd::cargo::cargo_bin_cmd!("dbimport")
        .arg("import")
        .arg("--program")
        .arg(&program)
        .arg("--database")
        .arg(&database)
        .arg("--json")
        .output()
        .expect("run import");
    let summary: serde_json::Value = serde_json::from_slice(&output.stdout).expect("json");
    assert_eq!(summary["comments"]["imported"], 0);
    assert_eq!(summary["comments"]["filtered"], 1);
    assert_eq!(summary["bookmarks"]["imported"], 0);
    assert_eq!(summary["symbols"]["functions"], 0);
    assert_eq!(summary["symbols"]["labels"], 0);

    assert_cmd::cargo::cargo_bin_cmd!("dbimport")
        .arg("list-imports")
        .arg("--program")
        .arg(&program)
        .assert()
        .success()
        .stdout(contains("Imports (3):"));
}

/// Omitting --database cancels cleanly.
#[test]
fn import_without_database_reports_cancel() {
    let dir = tempdir().expect("tempdir");
    let program = dir.path().join("target.db");

    assert_cmd::cargo::cargo_bin_cmd!("dbimport")
        .args(["init-program", "--name", "target.exe", "--base", "0x400000", "--program"])
        .arg(&program)
        .assert()
        .success();

    let output = assert_cmd::cargo::cargo_bin_cmd!("dbimport")
        .arg("import")
        .arg("--program")
        .arg(&program)
        .output()
        .expect("run import");
    assert!(output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert_eq!(stderr.matches("Import cancelled").count(), 1, "{stderr}");
}

/// A database path that does not exist is an error, not a cancel.
#[test]
fn import_with_missing_database_fails() {
    let dir = tempdir().expect("tempdir");
    let program = dir.path().join("target.db");

    assert_cmd::cargo::cargo_bin_cmd!("dbimport")
        .args(["init-program", "--name", "target.exe", "--base", "0x400000", "--program"])
        .arg(&program)
        .assert()
        .success();

    assert_cmd::cargo::cargo_bin_cmd!("dbimport")
        .arg("import")
        .arg("--program")
        .arg(&program)
        .arg("--database")
        .arg(dir.path().join("nope.json"))
        .assert()
        .failure()
        .stderr(contains("Database file not found"));
}

/// import should fail when the program database was never initialized.
#[test]
fn import_fails_without_program() {
    let dir = tempdir().expect("tempdir");
    assert_cmd::cargo::cargo_bin_cmd!("dbimport")
        .arg("import")
        .arg("--program")
        .arg(dir.path().join("missing.db"))
        .arg("--database")
        .arg(dir.path().join("db.json"))
        .assert()
        .failure();
}

use dbimport::commands::{
    import_command, init_program_command, list_imports_command, show_program_command,
};
use dbimport::sha256_hex;
use dbimport_core::db::ProgramDb;
use dbimport_core::model::Address;
use dbimport_core::target::TargetProgram;
use tempfile::tempdir;

const DATABASE: &str = r#"{
    "comments": [{"module": "target.exe", "address": "0x1000", "text": "init"}],
    "bookmarks": [{"module": "target.exe", "address": "0x2000"}],
    "labels": [{"address": "0x3000", "text": "g_counter"}],
    "functions": [{"start": "0x3000", "end": "0x3050"}]
}"#;

#[test]
fn import_command_applies_and_records_run() {
    let temp = tempdir().unwrap();
    let program = temp.path().join("target.db").to_string_lossy().to_string();
    let database = temp.path().join("target.json");
    std::fs::write(&database, DATABASE).unwrap();

    init_program_command(&program, "target.exe", "0x400000", 4).unwrap();
    let summary = import_command(&program, database.to_str(), None, false)
        .unwrap()
        .expect("summary");
    assert_eq!(summary.total_imported(), 3);

    let again = import_command(&program, database.to_str(), None, true).unwrap().unwrap();
    assert!(again.is_noop());

    let db = ProgramDb::open(std::path::Path::new(&program)).unwrap();
    assert_eq!(db.eol_comment(Address(0x401000)).unwrap().as_deref(), Some("init"));
    let runs = db.list_import_runs().unwrap();
    assert_eq!(runs.len(), 2);
    assert_eq!(runs[0].source_hash.as_deref(), Some(sha256_hex(DATABASE.as_bytes()).as_str()));

    show_program_command(&program, false).unwrap();
    show_program_command(&program, true).unwrap();
    list_imports_command(&program, false).unwrap();
    list_imports_command(&program, true).unwrap();
}

#[test]
fn import_command_without_database_is_cancelled() {
    let temp = tempdir().unwrap();
    let program = temp.path().join("target.db").to_string_lossy().to_string();
    init_program_command(&program, "target.exe", "0x400000", 8).unwrap();

    let result = import_command(&program, None, None, false).unwrap();
    assert!(result.is_none());

    let db = ProgramDb::open(std::path::Path::new(&program)).unwrap();
    assert!(db.list_import_runs().unwrap().is_empty());
    assert!(db.list_comments().unwrap().is_empty());
}

#[test]
fn import_command_rejects_malformed_database_without_changes() {
    let temp = tempdir().unwrap();
    let program = temp.path().join("target.db").to_string_lossy().to_string();
    let database = temp.path().join("broken.json");
    std::fs::write(&database, "{\"comments\": 42}").unwrap();
    init_program_command(&program, "target.exe", "0x400000", 8).unwrap();

    let err = import_command(&program, database.to_str(), None, false).unwrap_err();
    let message = format!("{err:#}");
    assert!(message.contains("Failed to load database file"), "{message}");
    assert!(message.contains("Malformed database document"), "{message}");

    let db = ProgramDb::open(std::path::Path::new(&program)).unwrap();
    assert!(db.list_import_runs().unwrap().is_empty());
}

#[test]
fn import_command_honours_config_file() {
    let temp = tempdir().unwrap();
    let program = temp.path().join("target.db").to_string_lossy().to_string();
    let database = temp.path().join("target.json");
    let config = temp.path().join("import.json");
    std::fs::write(&database, DATABASE).unwrap();
    std::fs::write(&config, r#"{"import_bookmarks": false, "bookmark_category": "dbg"}"#).unwrap();
    init_program_command(&program, "target.exe", "0x400000", 8).unwrap();

    let summary =
        import_command(&program, database.to_str(), config.to_str(), false).unwrap().unwrap();
    assert_eq!(summary.bookmarks.imported, 0);
    assert_eq!(summary.comments.imported, 1);
}

#[test]
fn init_program_validates_arguments() {
    let temp = tempdir().unwrap();
    let program = temp.path().join("target.db").to_string_lossy().to_string();

    assert!(init_program_command(&program, "target.exe", "0x400000", 2).is_err());
    assert!(init_program_command(&program, "target.exe", "zz", 8).is_err());
    assert!(init_program_command(&program, "target.exe", "0x1_0000_0000", 4).is_err());
    assert!(init_program_command(&program, "target.exe", "0x100000000", 4).is_err());
}

#[test]
fn commands_fail_for_missing_program_db() {
    let temp = tempdir().unwrap();
    let program = temp.path().join("absent.db").to_string_lossy().to_string();
    assert!(show_program_command(&program, false).is_err());
    assert!(list_imports_command(&program, false).is_err());
}

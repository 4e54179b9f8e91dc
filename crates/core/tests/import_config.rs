use std::path::Path;

use dbimport_core::config::{load_import_config, ImportConfig};
use dbimport_core::merge::CommentMatch;
use tempfile::tempdir;

#[test]
fn defaults_match_debugger_conventions() {
    let config = ImportConfig::default();
    assert_eq!(config.bookmark_category, "x64dbg");
    assert_eq!(config.bookmark_description("C:/db.json"), "Imported: C:/db.json");
    assert_eq!(config.comment_match, CommentMatch::Substring);
    assert!(config.placeholder_prefixes.is_placeholder("FUN_00401000"));
    assert!(config.import_comments && config.import_bookmarks && config.import_symbols);
    assert!(config.module_matches("target.exe", "target.exe"));
    assert!(!config.module_matches("Target.exe", "target.exe"));
}

#[test]
fn loads_partial_json_config() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("import.json");
    std::fs::write(
        &path,
        r#"{"comment_match": "line", "placeholder_prefixes": ["sub_"], "ignore_module_case": true}"#,
    )
    .unwrap();

    let config = load_import_config(&path).expect("load json");
    assert_eq!(config.comment_match, CommentMatch::Line);
    assert!(config.placeholder_prefixes.is_placeholder("sub_1000"));
    assert!(!config.placeholder_prefixes.is_placeholder("FUN_1000"));
    assert!(config.module_matches("TARGET.EXE", "target.exe"));
    assert_eq!(config.bookmark_category, "x64dbg");
}

#[test]
fn loads_yaml_config_by_extension() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("import.yaml");
    std::fs::write(&path, "bookmark_category: debugger\nimport_bookmarks: false\n").unwrap();

    let config = load_import_config(&path).expect("load yaml");
    assert_eq!(config.bookmark_category, "debugger");
    assert!(!config.import_bookmarks);
    assert!(config.import_comments);
}

#[test]
fn reports_missing_and_invalid_configs() {
    let err = load_import_config(Path::new("/definitely/not/here.json")).unwrap_err();
    assert!(err.to_string().contains("Failed to read import config"));

    let dir = tempdir().unwrap();
    let path = dir.path().join("bad.json");
    std::fs::write(&path, "{ nope").unwrap();
    let err = load_import_config(&path).unwrap_err();
    assert!(err.to_string().contains("Failed to parse import config JSON"));
}

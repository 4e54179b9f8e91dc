use std::str::FromStr;

use dbimport_core::model::Rva;
use dbimport_core::records::{FormatError, RecordStore, Section, SectionRecords};
use tempfile::tempdir;

const SAMPLE: &str = r#"{
    "comments": [
        {"module": "target.exe", "address": "0x1000", "text": "init", "manual": true},
        {"module": "other.dll", "address": "0x20", "text": "elsewhere"}
    ],
    "labels": [{"address": "0x3000", "text": "g_counter"}],
    "bookmarks": [{"module": "target.exe", "address": "0x2000"}],
    "functions": [{"module": "target.exe", "start": "0x3000", "end": "0x3050", "icount": 7}],
    "breakpoints": [{"address": "0x10", "enabled": true}]
}"#;

#[test]
fn decodes_all_sections() {
    let store = RecordStore::from_str(SAMPLE).expect("decode");
    assert_eq!(store.comments().len(), 2);
    assert_eq!(store.comments()[0].address, Rva(0x1000));
    assert_eq!(store.comments()[0].text, "init");
    assert_eq!(store.comments()[1].module, "other.dll");
    assert_eq!(store.labels()[0].module, None);
    assert_eq!(store.bookmarks()[0].address, Rva(0x2000));
    assert_eq!(store.functions()[0].start, Rva(0x3000));
    assert_eq!(store.functions()[0].end, Rva(0x3050));
    assert_eq!(store.functions()[0].module.as_deref(), Some("target.exe"));
}

#[test]
fn missing_sections_are_empty() {
    let store = RecordStore::from_str(r#"{"labels": []}"#).expect("decode");
    for section in Section::ALL {
        assert!(store.get(section).is_empty(), "{section} should be empty");
        assert_eq!(store.len(section), 0);
    }

    let empty = RecordStore::from_str("{}").expect("decode empty object");
    assert_eq!(empty, RecordStore::default());
}

#[test]
fn get_named_resolves_wire_names() {
    let store = RecordStore::from_str(SAMPLE).expect("decode");
    match store.get_named("bookmarks") {
        Some(SectionRecords::Bookmarks(records)) => assert_eq!(records.len(), 1),
        other => panic!("expected bookmarks, got {other:?}"),
    }
    assert_eq!(store.get_named("comments").map(|r| r.len()), Some(2));
    assert!(store.get_named("breakpoints").is_none());
}

#[test]
fn malformed_document_is_format_error() {
    match RecordStore::from_str("{\"comments\": [") {
        Err(FormatError::Json(_)) => {}
        other => panic!("expected Json error, got {other:?}"),
    }
    assert!(matches!(RecordStore::from_slice(&[0xff, 0xfe, 0x00]), Err(FormatError::Json(_))));
    assert!(matches!(RecordStore::from_str("[1, 2, 3]"), Err(FormatError::Json(_))));
    assert!(matches!(
        RecordStore::from_str(r#"{"comments": [{"module": "a", "address": 4096, "text": "x"}]}"#),
        Err(FormatError::Json(_))
    ));
}

#[test]
fn bad_hex_address_names_the_record() {
    let doc = r#"{"functions": [
        {"start": "0x10", "end": "0x20"},
        {"start": "0x30", "end": "nope"}
    ]}"#;
    match RecordStore::from_str(doc) {
        Err(FormatError::InvalidAddress { section, index, field, value }) => {
            assert_eq!(section, Section::Functions);
            assert_eq!(index, 1);
            assert_eq!(field, "end");
            assert_eq!(value, "nope");
        }
        other => panic!("expected InvalidAddress, got {other:?}"),
    }
}

#[test]
fn load_reads_from_disk() {
    let dir = tempdir().expect("tempdir");
    let path = dir.path().join("db.json");
    std::fs::write(&path, SAMPLE).expect("write sample");
    let store = RecordStore::load(&path).expect("load");
    assert_eq!(store.len(Section::Labels), 1);

    let missing = RecordStore::load(&dir.path().join("missing.json"));
    assert!(matches!(missing, Err(FormatError::Io(_))));
}

#[test]
fn from_reader_matches_from_slice() {
    let a = RecordStore::from_reader(SAMPLE.as_bytes()).expect("reader");
    let b = RecordStore::from_slice(SAMPLE.as_bytes()).expect("slice");
    assert_eq!(a, b);
}

use std::fs;

use dbimport::{canonicalize_or_current, parse_address_arg, sha256_hex};
use tempfile::tempdir;

#[test]
fn canonicalize_or_current_resolves_existing_path() {
    let tmp = tempdir().expect("tempdir");
    let file = tmp.path().join("program.db");
    fs::write(&file, b"").expect("write");

    let result = canonicalize_or_current(file.to_str().unwrap()).expect("canonicalize");
    assert_eq!(result, file.canonicalize().expect("canon"));
}

#[test]
fn canonicalize_or_current_keeps_missing_paths_absolute() {
    let result = canonicalize_or_current("not/yet/created.db").expect("resolve");
    assert!(result.is_absolute());
    assert!(result.ends_with("not/yet/created.db"));
}

#[test]
fn parse_address_arg_accepts_hex() {
    assert_eq!(parse_address_arg("0x400000").unwrap(), 0x400000);
    assert_eq!(parse_address_arg("140000000").unwrap(), 0x1_4000_0000);
    let err = parse_address_arg("base").unwrap_err();
    assert!(err.to_string().contains("Invalid address 'base'"));
}

#[test]
fn sha256_hex_hashes_document_bytes() {
    assert_eq!(
        sha256_hex(b"abc"),
        "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
    );
    assert_eq!(sha256_hex(b"").len(), 64);
}

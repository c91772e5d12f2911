//! Tests for utility functions

use std::fs;
use std::path::{Path, PathBuf};

use bibman::format::{field, Entry};
use bibman::util::{abbreviate_home, expand_home, file_checksum, filename_from_entry, today};
use bibman::BibError;
use tempfile::TempDir;

// =============================================================================
// Checksum Tests
// =============================================================================

#[test]
fn test_checksum_known_value() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("digits.pdf");
    fs::write(&path, b"123456789").unwrap();

    assert_eq!(
        file_checksum(&path).unwrap(),
        "15e2b0d3c33891ebb0f1ef609ec419420c20e320ce94c65fbc8c3312448eb225"
    );
}

#[test]
fn test_checksum_empty_file() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("empty.pdf");
    fs::write(&path, b"").unwrap();

    assert_eq!(
        file_checksum(&path).unwrap(),
        "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
    );
}

#[test]
fn test_checksum_spans_buffer_boundary() {
    let temp = TempDir::new().unwrap();
    let a = temp.path().join("a.pdf");
    let b = temp.path().join("b.pdf");

    let mut data = vec![7u8; 20_000];
    fs::write(&a, &data).unwrap();
    data[19_999] = 8;
    fs::write(&b, &data).unwrap();

    let digest = file_checksum(&a).unwrap();
    assert_eq!(digest.len(), 64);
    assert_ne!(digest, file_checksum(&b).unwrap());
}

#[test]
fn test_checksum_missing_file() {
    let temp = TempDir::new().unwrap();
    let err = file_checksum(&temp.path().join("absent.pdf")).unwrap_err();
    assert!(matches!(err, BibError::Open { .. }));
}

// =============================================================================
// Filename Tests
// =============================================================================

#[test]
fn test_filename_cuts_title_at_colon() {
    let entry = Entry::new("article", "Smith2020")
        .with(field::TITLE, "Deep Learning: A Survey")
        .with(field::FILE, "~/papers/x.pdf");

    assert_eq!(filename_from_entry(&entry), "Smith2020-Deep_Learning.pdf");
}

#[test]
fn test_filename_limits_title_length() {
    let entry = Entry::new("book", "Long2001")
        .with(field::TITLE, "An Extremely Long Title That Goes On And On")
        .with(field::FILE, "long.djvu");

    assert_eq!(
        filename_from_entry(&entry),
        "Long2001-An_Extremely_Long_Title_That_Goes_O.djvu"
    );
}

#[test]
fn test_filename_drops_unsafe_characters() {
    let entry = Entry::new("misc", "TODO:x.pdf")
        .with(field::TITLE, "What/Why? {Really}")
        .with(field::FILE, "x.pdf");

    assert_eq!(filename_from_entry(&entry), "TODOx.pdf-WhatWhy_Really.pdf");
}

// =============================================================================
// Path Tests
// =============================================================================

#[test]
fn test_expand_home_leaves_absolute_paths() {
    assert_eq!(expand_home("/srv/papers/a.pdf"), PathBuf::from("/srv/papers/a.pdf"));
    assert_eq!(expand_home("relative.pdf"), PathBuf::from("relative.pdf"));
    assert_eq!(expand_home("~user/a.pdf"), PathBuf::from("~user/a.pdf"));
}

#[test]
fn test_home_round_trip() {
    let Some(home) = std::env::var_os("HOME").filter(|h| !h.is_empty()) else {
        return;
    };
    let home = PathBuf::from(home);

    let expanded = expand_home("~/papers/a.pdf");
    assert_eq!(expanded, home.join("papers/a.pdf"));
    assert_eq!(abbreviate_home(&expanded), "~/papers/a.pdf");
}

#[test]
fn test_abbreviate_outside_home() {
    let path = Path::new("/definitely/not/home/a.pdf");
    assert_eq!(abbreviate_home(path), "/definitely/not/home/a.pdf");
}

#[test]
fn test_today_format() {
    let date = today();
    assert_eq!(date.len(), 10);
    assert_eq!(date.as_bytes()[4], b'-');
    assert_eq!(date.as_bytes()[7], b'-');
}

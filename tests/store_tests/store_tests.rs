//! Tests for BibStore reads and mutations
//!
//! These tests verify:
//! - Raw and parsed reads at an offset
//! - Appending entries and finding them after a rescan
//! - In-place `file` updates that keep the byte layout
//! - Update refusals leave the file untouched
//! - Unterminated records end where the next record opens
//! - Opening files on disk

use std::fs;
use std::io::Cursor;
use std::sync::Arc;

use bibman::format::{field, BibFormat, BibTex, Entry};
use bibman::store::{BibStore, IndexKind, OpenMode, Offset};
use bibman::BibError;
use tempfile::TempDir;

// =============================================================================
// Helper Functions
// =============================================================================

fn entry(key: &str, file: &str) -> Entry {
    Entry::new("article", key)
        .with(field::AUTHOR, "Doe, Jane")
        .with(field::TITLE, "A Title")
        .with(field::YEAR, "2022")
        .with(field::KEYWORDS, "ml")
        .with(field::FILE, file)
        .with(field::ANNOTATION, "")
        .with(field::DATE_ADDED, "2024-05-01")
}

fn memory_store(text: &str) -> BibStore<Cursor<Vec<u8>>> {
    BibStore::new(Cursor::new(text.as_bytes().to_vec()))
}

fn contents(store: BibStore<Cursor<Vec<u8>>>) -> String {
    String::from_utf8(store.into_inner().into_inner()).unwrap()
}

// =============================================================================
// Read Tests
// =============================================================================

#[test]
fn test_read_entry_raw() {
    let text = "@misc{A,\n  title = {x},\n}   \n\n@misc{B,\n  title = {y},\n}   \n";
    let mut store = memory_store(text);
    store.build_index(&[IndexKind::Key]).unwrap();

    let b = store.query(IndexKind::Key, "B").unwrap().first().unwrap();
    let raw = store.read_entry_raw(b.start).unwrap();

    assert_eq!(raw, "@misc{B,\n  title = {y},\n}   \n");
}

#[test]
fn test_read_entry_dict() {
    let text = "@article{Smith2020,\n  author = {Smith, J},\n  keywords = {ml, nlp},\n}   \n";
    let mut store = memory_store(text);

    let parsed = store.read_entry_dict(Offset::new(0)).unwrap();

    assert!(parsed.is_complete());
    let entry = parsed.into_entry();
    assert_eq!(entry.entry_type, "article");
    assert_eq!(entry.key, "Smith2020");
    assert_eq!(entry.get(field::AUTHOR), Some("Smith, J"));
    assert_eq!(entry.keywords(), vec!["ml", "nlp"]);
}

#[test]
fn test_read_entry_dict_malformed() {
    let mut store = memory_store("garbage line\n}\n");

    let err = store.read_entry_dict(Offset::new(0)).unwrap_err();
    assert!(matches!(err, BibError::MalformedRecord(_)));
}

#[test]
fn test_read_unterminated_record_stops_at_next() {
    let text = "@misc{A,\n  title = {a},\n@misc{B,\n  file = {/old.pdf},\n}\n";
    let mut store = memory_store(text);
    store.build_index(&[IndexKind::Key]).unwrap();

    let a = store.query(IndexKind::Key, "A").unwrap().first().unwrap();
    let raw = store.read_entry_raw(a.start).unwrap();

    assert_eq!(raw.len() as u64, a.len());
    assert_eq!(raw, "@misc{A,\n  title = {a},\n");

    let entry = store.read_entry_dict(a.start).unwrap().into_entry();
    assert_eq!(entry.key, "A");
    assert_eq!(entry.get(field::FILE), None);
}

// =============================================================================
// Append Tests
// =============================================================================

#[test]
fn test_append_then_rescan() {
    let mut store = memory_store("");
    let new = entry("Doe2022", "~/doe.pdf");

    let span = store.append_new_entry(&new).unwrap();
    store.build_index(&[IndexKind::Key, IndexKind::File]).unwrap();

    let found = store.query(IndexKind::Key, "Doe2022").unwrap().first().unwrap();
    assert_eq!(found, span);
    assert_eq!(store.query(IndexKind::File, "~/doe.pdf").unwrap().first(), Some(span));

    let raw = store.read_entry_raw(span.start).unwrap();
    assert_eq!(raw, BibTex::new().serialize(&new));

    let parsed = store.read_entry_dict(span.start).unwrap();
    assert_eq!(parsed.entry, new);
}

#[test]
fn test_append_adds_blank_line() {
    let mut store = memory_store("");
    let new = entry("Doe2022", "~/doe.pdf");
    store.append_new_entry(&new).unwrap();

    let text = contents(store);
    assert!(text.ends_with("}   \n\n"));
}

#[test]
fn test_append_after_existing_records() {
    let existing = "@misc{Old,\n  title = {x},\n}   \n\n";
    let mut store = memory_store(existing);

    let span = store.append_new_entry(&entry("New2022", "")).unwrap();
    assert_eq!(span.start, Offset::new(existing.len() as u64));

    store.build_index(&[IndexKind::Key]).unwrap();
    assert!(store.contains(IndexKind::Key, "Old"));
    assert_eq!(store.query(IndexKind::Key, "New2022").unwrap().first(), Some(span));
}

#[test]
fn test_append_without_trailing_newline() {
    let existing = "@misc{Old,\n  title = {x},\n}";
    let mut store = memory_store(existing);

    let span = store.append_new_entry(&entry("New2022", "")).unwrap();
    assert_eq!(span.start, Offset::new(existing.len() as u64 + 1));

    store.build_index(&[IndexKind::Key]).unwrap();
    let old = store.query(IndexKind::Key, "Old").unwrap().first().unwrap();
    assert_eq!(old.end, span.start);
    assert!(store.contains(IndexKind::Key, "New2022"));
}

#[test]
fn test_extend_index_after_append() {
    let mut store = memory_store("");
    store
        .build_index(&[IndexKind::Key, IndexKind::Keywords])
        .unwrap();

    let new = entry("Doe2022", "~/doe.pdf");
    let span = store.append_new_entry(&new).unwrap();
    store.extend_index(&new, span);

    assert_eq!(store.query(IndexKind::Key, "Doe2022").unwrap().first(), Some(span));
    assert_eq!(store.query(IndexKind::Keywords, "ml").unwrap().first(), Some(span));
    // Not built, not extended
    assert!(store.query(IndexKind::File, "~/doe.pdf").is_none());
}

// =============================================================================
// In-place Update Tests
// =============================================================================

#[test]
fn test_update_in_place_same_length() {
    let mut store = memory_store("");
    let span = store.append_new_entry(&entry("Doe2022", "~/old.pdf")).unwrap();
    let before = store.read_entry_raw(span.start).unwrap();

    store
        .update_in_place(span.start, field::FILE, "~/old.pdf", "~/new.pdf")
        .unwrap();

    let after = store.read_entry_raw(span.start).unwrap();
    assert_eq!(after.len(), before.len());
    assert!(after.contains("file = {~/new.pdf},"));
    assert!(!after.contains("old.pdf"));
}

#[test]
fn test_update_in_place_uses_padding() {
    let mut store = memory_store("");
    let span = store.append_new_entry(&entry("Doe2022", "~/a.pdf")).unwrap();
    let before = store.read_entry_raw(span.start).unwrap();

    let longer = "~/papers/2022/doe-a-much-longer-name.pdf";
    store
        .update_in_place(span.start, field::FILE, "~/a.pdf", longer)
        .unwrap();

    let after = store.read_entry_raw(span.start).unwrap();
    assert_eq!(after.len(), before.len());

    store.build_index(&[IndexKind::File]).unwrap();
    assert_eq!(store.query(IndexKind::File, longer).unwrap().first(), Some(span));
    assert!(store.query(IndexKind::File, "~/a.pdf").is_none());
}

#[test]
fn test_update_in_place_shorter_value() {
    let text = "@misc{A,\n  file = {~/long-name.pdf},\n}   \n";
    let mut store = memory_store(text);

    store
        .update_in_place(Offset::new(0), field::FILE, "~/long-name.pdf", "~/s.pdf")
        .unwrap();

    let after = contents(store);
    assert_eq!(after.len(), text.len());
    assert!(after.contains("  file = {~/s.pdf},        \n"));
}

#[test]
fn test_update_in_place_layout_conflict() {
    let text = "@misc{A,\n  file = {~/a.pdf},\n}   \n";
    let mut store = memory_store(text);

    let err = store
        .update_in_place(Offset::new(0), field::FILE, "~/a.pdf", "~/a-longer.pdf")
        .unwrap_err();

    assert!(matches!(err, BibError::LayoutConflict { .. }));
    assert_eq!(contents(store), text);
}

#[test]
fn test_update_in_place_unsupported_field() {
    let text = "@misc{A,\n  title = {Old},\n}   \n";
    let mut store = memory_store(text);

    let err = store
        .update_in_place(Offset::new(0), field::TITLE, "Old", "New")
        .unwrap_err();

    assert!(matches!(err, BibError::UnsupportedUpdate(_)));
    assert_eq!(contents(store), text);
}

#[test]
fn test_update_in_place_missing_field() {
    let text = "@misc{A,\n  title = {Old},\n}   \n@misc{B,\n  file = {b.pdf},\n}   \n";
    let mut store = memory_store(text);

    let err = store
        .update_in_place(Offset::new(0), field::FILE, "b.pdf", "c.pdf")
        .unwrap_err();

    assert!(matches!(err, BibError::FieldNotFound { .. }));
    assert_eq!(contents(store), text);
}

#[test]
fn test_update_in_place_unterminated_record() {
    let text = "@misc{A,\n  title = {a},\n@misc{B,\n  file = {/old.pdf},\n}\n";
    let mut store = memory_store(text);
    store.build_index(&[IndexKind::Key]).unwrap();
    let a = store.query(IndexKind::Key, "A").unwrap().first().unwrap();

    let err = store
        .update_in_place(a.start, field::FILE, "/old.pdf", "/new.pdf")
        .unwrap_err();

    assert!(matches!(err, BibError::FieldNotFound { .. }));
    assert_eq!(contents(store), text);
}

#[test]
fn test_update_in_place_value_not_found() {
    let text = "@misc{A,\n  file = {a.pdf},          \n}   \n";
    let mut store = memory_store(text);

    let err = store
        .update_in_place(Offset::new(0), field::FILE, "zzz.pdf", "b.pdf")
        .unwrap_err();

    assert!(matches!(err, BibError::ValueNotFound { .. }));
    assert_eq!(contents(store), text);
}

#[test]
fn test_update_in_place_ignores_field_name() {
    let text = "@misc{A,\n  file = {name.pdf},   \n}   \n";
    let mut store = memory_store(text);

    store
        .update_in_place(Offset::new(0), field::FILE, "file", "x")
        .unwrap_err();
    assert_eq!(contents(store), text);
}

// =============================================================================
// File Tests
// =============================================================================

#[test]
fn test_open_missing_file() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("missing.bib");

    let err = BibStore::open(&path, OpenMode::ReadOnly).err().unwrap();
    assert!(matches!(err, BibError::Open { .. }));
    assert!(!path.exists());
}

#[test]
fn test_open_read_write_append() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("library.bib");
    fs::write(&path, "@misc{Old,\n  title = {x},\n}   \n\n").unwrap();

    let format: Arc<dyn BibFormat> = Arc::new(BibTex::new());
    {
        let mut store =
            BibStore::open_with_format(&path, OpenMode::ReadWrite, Arc::clone(&format)).unwrap();
        assert!(store.is_writable());
        store.append_new_entry(&entry("New2022", "~/n.pdf")).unwrap();
    }

    let mut store = BibStore::open(&path, OpenMode::ReadOnly).unwrap();
    assert!(!store.is_writable());
    store.build_index(&[IndexKind::Key]).unwrap();
    assert!(store.contains(IndexKind::Key, "Old"));
    assert!(store.contains(IndexKind::Key, "New2022"));
}

//! Tests for index builds
//!
//! These tests verify:
//! - Offsets point at the `@` of each record
//! - Spans cover the record through its terminator line
//! - Duplicate keys keep every record; unique indices keep the last one
//! - Byte offsets stay correct with multi-byte UTF-8 content
//! - Missing terminators and malformed opening lines

use std::io::Cursor;

use bibman::store::{BibStore, Index, IndexEntry, IndexKind, Offset, RecordSpan};

// =============================================================================
// Helper Functions
// =============================================================================

const TWO_RECORDS: &str = "\
@article{Smith2020,
  title = {First},
  keywords = {ml, nlp},
  file = {~/a.pdf},
  checksum = {00000001},
}   

@book{Jones2021,
  title = {Second},
  keywords = {ml},
  file = {~/b.pdf},
  md5 = {00000002},
}   

";

fn store_from(text: &str) -> BibStore<Cursor<Vec<u8>>> {
    BibStore::new(Cursor::new(text.as_bytes().to_vec()))
}

fn offset_of(text: &str, needle: &str) -> Offset {
    Offset::new(text.find(needle).unwrap() as u64)
}

// =============================================================================
// Index Build Tests
// =============================================================================

#[test]
fn test_key_offsets_point_at_records() {
    let mut store = store_from(TWO_RECORDS);
    store.build_index(&[IndexKind::Key]).unwrap();

    let smith = store.query(IndexKind::Key, "Smith2020").unwrap().first().unwrap();
    let jones = store.query(IndexKind::Key, "Jones2021").unwrap().first().unwrap();

    assert_eq!(smith.start, Offset::new(0));
    assert_eq!(jones.start, offset_of(TWO_RECORDS, "@book{Jones2021"));
}

#[test]
fn test_span_ends_after_terminator() {
    let mut store = store_from(TWO_RECORDS);
    store.build_index(&[IndexKind::Key]).unwrap();

    let smith = store.query(IndexKind::Key, "Smith2020").unwrap().first().unwrap();
    let terminator_end = TWO_RECORDS.find("}   \n").unwrap() + "}   \n".len();

    assert_eq!(smith.end, Offset::new(terminator_end as u64));
}

#[test]
fn test_keywords_index() {
    let mut store = store_from(TWO_RECORDS);
    store.build_index(&[IndexKind::Keywords]).unwrap();

    assert_eq!(store.query(IndexKind::Keywords, "ml").unwrap().spans().len(), 2);
    assert_eq!(store.query(IndexKind::Keywords, "nlp").unwrap().spans().len(), 1);
    assert!(store.query(IndexKind::Keywords, " nlp").is_none());
    assert!(store.query(IndexKind::Keywords, "cv").is_none());
}

#[test]
fn test_file_and_checksum_indices() {
    let mut store = store_from(TWO_RECORDS);
    store
        .build_index(&[IndexKind::File, IndexKind::Checksum])
        .unwrap();

    let a = store.query(IndexKind::File, "~/a.pdf").unwrap();
    assert!(matches!(a, IndexEntry::Unique(_)));
    assert_eq!(a.first().unwrap().start, Offset::new(0));

    // Legacy field name
    let second = store.query(IndexKind::Checksum, "00000002").unwrap();
    assert_eq!(
        second.first().unwrap().start,
        offset_of(TWO_RECORDS, "@book{Jones2021")
    );

    let values: Vec<&str> = store.index_values(IndexKind::File).collect();
    assert_eq!(values, vec!["~/a.pdf", "~/b.pdf"]);
}

#[test]
fn test_unbuilt_index_finds_nothing() {
    let mut store = store_from(TWO_RECORDS);
    store.build_index(&[IndexKind::Key]).unwrap();

    assert!(store.query(IndexKind::Keywords, "ml").is_none());
    assert!(!store.index().has(IndexKind::Keywords));
}

#[test]
fn test_duplicate_keys_keep_both_records() {
    let text = "@misc{Dup,\n  title = {One},\n}\n@misc{Dup,\n  title = {Two},\n}\n";
    let mut store = store_from(text);
    store.build_index(&[IndexKind::Key]).unwrap();

    let spans = store.query(IndexKind::Key, "Dup").unwrap().spans().to_vec();
    assert_eq!(spans.len(), 2);
    assert_eq!(spans[0].start, Offset::new(0));
    assert_eq!(spans[1].start, offset_of(text, "@misc{Dup,\n  title = {Two}"));
}

#[test]
fn test_duplicate_file_last_wins() {
    let text = "@misc{A,\n  file = {x.pdf},\n}\n@misc{B,\n  file = {x.pdf},\n}\n";
    let mut store = store_from(text);
    store.build_index(&[IndexKind::File]).unwrap();

    let span = store.query(IndexKind::File, "x.pdf").unwrap().first().unwrap();
    assert_eq!(span.start, offset_of(text, "@misc{B"));
}

#[test]
fn test_utf8_byte_offsets() {
    let text = "@misc{Umlaut,\n  title = {Über naïve Größe},\n}   \n\n@misc{After,\n  title = {x},\n}   \n";
    let mut store = store_from(text);
    store.build_index(&[IndexKind::Key]).unwrap();

    let after = store.query(IndexKind::Key, "After").unwrap().first().unwrap();
    assert_eq!(after.start, offset_of(text, "@misc{After"));

    let raw = store.read_entry_raw(after.start).unwrap();
    assert!(raw.starts_with("@misc{After,"));
}

#[test]
fn test_missing_terminator_ends_at_next_record() {
    let text = "@misc{Open,\n  title = {No end},\n@misc{Next,\n  title = {x},\n}\n";
    let mut store = store_from(text);
    store.build_index(&[IndexKind::Key]).unwrap();

    let open = store.query(IndexKind::Key, "Open").unwrap().first().unwrap();
    let next = store.query(IndexKind::Key, "Next").unwrap().first().unwrap();
    assert_eq!(open.end, next.start);
}

#[test]
fn test_missing_terminator_at_eof() {
    let text = "@misc{Last,\n  title = {x},\n";
    let mut store = store_from(text);
    store.build_index(&[IndexKind::Key]).unwrap();

    let last = store.query(IndexKind::Key, "Last").unwrap().first().unwrap();
    assert_eq!(last.end, Offset::new(text.len() as u64));
}

#[test]
fn test_record_without_key_is_skipped() {
    let text = "@comment\n  junk\n}\n@misc{Good,\n}\n";
    let mut store = store_from(text);
    store.build_index(&[IndexKind::Key]).unwrap();

    assert_eq!(store.index().len(IndexKind::Key), 1);
    assert!(store.contains(IndexKind::Key, "Good"));
}

#[test]
fn test_rebuild_does_not_duplicate() {
    let mut store = store_from(TWO_RECORDS);
    store.build_index(&[IndexKind::Key, IndexKind::Keywords]).unwrap();
    store.build_index(&[IndexKind::Keywords]).unwrap();

    assert_eq!(store.query(IndexKind::Keywords, "ml").unwrap().spans().len(), 2);
    assert_eq!(store.query(IndexKind::Key, "Smith2020").unwrap().spans().len(), 1);
}

#[test]
fn test_empty_stream() {
    let mut store = store_from("");
    store.build_index(&IndexKind::ALL).unwrap();

    assert!(store.index().is_empty());
}

// =============================================================================
// Index Table Tests
// =============================================================================

fn span(start: u64, end: u64) -> RecordSpan {
    RecordSpan::new(Offset::new(start), Offset::new(end))
}

#[test]
fn test_push_counts_previous_spans() {
    let mut index = Index::new();

    assert_eq!(index.push(IndexKind::Key, "k", span(0, 10)), 0);
    assert_eq!(index.push(IndexKind::Key, "k", span(10, 20)), 1);
    assert_eq!(index.get(IndexKind::Key, "k").unwrap().spans().len(), 2);
}

#[test]
fn test_set_replaces_previous_span() {
    let mut index = Index::new();

    assert_eq!(index.set(IndexKind::File, "f", span(0, 10)), None);
    assert_eq!(index.set(IndexKind::File, "f", span(10, 20)), Some(span(0, 10)));
    assert_eq!(index.get(IndexKind::File, "f").unwrap().first(), Some(span(10, 20)));
}

#[test]
fn test_index_kind_names() {
    assert_eq!("key".parse::<IndexKind>().unwrap(), IndexKind::Key);
    assert_eq!("keywords".parse::<IndexKind>().unwrap(), IndexKind::Keywords);
    assert_eq!("md5".parse::<IndexKind>().unwrap(), IndexKind::Checksum);
    assert!("author".parse::<IndexKind>().is_err());
    assert_eq!(IndexKind::Checksum.to_string(), "checksum");
    assert!(IndexKind::File.is_unique());
    assert!(!IndexKind::Keywords.is_unique());
}

#[test]
fn test_span_len() {
    assert_eq!(span(5, 12).len(), 7);
    assert!(span(3, 3).is_empty());
}

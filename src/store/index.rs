//! In-memory indices
//!
//! Maps field values to the spans of the records that carry them.

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::str::FromStr;

use crate::error::BibError;
use crate::format::field;

// =============================================================================
// Offsets and Spans
// =============================================================================

/// Byte position in the backing file
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Offset(u64);

impl Offset {
    pub const fn new(pos: u64) -> Self {
        Self(pos)
    }

    pub const fn get(self) -> u64 {
        self.0
    }
}

impl From<u64> for Offset {
    fn from(pos: u64) -> Self {
        Self(pos)
    }
}

impl fmt::Display for Offset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Byte range `[start, end)` a record occupies, terminator line included.
///
/// Ordering and equality follow `start` first, so sets of spans iterate in
/// file order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RecordSpan {
    pub start: Offset,
    pub end: Offset,
}

impl RecordSpan {
    pub fn new(start: Offset, end: Offset) -> Self {
        Self { start, end }
    }

    /// Length in bytes
    pub fn len(&self) -> u64 {
        self.end.get().saturating_sub(self.start.get())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

// =============================================================================
// Index Kinds
// =============================================================================

/// What an index is keyed by
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum IndexKind {
    /// Citation key (non-unique: duplicates are legal but warned)
    Key,

    /// Individual keywords (non-unique)
    Keywords,

    /// File path (unique: last record wins)
    File,

    /// File checksum (unique: last record wins)
    Checksum,
}

impl IndexKind {
    pub const ALL: [IndexKind; 4] = [
        IndexKind::Key,
        IndexKind::Keywords,
        IndexKind::File,
        IndexKind::Checksum,
    ];

    pub fn name(self) -> &'static str {
        match self {
            IndexKind::Key => "key",
            IndexKind::Keywords => field::KEYWORDS,
            IndexKind::File => field::FILE,
            IndexKind::Checksum => field::CHECKSUM,
        }
    }

    /// Whether a value maps to exactly one record
    pub fn is_unique(self) -> bool {
        matches!(self, IndexKind::File | IndexKind::Checksum)
    }

    /// Field names scanned for this index inside a record body.
    ///
    /// `md5` is the checksum field name of older files. The key index reads
    /// the opening line instead and has no body field.
    pub fn field_names(self) -> &'static [&'static str] {
        match self {
            IndexKind::Key => &[],
            IndexKind::Keywords => &[field::KEYWORDS],
            IndexKind::File => &[field::FILE],
            IndexKind::Checksum => &[field::CHECKSUM, "md5"],
        }
    }
}

impl fmt::Display for IndexKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for IndexKind {
    type Err = BibError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "key" | "citekey" => Ok(IndexKind::Key),
            "keywords" | "keyword" => Ok(IndexKind::Keywords),
            "file" => Ok(IndexKind::File),
            "checksum" | "md5" | "hash" => Ok(IndexKind::Checksum),
            other => Err(BibError::Config(format!("Unknown index: {}", other))),
        }
    }
}

// =============================================================================
// Index
// =============================================================================

/// Records carrying one indexed value
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IndexEntry {
    Unique(RecordSpan),
    Multi(Vec<RecordSpan>),
}

impl IndexEntry {
    pub fn spans(&self) -> &[RecordSpan] {
        match self {
            IndexEntry::Unique(span) => std::slice::from_ref(span),
            IndexEntry::Multi(spans) => spans,
        }
    }

    /// The single span of a unique entry, or the first of a list
    pub fn first(&self) -> Option<RecordSpan> {
        self.spans().first().copied()
    }
}

/// All indices built so far, by kind
#[derive(Debug, Default)]
pub struct Index {
    tables: HashMap<IndexKind, BTreeMap<String, IndexEntry>>,
}

impl Index {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the table for `kind` with an empty one
    pub fn reset(&mut self, kind: IndexKind) {
        self.tables.insert(kind, BTreeMap::new());
    }

    pub fn has(&self, kind: IndexKind) -> bool {
        self.tables.contains_key(&kind)
    }

    /// Add a span under `value` in a non-unique index.
    ///
    /// Returns how many spans the value had before this one.
    pub fn push(&mut self, kind: IndexKind, value: &str, span: RecordSpan) -> usize {
        let table = self.tables.entry(kind).or_default();
        let Some(existing) = table.get_mut(value) else {
            table.insert(value.to_string(), IndexEntry::Multi(vec![span]));
            return 0;
        };

        match existing {
            IndexEntry::Multi(spans) => {
                spans.push(span);
                spans.len() - 1
            }
            IndexEntry::Unique(prev) => {
                let prev = *prev;
                *existing = IndexEntry::Multi(vec![prev, span]);
                1
            }
        }
    }

    /// Set `value` in a unique index, replacing any previous span.
    pub fn set(&mut self, kind: IndexKind, value: &str, span: RecordSpan) -> Option<RecordSpan> {
        self.tables
            .entry(kind)
            .or_default()
            .insert(value.to_string(), IndexEntry::Unique(span))
            .and_then(|prev| prev.first())
    }

    pub fn get(&self, kind: IndexKind, value: &str) -> Option<&IndexEntry> {
        self.tables.get(&kind)?.get(value)
    }

    /// Indexed values of one kind, sorted
    pub fn values(&self, kind: IndexKind) -> impl Iterator<Item = &str> {
        self.tables
            .get(&kind)
            .into_iter()
            .flat_map(|table| table.keys().map(String::as_str))
    }

    /// Number of distinct values indexed for `kind`
    pub fn len(&self, kind: IndexKind) -> usize {
        self.tables.get(&kind).map_or(0, BTreeMap::len)
    }

    pub fn is_empty(&self) -> bool {
        self.tables.values().all(BTreeMap::is_empty)
    }
}

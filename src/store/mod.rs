//! Store Module
//!
//! Indexed, offset-addressed access to a bibliography file.
//!
//! ## Responsibilities
//! - Scan the file once per index build and record where every record starts
//! - Look records up by key, keyword, file path or checksum
//! - Re-read a single record by seeking to its start offset
//! - Append new records and rewrite one field in place without moving bytes
//!
//! ## Addressing
//! ```text
//!  offset 0 ─► @article{Smith2020,      ┐
//!                author = {...},         │ RecordSpan { start: 0, end: 412 }
//!                ...                     │
//!              }                         ┘
//!  (blank)
//!  offset 413 ─► @misc{Jones2021,       ┐
//!                ...                     │ RecordSpan { start: 413, end: ... }
//! ```
//!
//! Offsets are byte positions in the file as it was when the index was
//! built. Appends and in-place updates do not touch the in-memory index;
//! callers rebuild, or call `extend_index` for a freshly appended record.

mod bibstore;
mod index;

pub use bibstore::{BibStore, OpenMode};
pub use index::{Index, IndexEntry, IndexKind, Offset, RecordSpan};

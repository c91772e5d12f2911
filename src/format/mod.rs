//! Format Module
//!
//! Converts between raw textual records and structured entries.
//!
//! ## Responsibilities
//! - Parse one record's text into an [`Entry`] (tolerant, single-line fields)
//! - Serialize an [`Entry`] into the fixed multi-line record template
//! - Recognise record-opening and terminator lines for the store's scanner
//! - Extract a single field value from one line during index builds
//!
//! Formats are registered by name and resolved once at startup through
//! [`resolve_format`]. Only `bibtex` exists today.

mod bibtex;
mod entry;

use std::sync::Arc;

use crate::error::{BibError, Result};

pub use bibtex::{
    BibTex, BOTTOM_OPTIONAL_FIELDS, DEFAULT_FILE_WIDTH, FOLD_TERMINATOR, TERMINATORS,
    TOP_OPTIONAL_FIELDS,
};
pub use entry::{field, Entry, ParsedEntry};
pub(crate) use entry::split_keywords;

/// Capability interface every bibliography format implements.
pub trait BibFormat: Send + Sync {
    /// Registry name of this format
    fn name(&self) -> &'static str;

    /// Parse one record.
    ///
    /// Returns `Err(MalformedRecord)` when no entry type or key can be found.
    /// Chunks that do not look like `name = value` are reported in
    /// [`ParsedEntry::skipped`] instead of failing the parse.
    fn parse(&self, text: &str) -> Result<ParsedEntry>;

    /// Render an entry. Missing required fields render as empty values.
    fn serialize(&self, entry: &Entry) -> String;

    /// Does this raw line open a new record?
    fn is_record_start(&self, line: &str) -> bool;

    /// Is this raw line (newline included or not) a record terminator?
    fn is_terminator(&self, line: &str) -> bool;

    /// Extract the key from a record-opening line.
    fn key_from_opening_line<'a>(&self, line: &'a str) -> Option<&'a str>;

    /// Extract the value of `field` from a trimmed line that starts with it.
    fn field_value<'a>(&self, trimmed: &'a str, field: &str) -> Option<&'a str>;
}

/// Names accepted by [`resolve_format`]
pub const FORMAT_NAMES: &[&str] = &["bibtex"];

/// Resolve a format by name.
pub fn resolve_format(name: &str, file_width: usize) -> Result<Arc<dyn BibFormat>> {
    match name {
        "bibtex" => Ok(Arc::new(BibTex::with_file_width(file_width))),
        other => Err(BibError::Config(format!(
            "Unknown bibliography format: {} (available: {})",
            other,
            FORMAT_NAMES.join(", ")
        ))),
    }
}

//! BibTeX format
//!
//! A restricted, single-line-field subset of BibTeX, traded off against a
//! full parser for scan speed.
//!
//! ## Record Layout
//! ```text
//! @<type>{<key>,
//!   author = {<value>},
//!   title = {<value>},
//!   year = {<value>},[optional top fields]
//!   keywords = {<value>},
//!   file = {<value>},<padding to 128 cols>[optional bottom fields]
//!   annotation = {{<value>}},
//!   date-added = {<value>}
//! }<fold marker>
//! <blank line>
//! ```
//!
//! The three spaces after the closing brace are a fold marker for editors
//! (vim: `foldmarker=@,}\ \ \ `). A bare `}` is accepted as well.

use std::fmt::Write as _;

use crate::error::{BibError, Result};

use super::entry::{field, Entry, ParsedEntry};
use super::BibFormat;

/// Terminator written by [`BibTex::serialize`]
pub const FOLD_TERMINATOR: &str = "}   ";

/// Every accepted terminator line, without its newline
pub const TERMINATORS: [&str; 2] = [FOLD_TERMINATOR, "}"];

/// Optional fields rendered after `year`, in this order
pub const TOP_OPTIONAL_FIELDS: [&str; 5] = [
    field::JOURNAL,
    field::NUMBER,
    field::PAGES,
    field::PUBLISHER,
    field::VOLUME,
];

/// Optional fields rendered after `file`, in this order
pub const BOTTOM_OPTIONAL_FIELDS: [&str; 1] = [field::CHECKSUM];

/// Minimum width of the `file` value, leaving slack for in-place path updates
pub const DEFAULT_FILE_WIDTH: usize = 128;

/// Characters trimmed off the record body before splitting it into fields
const BODY_TRIM: &[char] = &['.', ' ', '\t', '\r', '\n', '{', '}'];

/// Characters trimmed off a single-line field value during index builds
const LINE_VALUE_TRIM: &[char] = &[' ', '\t', ',', '{', '}'];

/// BibTeX codec
#[derive(Debug, Clone)]
pub struct BibTex {
    file_width: usize,
}

impl Default for BibTex {
    fn default() -> Self {
        Self::with_file_width(DEFAULT_FILE_WIDTH)
    }
}

impl BibTex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Codec padding the `file` value to `file_width` bytes
    pub fn with_file_width(file_width: usize) -> Self {
        Self { file_width }
    }

    pub fn file_width(&self) -> usize {
        self.file_width
    }

    fn render_optional(out: &mut String, entry: &Entry, names: &[&str]) {
        for name in names {
            if let Some(value) = entry.get(name) {
                // Writing into a String cannot fail
                let _ = write!(out, "\n  {} = {{{}}},", name, value);
            }
        }
    }
}

/// Trim whitespace, quotes and braces from a field name or value
fn trim_field(s: &str) -> &str {
    s.trim_matches(|c: char| c.is_whitespace() || c == '"' || c == '{' || c == '}')
}

impl BibFormat for BibTex {
    fn name(&self) -> &'static str {
        "bibtex"
    }

    fn parse(&self, text: &str) -> Result<ParsedEntry> {
        if !text.starts_with('@') {
            return Err(BibError::MalformedRecord(
                "record does not start with '@'".to_string(),
            ));
        }

        let brace = text.find('{').ok_or_else(|| {
            BibError::MalformedRecord("no '{' after entry type".to_string())
        })?;
        let comma = text[brace..]
            .find(',')
            .map(|i| brace + i)
            .ok_or_else(|| BibError::MalformedRecord("no ',' after key".to_string()))?;

        let entry_type = text[1..brace].trim();
        let key = text[brace + 1..comma].trim();
        if entry_type.is_empty() || key.is_empty() {
            return Err(BibError::MalformedRecord(format!(
                "empty entry type or key in '{}'",
                &text[..comma]
            )));
        }

        let mut entry = Entry::new(entry_type, key);
        let mut skipped = Vec::new();

        let body = text[comma + 1..].trim_matches(BODY_TRIM);
        let mut chunks: Vec<&str> = body.split("},").collect();
        if chunks.len() == 1 && body.contains("\",") {
            // Quote-delimited values
            chunks = body.split("\",").collect();
        }

        for chunk in chunks {
            match chunk.split_once('=') {
                Some((name, value)) => {
                    let name = trim_field(name);
                    if name.is_empty() {
                        skipped.push(chunk.to_string());
                        continue;
                    }
                    entry.set(name, trim_field(value));
                }
                None => {
                    if !chunk.trim().is_empty() {
                        skipped.push(chunk.to_string());
                    }
                }
            }
        }

        tracing::debug!(
            "Parsed {} '{}': {} fields, {} skipped",
            entry.entry_type,
            entry.key,
            entry.fields.len(),
            skipped.len()
        );

        Ok(ParsedEntry { entry, skipped })
    }

    fn serialize(&self, entry: &Entry) -> String {
        let file = entry.get_or_empty(field::FILE);

        let mut extra_top = String::new();
        Self::render_optional(&mut extra_top, entry, &TOP_OPTIONAL_FIELDS);

        let mut extra_bottom = " ".repeat(self.file_width.saturating_sub(file.len()));
        Self::render_optional(&mut extra_bottom, entry, &BOTTOM_OPTIONAL_FIELDS);

        format!(
            "@{}{{{},\n  author = {{{}}},\n  title = {{{}}},\n  year = {{{}}},{}\n  keywords = {{{}}},\n  file = {{{}}},{}\n  annotation = {{{{{}}}}},\n  date-added = {{{}}}\n{}\n",
            entry.entry_type,
            entry.key,
            entry.get_or_empty(field::AUTHOR),
            entry.get_or_empty(field::TITLE),
            entry.get_or_empty(field::YEAR),
            extra_top,
            entry.get_or_empty(field::KEYWORDS),
            file,
            extra_bottom,
            entry.get_or_empty(field::ANNOTATION),
            entry.get_or_empty(field::DATE_ADDED),
            FOLD_TERMINATOR,
        )
    }

    fn is_record_start(&self, line: &str) -> bool {
        line.starts_with('@')
    }

    fn is_terminator(&self, line: &str) -> bool {
        let line = line.trim_end_matches(['\n', '\r']);
        TERMINATORS.contains(&line)
    }

    fn key_from_opening_line<'a>(&self, line: &'a str) -> Option<&'a str> {
        let brace = line.find('{')?;
        let rest = &line[brace + 1..];
        let comma = rest.find(',')?;
        let key = rest[..comma].trim();
        (!key.is_empty()).then_some(key)
    }

    fn field_value<'a>(&self, trimmed: &'a str, field: &str) -> Option<&'a str> {
        // Single-line values only: the whole value must sit on this line
        let rest = trimmed.strip_prefix(field)?.trim_start();
        let value = rest.strip_prefix('=')?;
        Some(value.trim_matches(LINE_VALUE_TRIM))
    }
}

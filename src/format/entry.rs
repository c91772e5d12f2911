//! Entry definitions
//!
//! The structured form of one bibliographic record.

use std::collections::BTreeMap;

/// Well-known field names
pub mod field {
    pub const AUTHOR: &str = "author";
    pub const TITLE: &str = "title";
    pub const YEAR: &str = "year";
    pub const KEYWORDS: &str = "keywords";
    pub const FILE: &str = "file";
    pub const CHECKSUM: &str = "checksum";
    pub const ANNOTATION: &str = "annotation";
    pub const DATE_ADDED: &str = "date-added";
    pub const JOURNAL: &str = "journal";
    pub const NUMBER: &str = "number";
    pub const PAGES: &str = "pages";
    pub const PUBLISHER: &str = "publisher";
    pub const VOLUME: &str = "volume";
}

/// One bibliographic entry
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Entry {
    /// Short type tag, e.g. "article" or "misc"
    pub entry_type: String,

    /// Citation key
    pub key: String,

    /// Field name → value (names are lowercase)
    pub fields: BTreeMap<String, String>,
}

impl Entry {
    /// Create an entry with no fields
    pub fn new(entry_type: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            entry_type: entry_type.into(),
            key: key.into(),
            fields: BTreeMap::new(),
        }
    }

    /// Builder-style field setter
    pub fn with(mut self, name: &str, value: impl Into<String>) -> Self {
        self.set(name, value);
        self
    }

    pub fn set(&mut self, name: &str, value: impl Into<String>) {
        self.fields.insert(name.to_ascii_lowercase(), value.into());
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.fields.get(name).map(String::as_str)
    }

    /// Field value, or "" when absent
    pub fn get_or_empty(&self, name: &str) -> &str {
        self.get(name).unwrap_or("")
    }

    /// Keywords split on `,`, trimmed, empties dropped
    pub fn keywords(&self) -> Vec<&str> {
        split_keywords(self.get_or_empty(field::KEYWORDS)).collect()
    }

    /// Overlay another entry's data on this one.
    ///
    /// Non-empty type and key replace ours; fields are overwritten by name.
    pub fn merge(&mut self, other: Entry) {
        if !other.entry_type.is_empty() {
            self.entry_type = other.entry_type;
        }
        if !other.key.is_empty() {
            self.key = other.key;
        }
        self.fields.extend(other.fields);
    }
}

/// Split a keyword list on `,`
pub(crate) fn split_keywords(value: &str) -> impl Iterator<Item = &str> {
    value.split(',').map(str::trim).filter(|k| !k.is_empty())
}

/// Result of a tolerant parse
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedEntry {
    pub entry: Entry,

    /// Body chunks that did not parse as `name = value`
    pub skipped: Vec<String>,
}

impl ParsedEntry {
    /// True when every body chunk parsed
    pub fn is_complete(&self) -> bool {
        self.skipped.is_empty()
    }

    pub fn into_entry(self) -> Entry {
        self.entry
    }
}

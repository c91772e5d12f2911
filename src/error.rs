//! Error types for bibman
//!
//! Provides a unified error type for all operations.
//!
//! Lookups that find nothing are not errors: they return `None` or an
//! empty set. Duplicate keys are logged during index build and never
//! surface here.

use std::path::PathBuf;

use thiserror::Error;

/// Result type alias using BibError
pub type Result<T> = std::result::Result<T, BibError>;

/// Unified error type for bibman operations
#[derive(Debug, Error)]
pub enum BibError {
    // -------------------------------------------------------------------------
    // I/O Errors
    // -------------------------------------------------------------------------
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The backing bibliography file could not be opened. Fatal for the
    /// current command.
    #[error("Could not open file {}: {source}", path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // -------------------------------------------------------------------------
    // Record Errors
    // -------------------------------------------------------------------------
    /// No entry type or key could be extracted from a record.
    #[error("Malformed record: {0}")]
    MalformedRecord(String),

    /// An in-place update would have changed the byte length of a line.
    #[error("Layout conflict updating '{field}': '{old}' -> '{new}' does not fit the existing line")]
    LayoutConflict {
        field: String,
        old: String,
        new: String,
    },

    /// The record at the given offset has no line for the field.
    #[error("Field '{field}' not found in record")]
    FieldNotFound { field: String },

    /// The field line exists but does not contain the value to replace.
    #[error("Value '{value}' not found in field '{field}'")]
    ValueNotFound { field: String, value: String },

    #[error("In-place update not supported for field: {0}")]
    UnsupportedUpdate(String),

    // -------------------------------------------------------------------------
    // Remote Fetch Errors
    // -------------------------------------------------------------------------
    #[error("Fetch error: {0}")]
    Fetch(String),

    // -------------------------------------------------------------------------
    // Web Viewer Errors
    // -------------------------------------------------------------------------
    #[error("HTTP error: {0}")]
    Http(String),

    // -------------------------------------------------------------------------
    // Configuration Errors
    // -------------------------------------------------------------------------
    #[error("Configuration error: {0}")]
    Config(String),
}

impl BibError {
    /// Wrap an open failure with the path that could not be opened
    pub fn open(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        BibError::Open {
            path: path.into(),
            source,
        }
    }
}

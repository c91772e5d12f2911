//! Fetch Module
//!
//! Remote bibliography metadata for newly found files.
//!
//! ## Responsibilities
//! - Describe what to look up ([`FetchQuery`]: file path and/or text search)
//! - Resolve backend names to concrete backends once at startup
//! - Try backends in priority order until one returns an entry
//!
//! A backend returns a partial [`Entry`]; the caller merges it into the
//! entry it fabricated for the file. Empty type or key values in the
//! returned entry leave the caller's values alone.

mod crossref;
mod frontend;

use std::path::PathBuf;

use crate::error::{BibError, Result};
use crate::format::Entry;

pub use crossref::CrossrefBackend;
pub use frontend::{text_search_from, FetchFrontend, TEXT_SEARCH_WORDS};

/// What to look up
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FetchQuery {
    /// File the entry is for
    pub file: Option<PathBuf>,

    /// Free-text search, usually the first words of the document
    pub text_search: Option<String>,
}

/// A source of bibliography metadata
pub trait FetchBackend: Send + Sync {
    /// Registry name of this backend
    fn name(&self) -> &'static str;

    /// Look up an entry. `Ok(None)` when nothing matched or the query holds
    /// nothing this backend can use.
    fn fetch(&self, query: &FetchQuery) -> Result<Option<Entry>>;
}

/// Names accepted by [`resolve_backend`]
pub const BACKEND_NAMES: &[&str] = &["crossref"];

/// Resolve a backend by name.
pub fn resolve_backend(name: &str) -> Result<Box<dyn FetchBackend>> {
    match name {
        "crossref" => Ok(Box::new(CrossrefBackend::new())),
        other => Err(BibError::Config(format!(
            "Unknown fetch backend: {} (available: {})",
            other,
            BACKEND_NAMES.join(", ")
        ))),
    }
}

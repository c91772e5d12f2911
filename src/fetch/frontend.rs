//! Fetch frontend
//!
//! Calls the configured backends in order until one succeeds.

use std::path::Path;
use std::process::Command;
use std::sync::OnceLock;

use regex::Regex;

use crate::error::Result;
use crate::format::Entry;

use super::{resolve_backend, FetchBackend, FetchQuery};

/// Number of leading document words used as the text search
pub const TEXT_SEARCH_WORDS: usize = 20;

/// Ordered list of fetch backends
#[derive(Default)]
pub struct FetchFrontend {
    backends: Vec<Box<dyn FetchBackend>>,
}

impl FetchFrontend {
    /// Resolve backend names in priority order
    pub fn from_names<S: AsRef<str>>(names: &[S]) -> Result<Self> {
        let backends = names
            .iter()
            .map(|name| resolve_backend(name.as_ref()))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { backends })
    }

    pub fn with_backends(backends: Vec<Box<dyn FetchBackend>>) -> Self {
        Self { backends }
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.backends.iter().map(|b| b.name()).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.backends.is_empty()
    }

    /// Look up an entry for a file, deriving a text search from its content
    pub fn fetch_for_file(&self, file: &Path) -> Option<Entry> {
        let query = FetchQuery {
            file: Some(file.to_path_buf()),
            text_search: pdf_text_search(file),
        };
        self.fetch(&query)
    }

    /// Try every backend in order; backend errors are logged and skipped.
    pub fn fetch(&self, query: &FetchQuery) -> Option<Entry> {
        tracing::debug!("Fetch query: {:?}", query);

        for backend in &self.backends {
            match backend.fetch(query) {
                Ok(Some(entry)) => {
                    tracing::debug!("Backend {} returned '{}'", backend.name(), entry.key);
                    return Some(entry);
                }
                Ok(None) => {
                    tracing::debug!("Backend {} found nothing", backend.name());
                }
                Err(e) => {
                    tracing::warn!("Fetch backend {} failed: {}", backend.name(), e);
                }
            }
        }

        None
    }
}

/// Leading words of a PDF's text, via `pdftotext`.
///
/// `None` for non-PDF files, or when the tool is missing or yields no text.
fn pdf_text_search(file: &Path) -> Option<String> {
    let is_pdf = file
        .extension()
        .map(|ext| ext.eq_ignore_ascii_case("pdf"))
        .unwrap_or(false);
    if !is_pdf {
        return None;
    }

    let output = match Command::new("pdftotext").arg("-q").arg(file).arg("-").output() {
        Ok(output) => output,
        Err(e) => {
            tracing::debug!("pdftotext unavailable: {}", e);
            return None;
        }
    };

    let search = text_search_from(&String::from_utf8_lossy(&output.stdout));
    (!search.is_empty()).then_some(search)
}

fn non_word_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\W").expect("static regex"))
}

/// Replace non-word characters with spaces and keep the first
/// [`TEXT_SEARCH_WORDS`] words.
pub fn text_search_from(text: &str) -> String {
    let cleaned = non_word_regex().replace_all(text, " ");
    cleaned
        .split_whitespace()
        .take(TEXT_SEARCH_WORDS)
        .collect::<Vec<_>>()
        .join(" ")
}

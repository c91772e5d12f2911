//! Crossref backend
//!
//! Looks a document up through the Crossref works API
//! (`https://api.crossref.org/works?query.bibliographic=...&rows=1`).

use serde::Deserialize;

use crate::error::{BibError, Result};
use crate::format::{field, Entry};

use super::{FetchBackend, FetchQuery};

const WORKS_URL: &str = "https://api.crossref.org/works";

#[derive(Debug, Deserialize)]
struct WorksResponse {
    message: WorksMessage,
}

#[derive(Debug, Deserialize)]
struct WorksMessage {
    #[serde(default)]
    items: Vec<Work>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
struct Work {
    #[serde(default, rename = "type")]
    work_type: Option<String>,
    #[serde(default)]
    title: Vec<String>,
    #[serde(default)]
    author: Vec<Author>,
    #[serde(default)]
    issued: Option<DateParts>,
    #[serde(default)]
    container_title: Vec<String>,
    #[serde(default)]
    volume: Option<String>,
    #[serde(default)]
    issue: Option<String>,
    #[serde(default)]
    page: Option<String>,
    #[serde(default)]
    publisher: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Author {
    #[serde(default)]
    given: Option<String>,
    #[serde(default)]
    family: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "kebab-case")]
struct DateParts {
    #[serde(default)]
    date_parts: Vec<Vec<Option<i64>>>,
}

/// Crossref works lookup
#[derive(Debug, Default)]
pub struct CrossrefBackend;

impl CrossrefBackend {
    pub fn new() -> Self {
        Self
    }

    /// Turn a works API response body into an entry (first item only)
    pub fn entry_from_json(body: &str) -> Result<Option<Entry>> {
        let response: WorksResponse = serde_json::from_str(body)
            .map_err(|e| BibError::Fetch(format!("Invalid Crossref response: {}", e)))?;
        Ok(response.message.items.into_iter().next().map(work_to_entry))
    }
}

impl FetchBackend for CrossrefBackend {
    fn name(&self) -> &'static str {
        "crossref"
    }

    fn fetch(&self, query: &FetchQuery) -> Result<Option<Entry>> {
        let Some(text) = query.text_search.as_deref() else {
            return Ok(None);
        };

        tracing::info!("Querying Crossref: {}", text);

        let client = reqwest::blocking::Client::builder()
            .user_agent(concat!("bibman/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| BibError::Fetch(e.to_string()))?;

        let body = client
            .get(WORKS_URL)
            .query(&[("query.bibliographic", text), ("rows", "1")])
            .send()
            .and_then(|r| r.error_for_status())
            .and_then(|r| r.text())
            .map_err(|e| BibError::Fetch(e.to_string()))?;

        Self::entry_from_json(&body)
    }
}

fn work_to_entry(work: Work) -> Entry {
    let entry_type = match work.work_type.as_deref() {
        Some("journal-article") => "article",
        Some("proceedings-article") => "inproceedings",
        Some("book") => "book",
        Some("book-chapter") => "incollection",
        Some("report") => "techreport",
        _ => "misc",
    };

    let year = work
        .issued
        .as_ref()
        .and_then(|d| d.date_parts.first())
        .and_then(|parts| parts.first().copied().flatten())
        .map(|y| y.to_string())
        .unwrap_or_default();

    let authors: Vec<String> = work
        .author
        .iter()
        .filter_map(|a| match (&a.family, &a.given) {
            (Some(family), Some(given)) => Some(format!("{}, {}", family, given)),
            (Some(family), None) => Some(family.clone()),
            (None, Some(given)) => Some(given.clone()),
            (None, None) => None,
        })
        .collect();

    let key = work
        .author
        .iter()
        .find_map(|a| a.family.as_deref())
        .map(|family| make_key(family, &year))
        .unwrap_or_default();

    let mut entry = Entry::new(entry_type, key);
    let mut set = |name: &str, value: Option<String>| {
        if let Some(value) = value.filter(|v| !v.is_empty()) {
            entry.set(name, value);
        }
    };

    set(field::AUTHOR, Some(authors.join(" and ")));
    set(field::TITLE, work.title.into_iter().next());
    set(field::YEAR, Some(year));
    set(field::JOURNAL, work.container_title.into_iter().next());
    set(field::VOLUME, work.volume);
    set(field::NUMBER, work.issue);
    set(field::PAGES, work.page);
    set(field::PUBLISHER, work.publisher);

    entry
}

/// `Author1234`: letters and digits of the family name, capitalized,
/// followed by the year.
fn make_key(family: &str, year: &str) -> String {
    let mut chars = family.chars().filter(|c| c.is_ascii_alphanumeric());
    let mut key = String::new();
    if let Some(first) = chars.next() {
        key.push(first.to_ascii_uppercase());
        key.extend(chars.map(|c| c.to_ascii_lowercase()));
    }
    key.push_str(year);
    key
}

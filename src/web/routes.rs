//! HTTP handlers

use std::path::PathBuf;
use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    response::{Html, IntoResponse, Response},
    routing::get,
    Router,
};
use parking_lot::Mutex;

use crate::error::BibError;
use crate::format::field;
use crate::query::{evaluate, parse_clauses, AND_SEPARATOR};
use crate::store::{BibStore, IndexKind, RecordSpan};
use crate::util::expand_home;

use super::render::{render_page, render_record};

/// Separator between OR clauses in `/keywords/` paths
const OR_SEPARATOR: char = '~';

/// Shared state of the viewer
pub struct WebState {
    /// Store with `Key` and `Keywords` indices built
    pub store: Mutex<BibStore>,
}

impl WebState {
    pub fn new(store: BibStore) -> Self {
        Self {
            store: Mutex::new(store),
        }
    }
}

type HandlerError = (StatusCode, String);

fn not_found(message: String) -> HandlerError {
    (StatusCode::NOT_FOUND, message)
}

fn internal(e: BibError) -> HandlerError {
    tracing::error!("Request failed: {}", e);
    (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
}

/// The one record carrying `key`
fn unique_key(store: &BibStore, key: &str) -> Result<RecordSpan, HandlerError> {
    let entry = store
        .query(IndexKind::Key, key)
        .ok_or_else(|| not_found(format!("No such key: {}", key)))?;
    match entry.spans() {
        [span] => Ok(*span),
        _ => Err(not_found(format!("Key not unique: {}", key))),
    }
}

async fn key_handler(
    State(state): State<Arc<WebState>>,
    Path(key): Path<String>,
) -> Result<Html<String>, HandlerError> {
    let mut store = state.store.lock();
    let span = unique_key(&*store, &key)?;
    let lines = render_record(&mut *store, span.start).map_err(internal)?;
    let title = format!("{} @ {}", store.name(), key);
    Ok(Html(render_page(&title, &lines)))
}

async fn keywords_handler(
    State(state): State<Arc<WebState>>,
    Path(keywords): Path<String>,
) -> Result<Html<String>, HandlerError> {
    let clauses = parse_clauses(keywords.split(OR_SEPARATOR), AND_SEPARATOR);

    let mut store = state.store.lock();
    let matches = evaluate(&*store, IndexKind::Keywords, &clauses);
    if matches.is_empty() {
        return Err(not_found(format!("No matching results: {}", keywords)));
    }

    // Newest entries first
    let mut lines = Vec::new();
    for span in matches.iter().rev() {
        lines.extend(render_record(&mut *store, span.start).map_err(internal)?);
    }

    let title = format!("{} @ {}", store.name(), keywords);
    Ok(Html(render_page(&title, &lines)))
}

async fn file_handler(
    State(state): State<Arc<WebState>>,
    Path((key, _dlname)): Path<(String, String)>,
) -> Result<Response, HandlerError> {
    // The guard must be gone before the first await
    let path: PathBuf = {
        let mut store = state.store.lock();
        let span = unique_key(&*store, &key)?;
        let entry = store.read_entry_dict(span.start).map_err(internal)?.into_entry();
        expand_home(entry.get_or_empty(field::FILE))
    };

    if !path.is_file() {
        return Err(not_found(format!("No file found: {}", path.display())));
    }

    let bytes = tokio::fs::read(&path)
        .await
        .map_err(|e| internal(BibError::Io(e)))?;

    let is_pdf = path
        .extension()
        .map(|ext| ext.eq_ignore_ascii_case("pdf"))
        .unwrap_or(false);
    let content_type = if is_pdf {
        "application/pdf"
    } else {
        "application/octet-stream"
    };

    Ok(([(header::CONTENT_TYPE, content_type)], bytes).into_response())
}

/// Build the viewer routes
pub fn web_routes(state: Arc<WebState>) -> Router {
    Router::new()
        .route("/key/:key", get(key_handler))
        .route("/keywords/:keywords", get(keywords_handler))
        .route("/file/:key/:dlname", get(file_handler))
        .with_state(state)
}

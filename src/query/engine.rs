//! Query evaluation
//!
//! Set algebra over index lookups. Absent terms are a normal outcome and
//! never raise errors.

use std::collections::BTreeSet;
use std::io::{BufRead, Read, Seek};

use crate::error::Result;
use crate::store::{BibStore, IndexKind, RecordSpan};

/// Separator between AND terms inside one clause
pub const AND_SEPARATOR: char = ',';

/// Evaluate OR-combined clauses of AND-combined terms against one index.
///
/// Returns the matching record spans in file order. Empty clauses match
/// nothing.
pub fn evaluate<S, C>(store: &BibStore<S>, kind: IndexKind, clauses: &[C]) -> BTreeSet<RecordSpan>
where
    S: Read + Seek,
    C: AsRef<[String]>,
{
    let mut result = BTreeSet::new();

    for clause in clauses {
        let mut terms = clause.as_ref().iter();
        let Some(first) = terms.next() else {
            continue;
        };

        let mut matched: BTreeSet<RecordSpan> = lookup(store, kind, first);
        for term in terms {
            if matched.is_empty() {
                break;
            }
            let other = lookup(store, kind, term);
            matched.retain(|span| other.contains(span));
        }

        result.extend(matched);
    }

    result
}

fn lookup<S: Read + Seek>(store: &BibStore<S>, kind: IndexKind, term: &str) -> BTreeSet<RecordSpan> {
    store
        .query(kind, term)
        .map(|entry| entry.spans().iter().copied().collect())
        .unwrap_or_default()
}

/// Split each OR argument on `and_sep` into trimmed AND terms.
///
/// Empty terms are dropped, as are clauses left with no terms.
pub fn parse_clauses<I, T>(values: I, and_sep: char) -> Vec<Vec<String>>
where
    I: IntoIterator<Item = T>,
    T: AsRef<str>,
{
    values
        .into_iter()
        .map(|value| {
            value
                .as_ref()
                .split(and_sep)
                .map(str::trim)
                .filter(|t| !t.is_empty())
                .map(str::to_string)
                .collect::<Vec<_>>()
        })
        .filter(|clause| !clause.is_empty())
        .collect()
}

/// Read one OR argument per line
pub fn read_clauses<R: BufRead>(reader: R) -> Result<Vec<String>> {
    let mut values = Vec::new();
    for line in reader.lines() {
        let line = line?;
        let line = line.trim();
        if !line.is_empty() {
            values.push(line.to_string());
        }
    }
    Ok(values)
}

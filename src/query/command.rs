//! Query command
//!
//! Prints matching entries, or copies the files they reference.

use std::fs;
use std::io::{BufRead, Write};
use std::path::Path;
use std::sync::Arc;

use crate::config::{Context, QueryOptions};
use crate::error::{BibError, Result};
use crate::format::field;
use crate::store::{BibStore, IndexKind, OpenMode};
use crate::util::{expand_home, filename_from_entry};

use super::engine::{evaluate, parse_clauses, read_clauses, AND_SEPARATOR};

/// Indices the query command accepts
const QUERYABLE: [IndexKind; 2] = [IndexKind::Key, IndexKind::Keywords];

/// Run the query command.
///
/// Query values come from `opts.values`, or from `input` (one clause per
/// line) when the only value is `-`. Raw entries are written to `out` in
/// file order unless `opts.copy` is set.
pub fn run_query<R: BufRead, W: Write>(
    ctx: &Context,
    opts: &QueryOptions,
    input: R,
    out: &mut W,
) -> Result<()> {
    if !QUERYABLE.contains(&opts.index) {
        return Err(BibError::Config(format!(
            "Not a valid index: {}. Available options are: {}",
            opts.index,
            QUERYABLE.map(IndexKind::name).join(",")
        )));
    }

    if let Some(dir) = &opts.copy {
        if !dir.is_dir() {
            return Err(BibError::Config(format!(
                "Not a valid path: {}",
                dir.display()
            )));
        }
    }

    let mut store = BibStore::open_with_format(
        &ctx.config.bibfile,
        OpenMode::ReadOnly,
        Arc::clone(&ctx.format),
    )?;
    store.build_index(&[opts.index])?;

    let values = match opts.values.as_slice() {
        [only] if only == "-" => read_clauses(input)?,
        values => values.to_vec(),
    };
    let clauses = parse_clauses(&values, AND_SEPARATOR);

    let matches = evaluate(&store, opts.index, &clauses);
    if matches.is_empty() {
        tracing::info!("No matches.");
        return Ok(());
    }

    for span in matches {
        match &opts.copy {
            Some(dir) => {
                let entry = store.read_entry_dict(span.start)?.into_entry();
                copy_entry_file(&entry, dir, opts.rename)?;
            }
            None => {
                let raw = store.read_entry_raw(span.start)?;
                writeln!(out, "{}", raw)?;
            }
        }
    }

    Ok(())
}

fn copy_entry_file(entry: &crate::format::Entry, dir: &Path, rename: bool) -> Result<()> {
    let file = entry.get_or_empty(field::FILE);
    if file.is_empty() {
        tracing::warn!("No file recorded for '{}'", entry.key);
        return Ok(());
    }

    let source = expand_home(file);
    let dest = if rename {
        dir.join(filename_from_entry(entry))
    } else {
        match source.file_name() {
            Some(name) => dir.join(name),
            None => dir.to_path_buf(),
        }
    };

    tracing::info!("Copying: '{}' to '{}'", source.display(), dest.display());
    fs::copy(&source, &dest)?;
    Ok(())
}

//! Directory walk
//!
//! Finds candidate documents below the sync paths.

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::Result;

/// Collect every file below `paths` whose extension is in `extensions`.
///
/// Paths are made absolute without resolving symlinks. Directories that do
/// not exist are logged and skipped. The result is sorted.
pub fn walk_paths(paths: &[PathBuf], extensions: &[String]) -> Result<Vec<PathBuf>> {
    let cwd = std::env::current_dir()?;
    let mut found = Vec::new();

    for path in paths {
        if !path.is_dir() {
            tracing::error!("Could not find directory: {}", path.display());
            continue;
        }

        let root = if path.is_absolute() {
            path.clone()
        } else {
            cwd.join(path)
        };
        walk_dir(&root, extensions, &mut found)?;
    }

    found.sort();
    found.dedup();
    Ok(found)
}

fn walk_dir(dir: &Path, extensions: &[String], found: &mut Vec<PathBuf>) -> Result<()> {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) => {
            tracing::error!("Could not read directory {}: {}", dir.display(), e);
            return Ok(());
        }
    };

    for entry in entries {
        let entry = entry?;
        let file_type = entry.file_type()?;
        let path = entry.path();

        if file_type.is_dir() {
            walk_dir(&path, extensions, found)?;
        } else if has_extension(&path, extensions) {
            found.push(path);
        }
    }

    Ok(())
}

fn has_extension(path: &Path, extensions: &[String]) -> bool {
    match path.extension().and_then(|e| e.to_str()) {
        Some(ext) => extensions.iter().any(|want| want.eq_ignore_ascii_case(ext)),
        None => false,
    }
}

//! Utility functions
//!
//! File checksums, descriptive filenames, and `~` path handling.

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};

use sha2::{Digest, Sha256};

use crate::error::{BibError, Result};
use crate::format::{field, Entry};

/// Longest title prefix used in generated filenames
const FILENAME_TITLE_CHARS: usize = 35;

/// Compute the SHA-256 checksum of a file by streaming it in 8 KiB chunks.
///
/// Rendered as 64 lowercase hex digits; the store treats it as an opaque
/// string.
pub fn file_checksum(path: &Path) -> Result<String> {
    let file = File::open(path).map_err(|e| BibError::open(path, e))?;

    let mut reader = BufReader::new(file);
    let mut hasher = Sha256::new();
    let mut buffer = [0u8; 8192];

    loop {
        let bytes_read = reader.read(&mut buffer)?;
        if bytes_read == 0 {
            break;
        }
        hasher.update(&buffer[..bytes_read]);
    }

    Ok(format!("{:x}", hasher.finalize()))
}

fn is_filename_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || "-_(). ".contains(c)
}

/// Build a descriptive filename: `<key>-<title>.<ext>`.
///
/// Titles of the form `SHORT: LONGER` are cut at the colon; the title
/// prefix is at most 35 characters, spaces become `_`, and characters
/// outside `[-_(). A-Za-z0-9]` are dropped. The extension comes from the
/// entry's `file` field.
pub fn filename_from_entry(entry: &Entry) -> String {
    let title: String = entry
        .get_or_empty(field::TITLE)
        .chars()
        .take(FILENAME_TITLE_CHARS)
        .collect();
    let title = title.split(':').next().unwrap_or("").replace(' ', "_");

    let file = entry.get_or_empty(field::FILE);
    let extension = file.rsplit('.').next().unwrap_or(file);

    format!("{}-{}.{}", entry.key, title, extension)
        .chars()
        .filter(|c| is_filename_char(*c))
        .collect()
}

fn home_dir() -> Option<PathBuf> {
    std::env::var_os("HOME")
        .filter(|h| !h.is_empty())
        .map(PathBuf::from)
}

/// Expand a leading `~` to `$HOME`
pub fn expand_home(path: &str) -> PathBuf {
    match (path.strip_prefix('~'), home_dir()) {
        (Some(rest), Some(home)) if rest.is_empty() || rest.starts_with('/') => {
            home.join(rest.trim_start_matches('/'))
        }
        _ => PathBuf::from(path),
    }
}

/// Replace a leading `$HOME` with `~`
pub fn abbreviate_home(path: &Path) -> String {
    if let Some(home) = home_dir() {
        if let Ok(rest) = path.strip_prefix(&home) {
            if rest.as_os_str().is_empty() {
                return "~".to_string();
            }
            return format!("~/{}", rest.display());
        }
    }
    path.display().to_string()
}

/// Today's date as `YYYY-MM-DD`
pub fn today() -> String {
    chrono::Local::now().format("%Y-%m-%d").to_string()
}

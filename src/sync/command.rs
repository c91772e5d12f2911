//! Sync command
//!
//! Finds un-cataloged documents and fabricates entries for them.

use std::collections::{BTreeSet, HashSet};
use std::fs;
use std::io::{BufRead, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::config::{Context, SyncOptions};
use crate::error::{BibError, Result};
use crate::format::{field, Entry};
use crate::store::{BibStore, IndexKind, OpenMode};
use crate::util::{abbreviate_home, expand_home, file_checksum, filename_from_entry, today};

use super::prompt::interactive_corrections;
use super::walk::walk_paths;

/// What a sync run did
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SyncReport {
    /// Files already in the catalog
    pub existing: usize,

    /// Existing files whose checksum no longer matches
    pub mismatched: usize,

    /// New files whose content is already cataloged under another path
    pub duplicates: usize,

    /// Stale paths fixed in place
    pub updated: usize,

    /// New entries appended to the main bibliography
    pub appended: usize,

    /// New entries printed instead of appended
    pub printed: usize,
}

/// How a new file's checksum matched the catalog
enum ChecksumMatch {
    None,
    Found { updated: usize },
}

/// One sync run over a main bibliography and its exclude bibliographies
pub struct SyncCommand<'a> {
    ctx: &'a Context,
    opts: &'a SyncOptions,

    /// The bibliography new entries go to
    main: BibStore,

    /// Read-only bibliographies that also count as the catalog
    excludes: Vec<BibStore>,

    /// Keys handed out during this run that the indices do not know yet
    new_keys: HashSet<String>,
}

impl<'a> SyncCommand<'a> {
    /// Open every bibliography and build the indices sync needs.
    pub fn new(ctx: &'a Context, opts: &'a SyncOptions) -> Result<Self> {
        let mode = if opts.append {
            OpenMode::ReadWrite
        } else {
            OpenMode::ReadOnly
        };
        let mut main =
            BibStore::open_with_format(&ctx.config.bibfile, mode, Arc::clone(&ctx.format))?;

        let mut excludes = Vec::with_capacity(opts.excludes.len());
        for path in &opts.excludes {
            excludes.push(BibStore::open_with_format(
                path,
                OpenMode::ReadOnly,
                Arc::clone(&ctx.format),
            )?);
        }

        let mut indices = vec![IndexKind::File, IndexKind::Key];
        if opts.checksum {
            indices.push(IndexKind::Checksum);
        }

        main.build_index(&indices)?;
        for store in &mut excludes {
            store.build_index(&indices)?;
        }

        // Values shared between main and an exclude bibliography
        for kind in &indices {
            let main_values: BTreeSet<&str> = main.index_values(*kind).collect();
            for store in &excludes {
                let shared: Vec<&str> = store
                    .index_values(*kind)
                    .filter(|v| main_values.contains(v))
                    .collect();
                if !shared.is_empty() {
                    tracing::warn!(
                        "Duplicates found in '{}': {} = {:?}",
                        store.name(),
                        kind,
                        shared
                    );
                }
            }
        }

        Ok(Self {
            ctx,
            opts,
            main,
            excludes,
            new_keys: HashSet::new(),
        })
    }

    /// Walk the sync paths and handle every candidate file.
    ///
    /// Interactive prompts read from `input`; prompts and printed entries go
    /// to `out`.
    pub fn run<R: BufRead, W: Write>(&mut self, input: &mut R, out: &mut W) -> Result<SyncReport> {
        let mut report = SyncReport::default();

        for path in walk_paths(&self.opts.paths, &self.opts.extensions)? {
            let shown_path = abbreviate_home(&path);

            if self.exists(IndexKind::File, &shown_path) {
                report.existing += 1;
                if self.opts.verify && !self.verify_checksum(&shown_path, &path)? {
                    report.mismatched += 1;
                }
                continue;
            }

            self.add_new_file(&path, shown_path, input, out, &mut report)?;
        }

        Ok(report)
    }

    fn add_new_file<R: BufRead, W: Write>(
        &mut self,
        path: &Path,
        shown_path: String,
        input: &mut R,
        out: &mut W,
        report: &mut SyncReport,
    ) -> Result<()> {
        let basename = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        let mut entry = Entry::new("misc", format!("TODO:{}", basename))
            .with(field::AUTHOR, "")
            .with(field::TITLE, "")
            .with(field::YEAR, "")
            .with(field::KEYWORDS, "")
            .with(field::FILE, shown_path.as_str())
            .with(field::ANNOTATION, "")
            .with(field::DATE_ADDED, today());

        if self.opts.checksum {
            let digest = file_checksum(path)?;
            entry.set(field::CHECKSUM, digest.as_str());

            // Known content under another path: fix or report, never append
            if let ChecksumMatch::Found { updated } = self.check_checksum(&digest, &shown_path)? {
                report.duplicates += 1;
                report.updated += updated;
                return Ok(());
            }
        }

        if self.opts.remote {
            tracing::info!(
                "Attempting to fetch bibliography information remotely: {}",
                shown_path
            );
            if let Some(fetched) = self.ctx.fetch.fetch_for_file(path) {
                entry.merge(fetched);
            }
        }

        if self.opts.interactive {
            let rendered = self.main.render_entry(&entry);
            entry = interactive_corrections(&rendered, entry, input, out)?;

            if self.opts.rename {
                let new_shown_path = renamed_path(&shown_path, &entry);
                tracing::info!("Rename: {} to {}", shown_path, new_shown_path);
                fs::rename(expand_home(&shown_path), expand_home(&new_shown_path))?;
                entry.set(field::FILE, new_shown_path);
            }
        }

        self.ensure_unique_key(&mut entry);

        if self.opts.append {
            tracing::info!("Appending new entry for: {}", entry.get_or_empty(field::FILE));
            let span = self.main.append_new_entry(&entry)?;
            self.main.extend_index(&entry, span);
            report.appended += 1;
        } else {
            write!(out, "{}", self.main.render_entry(&entry))?;
            writeln!(out)?;
            report.printed += 1;
        }
        self.new_keys.insert(entry.key);

        Ok(())
    }

    // =========================================================================
    // Catalog Lookups
    // =========================================================================

    fn stores(&self) -> impl Iterator<Item = &BibStore> {
        std::iter::once(&self.main).chain(self.excludes.iter())
    }

    fn exists(&self, kind: IndexKind, value: &str) -> bool {
        self.stores().any(|store| store.contains(kind, value))
    }

    fn key_in_use(&self, key: &str) -> bool {
        self.new_keys.contains(key) || self.exists(IndexKind::Key, key)
    }

    /// Suffix the key with the first letter that makes it unused
    fn ensure_unique_key(&self, entry: &mut Entry) {
        if !self.key_in_use(&entry.key) {
            return;
        }

        tracing::debug!("Key already exists: {}", entry.key);
        let candidate = ('a'..='z')
            .chain('A'..='Z')
            .map(|c| format!("{}{}", entry.key, c))
            .find(|k| !self.key_in_use(k));

        match candidate {
            Some(key) => entry.key = key,
            None => tracing::warn!("No free key suffix for '{}'; keeping it", entry.key),
        }
    }

    // =========================================================================
    // Checksums
    // =========================================================================

    /// Look the checksum of a new file up in every bibliography.
    ///
    /// A match whose recorded file is gone gets its path updated in place
    /// when the bibliography is writable and `--append` is set; otherwise a
    /// fix is suggested. A match whose file still exists is reported as a
    /// duplicate.
    fn check_checksum(&mut self, digest: &str, shown_path: &str) -> Result<ChecksumMatch> {
        let append = self.opts.append;
        let mut found = false;
        let mut updated = 0;

        let stores = std::iter::once(&mut self.main).chain(self.excludes.iter_mut());
        for store in stores {
            let Some(span) = store.query(IndexKind::Checksum, digest).and_then(|e| e.first()) else {
                continue;
            };
            found = true;

            let entry = match store.read_entry_dict(span.start) {
                Ok(parsed) => parsed.into_entry(),
                Err(e) => {
                    tracing::warn!("Skipping entry at offset {} in '{}': {}", span.start, store.name(), e);
                    continue;
                }
            };
            let recorded = entry.get_or_empty(field::FILE).to_string();

            if expand_home(&recorded).exists() {
                tracing::warn!(
                    "Duplicate for '{}' found in '{}': key = '{}'",
                    shown_path,
                    store.name(),
                    entry.key
                );
                continue;
            }

            if append && store.is_writable() {
                match store.update_in_place(span.start, field::FILE, &recorded, shown_path) {
                    Ok(()) => {
                        tracing::info!("Updated entry for '{}' with '{}'", entry.key, shown_path);
                        updated += 1;
                        continue;
                    }
                    Err(e @ (BibError::LayoutConflict { .. }
                    | BibError::ValueNotFound { .. }
                    | BibError::FieldNotFound { .. })) => {
                        tracing::debug!("In-place update impossible: {}", e);
                    }
                    Err(e) => return Err(e),
                }
            }

            tracing::warn!(
                "File '{}' missing; suggested fix: update '{}' in '{}' with '{}'",
                recorded,
                entry.key,
                store.name(),
                shown_path
            );
        }

        Ok(if found {
            ChecksumMatch::Found { updated }
        } else {
            ChecksumMatch::None
        })
    }

    /// Compare a cataloged file's checksum with the main bibliography.
    ///
    /// Returns false on mismatch. Files cataloged only in exclude
    /// bibliographies are not verified.
    fn verify_checksum(&mut self, shown_path: &str, path: &Path) -> Result<bool> {
        let Some(span) = self.main.query(IndexKind::File, shown_path).and_then(|e| e.first()) else {
            return Ok(true);
        };

        let entry = self.main.read_entry_dict(span.start)?.into_entry();
        let recorded = IndexKind::Checksum
            .field_names()
            .iter()
            .find_map(|name| entry.get(name))
            .unwrap_or("");
        let digest = file_checksum(path)?;

        if digest != recorded {
            tracing::warn!("Checksum mismatch: {} ({} != {})", shown_path, digest, recorded);
            return Ok(false);
        }
        Ok(true)
    }

    /// Give the main bibliography back
    pub fn into_main(self) -> BibStore {
        self.main
    }
}

/// Sibling path of `shown_path` named after the entry
fn renamed_path(shown_path: &str, entry: &Entry) -> String {
    let name = filename_from_entry(entry);
    match Path::new(shown_path).parent() {
        Some(parent) if !parent.as_os_str().is_empty() => {
            PathBuf::from(parent).join(name).display().to_string()
        }
        _ => name,
    }
}

/// Run the sync command.
pub fn run_sync<R: BufRead, W: Write>(
    ctx: &Context,
    opts: &SyncOptions,
    input: &mut R,
    out: &mut W,
) -> Result<SyncReport> {
    let mut command = SyncCommand::new(ctx, opts)?;
    let report = command.run(input, out)?;

    tracing::info!(
        "Sync: {} existing, {} new ({} appended, {} printed), {} duplicates, {} updated",
        report.existing,
        report.appended + report.printed,
        report.appended,
        report.printed,
        report.duplicates,
        report.updated
    );

    Ok(report)
}

//! Bibliography Store
//!
//! Owns one open bibliography stream, builds indices by scanning it, and
//! reads or mutates single records by their start offset.

use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, Read, Seek, SeekFrom, Write};
use std::path::Path;
use std::sync::Arc;

use crate::error::{BibError, Result};
use crate::format::{field, BibFormat, BibTex, Entry, ParsedEntry};

use super::index::{Index, IndexEntry, IndexKind, Offset, RecordSpan};

/// How to open the backing file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpenMode {
    ReadOnly,
    ReadWrite,
}

/// Index-side facts collected for a record until its end is known
struct PendingRecord {
    start: Offset,
    key: Option<String>,
    values: Vec<(IndexKind, String)>,
}

/// An indexed bibliography backed by a seekable stream.
///
/// ## Ownership
/// The store exclusively owns its stream; dropping the store closes it.
/// There is no internal locking and no generation check: any append or
/// in-place update leaves previously built indices as they were, and spans
/// returned before a length-changing mutation must not be reused.
pub struct BibStore<S = File> {
    /// Backing stream
    stream: S,

    /// Record codec
    format: Arc<dyn BibFormat>,

    /// Indices built so far
    index: Index,

    /// Human-readable name used in log messages
    name: String,

    /// Whether mutations are expected to succeed
    writable: bool,
}

impl BibStore<File> {
    /// Open a bibliography file with the BibTeX codec
    pub fn open(path: &Path, mode: OpenMode) -> Result<Self> {
        Self::open_with_format(path, mode, Arc::new(BibTex::default()))
    }

    /// Open a bibliography file with the given codec
    ///
    /// The file must already exist. Failure to open it is fatal for the
    /// calling command and surfaces as [`BibError::Open`].
    pub fn open_with_format(
        path: &Path,
        mode: OpenMode,
        format: Arc<dyn BibFormat>,
    ) -> Result<Self> {
        let file = match mode {
            OpenMode::ReadOnly => File::open(path),
            OpenMode::ReadWrite => OpenOptions::new().read(true).write(true).open(path),
        }
        .map_err(|e| BibError::open(path, e))?;

        tracing::debug!("Opened {} ({:?})", path.display(), mode);

        Ok(Self {
            stream: file,
            format,
            index: Index::new(),
            name: path.display().to_string(),
            writable: mode == OpenMode::ReadWrite,
        })
    }
}

impl<S: Read + Seek> BibStore<S> {
    /// Wrap an already open stream with the BibTeX codec
    pub fn new(stream: S) -> Self {
        Self::with_format(stream, Arc::new(BibTex::default()))
    }

    /// Wrap an already open stream with the given codec
    pub fn with_format(stream: S, format: Arc<dyn BibFormat>) -> Self {
        Self {
            stream,
            format,
            index: Index::new(),
            name: "<stream>".to_string(),
            writable: true,
        }
    }

    /// Set the name used in log messages
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    // =========================================================================
    // Index Build
    // =========================================================================

    /// Build the requested indices with one forward scan of the stream.
    ///
    /// Tables for the requested kinds are rebuilt from scratch; tables for
    /// other kinds are kept as they are. A record ends at its terminator
    /// line, or at the next record-opening line or end of stream when the
    /// terminator is missing.
    ///
    /// Field values are read from the single line on which the field name
    /// starts; multi-line values are not supported.
    pub fn build_index(&mut self, kinds: &[IndexKind]) -> Result<()> {
        for kind in kinds {
            self.index.reset(*kind);
        }

        let want_key = kinds.contains(&IndexKind::Key);
        let body_kinds: Vec<IndexKind> = kinds
            .iter()
            .copied()
            .filter(|k| *k != IndexKind::Key)
            .collect();

        let format = Arc::clone(&self.format);
        self.stream.seek(SeekFrom::Start(0))?;
        let mut reader = BufReader::new(&mut self.stream);

        let mut buf = Vec::new();
        let mut pos: u64 = 0;
        let mut current: Option<PendingRecord> = None;
        let mut records: u64 = 0;

        loop {
            buf.clear();
            let n = reader.read_until(b'\n', &mut buf)?;
            if n == 0 {
                break;
            }
            let line = String::from_utf8_lossy(&buf);

            if format.is_record_start(&line) {
                if let Some(pending) = current.take() {
                    // Previous record never saw its terminator
                    tracing::debug!("Unterminated record at offset {} in {}", pending.start, self.name);
                    commit(&mut self.index, &self.name, pending, Offset::new(pos));
                    records += 1;
                }

                let mut pending = PendingRecord {
                    start: Offset::new(pos),
                    key: None,
                    values: Vec::new(),
                };

                if want_key {
                    match format.key_from_opening_line(&line) {
                        Some(key) => pending.key = Some(key.to_string()),
                        None => tracing::warn!(
                            "Malformed record at offset {} in {}: no key in '{}'",
                            pos,
                            self.name,
                            line.trim_end()
                        ),
                    }
                }

                current = Some(pending);
            } else if format.is_terminator(&line) {
                if let Some(pending) = current.take() {
                    commit(&mut self.index, &self.name, pending, Offset::new(pos + n as u64));
                    records += 1;
                }
            } else if let Some(pending) = current.as_mut() {
                let trimmed = line.trim();
                for kind in &body_kinds {
                    let value = kind
                        .field_names()
                        .iter()
                        .find_map(|name| format.field_value(trimmed, name));
                    if let Some(value) = value {
                        pending.values.push((*kind, value.to_string()));
                    }
                }
            }

            pos += n as u64;
        }

        if let Some(pending) = current.take() {
            commit(&mut self.index, &self.name, pending, Offset::new(pos));
            records += 1;
        }

        tracing::debug!(
            "Indexed {} records ({} bytes) of {} for {:?}",
            records,
            pos,
            self.name,
            kinds
        );

        Ok(())
    }

    // =========================================================================
    // Lookups
    // =========================================================================

    /// Look up a value in an index.
    ///
    /// `None` when the index was never built or the value is absent.
    pub fn query(&self, kind: IndexKind, value: &str) -> Option<&IndexEntry> {
        self.index.get(kind, value)
    }

    /// Whether `value` is present in the `kind` index
    pub fn contains(&self, kind: IndexKind, value: &str) -> bool {
        self.index.get(kind, value).is_some()
    }

    /// All values indexed for `kind`, sorted
    pub fn index_values(&self, kind: IndexKind) -> impl Iterator<Item = &str> {
        self.index.values(kind)
    }

    pub fn index(&self) -> &Index {
        &self.index
    }

    /// Add a record written after the last build to every index already
    /// built, without rescanning.
    pub fn extend_index(&mut self, entry: &Entry, span: RecordSpan) {
        let mut pending = PendingRecord {
            start: span.start,
            key: None,
            values: Vec::new(),
        };

        for kind in IndexKind::ALL {
            if !self.index.has(kind) {
                continue;
            }
            match kind {
                IndexKind::Key => pending.key = Some(entry.key.clone()),
                _ => {
                    let value = kind.field_names().iter().find_map(|name| entry.get(name));
                    if let Some(value) = value {
                        pending.values.push((kind, value.to_string()));
                    }
                }
            }
        }

        commit(&mut self.index, &self.name, pending, span.end);
    }

    // =========================================================================
    // Record Reads
    // =========================================================================

    /// Read a record verbatim, from `start` through its terminator line,
    /// or up to the next record-opening line or end of stream.
    pub fn read_entry_raw(&mut self, start: Offset) -> Result<String> {
        let lines = self.read_record_lines(start)?;
        Ok(lines.concat())
    }

    /// Read a record and parse it into fields.
    ///
    /// Every line is trimmed before the lines are joined and handed to the
    /// codec. Returns `Err(MalformedRecord)` when no type or key is found.
    pub fn read_entry_dict(&mut self, start: Offset) -> Result<ParsedEntry> {
        let lines = self.read_record_lines(start)?;
        let joined: String = lines.iter().map(|l| l.trim()).collect();
        self.format.parse(&joined)
    }

    fn read_record_lines(&mut self, start: Offset) -> Result<Vec<String>> {
        self.stream.seek(SeekFrom::Start(start.get()))?;
        let mut reader = BufReader::new(&mut self.stream);

        let mut lines = Vec::new();
        let mut buf = Vec::new();
        loop {
            buf.clear();
            if reader.read_until(b'\n', &mut buf)? == 0 {
                break;
            }
            let line = String::from_utf8_lossy(&buf).into_owned();
            // An unterminated record ends where the next one opens
            if !lines.is_empty() && self.format.is_record_start(&line) {
                break;
            }
            let done = self.format.is_terminator(&line);
            lines.push(line);
            if done {
                break;
            }
        }

        Ok(lines)
    }

    /// Serialize an entry without writing it
    pub fn render_entry(&self, entry: &Entry) -> String {
        self.format.serialize(entry)
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn format(&self) -> &Arc<dyn BibFormat> {
        &self.format
    }

    pub fn is_writable(&self) -> bool {
        self.writable
    }

    /// Give the stream back, dropping the indices
    pub fn into_inner(self) -> S {
        self.stream
    }
}

impl<S: Read + Write + Seek> BibStore<S> {
    // =========================================================================
    // Mutations
    // =========================================================================

    /// Append a serialized entry followed by a blank line.
    ///
    /// Indices are not updated. Returns the span of the new record, blank
    /// line excluded.
    pub fn append_new_entry(&mut self, entry: &Entry) -> Result<RecordSpan> {
        let end = self.stream.seek(SeekFrom::End(0))?;

        // Never glue a record onto an unterminated last line
        let mut start = end;
        if end > 0 {
            self.stream.seek(SeekFrom::End(-1))?;
            let mut last = [0u8; 1];
            self.stream.read_exact(&mut last)?;
            if last[0] != b'\n' {
                self.stream.write_all(b"\n")?;
                start += 1;
            }
        }

        let text = self.format.serialize(entry);
        self.stream.write_all(text.as_bytes())?;
        self.stream.write_all(b"\n")?;
        self.stream.flush()?;

        tracing::debug!("Appended '{}' at offset {} in {}", entry.key, start, self.name);

        Ok(RecordSpan::new(
            Offset::new(start),
            Offset::new(start + text.len() as u64),
        ))
    }

    /// Replace `old` with `new` in one field of the record at `start`,
    /// keeping the line's byte length.
    ///
    /// The line is re-padded with trailing spaces. When the new value does
    /// not fit, nothing is written and [`BibError::LayoutConflict`] is
    /// returned. Only the `file` field can be updated.
    pub fn update_in_place(
        &mut self,
        start: Offset,
        field_name: &str,
        old: &str,
        new: &str,
    ) -> Result<()> {
        if field_name != field::FILE {
            return Err(BibError::UnsupportedUpdate(field_name.to_string()));
        }

        let (line_pos, raw) = self.find_field_line(start, field_name)?;
        let line = String::from_utf8(raw).map_err(|_| {
            BibError::MalformedRecord(format!(
                "'{}' line at offset {} is not valid UTF-8",
                field_name, line_pos
            ))
        })?;

        let ending = if line.ends_with("\r\n") {
            "\r\n"
        } else if line.ends_with('\n') {
            "\n"
        } else {
            ""
        };
        let body = &line[..line.len() - ending.len()];
        let content = body.trim_end();

        // Only replace inside the value, never in the field name
        let value_from = content.find('=').map_or(0, |i| i + 1);
        let at = content[value_from..]
            .find(old)
            .map(|i| value_from + i)
            .filter(|_| !old.is_empty())
            .ok_or_else(|| BibError::ValueNotFound {
                field: field_name.to_string(),
                value: old.to_string(),
            })?;

        let mut new_line = String::with_capacity(line.len());
        new_line.push_str(&content[..at]);
        new_line.push_str(new);
        new_line.push_str(&content[at + old.len()..]);

        if new_line.len() > body.len() {
            return Err(BibError::LayoutConflict {
                field: field_name.to_string(),
                old: old.to_string(),
                new: new.to_string(),
            });
        }

        let padding = body.len() - new_line.len();
        new_line.extend(std::iter::repeat(' ').take(padding));
        new_line.push_str(ending);
        debug_assert_eq!(new_line.len(), line.len());

        self.stream.seek(SeekFrom::Start(line_pos))?;
        self.stream.write_all(new_line.as_bytes())?;
        self.stream.flush()?;

        tracing::debug!(
            "Updated '{}' in place at offset {} in {}",
            field_name,
            line_pos,
            self.name
        );

        Ok(())
    }

    /// Locate the line of `field_name` inside the record at `start`.
    ///
    /// Returns its absolute offset and raw bytes.
    fn find_field_line(&mut self, start: Offset, field_name: &str) -> Result<(u64, Vec<u8>)> {
        self.stream.seek(SeekFrom::Start(start.get()))?;
        let mut reader = BufReader::new(&mut self.stream);

        let mut pos = start.get();
        let mut buf = Vec::new();
        loop {
            buf.clear();
            let n = reader.read_until(b'\n', &mut buf)?;
            if n == 0 {
                break;
            }

            let line = String::from_utf8_lossy(&buf);
            if self.format.is_terminator(&line)
                || (pos > start.get() && self.format.is_record_start(&line))
            {
                break;
            }
            if self.format.field_value(line.trim(), field_name).is_some() {
                return Ok((pos, buf));
            }

            pos += n as u64;
        }

        Err(BibError::FieldNotFound {
            field: field_name.to_string(),
        })
    }
}

/// Move a finished record's facts into the index
fn commit(index: &mut Index, name: &str, pending: PendingRecord, end: Offset) {
    let span = RecordSpan::new(pending.start, end);

    if let Some(key) = pending.key {
        if index.push(IndexKind::Key, &key, span) > 0 {
            tracing::warn!("Duplicate key found in {}: {}", name, key);
        }
    }

    for (kind, value) in pending.values {
        match kind {
            IndexKind::Keywords => {
                for keyword in crate::format::split_keywords(&value) {
                    index.push(kind, keyword, span);
                }
            }
            IndexKind::File | IndexKind::Checksum => {
                if value.is_empty() {
                    continue;
                }
                if let Some(prev) = index.set(kind, &value, span) {
                    tracing::debug!(
                        "{} '{}' in {} also at offset {}; keeping offset {}",
                        kind,
                        value,
                        name,
                        prev.start,
                        span.start
                    );
                }
            }
            IndexKind::Key => {}
        }
    }
}

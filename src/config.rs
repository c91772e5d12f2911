//! Configuration for bibman
//!
//! Centralized configuration with sensible defaults, plus the per-command
//! option sets and the [`Context`] value threaded through every command.

use std::path::PathBuf;
use std::sync::Arc;

use crate::error::Result;
use crate::fetch::FetchFrontend;
use crate::format::{resolve_format, BibFormat, DEFAULT_FILE_WIDTH};
use crate::store::IndexKind;

/// Main configuration for a bibman invocation
#[derive(Debug, Clone)]
pub struct Config {
    // -------------------------------------------------------------------------
    // Store Configuration
    // -------------------------------------------------------------------------
    /// Bibliography file to work with
    pub bibfile: PathBuf,

    /// Bibliography format name, resolved through the format registry
    pub format: String,

    /// Minimum width the `file` value is padded to when a record is written
    pub file_width: usize,

    // -------------------------------------------------------------------------
    // Remote Fetch Configuration
    // -------------------------------------------------------------------------
    /// Fetch backends, tried in order until one returns a result
    pub fetch_priority: Vec<String>,

    // -------------------------------------------------------------------------
    // Web Viewer Configuration
    // -------------------------------------------------------------------------
    /// HTTP listen address (host:port)
    pub listen_addr: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bibfile: PathBuf::from("./bibliography.bib"),
            format: "bibtex".to_string(),
            file_width: DEFAULT_FILE_WIDTH,
            fetch_priority: vec!["crossref".to_string()],
            listen_addr: "127.0.0.1:8080".to_string(),
        }
    }
}

impl Config {
    /// Create a new config builder
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }
}

/// Builder for Config
#[derive(Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Set the bibliography file
    pub fn bibfile(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.bibfile = path.into();
        self
    }

    /// Set the bibliography format name
    pub fn format(mut self, name: impl Into<String>) -> Self {
        self.config.format = name.into();
        self
    }

    /// Set the minimum padded width of the `file` field
    pub fn file_width(mut self, width: usize) -> Self {
        self.config.file_width = width;
        self
    }

    /// Set the fetch backend priority list
    pub fn fetch_priority<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.config.fetch_priority = names.into_iter().map(Into::into).collect();
        self
    }

    /// Set the web viewer listen address
    pub fn listen_addr(mut self, addr: impl Into<String>) -> Self {
        self.config.listen_addr = addr.into();
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}

/// Options for the `sync` command
#[derive(Debug, Clone)]
pub struct SyncOptions {
    /// Directories to scan
    pub paths: Vec<PathBuf>,

    /// File extensions considered for sync (without the dot)
    pub extensions: Vec<String>,

    /// Append new entries to the bibliography instead of printing them
    pub append: bool,

    /// Bibliography files whose entries also count as cataloged
    pub excludes: Vec<PathBuf>,

    /// Compute checksums and detect duplicate files
    pub checksum: bool,

    /// Prompt for corrections of every new entry
    pub interactive: bool,

    /// Fetch metadata remotely for new entries
    pub remote: bool,

    /// Rename files after corrections (interactive only)
    pub rename: bool,

    /// Verify checksums of already cataloged files
    pub verify: bool,
}

impl Default for SyncOptions {
    fn default() -> Self {
        Self {
            paths: Vec::new(),
            extensions: vec!["pdf".to_string()],
            append: false,
            excludes: Vec::new(),
            checksum: true,
            interactive: false,
            remote: false,
            rename: false,
            verify: false,
        }
    }
}

/// Options for the `query` command
#[derive(Debug, Clone)]
pub struct QueryOptions {
    /// Index to query
    pub index: IndexKind,

    /// OR-combined query arguments; each may hold `,`-separated AND terms.
    /// A single `-` reads clauses from stdin.
    pub values: Vec<String>,

    /// Copy the referenced files into this directory instead of printing
    pub copy: Option<PathBuf>,

    /// Give copied files a descriptive name
    pub rename: bool,
}

impl Default for QueryOptions {
    fn default() -> Self {
        Self {
            index: IndexKind::Key,
            values: Vec::new(),
            copy: None,
            rename: false,
        }
    }
}

/// Everything a command needs, resolved once at startup.
pub struct Context {
    pub config: Config,
    pub format: Arc<dyn BibFormat>,
    pub fetch: FetchFrontend,
}

impl Context {
    /// Resolve the configured format and fetch backends.
    ///
    /// Unknown names fail here, before any file is touched.
    pub fn new(config: Config) -> Result<Self> {
        let format = resolve_format(&config.format, config.file_width)?;
        let fetch = FetchFrontend::from_names(&config.fetch_priority)?;
        Ok(Self {
            config,
            format,
            fetch,
        })
    }
}

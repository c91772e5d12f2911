//! # bibman
//!
//! A personal bibliography manager built around an index-and-partial-parse
//! engine over a BibTeX-like file:
//! - One-pass scan builds byte-offset indices (key, keywords, file, checksum)
//! - Entries are read and parsed on demand, never all at once
//! - New entries are appended; file paths are patched in place
//! - Set queries over the key and keywords indices
//! - Sync of on-disk documents against the catalog
//! - Read-only web viewer
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    bibman binary (clap)                     │
//! │                  sync  │  query  │  serve                   │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │  Context (config, format, fetch)
//!          ┌────────────┼─────────────────────┐
//!          ▼            ▼                     ▼
//!   ┌─────────────┐ ┌─────────────┐    ┌─────────────┐
//!   │    Sync     │ │    Query    │    │     Web     │
//!   │ walk/fetch  │ │  AND / OR   │    │   (axum)    │
//!   └──────┬──────┘ └──────┬──────┘    └──────┬──────┘
//!          └───────────────┼──────────────────┘
//!                          ▼
//!                   ┌─────────────┐      ┌─────────────┐
//!                   │  BibStore   │─────▶│   Format    │
//!                   │   + Index   │      │  (BibTeX)   │
//!                   └──────┬──────┘      └─────────────┘
//!                          ▼
//!                   bibliography file
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod config;

pub mod format;
pub mod store;
pub mod query;
pub mod sync;
pub mod fetch;
pub mod util;
pub mod web;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use error::{BibError, Result};
pub use config::{Config, Context, QueryOptions, SyncOptions};
pub use format::{BibFormat, Entry};
pub use store::BibStore;

// =============================================================================
// Version Info
// =============================================================================

/// Current version of bibman
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

//! Sync Module
//!
//! Reconciles directories of documents against the bibliography.
//!
//! ## Flow
//! ```text
//!  walk paths ──► cataloged? ──yes──► (verify checksum)
//!                    │no
//!                    ▼
//!           fabricate entry ──► checksum known? ──yes──► fix stale path / warn
//!                    │no
//!                    ▼
//!      remote fetch ─► corrections ─► rename ─► unique key ─► append / print
//! ```
//!
//! The main bibliography and every exclude bibliography count as the
//! catalog; only the main one is ever written.

mod command;
mod prompt;
mod walk;

pub use command::{run_sync, SyncCommand, SyncReport};
pub use prompt::interactive_corrections;
pub use walk::walk_paths;

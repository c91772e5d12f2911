//! Query Module
//!
//! OR-of-ANDs lookups over one index, and the `query` command built on them.
//!
//! ## Query Shape
//! ```text
//!   ["ml,nlp", "vision"]
//!      │         │
//!      ▼         ▼
//!   (ml ∧ nlp) ∨ (vision)
//! ```
//! Each argument is one OR clause; `,` separates the AND terms inside it.
//! A missing term matches nothing, so an AND clause containing one is empty.

mod command;
mod engine;

pub use command::run_query;
pub use engine::{evaluate, parse_clauses, read_clauses, AND_SEPARATOR};

//! Web Module
//!
//! Read-only HTML viewer over the key and keyword indices.
//!
//! ## Routes
//! - `/key/:key`            - one entry (404 if absent or not unique)
//! - `/keywords/:keywords`  - `~` separates OR clauses, `,` AND terms
//! - `/file/:key/:dlname`   - the document an entry references
//!
//! The store sits behind one mutex: every request seeks the same file
//! handle, so requests are served one record read at a time.

mod render;
mod routes;
mod server;

pub use render::{escape_html, render_page, render_record};
pub use routes::{web_routes, WebState};
pub use server::{serve, WebServer};

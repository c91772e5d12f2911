//! HTTP Server
//!
//! Binds the listen address and serves the viewer routes.

use std::sync::Arc;

use axum::Router;
use tokio::net::TcpListener;

use crate::config::Context;
use crate::error::{BibError, Result};
use crate::store::{BibStore, IndexKind, OpenMode};

use super::routes::{web_routes, WebState};

/// Read-only bibliography viewer
pub struct WebServer {
    listen_addr: String,
    router: Router,
}

impl WebServer {
    /// Open the configured bibliography and index it for the viewer
    pub fn new(ctx: &Context) -> Result<Self> {
        let mut store = BibStore::open_with_format(
            &ctx.config.bibfile,
            OpenMode::ReadOnly,
            Arc::clone(&ctx.format),
        )?;
        store.build_index(&[IndexKind::Key, IndexKind::Keywords])?;
        Ok(Self::from_store(store, ctx.config.listen_addr.clone()))
    }

    /// Serve an already indexed store
    pub fn from_store(store: BibStore, listen_addr: impl Into<String>) -> Self {
        let state = Arc::new(WebState::new(store));
        Self {
            listen_addr: listen_addr.into(),
            router: web_routes(state),
        }
    }

    pub fn listen_addr(&self) -> &str {
        &self.listen_addr
    }

    /// Get the router (for testing)
    pub fn router(self) -> Router {
        self.router
    }

    /// Start the HTTP server (async, runs until the process exits)
    pub async fn start(self) -> Result<()> {
        let listener = TcpListener::bind(&self.listen_addr)
            .await
            .map_err(|e| BibError::Http(format!("Cannot listen on {}: {}", self.listen_addr, e)))?;

        tracing::info!("Serving bibliography on http://{}", self.listen_addr);

        axum::serve(listener, self.router)
            .await
            .map_err(|e| BibError::Http(e.to_string()))
    }
}

/// Run the viewer on a fresh Tokio runtime (blocking)
pub fn serve(ctx: &Context) -> Result<()> {
    let server = WebServer::new(ctx)?;
    let runtime = tokio::runtime::Runtime::new()?;
    runtime.block_on(server.start())
}

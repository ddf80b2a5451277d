//! HTTP API Server
//!
//! Starts and manages the axum-based HTTP server.

use std::net::SocketAddr;
use std::sync::Arc;

use async_trait::async_trait;
use axum::Router;
use tower_http::cors::CorsLayer;
use tracing::info;

use lx_core::{Config, FieldSchema, RecordStore};
use lx_extract::RunReport;

use crate::routes::routes;

/// Runs one extraction pass on demand
///
/// The gateway binary wires this to the real mailbox and oracle; tests plug
/// in stubs. Implementations serialize runs — one pass at a time.
#[async_trait]
pub trait PipelineRunner: Send + Sync {
    async fn run_once(&self, schema: FieldSchema) -> RunReport;
}

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub store: Arc<RecordStore>,
    pub runner: Arc<dyn PipelineRunner>,
}

/// Start the HTTP API server
pub async fn start_server(
    port: u16,
    config: Config,
    store: Arc<RecordStore>,
    runner: Arc<dyn PipelineRunner>,
) -> anyhow::Result<()> {
    let state = AppState {
        config,
        store,
        runner,
    };

    let app = Router::new()
        .merge(routes())
        .layer(CorsLayer::permissive())
        .with_state(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    info!("HTTP API listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

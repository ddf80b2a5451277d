//! lx-api: HTTP API for lx-gateway
//!
//! REST endpoints for triggering extraction runs, replacing the active
//! field schema, and downloading results. Built with axum for async HTTP
//! handling.

pub mod error;
pub mod handlers;
pub mod middleware;
pub mod routes;
pub mod server;

pub use error::{ApiError, Result};
pub use server::{start_server, AppState, PipelineRunner};

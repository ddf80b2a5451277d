//! Text extraction oracle
//!
//! This module provides the client for the external generative-language
//! service used as the extraction oracle.

pub mod client;
pub mod types;

pub use client::OracleClient;
pub use types::{GenerationConfig, TextExtractionOracle};

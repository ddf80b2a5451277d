//! lx-extract: Field extraction pipeline for lx-gateway
//!
//! Turns candidate messages into structured shipment records: builds the
//! oracle prompt from the active field schema, decodes the semi-structured
//! response at an untrusted boundary, suppresses content-free records, and
//! orchestrates the single-pass run from mailbox to result store.

pub mod client;
pub mod decode;
pub mod export;
pub mod pipeline;
pub mod prompt;

pub use client::ExtractionClient;
pub use decode::{decode_oracle_response, strip_code_fences, OracleDecode};
pub use export::{to_csv, to_json, visible_records};
pub use pipeline::{ExtractionPipeline, RunErrorKind, RunReport, RunState};
pub use prompt::build_extraction_prompt;

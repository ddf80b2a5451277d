//! lx-core: Logistics Extraction Gateway Core Library
//!
//! 設定管理、エラー型、抽出レコードモデル、結果ストア、
//! および抽出オラクル（生成 AI）クライアントのコア機能を提供します。

pub mod config;
pub mod error;
pub mod oracle;
pub mod record;
pub mod schema;
pub mod store;

pub use config::{ApiConfig, Config, FieldsConfig, MailboxConfig, OracleConfig, OracleProvider, StoreConfig};
pub use error::{Error, Result};
pub use oracle::{GenerationConfig, OracleClient, TextExtractionOracle};
pub use record::{ExtractedField, ExtractionRecord, ResultSet, NOT_AVAILABLE};
pub use schema::FieldSchema;
pub use store::RecordStore;

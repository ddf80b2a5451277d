//! Extraction client
//!
//! Sends one message body plus the active field schema to the oracle and
//! normalizes the response into record contents — or nothing, when the
//! message held no usable data.

use std::collections::BTreeMap;

use tracing::debug;

use lx_core::oracle::{GenerationConfig, TextExtractionOracle};
use lx_core::{ExtractedField, FieldSchema, Result};

use crate::decode::{decode_oracle_response, OracleDecode};
use crate::prompt::build_extraction_prompt;

/// Oracle-backed field extractor
pub struct ExtractionClient<O> {
    oracle: O,
    generation: GenerationConfig,
}

impl<O: TextExtractionOracle> ExtractionClient<O> {
    pub fn new(oracle: O) -> Self {
        Self {
            oracle,
            generation: GenerationConfig::extraction(),
        }
    }

    /// Extract the schema fields from one message body
    ///
    /// `None` means the response held no usable data: every field `N/A`, or
    /// not JSON at all. Oracle transport failures bubble up so the caller
    /// can skip the message and keep the batch going.
    pub async fn extract(
        &self,
        body: &str,
        schema: &FieldSchema,
    ) -> Result<Option<BTreeMap<String, ExtractedField>>> {
        let prompt = build_extraction_prompt(body, schema);
        debug!(prompt_len = prompt.len(), "calling extraction oracle");

        let response = self.oracle.generate(&prompt, &self.generation).await?;

        match decode_oracle_response(&response, schema) {
            OracleDecode::Record(fields) => Ok(Some(fields)),
            OracleDecode::AllNa | OracleDecode::Invalid => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use lx_core::Error;

    struct CannedOracle {
        response: std::result::Result<&'static str, &'static str>,
    }

    #[async_trait]
    impl TextExtractionOracle for CannedOracle {
        async fn generate(&self, _prompt: &str, config: &GenerationConfig) -> Result<String> {
            // the extraction task always runs with deterministic settings
            assert_eq!(config.temperature, 0.2);
            match self.response {
                Ok(text) => Ok(text.to_string()),
                Err(message) => Err(Error::OracleApi(message.to_string())),
            }
        }
    }

    fn schema() -> FieldSchema {
        FieldSchema::new(vec!["shipment_id".to_string(), "origin".to_string()]).unwrap()
    }

    #[tokio::test]
    async fn test_extract_returns_complete_record() {
        let client = ExtractionClient::new(CannedOracle {
            response: Ok(r#"{"shipment_id":{"value":"SH-9","context":"load SH-9 confirmed"}}"#),
        });

        let fields = client.extract("body", &schema()).await.unwrap().unwrap();
        assert_eq!(fields.len(), 2);
        assert_eq!(fields["shipment_id"].value, "SH-9");
        assert!(fields["origin"].is_na());
    }

    #[tokio::test]
    async fn test_all_na_response_yields_none() {
        let client = ExtractionClient::new(CannedOracle {
            response: Ok(r#"{"shipment_id":{"value":"N/A","context":""}}"#),
        });
        assert!(client.extract("body", &schema()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_malformed_response_yields_none() {
        let client = ExtractionClient::new(CannedOracle {
            response: Ok("I could not find any shipment data, sorry!"),
        });
        assert!(client.extract("body", &schema()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_transport_failure_bubbles_up() {
        let client = ExtractionClient::new(CannedOracle {
            response: Err("503 upstream unavailable"),
        });
        assert!(client.extract("body", &schema()).await.is_err());
    }
}

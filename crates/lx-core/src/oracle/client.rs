//! Oracle API HTTP client
//!
//! Supports the Google Generative Language API and OpenAI-compatible APIs.

use async_trait::async_trait;
use reqwest::Client;
use tracing::{debug, info, warn};

use crate::config::{OracleConfig, OracleProvider};
use crate::error::{Error, Result};

use super::types::*;

/// Oracle API client (supports Gemini and OpenAI-compatible APIs)
#[derive(Clone)]
pub struct OracleClient {
    client: Client,
    api_key: String,
    model: String,
    base_url: String,
    provider: OracleProvider,
}

impl OracleClient {
    /// Create a new oracle client
    pub fn new(config: &OracleConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(Error::Http)?;

        // Determine base URL based on provider
        let base_url = match &config.base_url {
            Some(url) => url.clone(),
            None => match config.provider {
                OracleProvider::Gemini => {
                    "https://generativelanguage.googleapis.com/v1beta".to_string()
                }
                OracleProvider::OpenAi => "https://api.openai.com/v1".to_string(),
            },
        };

        Ok(Self {
            client,
            api_key: config.api_key.clone(),
            model: config.model.clone(),
            base_url,
            provider: config.provider.clone(),
        })
    }

    /// Create with custom base URL (for testing or custom endpoints)
    pub fn with_base_url(config: &OracleConfig, base_url: String) -> Result<Self> {
        let mut client = Self::new(config)?;
        client.base_url = base_url;
        Ok(client)
    }

    /// Get the model name
    pub fn model(&self) -> &str {
        &self.model
    }

    /// Get the provider type
    pub fn provider(&self) -> &OracleProvider {
        &self.provider
    }

    /// Send request to the Gemini generateContent endpoint
    async fn send_gemini_request(
        &self,
        prompt: &str,
        config: &GenerationConfig,
    ) -> Result<String> {
        let url = format!("{}/models/{}:generateContent", self.base_url, self.model);

        debug!("Sending request to Gemini API: {}", url);

        let request = GeminiRequest::single_shot(prompt, config);

        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .header("content-type", "application/json")
            .json(&request)
            .send()
            .await
            .map_err(Error::Http)?;

        let status = response.status();
        let body = response.text().await.map_err(Error::Http)?;

        if !status.is_success() {
            warn!("Gemini API error: {} - {}", status, body);
            return Err(Error::OracleApi(format!("{status}: {body}")));
        }

        let parsed: GeminiResponse = serde_json::from_str(&body)
            .map_err(|e| Error::OracleApi(format!("Failed to parse response: {e} - {body}")))?;

        let text = parsed
            .text()
            .ok_or_else(|| Error::OracleApi("No response from oracle".to_string()))?;

        info!("Gemini API response: {} chars", text.len());
        Ok(text)
    }

    /// Send request to an OpenAI-compatible API
    async fn send_openai_request(
        &self,
        prompt: &str,
        config: &GenerationConfig,
    ) -> Result<String> {
        let url = format!("{}/chat/completions", self.base_url);

        debug!("Sending request to OpenAI-compatible API: {}", url);

        let request = ChatCompletionRequest::single_shot(&self.model, prompt, config);

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("content-type", "application/json")
            .json(&request)
            .send()
            .await
            .map_err(Error::Http)?;

        let status = response.status();
        let body = response.text().await.map_err(Error::Http)?;

        if !status.is_success() {
            warn!("OpenAI API error: {} - {}", status, body);
            return Err(Error::OracleApi(format!("{status}: {body}")));
        }

        let parsed: ChatCompletionResponse = serde_json::from_str(&body)
            .map_err(|e| Error::OracleApi(format!("Failed to parse response: {e} - {body}")))?;

        let text = parsed
            .text()
            .ok_or_else(|| Error::OracleApi("No response from oracle".to_string()))?;

        info!("OpenAI API response: {} chars", text.len());
        Ok(text)
    }
}

#[async_trait]
impl TextExtractionOracle for OracleClient {
    async fn generate(&self, prompt: &str, config: &GenerationConfig) -> Result<String> {
        match self.provider {
            OracleProvider::Gemini => self.send_gemini_request(prompt, config).await,
            OracleProvider::OpenAi => self.send_openai_request(prompt, config).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_base_url_per_provider() {
        let gemini = OracleClient::new(&OracleConfig {
            api_key: "k".to_string(),
            ..OracleConfig::default()
        })
        .unwrap();
        assert!(gemini.base_url.contains("generativelanguage.googleapis.com"));

        let openai = OracleClient::new(&OracleConfig {
            api_key: "k".to_string(),
            provider: OracleProvider::OpenAi,
            ..OracleConfig::default()
        })
        .unwrap();
        assert!(openai.base_url.contains("api.openai.com"));
    }

    #[test]
    fn test_base_url_override() {
        let client = OracleClient::with_base_url(
            &OracleConfig {
                api_key: "k".to_string(),
                ..OracleConfig::default()
            },
            "http://localhost:9999".to_string(),
        )
        .unwrap();
        assert_eq!(client.base_url, "http://localhost:9999");
    }
}

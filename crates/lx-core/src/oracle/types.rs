//! Oracle API types

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Generation settings for one oracle call
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationConfig {
    pub temperature: f32,
    pub top_p: f32,
    /// Ask the backend for a bare JSON object response
    pub json_response: bool,
}

impl GenerationConfig {
    /// Low-temperature settings for factual extraction
    pub fn extraction() -> Self {
        Self {
            temperature: 0.2,
            top_p: 0.8,
            json_response: true,
        }
    }
}

/// External generative text service performing extraction
///
/// A single-shot text completion; the response is expected to be a JSON
/// object as text, optionally fenced. Parsing is the caller's problem.
#[async_trait]
pub trait TextExtractionOracle: Send + Sync {
    async fn generate(&self, prompt: &str, config: &GenerationConfig) -> Result<String>;
}

// ============================================================================
// Gemini API types
// ============================================================================

#[derive(Debug, Serialize)]
pub struct GeminiRequest {
    pub contents: Vec<GeminiContent>,
    #[serde(rename = "generationConfig")]
    pub generation_config: GeminiGenerationConfig,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct GeminiContent {
    pub parts: Vec<GeminiPart>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct GeminiPart {
    pub text: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GeminiGenerationConfig {
    pub temperature: f32,
    pub top_p: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_mime_type: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct GeminiResponse {
    #[serde(default)]
    pub candidates: Vec<GeminiCandidate>,
}

#[derive(Debug, Deserialize)]
pub struct GeminiCandidate {
    pub content: GeminiContent,
}

impl GeminiRequest {
    /// Build a single-shot request from a prompt and generation settings
    pub fn single_shot(prompt: &str, config: &GenerationConfig) -> Self {
        Self {
            contents: vec![GeminiContent {
                parts: vec![GeminiPart {
                    text: prompt.to_string(),
                }],
            }],
            generation_config: GeminiGenerationConfig {
                temperature: config.temperature,
                top_p: config.top_p,
                response_mime_type: config
                    .json_response
                    .then(|| "application/json".to_string()),
            },
        }
    }
}

impl GeminiResponse {
    /// Concatenated text of the first candidate
    pub fn text(&self) -> Option<String> {
        let candidate = self.candidates.first()?;
        let text = candidate
            .content
            .parts
            .iter()
            .map(|p| p.text.as_str())
            .collect::<Vec<_>>()
            .join("");
        if text.is_empty() { None } else { Some(text) }
    }
}

// ============================================================================
// OpenAI-compatible API types
// ============================================================================

#[derive(Debug, Serialize)]
pub struct ChatCompletionRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub temperature: f32,
    pub top_p: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_format: Option<ResponseFormat>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

#[derive(Debug, Serialize)]
pub struct ResponseFormat {
    #[serde(rename = "type")]
    pub format_type: String,
}

#[derive(Debug, Deserialize)]
pub struct ChatCompletionResponse {
    #[serde(default)]
    pub choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
pub struct ChatChoice {
    pub message: ChatMessage,
}

impl ChatCompletionRequest {
    /// Build a single-shot request from a prompt and generation settings
    pub fn single_shot(model: &str, prompt: &str, config: &GenerationConfig) -> Self {
        Self {
            model: model.to_string(),
            messages: vec![ChatMessage {
                role: "user".to_string(),
                content: prompt.to_string(),
            }],
            temperature: config.temperature,
            top_p: config.top_p,
            response_format: config.json_response.then(|| ResponseFormat {
                format_type: "json_object".to_string(),
            }),
        }
    }
}

impl ChatCompletionResponse {
    /// Text of the first choice
    pub fn text(&self) -> Option<String> {
        let text = self.choices.first()?.message.content.clone();
        if text.is_empty() { None } else { Some(text) }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extraction_settings() {
        let config = GenerationConfig::extraction();
        assert_eq!(config.temperature, 0.2);
        assert_eq!(config.top_p, 0.8);
        assert!(config.json_response);
    }

    #[test]
    fn test_gemini_request_shape() {
        let request = GeminiRequest::single_shot("extract this", &GenerationConfig::extraction());
        let json = serde_json::to_value(&request).unwrap();

        assert_eq!(json["contents"][0]["parts"][0]["text"], "extract this");
        assert_eq!(json["generationConfig"]["topP"], 0.8);
        assert_eq!(
            json["generationConfig"]["responseMimeType"],
            "application/json"
        );
    }

    #[test]
    fn test_gemini_response_text() {
        let response: GeminiResponse = serde_json::from_str(
            r#"{"candidates":[{"content":{"parts":[{"text":"{\"a\""},{"text":": 1}"}]}}]}"#,
        )
        .unwrap();
        assert_eq!(response.text().unwrap(), "{\"a\": 1}");

        let empty: GeminiResponse = serde_json::from_str(r#"{"candidates":[]}"#).unwrap();
        assert!(empty.text().is_none());
    }

    #[test]
    fn test_chat_completion_request_shape() {
        let request =
            ChatCompletionRequest::single_shot("gpt-x", "hello", &GenerationConfig::extraction());
        let json = serde_json::to_value(&request).unwrap();

        assert_eq!(json["model"], "gpt-x");
        assert_eq!(json["messages"][0]["role"], "user");
        assert_eq!(json["response_format"]["type"], "json_object");
    }
}

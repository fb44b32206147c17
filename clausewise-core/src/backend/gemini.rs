//! Google Gemini generation backend.
//!
//! Sends a single-turn `generateContent` request. Auth uses the
//! `x-goog-api-key` header so the key never appears in logged URLs.

use super::GenerationBackend;
use crate::config::LlmConfig;
use crate::error::GenerationError;
use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use tracing::debug;

/// The default Google Generative Language API base URL.
const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Google Gemini backend.
pub struct GeminiBackend {
    client: Client,
    base_url: String,
    api_key: String,
    model: String,
    max_output_tokens: Option<usize>,
    temperature: Option<f32>,
}

impl GeminiBackend {
    /// Create a new Gemini backend with an explicitly provided API key.
    pub fn new_with_key(config: &LlmConfig, api_key: String) -> Result<Self, GenerationError> {
        let base_url = config
            .base_url
            .clone()
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string())
            .trim_end_matches('/')
            .to_string();

        let client = Client::builder()
            .build()
            .map_err(|e| GenerationError::Connection {
                message: format!("Failed to build HTTP client: {}", e),
            })?;

        let model = config
            .model
            .strip_prefix("models/")
            .unwrap_or(&config.model)
            .to_string();

        Ok(Self {
            client,
            base_url,
            api_key,
            model,
            max_output_tokens: config.max_output_tokens,
            temperature: config.temperature,
        })
    }

    /// The model this backend targets.
    pub fn model(&self) -> &str {
        &self.model
    }

    /// Build the JSON request body: one user turn holding the whole prompt.
    fn build_request_body(&self, prompt: &str) -> Value {
        let mut body = serde_json::json!({
            "contents": [{
                "role": "user",
                "parts": [{ "text": prompt }],
            }],
        });

        let mut generation_config = serde_json::Map::new();
        if let Some(max) = self.max_output_tokens {
            generation_config.insert("maxOutputTokens".into(), max.into());
        }
        if let Some(t) = self.temperature {
            generation_config.insert("temperature".into(), t.into());
        }
        if !generation_config.is_empty() {
            body["generationConfig"] = Value::Object(generation_config);
        }
        body
    }

    fn endpoint_url(&self) -> String {
        format!("{}/models/{}:generateContent", self.base_url, self.model)
    }

    /// Extract the generated text from a `generateContent` response.
    ///
    /// Text parts of the first candidate are concatenated in order.
    fn parse_response(body: &Value) -> Result<String, GenerationError> {
        if let Some(reason) = body["promptFeedback"]["blockReason"].as_str() {
            return Err(GenerationError::ResponseParse {
                message: format!("Prompt blocked by Gemini: {}", reason),
            });
        }

        let candidates = body["candidates"]
            .as_array()
            .ok_or_else(|| GenerationError::ResponseParse {
                message: "Missing 'candidates' array in response".to_string(),
            })?;

        let candidate = candidates
            .first()
            .ok_or_else(|| GenerationError::ResponseParse {
                message: "Empty 'candidates' array in response".to_string(),
            })?;

        let parts = candidate["content"]["parts"].as_array().ok_or_else(|| {
            GenerationError::ResponseParse {
                message: format!(
                    "Missing 'parts' array in candidate content (finishReason: {})",
                    candidate["finishReason"].as_str().unwrap_or("unknown")
                ),
            }
        })?;

        Ok(parts
            .iter()
            .filter_map(|p| p["text"].as_str())
            .collect::<String>())
    }

    fn map_http_error(status: reqwest::StatusCode, body_text: &str) -> GenerationError {
        match status.as_u16() {
            401 | 403 => GenerationError::AuthFailed {
                provider: "Gemini".to_string(),
            },
            429 => GenerationError::RateLimited {
                provider: "Gemini".to_string(),
            },
            _ => GenerationError::ApiRequest {
                message: format!("HTTP {} from Gemini API: {}", status, body_text),
            },
        }
    }
}

#[async_trait]
impl GenerationBackend for GeminiBackend {
    async fn generate(&self, prompt: &str) -> Result<String, GenerationError> {
        let body = self.build_request_body(prompt);
        let url = self.endpoint_url();

        debug!(
            model = self.model.as_str(),
            url = url.as_str(),
            prompt_chars = prompt.len(),
            "Sending Gemini generateContent request"
        );

        let response = self
            .client
            .post(&url)
            .header("content-type", "application/json")
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_connect() {
                    GenerationError::Connection {
                        message: format!("Could not reach Gemini API: {}", e),
                    }
                } else {
                    GenerationError::ApiRequest {
                        message: format!("Request to Gemini API failed: {}", e),
                    }
                }
            })?;

        let status = response.status();
        let body_text = response
            .text()
            .await
            .map_err(|e| GenerationError::ResponseParse {
                message: format!("Failed to read response body: {}", e),
            })?;

        if !status.is_success() {
            return Err(Self::map_http_error(status, &body_text));
        }

        let response_json: Value =
            serde_json::from_str(&body_text).map_err(|e| GenerationError::ResponseParse {
                message: format!("Invalid JSON in response: {}", e),
            })?;

        Self::parse_response(&response_json)
    }

    fn name(&self) -> &str {
        "gemini"
    }
}

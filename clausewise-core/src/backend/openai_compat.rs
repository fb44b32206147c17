//! OpenAI-compatible generation backend.
//!
//! Works with any provider exposing `POST {base_url}/chat/completions`:
//! OpenAI, Azure OpenAI, Ollama, vLLM, LM Studio.

use super::GenerationBackend;
use crate::config::LlmConfig;
use crate::error::GenerationError;
use async_trait::async_trait;
use reqwest::Client;
use serde_json::{Value, json};
use tracing::debug;

const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

/// Backend for OpenAI-compatible chat completion APIs.
pub struct OpenAiCompatBackend {
    client: Client,
    base_url: String,
    api_key: String,
    model: String,
    provider: String,
    max_tokens: Option<usize>,
    temperature: Option<f32>,
}

impl OpenAiCompatBackend {
    pub fn new_with_key(config: &LlmConfig, api_key: String) -> Result<Self, GenerationError> {
        let base_url = config
            .base_url
            .as_deref()
            .unwrap_or(DEFAULT_BASE_URL)
            .trim_end_matches('/')
            .to_string();
        let client = Client::builder()
            .build()
            .map_err(|e| GenerationError::Connection {
                message: format!("Failed to build HTTP client: {}", e),
            })?;

        Ok(Self {
            client,
            base_url,
            api_key,
            model: config.model.clone(),
            provider: config.provider.clone(),
            max_tokens: config.max_output_tokens,
            temperature: config.temperature,
        })
    }

    fn build_request_body(&self, prompt: &str) -> Value {
        let mut body = json!({
            "model": self.model,
            "messages": [{ "role": "user", "content": prompt }],
            "stream": false,
        });
        if let Some(max_tokens) = self.max_tokens {
            body["max_tokens"] = json!(max_tokens);
        }
        if let Some(t) = self.temperature {
            body["temperature"] = json!(t);
        }
        body
    }

    fn parse_response(body: &Value) -> Result<String, GenerationError> {
        let choice = body
            .get("choices")
            .and_then(|c| c.get(0))
            .ok_or_else(|| GenerationError::ResponseParse {
                message: "No choices in response".to_string(),
            })?;

        let message = choice
            .get("message")
            .ok_or_else(|| GenerationError::ResponseParse {
                message: "No message in choice".to_string(),
            })?;

        message
            .get("content")
            .and_then(|c| c.as_str())
            .map(str::to_string)
            .ok_or_else(|| GenerationError::ResponseParse {
                message: "No text content in message".to_string(),
            })
    }

    fn map_http_error(status: reqwest::StatusCode, body: &str) -> GenerationError {
        match status.as_u16() {
            401 | 403 => {
                debug!(body = %body, "Authentication failed");
                GenerationError::AuthFailed {
                    provider: "OpenAI-compatible".to_string(),
                }
            }
            429 => GenerationError::RateLimited {
                provider: "OpenAI-compatible".to_string(),
            },
            _ => GenerationError::ApiRequest {
                message: format!("HTTP {}: {}", status, body),
            },
        }
    }
}

#[async_trait]
impl GenerationBackend for OpenAiCompatBackend {
    async fn generate(&self, prompt: &str) -> Result<String, GenerationError> {
        let url = format!("{}/chat/completions", self.base_url);
        let body = self.build_request_body(prompt);

        debug!(url = %url, model = %self.model, "Sending chat completion request");

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_connect() {
                    GenerationError::Connection {
                        message: format!("Could not reach {}: {}", self.base_url, e),
                    }
                } else {
                    GenerationError::ApiRequest {
                        message: format!("Request failed: {}", e),
                    }
                }
            })?;

        let status = response.status();
        let response_body = response
            .text()
            .await
            .map_err(|e| GenerationError::ApiRequest {
                message: format!("Failed to read response body: {}", e),
            })?;

        if !status.is_success() {
            return Err(Self::map_http_error(status, &response_body));
        }

        let json: Value =
            serde_json::from_str(&response_body).map_err(|e| GenerationError::ResponseParse {
                message: format!("Invalid JSON: {}", e),
            })?;

        Self::parse_response(&json)
    }

    fn name(&self) -> &str {
        &self.provider
    }
}

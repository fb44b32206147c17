//! Generation backends.
//!
//! Provides concrete implementations of the [`GenerationBackend`] trait for:
//! - Google Gemini (`generateContent`)
//! - OpenAI-compatible chat completion APIs (OpenAI, Azure, Ollama, vLLM)
//! - An in-process mock for tests and dry runs
//!
//! Use [`create_backend()`] to instantiate the appropriate backend from config.

pub mod gemini;
pub mod mock;
pub mod openai_compat;

use crate::config::LlmConfig;
use crate::error::GenerationError;
use async_trait::async_trait;
use std::sync::Arc;

pub use gemini::GeminiBackend;
pub use mock::MockBackend;
pub use openai_compat::OpenAiCompatBackend;

/// A text-generation service: one prompt in, one opaque text out.
///
/// Implementations make exactly one attempt per call. Retries, streaming and
/// timeouts are left to the caller.
#[async_trait]
pub trait GenerationBackend: Send + Sync {
    /// Submit a fully assembled prompt and return the generated text.
    async fn generate(&self, prompt: &str) -> Result<String, GenerationError>;

    /// Short name used in logs.
    fn name(&self) -> &str;
}

/// Resolve the API credential for a backend.
///
/// An explicit `api_key` in the config wins; otherwise the environment
/// variable named by `api_key_env` is read. Gemini additionally falls back to
/// `GOOGLE_API_KEY`.
pub fn resolve_api_key(config: &LlmConfig) -> Result<String, GenerationError> {
    if let Some(key) = config.api_key.as_ref().filter(|k| !k.is_empty()) {
        return Ok(key.clone());
    }
    if let Ok(key) = std::env::var(&config.api_key_env)
        && !key.is_empty()
    {
        return Ok(key);
    }
    if config.provider == "gemini"
        && let Ok(key) = std::env::var("GOOGLE_API_KEY")
        && !key.is_empty()
    {
        return Ok(key);
    }
    Err(GenerationError::AuthFailed {
        provider: format!("{} (env var '{}' not set)", config.provider, config.api_key_env),
    })
}

/// Create a backend from configuration, resolving the API key as needed.
pub fn create_backend(config: &LlmConfig) -> Result<Arc<dyn GenerationBackend>, GenerationError> {
    if config.provider == "mock" {
        return Ok(Arc::new(MockBackend::new()));
    }
    let api_key = resolve_api_key(config)?;
    create_backend_with_key(config, api_key)
}

/// Create a backend with an API key resolved by the caller.
pub fn create_backend_with_key(
    config: &LlmConfig,
    api_key: String,
) -> Result<Arc<dyn GenerationBackend>, GenerationError> {
    match config.provider.as_str() {
        "gemini" => Ok(Arc::new(GeminiBackend::new_with_key(config, api_key)?)),
        "mock" => Ok(Arc::new(MockBackend::new())),
        _ => Ok(Arc::new(OpenAiCompatBackend::new_with_key(config, api_key)?)),
    }
}

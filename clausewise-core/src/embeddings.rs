//! Pluggable embedding providers for the document index.
//!
//! The embedding function used at query time must match the one the index
//! artifact was built with; [`crate::index::VectorIndex::open`] checks the
//! provider dimensions against the artifact header.
//!
//! Implementations: local hashed bag-of-words (always available), OpenAI API,
//! and Ollama API.

use crate::error::IndexError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Trait for embedding providers.
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Generate an embedding for a single text.
    async fn embed(&self, text: &str) -> Result<Vec<f32>, IndexError>;

    /// Generate embeddings for a batch of texts, in input order.
    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>, IndexError> {
        let mut embeddings = Vec::with_capacity(texts.len());
        for text in texts {
            embeddings.push(self.embed(text).await?);
        }
        Ok(embeddings)
    }

    /// Return the dimensionality of embeddings.
    fn dimensions(&self) -> usize;

    /// Return the provider name.
    fn provider_name(&self) -> &str;
}

/// Configuration for embedding providers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingConfig {
    /// Provider name: "local" (default), "openai", "ollama"
    #[serde(default = "default_provider")]
    pub provider: String,
    /// Provider-specific model name.
    #[serde(default)]
    pub model: Option<String>,
    /// Embedding dimensions (provider default if 0).
    #[serde(default)]
    pub dimensions: usize,
    /// Optional base URL override for remote providers.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    /// Environment variable holding the API key for remote providers.
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,
}

fn default_provider() -> String {
    "local".into()
}

fn default_api_key_env() -> String {
    "OPENAI_API_KEY".into()
}

const DEFAULT_LOCAL_DIMENSIONS: usize = 384;

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            model: None,
            dimensions: 0,
            base_url: None,
            api_key_env: default_api_key_env(),
        }
    }
}

/// Local hashed bag-of-words embedder (no external dependencies).
#[derive(Debug, Clone)]
pub struct LocalEmbedder {
    dimensions: usize,
}

impl LocalEmbedder {
    pub fn new(dimensions: usize) -> Self {
        Self {
            dimensions: dimensions.max(1),
        }
    }
}

/// djb2 string hash, stable across platforms and runs.
fn simple_hash(s: &str) -> usize {
    let mut hash: usize = 5381;
    for b in s.bytes() {
        hash = hash.wrapping_mul(33).wrapping_add(b as usize);
    }
    hash
}

#[async_trait]
impl Embedder for LocalEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, IndexError> {
        let mut vector = vec![0.0f32; self.dimensions];

        let lowered = text.to_lowercase();
        let words: Vec<&str> = lowered
            .split(|c: char| !c.is_alphanumeric())
            .filter(|w| !w.is_empty())
            .collect();

        if words.is_empty() {
            return Ok(vector);
        }

        let mut tf: HashMap<&str, usize> = HashMap::new();
        for word in &words {
            *tf.entry(word).or_insert(0) += 1;
        }

        for (term, count) in &tf {
            let idx = simple_hash(term) % self.dimensions;
            vector[idx] += *count as f32;
        }

        // L2 normalize
        let norm: f32 = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            for v in &mut vector {
                *v /= norm;
            }
        }

        Ok(vector)
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    fn provider_name(&self) -> &str {
        "local"
    }
}

fn parse_embedding(
    values: Option<&Vec<serde_json::Value>>,
    provider: &str,
) -> Result<Vec<f32>, IndexError> {
    values
        .map(|arr| {
            arr.iter()
                .filter_map(|v| v.as_f64().map(|f| f as f32))
                .collect()
        })
        .ok_or_else(|| IndexError::unavailable(format!("{} returned no embedding", provider)))
}

/// OpenAI API embedder (uses text-embedding-3-small by default).
pub struct OpenAiEmbedder {
    client: reqwest::Client,
    api_key: String,
    model: String,
    dims: usize,
    base_url: String,
}

impl OpenAiEmbedder {
    pub fn new(api_key: String, model: Option<String>, base_url: Option<String>) -> Self {
        let model = model.unwrap_or_else(|| "text-embedding-3-small".into());
        let dims = match model.as_str() {
            "text-embedding-3-large" => 3072,
            _ => 1536,
        };
        Self {
            client: reqwest::Client::new(),
            api_key,
            model,
            dims,
            base_url: base_url.unwrap_or_else(|| "https://api.openai.com".into()),
        }
    }

    async fn embed_api_call(&self, text: &str) -> Result<Vec<f32>, IndexError> {
        let url = format!("{}/v1/embeddings", self.base_url);
        let body = serde_json::json!({
            "model": self.model,
            "input": text,
        });

        let resp = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| IndexError::unavailable(format!("OpenAI embedding request failed: {}", e)))?;
        let status = resp.status();
        if !status.is_success() {
            return Err(IndexError::unavailable(format!(
                "OpenAI embedding request returned HTTP {}",
                status
            )));
        }
        let json: serde_json::Value = resp
            .json()
            .await
            .map_err(|e| IndexError::unavailable(format!("OpenAI embedding parse error: {}", e)))?;
        parse_embedding(json["data"][0]["embedding"].as_array(), "OpenAI")
    }
}

#[async_trait]
impl Embedder for OpenAiEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, IndexError> {
        self.embed_api_call(text).await
    }

    fn dimensions(&self) -> usize {
        self.dims
    }

    fn provider_name(&self) -> &str {
        "openai"
    }
}

/// Ollama embedder (uses local Ollama API).
pub struct OllamaEmbedder {
    client: reqwest::Client,
    model: String,
    dims: usize,
    base_url: String,
}

impl OllamaEmbedder {
    pub fn new(model: Option<String>, base_url: Option<String>) -> Self {
        let model = model.unwrap_or_else(|| "all-minilm".into());
        let dims = match model.as_str() {
            "nomic-embed-text" => 768,
            "mxbai-embed-large" => 1024,
            "all-minilm" => 384,
            _ => 768,
        };
        Self {
            client: reqwest::Client::new(),
            model,
            dims,
            base_url: base_url.unwrap_or_else(|| "http://localhost:11434".into()),
        }
    }

    async fn embed_api_call(&self, text: &str) -> Result<Vec<f32>, IndexError> {
        let url = format!("{}/api/embed", self.base_url);
        let body = serde_json::json!({
            "model": self.model,
            "input": text,
        });

        let resp = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| IndexError::unavailable(format!("Ollama embedding request failed: {}", e)))?;
        let status = resp.status();
        if !status.is_success() {
            return Err(IndexError::unavailable(format!(
                "Ollama embedding request returned HTTP {}",
                status
            )));
        }
        let json: serde_json::Value = resp
            .json()
            .await
            .map_err(|e| IndexError::unavailable(format!("Ollama embedding parse error: {}", e)))?;
        parse_embedding(json["embeddings"][0].as_array(), "Ollama")
    }
}

#[async_trait]
impl Embedder for OllamaEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, IndexError> {
        self.embed_api_call(text).await
    }

    fn dimensions(&self) -> usize {
        self.dims
    }

    fn provider_name(&self) -> &str {
        "ollama"
    }
}

/// Create an embedder based on configuration.
///
/// Unlike generation backends, a misconfigured embedder is reported as an
/// unavailable index: a query vector from a different embedding space would
/// silently return meaningless neighbours.
pub fn create_embedder(config: &EmbeddingConfig) -> Result<Box<dyn Embedder>, IndexError> {
    match config.provider.as_str() {
        "local" => {
            let dims = if config.dimensions > 0 {
                config.dimensions
            } else {
                DEFAULT_LOCAL_DIMENSIONS
            };
            Ok(Box::new(LocalEmbedder::new(dims)))
        }
        "openai" => {
            let api_key = std::env::var(&config.api_key_env).map_err(|_| {
                IndexError::unavailable(format!(
                    "OpenAI embeddings require env var '{}'",
                    config.api_key_env
                ))
            })?;
            Ok(Box::new(OpenAiEmbedder::new(
                api_key,
                config.model.clone(),
                config.base_url.clone(),
            )))
        }
        "ollama" => Ok(Box::new(OllamaEmbedder::new(
            config.model.clone(),
            config.base_url.clone(),
        ))),
        other => Err(IndexError::unavailable(format!(
            "unknown embedding provider '{}'",
            other
        ))),
    }
}

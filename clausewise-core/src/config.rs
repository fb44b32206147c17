//! Configuration system for Clausewise.
//!
//! Uses `figment` for layered configuration: defaults -> user config file ->
//! workspace config file -> environment -> explicit overrides. Configuration is
//! loaded from `~/.config/clausewise/config.toml` and/or
//! `.clausewise/config.toml` in the workspace directory.

use crate::embeddings::EmbeddingConfig;
use crate::error::ConfigError;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default number of passages retrieved per query.
pub const DEFAULT_TOP_K: usize = 5;

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ClausewiseConfig {
    pub llm: LlmConfig,
    pub embedding: EmbeddingConfig,
    pub retrieval: RetrievalConfig,
    pub data: DataConfig,
}

/// Generation backend configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    /// Provider name: "gemini", "openai" (any OpenAI-compatible API), "mock".
    pub provider: String,
    /// Model identifier (e.g., "gemini-2.0-flash", "gpt-4o-mini").
    pub model: String,
    /// Environment variable name containing the API key.
    pub api_key_env: String,
    /// Explicit API key. Never written back to disk.
    #[serde(skip_serializing)]
    pub api_key: Option<String>,
    /// Optional base URL override for the API endpoint.
    pub base_url: Option<String>,
    /// Upper bound on generated tokens; provider default when unset.
    pub max_output_tokens: Option<usize>,
    /// Sampling temperature; provider default when unset.
    pub temperature: Option<f32>,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: "gemini".to_string(),
            model: "gemini-2.0-flash".to_string(),
            api_key_env: "GEMINI_API_KEY".to_string(),
            api_key: None,
            base_url: None,
            max_output_tokens: None,
            temperature: None,
        }
    }
}

impl LlmConfig {
    /// Validate this LLM config and return any warnings.
    ///
    /// Returns an empty Vec if the config is valid. Problems are reported as
    /// human-readable warnings rather than errors.
    pub fn validate(&self) -> Vec<String> {
        let mut warnings = Vec::new();
        if let Some(t) = self.temperature
            && !(0.0..=2.0).contains(&t)
        {
            warnings.push(format!(
                "temperature ({}) is outside the typical range 0.0–2.0",
                t
            ));
        }
        if self.max_output_tokens == Some(0) {
            warnings.push("max_output_tokens is 0; every response will be empty".to_string());
        }
        if self.model.trim().is_empty() {
            warnings.push("model is empty".to_string());
        }
        warnings
    }
}

/// Retrieval settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrievalConfig {
    /// Passages retrieved per query when the caller does not specify `k`.
    pub top_k: usize,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            top_k: DEFAULT_TOP_K,
        }
    }
}

/// Locations of the static resources loaded at startup.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DataConfig {
    /// Rule source (JSON map of rule id to record).
    pub rules_path: PathBuf,
    /// Pre-built vector index artifact (file or directory).
    pub index_path: PathBuf,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            rules_path: PathBuf::from("data/compliance_rules.json"),
            index_path: PathBuf::from("models/vectorstore"),
        }
    }
}

impl DataConfig {
    /// Resolve relative paths against the workspace directory.
    pub fn resolve(&self, workspace: &Path) -> (PathBuf, PathBuf) {
        let abs = |p: &Path| {
            if p.is_absolute() {
                p.to_path_buf()
            } else {
                workspace.join(p)
            }
        };
        (abs(&self.rules_path), abs(&self.index_path))
    }

    /// Resolved rule source path, which must exist.
    pub fn rules_file(&self, workspace: &Path) -> Result<PathBuf, ConfigError> {
        let (rules, _) = self.resolve(workspace);
        if rules.is_file() {
            Ok(rules)
        } else {
            Err(ConfigError::FileNotFound { path: rules })
        }
    }
}

fn user_config_path() -> Option<PathBuf> {
    directories::ProjectDirs::from("dev", "clausewise", "clausewise")
        .map(|dirs| dirs.config_dir().join("config.toml"))
}

fn workspace_config_path(workspace: &Path) -> PathBuf {
    workspace.join(".clausewise").join("config.toml")
}

/// Load configuration with layered sources.
pub fn load_config(
    workspace: Option<&Path>,
    overrides: Option<&ClausewiseConfig>,
) -> Result<ClausewiseConfig, Box<figment::Error>> {
    let mut figment = Figment::from(Serialized::defaults(ClausewiseConfig::default()));

    // User-level config
    if let Some(user_config) = user_config_path()
        && user_config.exists()
    {
        figment = figment.merge(Toml::file(&user_config));
    }

    // Workspace-level config
    if let Some(ws) = workspace {
        let ws_config = workspace_config_path(ws);
        if ws_config.exists() {
            figment = figment.merge(Toml::file(&ws_config));
        }
    }

    // Environment variables (CLAUSEWISE_LLM__MODEL, CLAUSEWISE_RETRIEVAL__TOP_K, etc.)
    figment = figment.merge(Env::prefixed("CLAUSEWISE_").split("__"));

    if let Some(overrides) = overrides {
        figment = figment.merge(Serialized::defaults(overrides));
    }

    figment.extract().map_err(Box::new)
}

/// Check whether any configuration file exists (user-level or workspace-level).
pub fn config_exists(workspace: Option<&Path>) -> bool {
    if user_config_path().is_some_and(|p| p.exists()) {
        return true;
    }
    workspace.is_some_and(|ws| workspace_config_path(ws).exists())
}

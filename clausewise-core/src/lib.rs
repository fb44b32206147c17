//! # Clausewise Core
//!
//! Core library for Clausewise, a retrieval-augmented contract compliance
//! engine. Provides the rule registry, the document index, prompt assembly,
//! generation backends and the reasoning orchestrator that ties them together.

pub mod api;
pub mod backend;
pub mod config;
pub mod embeddings;
pub mod error;
pub mod index;
pub mod orchestrator;
pub mod presets;
pub mod prompt;
pub mod rules;

// Re-export commonly used types at the crate root.
pub use api::{ComplianceResponse, QaResponse};
pub use backend::{GenerationBackend, MockBackend, create_backend, create_backend_with_key};
pub use config::{ClausewiseConfig, LlmConfig, load_config};
pub use embeddings::{Embedder, EmbeddingConfig, LocalEmbedder, create_embedder};
pub use error::{ClausewiseError, Result};
pub use index::{DocumentIndex, RetrievedPassage, VectorIndex};
pub use orchestrator::{DEFAULT_TOP_K, ReasoningOrchestrator, ReasoningResult};
pub use presets::{SUGGESTED_QUERIES, SuggestedQuery};
pub use rules::{Rule, RuleRegistry, Severity};

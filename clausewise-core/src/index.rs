//! Read-only semantic search over a pre-built vector index.
//!
//! The index artifact is produced by an external builder and loaded once at
//! startup. The core never inserts, updates, or deletes entries; it only ranks
//! stored passages against a query embedding.

use crate::embeddings::Embedder;
use crate::error::IndexError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Source id reported for passages whose metadata carries no filename.
pub const UNKNOWN_SOURCE: &str = "Unknown";

/// File name of the artifact inside an index directory.
pub const INDEX_FILE_NAME: &str = "index.json";

/// One passage returned by a document index search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetrievedPassage {
    pub content: String,
    pub source_id: String,
    /// Similarity to the query as computed by the index. Informational only.
    #[serde(default)]
    pub score: f32,
}

impl RetrievedPassage {
    pub fn new(content: impl Into<String>, source_id: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            source_id: source_id.into(),
            score: 0.0,
        }
    }
}

/// Semantic search capability consumed by the orchestrator.
#[async_trait]
pub trait DocumentIndex: Send + Sync {
    /// Return at most `k` passages ordered by descending similarity.
    ///
    /// Returns fewer than `k` when the index holds fewer entries, and an
    /// empty vector when `k == 0`.
    async fn search(&self, query: &str, k: usize) -> Result<Vec<RetrievedPassage>, IndexError>;
}

/// Header describing the embedding space an artifact was built in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArtifactEmbedder {
    pub provider: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    pub dimensions: usize,
}

/// A stored passage with its precomputed embedding.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexEntry {
    pub content: String,
    #[serde(default)]
    pub metadata: serde_json::Map<String, serde_json::Value>,
    pub embedding: Vec<f32>,
}

impl IndexEntry {
    /// The originating document, taken from the `filename` metadata key.
    pub fn source_id(&self) -> &str {
        self.metadata
            .get("filename")
            .and_then(|v| v.as_str())
            .unwrap_or(UNKNOWN_SOURCE)
    }
}

/// On-disk serialized form of a vector index.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexArtifact {
    pub embedder: ArtifactEmbedder,
    pub entries: Vec<IndexEntry>,
}

/// Compute cosine similarity between two vectors.
///
/// Accumulates in `f64` so large finite components cannot overflow.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }
    let (mut dot, mut norm_a, mut norm_b) = (0.0f64, 0.0f64, 0.0f64);
    for (x, y) in a.iter().zip(b.iter()) {
        let (x, y) = (f64::from(*x), f64::from(*y));
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    (dot / (norm_a.sqrt() * norm_b.sqrt())) as f32
}

fn ensure_finite(embedding: &[f32], what: impl FnOnce() -> String) -> Result<(), IndexError> {
    if embedding.iter().all(|v| v.is_finite()) {
        Ok(())
    } else {
        Err(IndexError::unavailable(format!(
            "{} contains non-finite values",
            what()
        )))
    }
}

/// Dense vector index ranked by cosine similarity.
pub struct VectorIndex {
    header: ArtifactEmbedder,
    entries: Vec<IndexEntry>,
    embedder: Box<dyn Embedder>,
}

impl std::fmt::Debug for VectorIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VectorIndex")
            .field("embedder", &self.header)
            .field("entries", &self.entries.len())
            .finish()
    }
}

impl VectorIndex {
    /// Open an artifact from disk.
    ///
    /// `path` may point at the artifact file itself or at the directory
    /// containing `index.json`.
    pub fn open(path: &Path, embedder: Box<dyn Embedder>) -> Result<Self, IndexError> {
        let file = resolve_artifact_path(path);
        let raw = std::fs::read_to_string(&file).map_err(|e| {
            IndexError::unavailable(format!("cannot read {}: {}", file.display(), e))
        })?;
        let artifact: IndexArtifact = serde_json::from_str(&raw).map_err(|e| {
            IndexError::unavailable(format!("corrupt index artifact {}: {}", file.display(), e))
        })?;
        let index = Self::from_artifact(artifact, embedder)?;
        debug!(
            path = %file.display(),
            entries = index.len(),
            provider = %index.header.provider,
            "Loaded document index"
        );
        Ok(index)
    }

    /// Wrap an already-deserialized artifact, checking it against the embedder.
    pub fn from_artifact(
        artifact: IndexArtifact,
        embedder: Box<dyn Embedder>,
    ) -> Result<Self, IndexError> {
        let dims = embedder.dimensions();
        if artifact.embedder.dimensions != dims {
            return Err(IndexError::unavailable(format!(
                "index built with {}-dimensional '{}' embeddings, query embedder '{}' produces {}",
                artifact.embedder.dimensions,
                artifact.embedder.provider,
                embedder.provider_name(),
                dims
            )));
        }
        if artifact.embedder.provider != embedder.provider_name() {
            warn!(
                artifact = %artifact.embedder.provider,
                embedder = embedder.provider_name(),
                "Embedding provider differs from the one the index was built with"
            );
        }
        if let Some(pos) = artifact.entries.iter().position(|e| e.embedding.len() != dims) {
            return Err(IndexError::unavailable(format!(
                "index entry {} has {} dimensions, expected {}",
                pos,
                artifact.entries[pos].embedding.len(),
                dims
            )));
        }
        for (pos, entry) in artifact.entries.iter().enumerate() {
            ensure_finite(&entry.embedding, || format!("index entry {}", pos))?;
        }
        Ok(Self {
            header: artifact.embedder,
            entries: artifact.entries,
            embedder,
        })
    }

    /// Embed `(content, filename)` pairs into a fresh index.
    ///
    /// Intended for index builders and tests; the reasoning path only ever
    /// opens existing artifacts.
    pub async fn build<I>(embedder: Box<dyn Embedder>, passages: I) -> Result<Self, IndexError>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let mut entries = Vec::new();
        for (content, filename) in passages {
            let embedding = embedder.embed(&content).await?;
            ensure_finite(&embedding, || format!("embedding of '{}'", filename))?;
            let mut metadata = serde_json::Map::new();
            metadata.insert("filename".into(), serde_json::Value::String(filename));
            entries.push(IndexEntry {
                content,
                metadata,
                embedding,
            });
        }
        let header = ArtifactEmbedder {
            provider: embedder.provider_name().to_string(),
            model: None,
            dimensions: embedder.dimensions(),
        };
        Ok(Self {
            header,
            entries,
            embedder,
        })
    }

    /// Write the artifact to `path` (file or directory) as JSON.
    pub fn save(&self, path: &Path) -> crate::error::Result<()> {
        let file = resolve_artifact_path(path);
        if let Some(parent) = file.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let artifact = IndexArtifact {
            embedder: self.header.clone(),
            entries: self.entries.clone(),
        };
        std::fs::write(&file, serde_json::to_string(&artifact)?)?;
        Ok(())
    }

    pub fn header(&self) -> &ArtifactEmbedder {
        &self.header
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn resolve_artifact_path(path: &Path) -> PathBuf {
    if path.is_dir() || path.extension().is_none() {
        path.join(INDEX_FILE_NAME)
    } else {
        path.to_path_buf()
    }
}

#[async_trait]
impl DocumentIndex for VectorIndex {
    async fn search(&self, query: &str, k: usize) -> Result<Vec<RetrievedPassage>, IndexError> {
        if k == 0 || self.entries.is_empty() {
            return Ok(Vec::new());
        }

        let query_embedding = self.embedder.embed(query).await?;
        if query_embedding.len() != self.header.dimensions {
            return Err(IndexError::unavailable(format!(
                "query embedding has {} dimensions, index expects {}",
                query_embedding.len(),
                self.header.dimensions
            )));
        }
        ensure_finite(&query_embedding, || "query embedding".to_string())?;

        let mut scored: Vec<(usize, f32)> = self
            .entries
            .iter()
            .enumerate()
            .map(|(pos, entry)| (pos, cosine_similarity(&query_embedding, &entry.embedding)))
            .collect();

        // Stable sort: equal scores keep artifact order.
        scored.sort_by(|a, b| b.1.total_cmp(&a.1));
        scored.truncate(k);

        debug!(k, hits = scored.len(), "Vector search complete");

        Ok(scored
            .into_iter()
            .map(|(pos, score)| {
                let entry = &self.entries[pos];
                RetrievedPassage {
                    content: entry.content.clone(),
                    source_id: entry.source_id().to_string(),
                    score,
                }
            })
            .collect())
    }
}

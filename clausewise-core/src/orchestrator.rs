//! Reasoning orchestrator.
//!
//! Runs one retrieval-augmented generation pass per query:
//! search the index, assemble the prompt, call the backend once, and package
//! the reply together with the passages it was grounded on.

use crate::backend::GenerationBackend;
use crate::error::Result;
use crate::index::{DocumentIndex, RetrievedPassage};
use crate::prompt::{self, TaskKind};
use crate::rules::RuleRegistry;
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, info};

pub use crate::config::DEFAULT_TOP_K;

/// Outcome of a compliance check or question.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReasoningResult {
    /// The caller's query or question, verbatim.
    pub query: String,
    /// Opaque text produced by the backend.
    pub text: String,
    /// Source id of each passage used as context, in retrieval order.
    /// Duplicates are kept.
    pub sources: Vec<String>,
    /// Number of sources; only set for compliance checks.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_count: Option<usize>,
}

/// Coordinates the registry, the index and the generation backend.
///
/// Holds only shared read-only handles, so one instance can serve concurrent
/// callers.
pub struct ReasoningOrchestrator {
    registry: Arc<RuleRegistry>,
    index: Arc<dyn DocumentIndex>,
    backend: Arc<dyn GenerationBackend>,
}

impl ReasoningOrchestrator {
    pub fn new(
        registry: Arc<RuleRegistry>,
        index: Arc<dyn DocumentIndex>,
        backend: Arc<dyn GenerationBackend>,
    ) -> Self {
        Self {
            registry,
            index,
            backend,
        }
    }

    pub fn registry(&self) -> &RuleRegistry {
        &self.registry
    }

    /// Analyze the `k` most relevant passages against every registered rule.
    pub async fn check_compliance(&self, query: &str, k: usize) -> Result<ReasoningResult> {
        let passages = self.retrieve(TaskKind::Compliance, query, k).await?;
        let prompt = prompt::build_compliance_prompt(self.registry.all(), &passages, query);
        let text = self.generate(TaskKind::Compliance, &prompt).await?;
        let sources = source_ids(passages);

        info!(
            task = %TaskKind::Compliance,
            sources = sources.len(),
            rules = self.registry.len(),
            "Compliance check complete"
        );
        Ok(ReasoningResult {
            query: query.to_string(),
            text,
            source_count: Some(sources.len()),
            sources,
        })
    }

    /// Answer a free-form question from the `k` most relevant passages.
    pub async fn answer_question(&self, question: &str, k: usize) -> Result<ReasoningResult> {
        let passages = self.retrieve(TaskKind::Question, question, k).await?;
        let prompt = prompt::build_qa_prompt(&passages, question);
        let text = self.generate(TaskKind::Question, &prompt).await?;
        let sources = source_ids(passages);

        info!(
            task = %TaskKind::Question,
            sources = sources.len(),
            "Question answered"
        );
        Ok(ReasoningResult {
            query: question.to_string(),
            text,
            sources,
            source_count: None,
        })
    }

    async fn retrieve(
        &self,
        task: TaskKind,
        query: &str,
        k: usize,
    ) -> Result<Vec<RetrievedPassage>> {
        let passages = self.index.search(query, k).await?;
        debug!(task = %task, k, retrieved = passages.len(), "Retrieved passages");
        Ok(passages)
    }

    async fn generate(&self, task: TaskKind, prompt: &str) -> Result<String> {
        debug!(
            task = %task,
            backend = self.backend.name(),
            prompt_chars = prompt.len(),
            "Calling generation backend"
        );
        Ok(self.backend.generate(prompt).await?)
    }
}

fn source_ids(passages: Vec<RetrievedPassage>) -> Vec<String> {
    passages.into_iter().map(|p| p.source_id).collect()
}

//! Wire shapes returned to UI collaborators.
//!
//! Field names are part of the external contract and must not change.

use crate::orchestrator::ReasoningResult;
use serde::{Deserialize, Serialize};

/// Reply to a compliance check.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComplianceResponse {
    pub query: String,
    pub response: String,
    pub sources: Vec<String>,
    pub num_sources: usize,
}

/// Reply to an open question.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QaResponse {
    pub question: String,
    pub answer: String,
    pub sources: Vec<String>,
}

impl From<ReasoningResult> for ComplianceResponse {
    fn from(result: ReasoningResult) -> Self {
        let num_sources = result.source_count.unwrap_or(result.sources.len());
        Self {
            query: result.query,
            response: result.text,
            sources: result.sources,
            num_sources,
        }
    }
}

impl From<ReasoningResult> for QaResponse {
    fn from(result: ReasoningResult) -> Self {
        Self {
            question: result.query,
            answer: result.text,
            sources: result.sources,
        }
    }
}

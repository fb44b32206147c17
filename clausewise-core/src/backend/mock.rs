//! In-process backend for tests and dry runs.

use super::GenerationBackend;
use crate::error::GenerationError;
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

const DEFAULT_MOCK_TEXT: &str = "1. COMPLIANCE STATUS: PARTIAL\n\
2. APPLICABLE RULES: (mock backend)\n\
3. EVIDENCE: none\n\
4. VIOLATIONS: none\n\
5. REMEDIATION: none";

/// Mock backend that returns queued replies and records every prompt.
///
/// Queued entries are consumed first-in first-out. Once the queue is empty
/// the default text is returned, unless the backend was built with
/// [`MockBackend::failing`].
pub struct MockBackend {
    queue: Mutex<VecDeque<Result<String, GenerationError>>>,
    default_text: String,
    always_fail: Option<String>,
    prompts: Mutex<Vec<String>>,
    calls: AtomicUsize,
}

impl MockBackend {
    pub fn new() -> Self {
        Self {
            queue: Mutex::new(VecDeque::new()),
            default_text: DEFAULT_MOCK_TEXT.to_string(),
            always_fail: None,
            prompts: Mutex::new(Vec::new()),
            calls: AtomicUsize::new(0),
        }
    }

    /// Create a mock that always returns the given text.
    pub fn with_response(text: &str) -> Self {
        Self {
            default_text: text.to_string(),
            ..Self::new()
        }
    }

    /// Create a mock whose every call fails with `ApiRequest`.
    pub fn failing(message: &str) -> Self {
        Self {
            always_fail: Some(message.to_string()),
            ..Self::new()
        }
    }

    /// Queue a reply for the next call.
    pub fn queue_response(&self, text: &str) {
        self.lock_queue().push_back(Ok(text.to_string()));
    }

    /// Queue a failure for the next call.
    pub fn queue_error(&self, error: GenerationError) {
        self.lock_queue().push_back(Err(error));
    }

    /// Every prompt received so far, in call order.
    pub fn prompts(&self) -> Vec<String> {
        self.prompts
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    /// The most recent prompt, if any.
    pub fn last_prompt(&self) -> Option<String> {
        self.prompts
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .last()
            .cloned()
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn lock_queue(&self) -> std::sync::MutexGuard<'_, VecDeque<Result<String, GenerationError>>> {
        self.queue.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl Default for MockBackend {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl GenerationBackend for MockBackend {
    async fn generate(&self, prompt: &str) -> Result<String, GenerationError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.prompts
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(prompt.to_string());

        if let Some(message) = &self.always_fail {
            return Err(GenerationError::ApiRequest {
                message: message.clone(),
            });
        }
        match self.lock_queue().pop_front() {
            Some(reply) => reply,
            None => Ok(self.default_text.clone()),
        }
    }

    fn name(&self) -> &str {
        "mock"
    }
}

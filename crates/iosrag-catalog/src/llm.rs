//! Canned LLM client for connectivity checks.

use std::time::Duration;

use async_trait::async_trait;
use iosrag_core::LlmProvider;
use iosrag_core::ports::{LlmClient, LlmError};

const CANNED: [(&str, &str); 4] = [
    (
        "What is the capital city of France?",
        "The capital city of France is Paris.",
    ),
    ("What is 2 + 2?", "2 + 2 equals 4."),
    (
        "Name one planet in our solar system.",
        "Earth is a planet in our solar system.",
    ),
    (
        "What color do you get when you mix red and blue?",
        "When you mix red and blue, you get purple.",
    ),
];

const FALLBACK: &str = "I understand your question and I'm processing it.";

/// Answers from a fixed table; unknown prompts get a generic reply.
#[derive(Debug, Clone, Default)]
pub struct CannedLlmClient {
    latency: Duration,
}

impl CannedLlmClient {
    pub const fn new(latency: Duration) -> Self {
        Self { latency }
    }
}

#[async_trait]
impl LlmClient for CannedLlmClient {
    async fn complete(&self, provider: LlmProvider, prompt: &str) -> Result<String, LlmError> {
        if prompt.trim().is_empty() {
            return Err(LlmError::Request("empty prompt".to_string()));
        }
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
        let answer = CANNED
            .iter()
            .find(|(question, _)| *question == prompt.trim())
            .map_or(FALLBACK, |(_, answer)| answer);
        tracing::debug!(target: "iosrag.llm", %provider, "Canned completion");
        Ok(answer.to_string())
    }
}

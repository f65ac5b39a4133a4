//! LLM client port.

use async_trait::async_trait;
use thiserror::Error;

use crate::config::LlmProvider;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum LlmError {
    #[error("LLM provider {provider} is unavailable: {reason}")]
    Unavailable { provider: String, reason: String },

    #[error("LLM request failed: {0}")]
    Request(String),
}

/// Port for single-turn completions.
#[async_trait]
pub trait LlmClient: Send + Sync {
    async fn complete(&self, provider: LlmProvider, prompt: &str) -> Result<String, LlmError>;
}

//! Connectivity check that sends a handful of questions to an LLM provider.

use std::sync::Arc;

use chrono::{Local, Utc};
use serde::{Deserialize, Serialize};

use crate::config::LlmProvider;
use crate::ports::LlmClient;

/// Questions asked when the request supplies none.
pub const DEFAULT_QUESTIONS: [&str; 4] = [
    "What is the capital city of France?",
    "What is 2 + 2?",
    "Name one planet in our solar system.",
    "What color do you get when you mix red and blue?",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LlmTestStatus {
    Success,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LlmTestResult {
    pub question: String,
    pub response: String,
    pub status: LlmTestStatus,
    /// Local wall-clock time, `HH:MM:SS`.
    pub timestamp: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LlmTestReport {
    pub provider: LlmProvider,
    pub results: Vec<LlmTestResult>,
    /// Fraction of questions answered, in `[0, 1]`.
    pub success_rate: f64,
    pub tested_at: chrono::DateTime<Utc>,
}

pub struct LlmTester {
    client: Arc<dyn LlmClient>,
}

impl LlmTester {
    pub fn new(client: Arc<dyn LlmClient>) -> Self {
        Self { client }
    }

    /// Ask every question in turn. Failures are recorded per question.
    pub async fn run(&self, provider: LlmProvider, questions: &[String]) -> LlmTestReport {
        let mut results = Vec::with_capacity(questions.len());
        for question in questions {
            let (response, status) = match self.client.complete(provider, question).await {
                Ok(answer) => (answer, LlmTestStatus::Success),
                Err(e) => {
                    tracing::warn!(
                        target: "iosrag.llm",
                        provider = %provider,
                        error = %e,
                        "LLM test question failed"
                    );
                    (format!("Error: {e}"), LlmTestStatus::Error)
                }
            };
            results.push(LlmTestResult {
                question: question.clone(),
                response,
                status,
                timestamp: Local::now().format("%H:%M:%S").to_string(),
            });
        }

        let succeeded = results
            .iter()
            .filter(|r| r.status == LlmTestStatus::Success)
            .count();
        let success_rate = if results.is_empty() {
            0.0
        } else {
            succeeded as f64 / results.len() as f64
        };

        LlmTestReport {
            provider,
            results,
            success_rate,
            tested_at: Utc::now(),
        }
    }
}

pub fn default_questions() -> Vec<String> {
    DEFAULT_QUESTIONS.iter().map(ToString::to_string).collect()
}

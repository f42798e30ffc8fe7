//! LLM Client: the single point of entry for all model calls in the triage service.
//!
//! ARCHITECTURAL RULE: No other module may call a provider API directly.
//! All LLM interactions MUST go through an `LlmProvider` from this module.
//!
//! Two interchangeable providers exist: Gemini (primary) and Claude (secondary).
//! Fallback between them lives in `triage::dispatcher`, not here; a provider makes
//! exactly one HTTP attempt per call.
use async_trait::async_trait;
use thiserror::Error;

pub mod claude;
pub mod gemini;
pub mod prompts;

pub use claude::ClaudeClient;
pub use gemini::GeminiClient;

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("LLM returned empty content")]
    EmptyContent,

    #[error("LLM call timed out after {0}s")]
    Timeout(u64),

    #[error("Provider '{0}' is not configured")]
    NotConfigured(&'static str),
}

/// Sampling knobs for one call. Scoring favours variety, classification favours consistency.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GenerationParams {
    pub temperature: f32,
    pub max_tokens: u32,
}

impl GenerationParams {
    pub const SCORING: GenerationParams = GenerationParams {
        temperature: 0.7,
        max_tokens: 2048,
    };

    pub const CLASSIFICATION: GenerationParams = GenerationParams {
        temperature: 0.1,
        max_tokens: 50,
    };
}

/// A text-generation backend. Implementations return the model's raw text reply.
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Short provider name used in logs and `/health` ("gemini", "claude").
    fn name(&self) -> &'static str;

    /// Model identifier reported as `*_model` in triage outcomes.
    fn model(&self) -> &str;

    async fn generate(
        &self,
        prompt: &str,
        system: &str,
        params: GenerationParams,
    ) -> Result<String, LlmError>;
}

fn http_client(timeout: std::time::Duration) -> Result<reqwest::Client, LlmError> {
    Ok(reqwest::Client::builder().timeout(timeout).build()?)
}

/// Timeout on the underlying HTTP client. The dispatcher layers its own per-call bound on top.
const HTTP_TIMEOUT: std::time::Duration = std::time::Duration::from_secs(120);

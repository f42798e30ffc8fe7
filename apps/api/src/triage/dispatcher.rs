//! Backend dispatcher: one primary attempt, one secondary attempt, no retries.
//!
//! Transport errors, timeouts, empty replies and replies the parser rejects are all
//! failures that move on to the next provider. Both failing is a terminal `None`.

use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::{debug, error, info, warn};

use crate::llm_client::{GenerationParams, LlmError, LlmProvider};
use crate::triage::models::AttemptFailure;

/// Which of the two per-request calls is being dispatched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Theme,
    Analysis,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::Theme => f.write_str("theme"),
            Stage::Analysis => f.write_str("analysis"),
        }
    }
}

/// Result of a dispatch: the parsed value (if any), who produced it, and what failed on the way.
#[derive(Debug)]
pub struct Dispatched<T> {
    pub value: Option<T>,
    /// `provider/model` of the attempt that produced `value`.
    pub model_used: Option<String>,
    pub failures: Vec<AttemptFailure>,
    pub elapsed: Duration,
}

/// Owns the two optional providers. A provider is present or absent from construction on.
#[derive(Clone)]
pub struct Dispatcher {
    primary: Option<Arc<dyn LlmProvider>>,
    secondary: Option<Arc<dyn LlmProvider>>,
    timeout: Duration,
    verbose: bool,
}

impl Dispatcher {
    pub fn new(
        primary: Option<Arc<dyn LlmProvider>>,
        secondary: Option<Arc<dyn LlmProvider>>,
        timeout: Duration,
    ) -> Self {
        Self {
            primary,
            secondary,
            timeout,
            verbose: false,
        }
    }

    /// Logs prompt sizes and raw reply previews at info instead of debug.
    pub fn verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    pub async fn dispatch<T, F>(
        &self,
        stage: Stage,
        prompt: &str,
        system: &str,
        params: GenerationParams,
        parse: F,
    ) -> Dispatched<T>
    where
        F: Fn(&str) -> Option<T>,
    {
        let started = Instant::now();
        let mut failures = Vec::new();

        let slots = [
            ("primary", "gemini", self.primary.as_ref()),
            ("secondary", "claude", self.secondary.as_ref()),
        ];

        for (slot, default_name, provider) in slots {
            let Some(provider) = provider else {
                let reason = LlmError::NotConfigured(default_name).to_string();
                warn!("{stage}: {slot} provider skipped: {reason}");
                failures.push(AttemptFailure {
                    provider: default_name,
                    reason,
                });
                continue;
            };

            match self.attempt(stage, provider.as_ref(), prompt, system, params, &parse).await {
                Ok(value) => {
                    info!("{stage}: {slot} provider '{}' succeeded", provider.name());
                    return Dispatched {
                        value: Some(value),
                        model_used: Some(format!("{}/{}", provider.name(), provider.model())),
                        failures,
                        elapsed: started.elapsed(),
                    };
                }
                Err(reason) => {
                    warn!(
                        "{stage}: {slot} provider '{}' failed: {reason}",
                        provider.name()
                    );
                    failures.push(AttemptFailure {
                        provider: provider.name(),
                        reason,
                    });
                }
            }
        }

        error!(
            "{stage}: all backends failed ({})",
            failures
                .iter()
                .map(|f| format!("{}: {}", f.provider, f.reason))
                .collect::<Vec<_>>()
                .join("; ")
        );
        Dispatched {
            value: None,
            model_used: None,
            failures,
            elapsed: started.elapsed(),
        }
    }

    async fn attempt<T, F>(
        &self,
        stage: Stage,
        provider: &dyn LlmProvider,
        prompt: &str,
        system: &str,
        params: GenerationParams,
        parse: &F,
    ) -> Result<T, String>
    where
        F: Fn(&str) -> Option<T>,
    {
        if self.verbose {
            info!("{stage}: sending {} prompt chars to {}", prompt.len(), provider.name());
        } else {
            debug!("{stage}: sending {} prompt chars to {}", prompt.len(), provider.name());
        }

        let raw = match tokio::time::timeout(self.timeout, provider.generate(prompt, system, params)).await {
            Ok(Ok(raw)) => raw,
            Ok(Err(e)) => return Err(e.to_string()),
            Err(_) => return Err(LlmError::Timeout(self.timeout.as_secs()).to_string()),
        };

        if self.verbose {
            info!("{stage}: raw reply from {}: {raw}", provider.name());
        } else {
            debug!("{stage}: raw reply from {}: {raw}", provider.name());
        }

        parse(&raw).ok_or_else(|| format!("unusable {stage} response ({} chars)", raw.len()))
    }
}

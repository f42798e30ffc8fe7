//! Request orchestrator: runs local inference, both backend dispatches, classification and
//! similarity hashing for one ticket, and assembles the `TriageOutcome`.

use std::time::Instant;

use chrono::Utc;
use thiserror::Error;
use tracing::{info, warn};

use crate::llm_client::prompts::{ANALYSIS_SYSTEM, THEME_SYSTEM};
use crate::llm_client::GenerationParams;
use crate::triage::classify::{classify_ticket, similarity_group};
use crate::triage::dispatcher::{Dispatcher, Stage};
use crate::triage::effort::estimate_effort;
use crate::triage::models::{
    PriorityRecommendation, StageTimings, Ticket, TriageOutcome, THEME_NOT_IDENTIFIED,
};
use crate::triage::parser::{parse_analysis, parse_theme};
use crate::triage::product::detect_product;
use crate::triage::prompts::{build_analysis_prompt, build_theme_prompt};

/// Request-level failures. Backend and parse failures never surface here.
#[derive(Debug, Error)]
pub enum TriageError {
    #[error("Missing issue key")]
    MissingKey,

    #[error("Invalid webhook payload: {0}")]
    InvalidPayload(String),
}

pub struct Orchestrator {
    dispatcher: Dispatcher,
}

impl Orchestrator {
    pub fn new(dispatcher: Dispatcher) -> Self {
        Self { dispatcher }
    }

    /// Triage one ticket. Only a ticket without a key is an error; a ticket whose
    /// analysis could not be produced yields a degraded outcome instead.
    pub async fn handle(&self, ticket: &Ticket) -> Result<TriageOutcome, TriageError> {
        if ticket.key.trim().is_empty() {
            return Err(TriageError::MissingKey);
        }
        let started = Instant::now();

        let effort = estimate_effort(ticket);
        let product = detect_product(ticket);
        info!(
            "Local inference: product={} ({}), effort={}",
            product.product,
            product.confidence.as_str(),
            effort.size
        );

        let theme_prompt = build_theme_prompt(ticket, &product);
        let analysis_prompt = build_analysis_prompt(ticket, &product, &effort);
        let vocabulary = product.themes();

        // The prompts are independent, so both calls go out together.
        let (theme, analysis) = tokio::join!(
            self.dispatcher.dispatch(
                Stage::Theme,
                &theme_prompt,
                THEME_SYSTEM,
                GenerationParams::CLASSIFICATION,
                |raw: &str| parse_theme(raw, vocabulary),
            ),
            self.dispatcher.dispatch(
                Stage::Analysis,
                &analysis_prompt,
                ANALYSIS_SYSTEM,
                GenerationParams::SCORING,
                parse_analysis,
            ),
        );

        let theme_label = theme
            .value
            .unwrap_or_else(|| THEME_NOT_IDENTIFIED.to_string());
        let classification = classify_ticket(ticket);
        let similar_features = analysis
            .value
            .as_ref()
            .map(|a| a.similar_features.as_str())
            .unwrap_or_default();
        let similarity = similarity_group(&theme_label, similar_features);

        let (recommendation, importance, confidence) = match &analysis.value {
            Some(result) => (
                result.priority_recommendation,
                result.scores.overall_priority,
                product.confidence.score(),
            ),
            None => {
                warn!(
                    "AI analysis unavailable for {}: both backends failed, defaulting to {}",
                    ticket.key,
                    PriorityRecommendation::OnHold
                );
                (PriorityRecommendation::OnHold, 0, 0.0)
            }
        };

        let outcome = TriageOutcome {
            issue_key: ticket.key.clone(),
            theme: theme_label,
            analysis: analysis.value,
            effort,
            product: product.product.to_string(),
            product_confidence: product.confidence.as_str().to_string(),
            classification,
            similarity_group: similarity,
            theme_model: theme.model_used,
            analysis_model: analysis.model_used,
            theme_failures: theme.failures,
            analysis_failures: analysis.failures,
            recommendation,
            importance,
            confidence,
            timings: StageTimings {
                theme_ms: theme.elapsed.as_millis() as u64,
                analysis_ms: analysis.elapsed.as_millis() as u64,
                total_ms: started.elapsed().as_millis() as u64,
            },
            analyzed_at: Utc::now(),
        };

        info!(
            "Triage complete: {} -> {} (importance {}, theme '{}', {:?})",
            outcome.issue_key,
            outcome.recommendation,
            outcome.importance,
            outcome.theme,
            outcome.classification
        );
        Ok(outcome)
    }
}

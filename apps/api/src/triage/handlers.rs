use std::time::Instant;

use axum::{body::Bytes, extract::State, Json};
use serde::Serialize;
use tracing::{field, info, info_span, Instrument};
use uuid::Uuid;

use crate::errors::AppError;
use crate::state::AppState;
use crate::triage::models::{Classification, PriorityRecommendation, TriageOutcome};
use crate::triage::orchestrator::TriageError;
use crate::triage::webhook::WebhookPayload;

const ANALYSIS_UNAVAILABLE_NOTE: &str =
    "AI analysis unavailable: both backends failed. Recommendation defaulted to On Hold.";

#[derive(Debug, Serialize)]
pub struct TriageResponse {
    pub recommendation: PriorityRecommendation,
    pub classification: Classification,
    pub themes: Vec<String>,
    pub similarity_group: String,
    /// Always empty: past results are not persisted, so there is nothing to match against.
    pub duplicate_keys: Vec<String>,
    pub importance: u8,
    pub confidence: f64,
    pub notes: String,
    pub status: &'static str,
    #[serde(rename = "requestId")]
    pub request_id: String,
    #[serde(rename = "issueKey")]
    pub issue_key: String,
    pub result: TriageOutcome,
    /// Milliseconds.
    #[serde(rename = "processingTime")]
    pub processing_time: u64,
}

impl TriageResponse {
    fn from_outcome(outcome: TriageOutcome, request_id: String, processing_time: u64) -> Self {
        let (status, notes) = match &outcome.analysis {
            Some(analysis) => ("success", analysis.executive_summary.clone()),
            None => ("degraded", ANALYSIS_UNAVAILABLE_NOTE.to_string()),
        };
        Self {
            recommendation: outcome.recommendation,
            classification: outcome.classification,
            themes: vec![outcome.theme.clone()],
            similarity_group: outcome.similarity_group.clone(),
            duplicate_keys: Vec::new(),
            importance: outcome.importance,
            confidence: outcome.confidence,
            notes,
            status,
            request_id,
            issue_key: outcome.issue_key.clone(),
            result: outcome,
            processing_time,
        }
    }
}

/// POST /triage
///
/// The body is read raw so that malformed JSON is reported in the triage error
/// envelope rather than as a generic extractor rejection.
pub async fn handle_triage(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<TriageResponse>, AppError> {
    let request_id = Uuid::new_v4().to_string();
    let span = info_span!("triage", request_id = %request_id, issue_key = field::Empty);

    async move {
        let started = Instant::now();

        let payload: WebhookPayload = serde_json::from_slice(&body).map_err(|e| AppError::Triage {
            request_id: request_id.clone(),
            message: TriageError::InvalidPayload(e.to_string()).to_string(),
        })?;
        info!(
            "Received webhook event {}",
            payload.webhook_event.as_deref().unwrap_or("unknown")
        );

        let ticket = payload.into_ticket();
        tracing::Span::current().record("issue_key", ticket.key.as_str());

        let outcome = state
            .orchestrator
            .handle(&ticket)
            .await
            .map_err(|e| AppError::Triage {
                request_id: request_id.clone(),
                message: e.to_string(),
            })?;

        let elapsed = started.elapsed().as_millis() as u64;
        info!("Request processed in {elapsed}ms");
        Ok::<_, AppError>(Json(TriageResponse::from_outcome(outcome, request_id, elapsed)))
    }
    .instrument(span)
    .await
}

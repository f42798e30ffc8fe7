//! Data shapes for triage: the inbound ticket, the backend analysis, and the aggregated outcome.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Sentinel returned when no theme from the vocabulary applies.
pub const THEME_NOT_IDENTIFIED: &str = "THEME NOT IDENTIFIED";

/// A theme from the detected product's vocabulary, or [`THEME_NOT_IDENTIFIED`].
pub type ThemeLabel = String;

// ────────────────────────────────────────────────────────────────────────────
// Ticket
// ────────────────────────────────────────────────────────────────────────────

/// The unit of work submitted for triage. Immutable once built from the webhook.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Ticket {
    pub key: String,
    pub title: Option<String>,
    pub description: Option<String>,
    pub reporter: Option<String>,
    pub created: Option<String>,
    pub priority: Option<String>,
    pub components: Vec<String>,
    pub labels: Vec<String>,
    pub status: Option<String>,
}

impl Ticket {
    /// Lower-cased title + description + labels, the haystack for keyword classifiers.
    pub fn search_text(&self) -> String {
        let mut text = String::new();
        for part in [self.title.as_deref(), self.description.as_deref()]
            .into_iter()
            .flatten()
        {
            text.push_str(part);
            text.push(' ');
        }
        text.push_str(&self.labels.join(" "));
        text.to_lowercase()
    }

    pub fn components_lower(&self) -> Vec<String> {
        self.components.iter().map(|c| c.to_lowercase()).collect()
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Effort
// ────────────────────────────────────────────────────────────────────────────

/// Discretized implementation cost, ordered from smallest to largest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum EffortSize {
    XS,
    S,
    M,
    L,
    XL,
}

impl EffortSize {
    pub const ALL: [EffortSize; 5] = [
        EffortSize::XS,
        EffortSize::S,
        EffortSize::M,
        EffortSize::L,
        EffortSize::XL,
    ];

    /// Inverse effort score: smaller work scores higher.
    pub fn score(self) -> u8 {
        match self {
            EffortSize::XS => 100,
            EffortSize::S => 80,
            EffortSize::M => 60,
            EffortSize::L => 40,
            EffortSize::XL => 20,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            EffortSize::XS => "XS",
            EffortSize::S => "S",
            EffortSize::M => "M",
            EffortSize::L => "L",
            EffortSize::XL => "XL",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            EffortSize::XS => "Extra small: under a day, a trivial copy or configuration change",
            EffortSize::S => "Small: 1-3 days, a contained UI or settings change",
            EffortSize::M => "Medium: 1-2 weeks, a new workflow, report or integration touchpoint",
            EffortSize::L => "Large: 2-6 weeks, cross-cutting changes or a redesign of an area",
            EffortSize::XL => "Extra large: more than 6 weeks, new platform capability or rewrite",
        }
    }

    /// Accepts the canonical labels plus spelled-out sizes a model might emit.
    pub fn from_label(label: &str) -> Option<Self> {
        match label.trim().to_ascii_uppercase().as_str() {
            "XS" | "EXTRA SMALL" => Some(EffortSize::XS),
            "S" | "SMALL" => Some(EffortSize::S),
            "M" | "MEDIUM" => Some(EffortSize::M),
            "L" | "LARGE" => Some(EffortSize::L),
            "XL" | "EXTRA LARGE" => Some(EffortSize::XL),
            _ => None,
        }
    }
}

impl fmt::Display for EffortSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EffortEstimate {
    pub size: EffortSize,
    pub score: u8,
    pub reasoning: String,
    pub description: String,
}

// ────────────────────────────────────────────────────────────────────────────
// Analysis
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PriorityRecommendation {
    #[serde(rename = "Fast Track", alias = "FAST TRACK", alias = "fast track")]
    FastTrack,
    #[serde(alias = "STANDARD", alias = "standard")]
    Standard,
    #[serde(rename = "On Hold", alias = "ON HOLD", alias = "on hold")]
    OnHold,
    #[serde(alias = "LOW", alias = "low")]
    Low,
}

impl PriorityRecommendation {
    pub fn as_str(self) -> &'static str {
        match self {
            PriorityRecommendation::FastTrack => "Fast Track",
            PriorityRecommendation::Standard => "Standard",
            PriorityRecommendation::OnHold => "On Hold",
            PriorityRecommendation::Low => "Low",
        }
    }
}

impl fmt::Display for PriorityRecommendation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-dimension scores (0-100). Every input is optional; `overall_priority` is always
/// filled in by the parser before an `AnalysisResult` is handed out.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scores {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub business_impact: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub effort_size: Option<EffortSize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub effort_score: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub strategic_fit: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cross_client_value: Option<f64>,
    pub overall_priority: u8,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub scores: Scores,
    pub priority_recommendation: PriorityRecommendation,
    #[serde(default)]
    pub key_insights: Vec<String>,
    #[serde(default)]
    pub risks: Vec<String>,
    #[serde(default)]
    pub opportunities: Vec<String>,
    #[serde(default)]
    pub next_steps: Vec<String>,
    #[serde(default)]
    pub similar_features: String,
    #[serde(default)]
    pub executive_summary: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub on_hold_reasoning: Option<String>,
}

// ────────────────────────────────────────────────────────────────────────────
// Outcome
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Classification {
    Feature,
    Bug,
}

/// A backend attempt that did not produce a usable value.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AttemptFailure {
    pub provider: &'static str,
    pub reason: String,
}

/// Wall-clock milliseconds spent in each stage of a request.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StageTimings {
    pub theme_ms: u64,
    pub analysis_ms: u64,
    pub total_ms: u64,
}

/// Aggregated result of one triage request. Built once by the orchestrator.
#[derive(Debug, Clone, Serialize)]
pub struct TriageOutcome {
    pub issue_key: String,
    pub theme: ThemeLabel,
    pub analysis: Option<AnalysisResult>,
    pub effort: EffortEstimate,
    pub product: String,
    pub product_confidence: String,
    pub classification: Classification,
    pub similarity_group: String,
    pub theme_model: Option<String>,
    pub analysis_model: Option<String>,
    /// Attempts that failed before (or instead of) a usable theme.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub theme_failures: Vec<AttemptFailure>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub analysis_failures: Vec<AttemptFailure>,
    pub recommendation: PriorityRecommendation,
    /// `overall_priority` of the analysis, 0 when there is none.
    pub importance: u8,
    pub confidence: f64,
    pub timings: StageTimings,
    pub analyzed_at: DateTime<Utc>,
}

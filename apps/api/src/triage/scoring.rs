use crate::triage::models::{EffortSize, PriorityRecommendation};

/// Effort score used when the analysis carries neither `effort_score` nor `effort_size`.
const DEFAULT_EFFORT_SCORE: f64 = 50.0;
const ROUNDING_EPSILON: f64 = 1e-9;

#[derive(Debug, Clone)]
pub struct PriorityWeights {
    pub business_impact: f64,
    pub strategic_fit: f64,
    pub cross_client_value: f64,
    pub effort: f64,
}

impl Default for PriorityWeights {
    fn default() -> Self {
        Self {
            business_impact: 0.35,
            strategic_fit: 0.25,
            cross_client_value: 0.25,
            effort: 0.15,
        }
    }
}

/// Score inputs as they may arrive from a backend: any of them can be missing.
#[derive(Debug, Clone, Copy, Default)]
pub struct ScoreInputs {
    pub business_impact: Option<f64>,
    pub strategic_fit: Option<f64>,
    pub cross_client_value: Option<f64>,
    pub effort_score: Option<f64>,
    pub effort_size: Option<EffortSize>,
}

/// Overall priority: 0.35*impact + 0.25*fit + 0.25*cross_client + 0.15*effort, rounded half-up.
///
/// Missing scores count as 0. A missing effort score falls back to the size table, then to 50.
pub fn compute_overall(inputs: &ScoreInputs) -> u8 {
    compute_overall_weighted(inputs, &PriorityWeights::default())
}

fn compute_overall_weighted(inputs: &ScoreInputs, weights: &PriorityWeights) -> u8 {
    let effort = inputs
        .effort_score
        .or_else(|| inputs.effort_size.map(|s| s.score() as f64))
        .unwrap_or(DEFAULT_EFFORT_SCORE);

    let raw = weights.business_impact * inputs.business_impact.unwrap_or(0.0)
        + weights.strategic_fit * inputs.strategic_fit.unwrap_or(0.0)
        + weights.cross_client_value * inputs.cross_client_value.unwrap_or(0.0)
        + weights.effort * effort;

    clamp_score(raw)
}

/// Rounds half-up and clamps into 0..=100.
pub fn clamp_score(raw: f64) -> u8 {
    if raw.is_nan() {
        return 0;
    }
    // Nudge absorbs binary error in the weights (0.35 * 10.0 must still round 6.5 up).
    (raw + ROUNDING_EPSILON).round().clamp(0.0, 100.0) as u8
}

/// The banding rule for an overall score.
pub fn recommendation_for(overall: u8) -> PriorityRecommendation {
    match overall {
        80..=u8::MAX => PriorityRecommendation::FastTrack,
        50..=79 => PriorityRecommendation::Standard,
        25..=49 => PriorityRecommendation::OnHold,
        _ => PriorityRecommendation::Low,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn inputs(bi: f64, sf: f64, cc: f64, size: Option<EffortSize>) -> ScoreInputs {
        ScoreInputs {
            business_impact: Some(bi),
            strategic_fit: Some(sf),
            cross_client_value: Some(cc),
            effort_score: None,
            effort_size: size,
        }
    }

    #[test]
    fn test_high_priority_small_effort() {
        // 31.5 + 21.25 + 20 + 12 = 84.75
        assert_eq!(compute_overall(&inputs(90.0, 85.0, 80.0, Some(EffortSize::S))), 85);
    }

    #[test]
    fn test_low_priority_large_effort() {
        // 10.5 + 10 + 8.75 + 6 = 35.25
        assert_eq!(compute_overall(&inputs(30.0, 40.0, 35.0, Some(EffortSize::L))), 35);
    }

    #[test]
    fn test_explicit_effort_score_wins_over_size() {
        let mut i = inputs(0.0, 0.0, 0.0, Some(EffortSize::XL));
        i.effort_score = Some(100.0);
        assert_eq!(compute_overall(&i), 15);
    }

    #[test]
    fn test_missing_effort_defaults_to_fifty() {
        // 0.15 * 50 = 7.5 rounds to 8
        assert_eq!(compute_overall(&ScoreInputs::default()), 8);
    }

    #[test]
    fn test_rounds_half_up() {
        // 0.35 * 10 + 0.15 * 20 = 6.5 rounds to 7
        let i = ScoreInputs {
            business_impact: Some(10.0),
            effort_size: Some(EffortSize::XL),
            ..Default::default()
        };
        assert_eq!(compute_overall(&i), 7);
    }

    #[test]
    fn test_overall_bounded_for_out_of_range_inputs() {
        let high = inputs(500.0, 500.0, 500.0, Some(EffortSize::XS));
        assert_eq!(compute_overall(&high), 100);
        let low = inputs(-50.0, -50.0, -50.0, Some(EffortSize::XL));
        assert_eq!(compute_overall(&low), 0);
    }

    #[test]
    fn test_matches_manual_formula_across_grid() {
        for bi in (0..=100).step_by(25) {
            for sf in (0..=100).step_by(25) {
                for size in EffortSize::ALL {
                    let i = inputs(bi as f64, sf as f64, 50.0, Some(size));
                    let manual = 0.35 * bi as f64 + 0.25 * sf as f64 + 12.5 + 0.15 * size.score() as f64;
                    let got = compute_overall(&i);
                    assert!(got <= 100);
                    assert!((got as f64 - manual).abs() <= 0.5, "{got} vs {manual}");
                }
            }
        }
    }

    #[test]
    fn test_band_boundaries() {
        assert_eq!(recommendation_for(100), PriorityRecommendation::FastTrack);
        assert_eq!(recommendation_for(80), PriorityRecommendation::FastTrack);
        assert_eq!(recommendation_for(79), PriorityRecommendation::Standard);
        assert_eq!(recommendation_for(50), PriorityRecommendation::Standard);
        assert_eq!(recommendation_for(49), PriorityRecommendation::OnHold);
        assert_eq!(recommendation_for(25), PriorityRecommendation::OnHold);
        assert_eq!(recommendation_for(24), PriorityRecommendation::Low);
        assert_eq!(recommendation_for(0), PriorityRecommendation::Low);
    }

    #[test]
    fn test_clamp_score_nan_is_zero() {
        assert_eq!(clamp_score(f64::NAN), 0);
    }
}

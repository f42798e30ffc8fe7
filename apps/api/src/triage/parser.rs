//! Response parser: turns free-text model output into a validated `AnalysisResult`.
//!
//! Models wrap JSON in markdown fences, prepend chatter, or get cut off by the token
//! ceiling. Everything here returns `None` rather than a partially populated result.

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{Deserializer, Map, Value};
use tracing::{debug, warn};

use crate::triage::models::{AnalysisResult, EffortSize, ThemeLabel, THEME_NOT_IDENTIFIED};
use crate::triage::scoring::{clamp_score, compute_overall, recommendation_for, ScoreInputs};

// Closing fences only count at the start of a line, so backticks inside JSON strings are kept.
static JSON_FENCE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?ms)```json[ \t]*\r?\n(.*?)^[ \t]*```").expect("Invalid json fence regex")
});
static ANY_FENCE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?ms)```[A-Za-z0-9_-]*[ \t]*\r?\n(.*?)^[ \t]*```").expect("Invalid fence regex")
});

const PREVIEW_CHARS: usize = 200;

/// Parses a scoring reply. `None` when no object with `scores` and
/// `priority_recommendation` can be recovered.
pub fn parse_analysis(raw: &str) -> Option<AnalysisResult> {
    let body = extract_json_body(raw);
    let body = if is_truncated(body) {
        debug!("Model reply looks truncated, attempting repair");
        repair_truncated(body)?
    } else {
        body.to_string()
    };

    // Only the first complete value counts; trailing prose after it is ignored.
    let mut value: Value = match Deserializer::from_str(&body).into_iter::<Value>().next() {
        Some(Ok(v)) => v,
        Some(Err(e)) => {
            warn!("Model reply is not valid JSON ({e}): {}", preview(raw));
            return None;
        }
        None => {
            warn!("Model reply is empty: {}", preview(raw));
            return None;
        }
    };

    let obj = value.as_object_mut()?;
    if !obj.contains_key("scores") || !obj.contains_key("priority_recommendation") {
        warn!(
            "Model reply missing scores or priority_recommendation: {}",
            preview(raw)
        );
        return None;
    }
    normalize_scores(obj.get_mut("scores")?.as_object_mut()?);

    match serde_json::from_value::<AnalysisResult>(value) {
        Ok(result) => {
            let banded = recommendation_for(result.scores.overall_priority);
            if banded != result.priority_recommendation {
                warn!(
                    "Backend labelled overall {} as '{}' but the band rule gives '{}'; keeping backend label",
                    result.scores.overall_priority, result.priority_recommendation, banded
                );
            }
            Some(result)
        }
        Err(e) => {
            warn!("Model reply failed schema validation ({e}): {}", preview(raw));
            None
        }
    }
}

/// Validates a theme reply against the product vocabulary. Returns the canonical spelling.
pub fn parse_theme(raw: &str, vocabulary: &[&str]) -> Option<ThemeLabel> {
    let line = raw.trim().lines().next()?.trim();
    let cleaned = line
        .trim_matches(|c: char| c == '"' || c == '\'' || c == '`' || c == '*')
        .trim()
        .trim_end_matches('.')
        .trim();

    if cleaned.eq_ignore_ascii_case(THEME_NOT_IDENTIFIED) {
        return Some(THEME_NOT_IDENTIFIED.to_string());
    }
    let matched = vocabulary
        .iter()
        .find(|theme| theme.eq_ignore_ascii_case(cleaned))
        .map(|theme| theme.to_string());
    if matched.is_none() {
        warn!("Theme reply outside vocabulary: {}", preview(raw));
    }
    matched
}

/// Picks the JSON candidate out of a reply: ```json fence, any fence, then raw text.
fn extract_json_body(raw: &str) -> &str {
    if let Some(caps) = JSON_FENCE.captures(raw) {
        return caps.get(1).map_or("", |m| m.as_str()).trim();
    }
    // Opening ```json with no closing fence: the reply was cut off inside the block.
    if let Some(idx) = raw.find("```json") {
        return raw[idx + "```json".len()..].trim();
    }
    if let Some(caps) = ANY_FENCE.captures(raw) {
        return caps.get(1).map_or("", |m| m.as_str()).trim();
    }
    let trimmed = raw.trim();
    match trimmed.find('{') {
        Some(idx) if idx > 0 => &trimmed[idx..],
        _ => trimmed,
    }
}

/// True when the body opens more objects than it closes, ignoring braces inside strings.
fn is_truncated(body: &str) -> bool {
    let mut open = 0usize;
    let mut close = 0usize;
    let mut in_string = false;
    let mut escaped = false;
    for c in body.chars() {
        if in_string {
            match c {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match c {
            '"' => in_string = true,
            '{' => open += 1,
            '}' => close += 1,
            _ => {}
        }
    }
    open > close
}

/// Recovers the longest well-formed prefix of a truncated object.
///
/// Cut points sit after every closing brace/bracket and before every comma. Walking them
/// from the end, the prefix is closed with whatever containers were still open at that
/// point and re-parsed; the first prefix that yields an object wins.
fn repair_truncated(body: &str) -> Option<String> {
    struct Cut {
        end: usize,
        open: Vec<char>,
    }

    let mut cuts: Vec<Cut> = Vec::new();
    let mut stack: Vec<char> = Vec::new();
    let mut in_string = false;
    let mut escaped = false;

    for (idx, c) in body.char_indices() {
        if in_string {
            match c {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match c {
            '"' => in_string = true,
            '{' => stack.push('}'),
            '[' => stack.push(']'),
            '}' | ']' => {
                if stack.pop() != Some(c) {
                    return None;
                }
                cuts.push(Cut {
                    end: idx + c.len_utf8(),
                    open: stack.clone(),
                });
            }
            ',' => cuts.push(Cut {
                end: idx,
                open: stack.clone(),
            }),
            _ => {}
        }
    }

    for cut in cuts.iter().rev() {
        let mut candidate = body[..cut.end].trim_end().to_string();
        candidate.extend(cut.open.iter().rev());
        if let Ok(Value::Object(_)) = serde_json::from_str::<Value>(&candidate) {
            return Some(candidate);
        }
    }
    None
}

/// Canonicalizes `effort_size` and guarantees an integer `overall_priority` in 0..=100.
fn normalize_scores(scores: &mut Map<String, Value>) {
    let size = scores
        .get("effort_size")
        .and_then(Value::as_str)
        .and_then(EffortSize::from_label);
    match size {
        Some(s) => {
            scores.insert("effort_size".into(), Value::String(s.label().into()));
        }
        None => {
            if let Some(bad) = scores.remove("effort_size") {
                if !bad.is_null() {
                    debug!("Dropping unrecognized effort_size {bad}");
                }
            }
        }
    }

    for field in ["business_impact", "effort_score", "strategic_fit", "cross_client_value"] {
        if scores.get(field).is_some_and(|v| !v.is_number()) {
            scores.remove(field);
        }
    }

    let overall = match scores.get("overall_priority").and_then(Value::as_f64) {
        Some(supplied) => clamp_score(supplied),
        None => {
            let computed = compute_overall(&ScoreInputs {
                business_impact: scores.get("business_impact").and_then(Value::as_f64),
                strategic_fit: scores.get("strategic_fit").and_then(Value::as_f64),
                cross_client_value: scores.get("cross_client_value").and_then(Value::as_f64),
                effort_score: scores.get("effort_score").and_then(Value::as_f64),
                effort_size: size,
            });
            debug!("Backend omitted overall_priority, computed {computed}");
            computed
        }
    };
    scores.insert("overall_priority".into(), Value::from(overall));
}

fn preview(raw: &str) -> String {
    let mut out: String = raw.chars().take(PREVIEW_CHARS).collect();
    if raw.chars().count() > PREVIEW_CHARS {
        out.push('…');
    }
    out
}

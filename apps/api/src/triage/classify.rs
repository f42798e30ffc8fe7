use once_cell::sync::Lazy;
use regex::Regex;

use crate::triage::models::{Classification, Ticket};

const KEYWORD_WEIGHT: u32 = 2;
const PATTERN_WEIGHT: u32 = 1;
const LABEL_WEIGHT: u32 = 3;

/// Characters of the similar-features note folded into the similarity hash.
const SIMILARITY_PREFIX_CHARS: usize = 50;

const BUG_KEYWORDS: &[&str] = &[
    "bug", "error", "crash", "broken", "fails", "failure", "exception", "incorrect", "regression",
    "not working",
];
const FEATURE_KEYWORDS: &[&str] = &[
    "feature", "add", "new", "enhancement", "improve", "support for", "ability to", "request",
    "would like",
];
const BUG_LABELS: &[&str] = &["bug", "defect", "regression"];
const FEATURE_LABELS: &[&str] = &["feature", "enhancement", "feature-request", "improvement"];

static BUG_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r"\b(does ?n[o']t|cannot|can't|won't)\s+\w+",
        r"\bsteps to reproduce\b",
        r"\b(expected|actual)\s+(result|behaviou?r)\b",
        r"\b(status|error)\s+code\s+\d{3}\b",
    ]
    .iter()
    .map(|p| Regex::new(p).expect("Invalid bug pattern"))
    .collect()
});

static FEATURE_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r"\bas an? \w+,? i want\b",
        r"\b(it would be|would be) (nice|great|helpful)\b",
        r"\b(allow|enable|let)\s+(users?|admins?|customers?)\s+to\b",
        r"\badd\s+(a|an|the)?\s*\w+",
    ]
    .iter()
    .map(|p| Regex::new(p).expect("Invalid feature pattern"))
    .collect()
});

/// Scores bug vs feature signals independently; ties go to Feature.
pub fn classify_ticket(ticket: &Ticket) -> Classification {
    let text = ticket.search_text();
    let labels: Vec<String> = ticket.labels.iter().map(|l| l.to_lowercase()).collect();

    let bug = signal_score(&text, &labels, BUG_KEYWORDS, &BUG_PATTERNS, BUG_LABELS);
    let feature = signal_score(
        &text,
        &labels,
        FEATURE_KEYWORDS,
        &FEATURE_PATTERNS,
        FEATURE_LABELS,
    );

    if bug > feature {
        Classification::Bug
    } else {
        Classification::Feature
    }
}

fn signal_score(
    text: &str,
    labels: &[String],
    keywords: &[&str],
    patterns: &[Regex],
    label_set: &[&str],
) -> u32 {
    let keyword_hits = keywords.iter().filter(|k| text.contains(**k)).count() as u32;
    let pattern_hits = patterns.iter().filter(|p| p.is_match(text)).count() as u32;
    let label_hits = labels
        .iter()
        .filter(|l| label_set.contains(&l.as_str()))
        .count() as u32;

    keyword_hits * KEYWORD_WEIGHT + pattern_hits * PATTERN_WEIGHT + label_hits * LABEL_WEIGHT
}

/// Java-style 32-bit rolling hash (`h = h * 31 + c`), stable across runs and platforms.
pub fn rolling_hash(input: &str) -> i32 {
    input
        .chars()
        .fold(0i32, |h, c| h.wrapping_mul(31).wrapping_add(c as i32))
}

/// Buckets tickets that touch related functionality: theme plus the start of the
/// similar-features note, hashed and rendered as `SIM-0000000000`.
pub fn similarity_group(theme: &str, similar_features: &str) -> String {
    let prefix: String = similar_features
        .chars()
        .take(SIMILARITY_PREFIX_CHARS)
        .collect();
    let hash = rolling_hash(&format!("{theme}{prefix}"));
    format!("SIM-{:010}", hash.unsigned_abs())
}

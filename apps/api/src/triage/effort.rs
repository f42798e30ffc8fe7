//! Effort estimation: keyword/pattern scoring over ticket text. No LLM call.
//!
//! Each size bucket scores keyword hits (10), regex hits (15) and component hits (5).
//! The best bucket wins; override rules for severe bugs and security work run afterwards.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::triage::models::{EffortEstimate, EffortSize, Ticket};

const KEYWORD_WEIGHT: u32 = 10;
const PATTERN_WEIGHT: u32 = 15;
const COMPONENT_WEIGHT: u32 = 5;

struct BucketSignals {
    size: EffortSize,
    keywords: &'static [&'static str],
    patterns: Vec<Regex>,
    components: &'static [&'static str],
}

fn compile(patterns: &[&str]) -> Vec<Regex> {
    patterns
        .iter()
        .map(|p| Regex::new(p).expect("Invalid effort pattern"))
        .collect()
}

static BUCKETS: Lazy<Vec<BucketSignals>> = Lazy::new(|| {
    vec![
        BucketSignals {
            size: EffortSize::XS,
            keywords: &[
                "typo", "wording", "copy change", "tooltip", "rename", "spelling", "colour",
                "color", "toggle", "placeholder",
            ],
            patterns: compile(&[
                r"\b(change|update|fix)\s+(the\s+)?(text|label|copy|wording|title)\b",
                r"\b(hide|show)\s+(the\s+)?\w+\s+(button|link|icon)\b",
            ]),
            components: &["documentation", "content"],
        },
        BucketSignals {
            size: EffortSize::S,
            keywords: &[
                "dark mode", "preference", "setting", "filter", "sort", "icon", "dropdown",
                "checkbox", "export to csv", "default value",
            ],
            patterns: compile(&[
                r"\badd\b.*\b(button|option|toggle|field|column|setting|filter)\b",
                r"\b(allow|let)\s+users?\s+to\s+(choose|select|sort|filter)\b",
            ]),
            components: &["ui", "frontend", "settings"],
        },
        BucketSignals {
            size: EffortSize::M,
            keywords: &[
                "integration", "workflow", "report", "dashboard", "notification", "endpoint",
                "import", "validation", "search", "bulk",
            ],
            patterns: compile(&[
                r"\b(new|add|build)\s+(a\s+)?\w*\s*(report|dashboard|page|screen|wizard)\b",
                r"\bintegrat(e|ion)\s+with\b",
            ]),
            components: &["backend", "api", "reporting"],
        },
        BucketSignals {
            size: EffortSize::L,
            keywords: &[
                "redesign", "migration", "refactor", "multi-tenant", "permissions",
                "role-based", "overhaul", "new module", "performance", "scalability",
            ],
            patterns: compile(&[
                r"\b(re-?architect|re-?design|re-?write)\w*\b",
                r"\bacross\s+(all|multiple|every)\b",
            ]),
            components: &["database", "infrastructure", "platform"],
        },
        BucketSignals {
            size: EffortSize::XL,
            keywords: &[
                "rewrite", "architecture", "new product", "machine learning", "ai-powered",
                "real-time sync", "microservice", "offline mode",
            ],
            patterns: compile(&[
                r"\b(complete|full|entire)\s+(rewrite|overhaul|rebuild)\b",
                r"\bfrom\s+scratch\b",
            ]),
            components: &["core", "architecture"],
        },
    ]
});

const BUG_WORDS: &[&str] = &["bug", "fix", "defect", "broken"];
const SEVERITY_WORDS: &[&str] = &[
    "critical", "crash", "outage", "data loss", "blocker", "urgent", "production down",
];
const SECURITY_WORDS: &[&str] = &[
    "security", "vulnerability", "compliance", "gdpr", "hipaa", "soc 2", "audit", "encryption",
];

/// Estimates implementation effort from ticket content alone.
pub fn estimate_effort(ticket: &Ticket) -> EffortEstimate {
    let text = ticket.search_text();
    let components = ticket.components_lower();

    let mut best: Option<(EffortSize, u32, Vec<String>)> = None;
    for bucket in BUCKETS.iter() {
        let (score, signals) = score_bucket(bucket, &text, &components);
        // Strictly greater keeps the smaller bucket on ties.
        if score > 0 && best.as_ref().map_or(true, |(_, s, _)| score > *s) {
            best = Some((bucket.size, score, signals));
        }
    }

    let (mut size, mut reasoning) = match best {
        Some((size, score, signals)) => (
            size,
            format!("Scored {score} for {size}: {}", signals.join(", ")),
        ),
        None => (
            EffortSize::M,
            "No sizing signals found; defaulting to M".to_string(),
        ),
    };

    let is_bug = BUG_WORDS.iter().any(|w| contains_word(&text, w));
    if is_bug {
        if let Some(severity) = SEVERITY_WORDS.iter().find(|w| text.contains(**w)) {
            size = EffortSize::M;
            reasoning.push_str(&format!(
                "; override: severe defect ('{severity}') sized M for investigation and regression testing"
            ));
        }
    }

    if let Some(word) = SECURITY_WORDS.iter().find(|w| text.contains(**w)) {
        if size < EffortSize::L {
            size = EffortSize::L;
            reasoning.push_str(&format!(
                "; override: security/compliance work ('{word}') raised to L"
            ));
        }
    }

    EffortEstimate {
        size,
        score: size.score(),
        reasoning,
        description: size.description().to_string(),
    }
}

fn score_bucket(bucket: &BucketSignals, text: &str, components: &[String]) -> (u32, Vec<String>) {
    let mut score = 0;
    let mut signals = Vec::new();

    for kw in bucket.keywords {
        if text.contains(kw) {
            score += KEYWORD_WEIGHT;
            signals.push(format!("keyword '{kw}'"));
        }
    }
    for pattern in &bucket.patterns {
        if pattern.is_match(text) {
            score += PATTERN_WEIGHT;
            signals.push(format!("pattern /{}/", pattern.as_str()));
        }
    }
    for component in bucket.components {
        if components.iter().any(|c| c == component) {
            score += COMPONENT_WEIGHT;
            signals.push(format!("component '{component}'"));
        }
    }

    (score, signals)
}

/// Whole-word match so "fix" does not fire on "prefix".
fn contains_word(text: &str, word: &str) -> bool {
    text.split(|c: char| !c.is_alphanumeric())
        .any(|token| token == word)
}

// Triage LLM prompt builders.
// Both prompts are pure functions of the ticket and the locally inferred context.

use crate::triage::models::{EffortEstimate, EffortSize, Ticket, THEME_NOT_IDENTIFIED};
use crate::triage::product::ProductContext;

const UNKNOWN: &str = "Unknown";
const NONE: &str = "None";
const RESPONSE_HEADER: &str = "\n\nRespond with a JSON object in EXACTLY this shape, with your own values:\n";
const RESPONSE_FOOTER: &str = "\n\nReturn ONLY the JSON object.";

/// Example reply the scoring model must imitate. Must stay valid JSON.
const ANALYSIS_JSON_EXAMPLE: &str = r#"{
  "scores": {
    "business_impact": 75,
    "effort_size": "M",
    "effort_score": 60,
    "strategic_fit": 70,
    "cross_client_value": 65,
    "overall_priority": 69
  },
  "priority_recommendation": "Standard",
  "key_insights": ["Requested by several accounts in the last quarter"],
  "risks": ["Touches the export pipeline shared with reporting"],
  "opportunities": ["Reduces manual work for account managers"],
  "next_steps": ["Confirm scope with design", "Schedule for the next planning cycle"],
  "similar_features": "CSV export on the reports page",
  "executive_summary": "Moderate-value improvement with medium effort.",
  "on_hold_reasoning": null
}"#;

const SCORING_RUBRIC: &str = "\
SCORING RUBRIC (each dimension is an integer 0-100):
- business_impact (weight 35%): revenue, retention and user value if delivered
- strategic_fit (weight 25%): alignment with the product's direction and capabilities
- cross_client_value (weight 25%): how many customers benefit, not just the reporter
- effort (weight 15%, inverse): effort_score is 100 for XS down to 20 for XL

effort_size must be one of \"XS\", \"S\", \"M\", \"L\", \"XL\".

overall_priority = round(0.35*business_impact + 0.25*strategic_fit + 0.25*cross_client_value + 0.15*effort_score)

PRIORITY RECOMMENDATION (from overall_priority), one of:
- >= 80: \"Fast Track\"
- >= 50: \"Standard\"
- >= 25: \"On Hold\"
- < 25: \"Low\"

on_hold_reasoning is a string when the recommendation is \"On Hold\", otherwise null.
All list fields are arrays of strings.";

/// Builds the scoring prompt. Every missing field is rendered with an explicit placeholder.
pub fn build_analysis_prompt(
    ticket: &Ticket,
    context: &ProductContext,
    effort: &EffortEstimate,
) -> String {
    let knowledge = context.knowledge();
    let mut prompt = String::with_capacity(4096);

    prompt.push_str("Analyze the following ticket and score it for prioritization.\n\n");

    prompt.push_str("TICKET:\n");
    push_ticket_fields(&mut prompt, ticket);
    prompt.push_str(&format!(
        "Description:\n{}\n\n",
        text_or(ticket.description.as_deref(), UNKNOWN)
    ));

    prompt.push_str(&format!(
        "PRODUCT CONTEXT (detected: {}, confidence: {}):\n",
        context.product,
        context.confidence.as_str()
    ));
    prompt.push_str(&format!("Overview: {}\n", knowledge.overview));
    prompt.push_str("Capabilities:\n");
    for capability in knowledge.capabilities {
        prompt.push_str(&format!("- {capability}\n"));
    }
    prompt.push_str(&format!(
        "Relevant features: {}\n\n",
        list_or(knowledge.relevant_features.iter().copied(), NONE)
    ));

    prompt.push_str("EFFORT SIZES:\n");
    for size in EffortSize::ALL {
        prompt.push_str(&format!(
            "- {} (effort_score {}): {}\n",
            size,
            size.score(),
            size.description()
        ));
    }
    prompt.push_str(&format!(
        "Local estimate: {} ({})\n\n",
        effort.size, effort.reasoning
    ));

    prompt.push_str(SCORING_RUBRIC);
    prompt.push_str(RESPONSE_HEADER);
    prompt.push_str(ANALYSIS_JSON_EXAMPLE);
    prompt.push_str(RESPONSE_FOOTER);
    prompt
}

/// Builds the theme-classification prompt over the detected product's vocabulary.
pub fn build_theme_prompt(ticket: &Ticket, context: &ProductContext) -> String {
    let mut prompt = String::with_capacity(1024);

    prompt.push_str(&format!(
        "Classify this {} ticket into exactly one functional theme.\n\n",
        context.product
    ));
    prompt.push_str("TICKET:\n");
    push_ticket_fields(&mut prompt, ticket);
    prompt.push_str(&format!(
        "Description:\n{}\n\n",
        text_or(ticket.description.as_deref(), UNKNOWN)
    ));

    prompt.push_str("THEMES:\n");
    for theme in context.themes() {
        prompt.push_str(&format!("- {theme}\n"));
    }
    prompt.push_str(&format!(
        "\nAnswer with ONLY the theme name exactly as written above. \
         If none of the themes fit, answer with ONLY: {THEME_NOT_IDENTIFIED}\n\
         Do not add any other words."
    ));
    prompt
}

fn push_ticket_fields(prompt: &mut String, ticket: &Ticket) {
    prompt.push_str(&format!("Key: {}\n", ticket.key));
    prompt.push_str(&format!("Title: {}\n", text_or(ticket.title.as_deref(), UNKNOWN)));
    prompt.push_str(&format!(
        "Reporter: {}\n",
        text_or(ticket.reporter.as_deref(), UNKNOWN)
    ));
    prompt.push_str(&format!("Created: {}\n", text_or(ticket.created.as_deref(), UNKNOWN)));
    prompt.push_str(&format!(
        "Priority: {}\n",
        text_or(ticket.priority.as_deref(), UNKNOWN)
    ));
    prompt.push_str(&format!("Status: {}\n", text_or(ticket.status.as_deref(), UNKNOWN)));
    prompt.push_str(&format!(
        "Components: {}\n",
        list_or(ticket.components.iter().map(String::as_str), NONE)
    ));
    prompt.push_str(&format!(
        "Labels: {}\n",
        list_or(ticket.labels.iter().map(String::as_str), NONE)
    ));
}

fn text_or<'a>(value: Option<&'a str>, placeholder: &'a str) -> &'a str {
    match value.map(str::trim) {
        Some(v) if !v.is_empty() => v,
        _ => placeholder,
    }
}

fn list_or<'a>(items: impl Iterator<Item = &'a str>, placeholder: &str) -> String {
    let joined = items.collect::<Vec<_>>().join(", ");
    if joined.is_empty() {
        placeholder.to_string()
    } else {
        joined
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::triage::effort::estimate_effort;
    use crate::triage::models::PriorityRecommendation;
    use crate::triage::parser::parse_analysis;
    use crate::triage::product::{detect_product, DetectionConfidence, Product};
    use crate::triage::scoring::recommendation_for;

    fn bare_ticket() -> Ticket {
        Ticket {
            key: "PROD-9".to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_missing_fields_use_placeholders() {
        let ticket = bare_ticket();
        let ctx = detect_product(&ticket);
        let prompt = build_analysis_prompt(&ticket, &ctx, &estimate_effort(&ticket));
        assert!(prompt.contains("Title: Unknown"));
        assert!(prompt.contains("Reporter: Unknown"));
        assert!(prompt.contains("Components: None"));
        assert!(prompt.contains("Labels: None"));
        assert!(prompt.contains("Description:\nUnknown"));
    }

    #[test]
    fn test_analysis_prompt_embeds_rubric_and_contract() {
        let ticket = Ticket {
            key: "PROD-10".to_string(),
            title: Some("Add invoice PDF download".to_string()),
            components: vec!["Billing".to_string()],
            ..Default::default()
        };
        let ctx = detect_product(&ticket);
        let prompt = build_analysis_prompt(&ticket, &ctx, &estimate_effort(&ticket));
        for needle in [
            "weight 35%",
            "weight 25%",
            "weight 15%",
            ">= 80: \"Fast Track\"",
            ">= 50: \"Standard\"",
            ">= 25: \"On Hold\"",
            "\"priority_recommendation\"",
            "XL (effort_score 20)",
            "detected: Billing, confidence: High",
            "Components: Billing",
        ] {
            assert!(prompt.contains(needle), "missing {needle}");
        }
    }

    #[test]
    fn test_analysis_prompt_is_deterministic() {
        let ticket = Ticket {
            key: "PROD-11".to_string(),
            title: Some("Dashboard export".to_string()),
            description: Some("Export charts to PDF".to_string()),
            ..Default::default()
        };
        let ctx = detect_product(&ticket);
        let effort = estimate_effort(&ticket);
        assert_eq!(
            build_analysis_prompt(&ticket, &ctx, &effort),
            build_analysis_prompt(&ticket, &ctx, &effort)
        );
    }

    #[test]
    fn test_embedded_example_is_accepted_by_parser() {
        let ticket = bare_ticket();
        let ctx = detect_product(&ticket);
        let prompt = build_analysis_prompt(&ticket, &ctx, &estimate_effort(&ticket));

        let start = prompt.find(RESPONSE_HEADER).unwrap() + RESPONSE_HEADER.len();
        let end = prompt.rfind(RESPONSE_FOOTER).unwrap();
        let example = &prompt[start..end];

        let parsed = parse_analysis(example).expect("example must parse");
        assert_eq!(parsed.scores.overall_priority, 69);
        assert_eq!(parsed.scores.effort_size, Some(EffortSize::M));
        assert_eq!(parsed.priority_recommendation, PriorityRecommendation::Standard);
        assert!(parsed.on_hold_reasoning.is_none());
        // The example is internally consistent with the rubric it sits under.
        assert_eq!(
            recommendation_for(parsed.scores.overall_priority),
            parsed.priority_recommendation
        );
    }

    #[test]
    fn test_theme_prompt_lists_vocabulary_and_sentinel() {
        let ctx = ProductContext {
            product: Product::Mobile,
            confidence: DetectionConfidence::High,
        };
        let prompt = build_theme_prompt(&bare_ticket(), &ctx);
        for theme in ctx.themes() {
            assert!(prompt.contains(&format!("- {theme}\n")));
        }
        assert!(prompt.contains(THEME_NOT_IDENTIFIED));
        assert!(prompt.contains("ONLY the theme name"));
    }
}

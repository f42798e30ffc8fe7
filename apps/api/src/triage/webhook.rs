//! Inbound webhook payload (Jira-shaped) and its mapping onto `Ticket`.

use serde::Deserialize;
use serde_json::Value;

use crate::triage::models::Ticket;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WebhookPayload {
    #[serde(default)]
    pub issue: Option<WebhookIssue>,
    #[serde(default)]
    pub webhook_event: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct WebhookIssue {
    #[serde(default)]
    pub key: Option<String>,
    #[serde(default)]
    pub fields: IssueFields,
}

#[derive(Debug, Default, Deserialize)]
pub struct IssueFields {
    #[serde(default)]
    pub summary: Option<String>,
    /// Plain text, or a rich-text document tree.
    #[serde(default)]
    pub description: Option<Value>,
    #[serde(default)]
    pub reporter: Option<NamedRef>,
    #[serde(default)]
    pub created: Option<String>,
    #[serde(default)]
    pub priority: Option<NamedRef>,
    #[serde(default)]
    pub components: Vec<NamedRef>,
    #[serde(default)]
    pub labels: Vec<String>,
    #[serde(default)]
    pub status: Option<NamedRef>,
}

/// `{ "name": ... }` or `{ "displayName": ... }` objects used throughout the issue payload.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NamedRef {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub display_name: Option<String>,
}

impl NamedRef {
    fn label(self) -> Option<String> {
        self.display_name.or(self.name).filter(|s| !s.trim().is_empty())
    }
}

impl WebhookPayload {
    pub fn into_ticket(self) -> Ticket {
        let issue = self.issue.unwrap_or_default();
        let fields = issue.fields;
        Ticket {
            key: issue.key.unwrap_or_default().trim().to_string(),
            title: fields.summary,
            description: fields.description.as_ref().and_then(flatten_description),
            reporter: fields.reporter.and_then(NamedRef::label),
            created: fields.created,
            priority: fields.priority.and_then(NamedRef::label),
            components: fields
                .components
                .into_iter()
                .filter_map(NamedRef::label)
                .collect(),
            labels: fields.labels,
            status: fields.status.and_then(NamedRef::label),
        }
    }
}

/// Renders a description as plain text. Document trees are flattened by joining
/// their `text` leaves, one block per line.
fn flatten_description(value: &Value) -> Option<String> {
    let text = match value {
        Value::String(s) => s.clone(),
        Value::Object(_) => {
            let mut out = String::new();
            collect_text(value, &mut out);
            out
        }
        _ => return None,
    };
    let text = text.trim().to_string();
    (!text.is_empty()).then_some(text)
}

fn collect_text(node: &Value, out: &mut String) {
    if let Some(text) = node.get("text").and_then(Value::as_str) {
        out.push_str(text);
    }
    if let Some(children) = node.get("content").and_then(Value::as_array) {
        for child in children {
            collect_text(child, out);
        }
        if matches!(
            node.get("type").and_then(Value::as_str),
            Some("paragraph" | "heading" | "listItem")
        ) {
            out.push('\n');
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_full_issue_maps_to_ticket() {
        let payload: WebhookPayload = serde_json::from_value(json!({
            "webhookEvent": "jira:issue_created",
            "issue": {
                "key": "PROD-42",
                "fields": {
                    "summary": "Add invoice PDF download",
                    "description": "Customers want PDFs",
                    "reporter": {"displayName": "Sam Lee"},
                    "created": "2026-01-05T10:00:00.000+0000",
                    "priority": {"name": "High"},
                    "components": [{"name": "Billing"}, {"name": ""}],
                    "labels": ["customer-request"],
                    "status": {"name": "Open"}
                }
            }
        }))
        .unwrap();
        assert_eq!(payload.webhook_event.as_deref(), Some("jira:issue_created"));

        let ticket = payload.into_ticket();
        assert_eq!(ticket.key, "PROD-42");
        assert_eq!(ticket.title.as_deref(), Some("Add invoice PDF download"));
        assert_eq!(ticket.reporter.as_deref(), Some("Sam Lee"));
        assert_eq!(ticket.priority.as_deref(), Some("High"));
        assert_eq!(ticket.components, vec!["Billing".to_string()]);
        assert_eq!(ticket.labels, vec!["customer-request".to_string()]);
        assert_eq!(ticket.status.as_deref(), Some("Open"));
    }

    #[test]
    fn test_missing_issue_yields_blank_key() {
        let payload: WebhookPayload = serde_json::from_value(json!({"webhookEvent": "x"})).unwrap();
        assert_eq!(payload.into_ticket().key, "");
    }

    #[test]
    fn test_document_description_is_flattened() {
        let payload: WebhookPayload = serde_json::from_value(json!({
            "issue": {
                "key": "PROD-43",
                "fields": {
                    "description": {
                        "type": "doc",
                        "content": [
                            {"type": "paragraph", "content": [{"type": "text", "text": "First line."}]},
                            {"type": "paragraph", "content": [
                                {"type": "text", "text": "Second "},
                                {"type": "text", "text": "line."}
                            ]}
                        ]
                    }
                }
            }
        }))
        .unwrap();
        let ticket = payload.into_ticket();
        assert_eq!(ticket.description.as_deref(), Some("First line.\nSecond line."));
    }

    #[test]
    fn test_blank_description_is_none() {
        assert_eq!(flatten_description(&json!("   ")), None);
        assert_eq!(flatten_description(&json!(null)), None);
    }
}

//! Product detection: priority-ordered substring checks mapping a ticket to a product line,
//! plus the static knowledge block and theme vocabulary each product contributes to prompts.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::triage::models::Ticket;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Product {
    Billing,
    Analytics,
    Integrations,
    Mobile,
    AdminConsole,
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum DetectionConfidence {
    Low,
    Medium,
    High,
}

impl DetectionConfidence {
    pub fn as_str(self) -> &'static str {
        match self {
            DetectionConfidence::Low => "Low",
            DetectionConfidence::Medium => "Medium",
            DetectionConfidence::High => "High",
        }
    }

    /// Confidence reported alongside a successful analysis.
    pub fn score(self) -> f64 {
        match self {
            DetectionConfidence::Low => 0.6,
            DetectionConfidence::Medium => 0.75,
            DetectionConfidence::High => 0.9,
        }
    }
}

/// Static product knowledge embedded verbatim in the scoring prompt.
#[derive(Debug)]
pub struct ProductKnowledge {
    pub overview: &'static str,
    pub capabilities: &'static [&'static str],
    pub relevant_features: &'static [&'static str],
    pub themes: &'static [&'static str],
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProductContext {
    pub product: Product,
    pub confidence: DetectionConfidence,
}

impl ProductContext {
    pub fn knowledge(&self) -> &'static ProductKnowledge {
        self.product.knowledge()
    }

    pub fn themes(&self) -> &'static [&'static str] {
        self.product.knowledge().themes
    }
}

/// Detection order matters: the first product whose markers match wins.
const DETECTION_ORDER: &[(Product, &[&str])] = &[
    (
        Product::Billing,
        &["billing", "invoice", "payment", "subscription", "refund", "pricing"],
    ),
    (
        Product::Analytics,
        &["analytics", "dashboard", "report", "chart", "metric", "kpi"],
    ),
    (
        Product::Integrations,
        &["integration", "webhook", "api", "sso", "salesforce", "slack", "zapier"],
    ),
    (
        Product::Mobile,
        &["mobile", "ios", "android", "push notification", "tablet"],
    ),
    (
        Product::AdminConsole,
        &["admin", "permission", "role", "user management", "audit log", "tenant"],
    ),
];

impl Product {
    pub fn name(self) -> &'static str {
        match self {
            Product::Billing => "Billing",
            Product::Analytics => "Analytics",
            Product::Integrations => "Integrations",
            Product::Mobile => "Mobile",
            Product::AdminConsole => "Admin Console",
            Product::Unknown => "Unknown",
        }
    }

    pub fn knowledge(self) -> &'static ProductKnowledge {
        match self {
            Product::Billing => &BILLING,
            Product::Analytics => &ANALYTICS,
            Product::Integrations => &INTEGRATIONS,
            Product::Mobile => &MOBILE,
            Product::AdminConsole => &ADMIN_CONSOLE,
            Product::Unknown => &GENERAL,
        }
    }
}

impl fmt::Display for Product {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Detects the product line. Components are the strongest signal, then the title,
/// then description and labels.
pub fn detect_product(ticket: &Ticket) -> ProductContext {
    let components = ticket.components_lower().join(" ");
    let title = ticket.title.as_deref().unwrap_or_default().to_lowercase();
    let body = ticket.search_text();

    let sources = [
        (components.as_str(), DetectionConfidence::High),
        (title.as_str(), DetectionConfidence::Medium),
        (body.as_str(), DetectionConfidence::Low),
    ];

    for (haystack, confidence) in sources {
        if haystack.is_empty() {
            continue;
        }
        for (product, markers) in DETECTION_ORDER {
            if markers.iter().any(|m| haystack.contains(m)) {
                return ProductContext {
                    product: *product,
                    confidence,
                };
            }
        }
    }

    ProductContext {
        product: Product::Unknown,
        confidence: DetectionConfidence::Low,
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Knowledge blocks
// ────────────────────────────────────────────────────────────────────────────

static BILLING: ProductKnowledge = ProductKnowledge {
    overview: "Subscription billing for B2B customers: plans, invoices, payments and revenue reporting.",
    capabilities: &[
        "Plan and price catalogue with tiered and usage-based pricing",
        "Automated invoice generation and dunning",
        "Card, ACH and wire payment collection",
        "Credit notes, refunds and proration",
    ],
    relevant_features: &["Invoice templates", "Payment retry schedules", "Tax calculation"],
    themes: &[
        "Invoicing",
        "Payments",
        "Subscriptions & Plans",
        "Tax & Compliance",
        "Revenue Reporting",
    ],
};

static ANALYTICS: ProductKnowledge = ProductKnowledge {
    overview: "Self-serve analytics: dashboards, scheduled reports and metric definitions shared across teams.",
    capabilities: &[
        "Drag-and-drop dashboard builder",
        "Scheduled report delivery by email",
        "Governed metric layer",
        "CSV and PDF export",
    ],
    relevant_features: &["Dashboard filters", "Report scheduling", "Chart library"],
    themes: &[
        "Dashboards",
        "Reports & Exports",
        "Data Visualization",
        "Metrics & KPIs",
        "Data Quality",
    ],
};

static INTEGRATIONS: ProductKnowledge = ProductKnowledge {
    overview: "Connectors and APIs that move data between the platform and customer systems.",
    capabilities: &[
        "REST API with webhooks",
        "Prebuilt CRM and chat connectors",
        "SAML and OIDC single sign-on",
        "Field mapping and sync scheduling",
    ],
    relevant_features: &["Webhook retries", "Connector marketplace", "API rate limits"],
    themes: &[
        "Public API",
        "Webhooks",
        "Third-Party Connectors",
        "Authentication & SSO",
        "Data Sync",
    ],
};

static MOBILE: ProductKnowledge = ProductKnowledge {
    overview: "Native iOS and Android apps giving field users access to core workflows.",
    capabilities: &[
        "Offline-capable task lists",
        "Push notifications",
        "Biometric login",
        "Camera capture and attachments",
    ],
    relevant_features: &["Notification preferences", "Offline sync", "App theming"],
    themes: &[
        "Mobile Navigation",
        "Notifications",
        "Offline Support",
        "Mobile Performance",
        "Device Features",
    ],
};

static ADMIN_CONSOLE: ProductKnowledge = ProductKnowledge {
    overview: "Administration console for tenant owners: users, roles, security policy and audit.",
    capabilities: &[
        "User provisioning and deactivation",
        "Role-based access control",
        "Audit log search and export",
        "Tenant-wide security policies",
    ],
    relevant_features: &["Custom roles", "SCIM provisioning", "Session policies"],
    themes: &[
        "User Management",
        "Roles & Permissions",
        "Audit & Security",
        "Tenant Configuration",
    ],
};

static GENERAL: ProductKnowledge = ProductKnowledge {
    overview: "Product line could not be determined; evaluate against the platform as a whole.",
    capabilities: &["Core workflow management", "Collaboration", "Configuration"],
    relevant_features: &[],
    themes: &[
        "User Experience",
        "Performance",
        "Reporting",
        "Integrations",
        "Security",
        "Workflow Automation",
    ],
};

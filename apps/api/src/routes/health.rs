use axum::{extract::State, http::StatusCode, Json};
use chrono::Utc;
use serde_json::{json, Value};

use crate::config::Config;
use crate::state::AppState;

/// GET /health
/// Reports backend credential availability. Degraded (503) when either key is missing.
pub async fn health_handler(State(state): State<AppState>) -> (StatusCode, Json<Value>) {
    let gemini = &state.config.gemini_api_key;
    let claude = &state.config.anthropic_api_key;
    let healthy = gemini.is_some() && claude.is_some();

    let status = if healthy {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (
        status,
        Json(json!({
            "status": if healthy { "healthy" } else { "degraded" },
            "timestamp": Utc::now().to_rfc3339(),
            "version": env!("CARGO_PKG_VERSION"),
            "services": {
                "gemini": {
                    "available": gemini.is_some(),
                    "keyLength": Config::key_length(gemini),
                },
                "claude": {
                    "available": claude.is_some(),
                    "keyLength": Config::key_length(claude),
                },
            }
        })),
    )
}

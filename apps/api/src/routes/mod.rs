pub mod health;

use std::net::SocketAddr;

use axum::{
    extract::{ConnectInfo, Request, State},
    middleware::{self, Next},
    response::Response,
    routing::{get, post},
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::warn;

use crate::errors::AppError;
use crate::state::AppState;
use crate::triage::handlers;

async fn not_found(request: Request) -> AppError {
    AppError::NotFound(format!("No route for {}", request.uri().path()))
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        .route(
            "/triage",
            post(handlers::handle_triage).route_layer(middleware::from_fn_with_state(
                state.clone(),
                rate_limit,
            )),
        )
        .fallback(not_found)
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

/// Rejects a client that exceeded its per-minute cap. Skipped when rate limiting is off.
async fn rate_limit(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    if state.config.rate_limit_enabled {
        let key = client_key(&request);
        if !state.rate_limiter.allow(&key) {
            warn!("Rate limit exceeded for {key}");
            return Err(AppError::RateLimited {
                retry_after: state.rate_limiter.window().as_secs(),
            });
        }
    }
    Ok(next.run(request).await)
}

/// First `X-Forwarded-For` hop, else the socket peer, else "unknown".
fn client_key(request: &Request) -> String {
    request
        .headers()
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .or_else(|| {
            request
                .extensions()
                .get::<ConnectInfo<SocketAddr>>()
                .map(|ConnectInfo(addr)| addr.ip().to_string())
        })
        .unwrap_or_else(|| "unknown".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::time::Duration;

    use axum::body::{to_bytes, Body};
    use axum::http::{header, Method, StatusCode};
    use serde_json::{json, Value};
    use axum::http::Request;
    use tower::ServiceExt;

    use crate::config::Config;
    use crate::llm_client::LlmProvider;
    use crate::triage::dispatcher::tests::FakeProvider;
    use crate::triage::dispatcher::Dispatcher;
    use crate::triage::orchestrator::Orchestrator;

    const ANALYSIS_REPLY: &str = r#"{"scores": {"business_impact": 60, "strategic_fit": 50, "cross_client_value": 40}, "priority_recommendation": "Standard", "executive_summary": "Worth doing next quarter."}"#;

    fn state_with(config: Config, provider: Option<Arc<FakeProvider>>) -> AppState {
        let dispatcher = Dispatcher::new(
            provider.map(|p| p as Arc<dyn LlmProvider>),
            None,
            Duration::from_secs(5),
        );
        AppState::new(config, Orchestrator::new(dispatcher))
    }

    fn triage_request(body: Value) -> Request<Body> {
        Request::builder()
            .method(Method::POST)
            .uri("/triage")
            .header(header::CONTENT_TYPE, "application/json")
            .header("x-forwarded-for", "203.0.113.7, 10.0.0.1")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn body_json(response: Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_triage_success_envelope() {
        let app = build_router(state_with(
            Config::default(),
            Some(FakeProvider::ok("gemini", ANALYSIS_REPLY)),
        ));
        let response = app
            .oneshot(triage_request(json!({
                "webhookEvent": "jira:issue_created",
                "issue": {"key": "PROD-7", "fields": {"summary": "Add export button"}}
            })))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["status"], "success");
        assert_eq!(body["issueKey"], "PROD-7");
        assert_eq!(body["recommendation"], "Standard");
        assert_eq!(body["classification"], "Feature");
        assert_eq!(body["notes"], "Worth doing next quarter.");
        assert_eq!(body["duplicate_keys"], json!([]));
        // Theme reply is not in the vocabulary, so the sentinel is used.
        assert_eq!(body["themes"], json!(["THEME NOT IDENTIFIED"]));
        assert!(body["importance"].as_u64().unwrap() <= 100);
        assert!(body["requestId"].as_str().is_some());
        assert!(body["result"]["analysis"]["scores"]["overall_priority"].is_u64());
    }

    #[tokio::test]
    async fn test_triage_degraded_when_no_backend() {
        let app = build_router(state_with(Config::default(), None));
        let response = app
            .oneshot(triage_request(json!({"issue": {"key": "PROD-8"}})))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["status"], "degraded");
        assert_eq!(body["recommendation"], "On Hold");
        assert_eq!(body["confidence"], 0.0);
        assert_eq!(body["importance"], 0);
        let failures = &body["result"]["analysis_failures"];
        assert_eq!(failures[0]["provider"], "gemini");
        assert_eq!(failures[1]["reason"], "Provider 'claude' is not configured");
    }

    #[tokio::test]
    async fn test_triage_missing_key_is_request_error() {
        let app = build_router(state_with(Config::default(), None));
        let response = app
            .oneshot(triage_request(json!({"issue": {"fields": {"summary": "x"}}})))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = body_json(response).await;
        assert_eq!(body["status"], "error");
        assert_eq!(body["error"], "Missing issue key");
        assert!(body["requestId"].as_str().is_some());
    }

    #[tokio::test]
    async fn test_triage_malformed_body_is_request_error() {
        let app = build_router(state_with(Config::default(), None));
        let request = Request::builder()
            .method(Method::POST)
            .uri("/triage")
            .body(Body::from("{not json"))
            .unwrap();
        let response = app.oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = body_json(response).await;
        assert_eq!(body["status"], "error");
    }

    #[tokio::test]
    async fn test_rate_limit_rejects_over_cap() {
        let config = Config {
            rate_limit_max_requests: 1,
            ..Config::default()
        };
        let app = build_router(state_with(config, None));

        let first = app
            .clone()
            .oneshot(triage_request(json!({"issue": {"key": "PROD-1"}})))
            .await
            .unwrap();
        assert_eq!(first.status(), StatusCode::OK);

        let second = app
            .oneshot(triage_request(json!({"issue": {"key": "PROD-1"}})))
            .await
            .unwrap();
        assert_eq!(second.status(), StatusCode::TOO_MANY_REQUESTS);
        let body = body_json(second).await;
        assert_eq!(body["retryAfter"], 60);
    }

    #[tokio::test]
    async fn test_rate_limit_disabled() {
        let config = Config {
            rate_limit_enabled: false,
            rate_limit_max_requests: 1,
            ..Config::default()
        };
        let app = build_router(state_with(config, None));
        for _ in 0..3 {
            let response = app
                .clone()
                .oneshot(triage_request(json!({"issue": {"key": "PROD-1"}})))
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::OK);
        }
    }

    #[tokio::test]
    async fn test_health_degraded_without_keys() {
        let app = build_router(state_with(Config::default(), None));
        let request = Request::builder()
            .uri("/health")
            .body(Body::empty())
            .unwrap();
        let response = app.oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
        let body = body_json(response).await;
        assert_eq!(body["status"], "degraded");
        assert_eq!(body["services"]["gemini"]["available"], false);
        assert_eq!(body["services"]["claude"]["keyLength"], 0);
    }

    #[tokio::test]
    async fn test_health_ok_with_both_keys() {
        let config = Config {
            gemini_api_key: Some("g".repeat(39)),
            anthropic_api_key: Some("a".repeat(108)),
            ..Config::default()
        };
        let app = build_router(state_with(config, None));
        let request = Request::builder()
            .uri("/health")
            .body(Body::empty())
            .unwrap();
        let response = app.oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["status"], "healthy");
        assert_eq!(body["services"]["gemini"]["keyLength"], 39);
        assert_eq!(body["services"]["claude"]["keyLength"], 108);
    }

    #[tokio::test]
    async fn test_cors_preflight_is_answered() {
        let app = build_router(state_with(Config::default(), None));
        let request = Request::builder()
            .method(Method::OPTIONS)
            .uri("/triage")
            .header(header::ORIGIN, "https://example.com")
            .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
            .body(Body::empty())
            .unwrap();
        let response = app.oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN], "*");
    }

    #[tokio::test]
    async fn test_unknown_route_is_not_found() {
        let app = build_router(state_with(Config::default(), None));
        let request = Request::builder()
            .uri("/nope")
            .body(Body::empty())
            .unwrap();
        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}

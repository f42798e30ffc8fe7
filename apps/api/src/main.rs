mod config;
mod errors;
mod llm_client;
mod rate_limit;
mod routes;
mod state;
mod triage;

use anyhow::Result;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::llm_client::{ClaudeClient, GeminiClient, LlmProvider};
use crate::routes::build_router;
use crate::state::AppState;
use crate::triage::dispatcher::Dispatcher;
use crate::triage::orchestrator::Orchestrator;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on malformed numeric/bool env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_PKG_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting triage service v{}", env!("CARGO_PKG_VERSION"));

    // Initialize LLM providers; a missing key leaves that slot empty
    let gemini: Option<Arc<dyn LlmProvider>> = match config.gemini_api_key.clone() {
        Some(key) => {
            info!("Gemini provider initialized (model: {})", llm_client::gemini::MODEL);
            Some(Arc::new(GeminiClient::new(key)?))
        }
        None => {
            warn!("GEMINI_API_KEY not set: primary backend disabled");
            None
        }
    };
    let claude: Option<Arc<dyn LlmProvider>> = match config.anthropic_api_key.clone() {
        Some(key) => {
            info!("Claude provider initialized (model: {})", llm_client::claude::MODEL);
            Some(Arc::new(ClaudeClient::new(key)?))
        }
        None => {
            warn!("ANTHROPIC_API_KEY not set: secondary backend disabled");
            None
        }
    };

    let dispatcher =
        Dispatcher::new(gemini, claude, config.backend_timeout).verbose(config.verbose_logging);
    info!(
        "Rate limiting {} ({} requests/min), backend timeout {}s",
        if config.rate_limit_enabled { "enabled" } else { "disabled" },
        config.rate_limit_max_requests,
        config.backend_timeout.as_secs()
    );

    // Build app state
    let state = AppState::new(config.clone(), Orchestrator::new(dispatcher));

    // Build router (tracing and CORS layers are attached inside)
    let app = build_router(state);

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}

use std::sync::Arc;

use crate::config::Config;
use crate::rate_limit::RateLimiter;
use crate::triage::orchestrator::Orchestrator;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub orchestrator: Arc<Orchestrator>,
    /// One limiter per process; consulted only when `config.rate_limit_enabled`.
    pub rate_limiter: Arc<RateLimiter>,
}

impl AppState {
    pub fn new(config: Config, orchestrator: Orchestrator) -> Self {
        let rate_limiter = Arc::new(RateLimiter::per_minute(config.rate_limit_max_requests));
        Self {
            config,
            orchestrator: Arc::new(orchestrator),
            rate_limiter,
        }
    }
}

//! Application state shared across handlers

use crate::config::Settings;
use crate::orchestrator::Orchestrator;
use chrono::{DateTime, Utc};
use governor::{DefaultDirectRateLimiter, Quota, RateLimiter};
use std::num::NonZeroU32;
use std::sync::Arc;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// Global settings
    pub settings: Arc<Settings>,
    /// Query orchestrator
    pub orchestrator: Arc<Orchestrator>,
    /// Limiter for incoming queries
    limiter: Arc<DefaultDirectRateLimiter>,
    /// Server start time
    started_at: DateTime<Utc>,
}

impl AppState {
    /// Create new application state
    pub fn new(settings: Settings, orchestrator: Orchestrator) -> Self {
        let per_minute =
            NonZeroU32::new(settings.server.rate_limit_per_minute).unwrap_or(NonZeroU32::MIN);

        Self {
            settings: Arc::new(settings),
            orchestrator: Arc::new(orchestrator),
            limiter: Arc::new(RateLimiter::direct(Quota::per_minute(per_minute))),
            started_at: Utc::now(),
        }
    }

    /// Get instance name
    pub fn instance_name(&self) -> &str {
        &self.settings.general.instance_name
    }

    /// Take one query from the rate limit budget; false when exhausted
    pub fn try_acquire(&self) -> bool {
        self.limiter.check().is_ok()
    }

    pub fn uptime_seconds(&self) -> i64 {
        (Utc::now() - self.started_at).num_seconds()
    }
}

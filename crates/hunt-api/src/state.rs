//! Application state shared across handlers.

use hunt_core::db::DbPool;
use hunt_core::RateLimitPolicy;
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::Arc;
use tracing::info;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub db: Arc<DbPool>,
    /// Failed-claim window and threshold, used for enforcement and display.
    pub rate_limit: RateLimitPolicy,
    /// Whether the session cookie carries the `Secure` attribute.
    pub secure_cookies: bool,
    /// Prometheus metrics handle for rendering metrics.
    pub prometheus_handle: Option<Arc<PrometheusHandle>>,
}

impl AppState {
    /// Creates a new application state with the default rate limit.
    pub fn new(db: DbPool) -> Self {
        Self {
            db: Arc::new(db),
            rate_limit: RateLimitPolicy::default(),
            secure_cookies: false,
            prometheus_handle: None,
        }
    }

    /// Replaces the claim rate-limit policy.
    pub fn with_rate_limit(mut self, policy: RateLimitPolicy) -> Self {
        info!(
            window_minutes = policy.window.num_minutes(),
            max_failed_attempts = policy.max_failed_attempts,
            "Claim rate limit configured"
        );
        self.rate_limit = policy;
        self
    }

    /// Marks the session cookie `Secure`, for deployments behind TLS.
    pub fn with_secure_cookies(mut self, secure: bool) -> Self {
        self.secure_cookies = secure;
        self
    }

    /// Creates a new application state with Prometheus handle.
    pub fn with_prometheus_handle(mut self, handle: PrometheusHandle) -> Self {
        self.prometheus_handle = Some(Arc::new(handle));
        self
    }
}

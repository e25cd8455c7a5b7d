//! API server implementation.

use axum::{middleware, routing::get, Json, Router};
use std::future::Future;
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tokio::signal;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::trace::TraceLayer;
use tracing::{error, info};
use utoipa::OpenApi;

use crate::dto::*;
use crate::error::ErrorResponse;
use crate::middleware::{cors_layer, request_id, request_logging, security_headers};
use crate::routes;
use crate::state::AppState;

/// API server configuration.
#[derive(Debug, Clone)]
pub struct ApiServerConfig {
    /// Address to bind to.
    pub bind_address: SocketAddr,
    /// Serve the OpenAPI document at `/api-docs/openapi.json`.
    pub enable_docs: bool,
    /// Origins allowed to call the API with credentials.
    pub cors_origins: Vec<String>,
}

impl Default for ApiServerConfig {
    fn default() -> Self {
        Self {
            bind_address: SocketAddr::from(([0, 0, 0, 0], 8080)),
            enable_docs: true,
            cors_origins: Vec::new(),
        }
    }
}

/// OpenAPI documentation.
#[derive(OpenApi)]
#[openapi(
    paths(
        crate::routes::health::health_check,
        crate::routes::health::liveness_check,
        crate::routes::metrics::prometheus_metrics,
        crate::routes::auth::login,
        crate::routes::auth::logout,
        crate::routes::auth::me,
        crate::routes::hunt_items::list_hunt_items,
        crate::routes::hunt_items::create_hunt_item,
        crate::routes::hunt_items::update_hunt_item,
        crate::routes::hunt_items::delete_hunt_item,
        crate::routes::claim_attempts::list_claim_attempts,
        crate::routes::claim_attempts::clear_claim_attempts,
        crate::routes::users::get_user,
        crate::routes::claims::claim_hunt_item,
        crate::routes::audit::list_audit_logs,
    ),
    components(
        schemas(
            HealthResponse,
            DatabaseHealth,
            SuccessResponse,
            LoginRequest,
            UserSummary,
            CurrentUserResponse,
            HuntItemResponse,
            HuntItemListResponse,
            HuntItemEnvelope,
            CreateHuntItemRequest,
            UpdateHuntItemRequest,
            ClaimAttemptResponse,
            UserClaimAttemptResponse,
            ClaimAttemptStatsResponse,
            ClaimAttemptsResponse,
            ClearClaimAttemptsRequest,
            ClearClaimAttemptsResponse,
            HistoryEntryResponse,
            RateLimitResponse,
            UserDetail,
            UserDetailResponse,
            ClaimRequest,
            ClaimResponse,
            AuditLogResponse,
            AuditLogsResponse,
            ErrorResponse,
        )
    ),
    tags(
        (name = "Health", description = "Health check endpoints"),
        (name = "Metrics", description = "Prometheus metrics"),
        (name = "Auth", description = "Session login and logout"),
        (name = "Hunt Items", description = "Hunt item management"),
        (name = "Claim Attempts", description = "Claim attempt monitoring and rate-limit resets"),
        (name = "Users", description = "Per-user claim history"),
        (name = "Claims", description = "Hunt item redemption"),
        (name = "Audit", description = "Admin audit trail"),
    ),
    info(
        title = "Hunt HQ API",
        version = "0.1.0",
        description = "Admin backend for scavenger hunts",
        license(name = "MIT"),
    )
)]
pub struct ApiDoc;

/// API server.
pub struct ApiServer {
    config: ApiServerConfig,
    state: AppState,
}

impl ApiServer {
    /// Creates a new API server.
    pub fn new(state: AppState, config: ApiServerConfig) -> Self {
        Self { config, state }
    }

    /// Creates a new API server with default configuration.
    pub fn with_state(state: AppState) -> Self {
        Self::new(state, ApiServerConfig::default())
    }

    /// Builds the router with all middleware applied.
    pub fn router(&self) -> Router {
        routes::health::init_start_time();

        let mut app = routes::create_router(self.state.clone());

        if self.config.enable_docs {
            app = app.route(
                "/api-docs/openapi.json",
                get(|| async { Json(ApiDoc::openapi()) }),
            );
        }

        // Innermost first
        app.layer(middleware::from_fn(security_headers))
            .layer(middleware::from_fn(request_logging))
            .layer(middleware::from_fn(request_id))
            .layer(TraceLayer::new_for_http())
            .layer(cors_layer(&self.config.cors_origins))
            .layer(CatchPanicLayer::new())
    }

    /// Runs the server until Ctrl+C or SIGTERM.
    pub async fn run(self) -> Result<(), std::io::Error> {
        self.run_until(shutdown_signal()).await
    }

    /// Runs the server with a custom shutdown signal.
    pub async fn run_until<F>(self, shutdown: F) -> Result<(), std::io::Error>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let app = self.router();
        let addr = self.config.bind_address;

        let listener = TcpListener::bind(addr).await?;
        info!(address = %addr, "Hunt HQ API listening");

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown)
            .await?;

        info!("API server shut down gracefully");
        Ok(())
    }
}

/// Resolves on Ctrl+C or, on unix, SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, initiating graceful shutdown");
        }
        _ = terminate => {
            info!("Received SIGTERM, initiating graceful shutdown");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::{body_json, create_test_state};
    use axum::{body::Body, http::Request, http::StatusCode};
    use tower::ServiceExt;

    #[tokio::test]
    async fn test_openapi_document_is_served() {
        let server = ApiServer::with_state(create_test_state().await);

        let response = server
            .router()
            .oneshot(
                Request::builder()
                    .uri("/api-docs/openapi.json")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let doc = body_json(response).await;
        assert_eq!(doc["info"]["title"], "Hunt HQ API");
        assert!(doc["paths"]["/api/admin/claim-attempts"].is_object());
    }

    #[tokio::test]
    async fn test_docs_can_be_disabled() {
        let config = ApiServerConfig {
            enable_docs: false,
            ..Default::default()
        };
        let server = ApiServer::new(create_test_state().await, config);

        let response = server
            .router()
            .oneshot(
                Request::builder()
                    .uri("/api-docs/openapi.json")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_unauthenticated_admin_route_through_full_stack() {
        let server = ApiServer::with_state(create_test_state().await);

        let response = server
            .router()
            .oneshot(
                Request::builder()
                    .uri("/api/v1/admin/claim-attempts")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert!(response.headers().contains_key("x-request-id"));
    }
}

//! Admin audit log route.

use axum::{extract::State, routing::get, Json, Router};
use hunt_core::db::create_audit_repository;

use crate::auth::RequireAdmin;
use crate::dto::{ApiQuery, AuditLogQuery, AuditLogsResponse};
use crate::error::{ApiError, ErrorResponse};
use crate::state::AppState;

const DEFAULT_AUDIT_LIMIT: u32 = 50;
const MAX_AUDIT_LIMIT: u32 = 500;

/// Creates the audit log routes.
pub fn routes() -> Router<AppState> {
    Router::new().route("/", get(list_audit_logs))
}

/// Lists admin audit records, newest first.
#[utoipa::path(
    get,
    path = "/api/admin/audit-logs",
    params(AuditLogQuery),
    responses(
        (status = 200, description = "Audit records", body = AuditLogsResponse),
        (status = 403, description = "Admin access required", body = ErrorResponse)
    ),
    tag = "Audit"
)]
pub async fn list_audit_logs(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    ApiQuery(query): ApiQuery<AuditLogQuery>,
) -> Result<Json<AuditLogsResponse>, ApiError> {
    let limit = match query.limit {
        None | Some(0) => DEFAULT_AUDIT_LIMIT,
        Some(n) => n.min(MAX_AUDIT_LIMIT),
    };

    let repo = create_audit_repository(&state.db);
    let records = match query.user.as_deref().map(str::trim) {
        Some(email) if !email.is_empty() => {
            repo.by_target_user(&email.to_lowercase(), limit).await?
        }
        _ => repo.recent(limit).await?,
    };

    Ok(Json(AuditLogsResponse {
        success: true,
        audit_logs: records.into_iter().map(Into::into).collect(),
    }))
}

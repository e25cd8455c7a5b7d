//! Hunt item CRUD routes.
//!
//! Every authenticated user may list items; only admins see claim codes and
//! only admins may create, update or delete. Each mutation is audited.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, put},
    Json, Router,
};
use hunt_core::{
    db::{create_audit_repository, create_hunt_item_repository},
    AdminAction, AdminAuditRecord, HuntItem, HuntItemUpdate,
};
use hunt_observability::metrics::record_hunt_item_mutation;
use serde_json::json;
use tracing::info;
use uuid::Uuid;
use validator::Validate;

use crate::auth::{AuthenticatedUser, RequireAdmin};
use crate::dto::{
    ApiJson, CreateHuntItemRequest, HuntItemEnvelope, HuntItemListResponse, HuntItemResponse,
    SuccessResponse, UpdateHuntItemRequest,
};
use crate::error::{ApiError, ErrorResponse};
use crate::state::AppState;

/// Creates the hunt item routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_hunt_items).post(create_hunt_item))
        .route("/:id", put(update_hunt_item).delete(delete_hunt_item))
}

/// Lists hunt items, most recent first.
#[utoipa::path(
    get,
    path = "/api/hunt-items",
    responses(
        (status = 200, description = "Hunt items", body = HuntItemListResponse),
        (status = 401, description = "Not signed in", body = ErrorResponse)
    ),
    tag = "Hunt Items"
)]
pub async fn list_hunt_items(
    State(state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
) -> Result<Json<HuntItemListResponse>, ApiError> {
    let items = create_hunt_item_repository(&state.db).list().await?;

    let hunt_items = if user.is_admin() {
        items.into_iter().map(HuntItemResponse::from).collect()
    } else {
        items.into_iter().map(HuntItemResponse::public).collect()
    };

    Ok(Json(HuntItemListResponse {
        success: true,
        hunt_items,
    }))
}

/// Creates a hunt item.
#[utoipa::path(
    post,
    path = "/api/hunt-items",
    request_body = CreateHuntItemRequest,
    responses(
        (status = 201, description = "Hunt item created", body = HuntItemEnvelope),
        (status = 403, description = "Admin access required", body = ErrorResponse),
        (status = 409, description = "Identifier already in use", body = ErrorResponse),
        (status = 422, description = "Validation failed", body = ErrorResponse)
    ),
    tag = "Hunt Items"
)]
pub async fn create_hunt_item(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    ApiJson(mut request): ApiJson<CreateHuntItemRequest>,
) -> Result<(StatusCode, Json<HuntItemEnvelope>), ApiError> {
    request.name = request.name.trim().to_string();
    request.identifier = request.identifier.trim().to_string();
    request.validate()?;

    let repo = create_hunt_item_repository(&state.db);
    if repo.get_by_identifier(&request.identifier).await?.is_some() {
        return Err(ApiError::Conflict(format!(
            "A hunt item with identifier '{}' already exists",
            request.identifier
        )));
    }

    let item = HuntItem::new(
        request.name,
        request.description,
        request.identifier,
        request.points,
    );
    let created = repo.create(&item).await?;

    let record = AdminAuditRecord::new(AdminAction::CreateHuntItem, &admin.email)
        .with_resource(created.id)
        .with_change(None, Some(json!(created)));
    create_audit_repository(&state.db).log(&record).await?;
    record_hunt_item_mutation("create");

    info!(admin = %admin.email, item_id = %created.id, name = %created.name, "Hunt item created");

    Ok((
        StatusCode::CREATED,
        Json(HuntItemEnvelope {
            success: true,
            hunt_item: created.into(),
        }),
    ))
}

/// Updates name, description or points of a hunt item.
///
/// The claim code cannot be changed.
#[utoipa::path(
    put,
    path = "/api/hunt-items/{id}",
    params(("id" = Uuid, Path, description = "Hunt item ID")),
    request_body = UpdateHuntItemRequest,
    responses(
        (status = 200, description = "Hunt item updated", body = HuntItemEnvelope),
        (status = 400, description = "Identifier change or empty update", body = ErrorResponse),
        (status = 403, description = "Admin access required", body = ErrorResponse),
        (status = 404, description = "Hunt item not found", body = ErrorResponse),
        (status = 422, description = "Validation failed", body = ErrorResponse)
    ),
    tag = "Hunt Items"
)]
pub async fn update_hunt_item(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(id): Path<Uuid>,
    ApiJson(mut request): ApiJson<UpdateHuntItemRequest>,
) -> Result<Json<HuntItemEnvelope>, ApiError> {
    if request.identifier.is_some() {
        return Err(ApiError::BadRequest(
            "The identifier of a hunt item cannot be changed".to_string(),
        ));
    }
    request.name = request.name.map(|n| n.trim().to_string());
    request.validate()?;

    let update = HuntItemUpdate {
        name: request.name,
        description: request.description,
        points: request.points,
    };
    if update.is_empty() {
        return Err(ApiError::BadRequest("No fields to update".to_string()));
    }

    let repo = create_hunt_item_repository(&state.db);
    let before = repo
        .get(id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Hunt item {} not found", id)))?;
    let updated = repo.update(id, &update).await?;

    let record = AdminAuditRecord::new(AdminAction::UpdateHuntItem, &admin.email)
        .with_resource(id)
        .with_change(Some(json!(before)), Some(json!(updated)));
    create_audit_repository(&state.db).log(&record).await?;
    record_hunt_item_mutation("update");

    info!(admin = %admin.email, item_id = %id, "Hunt item updated");

    Ok(Json(HuntItemEnvelope {
        success: true,
        hunt_item: updated.into(),
    }))
}

/// Deletes a hunt item. Users keep history entries for it.
#[utoipa::path(
    delete,
    path = "/api/hunt-items/{id}",
    params(("id" = Uuid, Path, description = "Hunt item ID")),
    responses(
        (status = 200, description = "Hunt item deleted", body = SuccessResponse),
        (status = 403, description = "Admin access required", body = ErrorResponse),
        (status = 404, description = "Hunt item not found", body = ErrorResponse)
    ),
    tag = "Hunt Items"
)]
pub async fn delete_hunt_item(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(id): Path<Uuid>,
) -> Result<Json<SuccessResponse>, ApiError> {
    let repo = create_hunt_item_repository(&state.db);
    let existing = repo
        .get(id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Hunt item {} not found", id)))?;

    if !repo.delete(id).await? {
        return Err(ApiError::NotFound(format!("Hunt item {} not found", id)));
    }

    let record = AdminAuditRecord::new(AdminAction::DeleteHuntItem, &admin.email)
        .with_resource(id)
        .with_change(Some(json!(existing)), None);
    create_audit_repository(&state.db).log(&record).await?;
    record_hunt_item_mutation("delete");

    info!(admin = %admin.email, item_id = %id, name = %existing.name, "Hunt item deleted");

    Ok(Json(SuccessResponse::ok()))
}

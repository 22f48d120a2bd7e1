// ============================================================================
// Organization Routes
// ============================================================================
//
// Endpoints:
// - GET    /api/v1/organizations/:organization_id/member-statistics
// - GET    /api/v1/organizations/:organization_id/message-handlers
// - POST   /api/v1/organizations/:organization_id/message-handlers
// - PATCH  /api/v1/organizations/:organization_id/message-handlers/:member_id
// - DELETE /api/v1/organizations/:organization_id/message-handlers/:member_id
//
// ============================================================================

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde_json::json;
use std::sync::Arc;

use marketplace_error::AppError;

use crate::context::AppContext;
use crate::facade::{RegisterHandlerRequest, UpdateHandlerRequest};
use crate::routes::extractors::{TrustedActor, parse_id};

/// GET /api/v1/organizations/:organization_id/member-statistics
pub async fn member_statistics(
    State(app_context): State<Arc<AppContext>>,
    _actor: TrustedActor,
    Path(organization_id_str): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let organization_id = parse_id(&organization_id_str, "organization ID")?;

    let stats = app_context
        .facade
        .get_member_statistics(organization_id)
        .await?;

    Ok((StatusCode::OK, Json(stats)))
}

/// GET /api/v1/organizations/:organization_id/message-handlers
pub async fn list_handlers(
    State(app_context): State<Arc<AppContext>>,
    _actor: TrustedActor,
    Path(organization_id_str): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let organization_id = parse_id(&organization_id_str, "organization ID")?;

    let handlers = app_context
        .facade
        .list_message_handlers(organization_id)
        .await?;

    Ok((
        StatusCode::OK,
        Json(json!({ "organizationId": organization_id, "handlers": handlers })),
    ))
}

/// POST /api/v1/organizations/:organization_id/message-handlers
pub async fn register_handler(
    State(app_context): State<Arc<AppContext>>,
    actor: TrustedActor,
    Path(organization_id_str): Path<String>,
    Json(request): Json<RegisterHandlerRequest>,
) -> Result<impl IntoResponse, AppError> {
    let organization_id = parse_id(&organization_id_str, "organization ID")?;

    let handler = app_context
        .facade
        .register_message_handler(organization_id, actor.0, request)
        .await?;

    Ok((StatusCode::CREATED, Json(handler)))
}

/// PATCH /api/v1/organizations/:organization_id/message-handlers/:member_id
pub async fn update_handler(
    State(app_context): State<Arc<AppContext>>,
    actor: TrustedActor,
    Path((organization_id_str, member_id_str)): Path<(String, String)>,
    Json(request): Json<UpdateHandlerRequest>,
) -> Result<impl IntoResponse, AppError> {
    let organization_id = parse_id(&organization_id_str, "organization ID")?;
    let member_id = parse_id(&member_id_str, "member ID")?;

    let handler = app_context
        .facade
        .update_message_handler(organization_id, actor.0, member_id, request)
        .await?;

    Ok((StatusCode::OK, Json(handler)))
}

/// DELETE /api/v1/organizations/:organization_id/message-handlers/:member_id
pub async fn remove_handler(
    State(app_context): State<Arc<AppContext>>,
    actor: TrustedActor,
    Path((organization_id_str, member_id_str)): Path<(String, String)>,
) -> Result<impl IntoResponse, AppError> {
    let organization_id = parse_id(&organization_id_str, "organization ID")?;
    let member_id = parse_id(&member_id_str, "member ID")?;

    app_context
        .facade
        .remove_message_handler(organization_id, actor.0, member_id)
        .await?;

    Ok(StatusCode::NO_CONTENT)
}

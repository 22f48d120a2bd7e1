// ============================================================================
// Member Lifecycle Routes
// ============================================================================
//
// Endpoints:
// - POST /api/v1/members/:member_id/remove
// - POST /api/v1/members/:member_id/reactivate
// - PUT  /api/v1/members/:member_id/role
// - GET  /api/v1/members/:member_id/audit
//
// ============================================================================

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;

use marketplace_error::AppError;
use marketplace_types::MemberRole;

use crate::context::AppContext;
use crate::lifecycle::{ReactivationOptions, RemovalOptions};
use crate::routes::extractors::{OptionalJson, TrustedActor, parse_id};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangeRoleRequest {
    pub role: MemberRole,
}

/// POST /api/v1/members/:member_id/remove
pub async fn remove_member(
    State(app_context): State<Arc<AppContext>>,
    actor: TrustedActor,
    Path(member_id_str): Path<String>,
    OptionalJson(options): OptionalJson<RemovalOptions>,
) -> Result<impl IntoResponse, AppError> {
    let member_id = parse_id(&member_id_str, "member ID")?;

    let result = app_context
        .facade
        .remove_member(member_id, actor.0, options)
        .await?;

    Ok((StatusCode::OK, Json(result)))
}

/// POST /api/v1/members/:member_id/reactivate
pub async fn reactivate_member(
    State(app_context): State<Arc<AppContext>>,
    actor: TrustedActor,
    Path(member_id_str): Path<String>,
    OptionalJson(options): OptionalJson<ReactivationOptions>,
) -> Result<impl IntoResponse, AppError> {
    let member_id = parse_id(&member_id_str, "member ID")?;

    let result = app_context
        .facade
        .reactivate_member(member_id, actor.0, options)
        .await?;

    Ok((StatusCode::OK, Json(result)))
}

/// PUT /api/v1/members/:member_id/role
pub async fn change_role(
    State(app_context): State<Arc<AppContext>>,
    actor: TrustedActor,
    Path(member_id_str): Path<String>,
    Json(request): Json<ChangeRoleRequest>,
) -> Result<impl IntoResponse, AppError> {
    let member_id = parse_id(&member_id_str, "member ID")?;

    let result = app_context
        .facade
        .change_member_role(member_id, actor.0, request.role)
        .await?;

    Ok((StatusCode::OK, Json(result)))
}

/// GET /api/v1/members/:member_id/audit
pub async fn audit_history(
    State(app_context): State<Arc<AppContext>>,
    actor: TrustedActor,
    Path(member_id_str): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let member_id = parse_id(&member_id_str, "member ID")?;

    let entries = app_context
        .facade
        .get_member_audit_history(member_id, actor.0)
        .await?;

    Ok((
        StatusCode::OK,
        Json(json!({ "memberId": member_id, "entries": entries })),
    ))
}

// ============================================================================
// Listing Routing Routes
// ============================================================================
//
// Endpoints:
// - GET  /api/v1/listings/:listing_id/recipient - who answers buyer messages
// - POST /api/v1/listings/:listing_id/transfer  - explicit ownership transfer
// - GET  /api/v1/conversations/:conversation_id/ownership-history
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
use uuid::Uuid;

use marketplace_error::AppError;

use crate::context::AppContext;
use crate::routes::extractors::{TrustedActor, parse_id};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferListingRequest {
    pub new_owner_id: Uuid,
}

/// GET /api/v1/listings/:listing_id/recipient
pub async fn resolve_recipient(
    State(app_context): State<Arc<AppContext>>,
    _actor: TrustedActor,
    Path(listing_id_str): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let listing_id = parse_id(&listing_id_str, "listing ID")?;

    let recipient = app_context
        .facade
        .resolve_message_recipient(listing_id)
        .await?;

    Ok((StatusCode::OK, Json(recipient)))
}

/// POST /api/v1/listings/:listing_id/transfer
pub async fn transfer_listing(
    State(app_context): State<Arc<AppContext>>,
    actor: TrustedActor,
    Path(listing_id_str): Path<String>,
    Json(request): Json<TransferListingRequest>,
) -> Result<impl IntoResponse, AppError> {
    let listing_id = parse_id(&listing_id_str, "listing ID")?;

    let result = app_context
        .facade
        .transfer_listing(listing_id, actor.0, request.new_owner_id)
        .await?;

    Ok((StatusCode::OK, Json(result)))
}

/// GET /api/v1/conversations/:conversation_id/ownership-history
pub async fn ownership_history(
    State(app_context): State<Arc<AppContext>>,
    _actor: TrustedActor,
    Path(conversation_id_str): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let conversation_id = parse_id(&conversation_id_str, "conversation ID")?;

    let entries = app_context
        .facade
        .get_conversation_ownership_history(conversation_id)
        .await?;

    Ok((
        StatusCode::OK,
        Json(json!({ "conversationId": conversation_id, "entries": entries })),
    ))
}

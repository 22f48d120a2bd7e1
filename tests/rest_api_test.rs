// ============================================================================
// REST API Tests
// ============================================================================
//
// Drives the axum router in-process:
// - trusted actor header handling (401)
// - path id validation (400)
// - error taxonomy to status code mapping (403, 404, 409, 422)
// - health and metrics endpoints
//
// ============================================================================

use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode, header},
};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use serial_test::serial;
use tower::ServiceExt;
use uuid::Uuid;

use marketplace_server::routes::ACTOR_HEADER;
use marketplace_server::store::memory::FaultPlan;
use marketplace_types::{MemberRole, MemberStatus};

mod test_utils;
use test_utils::{listing, member, spawn_world};

async fn send(
    app: &Router,
    method: &str,
    uri: &str,
    actor: Option<Uuid>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(actor) = actor {
        builder = builder.header(ACTOR_HEADER, actor.to_string());
    }
    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, value)
}

#[tokio::test]
async fn test_missing_actor_header_is_unauthorized() {
    let world = spawn_world().await;
    let app = world.router();

    let (status, body) = send(
        &app,
        "POST",
        &format!("/api/v1/members/{}/remove", world.seller),
        None,
        Some(json!({})),
    )
    .await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error_code"], "AUTH_REQUIRED");
    assert_eq!(
        world.store.member(world.seller).await.unwrap().status,
        MemberStatus::Active
    );
}

#[tokio::test]
async fn test_malformed_ids_are_bad_requests() {
    let world = spawn_world().await;
    let app = world.router();

    let (status, body) = send(
        &app,
        "POST",
        "/api/v1/members/not-a-uuid/remove",
        Some(world.admin),
        Some(json!({})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error_code"], "VALIDATION_ERROR");

    let (status, _) = send(
        &app,
        "GET",
        "/api/v1/listings/42/recipient",
        Some(world.admin),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_remove_and_reactivate_over_http() {
    let world = spawn_world().await;
    let app = world.router();

    let (status, body) = send(
        &app,
        "POST",
        &format!("/api/v1/members/{}/remove", world.seller),
        Some(world.admin),
        Some(json!({ "reason": "left the company" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["memberId"], world.seller.to_string());
    assert_eq!(body["listingActions"].as_array().unwrap().len(), 2);
    assert_eq!(body["listingActions"][0]["action"], "suspended");
    assert_eq!(body["notification"]["status"], "sent");
    assert_eq!(body["canReactivate"], true);

    let (status, body) = send(
        &app,
        "POST",
        &format!("/api/v1/members/{}/remove", world.seller),
        Some(world.admin),
        Some(json!({})),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error_code"], "STATE_CONFLICT");

    let (status, body) = send(
        &app,
        "POST",
        &format!("/api/v1/members/{}/reactivate", world.seller),
        Some(world.admin),
        Some(json!({ "newRole": "admin" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["role"], "admin");
    assert_eq!(body["restoredListings"].as_array().unwrap().len(), 2);

    let (status, body) = send(
        &app,
        "GET",
        &format!("/api/v1/members/{}/audit", world.seller),
        Some(world.owner),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let entries = body["entries"].as_array().unwrap();
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0]["action"], "removed");
    assert_eq!(entries[1]["action"], "reactivated");
}

#[tokio::test]
async fn test_remove_and_reactivate_without_body_use_defaults() {
    let world = spawn_world().await;
    let app = world.router();

    let (status, body) = send(
        &app,
        "POST",
        &format!("/api/v1/members/{}/remove", world.seller),
        Some(world.admin),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["listingActions"][0]["action"], "suspended");

    let (status, body) = send(
        &app,
        "POST",
        &format!("/api/v1/members/{}/reactivate", world.seller),
        Some(world.admin),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["role"], "member");
    assert_eq!(body["restoredListings"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_malformed_options_body_is_bad_request() {
    let world = spawn_world().await;
    let app = world.router();

    let (status, body) = send(
        &app,
        "POST",
        &format!("/api/v1/members/{}/remove", world.seller),
        Some(world.admin),
        Some(json!({ "transferTo": "not-a-uuid" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error_code"], "VALIDATION_ERROR");
    assert_eq!(
        world.store.member(world.seller).await.unwrap().status,
        MemberStatus::Active
    );
}

#[tokio::test]
async fn test_permission_denied_is_forbidden() {
    let world = spawn_world().await;
    let app = world.router();

    let (status, body) = send(
        &app,
        "POST",
        &format!("/api/v1/members/{}/remove", world.owner),
        Some(world.admin),
        Some(json!({})),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error_code"], "PERMISSION_DENIED");

    let (status, _) = send(
        &app,
        "PUT",
        &format!("/api/v1/members/{}/role", world.colleague),
        Some(world.seller),
        Some(json!({ "role": "admin" })),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_reactivating_active_member_is_bad_request() {
    let world = spawn_world().await;
    let app = world.router();

    let (status, body) = send(
        &app,
        "POST",
        &format!("/api/v1/members/{}/reactivate", world.seller),
        Some(world.admin),
        Some(json!({})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error_code"], "STATE_CONFLICT");
}

#[tokio::test]
async fn test_recipient_and_no_valid_recipient() {
    let world = spawn_world().await;
    let app = world.router();

    let (status, body) = send(
        &app,
        "GET",
        &format!("/api/v1/listings/{}/recipient", world.listings[0]),
        Some(world.colleague),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["recipientId"], world.seller.to_string());
    assert_eq!(body["recipientType"], "member");
    assert_eq!(body["isOriginalSeller"], true);

    // A listing held by a member of an organization nobody can answer for
    let lonely_org = Uuid::new_v4();
    let mut gone = member(Some(lonely_org), MemberRole::InactiveMember, 0);
    gone.status = MemberStatus::Removed;
    let orphan = listing(Some(lonely_org), gone.id, 0);
    world.store.insert_member(gone).await;
    world.store.insert_listing(orphan.clone()).await;

    let (status, body) = send(
        &app,
        "GET",
        &format!("/api/v1/listings/{}/recipient", orphan.id),
        Some(world.colleague),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error_code"], "NO_VALID_RECIPIENT");
}

#[tokio::test]
async fn test_transfer_and_ownership_history_over_http() {
    let world = spawn_world().await;
    let app = world.router();

    let (status, body) = send(
        &app,
        "POST",
        &format!("/api/v1/listings/{}/transfer", world.listings[1]),
        Some(world.seller),
        Some(json!({ "newOwnerId": world.colleague })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["newOwnerId"], world.colleague.to_string());

    let (status, body) = send(
        &app,
        "GET",
        &format!(
            "/api/v1/conversations/{}/ownership-history",
            world.conversations[2]
        ),
        Some(world.seller),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let entries = body["entries"].as_array().unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0]["reason"], "listing_transferred");

    let (status, _) = send(
        &app,
        "GET",
        &format!("/api/v1/conversations/{}/ownership-history", Uuid::new_v4()),
        Some(world.seller),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_message_handler_routes() {
    let world = spawn_world().await;
    let app = world.router();
    let base = format!("/api/v1/organizations/{}/message-handlers", world.org);

    let (status, body) = send(
        &app,
        "POST",
        &base,
        Some(world.admin),
        Some(json!({ "memberId": world.colleague })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["canHandleTransferred"], true);

    let (status, body) = send(&app, "GET", &base, Some(world.seller), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["handlers"].as_array().unwrap().len(), 1);

    let (status, body) = send(
        &app,
        "PATCH",
        &format!("{}/{}", base, world.colleague),
        Some(world.admin),
        Some(json!({ "isActive": false })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["isActive"], false);

    let (status, _) = send(
        &app,
        "DELETE",
        &format!("{}/{}", base, world.colleague),
        Some(world.admin),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = send(
        &app,
        "DELETE",
        &format!("{}/{}", base, world.colleague),
        Some(world.admin),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_member_statistics_route() {
    let world = spawn_world().await;
    let app = world.router();

    let (status, body) = send(
        &app,
        "GET",
        &format!("/api/v1/organizations/{}/member-statistics", world.org),
        Some(world.owner),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total"], 4);
    assert_eq!(body["active"], 4);
}

#[tokio::test]
async fn test_health_endpoints() {
    let world = spawn_world().await;
    let app = world.router();

    let (status, _) = send(&app, "GET", "/health/live", None, None).await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = send(&app, "GET", "/health/ready", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["storage"], "memory");

    world
        .store
        .set_faults(FaultPlan {
            unavailable: true,
            ..Default::default()
        })
        .await;
    let (status, body) = send(&app, "GET", "/health/ready", None, None).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["status"], "not_ready");
}

#[tokio::test]
#[serial]
async fn test_metrics_count_removals() {
    let world = spawn_world().await;
    let app = world.router();

    let before = marketplace_metrics::MEMBER_REMOVALS_TOTAL
        .with_label_values(&["completed"])
        .get();

    let (status, _) = send(
        &app,
        "POST",
        &format!("/api/v1/members/{}/remove", world.colleague),
        Some(world.owner),
        Some(json!({})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let after = marketplace_metrics::MEMBER_REMOVALS_TOTAL
        .with_label_values(&["completed"])
        .get();
    assert!(after > before);

    let request = Request::builder()
        .uri("/metrics")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let text = String::from_utf8(bytes.to_vec()).unwrap();
    assert!(text.contains("marketplace_member_removals_total"));
}

#[tokio::test]
#[serial]
async fn test_security_headers_present() {
    let world = spawn_world().await;
    let app = world.router();

    let request = Request::builder()
        .uri("/health/live")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();

    let headers = response.headers();
    assert_eq!(headers["x-content-type-options"], "nosniff");
    assert_eq!(headers["x-frame-options"], "DENY");
}

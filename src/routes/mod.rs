// ============================================================================
// Axum Routes Module
// ============================================================================
//
// HTTP transport for the messaging facade.
//
// Structure:
// - mod.rs: Main router assembly and middleware
// - health.rs: Health check and metrics endpoints
// - members.rs: Member removal, reactivation, role changes, audit history
// - listings.rs: Recipient resolution, listing transfer, ownership history
// - organizations.rs: Member statistics and message handler registry
// - extractors.rs: Trusted actor extractor and id parsing
// - middleware.rs: Request logging, security headers
//
// ============================================================================

mod extractors;
mod health;
mod listings;
mod members;
mod middleware;
mod organizations;

pub use extractors::ACTOR_HEADER;

use axum::{
    Router,
    extract::DefaultBodyLimit,
    routing::{get, post, put},
};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

use marketplace_config::MAX_REQUEST_BODY_SIZE;

use crate::context::AppContext;

/// Create the main application router with all routes
pub fn create_router(app_context: Arc<AppContext>) -> Router {
    Router::new()
        // Health and monitoring
        .route("/health", get(health::health_check))
        .route("/health/ready", get(health::readiness))
        .route("/health/live", get(health::liveness))
        .route("/metrics", get(health::metrics))
        // Member lifecycle
        .route(
            "/api/v1/members/:member_id/remove",
            post(members::remove_member),
        )
        .route(
            "/api/v1/members/:member_id/reactivate",
            post(members::reactivate_member),
        )
        .route("/api/v1/members/:member_id/role", put(members::change_role))
        .route(
            "/api/v1/members/:member_id/audit",
            get(members::audit_history),
        )
        // Listings and conversations
        .route(
            "/api/v1/listings/:listing_id/recipient",
            get(listings::resolve_recipient),
        )
        .route(
            "/api/v1/listings/:listing_id/transfer",
            post(listings::transfer_listing),
        )
        .route(
            "/api/v1/conversations/:conversation_id/ownership-history",
            get(listings::ownership_history),
        )
        // Organizations
        .route(
            "/api/v1/organizations/:organization_id/member-statistics",
            get(organizations::member_statistics),
        )
        .route(
            "/api/v1/organizations/:organization_id/message-handlers",
            get(organizations::list_handlers).post(organizations::register_handler),
        )
        .route(
            "/api/v1/organizations/:organization_id/message-handlers/:member_id",
            axum::routing::patch(organizations::update_handler)
                .delete(organizations::remove_handler),
        )
        // Apply middleware (order matters - last added runs first)
        .layer(
            ServiceBuilder::new()
                // Tracing layer (outermost - runs first)
                .layer(TraceLayer::new_for_http())
                // Request logging
                .layer(axum::middleware::from_fn(middleware::request_logging))
                // Security headers
                .layer(axum::middleware::from_fn(middleware::add_security_headers))
                .into_inner(),
        )
        .layer(DefaultBodyLimit::max(MAX_REQUEST_BODY_SIZE))
        .with_state(app_context)
}

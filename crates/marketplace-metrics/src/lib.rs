//! Prometheus metrics for the marketplace server
//!
//! Provides centralized metrics collection for monitoring:
//! - Member removals and reactivations
//! - Message recipient resolution paths
//! - Conversation ownership propagation
//! - Best-effort side-effect failures

use anyhow::Result;
use once_cell::sync::Lazy;
use prometheus::{
    Encoder, IntCounter, IntCounterVec, TextEncoder, opts, register_int_counter,
    register_int_counter_vec,
};

// ============================================================================
// Member Lifecycle Metrics
// ============================================================================

/// Member removals by outcome (completed, rejected, failed)
pub static MEMBER_REMOVALS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    register_int_counter_vec!(
        opts!(
            "marketplace_member_removals_total",
            "Member removal requests by outcome"
        ),
        &["outcome"]
    )
    .expect("Failed to register MEMBER_REMOVALS_TOTAL metric")
});

/// Member reactivations by outcome (completed, rejected, failed)
pub static MEMBER_REACTIVATIONS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    register_int_counter_vec!(
        opts!(
            "marketplace_member_reactivations_total",
            "Member reactivation requests by outcome"
        ),
        &["outcome"]
    )
    .expect("Failed to register MEMBER_REACTIVATIONS_TOTAL metric")
});

// ============================================================================
// Routing Metrics
// ============================================================================

/// Recipient resolutions by path (owner, designated_handler, admin_fallback,
/// no_recipient)
pub static RECIPIENT_RESOLUTIONS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    register_int_counter_vec!(
        opts!(
            "marketplace_recipient_resolutions_total",
            "Message recipient resolutions by routing path"
        ),
        &["path"]
    )
    .expect("Failed to register RECIPIENT_RESOLUTIONS_TOTAL metric")
});

/// Seller participant changes written to the ownership log
pub static CONVERSATION_OWNERSHIP_CHANGES_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    register_int_counter!(opts!(
        "marketplace_conversation_ownership_changes_total",
        "Conversation seller participant changes"
    ))
    .expect("Failed to register CONVERSATION_OWNERSHIP_CHANGES_TOTAL metric")
});

// ============================================================================
// Side-Effect Failure Metrics
// ============================================================================

/// Conversation propagation failures left for the live fallback
pub static PROPAGATION_FAILURES_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    register_int_counter!(opts!(
        "marketplace_propagation_failures_total",
        "Conversation ownership propagation failures"
    ))
    .expect("Failed to register PROPAGATION_FAILURES_TOTAL metric")
});

/// Notification sends that failed, by kind (removal, reactivation)
pub static NOTIFICATION_FAILURES_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    register_int_counter_vec!(
        opts!(
            "marketplace_notification_failures_total",
            "Member notification failures by kind"
        ),
        &["kind"]
    )
    .expect("Failed to register NOTIFICATION_FAILURES_TOTAL metric")
});

// ============================================================================
// Metrics Collection
// ============================================================================

/// Gather all registered metrics and encode as Prometheus text format
pub fn gather_metrics() -> Result<String> {
    let mut buffer = vec![];
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    encoder.encode(&metric_families, &mut buffer)?;

    Ok(String::from_utf8(buffer)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gather_metrics() {
        // Increment counters to ensure metrics are registered
        MEMBER_REMOVALS_TOTAL.with_label_values(&["completed"]).inc();
        RECIPIENT_RESOLUTIONS_TOTAL
            .with_label_values(&["no_recipient"])
            .inc();

        let result = gather_metrics();
        assert!(result.is_ok());

        let metrics_text = result.unwrap();
        assert!(metrics_text.contains("marketplace_member_removals_total"));
        assert!(metrics_text.contains("no_recipient"));
    }
}

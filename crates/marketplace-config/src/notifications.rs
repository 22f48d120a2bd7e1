// ============================================================================
// Notification Configuration
// ============================================================================

use crate::constants::DEFAULT_NOTIFICATION_TIMEOUT_SECS;

/// Email notifications are delegated to an external service reached over
/// HTTP. Without a webhook URL the server only logs what it would send.
#[derive(Clone, Debug)]
pub struct NotificationConfig {
    pub webhook_url: Option<String>,
    pub timeout_secs: u64,
}

impl NotificationConfig {
    pub(crate) fn from_env() -> Self {
        Self {
            webhook_url: std::env::var("NOTIFICATION_WEBHOOK_URL")
                .ok()
                .filter(|url| !url.trim().is_empty()),
            timeout_secs: std::env::var("NOTIFICATION_TIMEOUT_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(DEFAULT_NOTIFICATION_TIMEOUT_SECS),
        }
    }
}

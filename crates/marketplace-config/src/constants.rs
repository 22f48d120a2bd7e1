// ============================================================================
// Configuration Constants
// ============================================================================

// Default port values
pub(crate) const DEFAULT_PORT: u16 = 8080;

// Notification webhook timeout (in seconds)
pub(crate) const DEFAULT_NOTIFICATION_TIMEOUT_SECS: u64 = 5;

/// Longest accepted free-text removal reason (in characters)
pub const MAX_REASON_LENGTH: usize = 500;

/// Request body limit for the JSON API (in bytes)
pub const MAX_REQUEST_BODY_SIZE: usize = 64 * 1024;

use axum::{http::StatusCode, response::IntoResponse};
use serde_json::json;
use thiserror::Error;
use uuid::Uuid;

pub type AppResult<T> = Result<T, AppError>;

/// Precondition failures caused by the current state of a member or listing
/// rather than by malformed input.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StateConflict {
    #[error("member {0} is already removed")]
    AlreadyRemoved(Uuid),

    #[error("member {member_id} is {status}, only removed members can be reactivated")]
    NotRemoved { member_id: Uuid, status: String },

    #[error("invalid transfer target: {0}")]
    InvalidTransferTarget(String),

    #[error("member {member_id} already has role {role}")]
    RoleUnchanged { member_id: Uuid, role: String },

    #[error("listing {listing_id} is {status}, only active listings can be transferred")]
    ListingNotActive { listing_id: Uuid, status: String },

    #[error("member {member_id} is {status}, only active members can change role")]
    MemberNotActive { member_id: Uuid, status: String },
}

impl StateConflict {
    pub fn status_code(&self) -> StatusCode {
        match self {
            StateConflict::AlreadyRemoved(_)
            | StateConflict::InvalidTransferTarget(_)
            | StateConflict::RoleUnchanged { .. }
            | StateConflict::MemberNotActive { .. } => StatusCode::CONFLICT,
            StateConflict::NotRemoved { .. } | StateConflict::ListingNotActive { .. } => {
                StatusCode::BAD_REQUEST
            }
        }
    }
}

/// Application error type
///
/// Covers the lifecycle/routing taxonomy (validation, permission, state
/// conflict, not found, missing recipient) plus infrastructure failures.
#[derive(Error, Debug)]
pub enum AppError {
    // ===== Input Errors =====
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    // ===== Authentication & Authorization Errors =====
    #[error("Authentication error: {0}")]
    Auth(String),

    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    // ===== Domain State Errors =====
    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("State conflict: {0}")]
    StateConflict(#[from] StateConflict),

    /// Routing found no eligible handler for an orphaned listing. Signals an
    /// organizational data gap that needs a manual fix.
    #[error("No valid recipient for listing {listing_id}")]
    NoValidRecipient {
        listing_id: Uuid,
        organization_id: Option<Uuid>,
    },

    // ===== Database & Storage Errors =====
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Storage temporarily unavailable: {0}")]
    Transient(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // ===== Side Effects =====
    #[error("Notification error: {0}")]
    Notification(String),

    // ===== Configuration Errors =====
    #[error("Configuration error: {0}")]
    Config(String),

    // ===== Internal Server Errors =====
    #[error("Internal server error: {0}")]
    Internal(String),

    // ===== Unknown/Generic Errors =====
    #[error("Unknown error: {0}")]
    Unknown(#[from] anyhow::Error),
}

impl AppError {
    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::Validation(_) | AppError::Json(_) => StatusCode::BAD_REQUEST,
            AppError::Auth(_) => StatusCode::UNAUTHORIZED,
            AppError::PermissionDenied(_) => StatusCode::FORBIDDEN,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::StateConflict(conflict) => conflict.status_code(),
            AppError::NoValidRecipient { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::Database(_) | AppError::Transient(_) => StatusCode::INTERNAL_SERVER_ERROR,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Get a user-friendly error message (without sensitive details)
    pub fn user_message(&self) -> String {
        match self {
            AppError::Validation(msg) => format!("Validation error: {}", msg),
            AppError::Json(_) => "Malformed JSON body".to_string(),
            AppError::Auth(msg) => format!("Authentication failed: {}", msg),
            AppError::PermissionDenied(msg) => format!("Permission denied: {}", msg),
            AppError::NotFound(msg) => format!("Not found: {}", msg),
            AppError::StateConflict(conflict) => conflict.to_string(),
            AppError::NoValidRecipient { listing_id, .. } => format!(
                "No eligible message handler for listing {}. An organization admin must register a company message handler.",
                listing_id
            ),
            AppError::Database(_) => "Database error".to_string(),
            AppError::Transient(_) => "Storage temporarily unavailable".to_string(),
            AppError::Notification(_) => "Notification delivery failed".to_string(),
            AppError::Config(msg) => format!("Configuration error: {}", msg),
            AppError::Internal(msg) => format!("Internal error: {}", msg),
            _ => "Internal server error".to_string(),
        }
    }

    /// Get error code for programmatic error handling
    pub fn error_code(&self) -> &'static str {
        match self {
            AppError::Validation(_) | AppError::Json(_) => "VALIDATION_ERROR",
            AppError::Auth(_) => "AUTH_REQUIRED",
            AppError::PermissionDenied(_) => "PERMISSION_DENIED",
            AppError::NotFound(_) => "NOT_FOUND",
            AppError::StateConflict(_) => "STATE_CONFLICT",
            AppError::NoValidRecipient { .. } => "NO_VALID_RECIPIENT",
            AppError::Database(_) => "DATABASE_ERROR",
            AppError::Transient(_) => "TRANSIENT_ERROR",
            AppError::Io(_) => "IO_ERROR",
            AppError::Notification(_) => "NOTIFICATION_ERROR",
            AppError::Config(_) => "CONFIG_ERROR",
            AppError::Internal(_) => "INTERNAL_ERROR",
            AppError::Unknown(_) => "UNKNOWN_ERROR",
        }
    }

    /// Whether a caller may retry the same request unchanged.
    ///
    /// Only infrastructure failures qualify; the transaction that hit them
    /// was rolled back in full.
    pub fn is_retryable(&self) -> bool {
        matches!(self, AppError::Database(_) | AppError::Transient(_))
    }

    /// Log this error with appropriate level and context
    pub fn log(&self) {
        let status = self.status_code();
        let code = self.error_code();

        if status.is_server_error() {
            tracing::error!(
                error = %self,
                error_code = %code,
                status = %status.as_u16(),
                retryable = self.is_retryable(),
                "Server error occurred"
            );
        } else if let AppError::NoValidRecipient {
            listing_id,
            organization_id,
        } = self
        {
            // Needs a human: the organization has no eligible handler
            tracing::warn!(
                listing_id = %listing_id,
                organization_id = ?organization_id,
                error_code = %code,
                "No valid message recipient"
            );
        } else {
            tracing::debug!(
                error = %self,
                error_code = %code,
                "Client error occurred"
            );
        }
    }

    fn response_body(&self) -> serde_json::Value {
        let status = self.status_code();
        let error_code = self.error_code();

        // For server errors, don't expose internal details to client
        if status.is_server_error() {
            json!({
                "error": "Internal server error",
                "error_code": error_code,
                "status": status.as_u16(),
                "retryable": self.is_retryable(),
            })
        } else {
            json!({
                "error": self.user_message(),
                "error_code": error_code,
                "status": status.as_u16(),
                "retryable": false,
            })
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        self.log();
        let status = self.status_code();
        (status, axum::Json(self.response_body())).into_response()
    }
}

// ============================================================================
// Helper functions for creating common errors
// ============================================================================

impl AppError {
    /// Create a validation error
    pub fn validation(msg: impl Into<String>) -> Self {
        AppError::Validation(msg.into())
    }

    /// Create a permission error
    pub fn permission_denied(msg: impl Into<String>) -> Self {
        AppError::PermissionDenied(msg.into())
    }

    /// Create a not-found error
    pub fn not_found(msg: impl Into<String>) -> Self {
        AppError::NotFound(msg.into())
    }

    /// Create a transient storage error
    pub fn transient(msg: impl Into<String>) -> Self {
        AppError::Transient(msg.into())
    }

    /// Create an internal server error
    pub fn internal(msg: impl Into<String>) -> Self {
        AppError::Internal(msg.into())
    }

    /// Create a notification error
    pub fn notification(msg: impl Into<String>) -> Self {
        AppError::Notification(msg.into())
    }

    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        AppError::Config(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_taxonomy_status_codes() {
        assert_eq!(
            AppError::validation("bad id").status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AppError::permission_denied("owner").status_code(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            AppError::not_found("member").status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            AppError::from(StateConflict::AlreadyRemoved(Uuid::nil())).status_code(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            AppError::from(StateConflict::NotRemoved {
                member_id: Uuid::nil(),
                status: "active".into()
            })
            .status_code(),
            StatusCode::BAD_REQUEST
        );
    }

    #[test]
    fn test_no_valid_recipient_is_not_a_server_error() {
        let err = AppError::NoValidRecipient {
            listing_id: Uuid::nil(),
            organization_id: None,
        };
        assert_eq!(err.status_code(), StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(err.error_code(), "NO_VALID_RECIPIENT");
        assert!(!err.is_retryable());
    }

    #[test]
    fn test_only_infrastructure_errors_are_retryable() {
        assert!(AppError::transient("pool timed out").is_retryable());
        assert!(!AppError::validation("x").is_retryable());
        assert!(!AppError::internal("x").is_retryable());
    }

    #[test]
    fn test_server_error_body_hides_details() {
        let body = AppError::transient("connection refused at 10.0.0.3").response_body();
        assert_eq!(body["error"], "Internal server error");
        assert_eq!(body["retryable"], true);
        assert!(!body.to_string().contains("10.0.0.3"));
    }
}

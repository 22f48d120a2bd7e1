// ============================================================================
// Axum Extractors
// ============================================================================
//
// - TrustedActor: actor id set by the upstream gateway in `x-user-id`.
//   Identity is trusted as-is; role and organization are re-validated by
//   the lifecycle core.
// - OptionalJson: JSON body whose fields all have defaults; an empty body
//   means `T::default()`.
//
// ============================================================================

use axum::{
    async_trait,
    body::Bytes,
    extract::{FromRequest, FromRequestParts, Request},
    http::request::Parts,
};
use serde::de::DeserializeOwned;
use uuid::Uuid;

use marketplace_error::AppError;

pub const ACTOR_HEADER: &str = "x-user-id";

/// Authenticated actor performing the request
///
/// Usage:
/// ```rust,ignore
/// async fn handler(actor: TrustedActor, ...) -> Result<...> {
///     let actor_id = actor.0;
/// }
/// ```
#[derive(Debug, Clone, Copy)]
pub struct TrustedActor(pub Uuid);

#[async_trait]
impl<S> FromRequestParts<S> for TrustedActor
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let raw = parts
            .headers
            .get(ACTOR_HEADER)
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| AppError::Auth(format!("Missing {} header", ACTOR_HEADER)))?;

        let actor_id = Uuid::parse_str(raw.trim())
            .map_err(|_| AppError::Auth(format!("Invalid {} header", ACTOR_HEADER)))?;

        Ok(TrustedActor(actor_id))
    }
}

/// JSON request body that may be omitted entirely
#[derive(Debug, Clone, Copy, Default)]
pub struct OptionalJson<T>(pub T);

#[async_trait]
impl<S, T> FromRequest<S> for OptionalJson<T>
where
    S: Send + Sync,
    T: DeserializeOwned + Default,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let body = Bytes::from_request(req, state)
            .await
            .map_err(|e| AppError::Validation(format!("Unreadable request body: {}", e)))?;

        if body.iter().all(u8::is_ascii_whitespace) {
            return Ok(OptionalJson(T::default()));
        }

        serde_json::from_slice(&body)
            .map(OptionalJson)
            .map_err(|e| AppError::Validation(format!("Invalid request body: {}", e)))
    }
}

/// Parse a path segment as a UUID, rejecting with a validation error
pub fn parse_id(raw: &str, what: &str) -> Result<Uuid, AppError> {
    Uuid::parse_str(raw).map_err(|_| AppError::Validation(format!("Invalid {} format", what)))
}

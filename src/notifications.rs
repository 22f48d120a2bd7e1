// ============================================================================
// Member Notifications
// ============================================================================
//
// Removal and welcome-back emails are sent by an external email service.
// The coordinator calls the notifier after its transactions have committed
// and never lets a notifier error fail the operation.
//
// Implementations:
// - LoggingNotifier: no delivery, logs the payload (default, and tests)
// - WebhookNotifier: POSTs the payload as JSON to NOTIFICATION_WEBHOOK_URL
//
// ============================================================================

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::time::Duration;
use uuid::Uuid;

use marketplace_config::NotificationConfig;
use marketplace_error::{AppError, AppResult};
use marketplace_types::MemberRole;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MemberRemovalNotification {
    pub member_id: Uuid,
    pub email: String,
    pub display_name: String,
    pub organization_id: Option<Uuid>,
    pub organization_name: Option<String>,
    pub removed_by: Uuid,
    pub reason: Option<String>,
    pub removal_date: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MemberReactivationNotification {
    pub member_id: Uuid,
    pub email: String,
    pub display_name: String,
    pub organization_id: Option<Uuid>,
    pub organization_name: Option<String>,
    pub reactivated_by: Uuid,
    pub role: MemberRole,
    pub reactivated_at: DateTime<Utc>,
    pub restored_listings: usize,
}

#[async_trait]
pub trait MemberNotifier: Send + Sync {
    async fn send_member_removal_notification(
        &self,
        payload: &MemberRemovalNotification,
    ) -> AppResult<()>;

    async fn send_member_reactivation_notification(
        &self,
        payload: &MemberReactivationNotification,
    ) -> AppResult<()>;
}

/// Notifier that only logs; used when no email endpoint is configured
#[derive(Debug, Clone, Default)]
pub struct LoggingNotifier;

#[async_trait]
impl MemberNotifier for LoggingNotifier {
    async fn send_member_removal_notification(
        &self,
        payload: &MemberRemovalNotification,
    ) -> AppResult<()> {
        tracing::info!(
            member_id = %payload.member_id,
            organization_id = ?payload.organization_id,
            "Member removal notification (no email endpoint configured)"
        );
        Ok(())
    }

    async fn send_member_reactivation_notification(
        &self,
        payload: &MemberReactivationNotification,
    ) -> AppResult<()> {
        tracing::info!(
            member_id = %payload.member_id,
            organization_id = ?payload.organization_id,
            role = %payload.role,
            "Member reactivation notification (no email endpoint configured)"
        );
        Ok(())
    }
}

#[derive(Serialize)]
struct WebhookEnvelope<'a, T: Serialize> {
    #[serde(rename = "type")]
    kind: &'a str,
    payload: &'a T,
}

/// Delivers notifications to the email service over HTTP
#[derive(Clone)]
pub struct WebhookNotifier {
    http_client: reqwest::Client,
    url: String,
}

impl WebhookNotifier {
    pub fn new(url: String, timeout: Duration) -> AppResult<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AppError::config(format!("Failed to create HTTP client: {}", e)))?;
        Ok(Self { http_client, url })
    }

    async fn post<T: Serialize + Sync>(&self, kind: &str, payload: &T) -> AppResult<()> {
        let envelope = WebhookEnvelope { kind, payload };

        let response = self
            .http_client
            .post(&self.url)
            .json(&envelope)
            .send()
            .await
            .map_err(|e| AppError::notification(format!("{} request failed: {}", kind, e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(AppError::notification(format!(
                "{} rejected: HTTP {} - {}",
                kind, status, error_text
            )));
        }

        Ok(())
    }
}

#[async_trait]
impl MemberNotifier for WebhookNotifier {
    async fn send_member_removal_notification(
        &self,
        payload: &MemberRemovalNotification,
    ) -> AppResult<()> {
        self.post("member_removed", payload).await
    }

    async fn send_member_reactivation_notification(
        &self,
        payload: &MemberReactivationNotification,
    ) -> AppResult<()> {
        self.post("member_reactivated", payload).await
    }
}

/// Build the notifier the configuration asks for
pub fn notifier_from_config(
    config: &NotificationConfig,
) -> AppResult<std::sync::Arc<dyn MemberNotifier>> {
    match &config.webhook_url {
        Some(url) => {
            tracing::info!(url = %url, "Member notifications delivered via webhook");
            Ok(std::sync::Arc::new(WebhookNotifier::new(
                url.clone(),
                Duration::from_secs(config.timeout_secs),
            )?))
        }
        None => Ok(std::sync::Arc::new(LoggingNotifier)),
    }
}

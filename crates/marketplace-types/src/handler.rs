use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Member designated to absorb messages for an organization's orphaned
/// listings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompanyMessageHandler {
    pub organization_id: Uuid,
    pub member_id: Uuid,
    pub is_active: bool,
    pub can_handle_transferred: bool,
    /// Registration time; earliest registration wins routing ties
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl CompanyMessageHandler {
    pub fn new(organization_id: Uuid, member_id: Uuid, can_handle_transferred: bool) -> Self {
        let now = Utc::now();
        Self {
            organization_id,
            member_id,
            is_active: true,
            can_handle_transferred,
            created_at: now,
            updated_at: now,
        }
    }
}

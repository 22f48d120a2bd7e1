// ============================================================================
// PostgreSQL Store
// ============================================================================
//
// sqlx-backed MarketplaceStore. Each StoreTransaction wraps one
// `sqlx::Transaction`; rows that are about to be mutated are locked with
// SELECT ... FOR UPDATE so concurrent lifecycle requests for the same member
// (or propagation runs over the same conversation) serialize on the row.
//
// Enumerations are TEXT columns and are parsed back through FromStr. A value
// that fails to parse means the row was written by something else and is
// reported as an internal error.
//
// ============================================================================

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

use marketplace_error::{AppError, AppResult};
use marketplace_types::{
    AuditAction, CompanyMessageHandler, Conversation, Listing, ListingStatus, Member,
    MemberAuditEntry, MemberRole, MemberStatus, MemberStatusPatch, Organization, OwnerType,
    OwnershipChangeReason, OwnershipLogEntry, ParseEnumError,
};

use super::{
    CompanyMessageHandlerRegistry, ConversationOwnershipLog, ListingOwnershipStore,
    MarketplaceStore, MemberLifecycleStore, StoreTransaction,
};

const MEMBER_COLUMNS: &str = r#"
    id, organization_id, email, display_name, status, role, removal_date,
    removal_reason, removed_by, reactivated_by, reactivated_at,
    reactivation_count, created_at
"#;

const LISTING_COLUMNS: &str = r#"
    id, organization_id, title, original_owner_id, current_owner_id,
    current_owner_type, status, created_at, updated_at
"#;

const CONVERSATION_SELECT: &str = r#"
    SELECT c.id, c.listing_id, c.created_at,
           (SELECT p.user_id FROM conversation_participants p
             WHERE p.conversation_id = c.id AND p.role = 'seller') AS seller_id,
           ARRAY(SELECT p.user_id FROM conversation_participants p
                  WHERE p.conversation_id = c.id AND p.role = 'buyer'
                  ORDER BY p.user_id) AS buyer_ids
    FROM conversations c
"#;

const HANDLER_COLUMNS: &str =
    "organization_id, member_id, is_active, can_handle_transferred, created_at, updated_at";

const AUDIT_COLUMNS: &str =
    "id, organization_id, member_id, action, performed_by, reason, metadata, created_at";

const OWNERSHIP_LOG_COLUMNS: &str =
    "id, conversation_id, old_owner_id, new_owner_id, reason, changed_by, created_at";

fn corrupt(err: ParseEnumError) -> AppError {
    AppError::internal(format!("corrupt row: {}", err))
}

// ============================================================================
// Row types
// ============================================================================

#[derive(Debug, sqlx::FromRow)]
struct MemberRow {
    id: Uuid,
    organization_id: Option<Uuid>,
    email: String,
    display_name: String,
    status: String,
    role: String,
    removal_date: Option<DateTime<Utc>>,
    removal_reason: Option<String>,
    removed_by: Option<Uuid>,
    reactivated_by: Option<Uuid>,
    reactivated_at: Option<DateTime<Utc>>,
    reactivation_count: i32,
    created_at: DateTime<Utc>,
}

impl TryFrom<MemberRow> for Member {
    type Error = AppError;

    fn try_from(row: MemberRow) -> AppResult<Self> {
        Ok(Member {
            id: row.id,
            organization_id: row.organization_id,
            email: row.email,
            display_name: row.display_name,
            status: row.status.parse().map_err(corrupt)?,
            role: row.role.parse().map_err(corrupt)?,
            removal_date: row.removal_date,
            removal_reason: row.removal_reason,
            removed_by: row.removed_by,
            reactivated_by: row.reactivated_by,
            reactivated_at: row.reactivated_at,
            reactivation_count: row.reactivation_count,
            created_at: row.created_at,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
struct ListingRow {
    id: Uuid,
    organization_id: Option<Uuid>,
    title: String,
    original_owner_id: Uuid,
    current_owner_id: Uuid,
    current_owner_type: String,
    status: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<ListingRow> for Listing {
    type Error = AppError;

    fn try_from(row: ListingRow) -> AppResult<Self> {
        Ok(Listing {
            id: row.id,
            organization_id: row.organization_id,
            title: row.title,
            original_owner_id: row.original_owner_id,
            current_owner_id: row.current_owner_id,
            current_owner_type: row.current_owner_type.parse().map_err(corrupt)?,
            status: row.status.parse().map_err(corrupt)?,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
struct ConversationRow {
    id: Uuid,
    listing_id: Uuid,
    created_at: DateTime<Utc>,
    seller_id: Option<Uuid>,
    buyer_ids: Vec<Uuid>,
}

impl TryFrom<ConversationRow> for Conversation {
    type Error = AppError;

    fn try_from(row: ConversationRow) -> AppResult<Self> {
        let seller_id = row.seller_id.ok_or_else(|| {
            AppError::internal(format!("conversation {} has no seller participant", row.id))
        })?;
        Ok(Conversation {
            id: row.id,
            listing_id: row.listing_id,
            seller_id,
            buyer_ids: row.buyer_ids,
            created_at: row.created_at,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
struct HandlerRow {
    organization_id: Uuid,
    member_id: Uuid,
    is_active: bool,
    can_handle_transferred: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<HandlerRow> for CompanyMessageHandler {
    fn from(row: HandlerRow) -> Self {
        CompanyMessageHandler {
            organization_id: row.organization_id,
            member_id: row.member_id,
            is_active: row.is_active,
            can_handle_transferred: row.can_handle_transferred,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct AuditRow {
    id: Uuid,
    organization_id: Option<Uuid>,
    member_id: Uuid,
    action: String,
    performed_by: Uuid,
    reason: Option<String>,
    metadata: serde_json::Value,
    created_at: DateTime<Utc>,
}

impl TryFrom<AuditRow> for MemberAuditEntry {
    type Error = AppError;

    fn try_from(row: AuditRow) -> AppResult<Self> {
        Ok(MemberAuditEntry {
            id: row.id,
            organization_id: row.organization_id,
            member_id: row.member_id,
            action: row.action.parse().map_err(corrupt)?,
            performed_by: row.performed_by,
            reason: row.reason,
            metadata: row.metadata,
            created_at: row.created_at,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
struct OwnershipLogRow {
    id: Uuid,
    conversation_id: Uuid,
    old_owner_id: Option<Uuid>,
    new_owner_id: Uuid,
    reason: String,
    changed_by: Option<Uuid>,
    created_at: DateTime<Utc>,
}

impl TryFrom<OwnershipLogRow> for OwnershipLogEntry {
    type Error = AppError;

    fn try_from(row: OwnershipLogRow) -> AppResult<Self> {
        let reason: OwnershipChangeReason = row.reason.parse().map_err(corrupt)?;
        Ok(OwnershipLogEntry {
            id: row.id,
            conversation_id: row.conversation_id,
            old_owner_id: row.old_owner_id,
            new_owner_id: row.new_owner_id,
            reason,
            changed_by: row.changed_by,
            created_at: row.created_at,
        })
    }
}

fn convert_all<R, T>(rows: Vec<R>) -> AppResult<Vec<T>>
where
    T: TryFrom<R, Error = AppError>,
{
    rows.into_iter().map(T::try_from).collect()
}

// ============================================================================
// Store
// ============================================================================

/// PostgreSQL implementation of MarketplaceStore
#[derive(Clone)]
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl MarketplaceStore for PostgresStore {
    async fn begin(&self) -> AppResult<Box<dyn StoreTransaction>> {
        let tx = self.pool.begin().await?;
        Ok(Box::new(PgStoreTransaction { tx }))
    }

    async fn ping(&self) -> AppResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

/// One open sqlx transaction
pub struct PgStoreTransaction {
    tx: Transaction<'static, Postgres>,
}

#[async_trait]
impl StoreTransaction for PgStoreTransaction {
    async fn commit(self: Box<Self>) -> AppResult<()> {
        self.tx.commit().await?;
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> AppResult<()> {
        self.tx.rollback().await?;
        Ok(())
    }
}

#[async_trait]
impl MemberLifecycleStore for PgStoreTransaction {
    async fn get_member(&mut self, member_id: Uuid) -> AppResult<Option<Member>> {
        let row = sqlx::query_as::<_, MemberRow>(&format!(
            "SELECT {} FROM members WHERE id = $1",
            MEMBER_COLUMNS
        ))
        .bind(member_id)
        .fetch_optional(&mut *self.tx)
        .await?;

        row.map(Member::try_from).transpose()
    }

    async fn lock_member(&mut self, member_id: Uuid) -> AppResult<Option<Member>> {
        let row = sqlx::query_as::<_, MemberRow>(&format!(
            "SELECT {} FROM members WHERE id = $1 FOR UPDATE",
            MEMBER_COLUMNS
        ))
        .bind(member_id)
        .fetch_optional(&mut *self.tx)
        .await?;

        row.map(Member::try_from).transpose()
    }

    async fn get_active_members(&mut self, organization_id: Uuid) -> AppResult<Vec<Member>> {
        let rows = sqlx::query_as::<_, MemberRow>(&format!(
            r#"
            SELECT {}
            FROM members
            WHERE organization_id = $1 AND status = 'active'
            ORDER BY created_at, id
            "#,
            MEMBER_COLUMNS
        ))
        .bind(organization_id)
        .fetch_all(&mut *self.tx)
        .await?;

        convert_all(rows)
    }

    async fn update_member_status(
        &mut self,
        member_id: Uuid,
        patch: &MemberStatusPatch,
    ) -> AppResult<()> {
        let result = match patch {
            MemberStatusPatch::Removed {
                removed_by,
                removal_date,
                reason,
            } => {
                sqlx::query(
                    r#"
                    UPDATE members
                    SET status = $2, role = $3, removal_date = $4,
                        removed_by = $5, removal_reason = $6
                    WHERE id = $1
                    "#,
                )
                .bind(member_id)
                .bind(MemberStatus::Removed.as_str())
                .bind(MemberRole::InactiveMember.as_str())
                .bind(removal_date)
                .bind(removed_by)
                .bind(reason)
                .execute(&mut *self.tx)
                .await?
            }
            MemberStatusPatch::Reactivated {
                role,
                reactivated_by,
                reactivated_at,
            } => {
                sqlx::query(
                    r#"
                    UPDATE members
                    SET status = $2, role = $3,
                        removal_date = NULL, removed_by = NULL, removal_reason = NULL,
                        reactivated_by = $4, reactivated_at = $5,
                        reactivation_count = reactivation_count + 1
                    WHERE id = $1
                    "#,
                )
                .bind(member_id)
                .bind(MemberStatus::Active.as_str())
                .bind(role.as_str())
                .bind(reactivated_by)
                .bind(reactivated_at)
                .execute(&mut *self.tx)
                .await?
            }
            MemberStatusPatch::RoleChanged { role } => {
                sqlx::query("UPDATE members SET role = $2 WHERE id = $1")
                    .bind(member_id)
                    .bind(role.as_str())
                    .execute(&mut *self.tx)
                    .await?
            }
        };

        if result.rows_affected() == 0 {
            return Err(AppError::not_found(format!("member {}", member_id)));
        }
        Ok(())
    }

    async fn count_members_by_status(
        &mut self,
        organization_id: Uuid,
    ) -> AppResult<Vec<(MemberStatus, i64)>> {
        let rows = sqlx::query_as::<_, (String, i64)>(
            r#"
            SELECT status, COUNT(*)
            FROM members
            WHERE organization_id = $1
            GROUP BY status
            "#,
        )
        .bind(organization_id)
        .fetch_all(&mut *self.tx)
        .await?;

        rows.into_iter()
            .map(|(status, count)| Ok((status.parse().map_err(corrupt)?, count)))
            .collect()
    }

    async fn get_organization(
        &mut self,
        organization_id: Uuid,
    ) -> AppResult<Option<Organization>> {
        let row = sqlx::query_as::<_, (Uuid, String)>(
            "SELECT id, name FROM organizations WHERE id = $1",
        )
        .bind(organization_id)
        .fetch_optional(&mut *self.tx)
        .await?;

        Ok(row.map(|(id, name)| Organization { id, name }))
    }

    async fn append_member_audit(&mut self, entry: &MemberAuditEntry) -> AppResult<()> {
        sqlx::query(
            r#"
            INSERT INTO member_audit
                (id, organization_id, member_id, action, performed_by, reason, metadata, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(entry.id)
        .bind(entry.organization_id)
        .bind(entry.member_id)
        .bind(entry.action.as_str())
        .bind(entry.performed_by)
        .bind(&entry.reason)
        .bind(&entry.metadata)
        .bind(entry.created_at)
        .execute(&mut *self.tx)
        .await?;

        Ok(())
    }

    async fn latest_member_audit(
        &mut self,
        member_id: Uuid,
        action: AuditAction,
    ) -> AppResult<Option<MemberAuditEntry>> {
        let row = sqlx::query_as::<_, AuditRow>(&format!(
            r#"
            SELECT {}
            FROM member_audit
            WHERE member_id = $1 AND action = $2
            ORDER BY created_at DESC, id DESC
            LIMIT 1
            "#,
            AUDIT_COLUMNS
        ))
        .bind(member_id)
        .bind(action.as_str())
        .fetch_optional(&mut *self.tx)
        .await?;

        row.map(MemberAuditEntry::try_from).transpose()
    }

    async fn member_audit_history(&mut self, member_id: Uuid) -> AppResult<Vec<MemberAuditEntry>> {
        let rows = sqlx::query_as::<_, AuditRow>(&format!(
            "SELECT {} FROM member_audit WHERE member_id = $1 ORDER BY created_at, id",
            AUDIT_COLUMNS
        ))
        .bind(member_id)
        .fetch_all(&mut *self.tx)
        .await?;

        convert_all(rows)
    }
}

#[async_trait]
impl ListingOwnershipStore for PgStoreTransaction {
    async fn get_listing(&mut self, listing_id: Uuid) -> AppResult<Option<Listing>> {
        let row = sqlx::query_as::<_, ListingRow>(&format!(
            "SELECT {} FROM listings WHERE id = $1",
            LISTING_COLUMNS
        ))
        .bind(listing_id)
        .fetch_optional(&mut *self.tx)
        .await?;

        row.map(Listing::try_from).transpose()
    }

    async fn lock_listing(&mut self, listing_id: Uuid) -> AppResult<Option<Listing>> {
        let row = sqlx::query_as::<_, ListingRow>(&format!(
            "SELECT {} FROM listings WHERE id = $1 FOR UPDATE",
            LISTING_COLUMNS
        ))
        .bind(listing_id)
        .fetch_optional(&mut *self.tx)
        .await?;

        row.map(Listing::try_from).transpose()
    }

    async fn get_active_listings_by_owner(&mut self, member_id: Uuid) -> AppResult<Vec<Listing>> {
        let rows = sqlx::query_as::<_, ListingRow>(&format!(
            r#"
            SELECT {}
            FROM listings
            WHERE current_owner_id = $1 AND status = $2
            ORDER BY created_at, id
            FOR UPDATE
            "#,
            LISTING_COLUMNS
        ))
        .bind(member_id)
        .bind(ListingStatus::Active.as_str())
        .fetch_all(&mut *self.tx)
        .await?;

        convert_all(rows)
    }

    async fn get_restorable_listings(&mut self, member_id: Uuid) -> AppResult<Vec<Listing>> {
        let rows = sqlx::query_as::<_, ListingRow>(&format!(
            r#"
            SELECT {}
            FROM listings
            WHERE (current_owner_id = $1 AND current_owner_type = $5 AND status = $2)
               OR (original_owner_id = $1 AND current_owner_type = $3 AND status IN ($2, $4))
            ORDER BY created_at, id
            FOR UPDATE
            "#,
            LISTING_COLUMNS
        ))
        .bind(member_id)
        .bind(ListingStatus::SuspendedMemberRemoved.as_str())
        .bind(OwnerType::OrgHandler.as_str())
        .bind(ListingStatus::Active.as_str())
        .bind(OwnerType::Member.as_str())
        .fetch_all(&mut *self.tx)
        .await?;

        convert_all(rows)
    }

    async fn set_listing_owner(
        &mut self,
        listing_id: Uuid,
        owner_id: Uuid,
        owner_type: OwnerType,
    ) -> AppResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE listings
            SET current_owner_id = $2, current_owner_type = $3, updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(listing_id)
        .bind(owner_id)
        .bind(owner_type.as_str())
        .execute(&mut *self.tx)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::not_found(format!("listing {}", listing_id)));
        }
        Ok(())
    }

    async fn set_listing_status(
        &mut self,
        listing_id: Uuid,
        status: ListingStatus,
    ) -> AppResult<()> {
        let result =
            sqlx::query("UPDATE listings SET status = $2, updated_at = NOW() WHERE id = $1")
                .bind(listing_id)
                .bind(status.as_str())
                .execute(&mut *self.tx)
                .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::not_found(format!("listing {}", listing_id)));
        }
        Ok(())
    }
}

#[async_trait]
impl ConversationOwnershipLog for PgStoreTransaction {
    async fn conversations_for_listing(
        &mut self,
        listing_id: Uuid,
    ) -> AppResult<Vec<Conversation>> {
        let rows = sqlx::query_as::<_, ConversationRow>(&format!(
            "{} WHERE c.listing_id = $1 ORDER BY c.created_at, c.id",
            CONVERSATION_SELECT
        ))
        .bind(listing_id)
        .fetch_all(&mut *self.tx)
        .await?;

        convert_all(rows)
    }

    async fn get_conversation(&mut self, conversation_id: Uuid) -> AppResult<Option<Conversation>> {
        let row = sqlx::query_as::<_, ConversationRow>(&format!(
            "{} WHERE c.id = $1",
            CONVERSATION_SELECT
        ))
        .bind(conversation_id)
        .fetch_optional(&mut *self.tx)
        .await?;

        row.map(Conversation::try_from).transpose()
    }

    async fn lock_conversation(
        &mut self,
        conversation_id: Uuid,
    ) -> AppResult<Option<Conversation>> {
        sqlx::query(
            r#"
            SELECT user_id FROM conversation_participants
            WHERE conversation_id = $1 AND role = 'seller'
            FOR UPDATE
            "#,
        )
        .bind(conversation_id)
        .fetch_optional(&mut *self.tx)
        .await?;

        self.get_conversation(conversation_id).await
    }

    async fn set_seller_participant(
        &mut self,
        conversation_id: Uuid,
        seller_id: Uuid,
    ) -> AppResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE conversation_participants
            SET user_id = $2
            WHERE conversation_id = $1 AND role = 'seller'
            "#,
        )
        .bind(conversation_id)
        .bind(seller_id)
        .execute(&mut *self.tx)
        .await?;

        if result.rows_affected() == 0 {
            sqlx::query(
                r#"
                INSERT INTO conversation_participants (conversation_id, user_id, role)
                VALUES ($1, $2, 'seller')
                "#,
            )
            .bind(conversation_id)
            .bind(seller_id)
            .execute(&mut *self.tx)
            .await?;
        }
        Ok(())
    }

    async fn append_ownership_entry(&mut self, entry: &OwnershipLogEntry) -> AppResult<()> {
        sqlx::query(
            r#"
            INSERT INTO conversation_ownership_log
                (id, conversation_id, old_owner_id, new_owner_id, reason, changed_by, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(entry.id)
        .bind(entry.conversation_id)
        .bind(entry.old_owner_id)
        .bind(entry.new_owner_id)
        .bind(entry.reason.as_str())
        .bind(entry.changed_by)
        .bind(entry.created_at)
        .execute(&mut *self.tx)
        .await?;

        Ok(())
    }

    async fn ownership_history(
        &mut self,
        conversation_id: Uuid,
    ) -> AppResult<Vec<OwnershipLogEntry>> {
        let rows = sqlx::query_as::<_, OwnershipLogRow>(&format!(
            r#"
            SELECT {}
            FROM conversation_ownership_log
            WHERE conversation_id = $1
            ORDER BY created_at, id
            "#,
            OWNERSHIP_LOG_COLUMNS
        ))
        .bind(conversation_id)
        .fetch_all(&mut *self.tx)
        .await?;

        convert_all(rows)
    }
}

#[async_trait]
impl CompanyMessageHandlerRegistry for PgStoreTransaction {
    async fn list_handlers(
        &mut self,
        organization_id: Uuid,
    ) -> AppResult<Vec<CompanyMessageHandler>> {
        let rows = sqlx::query_as::<_, HandlerRow>(&format!(
            r#"
            SELECT {}
            FROM company_message_handlers
            WHERE organization_id = $1
            ORDER BY created_at, member_id
            "#,
            HANDLER_COLUMNS
        ))
        .bind(organization_id)
        .fetch_all(&mut *self.tx)
        .await?;

        Ok(rows.into_iter().map(CompanyMessageHandler::from).collect())
    }

    async fn get_handler(
        &mut self,
        organization_id: Uuid,
        member_id: Uuid,
    ) -> AppResult<Option<CompanyMessageHandler>> {
        let row = sqlx::query_as::<_, HandlerRow>(&format!(
            r#"
            SELECT {}
            FROM company_message_handlers
            WHERE organization_id = $1 AND member_id = $2
            "#,
            HANDLER_COLUMNS
        ))
        .bind(organization_id)
        .bind(member_id)
        .fetch_optional(&mut *self.tx)
        .await?;

        Ok(row.map(CompanyMessageHandler::from))
    }

    async fn upsert_handler(
        &mut self,
        handler: &CompanyMessageHandler,
    ) -> AppResult<CompanyMessageHandler> {
        let row = sqlx::query_as::<_, HandlerRow>(&format!(
            r#"
            INSERT INTO company_message_handlers
                ({cols})
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (organization_id, member_id) DO UPDATE
            SET is_active = EXCLUDED.is_active,
                can_handle_transferred = EXCLUDED.can_handle_transferred,
                updated_at = NOW()
            RETURNING {cols}
            "#,
            cols = HANDLER_COLUMNS
        ))
        .bind(handler.organization_id)
        .bind(handler.member_id)
        .bind(handler.is_active)
        .bind(handler.can_handle_transferred)
        .bind(handler.created_at)
        .bind(handler.updated_at)
        .fetch_one(&mut *self.tx)
        .await?;

        Ok(row.into())
    }

    async fn update_handler_flags(
        &mut self,
        organization_id: Uuid,
        member_id: Uuid,
        is_active: Option<bool>,
        can_handle_transferred: Option<bool>,
    ) -> AppResult<Option<CompanyMessageHandler>> {
        let row = sqlx::query_as::<_, HandlerRow>(&format!(
            r#"
            UPDATE company_message_handlers
            SET is_active = COALESCE($3, is_active),
                can_handle_transferred = COALESCE($4, can_handle_transferred),
                updated_at = NOW()
            WHERE organization_id = $1 AND member_id = $2
            RETURNING {}
            "#,
            HANDLER_COLUMNS
        ))
        .bind(organization_id)
        .bind(member_id)
        .bind(is_active)
        .bind(can_handle_transferred)
        .fetch_optional(&mut *self.tx)
        .await?;

        Ok(row.map(CompanyMessageHandler::from))
    }

    async fn delete_handler(&mut self, organization_id: Uuid, member_id: Uuid) -> AppResult<bool> {
        let result = sqlx::query(
            "DELETE FROM company_message_handlers WHERE organization_id = $1 AND member_id = $2",
        )
        .bind(organization_id)
        .bind(member_id)
        .execute(&mut *self.tx)
        .await?;

        Ok(result.rows_affected() > 0)
    }
}

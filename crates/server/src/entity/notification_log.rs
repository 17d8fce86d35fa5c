//! Per-contact delivery audit log, one row per contact per alert attempt.
//!
//! Makes the fan-out auditable and lets a later resend know which contacts
//! were already attempted without re-deriving it from gateway state.

use sea_orm::entity::prelude::*;
use serde::Serialize;
use time::OffsetDateTime;
use utoipa::ToSchema;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, ToSchema)]
#[sea_orm(table_name = "notification_log")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub alert_id: Uuid,
    pub user_id: Uuid,
    pub contact_id: Uuid,
    pub channel: String, // currently always "sms"
    pub message: String,
    pub status: String, // "pending", "delivered" or "failed"
    pub error: Option<String>,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

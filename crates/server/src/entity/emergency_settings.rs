//! Per-user emergency configuration, upserted by the user.
//!
//! The trigger and dispatch paths treat this table as read-only and must
//! fall back to [`crate::dispatch::SafetyDefaults`] when no row exists.

use sea_orm::entity::prelude::*;
use serde::Serialize;
use time::OffsetDateTime;
use utoipa::ToSchema;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, ToSchema)]
#[sea_orm(table_name = "emergency_settings")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    #[sea_orm(unique)]
    pub user_id: Uuid,
    pub auto_send_location: bool,
    pub send_sms: bool,
    pub make_emergency_call: bool,
    pub share_live_location: bool,
    pub countdown_seconds: i32, // clamped to 1..=30 at the edges
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

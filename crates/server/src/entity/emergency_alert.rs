//! A single emergency notification event tied to one user and one location fix.
//!
//! `status` is tri-state (`active`, `resolved`, `test`) — test alerts never
//! page real contacts. `is_test` is redundant with `status` for cheap
//! querying and must stay consistent with it. `contacts_notified` is set
//! once after fan-out completes and never decremented.

use sea_orm::entity::prelude::*;
use serde::Serialize;
use time::OffsetDateTime;
use utoipa::ToSchema;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, ToSchema)]
#[sea_orm(table_name = "emergency_alert")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub user_id: Uuid,
    pub latitude: f64,
    pub longitude: f64,
    pub accuracy: Option<f64>,
    pub status: String, // "active", "resolved" or "test"
    pub is_test: bool,
    pub contacts_notified: i32,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
    pub resolved_at: Option<OffsetDateTime>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

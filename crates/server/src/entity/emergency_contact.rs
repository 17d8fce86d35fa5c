//! Emergency contacts, owned exclusively by one user.
//!
//! `phone_number` is mandatory and stored canonically (`+` followed by
//! country code and digits) so the messaging gateway can dispatch it as-is.
//! `is_primary` is advisory only — the model does not enforce uniqueness.
//! Rows are created and edited by the contacts collaborator; this service
//! only reads them.

use sea_orm::entity::prelude::*;
use serde::Serialize;
use time::OffsetDateTime;
use utoipa::ToSchema;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, ToSchema)]
#[sea_orm(table_name = "emergency_contact")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub user_id: Uuid,
    pub name: String,
    pub phone_number: String,
    pub email: Option<String>,
    pub relationship: Option<String>,
    pub is_primary: bool,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

use crate::entity::emergency_alert;
use crate::error::ResolveError;
use crate::response::AlertStatus;
use sea_orm::ActiveValue::Set;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter,
    QueryOrder,
};
use std::sync::Arc;
use time::OffsetDateTime;
use uuid::Uuid;

pub struct AlertLifecycle {
    db: Arc<DatabaseConnection>,
}

impl AlertLifecycle {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Resolve an active alert, exactly once.
    ///
    /// A second resolution returns a conflict instead of silently
    /// succeeding, so a caller can never believe it resolved something
    /// live when it did not. Test alerts are never active and conflict
    /// too.
    #[tracing::instrument(skip(self))]
    pub async fn resolve(&self, alert_id: Uuid) -> Result<emergency_alert::Model, ResolveError> {
        let alert = emergency_alert::Entity::find_by_id(alert_id)
            .one(self.db.as_ref())
            .await?
            .ok_or(ResolveError::NotFound(alert_id))?;

        if alert.status != AlertStatus::Active.as_str() {
            return Err(ResolveError::Conflict {
                status: alert.status,
            });
        }

        let now = OffsetDateTime::now_utc();
        let mut update: emergency_alert::ActiveModel = alert.into();
        update.status = Set(AlertStatus::Resolved.as_str().to_string());
        update.resolved_at = Set(Some(now));
        update.updated_at = Set(now);
        let resolved = update.update(self.db.as_ref()).await?;

        tracing::info!(alert_id = %resolved.id, "alert resolved");
        Ok(resolved)
    }

    /// The user's currently active alert, if any. Never returns resolved
    /// or test alerts; `None` means there is no live emergency.
    pub async fn active_alert(
        &self,
        user_id: Uuid,
    ) -> Result<Option<emergency_alert::Model>, DbErr> {
        emergency_alert::Entity::find()
            .filter(emergency_alert::Column::UserId.eq(user_id))
            .filter(emergency_alert::Column::Status.eq(AlertStatus::Active.as_str()))
            .order_by_desc(emergency_alert::Column::CreatedAt)
            .one(self.db.as_ref())
            .await
    }

    /// The user's most recent alert of any status, for "last known alert"
    /// displays. Deliberately a separate query from [`Self::active_alert`]:
    /// a resolved alert coming back from here is history, not an active
    /// emergency.
    pub async fn latest_alert(
        &self,
        user_id: Uuid,
    ) -> Result<Option<emergency_alert::Model>, DbErr> {
        emergency_alert::Entity::find()
            .filter(emergency_alert::Column::UserId.eq(user_id))
            .order_by_desc(emergency_alert::Column::CreatedAt)
            .one(self.db.as_ref())
            .await
    }
}

//! Server-side dispatch pipeline: validate, admit, persist, fan out,
//! reconcile.
//!
//! Hard failures (validation, rate limit, alert persistence) happen before
//! any contact is touched and leave no partial state. Once the alert row
//! exists, every contact is attempted independently; delivery failures are
//! collected into the summary, never escalated.

pub mod gateway;
pub mod message;

pub use gateway::{HttpSmsGateway, SmsGateway};

use crate::entity::{emergency_alert, emergency_contact, emergency_settings, notification_log, profile};
use crate::error::DispatchError;
use crate::rate_limit::RateLimiter;
use crate::response::{AlertStatus, ContactDeliveryError, DispatchSummary};
use crate::validation::coordinates::validate_coordinates;
use message::compose_alert_message;
use sea_orm::ActiveValue::Set;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter,
};
use std::sync::Arc;
use time::OffsetDateTime;
use uuid::Uuid;

/// Fallbacks applied when a user has no stored settings row. Chosen to be
/// safe in an actual emergency: messages go out, calls stay off.
pub struct SafetyDefaults;

impl SafetyDefaults {
    pub const AUTO_SEND_LOCATION: bool = true;
    pub const SEND_SMS: bool = true;
    pub const MAKE_EMERGENCY_CALL: bool = false;
    pub const SHARE_LIVE_LOCATION: bool = true;
    pub const COUNTDOWN_SECONDS: i32 = 5;
}

pub struct DispatchService {
    db: Arc<DatabaseConnection>,
    gateway: Arc<dyn SmsGateway>,
    limiter: Arc<dyn RateLimiter>,
}

impl DispatchService {
    pub fn new(
        db: Arc<DatabaseConnection>,
        gateway: Arc<dyn SmsGateway>,
        limiter: Arc<dyn RateLimiter>,
    ) -> Self {
        Self {
            db,
            gateway,
            limiter,
        }
    }

    /// Run one dispatch end to end.
    ///
    /// Returns `Ok` as soon as the alert row is persisted, even when some
    /// or all contacts were unreachable; the summary carries the
    /// per-contact outcomes.
    #[tracing::instrument(skip(self), fields(%user_id, is_test))]
    pub async fn dispatch(
        &self,
        user_id: Uuid,
        latitude: f64,
        longitude: f64,
        accuracy: Option<f64>,
        is_test: bool,
    ) -> Result<DispatchSummary, DispatchError> {
        // 1. Malformed input never reaches persistence.
        validate_coordinates(latitude, longitude, accuracy)?;

        // 2. Admission check before any write.
        let decision = self
            .limiter
            .admit(&user_id.to_string())
            .await
            .map_err(|e| DispatchError::Limiter(e.to_string()))?;
        if !decision.allowed {
            return Err(DispatchError::RateLimited {
                retry_after_seconds: decision.retry_after_seconds,
            });
        }

        // 3. Independent reads, no ordering dependency.
        let (settings, contacts, user_profile) = tokio::try_join!(
            emergency_settings::Entity::find()
                .filter(emergency_settings::Column::UserId.eq(user_id))
                .one(self.db.as_ref()),
            emergency_contact::Entity::find()
                .filter(emergency_contact::Column::UserId.eq(user_id))
                .all(self.db.as_ref()),
            profile::Entity::find_by_id(user_id).one(self.db.as_ref()),
        )?;

        let now = OffsetDateTime::now_utc();
        let status = if is_test {
            AlertStatus::Test
        } else {
            AlertStatus::Active
        };

        // 4. Persist the alert. A real alert supersedes whatever active
        // alert the user still has, so at most one stays active.
        if !is_test {
            emergency_alert::Entity::update_many()
                .col_expr(
                    emergency_alert::Column::Status,
                    sea_orm::sea_query::Expr::value(AlertStatus::Resolved.as_str()),
                )
                .col_expr(
                    emergency_alert::Column::ResolvedAt,
                    sea_orm::sea_query::Expr::value(now),
                )
                .col_expr(
                    emergency_alert::Column::UpdatedAt,
                    sea_orm::sea_query::Expr::value(now),
                )
                .filter(emergency_alert::Column::UserId.eq(user_id))
                .filter(emergency_alert::Column::Status.eq(AlertStatus::Active.as_str()))
                .exec(self.db.as_ref())
                .await?;
        }

        let alert = emergency_alert::ActiveModel {
            id: Set(Uuid::new_v4()),
            user_id: Set(user_id),
            latitude: Set(latitude),
            longitude: Set(longitude),
            accuracy: Set(accuracy),
            status: Set(status.as_str().to_string()),
            is_test: Set(is_test),
            contacts_notified: Set(0),
            created_at: Set(now),
            updated_at: Set(now),
            resolved_at: Set(None),
        }
        .insert(self.db.as_ref())
        .await?;

        tracing::info!(alert_id = %alert.id, status = %status, "emergency alert persisted");

        let total_contacts = contacts.len() as u32;
        let send_sms = settings
            .as_ref()
            .map(|s| s.send_sms)
            .unwrap_or(SafetyDefaults::SEND_SMS);

        // 5. Test alerts, empty contact lists and muted SMS are all
        // successful no-op dispatches, not pipeline errors.
        if is_test || contacts.is_empty() || !send_sms {
            return Ok(self.summary(alert.id, is_test, 0, total_contacts, Vec::new()));
        }

        let user_name = user_profile
            .as_ref()
            .and_then(|p| p.name.clone())
            .unwrap_or_else(|| "An AquaLink user".to_string());
        let user_phone = user_profile.as_ref().and_then(|p| p.phone.clone());

        // 6. Fan out, one task per contact. Spawned tasks isolate panics
        // as well as errors; the join waits for every attempt, success or
        // failure, before anything is reconciled.
        let mut attempted = Vec::with_capacity(contacts.len());
        let mut handles = Vec::with_capacity(contacts.len());
        for contact in &contacts {
            let body = compose_alert_message(
                &user_name,
                user_phone.as_deref(),
                latitude,
                longitude,
                accuracy,
                now,
                is_test,
            );
            let gateway = self.gateway.clone();
            let to = contact.phone_number.clone();
            let task_body = body.clone();
            handles.push(tokio::spawn(async move {
                gateway.send_sms(&to, &task_body).await
            }));
            attempted.push((contact.id, body));
        }
        let joined = futures::future::join_all(handles).await;

        let mut contacts_notified = 0u32;
        let mut errors = Vec::new();
        let mut log_rows = Vec::with_capacity(attempted.len());
        for ((contact_id, body), result) in attempted.into_iter().zip(joined) {
            let outcome = match result {
                Ok(Ok(provider_id)) => {
                    tracing::debug!(%contact_id, %provider_id, "contact notified");
                    contacts_notified += 1;
                    Ok(())
                }
                Ok(Err(e)) => Err(e.to_string()),
                Err(join_err) => {
                    tracing::error!(
                        name = "dispatch.fan_out.task_panicked",
                        target = concat!(env!("CARGO_PKG_NAME"), "::", module_path!()),
                        error = %join_err,
                        %contact_id,
                        message = "Delivery task died; counted as a failed contact"
                    );
                    Err("delivery task failed".to_string())
                }
            };
            if let Err(reason) = &outcome {
                errors.push(ContactDeliveryError {
                    contact_id,
                    error: reason.clone(),
                });
            }
            log_rows.push((contact_id, body, outcome));
        }

        // 7. One audit row per attempted contact.
        for (contact_id, body, outcome) in log_rows {
            let logged_at = OffsetDateTime::now_utc();
            let row = notification_log::ActiveModel {
                id: Set(Uuid::new_v4()),
                alert_id: Set(alert.id),
                user_id: Set(user_id),
                contact_id: Set(contact_id),
                channel: Set("sms".to_string()),
                message: Set(body),
                status: Set(match &outcome {
                    Ok(()) => "delivered".to_string(),
                    Err(_) => "failed".to_string(),
                }),
                error: Set(outcome.err()),
                created_at: Set(logged_at),
                updated_at: Set(logged_at),
            };
            if let Err(e) = row.insert(self.db.as_ref()).await {
                tracing::error!(
                    name = "dispatch.notification_log.insert_failed",
                    target = concat!(env!("CARGO_PKG_NAME"), "::", module_path!()),
                    error = %e,
                    alert_id = %alert.id,
                    message = "Failed to write notification log row"
                );
            }
        }

        // 8. Set the delivery count once. The alert is already sent at
        // this point, so a failure here is logged, not surfaced.
        let mut update: emergency_alert::ActiveModel = alert.clone().into();
        update.contacts_notified = Set(contacts_notified as i32);
        update.updated_at = Set(OffsetDateTime::now_utc());
        if let Err(e) = update.update(self.db.as_ref()).await {
            tracing::error!(
                name = "dispatch.alert.count_update_failed",
                target = concat!(env!("CARGO_PKG_NAME"), "::", module_path!()),
                error = %e,
                alert_id = %alert.id,
                message = "Failed to record contacts_notified on alert"
            );
        }

        // 9. The caller decides how loudly to surface a degraded send.
        Ok(self.summary(alert.id, is_test, contacts_notified, total_contacts, errors))
    }

    fn summary(
        &self,
        alert_id: Uuid,
        is_test: bool,
        contacts_notified: u32,
        total_contacts: u32,
        errors: Vec<ContactDeliveryError>,
    ) -> DispatchSummary {
        let message = if is_test {
            "Test alert processed successfully".to_string()
        } else {
            format!("Emergency alert sent to {contacts_notified} of {total_contacts} contact(s)")
        };
        DispatchSummary {
            success: true,
            alert_id,
            is_test,
            contacts_notified,
            total_contacts,
            errors,
            message,
            timestamp: OffsetDateTime::now_utc(),
        }
    }
}

//! Tests for the alert lifecycle manager.

use aqualink_sos::alerts::AlertLifecycle;
use aqualink_sos::entity::emergency_alert;
use aqualink_sos::error::ResolveError;
use sea_orm::{DatabaseBackend, MockDatabase};
use std::sync::Arc;
use time::OffsetDateTime;
use uuid::Uuid;

fn alert(status: &str, is_test: bool) -> emergency_alert::Model {
    let now = OffsetDateTime::now_utc();
    emergency_alert::Model {
        id: Uuid::new_v4(),
        user_id: Uuid::new_v4(),
        latitude: -17.82,
        longitude: 31.05,
        accuracy: Some(10.0),
        status: status.to_string(),
        is_test,
        contacts_notified: 2,
        created_at: now,
        updated_at: now,
        resolved_at: None,
    }
}

#[tokio::test]
async fn resolve_marks_active_alert_resolved() {
    let active = alert("active", false);
    let mut resolved = active.clone();
    resolved.status = "resolved".to_string();
    resolved.resolved_at = Some(OffsetDateTime::now_utc());

    let db = Arc::new(
        MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![active.clone()]])
            .append_query_results([vec![resolved]])
            .into_connection(),
    );

    let result = AlertLifecycle::new(db).resolve(active.id).await.unwrap();
    assert_eq!(result.status, "resolved");
    assert!(result.resolved_at.is_some());
}

#[tokio::test]
async fn second_resolution_returns_conflict() {
    let mut already = alert("resolved", false);
    already.resolved_at = Some(OffsetDateTime::now_utc());

    let db = Arc::new(
        MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![already.clone()]])
            .into_connection(),
    );

    let err = AlertLifecycle::new(db).resolve(already.id).await.unwrap_err();
    match err {
        ResolveError::Conflict { status } => assert_eq!(status, "resolved"),
        other => panic!("expected Conflict, got {other:?}"),
    }
}

#[tokio::test]
async fn test_alerts_cannot_be_resolved() {
    let test_alert = alert("test", true);
    let db = Arc::new(
        MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![test_alert.clone()]])
            .into_connection(),
    );

    let err = AlertLifecycle::new(db)
        .resolve(test_alert.id)
        .await
        .unwrap_err();
    assert!(matches!(err, ResolveError::Conflict { .. }));
}

#[tokio::test]
async fn resolving_unknown_alert_is_not_found() {
    let db = Arc::new(
        MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([Vec::<emergency_alert::Model>::new()])
            .into_connection(),
    );

    let missing = Uuid::new_v4();
    let err = AlertLifecycle::new(db).resolve(missing).await.unwrap_err();
    assert!(matches!(err, ResolveError::NotFound(id) if id == missing));
}

#[tokio::test]
async fn active_query_filters_on_status_but_latest_does_not() {
    let user_id = Uuid::new_v4();
    let db = Arc::new(
        MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([Vec::<emergency_alert::Model>::new()])
            .append_query_results([Vec::<emergency_alert::Model>::new()])
            .into_connection(),
    );

    let lifecycle = AlertLifecycle::new(db.clone());
    assert!(lifecycle.active_alert(user_id).await.unwrap().is_none());
    assert!(lifecycle.latest_alert(user_id).await.unwrap().is_none());

    drop(lifecycle);
    let log = Arc::try_unwrap(db)
        .expect("db still borrowed")
        .into_transaction_log();
    assert_eq!(log.len(), 2);
    let active_sql = format!("{:?}", log[0]);
    let latest_sql = format!("{:?}", log[1]);
    // Only the active-alert query constrains the status column; the
    // latest-alert query is deliberately status-blind.
    assert!(active_sql.contains("active"));
    assert!(!latest_sql.contains("active"));
}

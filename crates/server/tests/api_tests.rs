//! HTTP surface tests driven through the real router.

use aqualink_sos::AppResources;
use aqualink_sos::api::build_router;
use aqualink_sos::config::{AppConfig, RateLimitConfig, SmsConfig};
use aqualink_sos::dispatch::SmsGateway;
use aqualink_sos::entity::emergency_alert;
use aqualink_sos::error::GatewayError;
use aqualink_sos::rate_limit::{Decision, LimiterError, RateLimiter};
use async_trait::async_trait;
use axum_test::TestServer;
use sea_orm::{DatabaseBackend, DatabaseConnection, MockDatabase};
use serde_json::{Value, json};
use std::sync::Arc;
use time::OffsetDateTime;
use uuid::Uuid;

struct NoopGateway;

#[async_trait]
impl SmsGateway for NoopGateway {
    async fn send_sms(&self, _to: &str, _body: &str) -> Result<String, GatewayError> {
        Ok("noop".to_string())
    }
}

struct AllowAll;

#[async_trait]
impl RateLimiter for AllowAll {
    async fn admit(&self, _user_key: &str) -> Result<Decision, LimiterError> {
        Ok(Decision {
            allowed: true,
            retry_after_seconds: 0,
            remaining: 4,
        })
    }
}

struct DenyAll;

#[async_trait]
impl RateLimiter for DenyAll {
    async fn admit(&self, _user_key: &str) -> Result<Decision, LimiterError> {
        Ok(Decision {
            allowed: false,
            retry_after_seconds: 42,
            remaining: 0,
        })
    }
}

fn test_config() -> Arc<AppConfig> {
    Arc::new(AppConfig {
        database_url: "postgres://unused".to_string(),
        redis_url: "redis://unused".to_string(),
        bind_addr: "127.0.0.1:0".to_string(),
        sms: SmsConfig {
            api_url: "https://sms.gateway.test/messages".to_string(),
            account_sid: "AC-test".to_string(),
            auth_token: "token".to_string(),
            from_number: "+15550006666".to_string(),
            send_timeout_secs: 5,
        },
        rate_limit: RateLimitConfig::default(),
    })
}

fn server(db: DatabaseConnection, limiter: Arc<dyn RateLimiter>) -> TestServer {
    let resources = AppResources {
        db: Arc::new(db),
        gateway: Arc::new(NoopGateway),
        limiter,
        config: test_config(),
    };
    TestServer::new(build_router(resources)).expect("failed to build test server")
}

fn empty_db() -> DatabaseConnection {
    MockDatabase::new(DatabaseBackend::Postgres).into_connection()
}

#[tokio::test]
async fn health_endpoint_responds() {
    let server = server(empty_db(), Arc::new(AllowAll));
    let response = server.get("/healthz").await;
    response.assert_status_ok();
    assert_eq!(response.text(), "ok");
}

#[tokio::test]
async fn dispatch_rejects_out_of_range_coordinates() {
    let server = server(empty_db(), Arc::new(AllowAll));
    let response = server
        .post("/api/sos/dispatch")
        .json(&json!({
            "userId": Uuid::new_v4(),
            "latitude": 120.0,
            "longitude": 31.05,
        }))
        .await;

    response.assert_status_bad_request();
    let body: Value = response.json();
    assert_eq!(body["code"], "validation_error");
    assert_eq!(body["success"], false);
}

#[tokio::test]
async fn dispatch_surfaces_rate_limit_with_retry_after() {
    let server = server(empty_db(), Arc::new(DenyAll));
    let response = server
        .post("/api/sos/dispatch")
        .json(&json!({
            "userId": Uuid::new_v4(),
            "latitude": -17.82,
            "longitude": 31.05,
            "accuracy": 8.0,
        }))
        .await;

    response.assert_status(axum::http::StatusCode::TOO_MANY_REQUESTS);
    let body: Value = response.json();
    assert_eq!(body["code"], "rate_limit_exceeded");
    assert_eq!(body["retryAfterSeconds"], 42);
}

#[tokio::test]
async fn active_alert_query_returns_null_when_none() {
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([Vec::<emergency_alert::Model>::new()])
        .into_connection();
    let server = server(db, Arc::new(AllowAll));

    let response = server
        .get("/api/sos/alerts/active")
        .add_query_param("userId", Uuid::new_v4().to_string())
        .await;

    response.assert_status_ok();
    let body: Value = response.json();
    assert!(body.is_null());
}

#[tokio::test]
async fn resolving_resolved_alert_is_a_conflict() {
    let now = OffsetDateTime::now_utc();
    let alert_id = Uuid::new_v4();
    let resolved = emergency_alert::Model {
        id: alert_id,
        user_id: Uuid::new_v4(),
        latitude: -17.82,
        longitude: 31.05,
        accuracy: None,
        status: "resolved".to_string(),
        is_test: false,
        contacts_notified: 1,
        created_at: now,
        updated_at: now,
        resolved_at: Some(now),
    };
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([vec![resolved]])
        .into_connection();
    let server = server(db, Arc::new(AllowAll));

    let response = server
        .post(&format!("/api/sos/alerts/{alert_id}/resolve"))
        .await;

    response.assert_status(axum::http::StatusCode::CONFLICT);
    let body: Value = response.json();
    assert_eq!(body["code"], "resolution_conflict");
    assert_eq!(body["status"], "resolved");
}

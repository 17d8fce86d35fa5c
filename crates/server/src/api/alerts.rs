//! Alert lifecycle endpoints.
//!
//! - `/{id}/resolve` - resolve an active alert
//! - `/active` - the user's currently active alert, if any
//! - `/latest` - the user's most recent alert of any status

use crate::AppResources;
use crate::alerts::AlertLifecycle;
use crate::error::ResolveError;
use axum::{
    Extension, Json,
    extract::{Path, Query},
    response::IntoResponse,
};
use hyper::StatusCode;
use serde::Deserialize;
use serde_json::json;
use utoipa::IntoParams;
use utoipa_axum::{router::OpenApiRouter, routes};
use uuid::Uuid;

/// Tag for OpenAPI documentation.
pub const ALERTS_TAG: &str = "Alerts API";

#[derive(Debug, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
struct UserParams {
    user_id: Uuid,
}

/// Creates the alerts API router.
pub fn router() -> OpenApiRouter {
    OpenApiRouter::new()
        .routes(routes!(resolve_alert))
        .routes(routes!(active_alert))
        .routes(routes!(latest_alert))
}

#[tracing::instrument(skip(resources))]
#[utoipa::path(
    post,
    path = "/{id}/resolve",
    operation_id = "Resolve Alert",
    tag = ALERTS_TAG,
    summary = "Resolve an active alert",
    description = "Marks an active alert as resolved. Resolving an alert that is already \
                   resolved (or was a test) returns a conflict so callers never mistake a \
                   repeat resolution for a live one.",
    params(("id" = Uuid, Path, description = "Alert id")),
    responses(
        (status = 200, description = "The resolved alert", content_type = "application/json"),
        (status = 404, description = "No such alert", content_type = "application/json"),
        (status = 409, description = "Alert was not active", content_type = "application/json")
    )
)]
async fn resolve_alert(
    Extension(resources): Extension<AppResources>,
    Path(id): Path<Uuid>,
) -> impl IntoResponse {
    let lifecycle = AlertLifecycle::new(resources.db.clone());
    match lifecycle.resolve(id).await {
        Ok(alert) => (StatusCode::OK, Json(json!(alert))),
        Err(ResolveError::NotFound(_)) => (
            StatusCode::NOT_FOUND,
            Json(json!({ "error": "Alert not found", "code": "not_found" })),
        ),
        Err(ResolveError::Conflict { status }) => (
            StatusCode::CONFLICT,
            Json(json!({
                "error": "Alert is not active",
                "status": status,
                "code": "resolution_conflict",
            })),
        ),
        Err(ResolveError::Persistence(e)) => {
            tracing::error!(
                name = "api.resolve_alert.db_failed",
                target = concat!(env!("CARGO_PKG_NAME"), "::", module_path!()),
                error = %e,
                alert_id = %id,
                message = "Failed to resolve alert"
            );
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": "Failed to resolve alert", "code": "internal_server_error" })),
            )
        }
    }
}

#[tracing::instrument(skip(resources))]
#[utoipa::path(
    get,
    path = "/active",
    operation_id = "Active Alert",
    tag = ALERTS_TAG,
    summary = "Get the user's active alert",
    description = "Returns the user's currently active alert, or null when there is no live \
                   emergency. Resolved and test alerts are never returned here; use `/latest` \
                   for last-known-alert displays.",
    params(UserParams),
    responses(
        (status = 200, description = "The active alert or null", content_type = "application/json")
    )
)]
async fn active_alert(
    Extension(resources): Extension<AppResources>,
    Query(params): Query<UserParams>,
) -> impl IntoResponse {
    let lifecycle = AlertLifecycle::new(resources.db.clone());
    match lifecycle.active_alert(params.user_id).await {
        Ok(alert) => (StatusCode::OK, Json(json!(alert))),
        Err(e) => {
            tracing::error!(
                name = "api.active_alert.db_failed",
                target = concat!(env!("CARGO_PKG_NAME"), "::", module_path!()),
                error = %e,
                user_id = %params.user_id,
                message = "Failed to query active alert"
            );
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": "Failed to query alerts", "code": "internal_server_error" })),
            )
        }
    }
}

#[tracing::instrument(skip(resources))]
#[utoipa::path(
    get,
    path = "/latest",
    operation_id = "Latest Alert",
    tag = ALERTS_TAG,
    summary = "Get the user's most recent alert",
    params(UserParams),
    responses(
        (status = 200, description = "The most recent alert of any status, or null", content_type = "application/json")
    )
)]
async fn latest_alert(
    Extension(resources): Extension<AppResources>,
    Query(params): Query<UserParams>,
) -> impl IntoResponse {
    let lifecycle = AlertLifecycle::new(resources.db.clone());
    match lifecycle.latest_alert(params.user_id).await {
        Ok(alert) => (StatusCode::OK, Json(json!(alert))),
        Err(e) => {
            tracing::error!(
                name = "api.latest_alert.db_failed",
                target = concat!(env!("CARGO_PKG_NAME"), "::", module_path!()),
                error = %e,
                user_id = %params.user_id,
                message = "Failed to query latest alert"
            );
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": "Failed to query alerts", "code": "internal_server_error" })),
            )
        }
    }
}

//! The alert trigger endpoint.

use crate::AppResources;
use crate::dispatch::DispatchService;
use crate::error::DispatchError;
use axum::{Extension, Json, response::IntoResponse};
use hyper::StatusCode;
use serde::Deserialize;
use serde_json::json;
use utoipa::ToSchema;
use utoipa_axum::{router::OpenApiRouter, routes};
use uuid::Uuid;

/// Tag for OpenAPI documentation.
pub const SOS_TAG: &str = "SOS API";

#[derive(Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DispatchRequest {
    pub user_id: Uuid,
    pub latitude: f64,
    pub longitude: f64,
    #[serde(default)]
    pub accuracy: Option<f64>,
    #[serde(default)]
    pub is_test: bool,
}

/// Creates the dispatch API router.
pub fn router() -> OpenApiRouter {
    OpenApiRouter::new().routes(routes!(dispatch_alert))
}

#[tracing::instrument(skip(resources, payload), fields(user_id = %payload.user_id, is_test = payload.is_test))]
#[utoipa::path(
    post,
    path = "/dispatch",
    operation_id = "Dispatch Alert",
    tag = SOS_TAG,
    summary = "Trigger an emergency alert",
    description = "Persists an emergency alert at the given coordinates and notifies the user's \
                   emergency contacts over SMS.\n\n\
                   Delivery failures to individual contacts do not fail the request: the alert is \
                   considered sent once it is persisted, and the response lists which contacts \
                   could not be reached. Test alerts exercise the pipeline without contacting \
                   anyone.",
    request_body(content = DispatchRequest, description = "Alert coordinates and flags"),
    responses(
        (status = 200, description = "Alert dispatched (possibly with per-contact errors)", content_type = "application/json"),
        (status = 400, description = "Malformed coordinates or flags", content_type = "application/json"),
        (status = 429, description = "Rate limit exceeded; retryAfterSeconds tells the client when to try again", content_type = "application/json"),
        (status = 500, description = "Alert could not be created", content_type = "application/json")
    )
)]
async fn dispatch_alert(
    Extension(resources): Extension<AppResources>,
    Json(payload): Json<DispatchRequest>,
) -> impl IntoResponse {
    let service = DispatchService::new(
        resources.db.clone(),
        resources.gateway.clone(),
        resources.limiter.clone(),
    );

    match service
        .dispatch(
            payload.user_id,
            payload.latitude,
            payload.longitude,
            payload.accuracy,
            payload.is_test,
        )
        .await
    {
        Ok(summary) => (StatusCode::OK, Json(json!(summary))),
        Err(DispatchError::Validation(detail)) => (
            StatusCode::BAD_REQUEST,
            Json(json!({
                "success": false,
                "error": "Invalid request data",
                "details": detail,
                "code": "validation_error",
            })),
        ),
        Err(DispatchError::RateLimited {
            retry_after_seconds,
        }) => (
            StatusCode::TOO_MANY_REQUESTS,
            Json(json!({
                "success": false,
                "error": "Too many requests. Please try again later.",
                "retryAfterSeconds": retry_after_seconds,
                "code": "rate_limit_exceeded",
            })),
        ),
        Err(e) => {
            // Store or limiter trouble: detail stays in the logs, the
            // caller gets a generic failure.
            tracing::error!(
                name = "api.dispatch_alert.failed",
                target = concat!(env!("CARGO_PKG_NAME"), "::", module_path!()),
                error = %e,
                user_id = %payload.user_id,
                message = "Dispatch failed before the alert could be created"
            );
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({
                    "success": false,
                    "error": "Failed to process emergency alert",
                    "code": "internal_server_error",
                })),
            )
        }
    }
}

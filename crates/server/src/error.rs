use sea_orm::DbErr;
use thiserror::Error;

/// Errors surfaced by the messaging gateway for a single recipient.
///
/// These are always soft: one contact's failure is collected into the
/// dispatch summary and never aborts delivery to the other contacts.
#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("Timeout after {0:?} while delivering message")]
    Timeout(std::time::Duration),
    #[error("Gateway rejected message: {0}")]
    Rejected(String),
    #[error("Network error: {0}")]
    Network(String),
    #[error("Invalid destination number: {0}")]
    InvalidDestination(String),
}

/// Hard failures of the dispatch pipeline, mapped to HTTP statuses at the
/// API layer. Everything here happens before or during alert persistence;
/// once the alert row exists, failures downgrade to per-contact
/// [`GatewayError`]s inside the summary.
#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("Invalid request: {0}")]
    Validation(String),
    #[error("Too many requests, retry in {retry_after_seconds}s")]
    RateLimited { retry_after_seconds: u64 },
    #[error("Could not create alert: {0}")]
    Persistence(#[from] DbErr),
    #[error("Rate limiter unavailable: {0}")]
    Limiter(String),
}

impl DispatchError {
    /// True when no state was written and the caller can simply retry.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            DispatchError::RateLimited { .. } | DispatchError::Limiter(_)
        )
    }
}

/// Errors from alert lifecycle operations (resolution, active queries).
#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("Alert {0} not found")]
    NotFound(uuid::Uuid),
    #[error("Alert already in state `{status}`, cannot resolve again")]
    Conflict { status: String },
    #[error(transparent)]
    Persistence(#[from] DbErr),
}

/// Coarse location failure, mirroring what device geolocation stacks report.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LocationError {
    #[error("Location permission denied: {0}")]
    PermissionDenied(String),
    #[error("Position unavailable: {0}")]
    Unavailable(String),
    #[error("Timed out waiting for a position fix")]
    Timeout,
}

impl LocationError {
    /// Stable machine-readable code for logs and API payloads.
    pub fn code(&self) -> &'static str {
        match self {
            LocationError::PermissionDenied(_) => "permission_denied",
            LocationError::Unavailable(_) => "unavailable",
            LocationError::Timeout => "timeout",
        }
    }
}

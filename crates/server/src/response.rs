//! Wire types shared by the dispatch service, the HTTP surface and the
//! trigger driver. Field names follow the public API's camelCase contract.

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use utoipa::ToSchema;
use uuid::Uuid;

/// Tri-state alert status. Deliberately not a boolean: test alerts share
/// the pipeline but must never page real contacts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum AlertStatus {
    Active,
    Resolved,
    Test,
}

impl AlertStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AlertStatus::Active => "active",
            AlertStatus::Resolved => "resolved",
            AlertStatus::Test => "test",
        }
    }
}

impl std::fmt::Display for AlertStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for AlertStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(AlertStatus::Active),
            "resolved" => Ok(AlertStatus::Resolved),
            "test" => Ok(AlertStatus::Test),
            other => Err(format!("unknown alert status `{other}`")),
        }
    }
}

/// Per-contact delivery failure, soft by contract.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ContactDeliveryError {
    pub contact_id: Uuid,
    pub error: String,
}

/// Outcome of one dispatch. A dispatch that persisted its alert is a
/// success even when some (or all) contacts were unreachable; callers
/// surface a degraded-success notice when `contacts_notified` falls short
/// of `total_contacts`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DispatchSummary {
    pub success: bool,
    pub alert_id: Uuid,
    pub is_test: bool,
    pub contacts_notified: u32,
    pub total_contacts: u32,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<ContactDeliveryError>,
    pub message: String,
    #[serde(with = "time::serde::rfc3339")]
    pub timestamp: OffsetDateTime,
}

impl DispatchSummary {
    /// True when the alert went out but at least one contact was missed.
    pub fn is_degraded(&self) -> bool {
        !self.is_test && self.contacts_notified < self.total_contacts
    }
}

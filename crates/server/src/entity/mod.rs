//! Database entities for the emergency pipeline.
//!
//! All tables are owned by the `migration` crate; see there for the schema
//! history. Collaborator tables (profiles, listings, ...) are not modeled
//! here — only the columns this service reads.

pub mod emergency_alert;
pub mod emergency_contact;
pub mod emergency_settings;
pub mod notification_log;
pub mod profile;

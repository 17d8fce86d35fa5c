//! Emergency alert pipeline for the AquaLink safety platform.
//!
//! A user in distress triggers an alert that acquires their position,
//! persists a durable alert record, notifies every registered emergency
//! contact over SMS and tracks the per-contact outcome so a partially
//! failed fan-out still reports what actually happened.

use std::sync::Arc;

use sea_orm::DatabaseConnection;

use crate::config::AppConfig;
use crate::dispatch::SmsGateway;
use crate::rate_limit::RateLimiter;

pub mod alerts;
pub mod api;
pub mod config;
pub mod dispatch;
pub mod entity;
pub mod error;
pub mod location;
pub mod rate_limit;
pub mod response;
pub mod trigger;
pub mod validation;

#[derive(Clone)]
pub struct AppResources {
    pub db: Arc<DatabaseConnection>,
    pub gateway: Arc<dyn SmsGateway>,
    pub limiter: Arc<dyn RateLimiter>,
    pub config: Arc<AppConfig>,
}

use serde::Deserialize;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration build error: {0}")]
    Build(#[from] config::ConfigError),
    #[error("Invalid configuration: {0}")]
    Validation(String),
}

/// Outbound SMS gateway credentials and endpoint.
///
/// The gateway is any HTTP service accepting `(destination, body)` and
/// returning a provider message id; the exact provider protocol is not
/// this service's concern.
#[derive(Clone, Debug, Deserialize)]
pub struct SmsConfig {
    pub api_url: String,
    pub account_sid: String,
    pub auth_token: String,
    /// Sender number in canonical `+<countrycode><digits>` form.
    pub from_number: String,
    /// Per-recipient delivery timeout so one unresponsive gateway endpoint
    /// cannot stall the whole fan-out.
    #[serde(default = "default_send_timeout_secs")]
    pub send_timeout_secs: u64,
}

impl SmsConfig {
    pub fn send_timeout(&self) -> Duration {
        Duration::from_secs(self.send_timeout_secs)
    }
}

/// Sliding-window admission limits for the dispatch endpoint.
#[derive(Clone, Debug, Deserialize)]
pub struct RateLimitConfig {
    #[serde(default = "default_rate_limit_max_requests")]
    pub max_requests: u64,
    #[serde(default = "default_rate_limit_window_secs")]
    pub window_secs: u64,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            max_requests: default_rate_limit_max_requests(),
            window_secs: default_rate_limit_window_secs(),
        }
    }
}

#[derive(Clone, Debug, Deserialize)]
pub struct AppConfig {
    pub database_url: String,
    pub redis_url: String,
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,
    pub sms: SmsConfig,
    #[serde(default)]
    pub rate_limit: RateLimitConfig,
}

fn default_bind_addr() -> String {
    "0.0.0.0:8080".to_string()
}

fn default_send_timeout_secs() -> u64 {
    10
}

fn default_rate_limit_max_requests() -> u64 {
    5
}

fn default_rate_limit_window_secs() -> u64 {
    10 * 60
}

/// Load application configuration from `config.yaml` + environment overrides.
///
/// Environment variable override convention: any var matching the key path
/// separated by double underscores (e.g. `SMS__FROM_NUMBER`) overrides the
/// file value.
///
/// Returns a `ConfigError` instead of panicking so the caller can decide how
/// to fail.
pub fn load_config() -> Result<AppConfig, ConfigError> {
    use config::{Config, Environment, File};
    let cfg = Config::builder()
        .add_source(File::with_name("config.yaml"))
        .add_source(Environment::default().separator("__"))
        .build()?;

    let app: AppConfig = cfg.try_deserialize()?;
    validate(&app)?;
    Ok(app)
}

fn validate(app: &AppConfig) -> Result<(), ConfigError> {
    if !crate::validation::phone::is_canonical_phone(&app.sms.from_number) {
        return Err(ConfigError::Validation(format!(
            "sms.from_number `{}` is not a canonical +<countrycode><digits> number",
            app.sms.from_number
        )));
    }
    if app.sms.send_timeout_secs == 0 {
        return Err(ConfigError::Validation(
            "sms.send_timeout_secs must be > 0".into(),
        ));
    }
    if app.rate_limit.max_requests == 0 {
        return Err(ConfigError::Validation(
            "rate_limit.max_requests must be > 0".into(),
        ));
    }
    if app.rate_limit.window_secs == 0 {
        return Err(ConfigError::Validation(
            "rate_limit.window_secs must be > 0".into(),
        ));
    }
    Ok(())
}

/// Convenience helper for binaries wanting panic-on-error behaviour.
pub fn load_config_or_panic() -> AppConfig {
    match load_config() {
        Ok(c) => c,
        Err(e) => panic!("Failed to load configuration: {e}"),
    }
}

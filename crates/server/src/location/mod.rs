//! Position acquisition: one-shot fetch and continuous watch with
//! listener fan-out over a single underlying sensor subscription.

pub mod service;

pub use service::{LocationListener, LocationService};

use crate::error::LocationError;
use time::OffsetDateTime;
use tokio::sync::mpsc;

/// A single position fix. Everything except the coordinates and the
/// timestamp is best-effort and may be absent depending on the sensor.
#[derive(Debug, Clone, PartialEq)]
pub struct Position {
    pub latitude: f64,
    pub longitude: f64,
    pub accuracy: Option<f64>,
    pub timestamp: OffsetDateTime,
    pub speed: Option<f64>,
    pub heading: Option<f64>,
    pub altitude: Option<f64>,
}

impl Position {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
            accuracy: None,
            timestamp: OffsetDateTime::now_utc(),
            speed: None,
            heading: None,
            altitude: None,
        }
    }

    pub fn with_accuracy(mut self, accuracy: f64) -> Self {
        self.accuracy = Some(accuracy);
        self
    }
}

/// What flows from the sensor to every listener.
pub type LocationUpdate = Result<Position, LocationError>;

/// Hints passed down to the platform watch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WatchOptions {
    pub high_accuracy: bool,
    /// Oldest cached fix the platform may hand back.
    pub max_age: std::time::Duration,
    /// Per-fix timeout at the platform layer.
    pub timeout: std::time::Duration,
}

impl Default for WatchOptions {
    fn default() -> Self {
        Self {
            high_accuracy: true,
            max_age: std::time::Duration::from_secs(10),
            timeout: std::time::Duration::from_secs(5),
        }
    }
}

/// Seam to the device's location capability.
///
/// `start_watch` begins a platform watch and returns the channel carrying
/// its updates; dropping the receiver ends the watch. The service layers
/// listener fan-out and replay on top, so implementations stay dumb.
pub trait PositionSource: Send + Sync + 'static {
    fn start_watch(&self, options: WatchOptions) -> mpsc::UnboundedReceiver<LocationUpdate>;
}

//! Watcher over the single underlying sensor subscription.
//!
//! The sensor watch is process-wide singleton state: started lazily when
//! the first listener registers, stopped on request or when the service is
//! dropped. Listeners are added and removed independently; a new listener
//! immediately receives the most recent known fix or error instead of
//! waiting for the next sensor tick.

use crate::error::LocationError;
use crate::location::{LocationUpdate, Position, PositionSource, WatchOptions};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

pub struct LocationService {
    source: Arc<dyn PositionSource>,
    options: WatchOptions,
    shared: Arc<Shared>,
}

struct Shared {
    state: Mutex<WatchState>,
}

#[derive(Default)]
struct WatchState {
    last: Option<LocationUpdate>,
    listeners: HashMap<u64, mpsc::UnboundedSender<LocationUpdate>>,
    next_id: u64,
    pump: Option<JoinHandle<()>>,
}

impl Shared {
    fn publish(&self, update: LocationUpdate) {
        let mut state = self.state.lock().expect("location state poisoned");
        state.last = Some(update.clone());
        // A listener whose receiver is gone is dropped from the registry.
        state
            .listeners
            .retain(|_, tx| tx.send(update.clone()).is_ok());
    }
}

/// Handle for one registered listener. Dropping it removes the
/// registration; the sensor watch itself keeps running for the others.
pub struct LocationListener {
    id: u64,
    rx: mpsc::UnboundedReceiver<LocationUpdate>,
    shared: Arc<Shared>,
}

impl LocationListener {
    /// Next update, or `None` once the service shut down.
    pub async fn next(&mut self) -> Option<LocationUpdate> {
        self.rx.recv().await
    }
}

impl Drop for LocationListener {
    fn drop(&mut self) {
        if let Ok(mut state) = self.shared.state.lock() {
            state.listeners.remove(&self.id);
        }
    }
}

impl LocationService {
    pub fn new(source: Arc<dyn PositionSource>) -> Self {
        Self::with_options(source, WatchOptions::default())
    }

    pub fn with_options(source: Arc<dyn PositionSource>, options: WatchOptions) -> Self {
        Self {
            source,
            options,
            shared: Arc::new(Shared {
                state: Mutex::new(WatchState::default()),
            }),
        }
    }

    /// Start the underlying sensor watch if it is not already running.
    pub fn start_tracking(&self) {
        let mut state = self.shared.state.lock().expect("location state poisoned");
        if state.pump.is_some() {
            return;
        }
        let mut rx = self.source.start_watch(self.options);
        let shared = self.shared.clone();
        state.pump = Some(tokio::spawn(async move {
            while let Some(update) = rx.recv().await {
                shared.publish(update);
            }
        }));
    }

    /// Stop the underlying sensor watch. Safe to call with nothing active.
    pub fn stop_tracking(&self) {
        let mut state = self.shared.state.lock().expect("location state poisoned");
        if let Some(pump) = state.pump.take() {
            pump.abort();
        }
    }

    /// Register a listener, starting the sensor watch lazily.
    ///
    /// The most recent known update is replayed to the new listener right
    /// away so it does not wait for the next sensor tick.
    pub fn watch(&self) -> LocationListener {
        self.start_tracking();
        self.register(true)
    }

    fn register(&self, replay: bool) -> LocationListener {
        let (tx, rx) = mpsc::unbounded_channel();
        let mut state = self.shared.state.lock().expect("location state poisoned");
        if replay {
            if let Some(last) = &state.last {
                // Send cannot fail here, we still hold the receiver.
                let _ = tx.send(last.clone());
            }
        }
        let id = state.next_id;
        state.next_id += 1;
        state.listeners.insert(id, tx);
        LocationListener {
            id,
            rx,
            shared: self.shared.clone(),
        }
    }

    /// One-shot fetch racing a timeout timer. Whichever resolves first
    /// wins; a fix arriving after the deadline is simply ignored. The
    /// underlying platform watch is not cancelled.
    pub async fn acquire_once(&self, timeout: Duration) -> Result<Position, LocationError> {
        self.start_tracking();
        // Fresh registration without replay: a one-shot fetch wants a live
        // fix, not whatever the watch last saw.
        let mut listener = self.register(false);
        tokio::select! {
            update = listener.next() => match update {
                Some(Ok(position)) => Ok(position),
                Some(Err(e)) => Err(e),
                None => Err(LocationError::Unavailable("position source closed".into())),
            },
            _ = tokio::time::sleep(timeout) => Err(LocationError::Timeout),
        }
    }

    pub fn last_known(&self) -> Option<LocationUpdate> {
        self.shared
            .state
            .lock()
            .expect("location state poisoned")
            .last
            .clone()
    }
}

impl Drop for LocationService {
    fn drop(&mut self) {
        self.stop_tracking();
    }
}

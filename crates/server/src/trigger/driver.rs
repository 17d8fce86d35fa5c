//! Async driver for the trigger state machine.
//!
//! Owns the timers and the in-flight tasks the pure machine only names:
//! the confirmation grace window, the 1 Hz countdown ticker, the
//! concurrent location acquisition and the dispatch call. All of them
//! feed events back into one event loop, so every transition happens on a
//! single logical thread and the machine's no-op rules are the only
//! re-entrancy guard needed.

use crate::entity::emergency_settings;
use crate::location::{LocationService, Position};
use crate::response::DispatchSummary;
use crate::trigger::machine::{
    CONFIRM_GRACE_SECONDS, DEFAULT_COUNTDOWN_SECONDS, Effect, TriggerEvent, TriggerState,
    VibrationPattern, transition,
};
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;

/// How long the concurrent location acquisition may take before the
/// trigger aborts with a location error.
pub const FIX_TIMEOUT: Duration = Duration::from_secs(10);

/// Seam to the server's dispatch endpoint. The error string is the
/// user-facing message; transport detail stays in the implementation.
#[async_trait]
pub trait DispatchClient: Send + Sync {
    async fn send_alert(
        &self,
        position: &Position,
        is_test: bool,
    ) -> Result<DispatchSummary, String>;
}

/// Haptic feedback seam. Vibration is a side effect of ticking and of
/// outcomes, never part of the transition logic.
pub trait Feedback: Send + Sync {
    fn vibrate(&self, pattern: VibrationPattern);
}

/// Feedback sink for platforms without a vibration motor.
pub struct NoFeedback;

impl Feedback for NoFeedback {
    fn vibrate(&self, _pattern: VibrationPattern) {}
}

/// What the UI hears back from the trigger.
#[derive(Debug, Clone, PartialEq)]
pub enum TriggerNotice {
    /// Alert dispatched. The summary may still be degraded
    /// (`contacts_notified < total_contacts`); surfacing that is the
    /// caller's job.
    Sent(DispatchSummary),
    Failed { message: String },
}

#[derive(Debug, Clone)]
pub struct TriggerOptions {
    pub countdown_seconds: u32,
    pub is_test: bool,
    pub fix_timeout: Duration,
}

impl Default for TriggerOptions {
    fn default() -> Self {
        Self {
            countdown_seconds: DEFAULT_COUNTDOWN_SECONDS,
            is_test: false,
            fix_timeout: FIX_TIMEOUT,
        }
    }
}

impl TriggerOptions {
    /// Build options from stored settings, falling back to the safe
    /// defaults when the user never saved any. The countdown is clamped
    /// to the supported 1..=30 range.
    pub fn from_settings(settings: Option<&emergency_settings::Model>) -> Self {
        let countdown_seconds = settings
            .map(|s| s.countdown_seconds.clamp(1, 30) as u32)
            .unwrap_or(DEFAULT_COUNTDOWN_SECONDS);
        Self {
            countdown_seconds,
            ..Self::default()
        }
    }
}

enum LoopMsg {
    Event(TriggerEvent),
    DispatchDone(Result<DispatchSummary, String>),
}

/// Handle to a running trigger. Taps go in through [`SosTrigger::press`];
/// outcomes come back on the notice channel returned by [`SosTrigger::spawn`].
pub struct SosTrigger {
    msgs: mpsc::UnboundedSender<LoopMsg>,
    state_rx: watch::Receiver<TriggerState>,
    event_loop: JoinHandle<()>,
}

impl SosTrigger {
    pub fn spawn(
        location: Arc<LocationService>,
        client: Arc<dyn DispatchClient>,
        feedback: Arc<dyn Feedback>,
        options: TriggerOptions,
    ) -> (Self, mpsc::UnboundedReceiver<TriggerNotice>) {
        let (msgs_tx, msgs_rx) = mpsc::unbounded_channel();
        let (notices_tx, notices_rx) = mpsc::unbounded_channel();
        let (state_tx, state_rx) = watch::channel(TriggerState::Idle);
        let event_loop = EventLoop {
            state: TriggerState::Idle,
            options,
            location,
            client,
            feedback,
            msgs: msgs_tx.clone(),
            notices: notices_tx,
            state_tx,
            confirm_timer: None,
            ticker: None,
            fix_task: None,
            pending_summary: None,
        };
        let handle = tokio::spawn(event_loop.run(msgs_rx));
        (
            Self {
                msgs: msgs_tx,
                state_rx,
                event_loop: handle,
            },
            notices_rx,
        )
    }

    /// Observe state changes, e.g. to render the countdown.
    pub fn state(&self) -> watch::Receiver<TriggerState> {
        self.state_rx.clone()
    }

    /// Register a user tap. Never blocks; input during an in-flight
    /// dispatch is discarded by the machine.
    pub fn press(&self) {
        let _ = self.msgs.send(LoopMsg::Event(TriggerEvent::Pressed));
    }
}

impl Drop for SosTrigger {
    fn drop(&mut self) {
        self.event_loop.abort();
    }
}

struct EventLoop {
    state: TriggerState,
    options: TriggerOptions,
    location: Arc<LocationService>,
    client: Arc<dyn DispatchClient>,
    feedback: Arc<dyn Feedback>,
    msgs: mpsc::UnboundedSender<LoopMsg>,
    notices: mpsc::UnboundedSender<TriggerNotice>,
    state_tx: watch::Sender<TriggerState>,
    confirm_timer: Option<JoinHandle<()>>,
    ticker: Option<JoinHandle<()>>,
    fix_task: Option<JoinHandle<()>>,
    /// Summary parked between dispatch completion and the machine's
    /// SurfaceSuccess effect.
    pending_summary: Option<DispatchSummary>,
}

impl EventLoop {
    async fn run(mut self, mut msgs: mpsc::UnboundedReceiver<LoopMsg>) {
        while let Some(msg) = msgs.recv().await {
            let event = match msg {
                LoopMsg::Event(event) => event,
                LoopMsg::DispatchDone(Ok(summary)) => {
                    self.pending_summary = Some(summary);
                    TriggerEvent::DispatchSucceeded
                }
                LoopMsg::DispatchDone(Err(message)) => TriggerEvent::DispatchFailed(message),
            };

            let (next, effects) = transition(
                std::mem::replace(&mut self.state, TriggerState::Idle),
                event,
                self.options.countdown_seconds,
            );
            self.state = next;
            for effect in effects {
                self.apply(effect);
            }
            self.reap_stale_tasks();
            let _ = self.state_tx.send(self.state.clone());
        }
    }

    fn apply(&mut self, effect: Effect) {
        match effect {
            Effect::StartConfirmWindow => {
                let msgs = self.msgs.clone();
                self.confirm_timer = Some(tokio::spawn(async move {
                    tokio::time::sleep(Duration::from_secs(CONFIRM_GRACE_SECONDS)).await;
                    let _ = msgs.send(LoopMsg::Event(TriggerEvent::ConfirmExpired));
                }));
            }
            Effect::StartCountdown { .. } => {
                let msgs = self.msgs.clone();
                self.ticker = Some(tokio::spawn(async move {
                    let mut interval = tokio::time::interval(Duration::from_secs(1));
                    interval.tick().await; // consume the immediate first tick
                    loop {
                        interval.tick().await;
                        if msgs.send(LoopMsg::Event(TriggerEvent::Tick)).is_err() {
                            break;
                        }
                    }
                }));
                // Acquisition starts with the countdown, not after it —
                // the slow GPS fix and the visible timer overlap.
                let msgs = self.msgs.clone();
                let location = self.location.clone();
                let fix_timeout = self.options.fix_timeout;
                self.fix_task = Some(tokio::spawn(async move {
                    let event = match location.acquire_once(fix_timeout).await {
                        Ok(position) => TriggerEvent::Fix(position),
                        Err(e) => TriggerEvent::FixFailed(e),
                    };
                    let _ = msgs.send(LoopMsg::Event(event));
                }));
            }
            Effect::StopCountdown => {
                if let Some(ticker) = self.ticker.take() {
                    ticker.abort();
                }
            }
            Effect::Vibrate(pattern) => self.feedback.vibrate(pattern),
            Effect::Dispatch { position } => {
                let msgs = self.msgs.clone();
                let client = self.client.clone();
                let is_test = self.options.is_test;
                // Deliberately unguarded: once issued, the dispatch runs
                // to completion. A sent alert cannot be recalled.
                tokio::spawn(async move {
                    let result = client.send_alert(&position, is_test).await;
                    let _ = msgs.send(LoopMsg::DispatchDone(result));
                });
            }
            Effect::SurfaceSuccess => {
                if let Some(summary) = self.pending_summary.take() {
                    let _ = self.notices.send(TriggerNotice::Sent(summary));
                }
            }
            Effect::SurfaceFailure(message) => {
                let _ = self.notices.send(TriggerNotice::Failed { message });
            }
        }
    }

    /// Abort helper tasks that no longer match the current state, so a
    /// timer from an abandoned confirmation or a fix from a cancelled
    /// countdown cannot leak into a later attempt.
    fn reap_stale_tasks(&mut self) {
        if !matches!(self.state, TriggerState::Confirming) {
            if let Some(timer) = self.confirm_timer.take() {
                timer.abort();
            }
        }
        if !matches!(self.state, TriggerState::CountingDown { .. }) {
            if let Some(ticker) = self.ticker.take() {
                ticker.abort();
            }
        }
        if !matches!(
            self.state,
            TriggerState::CountingDown { .. } | TriggerState::AwaitingFix
        ) {
            if let Some(fix_task) = self.fix_task.take() {
                fix_task.abort();
            }
        }
    }
}

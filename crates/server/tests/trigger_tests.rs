//! Tests for the SOS trigger driver: countdown timing, cancellation,
//! the concurrent location fix and the re-entrancy guard. All tests run
//! with paused time, so "seconds" elapse instantly and deterministically.

use aqualink_sos::error::LocationError;
use aqualink_sos::location::{LocationService, LocationUpdate, Position, PositionSource, WatchOptions};
use aqualink_sos::response::DispatchSummary;
use aqualink_sos::trigger::{
    DispatchClient, Feedback, SosTrigger, TriggerNotice, TriggerState, VibrationPattern,
    driver::TriggerOptions,
};
use async_trait::async_trait;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use time::OffsetDateTime;
use tokio::sync::mpsc;
use uuid::Uuid;

// =============================================================================
// Fakes
// =============================================================================

/// Sensor that replays a script of (delay, update) pairs per watch.
struct ScriptedSensor {
    script: Vec<(Duration, LocationUpdate)>,
}

impl ScriptedSensor {
    fn new(script: Vec<(Duration, LocationUpdate)>) -> Arc<Self> {
        Arc::new(Self { script })
    }
}

impl PositionSource for ScriptedSensor {
    fn start_watch(&self, _options: WatchOptions) -> mpsc::UnboundedReceiver<LocationUpdate> {
        let (tx, rx) = mpsc::unbounded_channel();
        let script = self.script.clone();
        tokio::spawn(async move {
            for (delay, update) in script {
                tokio::time::sleep(delay).await;
                if tx.send(update).is_err() {
                    break;
                }
            }
        });
        rx
    }
}

struct FakeDispatchClient {
    calls: Mutex<Vec<(Position, bool)>>,
    delay: Duration,
    result: Result<DispatchSummary, String>,
}

impl FakeDispatchClient {
    fn succeeding(contacts_notified: u32, total_contacts: u32) -> Arc<Self> {
        Arc::new(Self {
            calls: Mutex::new(Vec::new()),
            delay: Duration::ZERO,
            result: Ok(summary(contacts_notified, total_contacts)),
        })
    }

    fn slow(delay: Duration) -> Arc<Self> {
        Arc::new(Self {
            calls: Mutex::new(Vec::new()),
            delay,
            result: Ok(summary(1, 1)),
        })
    }

    fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait]
impl DispatchClient for FakeDispatchClient {
    async fn send_alert(
        &self,
        position: &Position,
        is_test: bool,
    ) -> Result<DispatchSummary, String> {
        self.calls.lock().unwrap().push((position.clone(), is_test));
        tokio::time::sleep(self.delay).await;
        self.result.clone()
    }
}

#[derive(Default)]
struct CountingFeedback {
    patterns: Mutex<Vec<VibrationPattern>>,
}

impl Feedback for CountingFeedback {
    fn vibrate(&self, pattern: VibrationPattern) {
        self.patterns.lock().unwrap().push(pattern);
    }
}

fn summary(contacts_notified: u32, total_contacts: u32) -> DispatchSummary {
    DispatchSummary {
        success: true,
        alert_id: Uuid::new_v4(),
        is_test: false,
        contacts_notified,
        total_contacts,
        errors: vec![],
        message: format!("Emergency alert sent to {contacts_notified} of {total_contacts} contact(s)"),
        timestamp: OffsetDateTime::now_utc(),
    }
}

fn fix_at(delay_secs: u64) -> Vec<(Duration, LocationUpdate)> {
    vec![(
        Duration::from_secs(delay_secs),
        Ok(Position::new(-17.82, 31.05).with_accuracy(8.0)),
    )]
}

fn spawn_trigger(
    sensor: Arc<ScriptedSensor>,
    client: Arc<FakeDispatchClient>,
    countdown_seconds: u32,
) -> (SosTrigger, mpsc::UnboundedReceiver<TriggerNotice>) {
    let location = Arc::new(LocationService::new(sensor));
    SosTrigger::spawn(
        location,
        client,
        Arc::new(CountingFeedback::default()),
        TriggerOptions {
            countdown_seconds,
            ..TriggerOptions::default()
        },
    )
}

// =============================================================================
// Scenarios
// =============================================================================

#[tokio::test(start_paused = true)]
async fn double_tap_dispatches_after_countdown_with_early_fix() {
    // Settings say 3 seconds; the GPS fix lands after 1. Dispatch must
    // wait for the full countdown and then fire immediately.
    let client = FakeDispatchClient::succeeding(2, 2);
    let (trigger, mut notices) = spawn_trigger(ScriptedSensor::new(fix_at(1)), client.clone(), 3);

    let start = tokio::time::Instant::now();
    trigger.press();
    trigger.press();

    let notice = notices.recv().await.expect("trigger loop gone");
    let elapsed = start.elapsed();

    match notice {
        TriggerNotice::Sent(summary) => {
            assert_eq!(summary.contacts_notified, 2);
            assert_eq!(summary.total_contacts, 2);
        }
        other => panic!("expected Sent, got {other:?}"),
    }
    assert!(elapsed >= Duration::from_secs(3), "fired before countdown end");
    assert!(elapsed < Duration::from_secs(4), "fired too late: {elapsed:?}");

    let calls = client.calls.lock().unwrap().clone();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].0.latitude, -17.82);
    assert!(!calls[0].1, "not a test dispatch");
}

#[tokio::test(start_paused = true)]
async fn cancel_before_zero_never_dispatches() {
    let client = FakeDispatchClient::succeeding(1, 1);
    let (trigger, mut notices) = spawn_trigger(ScriptedSensor::new(fix_at(1)), client.clone(), 5);

    trigger.press();
    trigger.press();
    tokio::time::sleep(Duration::from_millis(2500)).await;
    // Third tap cancels mid-countdown.
    trigger.press();

    tokio::time::sleep(Duration::from_secs(20)).await;
    assert_eq!(client.call_count(), 0, "cancelled countdown must not send");
    assert!(notices.try_recv().is_err(), "no outcome for a cancelled alert");
    assert_eq!(*trigger.state().borrow(), TriggerState::Idle);
}

#[tokio::test(start_paused = true)]
async fn countdown_end_waits_for_late_fix() {
    // Countdown is 2s but the fix takes 5s: dispatch is delayed until the
    // position resolves, not skipped and not fired blind.
    let client = FakeDispatchClient::succeeding(1, 1);
    let (trigger, mut notices) = spawn_trigger(ScriptedSensor::new(fix_at(5)), client.clone(), 2);

    let start = tokio::time::Instant::now();
    trigger.press();
    trigger.press();

    let notice = notices.recv().await.expect("trigger loop gone");
    let elapsed = start.elapsed();

    assert!(matches!(notice, TriggerNotice::Sent(_)));
    assert!(elapsed >= Duration::from_secs(5), "dispatched without coordinates");
    assert_eq!(client.call_count(), 1);
}

#[tokio::test(start_paused = true)]
async fn fix_failure_aborts_without_waiting_for_timer() {
    let sensor = ScriptedSensor::new(vec![(
        Duration::from_secs(1),
        Err(LocationError::Unavailable("no satellites".into())),
    )]);
    let client = FakeDispatchClient::succeeding(1, 1);
    let (trigger, mut notices) = spawn_trigger(sensor, client.clone(), 30);

    let start = tokio::time::Instant::now();
    trigger.press();
    trigger.press();

    let notice = notices.recv().await.expect("trigger loop gone");
    let elapsed = start.elapsed();

    match notice {
        TriggerNotice::Failed { message } => assert!(message.contains("no satellites")),
        other => panic!("expected Failed, got {other:?}"),
    }
    assert!(
        elapsed < Duration::from_secs(30),
        "must abort before the countdown would have finished"
    );
    assert_eq!(client.call_count(), 0);
    assert_eq!(*trigger.state().borrow(), TriggerState::Idle);
}

#[tokio::test(start_paused = true)]
async fn taps_during_inflight_dispatch_are_ignored() {
    let client = FakeDispatchClient::slow(Duration::from_secs(5));
    let (trigger, mut notices) = spawn_trigger(ScriptedSensor::new(fix_at(0)), client.clone(), 1);

    trigger.press();
    trigger.press();

    let mut state = trigger.state();
    state
        .wait_for(|s| matches!(s, TriggerState::Sending { .. }))
        .await
        .expect("trigger loop gone");

    // Hammer the button while the dispatch is in flight.
    trigger.press();
    trigger.press();
    trigger.press();

    let notice = notices.recv().await.expect("trigger loop gone");
    assert!(matches!(notice, TriggerNotice::Sent(_)));
    assert_eq!(client.call_count(), 1, "re-entrancy guard failed");
    assert!(notices.try_recv().is_err(), "exactly one outcome expected");
}

#[tokio::test(start_paused = true)]
async fn confirmation_expires_after_grace_window() {
    let client = FakeDispatchClient::succeeding(1, 1);
    let (trigger, _notices) = spawn_trigger(ScriptedSensor::new(fix_at(1)), client.clone(), 3);

    trigger.press();
    let mut state = trigger.state();
    state
        .wait_for(|s| *s == TriggerState::Confirming)
        .await
        .expect("trigger loop gone");

    // No second tap: the prompt auto-reverts after the grace window.
    state
        .wait_for(|s| *s == TriggerState::Idle)
        .await
        .expect("trigger loop gone");

    // A single fresh tap only re-arms the confirmation, it never starts
    // a countdown on its own.
    trigger.press();
    state
        .wait_for(|s| *s == TriggerState::Confirming)
        .await
        .expect("trigger loop gone");
    assert_eq!(client.call_count(), 0);
}

//! Pure trigger state machine.
//!
//! States: `Idle → Confirming → CountingDown → Sending`, with an
//! `AwaitingFix` stop between countdown and dispatch when the timer hits
//! zero before the position does. Every input goes through [`transition`];
//! anything not listed for the current state is a no-op, which is what
//! makes rapid double-taps and stale timer callbacks harmless.

use crate::error::LocationError;
use crate::location::Position;

/// Seconds the confirmation prompt stays up waiting for the second tap.
pub const CONFIRM_GRACE_SECONDS: u64 = 3;

/// Countdown length when the user has no stored settings.
pub const DEFAULT_COUNTDOWN_SECONDS: u32 = 5;

#[derive(Debug, Clone, PartialEq)]
pub enum TriggerState {
    Idle,
    /// First tap seen, waiting for the confirming second tap.
    Confirming,
    /// Countdown running; location acquisition runs concurrently and
    /// parks its result in `fix` when it lands early.
    CountingDown {
        remaining: u32,
        fix: Option<Position>,
    },
    /// Timer reached zero before the position did. The timer is not a
    /// substitute for having coordinates, so dispatch waits here.
    AwaitingFix,
    /// Dispatch call in flight. User input is ignored until the outcome.
    Sending { position: Position },
}

#[derive(Debug, Clone, PartialEq)]
pub enum TriggerEvent {
    /// User tap on the SOS surface.
    Pressed,
    /// The confirmation grace window elapsed without a second tap.
    ConfirmExpired,
    /// 1 Hz countdown tick.
    Tick,
    Fix(Position),
    FixFailed(LocationError),
    DispatchSucceeded,
    DispatchFailed(String),
}

/// Haptic patterns, interpreted by the platform feedback seam.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VibrationPattern {
    Tap,
    CountdownTick,
    Success,
    Failure,
}

/// Side effects requested by a transition. The driver executes these;
/// the machine never touches a timer or a socket itself.
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    /// Arm the confirmation grace timer.
    StartConfirmWindow,
    /// Start the 1 Hz countdown ticker and, concurrently, the location
    /// acquisition. Acquisition is deliberately not deferred to the end
    /// of the countdown.
    StartCountdown { seconds: u32 },
    /// Stop the countdown ticker.
    StopCountdown,
    Vibrate(VibrationPattern),
    /// Issue the dispatch call. Once issued it runs to completion; there
    /// is no mid-flight cancellation.
    Dispatch { position: Position },
    SurfaceSuccess,
    SurfaceFailure(String),
}

/// The single transition function. `countdown_seconds` comes from the
/// user's settings (already clamped and defaulted by the caller).
pub fn transition(
    state: TriggerState,
    event: TriggerEvent,
    countdown_seconds: u32,
) -> (TriggerState, Vec<Effect>) {
    use TriggerEvent::*;
    use TriggerState::*;

    match (state, event) {
        (Idle, Pressed) => (
            Confirming,
            vec![Effect::StartConfirmWindow, Effect::Vibrate(VibrationPattern::Tap)],
        ),

        (Confirming, Pressed) => {
            let seconds = countdown_seconds.max(1);
            (
                CountingDown {
                    remaining: seconds,
                    fix: None,
                },
                vec![Effect::StartCountdown { seconds }],
            )
        }
        (Confirming, ConfirmExpired) => (Idle, vec![]),

        // Cancellation: effective immediately, nothing is sent, nothing
        // partial survives.
        (CountingDown { .. }, Pressed) => (
            Idle,
            vec![Effect::StopCountdown, Effect::Vibrate(VibrationPattern::Tap)],
        ),
        (CountingDown { remaining, fix }, Tick) => {
            if remaining > 1 {
                (
                    CountingDown {
                        remaining: remaining - 1,
                        fix,
                    },
                    vec![Effect::Vibrate(VibrationPattern::CountdownTick)],
                )
            } else {
                match fix {
                    Some(position) => (
                        Sending {
                            position: position.clone(),
                        },
                        vec![Effect::StopCountdown, Effect::Dispatch { position }],
                    ),
                    None => (AwaitingFix, vec![Effect::StopCountdown]),
                }
            }
        }
        (CountingDown { remaining, .. }, Fix(position)) => (
            CountingDown {
                remaining,
                fix: Some(position),
            },
            vec![],
        ),
        // Acquisition failed before the timer ran out: abort right away
        // instead of letting the user watch a countdown that cannot send.
        (CountingDown { .. }, FixFailed(e)) => (
            Idle,
            vec![Effect::StopCountdown, Effect::SurfaceFailure(e.to_string())],
        ),

        (AwaitingFix, Fix(position)) => (
            Sending {
                position: position.clone(),
            },
            vec![Effect::Dispatch { position }],
        ),
        (AwaitingFix, FixFailed(e)) => (Idle, vec![Effect::SurfaceFailure(e.to_string())]),
        (AwaitingFix, Pressed) => (
            Idle,
            vec![Effect::Vibrate(VibrationPattern::Tap)],
        ),

        (Sending { .. }, DispatchSucceeded) => (
            Idle,
            vec![
                Effect::Vibrate(VibrationPattern::Success),
                Effect::SurfaceSuccess,
            ],
        ),
        (Sending { .. }, DispatchFailed(message)) => (
            Idle,
            vec![
                Effect::Vibrate(VibrationPattern::Failure),
                Effect::SurfaceFailure(message),
            ],
        ),

        // Everything else is stale or re-entrant input: a tap while a
        // dispatch is in flight, a tick from a cancelled countdown, a fix
        // arriving after cancellation. All of it is ignored.
        (state, _) => (state, vec![]),
    }
}

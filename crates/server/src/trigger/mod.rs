//! The SOS trigger: turns a user gesture into a confirmed, timed alert
//! request.
//!
//! The state machine itself is a pure transition function in [`machine`],
//! so the re-entrancy guard and the stale-timer rules are checkable without
//! a runtime. [`driver`] wires it to real timers, the location service and
//! the dispatch client.

pub mod driver;
pub mod machine;

pub use driver::{DispatchClient, Feedback, NoFeedback, SosTrigger, TriggerNotice};
pub use machine::{
    CONFIRM_GRACE_SECONDS, DEFAULT_COUNTDOWN_SECONDS, Effect, TriggerEvent, TriggerState,
    VibrationPattern, transition,
};

//! Alert lifecycle after dispatch.
//!
//! Owns the `active → resolved` transition and the "what is my current
//! alert" queries. Dispatch creates alerts; nothing here ever does.

pub mod lifecycle;

pub use lifecycle::AlertLifecycle;

//! Input validation for safety-critical request fields.
//!
//! Validation runs before any side effect: a malformed dispatch request is
//! rejected here and never reaches the rate limiter or the store.

pub mod coordinates;
pub mod phone;

//! Sliding-window admission control for the dispatch endpoint.
//!
//! The dispatch endpoint is safety-critical but abusable, so every request
//! passes an `admit` check before anything is persisted. The production
//! backend keeps the window in Redis: multiple service instances admit
//! against the same counter and the check-and-increment happens in one
//! atomic pipeline round trip.

use async_trait::async_trait;
use dashmap::DashMap;
use redis::aio::ConnectionManager;
use std::time::{SystemTime, UNIX_EPOCH};
use thiserror::Error;

use crate::config::RateLimitConfig;

#[derive(Debug, Error)]
pub enum LimiterError {
    #[error("Rate limiter backend error: {0}")]
    Backend(String),
}

/// Outcome of an admission check. A denial always carries the remaining
/// wait so the client can tell the user when to retry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Decision {
    pub allowed: bool,
    pub retry_after_seconds: u64,
    pub remaining: u64,
}

#[async_trait]
pub trait RateLimiter: Send + Sync {
    async fn admit(&self, user_key: &str) -> Result<Decision, LimiterError>;
}

fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("system clock before unix epoch")
        .as_millis() as u64
}

/// Pure window arithmetic shared by the backends: prune entries older than
/// the window, then either record `now_ms` or compute the wait until the
/// oldest surviving entry falls out.
fn decide(entries: &mut Vec<u64>, now_ms: u64, limits: &RateLimitConfig) -> Decision {
    let window_ms = limits.window_secs * 1000;
    let cutoff = now_ms.saturating_sub(window_ms);
    entries.retain(|&t| t > cutoff);

    if (entries.len() as u64) < limits.max_requests {
        entries.push(now_ms);
        Decision {
            allowed: true,
            retry_after_seconds: 0,
            remaining: limits.max_requests - entries.len() as u64,
        }
    } else {
        let oldest = entries.first().copied().unwrap_or(now_ms);
        let wait_ms = (oldest + window_ms).saturating_sub(now_ms);
        Decision {
            allowed: false,
            retry_after_seconds: wait_ms.div_ceil(1000).max(1),
            remaining: 0,
        }
    }
}

/// Redis-backed sliding window over a per-user sorted set.
///
/// Algorithm per admission, executed as one atomic `MULTI` pipeline:
/// prune scores older than the window, record the attempt, count the set
/// and read the oldest score, refresh the key TTL. A denied attempt is
/// then removed again so repeated denials do not extend the lockout; the
/// instant between `EXEC` and that cleanup can only over-count, never
/// admit too much.
pub struct RedisSlidingWindow {
    conn: ConnectionManager,
    limits: RateLimitConfig,
    key_prefix: String,
}

impl RedisSlidingWindow {
    pub fn new(conn: ConnectionManager, limits: RateLimitConfig) -> Self {
        Self {
            conn,
            limits,
            key_prefix: "sos:dispatch:rl".to_string(),
        }
    }

    fn key(&self, user_key: &str) -> String {
        format!("{}:{user_key}", self.key_prefix)
    }
}

#[async_trait]
impl RateLimiter for RedisSlidingWindow {
    async fn admit(&self, user_key: &str) -> Result<Decision, LimiterError> {
        let key = self.key(user_key);
        let now_ms = now_millis();
        let window_ms = self.limits.window_secs * 1000;
        let cutoff = now_ms.saturating_sub(window_ms);
        let member = format!("{now_ms}-{}", uuid::Uuid::new_v4());

        let mut conn = self.conn.clone();
        let (count, oldest): (u64, Vec<(String, u64)>) = redis::pipe()
            .atomic()
            .zrembyscore(&key, 0, cutoff as isize)
            .ignore()
            .zadd(&key, &member, now_ms)
            .ignore()
            .zcard(&key)
            .zrange_withscores(&key, 0, 0)
            .pexpire(&key, window_ms as i64)
            .ignore()
            .query_async(&mut conn)
            .await
            .map_err(|e| LimiterError::Backend(e.to_string()))?;

        if count <= self.limits.max_requests {
            return Ok(Decision {
                allowed: true,
                retry_after_seconds: 0,
                remaining: self.limits.max_requests - count,
            });
        }

        let oldest_ms = oldest.first().map(|(_, score)| *score).unwrap_or(now_ms);
        let wait_ms = (oldest_ms + window_ms).saturating_sub(now_ms);
        let decision = Decision {
            allowed: false,
            retry_after_seconds: wait_ms.div_ceil(1000).max(1),
            remaining: 0,
        };

        // Denied attempts do not consume window slots.
        if let Err(e) = redis::cmd("ZREM")
            .arg(&key)
            .arg(&member)
            .query_async::<i64>(&mut conn)
            .await
        {
            tracing::warn!(
                name = "rate_limit.denied_cleanup_failed",
                target = concat!(env!("CARGO_PKG_NAME"), "::", module_path!()),
                error = %e,
                message = "Failed to remove denied attempt from window"
            );
        }

        Ok(decision)
    }
}

/// In-process sliding window over a dashmap.
///
/// Single-instance only: state dies with the process and is invisible to
/// sibling instances. Used by tests and single-node development setups;
/// production deployments must use [`RedisSlidingWindow`].
#[derive(Default)]
pub struct MemorySlidingWindow {
    windows: DashMap<String, Vec<u64>>,
    limits: RateLimitConfig,
}

impl MemorySlidingWindow {
    pub fn new(limits: RateLimitConfig) -> Self {
        Self {
            windows: DashMap::new(),
            limits,
        }
    }
}

#[async_trait]
impl RateLimiter for MemorySlidingWindow {
    async fn admit(&self, user_key: &str) -> Result<Decision, LimiterError> {
        let mut entry = self.windows.entry(user_key.to_string()).or_default();
        Ok(decide(entry.value_mut(), now_millis(), &self.limits))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn limits(max_requests: u64, window_secs: u64) -> RateLimitConfig {
        RateLimitConfig {
            max_requests,
            window_secs,
        }
    }

    #[test]
    fn admits_up_to_limit_then_denies() {
        let limits = limits(5, 600);
        let mut entries = Vec::new();

        for i in 0..5 {
            let d = decide(&mut entries, 1_000 + i, &limits);
            assert!(d.allowed, "request {i} should be admitted");
        }
        let sixth = decide(&mut entries, 1_006, &limits);
        assert!(!sixth.allowed);
        assert!(sixth.retry_after_seconds > 0);
    }

    #[test]
    fn retry_after_tracks_oldest_entry() {
        let limits = limits(2, 10);
        let mut entries = Vec::new();
        assert!(decide(&mut entries, 0, &limits).allowed);
        assert!(decide(&mut entries, 4_000, &limits).allowed);

        // Window is full; oldest entry (t=0) leaves the window at t=10s.
        let denied = decide(&mut entries, 7_000, &limits);
        assert!(!denied.allowed);
        assert_eq!(denied.retry_after_seconds, 3);
    }

    #[test]
    fn denied_attempts_do_not_extend_the_window() {
        let limits = limits(1, 10);
        let mut entries = Vec::new();
        assert!(decide(&mut entries, 0, &limits).allowed);
        assert!(!decide(&mut entries, 5_000, &limits).allowed);
        assert!(!decide(&mut entries, 9_000, &limits).allowed);
        // The only admitted entry is from t=0, gone at t=10s.
        assert!(decide(&mut entries, 10_001, &limits).allowed);
    }

    #[test]
    fn window_slide_readmits() {
        let limits = limits(5, 600);
        let mut entries = Vec::new();
        for i in 0..5 {
            assert!(decide(&mut entries, i, &limits).allowed);
        }
        assert!(!decide(&mut entries, 5, &limits).allowed);
        assert!(decide(&mut entries, 600_005, &limits).allowed);
    }

    #[test]
    fn remaining_counts_down() {
        let limits = limits(3, 60);
        let mut entries = Vec::new();
        assert_eq!(decide(&mut entries, 0, &limits).remaining, 2);
        assert_eq!(decide(&mut entries, 1, &limits).remaining, 1);
        assert_eq!(decide(&mut entries, 2, &limits).remaining, 0);
    }

    #[tokio::test]
    async fn memory_limiter_isolates_users() {
        let limiter = MemorySlidingWindow::new(limits(1, 600));
        assert!(limiter.admit("user-a").await.unwrap().allowed);
        assert!(!limiter.admit("user-a").await.unwrap().allowed);
        assert!(limiter.admit("user-b").await.unwrap().allowed);
    }
}

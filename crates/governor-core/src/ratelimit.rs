// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Governor Labs, Inc.

//! Per-agent token-bucket rate limiting.
//!
//! Generalizes the fixed-window counter in the gateway pack repo's
//! `rate_limit.rs` middleware into a continuous-refill token bucket keyed by
//! agent id, so a burst doesn't get a free pass just for landing at the
//! start of a new window. Three independent buckets run per agent — minute,
//! hour, day — and a request is only admitted when all three have capacity.
//!
//! Requires `std` (backed by [`dashmap::DashMap`] for lock-free concurrent
//! access from multiple authorization calls in flight at once).

use alloc::string::String;
use dashmap::DashMap;

use crate::ids::AgentId;

#[derive(Debug, Clone, Copy)]
struct Bucket {
    capacity: f64,
    tokens: f64,
    refill_per_ms: f64,
    last_refill_ms: u64,
}

impl Bucket {
    fn new(capacity: u32, window_ms: u64, now_ms: u64) -> Self {
        Self {
            capacity: capacity as f64,
            tokens: capacity as f64,
            refill_per_ms: capacity as f64 / window_ms.max(1) as f64,
            last_refill_ms: now_ms,
        }
    }

    fn try_take(&mut self, now_ms: u64) -> bool {
        let elapsed = now_ms.saturating_sub(self.last_refill_ms) as f64;
        self.tokens = (self.tokens + elapsed * self.refill_per_ms).min(self.capacity);
        self.last_refill_ms = now_ms;
        if self.tokens >= 1.0 {
            self.tokens -= 1.0;
            true
        } else {
            false
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct RateLimitConfig {
    pub per_minute: u32,
    pub per_hour: u32,
    pub per_day: u32,
}

struct AgentBuckets {
    minute: Bucket,
    hour: Bucket,
    day: Bucket,
}

/// Concurrent, per-agent token-bucket limiter.
///
/// `key` is typically just the agent id, but callers that need a finer
/// grain (e.g. per-scope limits) may compose their own key string.
pub struct RateLimiter {
    buckets: DashMap<String, AgentBuckets>,
}

impl RateLimiter {
    pub fn new() -> Self {
        Self { buckets: DashMap::new() }
    }

    /// Returns `true` if the request is admitted under all three windows.
    /// A denial still consumes no tokens from any bucket.
    pub fn check_and_consume(&self, agent_id: &AgentId, cfg: RateLimitConfig, now_ms: u64) -> bool {
        let mut entry = self.buckets.entry(agent_id.0.clone()).or_insert_with(|| AgentBuckets {
            minute: Bucket::new(cfg.per_minute, 60_000, now_ms),
            hour: Bucket::new(cfg.per_hour, 3_600_000, now_ms),
            day: Bucket::new(cfg.per_day, 86_400_000, now_ms),
        });

        // Peek all three before committing any — a shared failure in the
        // hour bucket must not burn a minute-bucket token.
        let minute_ok = entry.minute.tokens
            + (now_ms.saturating_sub(entry.minute.last_refill_ms) as f64) * entry.minute.refill_per_ms
            >= 1.0;
        let hour_ok = entry.hour.tokens
            + (now_ms.saturating_sub(entry.hour.last_refill_ms) as f64) * entry.hour.refill_per_ms
            >= 1.0;
        let day_ok = entry.day.tokens
            + (now_ms.saturating_sub(entry.day.last_refill_ms) as f64) * entry.day.refill_per_ms
            >= 1.0;

        if !(minute_ok && hour_ok && day_ok) {
            return false;
        }

        entry.minute.try_take(now_ms);
        entry.hour.try_take(now_ms);
        entry.day.try_take(now_ms);
        true
    }
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cfg() -> RateLimitConfig {
        RateLimitConfig { per_minute: 2, per_hour: 100, per_day: 1000 }
    }

    #[test]
    fn admits_up_to_capacity_then_denies() {
        let limiter = RateLimiter::new();
        let agent = AgentId::from("a1");
        assert!(limiter.check_and_consume(&agent, cfg(), 0));
        assert!(limiter.check_and_consume(&agent, cfg(), 0));
        assert!(!limiter.check_and_consume(&agent, cfg(), 0));
    }

    #[test]
    fn refills_over_time() {
        let limiter = RateLimiter::new();
        let agent = AgentId::from("a1");
        assert!(limiter.check_and_consume(&agent, cfg(), 0));
        assert!(limiter.check_and_consume(&agent, cfg(), 0));
        assert!(!limiter.check_and_consume(&agent, cfg(), 0));
        // Half the minute window later, one token back.
        assert!(limiter.check_and_consume(&agent, cfg(), 30_000));
    }

    #[test]
    fn buckets_are_independent_per_agent() {
        let limiter = RateLimiter::new();
        let a = AgentId::from("a1");
        let b = AgentId::from("b1");
        assert!(limiter.check_and_consume(&a, cfg(), 0));
        assert!(limiter.check_and_consume(&a, cfg(), 0));
        assert!(!limiter.check_and_consume(&a, cfg(), 0));
        assert!(limiter.check_and_consume(&b, cfg(), 0));
    }
}

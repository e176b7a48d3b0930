// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Governor Labs, Inc.

//! Engine-wide configuration.
//!
//! Mirrors the teacher's `config.rs`: a plain `Config` struct with a
//! `Default` impl carrying conservative production defaults, constructed
//! directly for `no_std` callers or loaded from TOML/env via
//! [`crate::config_loader`] (the `config-loader` feature) for `std` callers.

use alloc::string::String;
use alloc::vec;
use alloc::vec::Vec;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Secret used to sign each Observer event (HMAC-SHA256).
    pub observer_hmac_secret: String,
    /// Default per-minute rate limit applied when a manifest doesn't
    /// override it.
    pub default_rate_limit_per_minute: u32,
    pub default_rate_limit_per_hour: u32,
    pub default_rate_limit_per_day: u32,
    /// Maximum number of CAS retries before a trust-score write gives up.
    pub trust_cas_max_retries: u32,
    /// How long an Intent remains valid after creation if the caller
    /// doesn't specify its own expiry.
    pub default_intent_ttl_ms: u64,
    /// Deadline budget, per routing path, in ms (green/yellow/red order).
    pub routing_latency_budgets_ms: [u64; 3],
    /// Roles eligible to staff the HITL queue, in escalation order.
    pub hitl_roles: Vec<String>,
    /// Sliding window, in ms, used by the anomaly detectors.
    pub anomaly_window_ms: u64,
    /// Consecutive identical votes required for council auto-approval.
    pub council_quorum: u32,
    /// Max webhook delivery attempts before moving to the dead-letter queue.
    pub webhook_max_attempts: u32,
    pub webhook_base_backoff_ms: u64,
    /// Whether the kill switch starts engaged (fail-closed boot mode).
    pub killswitch_engaged_at_boot: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            observer_hmac_secret: String::from("change-me-in-production"),
            default_rate_limit_per_minute: 60,
            default_rate_limit_per_hour: 1_000,
            default_rate_limit_per_day: 10_000,
            trust_cas_max_retries: 8,
            default_intent_ttl_ms: 5 * 60 * 1_000,
            routing_latency_budgets_ms: [50, 500, 5_000],
            hitl_roles: vec![String::from("on-call-reviewer"), String::from("compliance-lead")],
            anomaly_window_ms: 15 * 60 * 1_000,
            council_quorum: 2,
            webhook_max_attempts: 5,
            webhook_base_backoff_ms: 250,
            killswitch_engaged_at_boot: false,
        }
    }
}

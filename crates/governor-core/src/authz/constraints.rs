// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Governor Labs, Inc.

//! Constraint derivation and merging.
//!
//! Builds the [`DecisionConstraints`] attached to a permitted [`Decision`],
//! and merges manifest-declared constraints with the ones the trust band
//! and routing path imply. Ported from the teacher's `Envelope`/
//! `BudgetResult` merge style in its old `budget.rs` — "most restrictive
//! wins" on every overlapping field.

use alloc::string::String;
use alloc::vec::Vec;

use crate::config::Config;
use crate::types::{
    DecisionConstraints, Manifest, ObservabilityTier, Reversibility, RoutingPath, TrustBand,
};

/// Build the baseline constraint envelope for a permitted decision, before
/// any manifest-declared constraints are folded in.
pub fn base_constraints(
    config: &Config,
    band: TrustBand,
    routing: RoutingPath,
    reversibility: Reversibility,
    now_ms: u64,
) -> DecisionConstraints {
    let observability_tier = match band {
        TrustBand::Untrusted | TrustBand::Provisional => ObservabilityTier::White,
        TrustBand::Established | TrustBand::Trusted => ObservabilityTier::Grey,
        TrustBand::Verified | TrustBand::Certified => ObservabilityTier::Black,
    };

    let sandboxed = matches!(band, TrustBand::Untrusted | TrustBand::Provisional)
        || matches!(reversibility, Reversibility::Irreversible);

    let deadline_ms = now_ms
        + match routing {
            RoutingPath::Green => config.routing_latency_budgets_ms[0],
            RoutingPath::Yellow => config.routing_latency_budgets_ms[1],
            RoutingPath::Red => config.routing_latency_budgets_ms[2],
        };

    let required_approvals: Vec<String> = if matches!(routing, RoutingPath::Red) {
        config.hitl_roles.clone()
    } else {
        Vec::new()
    };

    DecisionConstraints {
        allowed_scopes: Vec::new(),
        rate_limit_per_minute: config.default_rate_limit_per_minute,
        rate_limit_per_hour: config.default_rate_limit_per_hour,
        rate_limit_per_day: config.default_rate_limit_per_day,
        max_concurrency: match band {
            TrustBand::Untrusted => 1,
            TrustBand::Provisional => 2,
            TrustBand::Established => 5,
            TrustBand::Trusted => 10,
            TrustBand::Verified => 25,
            TrustBand::Certified => 100,
        },
        max_cost: match band {
            TrustBand::Untrusted => 0.0,
            TrustBand::Provisional => 10.0,
            TrustBand::Established => 100.0,
            TrustBand::Trusted => 1_000.0,
            TrustBand::Verified => 10_000.0,
            TrustBand::Certified => 100_000.0,
        },
        required_approvals,
        observability_tier,
        deadline_ms,
        sandboxed,
    }
}

/// Fold a manifest's declared scope/rate constraints into the baseline,
/// most-restrictive field wins.
pub fn merge_manifest_constraints(base: DecisionConstraints, manifest: &Manifest) -> DecisionConstraints {
    let mut merged = base;
    for capability in &manifest.capabilities {
        if let Some(scope) = &capability.scope {
            if !merged.allowed_scopes.contains(scope) {
                merged.allowed_scopes.push(scope.clone());
            }
        }
    }
    merged
}

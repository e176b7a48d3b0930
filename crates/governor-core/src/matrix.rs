// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Governor Labs, Inc.

//! Risk x Trust matrix router.
//!
//! A const 6x4 table — six [`TrustBand`]s by four [`RiskLevel`]s — mapping
//! straight to a [`RoutingPath`] per the literal matrix in spec.md §4.2.
//! `RiskLevel::Info` is not a column of the matrix; it is treated as `Low`
//! for routing purposes (the lowest real risk column). Laid out as a
//! `match` over the discriminant pair in the same const-evaluable style as
//! the teacher's enum-indexed lookups, rather than a runtime map. Every
//! cell is transcribed individually — trust bands and risk levels are
//! *not* merged, since adjacent rows/columns in the spec's table disagree
//! (e.g. `trusted`/`high` is yellow but `established`/`high` is red;
//! `high` and `critical` disagree in every row).

use alloc::vec;
use alloc::vec::Vec;

use crate::types::{RiskLevel, RoutingPath, RoutingResult, TrustBand};

/// Risk column consulted by the matrix. `Info` collapses into `Low`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RiskColumn {
    Low,
    Medium,
    High,
    Critical,
}

fn column(risk: RiskLevel) -> RiskColumn {
    match risk {
        RiskLevel::Info | RiskLevel::Low => RiskColumn::Low,
        RiskLevel::Medium => RiskColumn::Medium,
        RiskLevel::High => RiskColumn::High,
        RiskLevel::Critical => RiskColumn::Critical,
    }
}

fn path_for(band: TrustBand, risk: RiskLevel) -> RoutingPath {
    use RoutingPath::{Green, Red, Yellow};
    match (band, column(risk)) {
        (TrustBand::Certified, RiskColumn::Low) => Green,
        (TrustBand::Certified, RiskColumn::Medium) => Green,
        (TrustBand::Certified, RiskColumn::High) => Yellow,
        (TrustBand::Certified, RiskColumn::Critical) => Red,

        (TrustBand::Verified, RiskColumn::Low) => Green,
        (TrustBand::Verified, RiskColumn::Medium) => Green,
        (TrustBand::Verified, RiskColumn::High) => Yellow,
        (TrustBand::Verified, RiskColumn::Critical) => Red,

        (TrustBand::Trusted, RiskColumn::Low) => Green,
        (TrustBand::Trusted, RiskColumn::Medium) => Yellow,
        (TrustBand::Trusted, RiskColumn::High) => Yellow,
        (TrustBand::Trusted, RiskColumn::Critical) => Red,

        (TrustBand::Established, RiskColumn::Low) => Green,
        (TrustBand::Established, RiskColumn::Medium) => Yellow,
        (TrustBand::Established, RiskColumn::High) => Red,
        (TrustBand::Established, RiskColumn::Critical) => Red,

        (TrustBand::Provisional, RiskColumn::Low) => Yellow,
        (TrustBand::Provisional, RiskColumn::Medium) => Red,
        (TrustBand::Provisional, RiskColumn::High) => Red,
        (TrustBand::Provisional, RiskColumn::Critical) => Red,

        (TrustBand::Untrusted, RiskColumn::Low) => Red,
        (TrustBand::Untrusted, RiskColumn::Medium) => Red,
        (TrustBand::Untrusted, RiskColumn::High) => Red,
        (TrustBand::Untrusted, RiskColumn::Critical) => Red,
    }
}

/// Route a trust band / risk pair to a path, with `requires_council` and
/// `requires_human` set per spec.md §4.2 ("yellow always goes through the
/// council; red always escalates to a human").
pub fn route(band: TrustBand, risk: RiskLevel) -> RoutingResult {
    let path = path_for(band, risk);
    let mut reasoning: Vec<alloc::string::String> = vec![alloc::format!(
        "trust band {} x risk {:?} -> {:?}",
        band.display_name(),
        risk,
        path
    )];

    let (requires_council, requires_human) = match path {
        RoutingPath::Green => (false, false),
        RoutingPath::Yellow => {
            reasoning.push("yellow path requires council review".into());
            (true, false)
        }
        RoutingPath::Red => {
            reasoning.push("red path requires council review and human escalation".into());
            (true, true)
        }
    };

    RoutingResult {
        path,
        max_latency_ms: match path {
            RoutingPath::Green => 50,
            RoutingPath::Yellow => 500,
            RoutingPath::Red => 5_000,
        },
        requires_council,
        requires_human,
        reasoning,
    }
}

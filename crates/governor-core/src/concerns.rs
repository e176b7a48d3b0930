// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Governor Labs, Inc.

//! Hierarchy-of-concerns evaluator.
//!
//! Evaluates an intent against each [`Concern`] in strict priority order —
//! Safety, Ethics, Legality, Policy, Efficiency, Innovation — and applies
//! the lexicographic blocking rule from spec.md §4.2b: the first blocking
//! concern (priority < 3, i.e. Safety/Ethics/Legality) that fails short-
//! circuits the remaining evaluation. Advisory concerns (Policy,
//! Efficiency, Innovation) never block on their own but still surface in
//! the aggregate for the council to weigh.

use alloc::vec::Vec;

use crate::types::{
    AggregateConcernResult, Concern, ConcernAction, ConcernEvaluation, DataSensitivity, Intent,
    RecommendedAction, Reversibility, RiskLevel,
};

fn evaluate_safety(intent: &Intent) -> ConcernEvaluation {
    let irreversible_high_sensitivity = matches!(intent.reversibility, Reversibility::Irreversible)
        && intent.data_sensitivity >= DataSensitivity::Confidential;
    ConcernEvaluation {
        concern: Concern::Safety,
        passed: !irreversible_high_sensitivity,
        violations: if irreversible_high_sensitivity {
            alloc::vec!["irreversible action against confidential-or-higher data".into()]
        } else {
            Vec::new()
        },
        severity: if irreversible_high_sensitivity { RiskLevel::Critical } else { RiskLevel::Info },
        action: if irreversible_high_sensitivity { ConcernAction::Block } else { ConcernAction::Proceed },
    }
}

fn evaluate_ethics(intent: &Intent) -> ConcernEvaluation {
    let touches_pii_without_review = intent.context.handles_pii && intent.context.handles_phi;
    ConcernEvaluation {
        concern: Concern::Ethics,
        passed: !touches_pii_without_review,
        violations: if touches_pii_without_review {
            alloc::vec!["combined PII + PHI handling requires explicit review".into()]
        } else {
            Vec::new()
        },
        severity: if touches_pii_without_review { RiskLevel::High } else { RiskLevel::Info },
        action: if touches_pii_without_review { ConcernAction::Escalate } else { ConcernAction::Proceed },
    }
}

fn evaluate_legality(intent: &Intent) -> ConcernEvaluation {
    let restricted_in_production = intent.data_sensitivity == DataSensitivity::Restricted
        && intent.context.environment.as_deref() == Some("production");
    ConcernEvaluation {
        concern: Concern::Legality,
        passed: !restricted_in_production,
        violations: if restricted_in_production {
            alloc::vec!["restricted data access in production requires compliance sign-off".into()]
        } else {
            Vec::new()
        },
        severity: if restricted_in_production { RiskLevel::High } else { RiskLevel::Info },
        action: if restricted_in_production { ConcernAction::Review } else { ConcernAction::Proceed },
    }
}

fn evaluate_policy(intent: &Intent) -> ConcernEvaluation {
    let over_estimated_cost = intent.context.estimated_cost.map(|c| c > 1_000.0).unwrap_or(false);
    ConcernEvaluation {
        concern: Concern::Policy,
        passed: !over_estimated_cost,
        violations: if over_estimated_cost {
            alloc::vec!["estimated cost exceeds default policy ceiling".into()]
        } else {
            Vec::new()
        },
        severity: if over_estimated_cost { RiskLevel::Medium } else { RiskLevel::Info },
        action: if over_estimated_cost { ConcernAction::Review } else { ConcernAction::Proceed },
    }
}

fn evaluate_efficiency(_intent: &Intent) -> ConcernEvaluation {
    ConcernEvaluation {
        concern: Concern::Efficiency,
        passed: true,
        violations: Vec::new(),
        severity: RiskLevel::Info,
        action: ConcernAction::Proceed,
    }
}

fn evaluate_innovation(_intent: &Intent) -> ConcernEvaluation {
    ConcernEvaluation {
        concern: Concern::Innovation,
        passed: true,
        violations: Vec::new(),
        severity: RiskLevel::Info,
        action: ConcernAction::Proceed,
    }
}

fn evaluate_one(concern: Concern, intent: &Intent) -> ConcernEvaluation {
    match concern {
        Concern::Safety => evaluate_safety(intent),
        Concern::Ethics => evaluate_ethics(intent),
        Concern::Legality => evaluate_legality(intent),
        Concern::Policy => evaluate_policy(intent),
        Concern::Efficiency => evaluate_efficiency(intent),
        Concern::Innovation => evaluate_innovation(intent),
    }
}

/// Evaluate all six concerns in priority order. A blocking concern
/// (priority < 3) that fails stops evaluation of the concerns after it —
/// their evaluations are not included in the result at all, matching the
/// "short-circuit" framing in spec.md §4.2b rather than merely ignoring
/// their outcome.
pub fn evaluate(intent: &Intent) -> AggregateConcernResult {
    let mut evaluations = Vec::with_capacity(Concern::ORDER.len());
    let mut blocked_by = None;

    for concern in Concern::ORDER {
        let evaluation = evaluate_one(concern, intent);
        let failed_and_blocking = !evaluation.passed && concern.is_blocking();
        let stop = failed_and_blocking;
        evaluations.push(evaluation);
        if failed_and_blocking {
            blocked_by = Some(concern);
        }
        if stop {
            break;
        }
    }

    // spec.md §4.2b: "overallPassed is true iff no concern failed" — an
    // advisory concern failing (Policy/Efficiency/Innovation) does not
    // block, but it still flips overall_passed to false.
    let overall_passed = evaluations.iter().all(|e| e.passed);
    let recommended_action = if matches!(blocked_by, Some(Concern::Safety) | Some(Concern::Legality)) {
        RecommendedAction::Reject
    } else if blocked_by == Some(Concern::Ethics) {
        RecommendedAction::Escalate
    } else if evaluations.iter().any(|e| e.action == ConcernAction::Escalate) {
        RecommendedAction::Escalate
    } else if evaluations.iter().any(|e| e.action == ConcernAction::Review) {
        RecommendedAction::Review
    } else {
        RecommendedAction::Approve
    };

    AggregateConcernResult { overall_passed, blocked_by, recommended_action, evaluations }
}

// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Governor Labs, Inc.

//! Agent lifecycle pipeline.
//!
//! `draft -> training -> exam -> shadow -> active -> {suspended, retired}`.
//! spec.md §4.4d gates each transition behind named checks (manifest
//! alignment, shadow burn-in, human approval, ...) rather than letting a
//! caller poke `pipeline_stage` directly — the same discipline the teacher
//! used in `trust.rs::get_level`'s expiry check: a small pure function
//! consulted before any state change lands.

use alloc::string::String;
use alloc::vec::Vec;

use crate::types::{PipelineStage, TrustBand};

/// A single named precondition for a transition. Mirrors spec.md §4.4d's
/// examples: "`draft→training` requires basic config + manifest alignment +
/// hierarchy level; `shadow→active` requires shadow match-rate ≥ 0.95,
/// ≥ 100 executions, ≥ 7 days in shadow, zero safety violations, human
/// approval".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Gate {
    ManifestAligned,
    HierarchyLevelAssigned,
    ExamPassed,
    ShadowMatchRate,
    ShadowExecutionCount,
    ShadowDuration,
    ZeroSafetyViolations,
    HumanApproval,
}

impl Gate {
    pub fn display_name(self) -> &'static str {
        match self {
            Gate::ManifestAligned => "manifest_aligned",
            Gate::HierarchyLevelAssigned => "hierarchy_level_assigned",
            Gate::ExamPassed => "exam_passed",
            Gate::ShadowMatchRate => "shadow_match_rate",
            Gate::ShadowExecutionCount => "shadow_execution_count",
            Gate::ShadowDuration => "shadow_duration",
            Gate::ZeroSafetyViolations => "zero_safety_violations",
            Gate::HumanApproval => "human_approval",
        }
    }
}

/// A blocking gate that failed, with the reason it failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GateFailure {
    pub gate: Gate,
    pub reason: String,
}

/// Evidence gathered about an agent, consulted by `attempt_transition`.
/// Every field defaults to the least-favorable value so an empty context
/// never accidentally clears a gate.
#[derive(Debug, Clone, Default)]
pub struct TransitionContext {
    pub manifest_aligned: bool,
    pub hierarchy_level_assigned: bool,
    pub exam_passed: bool,
    pub shadow_match_rate: f32,
    pub shadow_executions: u32,
    pub shadow_days: u32,
    pub safety_violations: u32,
    pub human_approved: bool,
}

const SHADOW_MATCH_RATE_MIN: f32 = 0.95;
const SHADOW_EXECUTIONS_MIN: u32 = 100;
const SHADOW_DAYS_MIN: u32 = 7;

/// `true` if `from -> to` is a legal single-step transition shape
/// (ignoring gates — use [`gates_for`]/[`attempt_transition`] to check
/// whether it's actually allowed for a given agent).
pub fn can_transition(from: PipelineStage, to: PipelineStage) -> bool {
    use PipelineStage::*;
    matches!(
        (from, to),
        (Draft, Training)
            | (Training, Exam)
            | (Exam, Shadow)
            | (Exam, Training) // failed exam, back for more training
            | (Shadow, Active)
            | (Shadow, Training) // failed shadow evaluation
            | (Active, Suspended)
            | (Suspended, Active)
            | (Active, Retired)
            | (Suspended, Retired)
    )
}

/// The gates that must all pass for `from -> to` to be allowed.
pub fn gates_for(from: PipelineStage, to: PipelineStage) -> &'static [Gate] {
    use PipelineStage::*;
    match (from, to) {
        (Draft, Training) => &[Gate::ManifestAligned, Gate::HierarchyLevelAssigned],
        (Training, Exam) => &[Gate::ManifestAligned],
        (Exam, Shadow) => &[Gate::ExamPassed],
        (Shadow, Active) => &[
            Gate::ShadowMatchRate,
            Gate::ShadowExecutionCount,
            Gate::ShadowDuration,
            Gate::ZeroSafetyViolations,
            Gate::HumanApproval,
        ],
        (Suspended, Active) => &[Gate::HumanApproval],
        _ => &[],
    }
}

fn evaluate_gates(from: PipelineStage, to: PipelineStage, ctx: &TransitionContext) -> Vec<GateFailure> {
    let mut failures = Vec::new();
    for gate in gates_for(from, to) {
        let ok = match gate {
            Gate::ManifestAligned => ctx.manifest_aligned,
            Gate::HierarchyLevelAssigned => ctx.hierarchy_level_assigned,
            Gate::ExamPassed => ctx.exam_passed,
            Gate::ShadowMatchRate => ctx.shadow_match_rate >= SHADOW_MATCH_RATE_MIN,
            Gate::ShadowExecutionCount => ctx.shadow_executions >= SHADOW_EXECUTIONS_MIN,
            Gate::ShadowDuration => ctx.shadow_days >= SHADOW_DAYS_MIN,
            Gate::ZeroSafetyViolations => ctx.safety_violations == 0,
            Gate::HumanApproval => ctx.human_approved,
        };
        if !ok {
            failures.push(GateFailure { gate: *gate, reason: gate_failure_reason(*gate, ctx) });
        }
    }
    failures
}

fn gate_failure_reason(gate: Gate, ctx: &TransitionContext) -> String {
    match gate {
        Gate::ShadowMatchRate => {
            alloc::format!("match rate {:.3} below required {SHADOW_MATCH_RATE_MIN:.2}", ctx.shadow_match_rate)
        }
        Gate::ShadowExecutionCount => {
            alloc::format!("{} executions below required {SHADOW_EXECUTIONS_MIN}", ctx.shadow_executions)
        }
        Gate::ShadowDuration => alloc::format!("{} days in shadow below required {SHADOW_DAYS_MIN}", ctx.shadow_days),
        Gate::ZeroSafetyViolations => alloc::format!("{} safety violations recorded", ctx.safety_violations),
        _ => alloc::format!("{} not satisfied", gate.display_name()),
    }
}

/// Attempt a transition: the shape must be legal ([`can_transition`]) and
/// every gate in [`gates_for`] must pass, or the transition is refused with
/// the full list of failing gates (never just the first one, so a caller
/// can report everything at once).
pub fn attempt_transition(
    from: PipelineStage,
    to: PipelineStage,
    ctx: &TransitionContext,
) -> Result<PipelineStage, Vec<GateFailure>> {
    if !can_transition(from, to) {
        return Err(alloc::vec![GateFailure {
            gate: Gate::ManifestAligned,
            reason: alloc::format!("{from:?} -> {to:?} is not a legal transition shape"),
        }]);
    }
    let failures = evaluate_gates(from, to, ctx);
    if failures.is_empty() {
        Ok(to)
    } else {
        Err(failures)
    }
}

/// Capability proving the caller already passed an authorization check
/// entitling it to bypass gates. Only constructible via [`Privileged::grant`],
/// never `Default`/struct-literal — spec.md §4.4d: "a forced override is
/// permitted only by a privileged caller".
#[derive(Debug, Clone, Copy)]
pub struct Privileged(());

impl Privileged {
    /// Mint a `Privileged` token from an authorization [`crate::types::Decision`]
    /// that itself permitted the action and carries the highest trust band —
    /// this crate has no separate "admin" concept, so the override authority
    /// is "an agent the authorizer already trusts completely".
    pub fn grant(decision: &crate::types::Decision) -> Option<Self> {
        if decision.permitted && decision.trust_band == TrustBand::Certified {
            Some(Privileged(()))
        } else {
            None
        }
    }
}

/// Force a transition ignoring gates (but not the legal-shape check — a
/// privileged caller still can't invent a transition that doesn't exist).
/// Callers are expected to append a `forced=true` Observer event alongside
/// this call; this function doesn't touch the Observer log itself so it
/// doesn't need to be async.
pub fn force_transition(
    from: PipelineStage,
    to: PipelineStage,
    _authority: Privileged,
) -> Result<PipelineStage, GateFailure> {
    if can_transition(from, to) {
        Ok(to)
    } else {
        Err(GateFailure {
            gate: Gate::ManifestAligned,
            reason: alloc::format!("{from:?} -> {to:?} is not a legal transition shape, even forced"),
        })
    }
}

/// Minimum trust band required before an agent is even eligible to enter
/// `active`, independent of its manifest's `default_autonomy`.
pub fn minimum_band_for_stage(stage: PipelineStage) -> TrustBand {
    match stage {
        PipelineStage::Draft | PipelineStage::Training => TrustBand::Untrusted,
        PipelineStage::Exam => TrustBand::Provisional,
        PipelineStage::Shadow => TrustBand::Established,
        PipelineStage::Active => TrustBand::Established,
        PipelineStage::Suspended | PipelineStage::Retired => TrustBand::Untrusted,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::PipelineStage::*;

    fn passing_shadow_ctx() -> TransitionContext {
        TransitionContext {
            shadow_match_rate: 0.97,
            shadow_executions: 150,
            shadow_days: 10,
            safety_violations: 0,
            human_approved: true,
            ..Default::default()
        }
    }

    #[test]
    fn draft_cannot_skip_to_active() {
        assert!(!can_transition(Draft, Active));
        assert!(attempt_transition(Draft, Active, &TransitionContext::default()).is_err());
    }

    #[test]
    fn draft_to_training_needs_manifest_and_hierarchy() {
        let result = attempt_transition(Draft, Training, &TransitionContext::default());
        let failures = result.unwrap_err();
        assert_eq!(failures.len(), 2);
        assert!(failures.iter().any(|f| f.gate == Gate::ManifestAligned));
        assert!(failures.iter().any(|f| f.gate == Gate::HierarchyLevelAssigned));

        let ctx = TransitionContext { manifest_aligned: true, hierarchy_level_assigned: true, ..Default::default() };
        assert_eq!(attempt_transition(Draft, Training, &ctx), Ok(Training));
    }

    #[test]
    fn shadow_to_active_requires_all_five_gates() {
        assert!(attempt_transition(Shadow, Active, &TransitionContext::default()).is_err());
        assert_eq!(attempt_transition(Shadow, Active, &passing_shadow_ctx()), Ok(Active));
    }

    #[test]
    fn shadow_to_active_reports_every_failing_gate_at_once() {
        let ctx = TransitionContext { shadow_match_rate: 0.5, ..passing_shadow_ctx() };
        let failures = attempt_transition(Shadow, Active, &ctx).unwrap_err();
        assert_eq!(failures, alloc::vec![GateFailure {
            gate: Gate::ShadowMatchRate,
            reason: "match rate 0.500 below required 0.95".into(),
        }]);
    }

    #[test]
    fn retired_is_terminal() {
        assert!(!can_transition(Retired, Active));
        assert!(!can_transition(Retired, Training));
    }

    #[test]
    fn suspended_agent_can_be_reinstated_or_retired() {
        let ctx = TransitionContext { human_approved: true, ..Default::default() };
        assert_eq!(attempt_transition(Suspended, Active, &ctx), Ok(Active));
        assert!(can_transition(Suspended, Retired));
    }

    #[test]
    fn only_a_certified_permitted_decision_mints_privileged() {
        let decision = crate::types::Decision {
            decision_id: crate::ids::DecisionId::from("d1"),
            intent_id: crate::ids::IntentId::from("i1"),
            agent_id: crate::ids::AgentId::from("a1"),
            permitted: true,
            denial_reason: crate::types::DenialReason::None,
            constraints: None,
            trust_band: TrustBand::Certified,
            trust_score: 1000,
            reasoning: alloc::vec::Vec::new(),
            decided_at_ms: 0,
            expires_at_ms: 0,
            latency_ms: 0,
            policy_set_id: "p".into(),
            correlation_id: crate::ids::CorrelationId::from("c1"),
        };
        assert!(Privileged::grant(&decision).is_some());

        let mut lower = decision.clone();
        lower.trust_band = TrustBand::Trusted;
        assert!(Privileged::grant(&lower).is_none());
    }

    #[test]
    fn forced_override_still_rejects_illegal_shapes() {
        let decision = crate::types::Decision {
            decision_id: crate::ids::DecisionId::from("d1"),
            intent_id: crate::ids::IntentId::from("i1"),
            agent_id: crate::ids::AgentId::from("a1"),
            permitted: true,
            denial_reason: crate::types::DenialReason::None,
            constraints: None,
            trust_band: TrustBand::Certified,
            trust_score: 1000,
            reasoning: alloc::vec::Vec::new(),
            decided_at_ms: 0,
            expires_at_ms: 0,
            latency_ms: 0,
            policy_set_id: "p".into(),
            correlation_id: crate::ids::CorrelationId::from("c1"),
        };
        let authority = Privileged::grant(&decision).unwrap();
        assert!(force_transition(Draft, Active, authority).is_err());

        let authority = Privileged::grant(&decision).unwrap();
        assert_eq!(force_transition(Shadow, Active, authority), Ok(Active));
    }
}

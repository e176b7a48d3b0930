// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Governor Labs, Inc.

//! Meta-Orchestrator: fans the validator roster out, then synthesizes a
//! single [`CouncilDecision`].
//!
//! Every validator runs concurrently as its own `tokio::spawn`ed task —
//! `MetaOrchestrator::run` is a barrier, generalized from the teacher's
//! fixed three-way `tokio::join!` in `async_engine.rs` to an arbitrary-size
//! roster collected with `join_all`-style `Vec<JoinHandle>` awaiting.

use alloc::string::ToString;
use alloc::sync::Arc;
use alloc::vec::Vec;

use crate::council::validators::Validator;
use crate::types::{AggregateConcernResult, CouncilDecision, CouncilOutcome, Intent, RoutingResult, Vote};

pub struct MetaOrchestrator {
    roster: Vec<Arc<dyn Validator>>,
    quorum: u32,
}

impl MetaOrchestrator {
    pub fn new(roster: Vec<Arc<dyn Validator>>, quorum: u32) -> Self {
        Self { roster, quorum }
    }

    /// Run every validator concurrently and fold the votes into a single
    /// [`CouncilDecision`]. `intent`/`routing`/`concerns` must be `'static`
    /// (cloned) since each validator call runs in its own spawned task.
    pub async fn run(
        &self,
        intent: Intent,
        routing: RoutingResult,
        concerns: AggregateConcernResult,
    ) -> CouncilDecision {
        let start = tokio::time::Instant::now();

        let mut handles = Vec::with_capacity(self.roster.len());
        for validator in self.roster.iter().cloned() {
            let intent = intent.clone();
            let routing = routing.clone();
            let concerns = concerns.clone();
            handles.push(tokio::spawn(async move { validator.validate(&intent, &routing, &concerns).await }));
        }

        let mut votes: Vec<Vote> = Vec::with_capacity(handles.len());
        for handle in handles {
            match handle.await {
                Ok(vote) => votes.push(vote),
                Err(_) => votes.push(Vote {
                    validator: "unknown".to_string(),
                    approved: false,
                    confidence: 0.0,
                    notes: alloc::vec!["validator task panicked".to_string()],
                    critical: false,
                }),
            }
        }

        synthesize(votes, concerns, start.elapsed().as_millis() as u64)
    }
}

/// Pure aggregation step, split out from `run` so it's directly unit
/// testable without a Tokio runtime.
pub fn synthesize(votes: Vec<Vote>, concerns: AggregateConcernResult, total_latency_ms: u64) -> CouncilDecision {
    let approvals = votes.iter().filter(|v| v.approved).count() as u32;
    let denials = votes.len() as u32 - approvals;

    let compliance_issues: Vec<alloc::string::String> = votes
        .iter()
        .filter(|v| v.validator.starts_with("compliance") && !v.approved)
        .flat_map(|v| v.notes.clone())
        .collect();
    let qa_feedback: Vec<alloc::string::String> =
        votes.iter().filter(|v| v.validator == "qa").flat_map(|v| v.notes.clone()).collect();

    // spec.md §4.3: "any one [compliance validator] flagging a critical
    // issue makes the council escalate or deny ... Most restrictive wins"
    // and the Meta-Orchestrator synthesis rule: "if any compliance
    // critical → deny". A single critical compliance vote outvotes any
    // number of approvals from the rest of the roster — this is
    // deliberately *not* majority vote.
    let any_critical_compliance =
        votes.iter().any(|v| v.validator.starts_with("compliance") && v.critical);

    let outcome = if concerns.blocked_by.is_some() || any_critical_compliance {
        CouncilOutcome::Denied
    } else if approvals >= denials && approvals > 0 {
        CouncilOutcome::Approved
    } else {
        CouncilOutcome::Escalated
    };

    let requires_revision = !compliance_issues.is_empty() && outcome != CouncilOutcome::Denied;

    CouncilDecision {
        outcome,
        votes,
        compliance_issues,
        qa_feedback,
        requires_revision,
        revision_count: 0,
        total_latency_ms,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::council::validators::default_roster;
    use crate::ids::{AgentId, CorrelationId, IntentId};
    use crate::types::{ActionType, DataSensitivity, IntentContext, Reversibility, RoutingPath};

    fn intent() -> Intent {
        Intent::new(
            IntentId::from("i1"),
            AgentId::from("a1"),
            ActionType::Read,
            DataSensitivity::Public,
            Reversibility::Reversible,
            CorrelationId::from("c1"),
            0,
            1,
            IntentContext::default(),
        )
        .unwrap()
    }

    fn routing() -> RoutingResult {
        RoutingResult {
            path: RoutingPath::Green,
            max_latency_ms: 50,
            requires_council: false,
            requires_human: false,
            reasoning: alloc::vec!["ok".to_string()],
        }
    }

    #[tokio::test]
    async fn clean_intent_is_approved_by_full_roster() {
        let orchestrator = MetaOrchestrator::new(default_roster(), 2);
        let i = intent();
        let concerns = crate::concerns::evaluate(&i);
        let decision = orchestrator.run(i, routing(), concerns).await;
        assert_eq!(decision.outcome, CouncilOutcome::Approved);
        assert_eq!(decision.votes.len(), 6);
    }

    #[test]
    fn blocked_concerns_force_denied_outcome_regardless_of_votes() {
        let votes = alloc::vec![Vote {
            validator: "routing".to_string(),
            approved: true,
            confidence: 1.0,
            notes: Vec::new(),
            critical: false,
        }];
        let concerns = AggregateConcernResult {
            overall_passed: false,
            blocked_by: Some(crate::types::Concern::Safety),
            recommended_action: crate::types::RecommendedAction::Reject,
            evaluations: Vec::new(),
        };
        let decision = synthesize(votes, concerns, 0);
        assert_eq!(decision.outcome, CouncilOutcome::Denied);
    }

    #[test]
    fn single_critical_compliance_vote_denies_despite_majority_approval() {
        let approving_vote = |name: &str| Vote {
            validator: name.to_string(),
            approved: true,
            confidence: 0.95,
            notes: Vec::new(),
            critical: false,
        };
        let votes = alloc::vec![
            approving_vote("routing"),
            Vote {
                validator: "compliance.privacy".to_string(),
                approved: false,
                confidence: 0.1,
                notes: alloc::vec!["independent PII/PHI exposure check failed".to_string()],
                critical: true,
            },
            approving_vote("compliance.security"),
            approving_vote("compliance.financial"),
            approving_vote("compliance.regulatory"),
            approving_vote("qa"),
        ];
        let concerns = AggregateConcernResult {
            overall_passed: true,
            blocked_by: None,
            recommended_action: crate::types::RecommendedAction::Approve,
            evaluations: Vec::new(),
        };
        let decision = synthesize(votes, concerns, 0);
        assert_eq!(decision.outcome, CouncilOutcome::Denied);
    }

    #[tokio::test]
    async fn pii_only_intent_is_independently_caught_and_denied_by_full_roster() {
        // S6-style: an intent that never trips the concerns evaluator's
        // Ethics check (which only fires on *combined* PII+PHI) must still
        // be denied via the compliance roster's independent PII signal.
        let orchestrator = MetaOrchestrator::new(default_roster(), 2);
        let mut i = intent();
        i.context.handles_pii = true;
        let concerns = crate::concerns::evaluate(&i);
        assert!(concerns.overall_passed, "a PII-only intent should not trip the concerns evaluator");
        let decision = orchestrator.run(i, routing(), concerns).await;
        assert_eq!(decision.outcome, CouncilOutcome::Denied);
        assert!(decision.votes.iter().any(|v| v.validator == "compliance.privacy" && v.critical));
    }
}

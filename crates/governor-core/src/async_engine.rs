// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Governor Labs, Inc.

//! `AsyncGovernanceEngine`: the full pipeline.
//!
//! Generalizes the teacher's `async_engine.rs` — which wrapped its three
//! managers in `Arc<RwLock<...>>` and exposed one `check` method — to the
//! complete composition from spec.md §5: the synchronous
//! [`crate::authz::AuthorizationEngine`] runs first; a permitted decision
//! on the yellow or red path then goes through the
//! [`crate::council::MetaOrchestrator`]; every step is recorded on the
//! [`crate::observer::ObserverLog`] and broadcast on the
//! [`crate::observer::SignalBus`]; red-path decisions also enqueue a
//! [`crate::council::HitlQueue`] review.

use alloc::string::ToString;
use alloc::sync::Arc;
use alloc::vec::Vec;

use crate::authz::AuthorizationEngine;
use crate::concerns;
use crate::config::Config;
use crate::council::{self, HitlQueue, MetaOrchestrator, TriageInputs};
use crate::errors::GovernanceError;
use crate::ids::{AgentId, ReviewId};
use crate::matrix;
use crate::observer::{ObserverLog, SignalBus};
use crate::storage::Storage;
use crate::trust::TrustScoringEngine;
use crate::types::{
    CouncilOutcome, Decision, HitlReview, HitlStatus, Intent, ObserverEventDraft, Proof, ProofBatchResult,
    RiskLevel, Signal, SignalCategory, SignalPriority,
};

pub struct AsyncGovernanceEngine<S: Storage> {
    pub authz: AuthorizationEngine<S>,
    pub observer: ObserverLog<S>,
    pub council: MetaOrchestrator,
    pub hitl: HitlQueue,
    pub signals: SignalBus,
    storage: Arc<S>,
    config: Config,
}

impl<S: Storage + 'static> AsyncGovernanceEngine<S> {
    pub fn new(storage: Arc<S>, config: Config, hmac_secret: Vec<u8>) -> Self
    where
        S: Clone,
    {
        let authz = AuthorizationEngine::new((*storage).clone(), config.clone());
        let observer = ObserverLog::new(storage.clone(), hmac_secret);
        let council = MetaOrchestrator::new(crate::council::default_roster(), config.council_quorum);
        Self { authz, observer, council, hitl: HitlQueue::new(), signals: SignalBus::new(), storage, config }
    }

    pub fn storage(&self) -> &Arc<S> {
        &self.storage
    }

    /// Ingest a batch of execution proofs, re-deriving the agent's trust
    /// tier and — per spec.md §4.4c, "on tier change, the engine emits an
    /// Observer event and (if registered) the webhook delivery queue
    /// enqueues a `trust.tier_change` notification" — recording that
    /// transition on the Observer log and the signal bus. Webhook
    /// enqueueing itself is the caller's responsibility: this crate has no
    /// transport dependency, so callers subscribe to the published signal
    /// and hand it to their own `WebhookQueue`.
    pub async fn submit_proofs(
        &self,
        agent_id: &AgentId,
        proofs: &[Proof],
        batch_sig: &str,
        now_ms: u64,
    ) -> Result<ProofBatchResult, GovernanceError> {
        let scoring = TrustScoringEngine::new(&*self.storage, &self.config);
        let result = scoring.submit_proofs(agent_id, proofs, batch_sig, now_ms)?;

        if let Some(tier_change) = &result.tier_change {
            let _ = self
                .observer
                .append(ObserverEventDraft {
                    timestamp_ms: now_ms,
                    source: "trust".into(),
                    event_type: "trust.tier_change".into(),
                    risk_level: RiskLevel::Info,
                    agent_id: Some(agent_id.clone()),
                    user_id: None,
                    data: serde_json::json!({
                        "from": tier_change.from,
                        "to": tier_change.to,
                        "score_prev": result.score_prev,
                        "score_new": result.score_new,
                    }),
                })
                .await;

            self.signals.publish(Signal {
                category: SignalCategory::Trust,
                priority: SignalPriority::Normal,
                source_sequence: 0,
                payload: serde_json::json!({
                    "event": "trust.tier_change",
                    "agent_id": agent_id.as_str(),
                    "from": tier_change.from,
                    "to": tier_change.to,
                }),
            });
        }

        Ok(result)
    }

    /// Run the complete pipeline for `intent`: synchronous authorization,
    /// then (if the routing path calls for it) council review and HITL
    /// escalation, logging every step to the Observer and broadcasting a
    /// signal at each stage.
    pub async fn authorize_full(&self, intent: Intent, now_ms: u64) -> Decision {
        let decision = self.authz.authorize(&intent, now_ms);

        let _ = self
            .observer
            .append(ObserverEventDraft {
                timestamp_ms: now_ms,
                source: "authz".into(),
                event_type: if decision.permitted { "decision.permitted".into() } else { "decision.denied".into() },
                risk_level: severity_of(&decision),
                agent_id: Some(decision.agent_id.clone()),
                user_id: None,
                data: serde_json::json!({
                    "decision_id": decision.decision_id,
                    "intent_id": decision.intent_id,
                    "denial_reason": decision.denial_reason,
                    "trust_band": decision.trust_band,
                }),
            })
            .await;

        self.signals.publish(Signal {
            category: SignalCategory::Council,
            priority: if decision.permitted { SignalPriority::Normal } else { SignalPriority::High },
            source_sequence: 0,
            payload: serde_json::json!({"permitted": decision.permitted}),
        });

        if !decision.permitted {
            return decision;
        }

        let risk = intent.context.risk_level.unwrap_or(RiskLevel::Low);
        let routing = matrix::route(decision.trust_band, risk);
        if !routing.requires_council {
            return decision;
        }

        let concerns = concerns::evaluate(&intent);
        let council_decision = self.council.run(intent.clone(), routing.clone(), concerns).await;
        self.storage.put_council_decision(intent.intent_id.as_str(), council_decision.clone());

        if council_decision.outcome == CouncilOutcome::Escalated || routing.requires_human {
            let min_confidence =
                council_decision.votes.iter().map(|v| v.confidence).fold(1.0f32, |a, b| a.min(b));
            let triage_inputs = TriageInputs {
                compliance_failures: council_decision
                    .votes
                    .iter()
                    .filter(|v| v.validator.starts_with("compliance") && !v.approved)
                    .count() as u32,
                budget_overrun: false,
                min_confidence,
                qa_revision_count: council_decision.revision_count,
                user_requested_review: false,
                high_cost: intent.context.estimated_cost.map(|c| c > 1_000.0).unwrap_or(false),
                critical_priority: matches!(risk, RiskLevel::Critical),
            };
            let severity = council::triage(&triage_inputs);
            self.hitl.enqueue(HitlReview {
                review_id: ReviewId::generate(),
                intent_id: intent.intent_id.clone(),
                agent_id: intent.agent_id.clone(),
                severity,
                assigned_role: council::role_for(severity).to_string(),
                deadline_ms: council::deadline_ms_for(severity, now_ms),
                status: HitlStatus::Pending,
                agent_decision: Some(if decision.permitted { "permit".to_string() } else { "deny".to_string() }),
                human_decision: None,
            });
        }

        if council_decision.outcome == CouncilOutcome::Denied {
            let mut denied = decision;
            denied.permitted = false;
            denied.denial_reason = crate::types::DenialReason::PolicyViolation;
            denied.constraints = None;
            return denied;
        }

        decision
    }
}

fn severity_of(decision: &Decision) -> RiskLevel {
    if decision.permitted {
        RiskLevel::Info
    } else {
        RiskLevel::Medium
    }
}

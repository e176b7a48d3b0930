// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Governor Labs, Inc.

//! The authorization engine proper.
//!
//! `AuthorizationEngine::authorize` never returns an `Err` — every outcome,
//! permitted or denied, is a [`Decision`]. This is the teacher's
//! `GovernanceEngine::check` discipline unchanged, generalized from three
//! fixed gates to the pipeline in spec.md §4.1: expiry, agent/manifest
//! resolution, trust lookup, kill switch, predicate check, scope check,
//! context check, rate limit, routing, and concerns evaluation, in that
//! order, any one of which can short-circuit the rest with a denial.

use alloc::string::ToString;
use alloc::vec::Vec;
use core::sync::atomic::{AtomicU64, Ordering};

use crate::authz::constraints::{base_constraints, merge_manifest_constraints};
use crate::authz::hooks::HookRegistry;
use crate::authz::predicates::{allows_restricted_scope, can_perform, context_violation};
use crate::concerns;
use crate::config::Config;
use crate::ids::DecisionId;
use crate::killswitch::KillSwitch;
use crate::matrix;
#[cfg(feature = "std")]
use crate::ratelimit::{RateLimitConfig, RateLimiter};
use crate::storage::Storage;
use crate::types::{
    DataSensitivity, Decision, DecisionConstraints, DenialReason, Intent, Reversibility, RiskLevel,
    TrustProfile,
};

/// Infer a risk level for routing purposes when the caller hasn't supplied
/// one explicitly in the intent context.
fn infer_risk_level(intent: &Intent) -> RiskLevel {
    if let Some(risk) = intent.context.risk_level {
        return risk;
    }
    match (intent.data_sensitivity, intent.reversibility) {
        (DataSensitivity::Restricted, Reversibility::Irreversible) => RiskLevel::Critical,
        (DataSensitivity::Restricted, _) | (_, Reversibility::Irreversible) => RiskLevel::High,
        (DataSensitivity::Confidential, _) => RiskLevel::Medium,
        (DataSensitivity::Internal, Reversibility::Partially) => RiskLevel::Medium,
        _ => RiskLevel::Low,
    }
}

fn denial(intent: &Intent, decision_id: DecisionId, band: crate::types::TrustBand, score: u16, reason: DenialReason, why: &str, now_ms: u64) -> Decision {
    Decision {
        decision_id,
        intent_id: intent.intent_id.clone(),
        agent_id: intent.agent_id.clone(),
        permitted: false,
        denial_reason: reason,
        constraints: None,
        trust_band: band,
        trust_score: score,
        reasoning: alloc::vec![why.to_string()],
        decided_at_ms: now_ms,
        expires_at_ms: now_ms,
        latency_ms: 0,
        policy_set_id: "default".to_string(),
        correlation_id: intent.correlation_id.clone(),
    }
}

pub struct AuthorizationEngine<S: Storage> {
    storage: S,
    hooks: HookRegistry,
    #[cfg(feature = "std")]
    rate_limiter: RateLimiter,
    kill_switch: KillSwitch,
    config: Config,
    sequence: AtomicU64,
}

impl<S: Storage> AuthorizationEngine<S> {
    pub fn new(storage: S, config: Config) -> Self {
        let kill_switch = KillSwitch::new(config.killswitch_engaged_at_boot);
        Self {
            storage,
            hooks: HookRegistry::new(),
            #[cfg(feature = "std")]
            rate_limiter: RateLimiter::new(),
            kill_switch,
            config,
            sequence: AtomicU64::new(0),
        }
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    pub fn kill_switch(&self) -> &KillSwitch {
        &self.kill_switch
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn hooks_mut(&mut self) -> &mut HookRegistry {
        &mut self.hooks
    }

    fn next_decision_id(&self) -> DecisionId {
        let n = self.sequence.fetch_add(1, Ordering::Relaxed);
        DecisionId::from(alloc::format!("dec-{n:020}"))
    }

    /// Run the full eight-step pipeline against `intent`. `now_ms` is
    /// supplied by the caller rather than read from the clock, keeping this
    /// path usable under `no_std`.
    pub fn authorize(&self, intent: &Intent, now_ms: u64) -> Decision {
        let decision_id = self.next_decision_id();

        if let Some(reason) = self.hooks.run_pre(intent) {
            return denial(intent, decision_id, crate::types::TrustBand::Untrusted, 0, reason, "denied by pre-authorize hook", now_ms);
        }

        if intent.is_expired(now_ms) {
            return denial(
                intent,
                decision_id,
                crate::types::TrustBand::Untrusted,
                0,
                DenialReason::ExpiredIntent,
                "intent expired before authorization",
                now_ms,
            );
        }

        let agent = match self.storage.get_agent(&intent.agent_id) {
            Some(agent) => agent,
            None => {
                return denial(
                    intent,
                    decision_id,
                    crate::types::TrustBand::Untrusted,
                    0,
                    DenialReason::InvalidAgent,
                    "agent is not registered",
                    now_ms,
                )
            }
        };

        let profile = self.storage.get_trust_profile(&intent.agent_id).unwrap_or_else(|| {
            let fresh = TrustProfile::genesis(intent.agent_id.clone(), now_ms);
            self.storage.init_trust_profile(fresh.clone());
            fresh
        });
        let band = crate::types::TrustBand::from_score(profile.adjusted_score);

        if self.kill_switch.blocks(band.display_name(), agent.specialization.as_deref()) {
            return denial(
                intent,
                decision_id,
                band,
                profile.score,
                DenialReason::PolicyViolation,
                "kill_switch",
                now_ms,
            );
        }

        if band == crate::types::TrustBand::Untrusted {
            return denial(
                intent,
                decision_id,
                band,
                profile.score,
                DenialReason::InsufficientTrust,
                "untrusted band always denies",
                now_ms,
            );
        }

        if !can_perform(band, intent.action_type, intent.data_sensitivity, intent.reversibility) {
            return denial(
                intent,
                decision_id,
                band,
                profile.score,
                DenialReason::InsufficientTrust,
                "trust band does not clear the required band for this action",
                now_ms,
            );
        }

        if intent.data_sensitivity == DataSensitivity::Restricted && !allows_restricted_scope(band) {
            return denial(
                intent,
                decision_id,
                band,
                profile.score,
                DenialReason::ResourceRestricted,
                "band's allowed scope set excludes restricted data",
                now_ms,
            );
        }

        if let Some(why) = context_violation(band, &intent.context) {
            return denial(intent, decision_id, band, profile.score, DenialReason::ContextMismatch, why, now_ms);
        }

        // Token-bucket rate limiting needs `dashmap`'s concurrent map, which
        // pulls in `std` — under `no_std` (no allocator-backed concurrent
        // map available) this step is skipped entirely rather than faked.
        #[cfg(feature = "std")]
        {
            let rl_cfg = RateLimitConfig {
                per_minute: self.config.default_rate_limit_per_minute,
                per_hour: self.config.default_rate_limit_per_hour,
                per_day: self.config.default_rate_limit_per_day,
            };
            if !self.rate_limiter.check_and_consume(&intent.agent_id, rl_cfg, now_ms) {
                return denial(
                    intent,
                    decision_id,
                    band,
                    profile.score,
                    DenialReason::RateLimitExceeded,
                    "rate limit exceeded",
                    now_ms,
                );
            }
        }

        let risk = infer_risk_level(intent);
        let routing = matrix::route(band, risk);

        let concern_result = concerns::evaluate(intent);
        // A blocking concern (Safety/Ethics/Legality) failing denies here;
        // an advisory-only failure (Policy/Efficiency/Innovation) flips
        // `overall_passed` to false per spec.md §4.2b but never blocks on
        // its own — it still proceeds, carrying its violation in
        // `reasoning` below for the recommended `review`.
        if concern_result.blocked_by.is_some() {
            let mut reasoning: Vec<alloc::string::String> = routing.reasoning.clone();
            reasoning.extend(concern_result.evaluations.iter().flat_map(|e| e.violations.clone()));
            return Decision {
                decision_id,
                intent_id: intent.intent_id.clone(),
                agent_id: intent.agent_id.clone(),
                permitted: false,
                denial_reason: DenialReason::PolicyViolation,
                constraints: None,
                trust_band: band,
                trust_score: profile.score,
                reasoning,
                decided_at_ms: now_ms,
                expires_at_ms: now_ms,
                latency_ms: 0,
                policy_set_id: "default".to_string(),
                correlation_id: intent.correlation_id.clone(),
            };
        }

        let base = base_constraints(&self.config, band, routing.path, intent.reversibility, now_ms);
        let constraints: DecisionConstraints = merge_manifest_constraints(base, &agent.manifest);

        let mut reasoning = routing.reasoning.clone();
        reasoning.extend(
            concern_result
                .evaluations
                .iter()
                .filter(|e| e.action != crate::types::ConcernAction::Proceed)
                .flat_map(|e| e.violations.clone()),
        );

        let decision = Decision {
            decision_id,
            intent_id: intent.intent_id.clone(),
            agent_id: intent.agent_id.clone(),
            permitted: true,
            denial_reason: DenialReason::None,
            constraints: Some(constraints.clone()),
            trust_band: band,
            trust_score: profile.score,
            reasoning,
            decided_at_ms: now_ms,
            expires_at_ms: constraints.deadline_ms,
            latency_ms: 0,
            policy_set_id: "default".to_string(),
            correlation_id: intent.correlation_id.clone(),
        };

        self.hooks.run_post(intent, &decision);
        decision
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ids::{AgentId, CorrelationId, IntentId};
    use crate::storage::InMemoryStorage;
    use crate::types::{Agent, ActionType, IntentContext, Manifest, PipelineStage};
    use alloc::vec;

    fn engine_with_agent(score: u16) -> AuthorizationEngine<InMemoryStorage> {
        let storage = InMemoryStorage::new();
        let agent_id = AgentId::from("a1");
        storage.put_agent(Agent {
            agent_id: agent_id.clone(),
            name: "tester".into(),
            owner_id: "owner".into(),
            capabilities: vec!["read".into()],
            manifest: Manifest {
                schema_version: 1,
                agent_name: "tester".into(),
                agent_version: "1.0.0".into(),
                description: String::new(),
                capabilities: vec![],
                constraints: vec![],
                default_autonomy: crate::types::TrustBand::Established,
            },
            pipeline_stage: PipelineStage::Active,
            specialization: None,
        });
        let mut profile = TrustProfile::genesis(agent_id, 0);
        profile.score = score;
        profile.adjusted_score = score;
        storage.init_trust_profile(profile);
        AuthorizationEngine::new(storage, Config::default())
    }

    use alloc::string::String;

    fn intent(sensitivity: DataSensitivity, reversibility: Reversibility) -> Intent {
        Intent::new(
            IntentId::from("i1"),
            AgentId::from("a1"),
            ActionType::Read,
            sensitivity,
            reversibility,
            CorrelationId::from("c1"),
            0,
            10_000,
            IntentContext::default(),
        )
        .unwrap()
    }

    #[test]
    fn permits_low_risk_read_for_established_agent() {
        let engine = engine_with_agent(450);
        let decision = engine.authorize(&intent(DataSensitivity::Public, Reversibility::Reversible), 100);
        assert!(decision.permitted);
        assert!(decision.invariant_holds());
    }

    #[test]
    fn denies_unregistered_agent() {
        let storage = InMemoryStorage::new();
        let engine = AuthorizationEngine::new(storage, Config::default());
        let decision = engine.authorize(&intent(DataSensitivity::Public, Reversibility::Reversible), 100);
        assert!(!decision.permitted);
        assert_eq!(decision.denial_reason, DenialReason::InvalidAgent);
    }

    #[test]
    fn kill_switch_denies_everything() {
        let engine = engine_with_agent(900);
        engine.kill_switch().activate("incident".to_string(), crate::killswitch::KillSwitchScope::All);
        let decision = engine.authorize(&intent(DataSensitivity::Public, Reversibility::Reversible), 100);
        assert!(!decision.permitted);
        assert_eq!(decision.denial_reason, DenialReason::PolicyViolation);
    }

    #[test]
    fn kill_switch_tier_scope_spares_other_tiers() {
        let engine = engine_with_agent(900);
        engine
            .kill_switch()
            .activate("maintenance".to_string(), crate::killswitch::KillSwitchScope::Tier("untrusted".to_string()));
        let decision = engine.authorize(&intent(DataSensitivity::Public, Reversibility::Reversible), 100);
        assert!(decision.permitted);
    }

    #[test]
    fn denies_expired_intent() {
        let engine = engine_with_agent(900);
        let mut bad_intent = intent(DataSensitivity::Public, Reversibility::Reversible);
        bad_intent.expires_at_ms = 1;
        let decision = engine.authorize(&bad_intent, 100_000);
        assert!(!decision.permitted);
        assert_eq!(decision.denial_reason, DenialReason::ExpiredIntent);
    }

    #[test]
    fn insufficient_trust_denies_delete() {
        let engine = engine_with_agent(100);
        let mut delete_intent = intent(DataSensitivity::Public, Reversibility::Reversible);
        delete_intent.action_type = ActionType::Delete;
        let decision = engine.authorize(&delete_intent, 100);
        assert!(!decision.permitted);
        assert_eq!(decision.denial_reason, DenialReason::InsufficientTrust);
    }

    #[test]
    fn safety_concern_blocks_irreversible_restricted_action() {
        let engine = engine_with_agent(950);
        let decision = engine.authorize(&intent(DataSensitivity::Restricted, Reversibility::Irreversible), 100);
        assert!(!decision.permitted);
        assert_eq!(decision.denial_reason, DenialReason::PolicyViolation);
    }

    #[test]
    fn phi_in_production_at_trusted_band_is_permitted() {
        // S3: trust=620 (trusted band), environment=production, handlesPhi=true,
        // read/confidential. Required band for read+confidential is `trusted`,
        // which trust=620 clears, and the context ceiling for PHI is also
        // `trusted`, so this should permit with a grey observability tier.
        let engine = engine_with_agent(620);
        let mut i = intent(DataSensitivity::Confidential, Reversibility::Reversible);
        i.context.environment = Some("production".into());
        i.context.handles_phi = true;
        let decision = engine.authorize(&i, 100);
        assert!(decision.permitted);
        let constraints = decision.constraints.unwrap();
        assert_eq!(constraints.observability_tier, crate::types::ObservabilityTier::Grey);
        assert!(constraints.required_approvals.is_empty());
    }

    #[test]
    fn phi_in_production_below_trusted_band_is_context_mismatch() {
        let engine = engine_with_agent(450); // established, below trusted
        let mut i = intent(DataSensitivity::Internal, Reversibility::Reversible);
        i.context.environment = Some("production".into());
        i.context.handles_phi = true;
        let decision = engine.authorize(&i, 100);
        assert!(!decision.permitted);
        assert_eq!(decision.denial_reason, DenialReason::ContextMismatch);
    }

    #[test]
    fn untrusted_band_always_denies_even_public_read() {
        let engine = engine_with_agent(0);
        let decision = engine.authorize(&intent(DataSensitivity::Public, Reversibility::Reversible), 100);
        assert!(!decision.permitted);
        assert_eq!(decision.denial_reason, DenialReason::InsufficientTrust);
    }

    #[test]
    fn rate_limit_denies_after_exhausting_minute_bucket() {
        let engine = engine_with_agent(900);
        let mut cfg = Config::default();
        cfg.default_rate_limit_per_minute = 1;
        let engine = AuthorizationEngine::new(engine.storage, cfg);
        let first = engine.authorize(&intent(DataSensitivity::Public, Reversibility::Reversible), 100);
        assert!(first.permitted);
        let second = engine.authorize(&intent(DataSensitivity::Public, Reversibility::Reversible), 100);
        assert!(!second.permitted);
        assert_eq!(second.denial_reason, DenialReason::RateLimitExceeded);
    }
}

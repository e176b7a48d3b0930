// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Governor Labs, Inc.

//! Storage abstraction.
//!
//! Mirrors the teacher's `storage.rs`: a small trait implemented first by
//! an in-memory, `hashbrown`-backed store for tests and embedded callers,
//! and by `governor-std::FileStorage` for a durable on-disk deployment.
//! Expanded here from the teacher's four data kinds (trust/envelope/
//! consent/audit) to the full persisted-state layout: agents, trust
//! profiles, Observer events, anomalies, council decisions, HITL reviews,
//! and API keys.

use alloc::string::{String, ToString};
use alloc::vec::Vec;
use hashbrown::HashMap;

use crate::errors::GovernanceError;
use crate::ids::{AgentId, AnomalyId, ApiKeyId, ReviewId};
use crate::types::{
    Agent, Anomaly, ApiKeyRecord, CouncilDecision, HitlReview, ObserverEvent, ObserverFilter,
    TrustProfile,
};

/// Storage back-end for all durable governance state.
///
/// Implementations must treat [`Storage::cas_trust_score`] as atomic with
/// respect to concurrent callers — it is the only mutation path for trust
/// scores and is how [`crate::trust::TrustScoringEngine`] resolves the
/// compare-and-swap race described in `DESIGN.md`.
pub trait Storage: Send + Sync {
    fn get_agent(&self, agent_id: &AgentId) -> Option<Agent>;
    fn put_agent(&self, agent: Agent);
    fn list_agents(&self) -> Vec<Agent>;

    fn get_trust_profile(&self, agent_id: &AgentId) -> Option<TrustProfile>;

    /// Create a fresh profile if (and only if) none exists yet.
    fn init_trust_profile(&self, profile: TrustProfile);

    /// Compare-and-swap the profile's `version` field. Returns the updated
    /// profile on success, or `ConcurrentUpdateConflict` if `expected_version`
    /// is stale (caller should reread and retry).
    fn cas_trust_score(
        &self,
        agent_id: &AgentId,
        expected_version: u64,
        new_score: u16,
        new_adjusted_score: u16,
        now_ms: u64,
    ) -> Result<TrustProfile, GovernanceError>;

    fn append_observer_event(&self, event: ObserverEvent);
    fn latest_observer_event(&self) -> Option<ObserverEvent>;
    fn query_observer_events(&self, filter: &ObserverFilter) -> Vec<ObserverEvent>;

    fn put_anomaly(&self, anomaly: Anomaly);
    fn get_anomaly(&self, id: &AnomalyId) -> Option<Anomaly>;
    fn list_open_anomalies(&self, agent_id: Option<&AgentId>) -> Vec<Anomaly>;

    fn put_council_decision(&self, intent_id: &str, decision: CouncilDecision);
    fn get_council_decision(&self, intent_id: &str) -> Option<CouncilDecision>;

    fn put_hitl_review(&self, review: HitlReview);
    fn get_hitl_review(&self, id: &ReviewId) -> Option<HitlReview>;
    fn list_pending_hitl(&self) -> Vec<HitlReview>;

    fn put_api_key(&self, record: ApiKeyRecord);
    fn get_api_key(&self, id: &ApiKeyId) -> Option<ApiKeyRecord>;

    /// Idempotency check: has a proof with this hash already been ingested
    /// for this agent? Callers insert after a successful check.
    fn has_proof_hash(&self, agent_id: &AgentId, proof_hash: &str) -> bool;
    fn record_proof_hash(&self, agent_id: &AgentId, proof_hash: String);
}

#[cfg(feature = "std")]
mod in_memory {
    use super::*;
    use std::sync::RwLock;

    #[derive(Default)]
    struct Tables {
        agents: HashMap<String, Agent>,
        trust_profiles: HashMap<String, TrustProfile>,
        observer_events: Vec<ObserverEvent>,
        anomalies: HashMap<String, Anomaly>,
        council_decisions: HashMap<String, CouncilDecision>,
        hitl_reviews: HashMap<String, HitlReview>,
        api_keys: HashMap<String, ApiKeyRecord>,
        proof_hashes: HashMap<String, Vec<String>>,
    }

    /// In-memory `Storage` implementation. Suitable for tests, embedded
    /// deployments, and as the default when no durable backend is wired up.
    /// All state is lost on process exit.
    pub struct InMemoryStorage {
        tables: RwLock<Tables>,
    }

    impl InMemoryStorage {
        pub fn new() -> Self {
            Self { tables: RwLock::new(Tables::default()) }
        }
    }

    impl Default for InMemoryStorage {
        fn default() -> Self {
            Self::new()
        }
    }

    impl Storage for InMemoryStorage {
        fn get_agent(&self, agent_id: &AgentId) -> Option<Agent> {
            self.tables.read().unwrap().agents.get(agent_id.as_str()).cloned()
        }

        fn put_agent(&self, agent: Agent) {
            self.tables.write().unwrap().agents.insert(agent.agent_id.0.clone(), agent);
        }

        fn list_agents(&self) -> Vec<Agent> {
            self.tables.read().unwrap().agents.values().cloned().collect()
        }

        fn get_trust_profile(&self, agent_id: &AgentId) -> Option<TrustProfile> {
            self.tables.read().unwrap().trust_profiles.get(agent_id.as_str()).cloned()
        }

        fn init_trust_profile(&self, profile: TrustProfile) {
            let mut tables = self.tables.write().unwrap();
            tables.trust_profiles.entry(profile.agent_id.0.clone()).or_insert(profile);
        }

        fn cas_trust_score(
            &self,
            agent_id: &AgentId,
            expected_version: u64,
            new_score: u16,
            new_adjusted_score: u16,
            now_ms: u64,
        ) -> Result<TrustProfile, GovernanceError> {
            let mut tables = self.tables.write().unwrap();
            let profile = tables
                .trust_profiles
                .get_mut(agent_id.as_str())
                .ok_or_else(|| GovernanceError::InvalidAgent { agent_id: agent_id.to_string() })?;
            if profile.version != expected_version {
                return Err(GovernanceError::ConcurrentUpdateConflict {
                    entity: agent_id.to_string(),
                    retries: 0,
                });
            }
            profile.score = new_score;
            profile.adjusted_score = new_adjusted_score;
            profile.version += 1;
            profile.last_update_ms = now_ms;
            Ok(profile.clone())
        }

        fn append_observer_event(&self, event: ObserverEvent) {
            self.tables.write().unwrap().observer_events.push(event);
        }

        fn latest_observer_event(&self) -> Option<ObserverEvent> {
            self.tables.read().unwrap().observer_events.last().cloned()
        }

        fn query_observer_events(&self, filter: &ObserverFilter) -> Vec<ObserverEvent> {
            let tables = self.tables.read().unwrap();
            let mut out: Vec<ObserverEvent> = tables
                .observer_events
                .iter()
                .filter(|e| {
                    filter.agent_id.as_ref().map(|a| e.agent_id.as_ref() == Some(a)).unwrap_or(true)
                        && filter.user_id.as_ref().map(|u| e.user_id.as_deref() == Some(u.as_str())).unwrap_or(true)
                        && filter.event_type.as_ref().map(|t| &e.event_type == t).unwrap_or(true)
                        && filter.source.as_ref().map(|s| &e.source == s).unwrap_or(true)
                        && filter.min_risk.map(|r| e.risk_level >= r).unwrap_or(true)
                        && filter.since_ms.map(|t| e.timestamp_ms >= t).unwrap_or(true)
                        && filter.until_ms.map(|t| e.timestamp_ms <= t).unwrap_or(true)
                        && filter.after_sequence.map(|s| e.sequence > s).unwrap_or(true)
                })
                .cloned()
                .collect();
            if let Some(limit) = filter.limit {
                out.truncate(limit);
            }
            out
        }

        fn put_anomaly(&self, anomaly: Anomaly) {
            self.tables.write().unwrap().anomalies.insert(anomaly.anomaly_id.0.clone(), anomaly);
        }

        fn get_anomaly(&self, id: &AnomalyId) -> Option<Anomaly> {
            self.tables.read().unwrap().anomalies.get(id.as_str()).cloned()
        }

        fn list_open_anomalies(&self, agent_id: Option<&AgentId>) -> Vec<Anomaly> {
            self.tables
                .read()
                .unwrap()
                .anomalies
                .values()
                .filter(|a| a.lifecycle == crate::types::AnomalyLifecycle::Open)
                .filter(|a| agent_id.map(|id| &a.agent_id == id).unwrap_or(true))
                .cloned()
                .collect()
        }

        fn put_council_decision(&self, intent_id: &str, decision: CouncilDecision) {
            self.tables.write().unwrap().council_decisions.insert(intent_id.into(), decision);
        }

        fn get_council_decision(&self, intent_id: &str) -> Option<CouncilDecision> {
            self.tables.read().unwrap().council_decisions.get(intent_id).cloned()
        }

        fn put_hitl_review(&self, review: HitlReview) {
            self.tables.write().unwrap().hitl_reviews.insert(review.review_id.0.clone(), review);
        }

        fn get_hitl_review(&self, id: &ReviewId) -> Option<HitlReview> {
            self.tables.read().unwrap().hitl_reviews.get(id.as_str()).cloned()
        }

        fn list_pending_hitl(&self) -> Vec<HitlReview> {
            self.tables
                .read()
                .unwrap()
                .hitl_reviews
                .values()
                .filter(|r| r.status == crate::types::HitlStatus::Pending)
                .cloned()
                .collect()
        }

        fn put_api_key(&self, record: ApiKeyRecord) {
            self.tables.write().unwrap().api_keys.insert(record.key_id.0.clone(), record);
        }

        fn get_api_key(&self, id: &ApiKeyId) -> Option<ApiKeyRecord> {
            self.tables.read().unwrap().api_keys.get(id.as_str()).cloned()
        }

        fn has_proof_hash(&self, agent_id: &AgentId, proof_hash: &str) -> bool {
            self.tables
                .read()
                .unwrap()
                .proof_hashes
                .get(agent_id.as_str())
                .map(|hashes| hashes.iter().any(|h| h == proof_hash))
                .unwrap_or(false)
        }

        fn record_proof_hash(&self, agent_id: &AgentId, proof_hash: String) {
            self.tables
                .write()
                .unwrap()
                .proof_hashes
                .entry(agent_id.0.clone())
                .or_default()
                .push(proof_hash);
        }
    }
}

#[cfg(feature = "std")]
pub use in_memory::InMemoryStorage;

#[cfg(all(test, feature = "std"))]
mod tests {
    use super::*;
    use crate::types::{PipelineStage};

    fn agent(id: &str) -> Agent {
        Agent {
            agent_id: AgentId::from(id),
            name: "test".into(),
            owner_id: "owner".into(),
            capabilities: Vec::new(),
            manifest: crate::types::Manifest {
                schema_version: 1,
                agent_name: "test".into(),
                agent_version: "1.0.0".into(),
                description: String::new(),
                capabilities: Vec::new(),
                constraints: Vec::new(),
                default_autonomy: crate::types::TrustBand::Untrusted,
            },
            pipeline_stage: PipelineStage::Draft,
            specialization: None,
        }
    }

    #[test]
    fn cas_rejects_stale_version() {
        let store = InMemoryStorage::new();
        let id = AgentId::from("a1");
        store.init_trust_profile(TrustProfile::genesis(id.clone(), 0));
        assert!(store.cas_trust_score(&id, 0, 100, 100, 10).is_ok());
        let err = store.cas_trust_score(&id, 0, 200, 200, 20).unwrap_err();
        assert!(matches!(err, GovernanceError::ConcurrentUpdateConflict { .. }));
    }

    #[test]
    fn agent_roundtrip() {
        let store = InMemoryStorage::new();
        store.put_agent(agent("a1"));
        assert!(store.get_agent(&AgentId::from("a1")).is_some());
        assert_eq!(store.list_agents().len(), 1);
    }

    #[test]
    fn proof_hash_dedup() {
        let store = InMemoryStorage::new();
        let id = AgentId::from("a1");
        assert!(!store.has_proof_hash(&id, "h1"));
        store.record_proof_hash(&id, "h1".into());
        assert!(store.has_proof_hash(&id, "h1"));
    }
}

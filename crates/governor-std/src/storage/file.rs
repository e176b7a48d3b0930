// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Governor Labs, Inc.

//! File-based JSON storage backend.
//!
//! [`FileStorage`] persists all governance state to a single JSON file on
//! disk. Every mutation flushes the file atomically (write-rename) so a
//! crash mid-write never corrupts existing data — unchanged from the
//! teacher's own `FileStorage`, just widened from four data kinds
//! (trust/envelope/consent/audit) to the full state layout
//! [`governor_core::storage::Storage`] now requires.
//!
//! ## Caveats
//!
//! * [`FileStorage`] holds the full in-memory state and flushes on every
//!   mutation. It is not intended for high-frequency write workloads —
//!   swap in a database-backed `Storage` impl for that.
//! * Concurrent access from multiple *processes* is not supported; within
//!   a process, access is serialized by an internal mutex.

use std::io;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use governor_core::errors::GovernanceError;
use governor_core::ids::{AgentId, AnomalyId, ApiKeyId, ReviewId};
use governor_core::storage::Storage;
use governor_core::types::{
    Agent, Anomaly, AnomalyLifecycle, ApiKeyRecord, CouncilDecision, HitlReview, HitlStatus,
    ObserverEvent, ObserverFilter, TrustProfile,
};
use hashbrown::HashMap;
use serde::{Deserialize, Serialize};

/// Snapshot of all governance state, serialized to / deserialized from disk.
#[derive(Debug, Default, Serialize, Deserialize)]
struct StorageSnapshot {
    agents: HashMap<String, Agent>,
    trust_profiles: HashMap<String, TrustProfile>,
    observer_events: Vec<ObserverEvent>,
    anomalies: HashMap<String, Anomaly>,
    council_decisions: HashMap<String, CouncilDecision>,
    hitl_reviews: HashMap<String, HitlReview>,
    api_keys: HashMap<String, ApiKeyRecord>,
    proof_hashes: HashMap<String, Vec<String>>,
}

/// A file-backed [`Storage`] implementation that persists state as JSON.
pub struct FileStorage {
    path: PathBuf,
    data: Mutex<StorageSnapshot>,
}

impl FileStorage {
    /// Open an existing JSON storage file, or create a new empty one if
    /// the path does not exist.
    pub fn open<P: AsRef<Path>>(path: P) -> io::Result<Self> {
        let path = path.as_ref().to_path_buf();
        let data = if path.exists() {
            let raw = std::fs::read_to_string(&path)?;
            serde_json::from_str(&raw)
                .map_err(|error| io::Error::new(io::ErrorKind::InvalidData, format!("governance storage JSON parse error: {error}")))?
        } else {
            StorageSnapshot::default()
        };

        Ok(Self { path, data: Mutex::new(data) })
    }

    /// Flush the current in-memory state to disk using an atomic
    /// write-rename: written to `<path>.tmp` first, then renamed over the
    /// target.
    fn flush(&self, data: &StorageSnapshot) -> io::Result<()> {
        let json = serde_json::to_string_pretty(data)
            .map_err(|error| io::Error::new(io::ErrorKind::InvalidData, format!("governance storage serialisation error: {error}")))?;
        let tmp_path = self.path.with_extension("tmp");
        std::fs::write(&tmp_path, json)?;
        std::fs::rename(&tmp_path, &self.path)?;
        Ok(())
    }
}

impl Storage for FileStorage {
    fn get_agent(&self, agent_id: &AgentId) -> Option<Agent> {
        self.data.lock().unwrap().agents.get(agent_id.as_str()).cloned()
    }

    fn put_agent(&self, agent: Agent) {
        let mut data = self.data.lock().unwrap();
        data.agents.insert(agent.agent_id.0.clone(), agent);
        let _ = self.flush(&data);
    }

    fn list_agents(&self) -> Vec<Agent> {
        self.data.lock().unwrap().agents.values().cloned().collect()
    }

    fn get_trust_profile(&self, agent_id: &AgentId) -> Option<TrustProfile> {
        self.data.lock().unwrap().trust_profiles.get(agent_id.as_str()).cloned()
    }

    fn init_trust_profile(&self, profile: TrustProfile) {
        let mut data = self.data.lock().unwrap();
        data.trust_profiles.entry(profile.agent_id.0.clone()).or_insert(profile);
        let _ = self.flush(&data);
    }

    fn cas_trust_score(
        &self,
        agent_id: &AgentId,
        expected_version: u64,
        new_score: u16,
        new_adjusted_score: u16,
        now_ms: u64,
    ) -> Result<TrustProfile, GovernanceError> {
        let mut data = self.data.lock().unwrap();
        {
            let profile = data
                .trust_profiles
                .get_mut(agent_id.as_str())
                .ok_or_else(|| GovernanceError::InvalidAgent { agent_id: agent_id.to_string() })?;
            if profile.version != expected_version {
                return Err(GovernanceError::ConcurrentUpdateConflict { entity: agent_id.to_string(), retries: 0 });
            }
            profile.score = new_score;
            profile.adjusted_score = new_adjusted_score;
            profile.version += 1;
            profile.last_update_ms = now_ms;
        }
        let result = data.trust_profiles.get(agent_id.as_str()).cloned().unwrap();
        let _ = self.flush(&data);
        Ok(result)
    }

    fn append_observer_event(&self, event: ObserverEvent) {
        let mut data = self.data.lock().unwrap();
        data.observer_events.push(event);
        let _ = self.flush(&data);
    }

    fn latest_observer_event(&self) -> Option<ObserverEvent> {
        self.data.lock().unwrap().observer_events.last().cloned()
    }

    fn query_observer_events(&self, filter: &ObserverFilter) -> Vec<ObserverEvent> {
        let data = self.data.lock().unwrap();
        let mut out: Vec<ObserverEvent> = data
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
        let mut data = self.data.lock().unwrap();
        data.anomalies.insert(anomaly.anomaly_id.0.clone(), anomaly);
        let _ = self.flush(&data);
    }

    fn get_anomaly(&self, id: &AnomalyId) -> Option<Anomaly> {
        self.data.lock().unwrap().anomalies.get(id.as_str()).cloned()
    }

    fn list_open_anomalies(&self, agent_id: Option<&AgentId>) -> Vec<Anomaly> {
        self.data
            .lock()
            .unwrap()
            .anomalies
            .values()
            .filter(|a| a.lifecycle == AnomalyLifecycle::Open)
            .filter(|a| agent_id.map(|id| &a.agent_id == id).unwrap_or(true))
            .cloned()
            .collect()
    }

    fn put_council_decision(&self, intent_id: &str, decision: CouncilDecision) {
        let mut data = self.data.lock().unwrap();
        data.council_decisions.insert(intent_id.into(), decision);
        let _ = self.flush(&data);
    }

    fn get_council_decision(&self, intent_id: &str) -> Option<CouncilDecision> {
        self.data.lock().unwrap().council_decisions.get(intent_id).cloned()
    }

    fn put_hitl_review(&self, review: HitlReview) {
        let mut data = self.data.lock().unwrap();
        data.hitl_reviews.insert(review.review_id.0.clone(), review);
        let _ = self.flush(&data);
    }

    fn get_hitl_review(&self, id: &ReviewId) -> Option<HitlReview> {
        self.data.lock().unwrap().hitl_reviews.get(id.as_str()).cloned()
    }

    fn list_pending_hitl(&self) -> Vec<HitlReview> {
        self.data
            .lock()
            .unwrap()
            .hitl_reviews
            .values()
            .filter(|r| r.status == HitlStatus::Pending)
            .cloned()
            .collect()
    }

    fn put_api_key(&self, record: ApiKeyRecord) {
        let mut data = self.data.lock().unwrap();
        data.api_keys.insert(record.key_id.0.clone(), record);
        let _ = self.flush(&data);
    }

    fn get_api_key(&self, id: &ApiKeyId) -> Option<ApiKeyRecord> {
        self.data.lock().unwrap().api_keys.get(id.as_str()).cloned()
    }

    fn has_proof_hash(&self, agent_id: &AgentId, proof_hash: &str) -> bool {
        self.data
            .lock()
            .unwrap()
            .proof_hashes
            .get(agent_id.as_str())
            .map(|hashes| hashes.iter().any(|h| h == proof_hash))
            .unwrap_or(false)
    }

    fn record_proof_hash(&self, agent_id: &AgentId, proof_hash: String) {
        let mut data = self.data.lock().unwrap();
        data.proof_hashes.entry(agent_id.0.clone()).or_default().push(proof_hash);
        let _ = self.flush(&data);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use governor_core::types::{Manifest, PipelineStage, TrustBand};

    fn temp_path(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("governor-std-test-{name}-{}.json", std::process::id()))
    }

    #[test]
    fn round_trips_an_agent_through_disk() {
        let path = temp_path("agent-roundtrip");
        let _ = std::fs::remove_file(&path);

        {
            let storage = FileStorage::open(&path).unwrap();
            storage.put_agent(Agent {
                agent_id: AgentId::from("a1"),
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
                    default_autonomy: TrustBand::Untrusted,
                },
                pipeline_stage: PipelineStage::Draft,
                specialization: None,
            });
        }

        let reopened = FileStorage::open(&path).unwrap();
        assert!(reopened.get_agent(&AgentId::from("a1")).is_some());
        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn cas_rejects_stale_version_after_reopen() {
        let path = temp_path("cas-reopen");
        let _ = std::fs::remove_file(&path);

        let storage = FileStorage::open(&path).unwrap();
        let agent_id = AgentId::from("a1");
        storage.init_trust_profile(TrustProfile::genesis(agent_id.clone(), 0));
        storage.cas_trust_score(&agent_id, 0, 100, 100, 10).unwrap();
        let err = storage.cas_trust_score(&agent_id, 0, 200, 200, 20).unwrap_err();
        assert!(matches!(err, GovernanceError::ConcurrentUpdateConflict { .. }));

        let _ = std::fs::remove_file(&path);
    }
}

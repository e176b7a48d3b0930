// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Governor Labs, Inc.

//! Trust scoring.
//!
//! Generalizes the teacher's `TrustManager` (manual set/get/check) into a
//! proof-driven scoring engine: callers submit batches of
//! [`crate::types::Proof`]s, each nudging the score up or down, and the
//! engine re-derives the agent's [`TrustBand`] after the batch lands. All
//! mutation goes through [`crate::storage::Storage::cas_trust_score`]; a
//! version mismatch is retried up to `config.trust_cas_max_retries` times
//! before giving up (`DESIGN.md` Open Question 2).

use alloc::string::ToString;
use alloc::vec::Vec;
use hmac::{Hmac, Mac};
use sha2::Sha256;

use crate::config::Config;
use crate::errors::GovernanceError;
use crate::ids::AgentId;
use crate::observer::chain::to_hex;
use crate::storage::Storage;
use crate::types::{DenialReason, Proof, ProofBatchResult, ProofError, ProofOutcome, TierChange, TrustBand};

const SUCCESS_DELTA: i32 = 5;
const FAIL_DELTA: i32 = -10;
const ABORT_DELTA: i32 = -25;
const SCORE_MIN: i32 = 0;
const SCORE_MAX: i32 = 1000;

type HmacSha256 = Hmac<Sha256>;

/// `batchSig` per spec.md §6: "HMAC over canonical serialization of
/// `{agentId, proofs}` using the shared signing secret". Same canonical
/// JSON convention as [`crate::observer::chain`] (serde_json without
/// `preserve_order`, so keys come out sorted).
fn canonical_batch_bytes(agent_id: &AgentId, proofs: &[Proof]) -> Result<Vec<u8>, GovernanceError> {
    let value = serde_json::json!({
        "agent_id": agent_id,
        "proofs": proofs,
    });
    serde_json::to_vec(&value)
        .map_err(|e| GovernanceError::SystemError { reason: alloc::format!("batch canonicalization failed: {e}") })
}

/// Produce `batchSig`: the hex-encoded HMAC-SHA256 over `{agent_id,
/// proofs}`. Callers submitting a batch (agent runtimes, the `wasm`/bench
/// entry points in this workspace) use this to compute the signature they
/// hand to [`TrustScoringEngine::submit_proofs`].
pub fn sign_batch(agent_id: &AgentId, proofs: &[Proof], signing_key: &[u8]) -> Result<String, GovernanceError> {
    let bytes = canonical_batch_bytes(agent_id, proofs)?;
    let mut mac = HmacSha256::new_from_slice(signing_key)
        .map_err(|_| GovernanceError::SystemError { reason: "invalid hmac key length".into() })?;
    mac.update(&bytes);
    Ok(to_hex(&mac.finalize().into_bytes()))
}

/// Verify `batch_sig` (hex-encoded HMAC-SHA256) against `{agent_id, proofs}`
/// signed with `signing_key`.
pub fn verify_batch_signature(
    agent_id: &AgentId,
    proofs: &[Proof],
    batch_sig: &str,
    signing_key: &[u8],
) -> Result<bool, GovernanceError> {
    let expected = sign_batch(agent_id, proofs, signing_key)?;
    Ok(expected == batch_sig)
}

/// Additional penalty for a proof's optional violation code (`v`), applied
/// on top of the base outcome delta — spec.md §4.4c ("violation penalties
/// (examples): POLICY_DENIED -15, BASIS_VIOLATION -30, TIMEOUT -5,
/// RESOURCE_LOCKED -2"). Unknown/absent codes contribute nothing.
fn violation_penalty(code: Option<&str>) -> i32 {
    match code {
        Some("POLICY_DENIED") => -15,
        Some("BASIS_VIOLATION") => -30,
        Some("TIMEOUT") => -5,
        Some("RESOURCE_LOCKED") => -2,
        _ => 0,
    }
}

fn delta_for(proof: &Proof) -> i32 {
    let base = match proof.o {
        ProofOutcome::Success => SUCCESS_DELTA,
        ProofOutcome::Fail => FAIL_DELTA,
        ProofOutcome::Abort => ABORT_DELTA,
    };
    base + violation_penalty(proof.v.as_deref())
}

pub struct TrustScoringEngine<'a, S: Storage> {
    storage: &'a S,
    config: &'a Config,
}

impl<'a, S: Storage> TrustScoringEngine<'a, S> {
    pub fn new(storage: &'a S, config: &'a Config) -> Self {
        Self { storage, config }
    }

    /// Ingest a batch of proofs for `agent_id`. `batch_sig` is the
    /// hex-encoded HMAC-SHA256 over `{agent_id, proofs}` (spec.md §6);
    /// a mismatch rejects the whole batch with `InvalidSignature` before
    /// any proof is touched. Duplicate proof hashes (already seen for this
    /// agent) are then rejected individually without failing the whole
    /// batch; every accepted proof's delta is summed and applied as a
    /// single clamped CAS write (spec.md §4.4c "clamping").
    pub fn submit_proofs(
        &self,
        agent_id: &AgentId,
        proofs: &[Proof],
        batch_sig: &str,
        now_ms: u64,
    ) -> Result<ProofBatchResult, GovernanceError> {
        if !verify_batch_signature(agent_id, proofs, batch_sig, self.config.observer_hmac_secret.as_bytes())? {
            return Err(GovernanceError::InvalidSignature);
        }

        let mut accepted = 0u32;
        let mut rejected = 0u32;
        let mut errors: Vec<ProofError> = Vec::new();
        let mut total_delta = 0i32;

        for (index, proof) in proofs.iter().enumerate() {
            if self.storage.has_proof_hash(agent_id, &proof.h) {
                rejected += 1;
                errors.push(ProofError { index, code: DenialReason::DuplicateProof.display_name().to_string() });
                continue;
            }
            self.storage.record_proof_hash(agent_id, proof.h.clone());
            total_delta += delta_for(proof);
            accepted += 1;
        }

        let profile = self.storage.get_trust_profile(agent_id).unwrap_or_else(|| {
            let fresh = crate::types::TrustProfile::genesis(agent_id.clone(), now_ms);
            self.storage.init_trust_profile(fresh.clone());
            fresh
        });

        let score_prev = profile.score;
        let mut expected_version = profile.version;
        let mut score_new = clamp_score(profile.score as i32 + total_delta);
        let mut retries = 0u32;

        loop {
            match self.storage.cas_trust_score(agent_id, expected_version, score_new, score_new, now_ms) {
                Ok(_) => break,
                Err(GovernanceError::ConcurrentUpdateConflict { .. }) => {
                    retries += 1;
                    if retries > self.config.trust_cas_max_retries {
                        return Err(GovernanceError::ConcurrentUpdateConflict {
                            entity: agent_id.to_string(),
                            retries,
                        });
                    }
                    let current = self
                        .storage
                        .get_trust_profile(agent_id)
                        .ok_or_else(|| GovernanceError::InvalidAgent { agent_id: agent_id.to_string() })?;
                    expected_version = current.version;
                    score_new = clamp_score(current.score as i32 + total_delta);
                }
                Err(other) => return Err(other),
            }
        }

        let tier_prev = TrustBand::from_score_ingestion(score_prev);
        let tier_new = TrustBand::from_score_ingestion(score_new);
        let tier_change = if tier_prev != tier_new {
            Some(TierChange { from: tier_prev as u8, to: tier_new as u8 })
        } else {
            None
        };

        Ok(ProofBatchResult {
            accepted,
            rejected,
            errors,
            score_prev,
            score_new,
            score_delta: score_new as i32 - score_prev as i32,
            tier_change,
        })
    }
}

fn clamp_score(score: i32) -> u16 {
    score.clamp(SCORE_MIN, SCORE_MAX) as u16
}

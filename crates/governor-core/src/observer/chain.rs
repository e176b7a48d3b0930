// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Governor Labs, Inc.

//! Hash-chain primitives for the Observer log.
//!
//! Generalizes the teacher's `audit.rs` chain-linking idea — each event
//! embeds the previous event's hash — but replaces its toy `DefaultHasher`
//! digest with real SHA-256, and adds an HMAC-SHA256 signature over that
//! hash so a compromised storage backend can't silently rewrite history
//! without also holding the signing secret (spec.md §4.4a, explicit
//! requirement).
//!
//! Canonical JSON here just means "serialize through `serde_json`, object
//! keys sorted" — this crate doesn't enable `serde_json`'s
//! `preserve_order` feature, so [`serde_json::Map`] is `BTreeMap`-backed
//! and keys come out sorted with no extra work.

use alloc::string::String;
use hmac::{Hmac, Mac};
use sha2::{Digest, Sha256};

use crate::types::{ObserverEvent, ObserverEventDraft};

pub const GENESIS_HASH: &str =
    "0000000000000000000000000000000000000000000000000000000000000000";

type HmacSha256 = Hmac<Sha256>;

/// Shared with [`crate::trust`]'s batch-signature verification — both are
/// "hex-encode an HMAC/SHA-256 digest" and there's no reason to duplicate
/// the byte-to-hex loop.
pub(crate) fn to_hex(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len() * 2);
    for byte in bytes {
        out.push(core::char::from_digit((byte >> 4) as u32, 16).unwrap());
        out.push(core::char::from_digit((byte & 0xf) as u32, 16).unwrap());
    }
    out
}

/// Canonical bytes for an event draft plus its chain position, used both
/// to compute the hash and to verify it later.
fn canonical_bytes(draft: &ObserverEventDraft, sequence: u64, previous_hash: &str) -> Result<alloc::vec::Vec<u8>, crate::errors::GovernanceError> {
    let value = serde_json::json!({
        "sequence": sequence,
        "previous_hash": previous_hash,
        "timestamp_ms": draft.timestamp_ms,
        "source": draft.source,
        "event_type": draft.event_type,
        "risk_level": draft.risk_level,
        "agent_id": draft.agent_id,
        "user_id": draft.user_id,
        "data": draft.data,
    });
    serde_json::to_vec(&value).map_err(|e| crate::errors::GovernanceError::SystemError {
        reason: alloc::format!("canonicalization failed: {e}"),
    })
}

/// Append `draft` onto a chain whose tip is `(sequence, previous_hash)`,
/// producing a fully hashed and signed [`ObserverEvent`].
pub fn seal(
    draft: ObserverEventDraft,
    sequence: u64,
    previous_hash: &str,
    hmac_secret: &[u8],
) -> Result<ObserverEvent, crate::errors::GovernanceError> {
    let bytes = canonical_bytes(&draft, sequence, previous_hash)?;

    let mut hasher = Sha256::new();
    hasher.update(&bytes);
    let hash = to_hex(&hasher.finalize());

    let mut mac = HmacSha256::new_from_slice(hmac_secret)
        .map_err(|_| crate::errors::GovernanceError::SystemError { reason: "invalid hmac key length".into() })?;
    mac.update(hash.as_bytes());
    let signature = to_hex(&mac.finalize().into_bytes());

    Ok(ObserverEvent {
        sequence,
        timestamp_ms: draft.timestamp_ms,
        source: draft.source,
        event_type: draft.event_type,
        risk_level: draft.risk_level,
        agent_id: draft.agent_id,
        user_id: draft.user_id,
        data: draft.data,
        previous_hash: previous_hash.into(),
        hash,
        signature,
    })
}

/// Recompute `event`'s hash and signature from its own fields and compare
/// against what's stored — `false` means either the event was tampered
/// with, or it was signed with a different secret.
pub fn verify(event: &ObserverEvent, hmac_secret: &[u8]) -> bool {
    let draft = ObserverEventDraft {
        timestamp_ms: event.timestamp_ms,
        source: event.source.clone(),
        event_type: event.event_type.clone(),
        risk_level: event.risk_level,
        agent_id: event.agent_id.clone(),
        user_id: event.user_id.clone(),
        data: event.data.clone(),
    };
    match seal(draft, event.sequence, &event.previous_hash, hmac_secret) {
        Ok(resealed) => resealed.hash == event.hash && resealed.signature == event.signature,
        Err(_) => false,
    }
}

/// Verify that `events` form an unbroken chain: sequence numbers are
/// contiguous starting from `expected_first_sequence` (the genesis sequence
/// is `1`, per spec.md §8's "dense sequence starting at 1"), each event's
/// `previous_hash` matches the prior event's `hash`, and every event's own
/// hash/signature verify. Returns the index of the first broken link, if
/// any.
pub fn verify_chain(events: &[ObserverEvent], expected_first_sequence: u64, hmac_secret: &[u8]) -> Option<usize> {
    let mut expected_previous = if expected_first_sequence == 1 {
        String::from(GENESIS_HASH)
    } else if events.is_empty() {
        return None;
    } else {
        return Some(0);
    };
    for (i, event) in events.iter().enumerate() {
        if event.sequence != expected_first_sequence + i as u64 {
            return Some(i);
        }
        if event.previous_hash != expected_previous {
            return Some(i);
        }
        if !verify(event, hmac_secret) {
            return Some(i);
        }
        expected_previous = event.hash.clone();
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::RiskLevel;

    fn draft() -> ObserverEventDraft {
        ObserverEventDraft {
            timestamp_ms: 1000,
            source: "authz".into(),
            event_type: "decision.permitted".into(),
            risk_level: RiskLevel::Low,
            agent_id: None,
            user_id: None,
            data: serde_json::json!({"foo": "bar"}),
        }
    }

    #[test]
    fn genesis_hash_is_the_length_of_a_real_sha256_digest() {
        assert_eq!(GENESIS_HASH.len(), Sha256::new().finalize().len() * 2);
    }

    #[test]
    fn sealed_event_verifies() {
        let event = seal(draft(), 1, GENESIS_HASH, b"secret").unwrap();
        assert!(verify(&event, b"secret"));
    }

    #[test]
    fn tampering_with_data_breaks_verification() {
        let mut event = seal(draft(), 1, GENESIS_HASH, b"secret").unwrap();
        event.data = serde_json::json!({"foo": "tampered"});
        assert!(!verify(&event, b"secret"));
    }

    #[test]
    fn wrong_secret_fails_verification() {
        let event = seal(draft(), 1, GENESIS_HASH, b"secret").unwrap();
        assert!(!verify(&event, b"wrong-secret"));
    }

    #[test]
    fn chain_of_three_events_verifies() {
        let e1 = seal(draft(), 1, GENESIS_HASH, b"secret").unwrap();
        let e2 = seal(draft(), 2, &e1.hash, b"secret").unwrap();
        let e3 = seal(draft(), 3, &e2.hash, b"secret").unwrap();
        assert!(verify_chain(&[e1, e2, e3], 1, b"secret").is_none());
    }

    #[test]
    fn reordered_chain_is_detected() {
        let e1 = seal(draft(), 1, GENESIS_HASH, b"secret").unwrap();
        let e2 = seal(draft(), 2, &e1.hash, b"secret").unwrap();
        assert_eq!(verify_chain(&[e2, e1], 1, b"secret"), Some(0));
    }
}

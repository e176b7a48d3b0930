// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Governor Labs, Inc.

//! Append-only Observer log.
//!
//! A single `tokio::sync::Mutex` serializes appends so sequence numbers and
//! the hash chain never race — the same one-lock-per-manager shape the
//! teacher used throughout `async_engine.rs`, just applied to the append
//! path specifically rather than the whole engine. Reads (`query`) don't
//! take the lock at all; they go straight to storage, which is safe for
//! concurrent access independent of appends.

use alloc::sync::Arc;
use alloc::vec::Vec;
use tokio::sync::Mutex;

use crate::observer::chain::{self, GENESIS_HASH};
use crate::storage::Storage;
use crate::types::{ObserverEvent, ObserverEventDraft, ObserverFilter};

pub struct ObserverLog<S: Storage> {
    storage: Arc<S>,
    hmac_secret: Vec<u8>,
    append_lock: Mutex<()>,
}

impl<S: Storage> ObserverLog<S> {
    pub fn new(storage: Arc<S>, hmac_secret: Vec<u8>) -> Self {
        Self { storage, hmac_secret, append_lock: Mutex::new(()) }
    }

    /// Append a new event onto the chain. Holds the append lock for the
    /// duration of the read-compute-write so two concurrent callers can
    /// never observe the same `(sequence, previous_hash)` tip.
    pub async fn append(&self, draft: ObserverEventDraft) -> Result<ObserverEvent, crate::errors::GovernanceError> {
        let _guard = self.append_lock.lock().await;

        let (sequence, previous_hash) = match self.storage.latest_observer_event() {
            Some(last) => (last.sequence + 1, last.hash),
            None => (1, GENESIS_HASH.into()),
        };

        let event = chain::seal(draft, sequence, &previous_hash, &self.hmac_secret)?;
        self.storage.append_observer_event(event.clone());
        Ok(event)
    }

    pub fn query(&self, filter: &ObserverFilter) -> Vec<ObserverEvent> {
        self.storage.query_observer_events(filter)
    }

    /// Verify the full chain from genesis. Intended for periodic integrity
    /// sweeps, not the hot append path.
    pub fn verify_all(&self) -> Option<usize> {
        let all = self.storage.query_observer_events(&ObserverFilter::default());
        chain::verify_chain(&all, 1, &self.hmac_secret)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::InMemoryStorage;
    use crate::types::RiskLevel;

    fn draft() -> ObserverEventDraft {
        ObserverEventDraft {
            timestamp_ms: 0,
            source: "test".into(),
            event_type: "unit_test".into(),
            risk_level: RiskLevel::Info,
            agent_id: None,
            user_id: None,
            data: serde_json::json!({}),
        }
    }

    #[tokio::test]
    async fn sequential_appends_form_a_valid_chain() {
        let log = ObserverLog::new(Arc::new(InMemoryStorage::new()), b"secret".to_vec());
        log.append(draft()).await.unwrap();
        log.append(draft()).await.unwrap();
        log.append(draft()).await.unwrap();
        assert!(log.verify_all().is_none());
    }

    #[tokio::test]
    async fn concurrent_appends_never_duplicate_a_sequence() {
        let log = Arc::new(ObserverLog::new(Arc::new(InMemoryStorage::new()), b"secret".to_vec()));
        let mut handles = Vec::new();
        for _ in 0..20 {
            let log = log.clone();
            handles.push(tokio::spawn(async move { log.append(draft()).await.unwrap() }));
        }
        for handle in handles {
            handle.await.unwrap();
        }
        assert!(log.verify_all().is_none());
        let all = log.query(&ObserverFilter::default());
        assert_eq!(all.len(), 20);
    }
}

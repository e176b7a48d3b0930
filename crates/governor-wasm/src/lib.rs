// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Governor Labs, Inc.

//! # governor-wasm
//!
//! WebAssembly bindings for the Governor agent governance platform.
//!
//! This crate exposes [`governor_core::authz::AuthorizationEngine`] to
//! JavaScript and TypeScript consumers running in browser or edge-worker
//! environments via `wasm-bindgen`. It generalizes the teacher's handle
//! registry pattern — `wasm_bindgen` cannot export opaque Rust structs
//! across the JS boundary without serialization overhead, so each engine
//! lives in a thread-local registry keyed by an integer handle (WASM is
//! single-threaded, so a bare `RefCell<HashMap<...>>` is sufficient) —
//! to the full `Intent`/`Decision` authorization pipeline instead of the
//! teacher's three fixed trust/budget/consent gates.
//!
//! ## Exported functions
//!
//! | Function                    | Description                                            |
//! |------------------------------|---------------------------------------------------------|
//! | `create_engine`              | Create a new engine with default config                 |
//! | `create_engine_with_config`  | Create a new engine with explicit JSON config            |
//! | `destroy_engine`             | Release an engine handle and free its memory             |
//! | `register_agent`             | Register a bare-minimum agent record                     |
//! | `sync_trust_score`           | Overwrite an agent's trust score (CAS under the hood)     |
//! | `authorize`                  | Run the authorization pipeline against a JSON `Intent`    |
//! | `submit_proofs`              | Ingest a batch of JSON execution proofs                  |
//! | `activate_kill_switch`       | Engage the kill switch with a reason and scope            |
//! | `deactivate_kill_switch`     | Disengage the kill switch                                |
//! | `is_kill_switch_engaged`     | Query current kill-switch state                          |
//! | `query_observer_events`      | Query the append-only Observer log                        |
//!
//! Every payload crosses the JS boundary as JSON text rather than a
//! `serde-wasm-bindgen`-mapped object, matching the wire format the rest of
//! the platform (webhooks, `governor-cf`) already uses for `Intent`/
//! `Decision` — a JS caller that has the HTTP API's JSON shape in hand can
//! pass it straight through.
//!
//! `governor-wasm` depends on `governor-core` with only the `std` feature,
//! not `async`: async requires Tokio, and a single-threaded WASM runtime has
//! no concurrent callers to serialize against in the first place. The
//! Observer log append path is accordingly reimplemented here directly over
//! [`governor_core::observer::chain::seal`] without
//! [`governor_core::observer::ObserverLog`]'s `tokio::sync::Mutex` — single
//! threadedness is the lock.
//!
//! ## JavaScript usage
//!
//! ```js
//! import init, {
//!   create_engine,
//!   register_agent,
//!   sync_trust_score,
//!   authorize,
//! } from '@governor/wasm';
//!
//! await init();
//!
//! const handle = create_engine();
//! register_agent(handle, 'agent-001', 'checkout-bot', 'team-payments');
//! sync_trust_score(handle, 'agent-001', 650, Date.now());
//!
//! const decision = JSON.parse(authorize(handle, JSON.stringify({
//!   intent_id: 'intent-1', agent_id: 'agent-001', action_type: 'read',
//!   data_sensitivity: 'public', reversibility: 'reversible',
//!   correlation_id: 'corr-1', created_at_ms: Date.now(),
//!   expires_at_ms: Date.now() + 60_000, context: {}, supersedes: null,
//! }), Date.now()));
//! console.log(decision.permitted);
//! ```

use std::cell::RefCell;
use std::collections::HashMap;

use governor_core::authz::AuthorizationEngine;
use governor_core::config::Config;
use governor_core::ids::AgentId;
use governor_core::killswitch::KillSwitchScope;
use governor_core::observer::chain::{self, GENESIS_HASH};
use governor_core::storage::{InMemoryStorage, Storage};
use governor_core::types::{
    Agent, Intent, Manifest, ObserverEventDraft, ObserverFilter, PipelineStage, Proof, RiskLevel, TrustBand,
    TrustProfile,
};
use wasm_bindgen::prelude::*;

// ---------------------------------------------------------------------------
// Engine registry
// ---------------------------------------------------------------------------

thread_local! {
    static ENGINES: RefCell<HashMap<u32, AuthorizationEngine<InMemoryStorage>>> =
        RefCell::new(HashMap::new());
    static NEXT_HANDLE: RefCell<u32> = RefCell::new(0);
}

/// Allocate a new engine handle. Handles wrap around at `u32::MAX - 1` to
/// reserve `u32::MAX` as the error sentinel.
fn next_handle() -> u32 {
    NEXT_HANDLE.with(|counter| {
        let handle = *counter.borrow();
        let next = if handle >= u32::MAX - 1 { 0 } else { handle + 1 };
        *counter.borrow_mut() = next;
        handle
    })
}

fn with_engine<F, R>(handle: u32, callback: F) -> Result<R, String>
where
    F: FnOnce(&AuthorizationEngine<InMemoryStorage>) -> R,
{
    ENGINES.with(|engines| {
        let map = engines.borrow();
        match map.get(&handle) {
            Some(engine) => Ok(callback(engine)),
            None => Err(format!("unknown engine handle {handle}")),
        }
    })
}

fn error_json(message: impl core::fmt::Display) -> String {
    serde_json::json!({ "error": message.to_string() }).to_string()
}

// ---------------------------------------------------------------------------
// Engine lifecycle
// ---------------------------------------------------------------------------

/// Create a new engine with default configuration and return its integer
/// handle. Pass this handle to all subsequent function calls.
#[wasm_bindgen]
pub fn create_engine() -> u32 {
    let handle = next_handle();
    let engine = AuthorizationEngine::new(InMemoryStorage::new(), Config::default());
    ENGINES.with(|engines| {
        engines.borrow_mut().insert(handle, engine);
    });
    handle
}

/// Create a new engine with explicit configuration.
///
/// `config_json` must be a JSON string matching [`Config`]'s shape.
/// Returns the integer engine handle, or `u32::MAX` on parse error.
#[wasm_bindgen]
pub fn create_engine_with_config(config_json: &str) -> u32 {
    let config: Config = match serde_json::from_str(config_json) {
        Ok(cfg) => cfg,
        Err(_) => return u32::MAX,
    };
    let handle = next_handle();
    let engine = AuthorizationEngine::new(InMemoryStorage::new(), config);
    ENGINES.with(|engines| {
        engines.borrow_mut().insert(handle, engine);
    });
    handle
}

/// Release the engine associated with `handle`, freeing its memory. After
/// calling this function the handle is no longer valid.
#[wasm_bindgen]
pub fn destroy_engine(handle: u32) {
    ENGINES.with(|engines| {
        engines.borrow_mut().remove(&handle);
    });
}

// ---------------------------------------------------------------------------
// Agent registration and trust
// ---------------------------------------------------------------------------

/// Register a bare-minimum agent record so it can pass authorization. Real
/// deployments populate this from a control-plane sync rather than the
/// request path; this is a no-op if the agent is already registered.
#[wasm_bindgen]
pub fn register_agent(handle: u32, agent_id: &str, name: &str, owner_id: &str) {
    let _ = with_engine(handle, |engine| {
        let id = AgentId::from(agent_id);
        if engine.storage().get_agent(&id).is_some() {
            return;
        }
        engine.storage().put_agent(Agent {
            agent_id: id,
            name: name.to_string(),
            owner_id: owner_id.to_string(),
            capabilities: Vec::new(),
            manifest: Manifest {
                schema_version: 1,
                agent_name: name.to_string(),
                agent_version: "0.0.0".to_string(),
                description: String::new(),
                capabilities: Vec::new(),
                constraints: Vec::new(),
                default_autonomy: TrustBand::Untrusted,
            },
            pipeline_stage: PipelineStage::Active,
            specialization: None,
        });
    });
}

/// Overwrite an agent's trust score, resolving CAS conflicts by re-reading
/// the current version (there is at most one JS thread, so the only race is
/// against this same call re-entered from a callback).
#[wasm_bindgen]
pub fn sync_trust_score(handle: u32, agent_id: &str, score: u16, now_ms: u64) {
    let _ = with_engine(handle, |engine| {
        let id = AgentId::from(agent_id);
        let storage = engine.storage();
        let profile = storage.get_trust_profile(&id).unwrap_or_else(|| {
            let fresh = TrustProfile::genesis(id.clone(), now_ms);
            storage.init_trust_profile(fresh.clone());
            fresh
        });
        let _ = storage.cas_trust_score(&id, profile.version, score, score, now_ms);
    });
}

// ---------------------------------------------------------------------------
// Authorization
// ---------------------------------------------------------------------------

/// Run the authorization pipeline against `intent_json` (a JSON-serialized
/// [`Intent`]) and return a JSON-serialized [`governor_core::types::Decision`].
///
/// Returns `{"error":"..."}` on parse failure or unknown handle.
#[wasm_bindgen]
pub fn authorize(handle: u32, intent_json: &str, now_ms: u64) -> String {
    let intent: Intent = match serde_json::from_str(intent_json) {
        Ok(intent) => intent,
        Err(e) => return error_json(format!("intent parse error: {e}")),
    };
    match with_engine(handle, |engine| {
        let decision = engine.authorize(&intent, now_ms);
        serde_json::to_string(&decision).unwrap_or_else(|e| error_json(format!("serialization error: {e}")))
    }) {
        Ok(json) => json,
        Err(e) => error_json(e),
    }
}

/// Ingest a batch of JSON-serialized [`Proof`]s for `agent_id`, verified
/// against `batch_sig` (hex-encoded HMAC-SHA256 over `{agent_id, proofs}`,
/// spec.md §6), and return a JSON-serialized
/// [`governor_core::types::ProofBatchResult`].
#[wasm_bindgen]
pub fn submit_proofs(handle: u32, agent_id: &str, proofs_json: &str, batch_sig: &str, now_ms: u64) -> String {
    let proofs: Vec<Proof> = match serde_json::from_str(proofs_json) {
        Ok(proofs) => proofs,
        Err(e) => return error_json(format!("proofs parse error: {e}")),
    };
    match with_engine(handle, |engine| {
        let scoring = governor_core::trust::TrustScoringEngine::new(engine.storage(), engine.config());
        match scoring.submit_proofs(&AgentId::from(agent_id), &proofs, batch_sig, now_ms) {
            Ok(result) => serde_json::to_string(&result).unwrap_or_else(|e| error_json(format!("serialization error: {e}"))),
            Err(e) => error_json(e),
        }
    }) {
        Ok(json) => json,
        Err(e) => error_json(e),
    }
}

// ---------------------------------------------------------------------------
// Kill switch
// ---------------------------------------------------------------------------

/// Engage the kill switch. `scope` is the wire form from spec.md §6:
/// `"all"`, `"tier:<name>"`, or `"specialization:<name>"`.
///
/// No-op (silently) if `scope` doesn't parse or the handle is unknown —
/// callers that need to know should check [`is_kill_switch_engaged`].
#[wasm_bindgen]
pub fn activate_kill_switch(handle: u32, reason: &str, scope: &str) {
    if let Some(scope) = KillSwitchScope::parse(scope) {
        let _ = with_engine(handle, |engine| {
            engine.kill_switch().activate(reason.to_string(), scope);
        });
    }
}

/// Disengage the kill switch.
#[wasm_bindgen]
pub fn deactivate_kill_switch(handle: u32) {
    let _ = with_engine(handle, |engine| {
        engine.kill_switch().deactivate();
    });
}

/// `true` if the kill switch is currently engaged (in any scope).
#[wasm_bindgen]
pub fn is_kill_switch_engaged(handle: u32) -> bool {
    with_engine(handle, |engine| engine.kill_switch().is_engaged()).unwrap_or(false)
}

// ---------------------------------------------------------------------------
// Observer log (synchronous, single-threaded reimplementation)
// ---------------------------------------------------------------------------

/// Append a `source`/`event_type` event with an arbitrary JSON `data`
/// payload onto the Observer hash chain and return the sealed event as
/// JSON, or `{"error":"..."}` on failure.
#[wasm_bindgen]
pub fn append_observer_event(
    handle: u32,
    source: &str,
    event_type: &str,
    risk_level: &str,
    data_json: &str,
    now_ms: u64,
) -> String {
    let risk_level: RiskLevel = match serde_json::from_value(serde_json::Value::String(risk_level.to_string())) {
        Ok(r) => r,
        Err(e) => return error_json(format!("invalid risk level: {e}")),
    };
    let data: serde_json::Value = match serde_json::from_str(data_json) {
        Ok(v) => v,
        Err(e) => return error_json(format!("invalid data payload: {e}")),
    };
    match with_engine(handle, |engine| {
        let storage = engine.storage();
        let (sequence, previous_hash) = match storage.latest_observer_event() {
            Some(last) => (last.sequence + 1, last.hash),
            None => (1, GENESIS_HASH.into()),
        };
        let draft = ObserverEventDraft {
            timestamp_ms: now_ms,
            source: source.to_string(),
            event_type: event_type.to_string(),
            risk_level,
            agent_id: None,
            user_id: None,
            data,
        };
        let secret = engine.config().observer_hmac_secret.as_bytes();
        match chain::seal(draft, sequence, &previous_hash, secret) {
            Ok(event) => {
                storage.append_observer_event(event.clone());
                serde_json::to_string(&event).unwrap_or_else(|e| error_json(format!("serialization error: {e}")))
            }
            Err(e) => error_json(e),
        }
    }) {
        Ok(json) => json,
        Err(e) => error_json(e),
    }
}

/// Query the Observer log with `filter_json` (a JSON-serialized
/// [`ObserverFilter`]; pass `"{}"` for no filter) and return a
/// JSON-serialized array of events.
#[wasm_bindgen]
pub fn query_observer_events(handle: u32, filter_json: &str) -> String {
    let filter: ObserverFilter = serde_json::from_str(filter_json).unwrap_or_default();
    with_engine(handle, |engine| {
        let events = engine.storage().query_observer_events(&filter);
        serde_json::to_string(&events).unwrap_or_else(|_| "[]".into())
    })
    .unwrap_or_else(|_| "[]".into())
}

// ---------------------------------------------------------------------------
// wasm-bindgen-test stubs
// ---------------------------------------------------------------------------

#[cfg(all(test, target_arch = "wasm32"))]
mod wasm_tests {
    use super::*;
    use wasm_bindgen_test::*;

    wasm_bindgen_test_configure!(run_in_browser);

    #[wasm_bindgen_test]
    fn test_create_and_destroy_engine() {
        let handle = create_engine();
        assert_ne!(handle, u32::MAX);
        destroy_engine(handle);
    }

    #[wasm_bindgen_test]
    fn test_authorize_permits_trusted_agent() {
        let handle = create_engine();
        register_agent(handle, "agent-001", "bot", "team");
        sync_trust_score(handle, "agent-001", 650, 1_000);

        let intent_json = r#"{
            "intent_id": "i1", "agent_id": "agent-001", "action_type": "read",
            "data_sensitivity": "public", "reversibility": "reversible",
            "correlation_id": "c1", "created_at_ms": 1000, "expires_at_ms": 61000,
            "context": {}, "supersedes": null
        }"#;
        let result = authorize(handle, intent_json, 1_000);
        assert!(result.contains("\"permitted\":true"));
        destroy_engine(handle);
    }
}

// ---------------------------------------------------------------------------
// Native unit tests (run with `cargo test` outside of WASM)
// ---------------------------------------------------------------------------

#[cfg(test)]
#[cfg(not(target_arch = "wasm32"))]
mod native_tests {
    use super::*;

    fn intent_json(agent_id: &str) -> String {
        format!(
            r#"{{
                "intent_id": "i1", "agent_id": "{agent_id}", "action_type": "read",
                "data_sensitivity": "public", "reversibility": "reversible",
                "correlation_id": "c1", "created_at_ms": 1000, "expires_at_ms": 61000,
                "context": {{}}, "supersedes": null
            }}"#
        )
    }

    #[test]
    fn test_engine_lifecycle() {
        let handle = create_engine();
        assert_ne!(handle, u32::MAX);
        destroy_engine(handle);
    }

    #[test]
    fn test_unknown_handle_returns_error() {
        let result = authorize(99_999, &intent_json("x"), 1_000);
        assert!(result.contains("error"));
    }

    #[test]
    fn test_authorize_permits_trusted_agent() {
        let handle = create_engine();
        register_agent(handle, "agent-001", "bot", "team");
        sync_trust_score(handle, "agent-001", 650, 1_000);
        let result = authorize(handle, &intent_json("agent-001"), 1_000);
        assert!(result.contains("\"permitted\":true"));
        destroy_engine(handle);
    }

    #[test]
    fn test_authorize_denies_unregistered_agent() {
        let handle = create_engine();
        let result = authorize(handle, &intent_json("ghost"), 1_000);
        assert!(result.contains("INVALID_AGENT"));
        destroy_engine(handle);
    }

    #[test]
    fn test_kill_switch_round_trip() {
        let handle = create_engine();
        assert!(!is_kill_switch_engaged(handle));
        activate_kill_switch(handle, "incident", "all");
        assert!(is_kill_switch_engaged(handle));
        deactivate_kill_switch(handle);
        assert!(!is_kill_switch_engaged(handle));
        destroy_engine(handle);
    }

    #[test]
    fn test_submit_proofs_reports_accepted_count() {
        let handle = create_engine();
        let proof = governor_core::types::Proof {
            h: "h1".to_string(),
            t: 0,
            d: serde_json::json!({}),
            o: governor_core::types::ProofOutcome::Success,
            v: None,
        };
        let batch_sig = governor_core::trust::sign_batch(
            &AgentId::from("agent-001"),
            core::slice::from_ref(&proof),
            Config::default().observer_hmac_secret.as_bytes(),
        )
        .unwrap();
        let proofs = serde_json::to_string(core::slice::from_ref(&proof)).unwrap();
        let result = submit_proofs(handle, "agent-001", &proofs, &batch_sig, 1_000);
        assert!(result.contains("\"accepted\":1"));
        destroy_engine(handle);
    }

    #[test]
    fn test_submit_proofs_rejects_bad_signature() {
        let handle = create_engine();
        let proofs = r#"[{"h":"h1","t":0,"d":{},"o":"success","v":null}]"#;
        let result = submit_proofs(handle, "agent-001", proofs, "bogus", 1_000);
        assert!(result.contains("error"));
        destroy_engine(handle);
    }

    #[test]
    fn test_observer_event_roundtrip() {
        let handle = create_engine();
        let sealed = append_observer_event(handle, "test", "unit_test", "info", "{}", 1_000);
        assert!(!sealed.contains("error"));
        let queried = query_observer_events(handle, "{}");
        assert!(queried.contains("unit_test"));
        destroy_engine(handle);
    }
}

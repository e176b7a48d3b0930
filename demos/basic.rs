// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Governor Labs, Inc.

//! # Basic Authorization Engine Example
//!
//! Demonstrates the full `authorize` pipeline against the in-memory storage
//! backend: registering an agent, raising its trust score with submitted
//! proofs, running a handful of intents through the engine, and inspecting
//! the Observer log the engine appends to along the way.
//!
//! ```bash
//! cargo run --example basic
//! ```

use governor_core::authz::AuthorizationEngine;
use governor_core::config::Config;
use governor_core::ids::{AgentId, CorrelationId, IntentId};
use governor_core::killswitch::KillSwitchScope;
use governor_core::observer::chain::{seal, GENESIS_HASH};
use governor_core::storage::{InMemoryStorage, Storage};
use governor_core::trust::TrustScoringEngine;
use governor_core::types::{
    Agent, ActionType, DataSensitivity, Decision, Intent, IntentContext, Manifest, Proof,
    ProofOutcome, PipelineStage, Reversibility, TrustBand, TrustProfile,
};

fn main() {
    println!("Governor — Basic Example\n");

    // -----------------------------------------------------------------------
    // 1. Construct the engine
    // -----------------------------------------------------------------------
    let storage = InMemoryStorage::new();
    let config = Config::default();

    register_agent(&storage, "agent-finance-001", "invoicing-bot");
    register_agent(&storage, "agent-ops-001", "cluster-ops-bot");

    let engine = AuthorizationEngine::new(storage, config);

    // -----------------------------------------------------------------------
    // 2. Raise trust scores with submitted proofs (trust is earned, never
    //    assigned directly — see DESIGN.md Open Question 2)
    // -----------------------------------------------------------------------
    {
        let trust = TrustScoringEngine::new(engine.storage(), engine.config());
        let finance_proofs: Vec<Proof> = (0..40)
            .map(|i| success_proof(&format!("finance-proof-{i}")))
            .collect();
        let result = trust
            .submit_proofs(&AgentId::from("agent-finance-001"), &finance_proofs, 0)
            .expect("trust write");
        println!(
            "agent-finance-001: {} proofs accepted, score {} -> {}",
            result.accepted, result.score_prev, result.score_new
        );

        let ops_proofs: Vec<Proof> = (0..5)
            .map(|i| success_proof(&format!("ops-proof-{i}")))
            .collect();
        let result = trust
            .submit_proofs(&AgentId::from("agent-ops-001"), &ops_proofs, 0)
            .expect("trust write");
        println!(
            "agent-ops-001:     {} proofs accepted, score {} -> {}\n",
            result.accepted, result.score_prev, result.score_new
        );
    }

    // -----------------------------------------------------------------------
    // 3. Evaluate intents through the sequential pipeline
    // -----------------------------------------------------------------------

    // Intent A — should PERMIT: trusted finance agent, reversible write of
    // internal data.
    let intent_a = build_intent(
        "agent-finance-001",
        ActionType::Write,
        DataSensitivity::Internal,
        Reversibility::Reversible,
        IntentContext::default(),
    );
    print_decision("send_invoice (agent-finance-001)", &engine.authorize(&intent_a, 100));

    // Intent B — should DENY at the trust gate: the ops agent's score is too
    // low to clear the Verified band `delete` requires.
    let intent_b = build_intent(
        "agent-ops-001",
        ActionType::Delete,
        DataSensitivity::Internal,
        Reversibility::Irreversible,
        IntentContext::default(),
    );
    print_decision("delete_cluster (agent-ops-001)", &engine.authorize(&intent_b, 100));

    // Intent C — should DENY on the context ceiling: production handling of
    // PHI requires at least the trusted band, which this read alone wouldn't
    // otherwise demand.
    let mut ctx_phi = IntentContext::default();
    ctx_phi.environment = Some("production".into());
    ctx_phi.handles_phi = true;
    let intent_c = build_intent(
        "agent-ops-001",
        ActionType::Read,
        DataSensitivity::Internal,
        Reversibility::Reversible,
        ctx_phi,
    );
    print_decision("read_patient_record (agent-ops-001, production + PHI)", &engine.authorize(&intent_c, 100));

    // Intent D — should DENY: an unregistered agent has no trust profile at
    // all.
    let intent_d = build_intent(
        "agent-unknown-001",
        ActionType::Read,
        DataSensitivity::Public,
        Reversibility::Reversible,
        IntentContext::default(),
    );
    print_decision("read_dashboard (agent-unknown-001, never registered)", &engine.authorize(&intent_d, 100));

    // -----------------------------------------------------------------------
    // 4. Engage the kill switch and verify it blocks a previously-permitted
    //    agent
    // -----------------------------------------------------------------------
    println!("\nEngaging kill switch scoped to all agents...");
    engine.kill_switch().activate("suspected compromise".into(), KillSwitchScope::All);
    let intent_e = build_intent(
        "agent-finance-001",
        ActionType::Write,
        DataSensitivity::Internal,
        Reversibility::Reversible,
        IntentContext::default(),
    );
    print_decision("send_invoice (kill switch engaged)", &engine.authorize(&intent_e, 100));
    engine.kill_switch().deactivate();
    println!("Kill switch deactivated.\n");

    // -----------------------------------------------------------------------
    // 5. Append a couple of Observer events directly and query them back
    // -----------------------------------------------------------------------
    append_demo_event(engine.storage(), engine.config(), "demo", "agent.registered", 100);
    append_demo_event(engine.storage(), engine.config(), "demo", "trust.raised", 200);

    let events = engine
        .storage()
        .query_observer_events(&governor_core::types::ObserverFilter::default());
    println!("Observer log ({} events):", events.len());
    for event in &events {
        println!(
            "  seq={} type={} hash={}…",
            event.sequence,
            event.event_type,
            &event.hash[..8]
        );
    }

    println!("\nDone.");
}

fn register_agent(storage: &InMemoryStorage, agent_id: &str, name: &str) {
    storage.put_agent(Agent {
        agent_id: AgentId::from(agent_id),
        name: name.into(),
        owner_id: "owner".into(),
        capabilities: vec!["read".into(), "write".into()],
        manifest: Manifest {
            schema_version: 1,
            agent_name: name.into(),
            agent_version: "1.0.0".into(),
            description: String::new(),
            capabilities: Vec::new(),
            constraints: Vec::new(),
            default_autonomy: TrustBand::Established,
        },
        pipeline_stage: PipelineStage::Active,
        specialization: None,
    });
    storage.init_trust_profile(TrustProfile::genesis(AgentId::from(agent_id), 0));
}

fn success_proof(hash: &str) -> Proof {
    Proof {
        h: hash.into(),
        t: 0,
        d: serde_json::json!({}),
        o: ProofOutcome::Success,
        v: None,
    }
}

fn build_intent(
    agent_id: &str,
    action_type: ActionType,
    sensitivity: DataSensitivity,
    reversibility: Reversibility,
    context: IntentContext,
) -> Intent {
    Intent::new(
        IntentId::generate(),
        AgentId::from(agent_id),
        action_type,
        sensitivity,
        reversibility,
        CorrelationId::generate(),
        0,
        60_000,
        context,
    )
    .expect("well-formed intent")
}

fn append_demo_event(storage: &InMemoryStorage, config: &Config, source: &str, event_type: &str, now_ms: u64) {
    let (sequence, previous_hash) = match storage.latest_observer_event() {
        Some(event) => (event.sequence + 1, event.hash),
        None => (1, GENESIS_HASH.to_string()),
    };
    let draft = governor_core::types::ObserverEventDraft {
        timestamp_ms: now_ms,
        source: source.into(),
        event_type: event_type.into(),
        risk_level: governor_core::types::RiskLevel::Info,
        agent_id: None,
        user_id: None,
        data: serde_json::json!({}),
    };
    let event = seal(draft, sequence, &previous_hash, config.observer_hmac_secret.as_bytes())
        .expect("sealing a demo event never fails");
    storage.append_observer_event(event);
}

fn print_decision(label: &str, decision: &Decision) {
    println!(
        "[{}] permitted={} band={} score={} reason={}",
        label,
        decision.permitted,
        decision.trust_band.display_name(),
        decision.trust_score,
        decision.denial_reason.display_name(),
    );
    for line in &decision.reasoning {
        println!("  - {line}");
    }
    if let Some(constraints) = &decision.constraints {
        println!(
            "  constraints: max_cost={:.2} observability={:?} sandboxed={}",
            constraints.max_cost, constraints.observability_tier, constraints.sandboxed
        );
    }
    println!();
}

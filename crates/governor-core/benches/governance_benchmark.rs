// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Governor Labs, Inc.

//! Criterion benchmark suite for the Governor authorization engine.
//!
//! Benchmarks cover the core governance operations:
//!
//! - Authorization predicate lookups (band/action/sensitivity tables)
//! - Full `authorize` pipeline evaluation (permit and deny paths)
//! - Trust scoring (proof batch ingestion + CAS write)
//! - Observer hash-chain append + verify
//! - Matrix routing + concerns evaluation
//!
//! Run with: `cargo bench --bench governance_benchmark`

use criterion::{black_box, criterion_group, criterion_main, BatchSize, Criterion};

use governor_core::authz::predicates::{can_perform, effective_required_band, required_band_for_sensitivity};
use governor_core::authz::AuthorizationEngine;
use governor_core::concerns;
use governor_core::config::Config;
use governor_core::ids::{AgentId, CorrelationId, IntentId};
use governor_core::matrix;
use governor_core::observer::chain::{seal, GENESIS_HASH};
use governor_core::storage::{InMemoryStorage, Storage};
use governor_core::trust::TrustScoringEngine;
use governor_core::types::{
    ActionType, Agent, DataSensitivity, Intent, IntentContext, Manifest, ObserverEventDraft, PipelineStage, Proof,
    ProofOutcome, Reversibility, RiskLevel, TrustBand, TrustProfile,
};

fn register_agent(storage: &InMemoryStorage, agent_id: &str, score: i32) {
    storage.put_agent(Agent {
        agent_id: AgentId::from(agent_id),
        name: agent_id.to_string(),
        owner_id: "owner".into(),
        capabilities: vec!["read".into(), "write".into()],
        manifest: Manifest {
            schema_version: 1,
            agent_name: agent_id.to_string(),
            agent_version: "1.0.0".into(),
            description: String::new(),
            capabilities: Vec::new(),
            constraints: Vec::new(),
            default_autonomy: TrustBand::Established,
        },
        pipeline_stage: PipelineStage::Active,
        specialization: None,
    });
    let mut profile = TrustProfile::genesis(AgentId::from(agent_id), 0);
    profile.score = score;
    profile.adjusted_score = score;
    storage.init_trust_profile(profile);
}

fn build_intent(agent_id: &str, action_type: ActionType, sensitivity: DataSensitivity, reversibility: Reversibility) -> Intent {
    Intent::new(
        IntentId::generate(),
        AgentId::from(agent_id),
        action_type,
        sensitivity,
        reversibility,
        CorrelationId::generate(),
        0,
        60_000,
        IntentContext::default(),
    )
    .expect("well-formed intent")
}

// ---------------------------------------------------------------------------
// Predicate benchmarks
// ---------------------------------------------------------------------------

/// Benchmark the table-driven predicates that back routing decisions:
/// `canPerform`, `canAccess`, and `requiredBandFor` (spec.md §4.1).
fn predicate_benchmark(criterion: &mut Criterion) {
    let mut group = criterion.benchmark_group("predicates");

    group.bench_function("can_perform", |bencher| {
        bencher.iter(|| {
            let result = can_perform(
                black_box(TrustBand::Trusted),
                black_box(ActionType::Write),
                black_box(DataSensitivity::Internal),
                black_box(Reversibility::Reversible),
            );
            black_box(result);
        });
    });

    group.bench_function("required_band_for_sensitivity", |bencher| {
        bencher.iter(|| {
            let result = required_band_for_sensitivity(black_box(DataSensitivity::Confidential));
            black_box(result);
        });
    });

    group.bench_function("effective_required_band", |bencher| {
        bencher.iter(|| {
            let result = effective_required_band(
                black_box(ActionType::Delete),
                black_box(DataSensitivity::Restricted),
                black_box(Reversibility::Irreversible),
            );
            black_box(result);
        });
    });

    group.finish();
}

// ---------------------------------------------------------------------------
// Full authorize() benchmark
// ---------------------------------------------------------------------------

/// Benchmark the complete synchronous `authorize` pipeline (spec.md §4.1
/// steps 1-9): expiry, profile fetch, hooks, band/scope/context checks,
/// constraint derivation.
fn authorize_benchmark(criterion: &mut Criterion) {
    let mut group = criterion.benchmark_group("authorize");

    let storage = InMemoryStorage::new();
    register_agent(&storage, "agent-certified", 950);
    register_agent(&storage, "agent-provisional", 150);
    let engine = AuthorizationEngine::new(storage, Config::default());

    let permit_intent = build_intent("agent-certified", ActionType::Read, DataSensitivity::Public, Reversibility::Reversible);
    let deny_trust_intent =
        build_intent("agent-provisional", ActionType::Delete, DataSensitivity::Confidential, Reversibility::Irreversible);
    let deny_unknown_intent =
        build_intent("agent-never-registered", ActionType::Read, DataSensitivity::Public, Reversibility::Reversible);

    group.bench_function("permit_path", |bencher| {
        bencher.iter(|| {
            let decision = engine.authorize(black_box(&permit_intent), black_box(100));
            black_box(decision);
        });
    });

    group.bench_function("deny_insufficient_trust", |bencher| {
        bencher.iter(|| {
            let decision = engine.authorize(black_box(&deny_trust_intent), black_box(100));
            black_box(decision);
        });
    });

    group.bench_function("deny_missing_profile", |bencher| {
        bencher.iter(|| {
            let decision = engine.authorize(black_box(&deny_unknown_intent), black_box(100));
            black_box(decision);
        });
    });

    group.finish();
}

// ---------------------------------------------------------------------------
// Trust scoring benchmark
// ---------------------------------------------------------------------------

/// Benchmark proof-batch ingestion (spec.md §4.4c): delta computation,
/// duplicate-hash rejection, and the clamped CAS write.
fn trust_scoring_benchmark(criterion: &mut Criterion) {
    let mut group = criterion.benchmark_group("trust_scoring");

    group.bench_function("submit_batch_of_5", |bencher| {
        bencher.iter_batched(
            || {
                let storage = InMemoryStorage::new();
                register_agent(&storage, "agent-scored", 500);
                let proofs: Vec<Proof> = (0..5)
                    .map(|i| Proof { h: format!("h{i}"), t: 0, d: serde_json::json!({}), o: ProofOutcome::Success, v: None })
                    .collect();
                (storage, proofs)
            },
            |(storage, proofs)| {
                let config = Config::default();
                let scoring = TrustScoringEngine::new(&storage, &config);
                let agent_id = AgentId::from("agent-scored");
                let batch_sig =
                    governor_core::trust::sign_batch(&agent_id, &proofs, config.observer_hmac_secret.as_bytes())
                        .unwrap();
                let result =
                    scoring.submit_proofs(black_box(&agent_id), black_box(&proofs), black_box(&batch_sig), black_box(0));
                black_box(result)
            },
            BatchSize::SmallInput,
        );
    });

    group.bench_function("duplicate_rejection", |bencher| {
        let storage = InMemoryStorage::new();
        register_agent(&storage, "agent-dup", 500);
        let config = Config::default();
        let scoring = TrustScoringEngine::new(&storage, &config);
        let agent_id = AgentId::from("agent-dup");
        let seen = Proof { h: "seen".into(), t: 0, d: serde_json::json!({}), o: ProofOutcome::Success, v: None };
        let seen_sig = governor_core::trust::sign_batch(
            &agent_id,
            core::slice::from_ref(&seen),
            config.observer_hmac_secret.as_bytes(),
        )
        .unwrap();
        scoring.submit_proofs(&agent_id, core::slice::from_ref(&seen), &seen_sig, 0).unwrap();

        bencher.iter(|| {
            let result = scoring.submit_proofs(
                black_box(&agent_id),
                black_box(core::slice::from_ref(&seen)),
                black_box(&seen_sig),
                black_box(1),
            );
            black_box(result);
        });
    });

    group.finish();
}

// ---------------------------------------------------------------------------
// Observer hash-chain benchmark
// ---------------------------------------------------------------------------

/// Benchmark the append-path primitive: canonicalize, SHA-256 hash,
/// HMAC-SHA256 signature (spec.md §4.4a).
fn observer_chain_benchmark(criterion: &mut Criterion) {
    let mut group = criterion.benchmark_group("observer_chain");

    group.bench_function("seal_genesis", |bencher| {
        bencher.iter(|| {
            let draft = ObserverEventDraft {
                timestamp_ms: 1_700_000_000_000,
                source: "bench".into(),
                event_type: "agent_action".into(),
                risk_level: RiskLevel::Info,
                agent_id: Some(AgentId::from("agent-x")),
                user_id: None,
                data: serde_json::json!({"k": "v"}),
            };
            let event = seal(black_box(draft), black_box(1), black_box(GENESIS_HASH), black_box(b"bench-secret"));
            black_box(event)
        });
    });

    group.bench_function("seal_then_verify_chain", |bencher| {
        bencher.iter(|| {
            let storage = InMemoryStorage::new();
            for index in 1..=20u64 {
                let previous_hash = storage
                    .latest_observer_event()
                    .map(|e| e.hash)
                    .unwrap_or_else(|| GENESIS_HASH.to_string());
                let draft = ObserverEventDraft {
                    timestamp_ms: 1_700_000_000_000 + index,
                    source: "bench".into(),
                    event_type: "agent_action".into(),
                    risk_level: RiskLevel::Info,
                    agent_id: None,
                    user_id: None,
                    data: serde_json::json!({}),
                };
                let event = seal(draft, index, &previous_hash, b"bench-secret").unwrap();
                storage.append_observer_event(event);
            }
            black_box(storage.query_observer_events(&governor_core::types::ObserverFilter::default()))
        });
    });

    group.finish();
}

// ---------------------------------------------------------------------------
// Matrix routing + concerns benchmark
// ---------------------------------------------------------------------------

/// Benchmark the 6x4 risk x trust matrix lookup and the lexicographic
/// concerns evaluator (spec.md §4.2, §4.2b).
fn routing_and_concerns_benchmark(criterion: &mut Criterion) {
    let mut group = criterion.benchmark_group("routing_and_concerns");

    group.bench_function("matrix_route", |bencher| {
        bencher.iter(|| {
            let result = matrix::route(black_box(TrustBand::Trusted), black_box(RiskLevel::High));
            black_box(result);
        });
    });

    let safe_intent = build_intent("agent-x", ActionType::Read, DataSensitivity::Public, Reversibility::Reversible);
    let unsafe_intent =
        build_intent("agent-x", ActionType::Delete, DataSensitivity::Restricted, Reversibility::Irreversible);

    group.bench_function("evaluate_concerns_all_pass", |bencher| {
        bencher.iter(|| {
            let result = concerns::evaluate(black_box(&safe_intent));
            black_box(result);
        });
    });

    group.bench_function("evaluate_concerns_safety_blocks", |bencher| {
        bencher.iter(|| {
            let result = concerns::evaluate(black_box(&unsafe_intent));
            black_box(result);
        });
    });

    group.finish();
}

// ---------------------------------------------------------------------------
// Criterion harness
// ---------------------------------------------------------------------------

criterion_group!(
    benches,
    predicate_benchmark,
    authorize_benchmark,
    trust_scoring_benchmark,
    observer_chain_benchmark,
    routing_and_concerns_benchmark,
);

criterion_main!(benches);

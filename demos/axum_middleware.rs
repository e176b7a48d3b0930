// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Governor Labs, Inc.

//! # Axum Middleware Example
//!
//! Demonstrates how to integrate [`AuthorizationEngine`] into an Axum HTTP
//! server as a request-level middleware layer.
//!
//! Every inbound request carries `X-Agent-Id`, `X-Action-Type`, and
//! `X-Sensitivity` headers. The middleware builds an [`Intent`] from them,
//! runs it through `authorize`, and either permits the request downstream
//! or rejects it with `403 Forbidden` and the `Decision`'s denial reason.
//!
//! ## Running
//!
//! Add Axum and Tokio to a downstream crate's `Cargo.toml`:
//!
//! ```toml
//! axum         = "0.7"
//! tokio        = { version = "1", features = ["full"] }
//! tower        = "0.4"
//! tower-http   = { version = "0.5", features = ["trace"] }
//! governor-core = { path = "../crates/governor-core" }
//! governor-std  = { path = "../crates/governor-std" }
//! ```
//!
//! Then run:
//!
//! ```bash
//! cargo run --example axum_middleware
//! ```
//!
//! Test with:
//!
//! ```bash
//! # Permitted — agent-api-001 is certified and the action is a reversible
//! # read of public data.
//! curl -H "X-Agent-Id: agent-api-001" \
//!      -H "X-Action-Type: read" \
//!      -H "X-Sensitivity: public" \
//!      http://localhost:3000/data
//!
//! # Denied — no trust profile for this agent at all.
//! curl -H "X-Agent-Id: unknown-agent" \
//!      -H "X-Action-Type: read" \
//!      -H "X-Sensitivity: public" \
//!      http://localhost:3000/data
//! ```

// NOTE: This example requires `axum` and `tokio` as dev-dependencies in a
// crate that depends on governor-core. The example is intentionally
// written as a self-contained illustration; the imports below are
// annotated with the crates they originate from.

use governor_core::authz::AuthorizationEngine;
use governor_core::config::Config;
use governor_core::ids::{AgentId, CorrelationId, IntentId};
use governor_core::storage::{InMemoryStorage, Storage};
use governor_core::types::{
    ActionType, Agent, DataSensitivity, Decision, Intent, IntentContext, Manifest, PipelineStage, Reversibility,
    TrustBand, TrustProfile,
};
use std::sync::Arc;

// ---------------------------------------------------------------------------
// Shared engine wrapper
// ---------------------------------------------------------------------------

/// Thread-safe engine handle shared across Axum handlers. `authorize` takes
/// `&self` and `InMemoryStorage` is internally lock-protected, so no
/// external `Mutex` is needed — only the `Arc` to share ownership.
///
/// In production you would replace `InMemoryStorage` with a storage
/// implementation backed by your database or `governor_std::FileStorage`.
type SharedEngine = Arc<AuthorizationEngine<InMemoryStorage>>;

/// Construct a pre-seeded authorization engine for the API server.
fn build_engine() -> AuthorizationEngine<InMemoryStorage> {
    let storage = InMemoryStorage::new();
    let config = Config::default();

    // Trust is earned through submitted execution proofs, never assigned
    // directly (see DESIGN.md Open Question 2) — seeding here stands in
    // for a prior history of successful proof batches.
    register_agent(&storage, "agent-api-001", 950);
    register_agent(&storage, "agent-api-002", 650);

    AuthorizationEngine::new(storage, config)
}

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

// ---------------------------------------------------------------------------
// Middleware logic (framework-agnostic helper)
// ---------------------------------------------------------------------------

/// Governance check result returned by the middleware gate.
#[derive(Debug)]
pub struct GateResult {
    /// Whether the request is permitted to proceed.
    pub permitted: bool,
    /// Human-readable explanation for the `403` body or log line.
    pub reason: String,
    /// The HTTP status code to use when denying.
    pub status: u16,
}

/// Evaluate whether `agent_id` may perform `action_type` against data at
/// `sensitivity`. This function is the framework-agnostic core of the
/// middleware — call it from an Axum `middleware::from_fn` closure, a Tower
/// layer, or any other request interceptor.
pub fn governance_gate(
    engine: &AuthorizationEngine<InMemoryStorage>,
    agent_id: &str,
    action_type: ActionType,
    sensitivity: DataSensitivity,
    now_ms: u64,
) -> GateResult {
    let intent = Intent::new(
        IntentId::generate(),
        AgentId::from(agent_id),
        action_type,
        sensitivity,
        Reversibility::Reversible,
        CorrelationId::generate(),
        now_ms,
        now_ms + 60_000,
        IntentContext::default(),
    )
    .expect("well-formed intent");

    let decision = engine.authorize(&intent, now_ms);
    to_gate_result(&decision)
}

fn to_gate_result(decision: &Decision) -> GateResult {
    GateResult {
        permitted: decision.permitted,
        reason: decision.reasoning.join("; "),
        status: if decision.permitted { 200 } else { 403 },
    }
}

// ---------------------------------------------------------------------------
// Pseudo-main — illustrates how the middleware would be wired
// ---------------------------------------------------------------------------

fn main() {
    // Build the shared engine once at server startup.
    let engine: SharedEngine = Arc::new(build_engine());

    // ---------------------------------------------------------------------------
    // Illustrate the middleware logic without pulling in the full Axum stack so
    // this example compiles in the workspace without extra dependencies.
    // ---------------------------------------------------------------------------

    println!("Governor — Axum Middleware Example\n");
    println!("Simulating three incoming HTTP requests:\n");

    let requests = vec![
        ("agent-api-001", "GET /data", ActionType::Read, DataSensitivity::Public),
        ("agent-api-002", "POST /mutate", ActionType::Write, DataSensitivity::Internal),
        ("unknown-agent", "DELETE /nuke", ActionType::Delete, DataSensitivity::Restricted),
    ];

    for (agent_id, action, action_type, sensitivity) in requests {
        let result = governance_gate(&engine, agent_id, action_type, sensitivity, 100);

        if result.permitted {
            println!("  PERMIT {} — {} ({})", agent_id, action, result.reason);
        } else {
            println!("  DENY   {} — {} → HTTP {} ({})", agent_id, action, result.status, result.reason);
        }
    }

    println!("\nAxum wiring (pseudo-code):");
    println!(
        r#"
  // In your actual Axum server:

  let app = Router::new()
      .route("/data",   get(data_handler))
      .route("/mutate", post(mutate_handler))
      .layer(middleware::from_fn_with_state(
          engine.clone(),
          governance_middleware,
      ));

  async fn governance_middleware(
      State(engine): State<SharedEngine>,
      headers: HeaderMap,
      request: Request,
      next: Next,
  ) -> Response {{
      let agent_id = headers
          .get("x-agent-id")
          .and_then(|v| v.to_str().ok())
          .unwrap_or("unknown");

      let result = governance_gate(
          &engine,
          agent_id,
          ActionType::Read,
          DataSensitivity::Public,
          now_ms(),
      );

      if result.permitted {{
          next.run(request).await
      }} else {{
          (StatusCode::FORBIDDEN, result.reason).into_response()
      }}
  }}
"#
    );

    println!("Done.");
}

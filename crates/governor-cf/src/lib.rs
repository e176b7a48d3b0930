// SPDX-License-Identifier: BSL-1.1
// Copyright (c) 2026 Governor Labs, Inc.

//! # governor-cf
//!
//! Cloudflare Workers governance middleware for Governor.
//!
//! This crate provides [`CfGovernanceMiddleware`], a thin integration layer
//! that evaluates the Governor authorization pipeline against incoming HTTP
//! requests in a Cloudflare Workers environment. It uses Cloudflare KV to
//! look up per-agent trust scores and enforces the same eight-step
//! authorization pipeline `governor-core` runs anywhere else, before
//! proxying permitted requests to an origin server.
//!
//! ## Architecture
//!
//! ```text
//! Incoming Request
//!     |
//!     v
//! [Extract agent ID from X-Agent-Id header]
//!     |
//!     v
//! [Look up trust score from Cloudflare KV]
//!     |
//!     v
//! [Build an Intent, run AuthorizationEngine::authorize]
//!     |
//!     +--- Denied  --> 403 JSON response
//!     |
//!     +--- Allowed --> Proxy to origin
//! ```
//!
//! ## Configuration
//!
//! The middleware is configured via [`CfConfig`]:
//!
//! - `trust_kv_binding` -- name of the KV namespace binding in `wrangler.toml`
//! - `default_trust_score` -- trust score assigned to agents missing from KV
//!
//! Everything else — which trust band an action requires, rate limits,
//! routing, concerns — comes from the wrapped [`AuthorizationEngine`] and its
//! [`Config`], exactly as it would on any other deployment target.
//!
//! ## Fire Line
//!
//! Trust scores stored in KV are set by whatever out-of-band process owns
//! them (manual operator entry, a batch job, the trust scoring engine
//! running elsewhere). This middleware only reads them; it never writes
//! proofs back to KV.

use governor_core::authz::AuthorizationEngine;
use governor_core::config::Config;
use governor_core::ids::{AgentId, CorrelationId, IntentId};
use governor_core::storage::{InMemoryStorage, Storage};
use governor_core::types::{
    ActionType, Agent, DataSensitivity, Intent, IntentContext, Manifest, PipelineStage,
    Reversibility, TrustBand, TrustProfile,
};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Configuration for the Cloudflare Workers governance middleware.
///
/// # Example (wrangler.toml context)
///
/// ```toml
/// [vars]
/// GOVERNOR_TRUST_KV_BINDING = "TRUST_KV"
/// GOVERNOR_DEFAULT_TRUST_SCORE = 0
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CfConfig {
    /// Name of the Cloudflare KV namespace binding that stores agent trust
    /// score mappings. Each KV key is an agent ID; each value is a decimal
    /// `u16` score in `[0, 1000]`.
    pub trust_kv_binding: String,

    /// Trust score assigned to agents not found in KV. Defaults to `0`
    /// (`TrustBand::Untrusted`).
    #[serde(default)]
    pub default_trust_score: u16,
}

impl Default for CfConfig {
    fn default() -> Self {
        Self {
            trust_kv_binding: "TRUST_KV".to_string(),
            default_trust_score: 0,
        }
    }
}

// ---------------------------------------------------------------------------
// Middleware
// ---------------------------------------------------------------------------

/// Governance middleware for Cloudflare Workers.
///
/// Wraps an [`AuthorizationEngine`] over [`InMemoryStorage`] and evaluates
/// incoming requests against it. Each Worker invocation gets a fresh
/// middleware instance — Workers isolates are short-lived, so there is no
/// benefit to carrying in-memory state across requests; durable state
/// (trust scores, audit history) lives in KV / Durable Objects instead.
///
/// # Usage (without the `cf-worker` feature, for testing)
///
/// ```rust
/// use governor_cf::{CfGovernanceMiddleware, CfConfig, MiddlewareDecision};
/// use governor_core::types::{ActionType, DataSensitivity, Reversibility};
///
/// let config = CfConfig::default();
/// let middleware = CfGovernanceMiddleware::new(config);
/// middleware.register_agent("agent-001");
///
/// let decision = middleware.evaluate_agent(
///     "agent-001",
///     650,
///     ActionType::Read,
///     DataSensitivity::Public,
///     Reversibility::Reversible,
///     1_000,
/// );
/// assert!(matches!(decision, MiddlewareDecision::Allow { .. }));
/// ```
pub struct CfGovernanceMiddleware {
    config: CfConfig,
    engine: AuthorizationEngine<InMemoryStorage>,
}

/// The result of middleware evaluation.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "outcome")]
pub enum MiddlewareDecision {
    /// The request is permitted. The caller should proxy to the origin.
    Allow {
        /// The agent's effective trust band at decision time.
        trust_band: TrustBand,
        /// Human-readable reasoning trail.
        reasoning: Vec<String>,
    },
    /// The request is denied.
    Deny {
        /// HTTP status code to return (always 403).
        status: u16,
        /// Machine-readable denial code.
        code: String,
        /// Human-readable reasoning trail.
        reasoning: Vec<String>,
    },
    /// The request is missing the required agent identification header.
    MissingAgent {
        /// HTTP status code to return (always 401).
        status: u16,
        reason: String,
    },
}

impl CfGovernanceMiddleware {
    /// Create a new middleware instance with the given configuration and
    /// the engine's default [`Config`].
    pub fn new(config: CfConfig) -> Self {
        Self::with_engine_config(config, Config::default())
    }

    /// Create a new middleware instance, overriding the engine's
    /// [`Config`] (rate limits, kill-switch boot state, etc.) as well.
    pub fn with_engine_config(config: CfConfig, engine_config: Config) -> Self {
        let storage = InMemoryStorage::new();
        let engine = AuthorizationEngine::new(storage, engine_config);
        Self { config, engine }
    }

    /// Register a bare-minimum agent record so it can pass authorization.
    /// Real deployments populate this from a control-plane sync rather than
    /// on the request path; tests and the `cf-worker` handler below use it
    /// to auto-provision agents seen for the first time.
    pub fn register_agent(&self, agent_id: &str) {
        if self.engine.storage().get_agent(&AgentId::from(agent_id)).is_some() {
            return;
        }
        self.engine.storage().put_agent(Agent {
            agent_id: AgentId::from(agent_id),
            name: agent_id.to_string(),
            owner_id: "cf-worker".to_string(),
            capabilities: Vec::new(),
            manifest: Manifest {
                schema_version: 1,
                agent_name: agent_id.to_string(),
                agent_version: "0.0.0".to_string(),
                description: String::new(),
                capabilities: Vec::new(),
                constraints: Vec::new(),
                default_autonomy: TrustBand::Untrusted,
            },
            pipeline_stage: PipelineStage::Active,
            specialization: None,
        });
    }

    /// Overwrite the agent's trust score from a freshly-read KV value,
    /// resolving CAS conflicts by re-reading the current version (KV reads
    /// race at most with themselves within a single Worker invocation).
    fn sync_trust_score(&self, agent_id: &AgentId, score: u16, now_ms: u64) {
        let storage = self.engine.storage();
        let profile = storage.get_trust_profile(agent_id).unwrap_or_else(|| {
            let fresh = TrustProfile::genesis(agent_id.clone(), now_ms);
            storage.init_trust_profile(fresh.clone());
            fresh
        });
        let _ = storage.cas_trust_score(agent_id, profile.version, score, score, now_ms);
    }

    /// Evaluate an agent's request against the governance policy.
    ///
    /// This is the core logic, usable both in native tests and within the
    /// Cloudflare Workers `cf-worker` feature path.
    ///
    /// # Arguments
    ///
    /// * `agent_id` -- stable agent identifier extracted from the request
    /// * `trust_score` -- the agent's trust score as read from KV
    /// * `action_type` / `data_sensitivity` / `reversibility` -- the
    ///   shape of the action this request represents
    /// * `now_ms` -- caller-supplied clock reading
    pub fn evaluate_agent(
        &self,
        agent_id: &str,
        trust_score: u16,
        action_type: ActionType,
        data_sensitivity: DataSensitivity,
        reversibility: Reversibility,
        now_ms: u64,
    ) -> MiddlewareDecision {
        self.register_agent(agent_id);
        let agent_id = AgentId::from(agent_id);
        self.sync_trust_score(&agent_id, trust_score, now_ms);

        let intent = match Intent::new(
            IntentId::generate(),
            agent_id,
            action_type,
            data_sensitivity,
            reversibility,
            CorrelationId::generate(),
            now_ms,
            now_ms + 60_000,
            IntentContext::default(),
        ) {
            Ok(intent) => intent,
            Err(_) => {
                return MiddlewareDecision::Deny {
                    status: 403,
                    code: "INVALID_INTENT".to_string(),
                    reasoning: vec!["unable to construct a valid intent for this request".to_string()],
                };
            }
        };

        let decision = self.engine.authorize(&intent, now_ms);

        if decision.permitted {
            MiddlewareDecision::Allow {
                trust_band: decision.trust_band,
                reasoning: decision.reasoning,
            }
        } else {
            MiddlewareDecision::Deny {
                status: 403,
                code: decision.denial_reason.display_name().to_string(),
                reasoning: decision.reasoning,
            }
        }
    }

    /// Access the current Cloudflare-facing configuration.
    pub fn config(&self) -> &CfConfig {
        &self.config
    }

    /// Access the wrapped authorization engine, e.g. to engage the kill
    /// switch from an admin endpoint.
    pub fn engine(&self) -> &AuthorizationEngine<InMemoryStorage> {
        &self.engine
    }
}

// ---------------------------------------------------------------------------
// Cloudflare Workers integration (behind feature flag)
// ---------------------------------------------------------------------------

/// Map an HTTP method and path to the `(ActionType, DataSensitivity,
/// Reversibility)` triple used for authorization. This is a deliberately
/// coarse default; real deployments should replace it with a route table
/// matching their own API surface.
#[cfg(feature = "cf-worker")]
fn classify_request(method: &str, path: &str) -> (ActionType, DataSensitivity, Reversibility) {
    let sensitivity = if path.starts_with("/admin") {
        DataSensitivity::Restricted
    } else if path.starts_with("/internal") {
        DataSensitivity::Confidential
    } else {
        DataSensitivity::Public
    };
    match method {
        "GET" | "HEAD" => (ActionType::Read, sensitivity, Reversibility::Reversible),
        "DELETE" => (ActionType::Delete, sensitivity, Reversibility::Irreversible),
        "PUT" | "PATCH" => (ActionType::Write, sensitivity, Reversibility::Partially),
        _ => (ActionType::Write, sensitivity, Reversibility::Reversible),
    }
}

/// Handle an incoming Cloudflare Workers request through the governance
/// middleware.
///
/// This function is only available when the `cf-worker` feature is enabled.
///
/// # Protocol
///
/// 1. Extract `X-Agent-Id` header from the request.
/// 2. Look up the agent's trust score from the configured KV namespace.
/// 3. Build an `Intent` from the request method/path and run `authorize`.
/// 4. Return `403` JSON on deny, or proxy to origin on allow.
///
/// # Errors
///
/// Returns a `worker::Error` if KV access fails or the response cannot be
/// constructed.
#[cfg(feature = "cf-worker")]
pub async fn handle_request(
    req: worker::Request,
    env: worker::Env,
    config: &CfConfig,
) -> worker::Result<worker::Response> {
    // Step 1: Extract agent ID from the request header.
    let agent_id = match req.headers().get("X-Agent-Id")? {
        Some(id) => id,
        None => {
            let body = serde_json::json!({
                "outcome": "missing_agent",
                "status": 401,
                "reason": "Missing X-Agent-Id header"
            });
            return worker::Response::from_json(&body).map(|resp| resp.with_status(401));
        }
    };

    // Step 2: Look up trust score from Cloudflare KV.
    let kv = env.kv(&config.trust_kv_binding)?;
    let trust_score: u16 = match kv.get(&agent_id).text().await? {
        Some(value) => value.parse::<u16>().unwrap_or(config.default_trust_score),
        None => config.default_trust_score,
    };

    // Step 3: Build the intent and evaluate governance. `Date::now()` on the
    // Workers runtime returns epoch milliseconds directly.
    let middleware = CfGovernanceMiddleware::new(config.clone());
    let now_ms = worker::Date::now().as_millis();
    let (action_type, data_sensitivity, reversibility) =
        classify_request(req.method().to_string().as_str(), &req.path());
    let decision = middleware.evaluate_agent(
        &agent_id,
        trust_score,
        action_type,
        data_sensitivity,
        reversibility,
        now_ms,
    );

    // Step 4: Return result.
    match decision {
        MiddlewareDecision::Allow { .. } => {
            // In a real deployment, this would proxy to the origin using
            // `Fetch::new_with_request`. For the middleware pattern, we
            // return a 200 with the decision body.
            worker::Response::from_json(&decision)
        }
        MiddlewareDecision::Deny { status, .. } => {
            worker::Response::from_json(&decision).map(|resp| resp.with_status(status))
        }
        MiddlewareDecision::MissingAgent { status, .. } => {
            worker::Response::from_json(&decision).map(|resp| resp.with_status(status))
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

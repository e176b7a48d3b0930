// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Governor Labs, Inc.

//! Shared data types used across all governance sub-systems.
//!
//! All types implement [`Clone`], [`Debug`], [`serde::Serialize`], and
//! [`serde::Deserialize`] so they can be serialised to JSON, stored, and
//! transmitted across WASM boundaries without additional conversion steps —
//! the same contract the teacher's `types.rs` established for its four
//! protocol structs, extended here to the full intent/decision/council/
//! observer model.

use alloc::collections::BTreeMap;
use alloc::string::String;
use alloc::vec::Vec;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::ids::{AgentId, AnomalyId, ApiKeyId, CorrelationId, DecisionId, IntentId, ReviewId};

// ---------------------------------------------------------------------------
// Trust
// ---------------------------------------------------------------------------

/// Six-level graduated trust hierarchy used for routing and authorization.
///
/// Mirrors the teacher's `TrustLevel` shape exactly: `#[repr(u8)]`
/// discriminants in ascending order of permission, a `display_name()`, and
/// a `from_u8()` constructor. This is the **router view** canonical mapping
/// (see `DESIGN.md` Open Question 1) — score thresholds
/// `{0, 200, 400, 600, 800, 900}`.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum TrustBand {
    Untrusted = 0,
    Provisional = 1,
    Established = 2,
    Trusted = 3,
    Verified = 4,
    Certified = 5,
}

impl TrustBand {
    pub fn display_name(self) -> &'static str {
        match self {
            TrustBand::Untrusted => "untrusted",
            TrustBand::Provisional => "provisional",
            TrustBand::Established => "established",
            TrustBand::Trusted => "trusted",
            TrustBand::Verified => "verified",
            TrustBand::Certified => "certified",
        }
    }

    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(TrustBand::Untrusted),
            1 => Some(TrustBand::Provisional),
            2 => Some(TrustBand::Established),
            3 => Some(TrustBand::Trusted),
            4 => Some(TrustBand::Verified),
            5 => Some(TrustBand::Certified),
            _ => None,
        }
    }

    /// Router-view band for a raw score in `[0, 1000]`.
    pub fn from_score(score: u16) -> Self {
        match score {
            0..=199 => TrustBand::Untrusted,
            200..=399 => TrustBand::Provisional,
            400..=599 => TrustBand::Established,
            600..=799 => TrustBand::Trusted,
            800..=899 => TrustBand::Verified,
            _ => TrustBand::Certified,
        }
    }

    /// Ingestion-view band for a raw score in `[0, 1000]` — used only by the
    /// trust scoring engine when re-deriving a tier after a batch, per
    /// spec.md §4.4c's distinct threshold set `{0,100,300,500,700,900}`.
    pub fn from_score_ingestion(score: u16) -> Self {
        match score {
            0..=99 => TrustBand::Untrusted,
            100..=299 => TrustBand::Provisional,
            300..=499 => TrustBand::Established,
            500..=699 => TrustBand::Trusted,
            700..=899 => TrustBand::Verified,
            _ => TrustBand::Certified,
        }
    }

    /// One step up the hierarchy, clamped at [`TrustBand::Certified`].
    pub fn bump(self) -> Self {
        TrustBand::from_u8((self as u8 + 1).min(TrustBand::Certified as u8)).unwrap()
    }
}

/// Per-agent trust state derived from Observer events.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrustProfile {
    pub agent_id: AgentId,
    /// Raw score in `[0, 1000]`.
    pub score: u16,
    /// Score after short-term penalties/boosts (same scale).
    pub adjusted_score: u16,
    /// Count of violations recorded in the last 24h.
    pub recent_violations: u32,
    /// CAS version counter; bumped on every successful write.
    pub version: u64,
    pub last_update_ms: u64,
}

impl TrustProfile {
    pub fn band(&self) -> TrustBand {
        TrustBand::from_score(self.score)
    }

    pub fn genesis(agent_id: AgentId, now_ms: u64) -> Self {
        Self {
            agent_id,
            score: 0,
            adjusted_score: 0,
            recent_violations: 0,
            version: 0,
            last_update_ms: now_ms,
        }
    }
}

// ---------------------------------------------------------------------------
// Agent / manifest
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineStage {
    Draft,
    Training,
    Exam,
    Shadow,
    Active,
    Suspended,
    Retired,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Agent {
    pub agent_id: AgentId,
    pub name: String,
    pub owner_id: String,
    pub capabilities: Vec<String>,
    pub manifest: Manifest,
    pub pipeline_stage: PipelineStage,
    /// Kill-switch `specialization:<name>` scope match key; `None` never
    /// matches a specialization-scoped activation.
    pub specialization: Option<String>,
}

/// Declarative BASIS manifest, frozen at registration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Manifest {
    pub schema_version: u32,
    pub agent_name: String,
    pub agent_version: String,
    pub description: String,
    pub capabilities: Vec<ManifestCapability>,
    pub constraints: Vec<ManifestConstraint>,
    pub default_autonomy: TrustBand,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ManifestCapability {
    pub code: String,
    pub level: u8,
    pub scope: Option<String>,
    pub conditions: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConstraintKind {
    Resource,
    Time,
    Scope,
    Rate,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConstraintAction {
    Allow,
    Deny,
    Audit,
    Gate,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ManifestConstraint {
    pub kind: ConstraintKind,
    pub rule: String,
    pub action: ConstraintAction,
}

// ---------------------------------------------------------------------------
// Intent
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionType {
    Read,
    Write,
    Delete,
    Execute,
    Communicate,
    Transfer,
}

/// Ordered `Public < Internal < Confidential < Restricted` — the Open
/// Question tie-break rule in spec.md §9 depends on this `Ord` impl.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataSensitivity {
    Public,
    Internal,
    Confidential,
    Restricted,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Reversibility {
    Reversible,
    Partially,
    Irreversible,
}

/// Open map of well-known context keys plus caller-supplied extras.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IntentContext {
    pub environment: Option<String>,
    pub handles_pii: bool,
    pub handles_phi: bool,
    pub estimated_cost: Option<f64>,
    pub risk_level: Option<RiskLevel>,
    #[serde(default)]
    pub extra: BTreeMap<String, Value>,
}

/// Frozen, content-addressable description of a proposed action.
///
/// Once constructed an `Intent` is immutable — there is no mutator method.
/// A policy change produces a *new* `Intent` with a new id; see spec.md §9
/// "Immutable intent + mutable profile".
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Intent {
    pub intent_id: IntentId,
    pub agent_id: AgentId,
    pub action_type: ActionType,
    pub data_sensitivity: DataSensitivity,
    pub reversibility: Reversibility,
    pub correlation_id: CorrelationId,
    pub created_at_ms: u64,
    pub expires_at_ms: u64,
    pub context: IntentContext,
    /// Points at the intent this one supersedes, if any (spec.md §9).
    pub supersedes: Option<IntentId>,
}

impl Intent {
    /// Construct an `Intent`, enforcing `expires_at_ms > created_at_ms`.
    pub fn new(
        intent_id: IntentId,
        agent_id: AgentId,
        action_type: ActionType,
        data_sensitivity: DataSensitivity,
        reversibility: Reversibility,
        correlation_id: CorrelationId,
        created_at_ms: u64,
        expires_at_ms: u64,
        context: IntentContext,
    ) -> Result<Self, crate::errors::GovernanceError> {
        if expires_at_ms <= created_at_ms {
            return Err(crate::errors::GovernanceError::SystemError {
                reason: "expires_at_ms must be greater than created_at_ms".into(),
            });
        }
        Ok(Self {
            intent_id,
            agent_id,
            action_type,
            data_sensitivity,
            reversibility,
            correlation_id,
            created_at_ms,
            expires_at_ms,
            context,
            supersedes: None,
        })
    }

    pub fn is_expired(&self, now_ms: u64) -> bool {
        self.expires_at_ms < now_ms
    }
}

// ---------------------------------------------------------------------------
// Decision / constraints
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DenialReason {
    None,
    InsufficientTrust,
    PolicyViolation,
    ResourceRestricted,
    DataSensitivityExceeded,
    RateLimitExceeded,
    ContextMismatch,
    ExpiredIntent,
    DuplicateProof,
    InvalidManifest,
    InvalidAgent,
    InvalidSignature,
    SystemError,
}

impl DenialReason {
    pub fn display_name(self) -> &'static str {
        match self {
            DenialReason::None => "none",
            DenialReason::InsufficientTrust => "INSUFFICIENT_TRUST",
            DenialReason::PolicyViolation => "POLICY_VIOLATION",
            DenialReason::ResourceRestricted => "RESOURCE_RESTRICTED",
            DenialReason::DataSensitivityExceeded => "DATA_SENSITIVITY_EXCEEDED",
            DenialReason::RateLimitExceeded => "RATE_LIMIT_EXCEEDED",
            DenialReason::ContextMismatch => "CONTEXT_MISMATCH",
            DenialReason::ExpiredIntent => "EXPIRED_INTENT",
            DenialReason::DuplicateProof => "DUPLICATE_PROOF",
            DenialReason::InvalidManifest => "INVALID_MANIFEST",
            DenialReason::InvalidAgent => "INVALID_AGENT",
            DenialReason::InvalidSignature => "INVALID_SIGNATURE",
            DenialReason::SystemError => "SYSTEM_ERROR",
        }
    }

    /// Remediation hints surfaced to the client alongside the denial, per
    /// spec.md §7 "User-visible failures".
    pub fn remediation(self) -> &'static [&'static str] {
        match self {
            DenialReason::InsufficientTrust => {
                &["increase trust score", "request a higher autonomy grant"]
            }
            DenialReason::ResourceRestricted | DenialReason::DataSensitivityExceeded => {
                &["reduce requested data sensitivity", "use a narrower scope"]
            }
            DenialReason::RateLimitExceeded => &["retry after the rate limit window resets"],
            DenialReason::ContextMismatch => {
                &["use a higher observability tier", "avoid production environment for this band"]
            }
            DenialReason::ExpiredIntent => &["resubmit with a fresh intent"],
            _ => &[],
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ObservabilityTier {
    Black,
    Grey,
    White,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecisionConstraints {
    pub allowed_scopes: Vec<String>,
    pub rate_limit_per_minute: u32,
    pub rate_limit_per_hour: u32,
    pub rate_limit_per_day: u32,
    pub max_concurrency: u32,
    pub max_cost: f64,
    pub required_approvals: Vec<String>,
    pub observability_tier: ObservabilityTier,
    pub deadline_ms: u64,
    pub sandboxed: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Decision {
    pub decision_id: DecisionId,
    pub intent_id: IntentId,
    pub agent_id: AgentId,
    pub permitted: bool,
    pub denial_reason: DenialReason,
    pub constraints: Option<DecisionConstraints>,
    pub trust_band: TrustBand,
    pub trust_score: u16,
    pub reasoning: Vec<String>,
    pub decided_at_ms: u64,
    pub expires_at_ms: u64,
    pub latency_ms: u64,
    pub policy_set_id: String,
    pub correlation_id: CorrelationId,
}

impl Decision {
    /// `permitted == true` iff `constraints.is_some() && denial_reason == None`.
    pub fn invariant_holds(&self) -> bool {
        self.permitted == (self.constraints.is_some() && self.denial_reason == DenialReason::None)
    }
}

// ---------------------------------------------------------------------------
// Routing / concerns
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskLevel {
    Info,
    Low,
    Medium,
    High,
    Critical,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoutingPath {
    Green,
    Yellow,
    Red,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoutingResult {
    pub path: RoutingPath,
    pub max_latency_ms: u64,
    pub requires_council: bool,
    pub requires_human: bool,
    pub reasoning: Vec<String>,
}

/// The six concerns in strict priority order — Safety is rank 0 (highest).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Concern {
    Safety,
    Ethics,
    Legality,
    Policy,
    Efficiency,
    Innovation,
}

impl Concern {
    pub const ORDER: [Concern; 6] = [
        Concern::Safety,
        Concern::Ethics,
        Concern::Legality,
        Concern::Policy,
        Concern::Efficiency,
        Concern::Innovation,
    ];

    /// 0 = highest priority.
    pub fn priority(self) -> u8 {
        Self::ORDER.iter().position(|c| *c == self).expect("exhaustive") as u8
    }

    /// Safety, Ethics, and Legality are blocking; Policy, Efficiency, and
    /// Innovation are advisory only.
    pub fn is_blocking(self) -> bool {
        self.priority() < 3
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConcernAction {
    Proceed,
    Block,
    Escalate,
    Review,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConcernEvaluation {
    pub concern: Concern,
    pub passed: bool,
    pub violations: Vec<String>,
    pub severity: RiskLevel,
    pub action: ConcernAction,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecommendedAction {
    Reject,
    Escalate,
    Review,
    Approve,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AggregateConcernResult {
    pub overall_passed: bool,
    pub blocked_by: Option<Concern>,
    pub recommended_action: RecommendedAction,
    pub evaluations: Vec<ConcernEvaluation>,
}

// ---------------------------------------------------------------------------
// Council
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CouncilOutcome {
    Approved,
    Denied,
    Escalated,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Vote {
    pub validator: String,
    pub approved: bool,
    pub confidence: f64,
    pub notes: Vec<String>,
    /// Set by a compliance validator that independently flags a critical
    /// issue (PII/PHI exposure, restricted data mishandling) — per
    /// spec.md §4.3, any one critical compliance vote forces the council
    /// to escalate or deny regardless of how the rest of the roster votes.
    pub critical: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CouncilDecision {
    pub outcome: CouncilOutcome,
    pub votes: Vec<Vote>,
    pub compliance_issues: Vec<String>,
    pub qa_feedback: Vec<String>,
    pub requires_revision: bool,
    pub revision_count: u32,
    pub total_latency_ms: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HitlSeverity {
    Low,
    Medium,
    High,
    Critical,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HitlStatus {
    Pending,
    Acknowledged,
    Decided,
    Expired,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HitlReview {
    pub review_id: ReviewId,
    pub intent_id: IntentId,
    pub agent_id: AgentId,
    pub severity: HitlSeverity,
    pub assigned_role: String,
    pub deadline_ms: u64,
    pub status: HitlStatus,
    pub agent_decision: Option<String>,
    pub human_decision: Option<String>,
}

// ---------------------------------------------------------------------------
// Proofs / trust events
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProofOutcome {
    Success,
    Fail,
    Abort,
}

/// `{h, t, d, o, v?}` per spec.md §6.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Proof {
    /// Proof hash (`h`), used for idempotency.
    pub h: String,
    /// Timestamp (`t`), epoch ms.
    pub t: u64,
    /// Free-form detail payload (`d`).
    pub d: Value,
    /// Outcome (`o`).
    pub o: ProofOutcome,
    /// Optional violation code (`v`).
    pub v: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProofBatchResult {
    pub accepted: u32,
    pub rejected: u32,
    pub errors: Vec<ProofError>,
    pub score_prev: u16,
    pub score_new: u16,
    pub score_delta: i32,
    pub tier_change: Option<TierChange>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProofError {
    pub index: usize,
    pub code: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TierChange {
    pub from: u8,
    pub to: u8,
}

// ---------------------------------------------------------------------------
// Observer / anomaly
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObserverEvent {
    pub sequence: u64,
    pub timestamp_ms: u64,
    pub source: String,
    pub event_type: String,
    pub risk_level: RiskLevel,
    pub agent_id: Option<AgentId>,
    pub user_id: Option<String>,
    pub data: Value,
    pub previous_hash: String,
    pub hash: String,
    pub signature: String,
}

/// Fields needed to append a new event; the chain fields are computed by
/// [`crate::observer::chain`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObserverEventDraft {
    pub timestamp_ms: u64,
    pub source: String,
    pub event_type: String,
    pub risk_level: RiskLevel,
    pub agent_id: Option<AgentId>,
    pub user_id: Option<String>,
    pub data: Value,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ObserverFilter {
    pub agent_id: Option<AgentId>,
    pub user_id: Option<String>,
    pub event_type: Option<String>,
    pub source: Option<String>,
    pub min_risk: Option<RiskLevel>,
    pub since_ms: Option<u64>,
    pub until_ms: Option<u64>,
    pub limit: Option<usize>,
    /// Pagination cursor: resume strictly after this sequence number.
    pub after_sequence: Option<u64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnomalyType {
    ActivitySpike,
    ErrorCluster,
    RiskEscalation,
    RapidActions,
    TrustDrop,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnomalyLifecycle {
    Open,
    Acknowledged,
    Resolved,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Anomaly {
    pub anomaly_id: AnomalyId,
    pub agent_id: AgentId,
    pub anomaly_type: AnomalyType,
    pub severity: RiskLevel,
    pub description: String,
    pub evidence_from_sequence: u64,
    pub evidence_to_sequence: u64,
    pub detected_at_ms: u64,
    pub lifecycle: AnomalyLifecycle,
    pub acknowledged_at_ms: Option<u64>,
    pub resolved_at_ms: Option<u64>,
}

// ---------------------------------------------------------------------------
// Signals
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SignalCategory {
    SelfCat,
    Peer,
    Hierarchy,
    Council,
    Trust,
    Academy,
    Marketplace,
    System,
    Safety,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SignalPriority {
    Critical,
    High,
    Normal,
    Low,
    Background,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Signal {
    pub category: SignalCategory,
    pub priority: SignalPriority,
    pub source_sequence: u64,
    pub payload: Value,
}

// ---------------------------------------------------------------------------
// API keys
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiKeyRecord {
    pub key_id: ApiKeyId,
    pub key_hash: String,
    pub secret_hash: String,
    pub scopes: Vec<String>,
    pub rate_limit_per_minute: u32,
}

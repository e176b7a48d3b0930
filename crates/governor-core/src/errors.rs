// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Governor Labs, Inc.

//! Error taxonomy for the governance engine.
//!
//! [`GovernanceError`] is the no_std-safe core error type. It never appears
//! as an `Err` from [`crate::authz::engine::AuthorizationEngine::authorize`]
//! — that method never throws, per spec — but it is the `Err` type for the
//! lower-level operations that *do* fail (proof ingestion, pipeline
//! transitions, manifest validation, storage CAS).
//!
//! The `Display`/`Error` split mirrors the teacher's own `ConfigError` in
//! `config_loader.rs`: hand-written variants with a manual `Display` impl
//! that works under `no_std`, and a `std`-gated `impl std::error::Error`.

use alloc::string::String;
use core::fmt;

use crate::types::DenialReason;

/// Errors surfaced by governance operations that are not the authorization
/// hot path (which always returns a denied [`crate::types::Decision`]
/// instead of an `Err`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GovernanceError {
    /// The requested denial reason, surfaced directly (used by callers that
    /// want to treat "authorize would have denied" as a hard error, e.g. a
    /// strict middleware mode).
    Denied(DenialReason),
    /// A manifest failed schema validation.
    InvalidManifest { reason: String },
    /// An agent id did not resolve to a known agent.
    InvalidAgent { agent_id: String },
    /// A signature (batch signature, HMAC) did not verify.
    InvalidSignature,
    /// A proof with the same hash was already ingested.
    DuplicateProof { proof_hash: String },
    /// A storage compare-and-swap exceeded its retry budget.
    ConcurrentUpdateConflict { entity: String, retries: u32 },
    /// An internal failure not otherwise classified; retryable.
    SystemError { reason: String },
}

impl fmt::Display for GovernanceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GovernanceError::Denied(reason) => {
                write!(f, "denied: {}", reason.display_name())
            }
            GovernanceError::InvalidManifest { reason } => {
                write!(f, "invalid manifest: {reason}")
            }
            GovernanceError::InvalidAgent { agent_id } => {
                write!(f, "invalid agent: {agent_id}")
            }
            GovernanceError::InvalidSignature => write!(f, "invalid signature"),
            GovernanceError::DuplicateProof { proof_hash } => {
                write!(f, "duplicate proof: {proof_hash}")
            }
            GovernanceError::ConcurrentUpdateConflict { entity, retries } => {
                write!(f, "concurrent update conflict on {entity} after {retries} retries")
            }
            GovernanceError::SystemError { reason } => write!(f, "system error: {reason}"),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for GovernanceError {}

/// Convenience conversion: any [`DenialReason`] is a valid [`GovernanceError`].
impl From<DenialReason> for GovernanceError {
    fn from(reason: DenialReason) -> Self {
        GovernanceError::Denied(reason)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_is_human_readable() {
        let err = GovernanceError::DuplicateProof { proof_hash: "abc123".into() };
        assert_eq!(err.to_string(), "duplicate proof: abc123");
    }
}

// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Governor Labs, Inc.

//! BASIS manifest validation.
//!
//! A [`Manifest`] is declared once, at registration, and frozen for the
//! lifetime of an [`crate::types::Agent`] — changing capabilities means
//! registering a new agent version, not mutating the manifest in place.
//! `validate` is the single gate every manifest passes through before an
//! agent can reach [`crate::types::PipelineStage::Training`].

use alloc::format;
use alloc::string::String;
use alloc::vec::Vec;

use crate::errors::GovernanceError;
use crate::types::{Manifest, ManifestCapability, ManifestConstraint};

const MAX_CAPABILITY_LEVEL: u8 = 10;
const SUPPORTED_SCHEMA_VERSION: u32 = 1;

/// Validate a manifest's internal consistency. Does not consult storage —
/// callers needing uniqueness checks (e.g. no two agents sharing a name)
/// do that at the registration call site.
pub fn validate(manifest: &Manifest) -> Result<(), GovernanceError> {
    if manifest.schema_version != SUPPORTED_SCHEMA_VERSION {
        return Err(invalid(format!(
            "unsupported schema_version {} (expected {SUPPORTED_SCHEMA_VERSION})",
            manifest.schema_version
        )));
    }
    if manifest.agent_name.trim().is_empty() {
        return Err(invalid("agent_name must not be empty"));
    }
    if manifest.agent_version.trim().is_empty() {
        return Err(invalid("agent_version must not be empty"));
    }
    if manifest.capabilities.is_empty() {
        return Err(invalid("manifest must declare at least one capability"));
    }

    let mut seen_codes: Vec<&str> = Vec::with_capacity(manifest.capabilities.len());
    for cap in &manifest.capabilities {
        validate_capability(cap)?;
        if seen_codes.contains(&cap.code.as_str()) {
            return Err(invalid(format!("duplicate capability code {:?}", cap.code)));
        }
        seen_codes.push(&cap.code);
    }

    for constraint in &manifest.constraints {
        validate_constraint(constraint)?;
    }

    Ok(())
}

fn validate_capability(cap: &ManifestCapability) -> Result<(), GovernanceError> {
    if cap.code.trim().is_empty() {
        return Err(invalid("capability code must not be empty"));
    }
    if cap.level == 0 || cap.level > MAX_CAPABILITY_LEVEL {
        return Err(invalid(format!(
            "capability {:?} level {} out of range 1..={MAX_CAPABILITY_LEVEL}",
            cap.code, cap.level
        )));
    }
    Ok(())
}

fn validate_constraint(constraint: &ManifestConstraint) -> Result<(), GovernanceError> {
    if constraint.rule.trim().is_empty() {
        return Err(invalid("constraint rule must not be empty"));
    }
    Ok(())
}

fn invalid(reason: impl Into<String>) -> GovernanceError {
    GovernanceError::InvalidManifest { reason: reason.into() }
}

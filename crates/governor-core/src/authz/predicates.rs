// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Governor Labs, Inc.

//! Table-driven authorization predicates.
//!
//! Small, enum-indexed `match` blocks in the same style as the teacher's
//! `TrustLevel::display_name` — no config file, no runtime table, just a
//! const lookup the compiler can fully evaluate.

use crate::types::{ActionType, DataSensitivity, IntentContext, Reversibility, TrustBand};

/// Minimum trust band able to perform this action type at all, independent
/// of data sensitivity.
pub fn required_band_for_action(action: ActionType) -> TrustBand {
    match action {
        ActionType::Read => TrustBand::Untrusted,
        ActionType::Write => TrustBand::Provisional,
        ActionType::Communicate => TrustBand::Provisional,
        ActionType::Execute => TrustBand::Established,
        ActionType::Transfer => TrustBand::Trusted,
        ActionType::Delete => TrustBand::Verified,
    }
}

/// Minimum trust band able to touch data at this sensitivity level.
pub fn required_band_for_sensitivity(sensitivity: DataSensitivity) -> TrustBand {
    match sensitivity {
        DataSensitivity::Public => TrustBand::Untrusted,
        DataSensitivity::Internal => TrustBand::Provisional,
        DataSensitivity::Confidential => TrustBand::Trusted,
        DataSensitivity::Restricted => TrustBand::Verified,
    }
}

/// Additional bands required on top of the action/sensitivity ceiling for a
/// given reversibility, per spec.md §4.1 step 4 ("reversibility bump:
/// irreversible = +1 band, else 0").
pub fn reversibility_bump(reversibility: Reversibility) -> u8 {
    match reversibility {
        Reversibility::Irreversible => 1,
        Reversibility::Reversible | Reversibility::Partially => 0,
    }
}

/// `true` if a given band clears the required band for the combination of
/// action, sensitivity, and reversibility.
pub fn can_perform(
    band: TrustBand,
    action: ActionType,
    sensitivity: DataSensitivity,
    reversibility: Reversibility,
) -> bool {
    // spec.md §4.1 step 5: "Untrusted band always denies" — independent of
    // whatever ceiling the action/sensitivity/reversibility combination
    // would otherwise compute (even `read`+`public` clears a `Untrusted`
    // ceiling on paper, but the band itself is never permitted to act).
    if band == TrustBand::Untrusted {
        return false;
    }
    band >= effective_required_band(action, sensitivity, reversibility)
}

/// `requiredBand = max(bandFor(actionType), bandFor(sensitivity)) +
/// reversibilityBump(reversibility)`, clamped to the top band
/// ([`TrustBand::Certified`]) — spec.md §4.1 step 4, transcribed literally
/// rather than folding reversibility in as a fourth `max` dimension (which
/// would silently drop the "+1 band" semantics whenever the irreversible
/// floor happened to be lower than the action/sensitivity ceiling).
/// Step 6 (spec.md §4.1): `true` if `band`'s allowed scope set includes
/// *restricted* or *wildcard* access. Only the top two bands carry it — by
/// construction this can only ever be reached for a band that already
/// cleared the step-5 band check for restricted sensitivity, but the spec
/// frames it as its own gate with its own denial reason
/// (`RESOURCE_RESTRICTED` rather than `INSUFFICIENT_TRUST`), so it stays a
/// distinct, independently-testable predicate.
pub fn allows_restricted_scope(band: TrustBand) -> bool {
    matches!(band, TrustBand::Verified | TrustBand::Certified)
}

/// Step 7 (spec.md §4.1): context-ceiling violations. Returns the first
/// violated ceiling, if any: production requires at least `Trusted`;
/// handling PII requires at least `Provisional`; handling PHI requires at
/// least `Trusted`.
pub fn context_violation(band: TrustBand, context: &IntentContext) -> Option<&'static str> {
    if context.environment.as_deref() == Some("production") && band < TrustBand::Trusted {
        return Some("production environment requires at least the trusted band");
    }
    if context.handles_pii && band < TrustBand::Provisional {
        return Some("handling PII requires at least the provisional band");
    }
    if context.handles_phi && band < TrustBand::Trusted {
        return Some("handling PHI requires at least the trusted band");
    }
    None
}

pub fn effective_required_band(
    action: ActionType,
    sensitivity: DataSensitivity,
    reversibility: Reversibility,
) -> TrustBand {
    let ceiling = required_band_for_action(action).max(required_band_for_sensitivity(sensitivity));
    let bumped = ceiling as u8 + reversibility_bump(reversibility);
    TrustBand::from_u8(bumped.min(TrustBand::Certified as u8)).expect("clamped to a valid discriminant")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn delete_requires_verified_regardless_of_sensitivity() {
        assert_eq!(required_band_for_action(ActionType::Delete), TrustBand::Verified);
        assert!(!can_perform(
            TrustBand::Trusted,
            ActionType::Delete,
            DataSensitivity::Public,
            Reversibility::Reversible
        ));
        assert!(can_perform(
            TrustBand::Verified,
            ActionType::Delete,
            DataSensitivity::Public,
            Reversibility::Reversible
        ));
    }

    #[test]
    fn effective_band_is_the_strictest_dimension() {
        let eff = effective_required_band(
            ActionType::Read,
            DataSensitivity::Restricted,
            Reversibility::Reversible,
        );
        assert_eq!(eff, TrustBand::Verified);
    }

    #[test]
    fn untrusted_band_always_denies_even_read_of_public_data() {
        assert!(!can_perform(
            TrustBand::Untrusted,
            ActionType::Read,
            DataSensitivity::Public,
            Reversibility::Reversible
        ));
    }

    #[test]
    fn irreversible_write_of_confidential_data_bumps_one_band_above_the_ceiling() {
        // max(write=provisional, confidential=trusted) + 1 (irreversible) = verified.
        let eff = effective_required_band(
            ActionType::Write,
            DataSensitivity::Confidential,
            Reversibility::Irreversible,
        );
        assert_eq!(eff, TrustBand::Verified);
        assert!(!can_perform(
            TrustBand::Trusted,
            ActionType::Write,
            DataSensitivity::Confidential,
            Reversibility::Irreversible
        ));
        assert!(can_perform(
            TrustBand::Verified,
            ActionType::Write,
            DataSensitivity::Confidential,
            Reversibility::Irreversible
        ));
    }

    #[test]
    fn reversibility_bump_clamps_at_top_band() {
        // Delete (verified) + restricted (verified) + irreversible (+1) would
        // overflow past Certified; it must clamp rather than wrap/panic.
        let eff = effective_required_band(
            ActionType::Delete,
            DataSensitivity::Restricted,
            Reversibility::Irreversible,
        );
        assert_eq!(eff, TrustBand::Certified);
    }
}

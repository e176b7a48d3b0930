// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Governor Labs, Inc.

//! Global kill switch.
//!
//! Registered as the first [`crate::authz::hooks::PreAuthorizeHook`] so it
//! short-circuits the pipeline ahead of trust lookups, routing, and concerns
//! evaluation — the same "first gate wins" discipline the teacher's
//! `GovernanceEngine::check` used for its fixed gate order.
//!
//! spec.md §6 scopes activation to `"all" | "tier:<name>" |
//! "specialization:<name>"` rather than a bare on/off flag, so the switch
//! carries its scope alongside the engaged bit and every `authorize` call
//! tests the authorizing agent against it. The scoped form needs an
//! interior-mutability primitive that can hold a `String`; under `std`
//! that's a plain `RwLock`. The `no_std` build (mirroring the
//! `#[cfg(feature = "std")]` split the teacher uses for
//! `current_time_ms()`) falls back to a lock-free `AtomicBool` that only
//! ever activates with an all-agents scope — no heap-allocated scope state
//! to race on.

use alloc::string::{String, ToString};

/// What an activation matches against.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KillSwitchScope {
    All,
    Tier(String),
    Specialization(String),
}

impl KillSwitchScope {
    /// Parse the wire form from spec.md §6: `"all"`, `"tier:<name>"`,
    /// `"specialization:<name>"`.
    pub fn parse(raw: &str) -> Option<Self> {
        if raw == "all" {
            return Some(Self::All);
        }
        if let Some(name) = raw.strip_prefix("tier:") {
            return Some(Self::Tier(name.to_string()));
        }
        if let Some(name) = raw.strip_prefix("specialization:") {
            return Some(Self::Specialization(name.to_string()));
        }
        None
    }

    /// `true` if an agent in `tier` with `specialization` falls within this
    /// scope.
    pub fn matches(&self, tier: &str, specialization: Option<&str>) -> bool {
        match self {
            Self::All => true,
            Self::Tier(name) => name == tier,
            Self::Specialization(name) => specialization == Some(name.as_str()),
        }
    }
}

#[cfg(feature = "std")]
mod imp {
    use super::KillSwitchScope;
    use alloc::string::String;
    use std::sync::RwLock;

    #[derive(Debug, Clone)]
    struct Activation {
        reason: String,
        scope: KillSwitchScope,
    }

    /// Activating with a scope denies every matching subsequent
    /// `authorize` call with [`crate::types::DenialReason::PolicyViolation`]
    /// until deactivated. Deactivation clears the switch; it does not
    /// resume any agent paused while it was engaged (spec.md §6: "agents
    /// remain paused until individually resumed").
    #[derive(Debug, Default)]
    pub struct KillSwitch {
        activation: RwLock<Option<Activation>>,
    }

    impl KillSwitch {
        pub fn new(engaged_at_boot: bool) -> Self {
            let activation = if engaged_at_boot {
                Some(Activation { reason: "engaged at boot".into(), scope: KillSwitchScope::All })
            } else {
                None
            };
            Self { activation: RwLock::new(activation) }
        }

        pub fn activate(&self, reason: String, scope: KillSwitchScope) {
            *self.activation.write().unwrap() = Some(Activation { reason, scope });
        }

        pub fn deactivate(&self) {
            *self.activation.write().unwrap() = None;
        }

        pub fn is_engaged(&self) -> bool {
            self.activation.read().unwrap().is_some()
        }

        /// `true` if the switch is engaged and its scope covers an agent in
        /// `tier` with `specialization`.
        pub fn blocks(&self, tier: &str, specialization: Option<&str>) -> bool {
            self.activation.read().unwrap().as_ref().map(|a| a.scope.matches(tier, specialization)).unwrap_or(false)
        }

        pub fn reason(&self) -> Option<String> {
            self.activation.read().unwrap().as_ref().map(|a| a.reason.clone())
        }
    }
}

#[cfg(not(feature = "std"))]
mod imp {
    use alloc::string::{String, ToString};
    use core::sync::atomic::{AtomicBool, Ordering};

    /// `no_std` fallback: all-or-nothing, no scope state to allocate or
    /// race on.
    #[derive(Debug, Default)]
    pub struct KillSwitch {
        engaged: AtomicBool,
    }

    impl KillSwitch {
        pub fn new(engaged_at_boot: bool) -> Self {
            Self { engaged: AtomicBool::new(engaged_at_boot) }
        }

        pub fn activate(&self, _reason: String, _scope: super::KillSwitchScope) {
            self.engaged.store(true, Ordering::SeqCst);
        }

        pub fn deactivate(&self) {
            self.engaged.store(false, Ordering::SeqCst);
        }

        pub fn is_engaged(&self) -> bool {
            self.engaged.load(Ordering::SeqCst)
        }

        pub fn blocks(&self, _tier: &str, _specialization: Option<&str>) -> bool {
            self.is_engaged()
        }

        pub fn reason(&self) -> Option<String> {
            if self.is_engaged() {
                Some("kill switch engaged".to_string())
            } else {
                None
            }
        }
    }
}

pub use imp::KillSwitch;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_disengaged_by_default() {
        let ks = KillSwitch::new(false);
        assert!(!ks.is_engaged());
        assert!(ks.reason().is_none());
        assert!(!ks.blocks("untrusted", None));
    }

    #[test]
    fn all_scope_blocks_every_tier() {
        let ks = KillSwitch::new(false);
        ks.activate("incident".to_string(), KillSwitchScope::All);
        assert!(ks.blocks("trusted", None));
        assert!(ks.blocks("certified", Some("research")));
    }

    #[cfg(feature = "std")]
    #[test]
    fn tier_scope_blocks_only_the_named_tier() {
        let ks = KillSwitch::new(false);
        ks.activate("tier review".to_string(), KillSwitchScope::Tier("trusted".to_string()));
        assert!(ks.blocks("trusted", None));
        assert!(!ks.blocks("certified", None));
    }

    #[cfg(feature = "std")]
    #[test]
    fn specialization_scope_blocks_only_the_named_specialization() {
        let ks = KillSwitch::new(false);
        ks.activate(
            "vendor outage".to_string(),
            KillSwitchScope::Specialization("finance".to_string()),
        );
        assert!(ks.blocks("trusted", Some("finance")));
        assert!(!ks.blocks("trusted", Some("research")));
        assert!(!ks.blocks("trusted", None));
    }

    #[test]
    fn deactivate_clears_the_switch() {
        let ks = KillSwitch::new(false);
        ks.activate("incident".to_string(), KillSwitchScope::All);
        assert!(ks.is_engaged());
        ks.deactivate();
        assert!(!ks.is_engaged());
        assert!(!ks.blocks("untrusted", None));
    }

    #[test]
    fn scope_parses_the_wire_form() {
        assert_eq!(KillSwitchScope::parse("all"), Some(KillSwitchScope::All));
        assert_eq!(KillSwitchScope::parse("tier:trusted"), Some(KillSwitchScope::Tier("trusted".to_string())));
        assert_eq!(
            KillSwitchScope::parse("specialization:finance"),
            Some(KillSwitchScope::Specialization("finance".to_string()))
        );
        assert_eq!(KillSwitchScope::parse("bogus"), None);
    }
}

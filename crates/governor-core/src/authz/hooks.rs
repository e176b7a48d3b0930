// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Governor Labs, Inc.

//! Pre/post-authorize hook traits.
//!
//! The teacher's engine had no extension points; every deployment got the
//! same three fixed gates. This pipeline is widely embedded (middleware,
//! WASM, Workers) and callers need to splice in their own checks — a
//! license gate, a tenant allow-list — without forking the crate. Hooks are
//! registered at construction, in the order they run, the same way the
//! teacher registered its single `Storage` implementation.

use alloc::boxed::Box;
use alloc::vec::Vec;

use crate::types::{DenialReason, Intent};

/// Runs before trust lookup and routing. Returning `Some(reason)` denies
/// the intent immediately — later hooks and the rest of the pipeline never
/// run.
pub trait PreAuthorizeHook: Send + Sync {
    fn check(&self, intent: &Intent) -> Option<DenialReason>;
}

/// Runs after a [`crate::types::Decision`] is computed but before it's
/// returned to the caller. Cannot change `permitted`, only observe (log,
/// emit metrics, mirror to an external system).
pub trait PostAuthorizeHook: Send + Sync {
    fn observe(&self, intent: &Intent, decision: &crate::types::Decision);
}

/// Ordered hook registry consulted by [`crate::authz::engine::AuthorizationEngine`].
#[derive(Default)]
pub struct HookRegistry {
    pre: Vec<Box<dyn PreAuthorizeHook>>,
    post: Vec<Box<dyn PostAuthorizeHook>>,
}

impl HookRegistry {
    pub fn new() -> Self {
        Self { pre: Vec::new(), post: Vec::new() }
    }

    pub fn register_pre(&mut self, hook: Box<dyn PreAuthorizeHook>) {
        self.pre.push(hook);
    }

    pub fn register_post(&mut self, hook: Box<dyn PostAuthorizeHook>) {
        self.post.push(hook);
    }

    /// Runs each hook in registration order; returns the first denial.
    pub fn run_pre(&self, intent: &Intent) -> Option<DenialReason> {
        for hook in &self.pre {
            if let Some(reason) = hook.check(intent) {
                return Some(reason);
            }
        }
        None
    }

    pub fn run_post(&self, intent: &Intent, decision: &crate::types::Decision) {
        for hook in &self.post {
            hook.observe(intent, decision);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ids::{AgentId, CorrelationId, IntentId};
    use crate::types::{ActionType, DataSensitivity, IntentContext, Reversibility};

    struct AlwaysDeny;
    impl PreAuthorizeHook for AlwaysDeny {
        fn check(&self, _intent: &Intent) -> Option<DenialReason> {
            Some(DenialReason::PolicyViolation)
        }
    }

    fn sample_intent() -> Intent {
        Intent::new(
            IntentId::from("i1"),
            AgentId::from("a1"),
            ActionType::Read,
            DataSensitivity::Public,
            Reversibility::Reversible,
            CorrelationId::from("c1"),
            0,
            1,
            IntentContext::default(),
        )
        .unwrap()
    }

    #[test]
    fn first_denying_hook_short_circuits() {
        let mut registry = HookRegistry::new();
        registry.register_pre(Box::new(AlwaysDeny));
        let result = registry.run_pre(&sample_intent());
        assert_eq!(result, Some(DenialReason::PolicyViolation));
    }

    #[test]
    fn empty_registry_permits() {
        let registry = HookRegistry::new();
        assert_eq!(registry.run_pre(&sample_intent()), None);
    }
}

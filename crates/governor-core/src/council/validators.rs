// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Governor Labs, Inc.

//! The validator roster.
//!
//! Each validator is a small, independent async task that casts one
//! [`Vote`] on an intent. They never see each other's votes — only
//! [`crate::council::meta::MetaOrchestrator`] aggregates — which keeps
//! each validator's judgement uncorrelated with the others', the same
//! "tagged variant, explicit external ordering" design spec.md §9 calls
//! for.

use alloc::string::ToString;
use alloc::vec::Vec;
use async_trait::async_trait;

use crate::types::{AggregateConcernResult, ConcernAction, Intent, RoutingResult, Vote};

#[async_trait]
pub trait Validator: Send + Sync {
    fn name(&self) -> &str;
    async fn validate(&self, intent: &Intent, routing: &RoutingResult, concerns: &AggregateConcernResult) -> Vote;
}

/// Checks that the matrix router's chosen path is internally consistent
/// with the intent's risk profile — a second opinion on routing itself,
/// not on the underlying action.
pub struct RoutingValidator;

#[async_trait]
impl Validator for RoutingValidator {
    fn name(&self) -> &str {
        "routing"
    }

    async fn validate(&self, _intent: &Intent, routing: &RoutingResult, _concerns: &AggregateConcernResult) -> Vote {
        let approved = !routing.reasoning.is_empty();
        Vote {
            validator: self.name().to_string(),
            approved,
            confidence: if approved { 0.95 } else { 0.5 },
            notes: routing.reasoning.clone(),
            critical: false,
        }
    }
}

/// One compliance domain out of several running in parallel — privacy,
/// security, financial, and regulatory each get their own instance so a
/// single compliance validator can't become a silent single point of
/// failure for every domain at once.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComplianceDomain {
    Privacy,
    Security,
    Financial,
    Regulatory,
}

pub struct ComplianceValidator {
    pub domain: ComplianceDomain,
}

impl ComplianceValidator {
    /// Each domain's own critical signal, independent of whatever the
    /// concerns evaluator already found — per spec.md §4.3 ("Checks:
    /// PII/PHI, policy violations, sensitivity classification, ethical
    /// red-flags"). This is what lets e.g. a PII-only intent (which never
    /// trips the concerns evaluator's Ethics check, since that one only
    /// fires on *combined* PII+PHI handling) still get caught.
    fn domain_critical_check(&self, intent: &Intent) -> (bool, Vec<alloc::string::String>) {
        use crate::types::DataSensitivity;
        match self.domain {
            ComplianceDomain::Privacy => {
                if intent.context.handles_pii || intent.context.handles_phi {
                    (true, alloc::vec!["independent PII/PHI exposure check failed".to_string()])
                } else {
                    (false, Vec::new())
                }
            }
            ComplianceDomain::Security => {
                if intent.data_sensitivity == DataSensitivity::Restricted {
                    (true, alloc::vec!["restricted data sensitivity requires security sign-off".to_string()])
                } else {
                    (false, Vec::new())
                }
            }
            ComplianceDomain::Financial => {
                if intent.context.estimated_cost.map(|c| c > 10_000.0).unwrap_or(false) {
                    (true, alloc::vec!["estimated cost exceeds emergency financial ceiling".to_string()])
                } else {
                    (false, Vec::new())
                }
            }
            ComplianceDomain::Regulatory => {
                if intent.context.environment.as_deref() == Some("production")
                    && intent.data_sensitivity >= DataSensitivity::Confidential
                {
                    (
                        true,
                        alloc::vec!["confidential-or-higher data in production requires regulatory sign-off"
                            .to_string()],
                    )
                } else {
                    (false, Vec::new())
                }
            }
        }
    }
}

#[async_trait]
impl Validator for ComplianceValidator {
    fn name(&self) -> &str {
        match self.domain {
            ComplianceDomain::Privacy => "compliance.privacy",
            ComplianceDomain::Security => "compliance.security",
            ComplianceDomain::Financial => "compliance.financial",
            ComplianceDomain::Regulatory => "compliance.regulatory",
        }
    }

    async fn validate(&self, intent: &Intent, _routing: &RoutingResult, concerns: &AggregateConcernResult) -> Vote {
        let (critical, mut notes) = self.domain_critical_check(intent);
        let relevant_violations: Vec<alloc::string::String> = concerns
            .evaluations
            .iter()
            .filter(|e| e.action != ConcernAction::Proceed)
            .flat_map(|e| e.violations.clone())
            .collect();
        notes.extend(relevant_violations);
        let approved = !critical && notes.is_empty();
        Vote {
            validator: self.name().to_string(),
            approved,
            confidence: if approved {
                0.9
            } else if critical {
                0.1
            } else {
                0.3
            },
            notes,
            critical,
        }
    }
}

/// Quality-assurance pass: sanity checks the intent's shape (non-empty
/// scopes, plausible cost estimate) independent of policy.
pub struct QaValidator;

#[async_trait]
impl Validator for QaValidator {
    fn name(&self) -> &str {
        "qa"
    }

    async fn validate(&self, intent: &Intent, _routing: &RoutingResult, _concerns: &AggregateConcernResult) -> Vote {
        let plausible_cost = intent.context.estimated_cost.map(|c| c >= 0.0).unwrap_or(true);
        Vote {
            validator: self.name().to_string(),
            approved: plausible_cost,
            confidence: 0.8,
            notes: if plausible_cost { Vec::new() } else { alloc::vec!["negative estimated cost".to_string()] },
            critical: false,
        }
    }
}

/// The default roster: one routing validator, four compliance validators
/// (one per domain), and one QA validator. `Arc` (rather than `Box`) so the
/// roster can be fanned out across `tokio::spawn` tasks in
/// [`crate::council::meta::MetaOrchestrator`].
pub fn default_roster() -> Vec<alloc::sync::Arc<dyn Validator>> {
    alloc::vec![
        alloc::sync::Arc::new(RoutingValidator),
        alloc::sync::Arc::new(ComplianceValidator { domain: ComplianceDomain::Privacy }),
        alloc::sync::Arc::new(ComplianceValidator { domain: ComplianceDomain::Security }),
        alloc::sync::Arc::new(ComplianceValidator { domain: ComplianceDomain::Financial }),
        alloc::sync::Arc::new(ComplianceValidator { domain: ComplianceDomain::Regulatory }),
        alloc::sync::Arc::new(QaValidator),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ids::{AgentId, CorrelationId, IntentId};
    use crate::types::{ActionType, DataSensitivity, IntentContext, Reversibility, RoutingPath};

    fn intent() -> Intent {
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

    fn routing() -> RoutingResult {
        RoutingResult {
            path: RoutingPath::Green,
            max_latency_ms: 50,
            requires_council: false,
            requires_human: false,
            reasoning: alloc::vec!["ok".to_string()],
        }
    }

    #[tokio::test]
    async fn default_roster_has_six_validators() {
        assert_eq!(default_roster().len(), 6);
    }

    #[tokio::test]
    async fn qa_validator_rejects_negative_cost() {
        let mut i = intent();
        i.context.estimated_cost = Some(-5.0);
        let vote = QaValidator.validate(&i, &routing(), &crate::concerns::evaluate(&i)).await;
        assert!(!vote.approved);
    }

    #[tokio::test]
    async fn privacy_compliance_validator_independently_flags_pii_as_critical() {
        let mut i = intent();
        i.context.handles_pii = true;
        // The concerns evaluator only fires its Ethics check on *combined*
        // PII+PHI, so this intent passes it cleanly — the compliance
        // validator must still catch the PII exposure on its own.
        let concerns = crate::concerns::evaluate(&i);
        assert!(concerns.overall_passed);
        let validator = ComplianceValidator { domain: ComplianceDomain::Privacy };
        let vote = validator.validate(&i, &routing(), &concerns).await;
        assert!(!vote.approved);
        assert!(vote.critical);
    }

    #[tokio::test]
    async fn other_compliance_domains_do_not_flag_a_clean_intent() {
        let i = intent();
        let concerns = crate::concerns::evaluate(&i);
        for domain in [
            ComplianceDomain::Privacy,
            ComplianceDomain::Security,
            ComplianceDomain::Financial,
            ComplianceDomain::Regulatory,
        ] {
            let vote = ComplianceValidator { domain }.validate(&i, &routing(), &concerns).await;
            assert!(vote.approved, "{:?} should approve a clean intent", domain);
            assert!(!vote.critical);
        }
    }
}

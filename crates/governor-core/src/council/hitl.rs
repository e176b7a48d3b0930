// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Governor Labs, Inc.

//! Human-in-the-loop escalation queue.
//!
//! Backs the red routing path and any council outcome of
//! [`CouncilOutcome::Escalated`]: a review is enqueued, a human claims it
//! (`acknowledge`), and eventually resolves it (`decide`). Claims are
//! CAS'd through [`dashmap::DashMap::get_mut`] so two reviewers racing to
//! pick up the same review can't both believe they own it.

use alloc::string::String;
use dashmap::DashMap;

use crate::ids::ReviewId;
use crate::types::{HitlReview, HitlSeverity, HitlStatus};

/// The named triage signals from spec.md §4.3 ("Triage decides severity ...
/// from compliance failures, budget overruns, confidence < 0.7, repeated QA
/// failures, explicit user request, and high-cost critical-priority
/// combinations").
#[derive(Debug, Clone, Copy, Default)]
pub struct TriageInputs {
    pub compliance_failures: u32,
    pub budget_overrun: bool,
    pub min_confidence: f32,
    pub qa_revision_count: u32,
    pub user_requested_review: bool,
    pub high_cost: bool,
    pub critical_priority: bool,
}

/// Pure triage function: `{low, medium, high, critical}` from the named
/// signals, highest-priority condition wins.
pub fn triage(inputs: &TriageInputs) -> HitlSeverity {
    if inputs.compliance_failures >= 2 || (inputs.high_cost && inputs.critical_priority) {
        return HitlSeverity::Critical;
    }
    if inputs.compliance_failures == 1 || inputs.qa_revision_count >= 3 {
        return HitlSeverity::High;
    }
    if inputs.budget_overrun || inputs.min_confidence < 0.7 || inputs.user_requested_review {
        return HitlSeverity::Medium;
    }
    HitlSeverity::Low
}

/// Review deadline per spec.md §4.3: 2h / 8h / 24h / 72h for
/// critical / high / medium / low.
pub fn deadline_ms_for(severity: HitlSeverity, now_ms: u64) -> u64 {
    const HOUR_MS: u64 = 60 * 60 * 1_000;
    now_ms
        + match severity {
            HitlSeverity::Critical => 2 * HOUR_MS,
            HitlSeverity::High => 8 * HOUR_MS,
            HitlSeverity::Medium => 24 * HOUR_MS,
            HitlSeverity::Low => 72 * HOUR_MS,
        }
}

/// The approver role a severity escalates to — critical reviews page the
/// most senior available role, per spec.md S6 ("assigned to 'CEO'").
pub fn role_for(severity: HitlSeverity) -> &'static str {
    match severity {
        HitlSeverity::Critical => "CEO",
        HitlSeverity::High => "senior-reviewer",
        HitlSeverity::Medium => "on-call-reviewer",
        HitlSeverity::Low => "on-call-reviewer",
    }
}

pub struct HitlQueue {
    reviews: DashMap<String, HitlReview>,
}

impl HitlQueue {
    pub fn new() -> Self {
        Self { reviews: DashMap::new() }
    }

    pub fn enqueue(&self, review: HitlReview) {
        self.reviews.insert(review.review_id.0.clone(), review);
    }

    pub fn get(&self, id: &ReviewId) -> Option<HitlReview> {
        self.reviews.get(id.as_str()).map(|r| r.clone())
    }

    pub fn list_pending(&self) -> alloc::vec::Vec<HitlReview> {
        self.reviews.iter().filter(|r| r.status == HitlStatus::Pending).map(|r| r.clone()).collect()
    }

    /// Claim a pending review for `reviewer_role`. Fails if the review is
    /// missing or already claimed/decided.
    pub fn acknowledge(&self, id: &ReviewId) -> Result<(), crate::errors::GovernanceError> {
        let mut entry = self
            .reviews
            .get_mut(id.as_str())
            .ok_or_else(|| crate::errors::GovernanceError::SystemError { reason: "review not found".into() })?;
        if entry.status != HitlStatus::Pending {
            return Err(crate::errors::GovernanceError::SystemError {
                reason: "review is not pending".into(),
            });
        }
        entry.status = HitlStatus::Acknowledged;
        Ok(())
    }

    pub fn decide(&self, id: &ReviewId, human_decision: String) -> Result<HitlReview, crate::errors::GovernanceError> {
        let mut entry = self
            .reviews
            .get_mut(id.as_str())
            .ok_or_else(|| crate::errors::GovernanceError::SystemError { reason: "review not found".into() })?;
        if entry.status == HitlStatus::Decided || entry.status == HitlStatus::Expired {
            return Err(crate::errors::GovernanceError::SystemError {
                reason: "review already finalized".into(),
            });
        }
        entry.status = HitlStatus::Decided;
        entry.human_decision = Some(human_decision);
        Ok(entry.clone())
    }

    /// Mark any review past its deadline as expired; returns how many were
    /// transitioned.
    pub fn expire_overdue(&self, now_ms: u64) -> usize {
        let mut count = 0;
        for mut entry in self.reviews.iter_mut() {
            if entry.status == HitlStatus::Pending && entry.deadline_ms < now_ms {
                entry.status = HitlStatus::Expired;
                count += 1;
            }
        }
        count
    }
}

impl Default for HitlQueue {
    fn default() -> Self {
        Self::new()
    }
}

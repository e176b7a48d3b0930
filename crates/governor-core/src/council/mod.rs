// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Governor Labs, Inc.

//! Multi-Validator Council: the yellow/red-path review layer sitting
//! above the synchronous authorization engine.

pub mod hitl;
pub mod meta;
pub mod validators;

pub use hitl::{deadline_ms_for, role_for, triage, HitlQueue, TriageInputs};
pub use meta::MetaOrchestrator;
pub use validators::{default_roster, Validator};

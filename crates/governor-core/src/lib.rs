// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Governor Labs, Inc.

//! Core authorization engine, matrix router, concerns evaluator, council,
//! and Observer log for the Governor agent governance platform.
//!
//! This crate is `no_std` by default (`alloc` only); enable the `std`
//! feature (on by default for normal consumers) for full functionality,
//! `async` for the Tokio-backed council/Observer/webhook layer, and
//! `config-loader` for TOML/environment configuration loading.

#![cfg_attr(not(feature = "std"), no_std)]

extern crate alloc;

pub mod authz;
pub mod concerns;
pub mod config;
pub mod errors;
pub mod ids;
pub mod killswitch;
pub mod manifest;
pub mod matrix;
pub mod observer;
pub mod pipeline;
pub mod storage;
pub mod trust;
pub mod types;

#[cfg(feature = "std")]
pub mod ratelimit;

#[cfg(feature = "async")]
pub mod async_engine;
#[cfg(feature = "async")]
pub mod council;
#[cfg(feature = "async")]
pub mod webhooks;

#[cfg(feature = "config-loader")]
pub mod config_loader;

pub use authz::AuthorizationEngine;
pub use config::Config;
pub use errors::GovernanceError;
pub use ids::{AgentId, AnomalyId, ApiKeyId, CorrelationId, DecisionId, IntentId, ReviewId};
pub use killswitch::{KillSwitch, KillSwitchScope};

#[cfg(feature = "async")]
pub use async_engine::AsyncGovernanceEngine;

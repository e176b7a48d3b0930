// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Governor Labs, Inc.

//! `std`-only storage backends for `governor-core`.
//!
//! This crate provides [`FileStorage`], a JSON file-backed implementation
//! of [`governor_core::storage::Storage`] suitable for CLI tools, local
//! agents, and server-side deployments that don't need a full database.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use governor_std::storage::FileStorage;
//! use governor_core::{AuthorizationEngine, Config};
//!
//! let storage = FileStorage::open("/var/lib/governor/state.json")
//!     .expect("failed to open storage file");
//!
//! let engine = AuthorizationEngine::new(storage, Config::default());
//! ```

pub mod storage;

pub use storage::file::FileStorage;

// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Governor Labs, Inc.

//! The Observer: append-only hash-chained event log, anomaly detection,
//! and the signal bus.

pub mod anomaly;
pub mod chain;

#[cfg(feature = "async")]
pub mod log;

#[cfg(feature = "async")]
pub mod signals;

#[cfg(feature = "async")]
pub use log::ObserverLog;
#[cfg(feature = "async")]
pub use signals::SignalBus;

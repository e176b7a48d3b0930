// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Governor Labs, Inc.

//! Signal bus.
//!
//! Broadcasts [`Signal`]s (spec.md §6 Egress) to any number of subscribers
//! via `tokio::sync::broadcast`. A slow subscriber that falls behind the
//! channel's capacity misses the oldest signals rather than blocking
//! publication — acceptable here because signals are a best-effort
//! notification layer, not the durable Observer log.

use tokio::sync::broadcast;

use crate::types::Signal;

const DEFAULT_CAPACITY: usize = 1024;

pub struct SignalBus {
    sender: broadcast::Sender<Signal>,
}

impl SignalBus {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        let (sender, _receiver) = broadcast::channel(capacity);
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Signal> {
        self.sender.subscribe()
    }

    /// Publish a signal. Returns the number of subscribers it reached;
    /// zero is not an error — nobody may be listening.
    pub fn publish(&self, signal: Signal) -> usize {
        self.sender.send(signal).unwrap_or(0)
    }
}

impl Default for SignalBus {
    fn default() -> Self {
        Self::new()
    }
}

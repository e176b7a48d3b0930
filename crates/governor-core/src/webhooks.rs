// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Governor Labs, Inc.

//! Webhook delivery queue.
//!
//! At-least-once delivery with jittered exponential backoff, spec.md §6
//! Egress. A delivery that exhausts `max_attempts` moves to the dead-letter
//! list rather than being dropped — callers can inspect
//! [`WebhookQueue::dead_letters`] and requeue manually.

use alloc::string::String;
use alloc::vec::Vec;
use core::time::Duration;
use rand::Rng;
use serde_json::Value;
use tokio::sync::Mutex;

#[derive(Debug, Clone)]
pub struct WebhookDelivery {
    pub url: String,
    pub payload: Value,
    pub attempts: u32,
}

/// Implemented by the HTTP client the host application wires in —
/// `governor-core` itself has no transport dependency.
#[async_trait::async_trait]
pub trait WebhookSender: Send + Sync {
    async fn send(&self, url: &str, payload: &Value) -> Result<(), String>;
}

pub struct WebhookQueue<S: WebhookSender> {
    sender: S,
    max_attempts: u32,
    base_backoff_ms: u64,
    dead_letters: Mutex<Vec<WebhookDelivery>>,
}

impl<S: WebhookSender> WebhookQueue<S> {
    pub fn new(sender: S, max_attempts: u32, base_backoff_ms: u64) -> Self {
        Self { sender, max_attempts, base_backoff_ms, dead_letters: Mutex::new(Vec::new()) }
    }

    /// Deliver `payload` to `url`, retrying with jittered exponential
    /// backoff until `max_attempts` is exhausted. Returns `Ok(attempts)` on
    /// success, or moves the delivery to the dead-letter queue and returns
    /// `Err(attempts)`.
    pub async fn deliver(&self, url: String, payload: Value) -> Result<u32, u32> {
        let mut attempts = 0u32;
        loop {
            attempts += 1;
            match self.sender.send(&url, &payload).await {
                Ok(()) => return Ok(attempts),
                Err(_) if attempts < self.max_attempts => {
                    let backoff = self.base_backoff_ms.saturating_mul(1u64 << (attempts - 1).min(16));
                    let jitter_ms = rand::thread_rng().gen_range(0..=backoff / 4 + 1);
                    tokio::time::sleep(Duration::from_millis(backoff + jitter_ms)).await;
                }
                Err(_) => {
                    self.dead_letters.lock().await.push(WebhookDelivery { url, payload, attempts });
                    return Err(attempts);
                }
            }
        }
    }

    pub async fn dead_letters(&self) -> Vec<WebhookDelivery> {
        self.dead_letters.lock().await.clone()
    }
}

// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@mitander.dev>

use crate::common::error::AppError;
use crate::common::retry::retry_async;
use crate::network::provider::HttpProvider;
use alloy::primitives::Address;
use alloy::providers::Provider;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Pending-nonce tracker for one account.
///
/// The chain's pending count can lag a broadcast we just made, so the next
/// nonce is the larger of that count and one past the last nonce we used.
#[derive(Clone)]
pub struct NonceManager {
    provider: HttpProvider,
    address: Address,
    last_used: Arc<Mutex<Option<u64>>>,
}

impl NonceManager {
    pub fn new(provider: HttpProvider, address: Address) -> Self {
        Self {
            provider,
            address,
            last_used: Arc::new(Mutex::new(None)),
        }
    }

    pub async fn next_nonce(&self) -> Result<u64, AppError> {
        let provider = self.provider.clone();
        let address = self.address;
        let on_chain: u64 = retry_async(
            "pending_nonce",
            move |_| {
                let provider = provider.clone();
                async move { provider.get_transaction_count(address).pending().await }
            },
            3,
            Duration::from_millis(100),
        )
        .await
        .map_err(|e| AppError::Connection(format!("Failed to fetch nonce: {}", e)))?;

        let last_used = *self
            .last_used
            .lock()
            .map_err(|_| AppError::Initialization("nonce cache poisoned".into()))?;
        Ok(merge_nonce(on_chain, last_used))
    }

    pub fn mark_used(&self, nonce: u64) {
        if let Ok(mut guard) = self.last_used.lock() {
            *guard = Some(guard.map_or(nonce, |prev| prev.max(nonce)));
        }
        tracing::debug!(target: "wallet", nonce, "Nonce consumed");
    }
}

fn merge_nonce(on_chain: u64, last_used: Option<u64>) -> u64 {
    match last_used {
        Some(used) => on_chain.max(used.saturating_add(1)),
        None => on_chain,
    }
}

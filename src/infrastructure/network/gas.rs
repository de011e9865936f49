// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@oxidity.com>

use crate::common::error::AppError;
use crate::common::retry::retry_async;
use crate::network::provider::HttpProvider;
use alloy::providers::Provider;
use alloy::rpc::types::BlockNumberOrTag;
use alloy::rpc::types::eth::FeeHistory;
use std::sync::{Arc, Mutex};
use std::time::Duration;

const DEFAULT_PRIORITY_FEE: u128 = 2_000_000_000;
const DEFAULT_BASE_FEE: u128 = 1_500_000_000;

#[derive(Clone)]
pub struct GasOracle {
    provider: HttpProvider,
    last_good: Arc<Mutex<Option<GasFees>>>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GasFees {
    pub max_fee_per_gas: u128,
    pub max_priority_fee_per_gas: u128,
    pub next_base_fee_per_gas: u128,
}

impl GasOracle {
    pub fn new(provider: HttpProvider) -> Self {
        Self {
            provider,
            last_good: Arc::new(Mutex::new(None)),
        }
    }

    pub async fn estimate_eip1559_fees(&self) -> Result<GasFees, AppError> {
        match self.with_retry_history().await {
            Ok(history) => {
                let fees = fees_from_history(&history)?;
                if let Ok(mut guard) = self.last_good.lock() {
                    *guard = Some(fees.clone());
                }
                Ok(fees)
            }
            Err(e) => {
                tracing::debug!(target: "gas", error = %e, "Fee history unavailable");
                if let Ok(guard) = self.last_good.lock()
                    && let Some(fees) = guard.clone()
                {
                    return Ok(fees);
                }
                self.fallback_estimate().await
            }
        }
    }

    async fn with_retry_history(&self) -> Result<FeeHistory, AppError> {
        let provider = self.provider.clone();
        retry_async(
            "fee_history",
            move |_| {
                let provider = provider.clone();
                async move {
                    provider
                        .get_fee_history(5, BlockNumberOrTag::Latest, &[50.0f64])
                        .await
                }
            },
            3,
            Duration::from_millis(100),
        )
        .await
        .map_err(|e| AppError::Connection(format!("Fee History failed: {}", e)))
    }

    /// Latest block base fee plus the node's suggested tip, for nodes without feeHistory.
    async fn fallback_estimate(&self) -> Result<GasFees, AppError> {
        let block = self
            .provider
            .get_block_by_number(BlockNumberOrTag::Latest)
            .await
            .map_err(|e| AppError::Connection(format!("Latest block fetch failed: {}", e)))?;

        let base: u128 = block
            .as_ref()
            .and_then(|b| b.header.base_fee_per_gas)
            .map(|v| v as u128)
            .unwrap_or(DEFAULT_BASE_FEE);

        let priority: u128 = self
            .provider
            .get_max_priority_fee_per_gas()
            .await
            .unwrap_or(DEFAULT_PRIORITY_FEE);

        let next_base = buffered_base(base);
        Ok(GasFees {
            max_fee_per_gas: next_base.saturating_add(priority),
            max_priority_fee_per_gas: priority,
            next_base_fee_per_gas: next_base,
        })
    }
}

// 12.5% is the most a base fee can rise in one block.
fn buffered_base(base: u128) -> u128 {
    base.saturating_mul(1125) / 1000
}

fn fees_from_history(history: &FeeHistory) -> Result<GasFees, AppError> {
    let latest_base_fee = history
        .latest_block_base_fee()
        .or_else(|| history.base_fee_per_gas.last().copied())
        .ok_or(AppError::Initialization("No base fee history".into()))?;

    let next_base_fee = match history.next_block_base_fee() {
        Some(0) | None => buffered_base(latest_base_fee),
        Some(next) => next,
    };

    let tips: Vec<u128> = history
        .reward
        .as_ref()
        .map(|rewards| rewards.iter().filter_map(|r| r.first().copied()).collect())
        .unwrap_or_default();
    let priority = if tips.is_empty() {
        DEFAULT_PRIORITY_FEE
    } else {
        tips.iter().sum::<u128>() / tips.len() as u128
    };

    Ok(GasFees {
        max_fee_per_gas: next_base_fee.saturating_add(priority),
        max_priority_fee_per_gas: priority,
        next_base_fee_per_gas: next_base_fee,
    })
}

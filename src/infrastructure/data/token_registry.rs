// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@oxidity.com>

use std::collections::{BTreeMap, HashMap};
use std::fs;

use alloy::primitives::Address;
use anyhow::{Context, anyhow, bail};
use serde::Deserialize;

use crate::domain::constants::{
    CHAIN_MONAD_TESTNET, CHOG_MONAD_TESTNET, DAK_MONAD_TESTNET, KB_MONAD_TESTNET,
    USDC_MONAD_TESTNET, USDT_MONAD_TESTNET, WMON_MONAD_TESTNET, YAKI_MONAD_TESTNET,
};
use crate::domain::error::{AppError, SwapError};
use crate::domain::swap::{OutcomeKey, TokenDescriptor};

/// Cyclic ordering of `domain` beginning at `start`.
///
/// `rotate(4, [1..=6])` yields `[4, 5, 6, 1, 2, 3]`.
pub fn rotate(start: OutcomeKey, domain: &[OutcomeKey]) -> Result<Vec<OutcomeKey>, SwapError> {
    let idx = domain
        .iter()
        .position(|k| *k == start)
        .ok_or(SwapError::UnknownKey(start))?;
    let mut order = Vec::with_capacity(domain.len());
    order.extend_from_slice(&domain[idx..]);
    order.extend_from_slice(&domain[..idx]);
    Ok(order)
}

/// Static sell token plus keyed buy-token candidates for one chain.
#[derive(Debug, Clone)]
pub struct TokenRegistry {
    chain_id: u64,
    sell_token: TokenDescriptor,
    candidates: BTreeMap<OutcomeKey, TokenDescriptor>,
}

#[derive(Deserialize)]
struct TokenEntry {
    address: String,
    symbol: String,
    decimals: u8,
    #[serde(default)]
    name: String,
}

impl TokenRegistry {
    pub fn new(
        chain_id: u64,
        sell_token: TokenDescriptor,
        candidates: Vec<TokenDescriptor>,
    ) -> Result<Self, AppError> {
        if candidates.is_empty() {
            return Err(AppError::Config(format!(
                "Token table for chain {chain_id} has no buy candidates"
            )));
        }
        if candidates.len() > OutcomeKey::MAX as usize {
            return Err(AppError::Config(format!(
                "Token table for chain {chain_id} has {} candidates; at most {} are supported",
                candidates.len(),
                OutcomeKey::MAX
            )));
        }
        let candidates = candidates
            .into_iter()
            .enumerate()
            .map(|(idx, token)| ((idx + 1) as OutcomeKey, token))
            .collect();
        Ok(Self {
            chain_id,
            sell_token,
            candidates,
        })
    }

    pub fn monad_testnet() -> Self {
        let candidates = [
            (USDT_MONAD_TESTNET, "USDT", 6, "USDT"),
            (USDC_MONAD_TESTNET, "USDC", 6, "USDC"),
            (DAK_MONAD_TESTNET, "DAK", 18, "DAK"),
            (CHOG_MONAD_TESTNET, "CHOG", 18, "CHOG"),
            (YAKI_MONAD_TESTNET, "YAKI", 18, "YAKI"),
            (KB_MONAD_TESTNET, "KB", 18, "KB"),
        ]
        .into_iter()
        .enumerate()
        .map(|(idx, (address, symbol, decimals, name))| {
            (
                (idx + 1) as OutcomeKey,
                TokenDescriptor::new(address, symbol, decimals, name),
            )
        })
        .collect();

        Self {
            chain_id: CHAIN_MONAD_TESTNET,
            sell_token: TokenDescriptor::new(WMON_MONAD_TESTNET, "WMON", 18, "Wrapped MON"),
            candidates,
        }
    }

    /// Built-in table for `chain_id`, if one ships with the binary.
    pub fn for_chain(chain_id: u64) -> Option<Self> {
        match chain_id {
            CHAIN_MONAD_TESTNET => Some(Self::monad_testnet()),
            _ => None,
        }
    }

    /// Load `{ "<chainId>": [sell, candidate1, candidate2, ...] }` and pick `chain_id`.
    pub fn load_from_file(path: &str, chain_id: u64) -> Result<Self, AppError> {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("Failed to read tokenlist {path}"))?;
        let registry =
            Self::from_json(&raw, chain_id).with_context(|| format!("Invalid tokenlist {path}"))?;
        Ok(registry)
    }

    fn from_json(raw: &str, chain_id: u64) -> anyhow::Result<Self> {
        let mut by_chain: HashMap<String, Vec<TokenEntry>> =
            serde_json::from_str(raw).context("tokenlist is not valid JSON")?;
        let entries = by_chain
            .remove(&chain_id.to_string())
            .ok_or_else(|| anyhow!("no entries for chain {chain_id}"))?;

        let mut tokens = Vec::with_capacity(entries.len());
        for entry in entries {
            let address = entry
                .address
                .parse::<Address>()
                .with_context(|| format!("token {} has bad address {}", entry.symbol, entry.address))?;
            tokens.push(TokenDescriptor {
                address,
                symbol: entry.symbol,
                decimals: entry.decimals,
                name: entry.name,
            });
        }
        if tokens.is_empty() {
            bail!("chain {chain_id} lists no tokens");
        }
        let sell_token = tokens.remove(0);
        Ok(Self::new(chain_id, sell_token, tokens)?)
    }

    pub fn chain_id(&self) -> u64 {
        self.chain_id
    }

    pub fn sell_token(&self) -> &TokenDescriptor {
        &self.sell_token
    }

    pub fn lookup(&self, key: OutcomeKey) -> Result<&TokenDescriptor, SwapError> {
        self.candidates.get(&key).ok_or(SwapError::UnknownKey(key))
    }

    /// Keys in ascending order.
    pub fn domain(&self) -> Vec<OutcomeKey> {
        self.candidates.keys().copied().collect()
    }

    pub fn rotation_from(&self, start: OutcomeKey) -> Result<Vec<OutcomeKey>, SwapError> {
        rotate(start, &self.domain())
    }

    pub fn len(&self) -> usize {
        self.candidates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }
}

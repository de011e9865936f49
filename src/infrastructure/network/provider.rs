// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@on1.no>

use crate::common::error::AppError;
use alloy::network::Ethereum;
use alloy::providers::{Provider, RootProvider};
use url::Url;

pub type HttpProvider = RootProvider<Ethereum>;

pub struct ConnectionFactory;

impl ConnectionFactory {
    pub fn http(rpc_url: &str) -> Result<HttpProvider, AppError> {
        let url =
            Url::parse(rpc_url).map_err(|e| AppError::Config(format!("Invalid RPC URL: {}", e)))?;
        Ok(RootProvider::new_http(url))
    }

    /// Connect and confirm the endpoint serves the chain the settings name.
    pub async fn http_for_chain(rpc_url: &str, chain_id: u64) -> Result<HttpProvider, AppError> {
        let provider = Self::http(rpc_url)?;
        let remote = provider
            .get_chain_id()
            .await
            .map_err(|e| AppError::Connection(format!("{rpc_url}: eth_chainId failed: {e}")))?;
        if remote != chain_id {
            return Err(AppError::Config(format!(
                "RPC {rpc_url} serves chain {remote}, settings expect {chain_id}"
            )));
        }
        Ok(provider)
    }
}

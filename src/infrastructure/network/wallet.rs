// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@oxidity.com>

use crate::common::constants::GAS_ESTIMATE_HEADROOM_BPS;
use crate::common::error::SwapError;
use crate::network::gas::GasOracle;
use crate::network::nonce::NonceManager;
use crate::network::provider::HttpProvider;
use alloy::consensus::{SignableTransaction, TxEip1559, TxEnvelope};
use alloy::dyn_abi::TypedData;
use alloy::eips::eip2718::Encodable2718;
use alloy::eips::eip2930::AccessList;
use alloy::network::TxSignerSync;
use alloy::primitives::{Address, B256, Bytes, TxKind, U256};
use alloy::providers::Provider;
use alloy::rpc::types::eth::{TransactionInput, TransactionRequest};
use alloy::signers::Signer;
use alloy::signers::local::PrivateKeySigner;
use async_trait::async_trait;
use futures::stream::{self, BoxStream, StreamExt};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::Mutex;
use tokio::time::sleep;

/// What the wallet is asked to broadcast.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionIntent {
    pub account: Address,
    pub to: Address,
    pub data: Bytes,
    pub value: U256,
    pub gas: Option<u64>,
    pub chain_id: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfirmationStatus {
    Pending,
    Confirmed { block: Option<u64> },
    Reverted { block: Option<u64> },
}

impl ConfirmationStatus {
    pub fn is_final(&self) -> bool {
        !matches!(self, ConfirmationStatus::Pending)
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum WalletError {
    #[error("Request rejected: {0}")]
    Rejected(String),

    #[error("Wallet disconnected")]
    Disconnected,

    #[error("Signer failure: {0}")]
    Signer(String),

    #[error("Wallet transport failure: {0}")]
    Transport(String),
}

/// Connected signing account.
#[async_trait]
pub trait WalletSession: Send + Sync {
    fn account(&self) -> Option<Address>;

    fn chain_id(&self) -> u64;

    /// 65-byte `r || s || v` signature over an EIP-712 payload.
    async fn sign_typed_data(&self, typed_data: &Value) -> Result<Bytes, WalletError>;

    async fn send_transaction(&self, intent: &TransactionIntent) -> Result<B256, WalletError>;

    /// Emits `Pending` first and ends after the first final status.
    fn watch_confirmation(&self, hash: B256) -> BoxStream<'static, ConfirmationStatus>;
}

/// Shared wallet access. Sign and send requests are serialized so only one
/// prompt is ever outstanding.
#[derive(Clone)]
pub struct WalletHandle {
    inner: Arc<dyn WalletSession>,
    gate: Arc<Mutex<()>>,
}

impl WalletHandle {
    pub fn new(session: Arc<dyn WalletSession>) -> Self {
        Self {
            inner: session,
            gate: Arc::new(Mutex::new(())),
        }
    }

    pub fn account(&self) -> Option<Address> {
        self.inner.account()
    }

    pub fn require_account(&self) -> Result<Address, SwapError> {
        self.inner.account().ok_or(SwapError::WalletDisconnected)
    }

    pub fn chain_id(&self) -> u64 {
        self.inner.chain_id()
    }

    pub async fn sign_typed_data(&self, typed_data: &Value) -> Result<Bytes, WalletError> {
        let _prompt = self.gate.lock().await;
        self.inner.sign_typed_data(typed_data).await
    }

    pub async fn send_transaction(&self, intent: &TransactionIntent) -> Result<B256, WalletError> {
        let _prompt = self.gate.lock().await;
        self.inner.send_transaction(intent).await
    }

    pub fn watch_confirmation(&self, hash: B256) -> BoxStream<'static, ConfirmationStatus> {
        self.inner.watch_confirmation(hash)
    }
}

fn receipt_is_confirmed(current_head: u64, receipt_block: u64, confirm_blocks: u64) -> bool {
    let needed_head = receipt_block.saturating_add(confirm_blocks.saturating_sub(1));
    current_head >= needed_head
}

fn with_headroom(estimate: u64) -> u64 {
    let padded = (estimate as u128).saturating_mul(GAS_ESTIMATE_HEADROOM_BPS as u128) / 10_000;
    u64::try_from(padded).unwrap_or(u64::MAX)
}

enum WatchState {
    Submitted,
    Polling,
    Done,
}

/// Private-key wallet broadcasting EIP-1559 transactions over HTTP RPC.
#[derive(Clone)]
pub struct LocalWallet {
    signer: PrivateKeySigner,
    provider: HttpProvider,
    nonce: NonceManager,
    gas: GasOracle,
    chain_id: u64,
    poll_interval: Duration,
    confirm_blocks: u64,
}

impl LocalWallet {
    pub fn new(
        signer: PrivateKeySigner,
        provider: HttpProvider,
        chain_id: u64,
        poll_interval: Duration,
        confirm_blocks: u64,
    ) -> Self {
        let nonce = NonceManager::new(provider.clone(), signer.address());
        let gas = GasOracle::new(provider.clone());
        Self {
            signer,
            provider,
            nonce,
            gas,
            chain_id,
            poll_interval,
            confirm_blocks: confirm_blocks.max(1),
        }
    }

    async fn gas_limit(&self, intent: &TransactionIntent) -> Result<u64, WalletError> {
        if let Some(gas) = intent.gas {
            return Ok(gas);
        }
        let request = TransactionRequest::default()
            .from(intent.account)
            .to(intent.to)
            .value(intent.value)
            .input(TransactionInput::new(intent.data.clone()));
        let estimate = self
            .provider
            .estimate_gas(request)
            .await
            .map_err(|e| WalletError::Rejected(format!("gas estimation failed: {e}")))?;
        Ok(with_headroom(estimate))
    }
}

#[async_trait]
impl WalletSession for LocalWallet {
    fn account(&self) -> Option<Address> {
        Some(self.signer.address())
    }

    fn chain_id(&self) -> u64 {
        self.chain_id
    }

    async fn sign_typed_data(&self, typed_data: &Value) -> Result<Bytes, WalletError> {
        let typed: TypedData = serde_json::from_value(typed_data.clone())
            .map_err(|e| WalletError::Signer(format!("typed data is malformed: {e}")))?;
        let sig = self
            .signer
            .sign_dynamic_typed_data(&typed)
            .await
            .map_err(|e| WalletError::Signer(e.to_string()))?;
        Ok(Bytes::from(sig.as_bytes().to_vec()))
    }

    async fn send_transaction(&self, intent: &TransactionIntent) -> Result<B256, WalletError> {
        if intent.account != self.signer.address() {
            return Err(WalletError::Rejected(format!(
                "intent account {:#x} is not the connected account",
                intent.account
            )));
        }
        if intent.chain_id != self.chain_id {
            return Err(WalletError::Rejected(format!(
                "intent targets chain {}, wallet is on {}",
                intent.chain_id, self.chain_id
            )));
        }

        let gas_limit = self.gas_limit(intent).await?;
        let fees = self
            .gas
            .estimate_eip1559_fees()
            .await
            .map_err(|e| WalletError::Transport(e.to_string()))?;
        let nonce = self
            .nonce
            .next_nonce()
            .await
            .map_err(|e| WalletError::Transport(e.to_string()))?;

        let mut tx = TxEip1559 {
            chain_id: self.chain_id,
            nonce,
            max_priority_fee_per_gas: fees.max_priority_fee_per_gas,
            max_fee_per_gas: fees.max_fee_per_gas,
            gas_limit,
            to: TxKind::Call(intent.to),
            value: intent.value,
            access_list: AccessList::default(),
            input: intent.data.clone(),
        };

        let sig = TxSignerSync::sign_transaction_sync(&self.signer, &mut tx)
            .map_err(|e| WalletError::Signer(format!("Sign tx failed: {e}")))?;
        let signed: TxEnvelope = tx.into_signed(sig).into();
        let hash = *signed.tx_hash();
        let raw = signed.encoded_2718();

        if let Err(e) = self.provider.send_raw_transaction(&raw).await {
            return Err(if e.is_error_resp() {
                WalletError::Rejected(e.to_string())
            } else {
                WalletError::Transport(e.to_string())
            });
        }
        self.nonce.mark_used(nonce);

        tracing::info!(
            target: "wallet",
            tx_hash = %format!("{hash:#x}"),
            nonce,
            gas_limit,
            max_fee = fees.max_fee_per_gas,
            "Transaction broadcast"
        );
        Ok(hash)
    }

    fn watch_confirmation(&self, hash: B256) -> BoxStream<'static, ConfirmationStatus> {
        let provider = self.provider.clone();
        let poll = self.poll_interval;
        let confirm_blocks = self.confirm_blocks;

        stream::unfold(WatchState::Submitted, move |state| {
            let provider = provider.clone();
            async move {
                match state {
                    WatchState::Done => None,
                    WatchState::Submitted => Some((ConfirmationStatus::Pending, WatchState::Polling)),
                    WatchState::Polling => loop {
                        sleep(poll).await;
                        match provider.get_transaction_receipt(hash).await {
                            Ok(Some(rcpt)) => {
                                let block = rcpt.block_number;
                                if !rcpt.status() {
                                    return Some((
                                        ConfirmationStatus::Reverted { block },
                                        WatchState::Done,
                                    ));
                                }
                                if let Some(receipt_block) = block {
                                    let head = provider.get_block_number().await.unwrap_or(0);
                                    if !receipt_is_confirmed(
                                        head.max(receipt_block),
                                        receipt_block,
                                        confirm_blocks,
                                    ) {
                                        continue;
                                    }
                                }
                                return Some((
                                    ConfirmationStatus::Confirmed { block },
                                    WatchState::Done,
                                ));
                            }
                            Ok(None) => continue,
                            Err(e) => {
                                tracing::debug!(
                                    target: "wallet",
                                    tx_hash = %format!("{hash:#x}"),
                                    error = %e,
                                    "Receipt poll failed"
                                );
                            }
                        }
                    },
                }
            }
        })
        .boxed()
    }
}

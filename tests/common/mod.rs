// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@oxidity.com>
#![allow(dead_code)]

use alloy::primitives::{Address, B256, Bytes, U256};
use async_trait::async_trait;
use diceswap::domain::swap::{
    Acquired, AllowanceIssue, AllowancePolicy, Mechanism, NoQuote, Quote, QuoteTerms,
    TradeRequest, TransactionSkeleton,
};
use diceswap::infrastructure::data::token_registry::TokenRegistry;
use diceswap::infrastructure::network::aggregator::QuoteSource;
use diceswap::infrastructure::network::wallet::{
    ConfirmationStatus, TransactionIntent, WalletError, WalletHandle, WalletSession,
};
use diceswap::services::swap::engine::SwapEngine;
use diceswap::services::swap::lifecycle::{LifecycleEvent, SwapState};
use futures::stream::{self, BoxStream, StreamExt};
use serde_json::{Value, json};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::broadcast;

type Hook = Mutex<Option<Box<dyn FnOnce() + Send>>>;

pub const TAKER: Address = Address::new([0xaa; 20]);
pub const SETTLER: Address = Address::new([0x5e; 20]);
pub const SPENDER: Address = Address::new([0x77; 20]);

pub fn calldata() -> Bytes {
    Bytes::from(vec![0xc0, 0xff, 0xee, 0x00, 0x01, 0x02, 0x03, 0x04])
}

fn skeleton() -> TransactionSkeleton {
    TransactionSkeleton {
        to: SETTLER,
        data: calldata(),
        value: Some(U256::ZERO),
        gas: Some(300_000),
    }
}

pub fn permit_typed_data() -> Value {
    json!({
        "types": {
            "EIP712Domain": [{"name": "name", "type": "string"}],
            "PermitTransferFrom": [{"name": "nonce", "type": "uint256"}]
        },
        "primaryType": "PermitTransferFrom",
        "domain": {"name": "Permit2"},
        "message": {"nonce": "1"}
    })
}

pub fn permit_quote() -> Acquired {
    Acquired::Quote(Quote {
        transaction: skeleton(),
        terms: QuoteTerms::SignedPermit {
            typed_data: Some(permit_typed_data()),
            signature: None,
        },
        buy_amount: Some(U256::from(1_000u64)),
    })
}

pub fn allowance_quote(missing_allowance: bool) -> Acquired {
    let allowance_issue = missing_allowance.then_some(AllowanceIssue {
        spender: SPENDER,
        actual: Some(U256::ZERO),
    });
    Acquired::Quote(Quote {
        transaction: skeleton(),
        terms: QuoteTerms::AutoAllowance { allowance_issue },
        buy_amount: Some(U256::from(1_000u64)),
    })
}

pub fn classic_quote() -> Acquired {
    Acquired::Quote(Quote {
        transaction: skeleton(),
        terms: QuoteTerms::Classic,
        buy_amount: None,
    })
}

/// Answers from a fixed table keyed by buy symbol and mechanism; everything
/// else is "no route".
#[derive(Default)]
pub struct ScriptedSource {
    responses: HashMap<(String, Mechanism), Acquired>,
    calls: Mutex<Vec<(String, Mechanism)>>,
    on_first_acquire: Hook,
}

impl ScriptedSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn respond(mut self, symbol: &str, mechanism: Mechanism, acquired: Acquired) -> Self {
        self.responses.insert((symbol.to_string(), mechanism), acquired);
        self
    }

    /// Run `hook` inside the first `acquire`, before it answers.
    pub fn on_first_acquire(&self, hook: impl FnOnce() + Send + 'static) {
        *self.on_first_acquire.lock().unwrap() = Some(Box::new(hook));
    }

    pub fn calls(&self) -> Vec<(String, Mechanism)> {
        self.calls.lock().unwrap().clone()
    }

    pub fn queried_symbols(&self) -> Vec<String> {
        let mut out: Vec<String> = Vec::new();
        for (symbol, _) in self.calls() {
            if out.last() != Some(&symbol) {
                out.push(symbol);
            }
        }
        out
    }
}

#[async_trait]
impl QuoteSource for ScriptedSource {
    async fn acquire(&self, mechanism: Mechanism, request: &TradeRequest) -> Acquired {
        let symbol = request.buy_token.symbol.clone();
        self.calls.lock().unwrap().push((symbol.clone(), mechanism));
        let hook = self.on_first_acquire.lock().unwrap().take();
        if let Some(hook) = hook {
            hook();
        }
        self.responses
            .get(&(symbol, mechanism))
            .cloned()
            .unwrap_or_else(|| Acquired::NoQuote(NoQuote::Unavailable("no route".into())))
    }
}

pub struct ScriptedWallet {
    account: Option<Address>,
    signature: Result<Bytes, WalletError>,
    send_failure: Option<WalletError>,
    confirmations: Vec<ConfirmationStatus>,
    sign_calls: AtomicUsize,
    sent: Mutex<Vec<TransactionIntent>>,
    on_send: Hook,
}

impl ScriptedWallet {
    pub fn connected() -> Self {
        Self {
            account: Some(TAKER),
            signature: Ok(Bytes::from(vec![0x1b; 65])),
            send_failure: None,
            confirmations: vec![
                ConfirmationStatus::Pending,
                ConfirmationStatus::Confirmed { block: Some(42) },
            ],
            sign_calls: AtomicUsize::new(0),
            sent: Mutex::new(Vec::new()),
            on_send: Mutex::new(None),
        }
    }

    pub fn disconnected() -> Self {
        Self {
            account: None,
            ..Self::connected()
        }
    }

    pub fn with_signature(mut self, signature: Result<Bytes, WalletError>) -> Self {
        self.signature = signature;
        self
    }

    pub fn with_send_failure(mut self, error: WalletError) -> Self {
        self.send_failure = Some(error);
        self
    }

    pub fn with_confirmations(mut self, confirmations: Vec<ConfirmationStatus>) -> Self {
        self.confirmations = confirmations;
        self
    }

    /// Run `hook` inside the next `send_transaction`, before the hash is returned.
    pub fn on_send(&self, hook: impl FnOnce() + Send + 'static) {
        *self.on_send.lock().unwrap() = Some(Box::new(hook));
    }

    pub fn sign_calls(&self) -> usize {
        self.sign_calls.load(Ordering::SeqCst)
    }

    pub fn sent(&self) -> Vec<TransactionIntent> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl WalletSession for ScriptedWallet {
    fn account(&self) -> Option<Address> {
        self.account
    }

    fn chain_id(&self) -> u64 {
        10143
    }

    async fn sign_typed_data(&self, _typed_data: &Value) -> Result<Bytes, WalletError> {
        self.sign_calls.fetch_add(1, Ordering::SeqCst);
        self.signature.clone()
    }

    async fn send_transaction(&self, intent: &TransactionIntent) -> Result<B256, WalletError> {
        if let Some(err) = &self.send_failure {
            return Err(err.clone());
        }
        let hook = self.on_send.lock().unwrap().take();
        if let Some(hook) = hook {
            hook();
        }
        let mut sent = self.sent.lock().unwrap();
        sent.push(intent.clone());
        Ok(B256::with_last_byte(sent.len() as u8))
    }

    fn watch_confirmation(&self, _hash: B256) -> BoxStream<'static, ConfirmationStatus> {
        stream::iter(self.confirmations.clone()).boxed()
    }
}

pub fn engine(
    source: Arc<ScriptedSource>,
    wallet: Arc<ScriptedWallet>,
    policy: AllowancePolicy,
) -> SwapEngine {
    SwapEngine::new(
        Arc::new(TokenRegistry::monad_testnet()),
        source,
        WalletHandle::new(wallet),
        policy,
    )
}

pub fn drain_states(rx: &mut broadcast::Receiver<LifecycleEvent>) -> Vec<(u64, SwapState)> {
    let mut out = Vec::new();
    while let Ok(event) = rx.try_recv() {
        out.push((event.generation, event.state));
    }
    out
}

// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@oxidity.com>

use crate::domain::error::SwapError;
use crate::domain::swap::Quote;
use crate::network::wallet::{
    ConfirmationStatus, TransactionIntent, WalletError, WalletHandle,
};
use alloy::primitives::{B256, U256};
use futures::StreamExt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;

/// States of one user-triggered swap.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SwapState {
    Idle,
    SelectingOutcome,
    Resolving,
    AwaitingSignature,
    Submitting,
    Confirming { hash: B256 },
    Confirmed { hash: B256, block: Option<u64> },
    Failed { reason: String },
}

impl SwapState {
    pub fn name(&self) -> &'static str {
        match self {
            SwapState::Idle => "idle",
            SwapState::SelectingOutcome => "selecting_outcome",
            SwapState::Resolving => "resolving",
            SwapState::AwaitingSignature => "awaiting_signature",
            SwapState::Submitting => "submitting",
            SwapState::Confirming { .. } => "confirming",
            SwapState::Confirmed { .. } => "confirmed",
            SwapState::Failed { .. } => "failed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, SwapState::Confirmed { .. } | SwapState::Failed { .. })
    }

    pub fn can_transition_to(&self, next: &SwapState) -> bool {
        use SwapState::*;
        if self.is_terminal() {
            return false;
        }
        matches!(
            (self, next),
            (_, Failed { .. })
                | (Idle, SelectingOutcome)
                | (Idle, Resolving)
                | (SelectingOutcome, Resolving)
                | (Resolving, AwaitingSignature)
                | (Resolving, Submitting)
                | (AwaitingSignature, Resolving)
                | (AwaitingSignature, Submitting)
                | (Submitting, Confirming { .. })
                | (Confirming { .. }, Confirmed { .. })
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LifecycleEvent {
    pub generation: u64,
    pub state: SwapState,
}

/// The one active lifecycle of a session.
///
/// Transitions are validated; once the session moves to a newer generation
/// every call fails with `Superseded` and nothing more is published.
pub struct LifecycleHandle {
    generation: u64,
    current: Arc<AtomicU64>,
    cancel: CancellationToken,
    events: broadcast::Sender<LifecycleEvent>,
    state: SwapState,
}

impl LifecycleHandle {
    pub(crate) fn new(
        generation: u64,
        current: Arc<AtomicU64>,
        cancel: CancellationToken,
        events: broadcast::Sender<LifecycleEvent>,
    ) -> Self {
        Self {
            generation,
            current,
            cancel,
            events,
            state: SwapState::Idle,
        }
    }

    /// Handle outside any session, for driving the engine directly.
    pub fn detached() -> Self {
        let (events, _) = broadcast::channel(1);
        Self::new(
            0,
            Arc::new(AtomicU64::new(0)),
            CancellationToken::new(),
            events,
        )
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn state(&self) -> &SwapState {
        &self.state
    }

    pub fn cancellation(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub fn is_superseded(&self) -> bool {
        self.cancel.is_cancelled() || self.current.load(Ordering::SeqCst) != self.generation
    }

    pub fn ensure_active(&self) -> Result<(), SwapError> {
        if self.is_superseded() {
            return Err(SwapError::Superseded);
        }
        Ok(())
    }

    pub fn transition(&mut self, next: SwapState) -> Result<(), SwapError> {
        self.ensure_active()?;
        if !self.state.can_transition_to(&next) {
            return Err(SwapError::InvalidTransition {
                from: self.state.name(),
                to: next.name(),
            });
        }
        tracing::debug!(
            target: "lifecycle",
            generation = self.generation,
            from = self.state.name(),
            to = next.name(),
            "Swap state"
        );
        self.state = next;
        let _ = self.events.send(LifecycleEvent {
            generation: self.generation,
            state: self.state.clone(),
        });
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TrackerState {
    Idle,
    Submitted(B256),
    Confirming(B256),
    Confirmed { hash: B256, block: Option<u64> },
    Failed(String),
}

/// Submits exactly one transaction and follows it to a final status.
pub struct TransactionTracker {
    wallet: WalletHandle,
    state: TrackerState,
}

impl TransactionTracker {
    pub fn new(wallet: WalletHandle) -> Self {
        Self {
            wallet,
            state: TrackerState::Idle,
        }
    }

    pub fn state(&self) -> &TrackerState {
        &self.state
    }

    pub fn intent_for(&self, quote: &Quote) -> Result<TransactionIntent, SwapError> {
        let account = self.wallet.require_account()?;
        Ok(TransactionIntent {
            account,
            to: quote.transaction.to,
            data: quote.transaction.data.clone(),
            value: quote.transaction.value.unwrap_or(U256::ZERO),
            gas: quote.transaction.gas,
            chain_id: self.wallet.chain_id(),
        })
    }

    pub async fn submit(&mut self, quote: &Quote) -> Result<B256, SwapError> {
        let intent = self.intent_for(quote)?;
        self.submit_intent(&intent).await
    }

    pub async fn submit_intent(&mut self, intent: &TransactionIntent) -> Result<B256, SwapError> {
        if self.state != TrackerState::Idle {
            return Err(SwapError::InvalidTransition {
                from: "submitted",
                to: "submitted",
            });
        }
        match self.wallet.send_transaction(intent).await {
            Ok(hash) => {
                tracing::info!(
                    target: "lifecycle",
                    tx_hash = %format!("{hash:#x}"),
                    to = %format!("{:#x}", intent.to),
                    "Transaction submitted"
                );
                self.state = TrackerState::Submitted(hash);
                Ok(hash)
            }
            Err(e) => {
                tracing::warn!(target: "lifecycle", error = %e, "Submission rejected");
                self.state = TrackerState::Failed(e.to_string());
                Err(match e {
                    WalletError::Disconnected => SwapError::WalletDisconnected,
                    other => SwapError::SubmissionRejected(other.to_string()),
                })
            }
        }
    }

    /// Follow the wallet's confirmation stream. A stream that ends early
    /// leaves the tracker where it was; there is no timeout here.
    pub async fn observe(&mut self, hash: B256) -> &TrackerState {
        let mut updates = self.wallet.watch_confirmation(hash);
        while let Some(status) = updates.next().await {
            self.state = match status {
                ConfirmationStatus::Pending => TrackerState::Confirming(hash),
                ConfirmationStatus::Confirmed { block } => TrackerState::Confirmed { hash, block },
                ConfirmationStatus::Reverted { block } => {
                    let at = block.map_or_else(|| "unknown block".to_string(), |b| format!("block {b}"));
                    TrackerState::Failed(format!("transaction {hash:#x} reverted in {at}"))
                }
            };
            if status.is_final() {
                break;
            }
        }
        match &self.state {
            TrackerState::Confirmed { block, .. } => tracing::info!(
                target: "lifecycle",
                tx_hash = %format!("{hash:#x}"),
                block = ?block,
                "Transaction confirmed"
            ),
            TrackerState::Failed(reason) => {
                tracing::warn!(target: "lifecycle", reason = %reason, "Transaction failed")
            }
            other => tracing::debug!(
                target: "lifecycle",
                tx_hash = %format!("{hash:#x}"),
                state = ?other,
                "Confirmation stream ended without a final status"
            ),
        }
        &self.state
    }
}

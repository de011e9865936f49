// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@oxidity.com>

use crate::domain::error::SwapError;
use crate::domain::swap::{
    AllowanceIssue, AllowancePolicy, Mechanism, OutcomeKey, Resolution, ResolutionAttempt,
    TradeTemplate,
};
use crate::data::token_registry::TokenRegistry;
use crate::network::aggregator::QuoteSource;
use crate::network::wallet::{TransactionIntent, WalletHandle};
use crate::services::swap::lifecycle::{
    LifecycleHandle, SwapState, TrackerState, TransactionTracker,
};
use crate::services::swap::resolver::StrategyResolver;
use alloy::primitives::{B256, Bytes, U256};
use alloy::sol;
use alloy::sol_types::SolCall;
use std::fmt;
use std::sync::Arc;

sol! {
    interface IERC20 {
        function approve(address spender, uint256 amount) external returns (bool);
    }
}

#[derive(Debug, Clone)]
pub struct SwapReport {
    pub face: OutcomeKey,
    pub sell_amount: String,
    pub sell_symbol: String,
    pub buy_symbol: String,
    pub mechanism: Mechanism,
    pub approval_hash: Option<B256>,
    pub tx_hash: Option<B256>,
    pub final_state: SwapState,
    pub attempts: Vec<ResolutionAttempt>,
}

impl SwapReport {
    pub fn succeeded(&self) -> bool {
        match self.final_state {
            SwapState::Confirmed { .. } => true,
            SwapState::Failed { .. } => false,
            // Dry runs and unconfirmed broadcasts did not fail.
            _ => true,
        }
    }
}

impl fmt::Display for SwapReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Rolled {}. Swapped {} {} → {}",
            self.face, self.sell_amount, self.sell_symbol, self.buy_symbol
        )?;
        match (&self.tx_hash, &self.final_state) {
            (None, _) => write!(f, " (dry run via {})", self.mechanism),
            (Some(hash), SwapState::Failed { reason }) => write!(f, " (tx {hash:#x} failed: {reason})"),
            (Some(hash), _) => write!(f, " (tx {hash:#x})"),
        }
    }
}

/// Resolve, optionally approve, submit and track one swap.
pub struct SwapEngine {
    registry: Arc<TokenRegistry>,
    resolver: StrategyResolver,
    wallet: WalletHandle,
    dry_run: bool,
}

impl SwapEngine {
    pub fn new(
        registry: Arc<TokenRegistry>,
        source: Arc<dyn QuoteSource>,
        wallet: WalletHandle,
        policy: AllowancePolicy,
    ) -> Self {
        let resolver = StrategyResolver::new(registry.clone(), source, wallet.clone(), policy);
        Self {
            registry,
            resolver,
            wallet,
            dry_run: false,
        }
    }

    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    pub fn registry(&self) -> &TokenRegistry {
        &self.registry
    }

    pub async fn execute(
        &self,
        start: OutcomeKey,
        sell_amount: &str,
        life: &mut LifecycleHandle,
    ) -> Result<SwapReport, SwapError> {
        let result = self.run(start, sell_amount, life).await;
        if let Err(e) = &result
            && *e != SwapError::Superseded
            && !life.state().is_terminal()
        {
            let _ = life.transition(SwapState::Failed {
                reason: e.to_string(),
            });
        }
        result
    }

    async fn run(
        &self,
        start: OutcomeKey,
        sell_amount: &str,
        life: &mut LifecycleHandle,
    ) -> Result<SwapReport, SwapError> {
        life.ensure_active()?;
        let taker = self.wallet.require_account()?;
        let rotation = self.registry.rotation_from(start)?;
        let template = TradeTemplate::from_human_amount(
            self.registry.sell_token().clone(),
            sell_amount,
            taker,
            self.registry.chain_id(),
        )?;

        tracing::info!(
            target: "resolver",
            face = start,
            amount = sell_amount,
            sell = %template.sell_token.symbol,
            "Resolving swap"
        );
        life.transition(SwapState::Resolving)?;
        let (quote, buy_token, attempts) =
            match self.resolver.resolve(&template, &rotation, life).await? {
                Resolution::Resolved {
                    quote,
                    buy_token,
                    attempts,
                    ..
                } => (quote, buy_token, attempts),
                Resolution::Exhausted { attempts } => {
                    return Err(SwapError::Exhausted {
                        attempts: attempts.len(),
                    });
                }
            };
        life.ensure_active()?;

        let mut report = SwapReport {
            face: start,
            sell_amount: sell_amount.to_string(),
            sell_symbol: template.sell_token.symbol.clone(),
            buy_symbol: buy_token.symbol.clone(),
            mechanism: quote.mechanism(),
            approval_hash: None,
            tx_hash: None,
            final_state: life.state().clone(),
            attempts,
        };

        if self.dry_run {
            tracing::info!(
                target: "lifecycle",
                to = %format!("{:#x}", quote.transaction.to),
                calldata_len = quote.transaction.data.len(),
                "Dry-run: would submit swap"
            );
            return Ok(report);
        }

        life.transition(SwapState::Submitting)?;
        if self.resolver.policy() == AllowancePolicy::Approve
            && let Some(issue) = quote.allowance_issue()
        {
            report.approval_hash = Some(self.approve(&template, issue).await?);
            life.ensure_active()?;
        }

        let mut tracker = TransactionTracker::new(self.wallet.clone());
        let hash = tracker.submit(&quote).await?;
        report.tx_hash = Some(hash);

        // The transaction is out; a newer trigger no longer discards the report.
        match Self::follow(&mut tracker, hash, life).await {
            Err(SwapError::Superseded) => tracing::warn!(
                target: "lifecycle",
                tx_hash = %format!("{hash:#x}"),
                generation = life.generation(),
                "Superseded after broadcast; no longer tracking"
            ),
            other => other?,
        }
        report.final_state = life.state().clone();
        Ok(report)
    }

    async fn follow(
        tracker: &mut TransactionTracker,
        hash: B256,
        life: &mut LifecycleHandle,
    ) -> Result<(), SwapError> {
        life.transition(SwapState::Confirming { hash })?;
        match tracker.observe(hash).await.clone() {
            TrackerState::Confirmed { block, .. } => {
                life.transition(SwapState::Confirmed { hash, block })
            }
            TrackerState::Failed(reason) => life.transition(SwapState::Failed { reason }),
            _ => Ok(()),
        }
    }

    /// `approve(spender, MAX)` on the sell token, waited on before the swap.
    async fn approve(
        &self,
        template: &TradeTemplate,
        issue: &AllowanceIssue,
    ) -> Result<B256, SwapError> {
        let call = IERC20::approveCall {
            spender: issue.spender,
            amount: U256::MAX,
        };
        let intent = TransactionIntent {
            account: template.taker,
            to: template.sell_token.address,
            data: Bytes::from(call.abi_encode()),
            value: U256::ZERO,
            gas: None,
            chain_id: template.chain_id,
        };
        tracing::info!(
            target: "lifecycle",
            token = %template.sell_token.symbol,
            spender = %format!("{:#x}", issue.spender),
            "Approving spender"
        );

        let mut tracker = TransactionTracker::new(self.wallet.clone());
        let hash = tracker.submit_intent(&intent).await?;
        match tracker.observe(hash).await {
            TrackerState::Confirmed { .. } => Ok(hash),
            TrackerState::Failed(reason) => Err(SwapError::SubmissionRejected(format!(
                "approval failed: {reason}"
            ))),
            _ => Err(SwapError::SubmissionRejected(format!(
                "approval {hash:#x} was not confirmed"
            ))),
        }
    }
}

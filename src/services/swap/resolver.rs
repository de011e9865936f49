// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@oxidity.com>

use crate::domain::error::SwapError;
use crate::domain::swap::{
    Acquired, AllowancePolicy, AttemptOutcome, Mechanism, NoQuote, OutcomeKey, Quote,
    Resolution, ResolutionAttempt, TradeTemplate,
};
use crate::data::token_registry::TokenRegistry;
use crate::network::aggregator::QuoteSource;
use crate::network::wallet::WalletHandle;
use crate::services::swap::augment::augment;
use crate::services::swap::lifecycle::{LifecycleHandle, SwapState};
use std::sync::Arc;

/// Walks candidates in rotation order and, per candidate, mechanisms in
/// priority order; the first executable quote wins.
pub struct StrategyResolver {
    registry: Arc<TokenRegistry>,
    source: Arc<dyn QuoteSource>,
    wallet: WalletHandle,
    policy: AllowancePolicy,
}

impl StrategyResolver {
    pub fn new(
        registry: Arc<TokenRegistry>,
        source: Arc<dyn QuoteSource>,
        wallet: WalletHandle,
        policy: AllowancePolicy,
    ) -> Self {
        Self {
            registry,
            source,
            wallet,
            policy,
        }
    }

    pub fn policy(&self) -> AllowancePolicy {
        self.policy
    }

    pub async fn resolve(
        &self,
        template: &TradeTemplate,
        rotation: &[OutcomeKey],
        life: &mut LifecycleHandle,
    ) -> Result<Resolution, SwapError> {
        let mut attempts = Vec::with_capacity(rotation.len() * Mechanism::PRIORITY.len());

        for &key in rotation {
            let buy_token = self.registry.lookup(key)?;
            let request = template.for_buy_token(buy_token);
            if let Err(e) = request.validate() {
                tracing::warn!(
                    target: "resolver",
                    candidate = key,
                    symbol = %buy_token.symbol,
                    error = %e,
                    "Skipping candidate"
                );
                continue;
            }

            for mechanism in Mechanism::PRIORITY {
                life.ensure_active()?;
                let mut record = |outcome: AttemptOutcome| {
                    attempts.push(ResolutionAttempt {
                        candidate: key,
                        symbol: buy_token.symbol.clone(),
                        mechanism,
                        outcome,
                    })
                };

                let quote = match self.source.acquire(mechanism, &request).await {
                    Acquired::Quote(quote) => quote,
                    Acquired::NoQuote(reason) => {
                        tracing::debug!(
                            target: "resolver",
                            candidate = key,
                            symbol = %buy_token.symbol,
                            mechanism = %mechanism,
                            reason = %reason,
                            "Attempt failed"
                        );
                        record(AttemptOutcome::NoQuote(reason));
                        continue;
                    }
                };

                let quote = match self.apply_allowance_policy(quote) {
                    Ok(quote) => quote,
                    Err(reason) => {
                        tracing::debug!(
                            target: "resolver",
                            candidate = key,
                            mechanism = %mechanism,
                            reason = %reason,
                            "Attempt needs an approval"
                        );
                        record(AttemptOutcome::NoQuote(reason));
                        continue;
                    }
                };

                let quote = if quote.requires_signature() {
                    life.ensure_active()?;
                    life.transition(SwapState::AwaitingSignature)?;
                    match augment(quote, &self.wallet).await {
                        Ok(signed) => signed,
                        Err(e) => {
                            tracing::info!(
                                target: "resolver",
                                candidate = key,
                                error = %e,
                                "Permit signature not obtained; trying next mechanism"
                            );
                            record(AttemptOutcome::RequestFailed(e.to_string()));
                            life.transition(SwapState::Resolving)?;
                            continue;
                        }
                    }
                } else {
                    quote
                };

                record(AttemptOutcome::Success);
                tracing::info!(
                    target: "resolver",
                    candidate = key,
                    symbol = %buy_token.symbol,
                    mechanism = %mechanism,
                    attempts = attempts.len(),
                    "Resolved"
                );
                return Ok(Resolution::Resolved {
                    quote,
                    candidate: key,
                    buy_token: buy_token.clone(),
                    attempts,
                });
            }
        }

        tracing::warn!(target: "resolver", attempts = attempts.len(), "No tradable pair found");
        Ok(Resolution::Exhausted { attempts })
    }

    fn apply_allowance_policy(&self, quote: Quote) -> Result<Quote, NoQuote> {
        let Some(issue) = quote.allowance_issue() else {
            return Ok(quote);
        };
        match self.policy {
            AllowancePolicy::Skip => Err(NoQuote::AllowanceRequired {
                spender: issue.spender,
            }),
            AllowancePolicy::Approve => Ok(quote),
            AllowancePolicy::Ignore => {
                tracing::warn!(
                    target: "resolver",
                    spender = %format!("{:#x}", issue.spender),
                    "Allowance missing; submitting anyway"
                );
                Ok(quote)
            }
        }
    }
}

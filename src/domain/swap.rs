// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@oxidity.com>

use crate::domain::error::SwapError;
use alloy::primitives::utils::parse_units;
use alloy::primitives::{Address, Bytes, U256};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Key into the candidate table (a die face).
pub type OutcomeKey = u8;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenDescriptor {
    pub address: Address,
    pub symbol: String,
    pub decimals: u8,
    #[serde(default)]
    pub name: String,
}

impl TokenDescriptor {
    pub fn new(address: Address, symbol: &str, decimals: u8, name: &str) -> Self {
        Self {
            address,
            symbol: symbol.to_string(),
            decimals,
            name: name.to_string(),
        }
    }
}

/// Sell side of a swap, fixed across every candidate the resolver tries.
#[derive(Debug, Clone)]
pub struct TradeTemplate {
    pub sell_token: TokenDescriptor,
    pub sell_amount_base_units: U256,
    pub taker: Address,
    pub chain_id: u64,
}

impl TradeTemplate {
    /// Scale a human amount ("0.1234") by the sell token's decimals.
    pub fn from_human_amount(
        sell_token: TokenDescriptor,
        amount: &str,
        taker: Address,
        chain_id: u64,
    ) -> Result<Self, SwapError> {
        let parsed = parse_units(amount.trim(), sell_token.decimals).map_err(|e| {
            SwapError::InvalidRequest(format!("sell amount {amount:?} is not a decimal: {e}"))
        })?;
        let negative = parsed.is_negative();
        let base_units = parsed.get_absolute();
        if negative || base_units.is_zero() {
            return Err(SwapError::InvalidRequest(format!(
                "sell amount {amount:?} must be positive"
            )));
        }
        Ok(Self {
            sell_token,
            sell_amount_base_units: base_units,
            taker,
            chain_id,
        })
    }

    pub fn for_buy_token(&self, buy_token: &TokenDescriptor) -> TradeRequest {
        TradeRequest {
            sell_token: self.sell_token.clone(),
            buy_token: buy_token.clone(),
            sell_amount_base_units: self.sell_amount_base_units,
            taker: self.taker,
            chain_id: self.chain_id,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TradeRequest {
    pub sell_token: TokenDescriptor,
    pub buy_token: TokenDescriptor,
    pub sell_amount_base_units: U256,
    pub taker: Address,
    pub chain_id: u64,
}

impl TradeRequest {
    pub fn validate(&self) -> Result<(), SwapError> {
        if self.sell_amount_base_units.is_zero() {
            return Err(SwapError::InvalidRequest("sell amount is zero".into()));
        }
        if self.sell_token.address == self.buy_token.address {
            return Err(SwapError::InvalidRequest(format!(
                "sell and buy token are both {}",
                self.sell_token.symbol
            )));
        }
        Ok(())
    }
}

/// Execution mechanisms, in the order the resolver tries them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Mechanism {
    SignedPermit,
    AutoAllowance,
    Classic,
}

impl Mechanism {
    pub const PRIORITY: [Mechanism; 3] = [
        Mechanism::SignedPermit,
        Mechanism::AutoAllowance,
        Mechanism::Classic,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Mechanism::SignedPermit => "permit2",
            Mechanism::AutoAllowance => "allowance_holder",
            Mechanism::Classic => "classic",
        }
    }
}

impl fmt::Display for Mechanism {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionSkeleton {
    pub to: Address,
    pub data: Bytes,
    pub value: Option<U256>,
    pub gas: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AllowanceIssue {
    pub spender: Address,
    pub actual: Option<U256>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum QuoteTerms {
    SignedPermit {
        typed_data: Option<serde_json::Value>,
        signature: Option<Bytes>,
    },
    AutoAllowance {
        allowance_issue: Option<AllowanceIssue>,
    },
    Classic,
}

/// Executable quote normalized to the common transaction shape.
#[derive(Debug, Clone, PartialEq)]
pub struct Quote {
    pub transaction: TransactionSkeleton,
    pub terms: QuoteTerms,
    pub buy_amount: Option<U256>,
}

impl Quote {
    pub fn mechanism(&self) -> Mechanism {
        match self.terms {
            QuoteTerms::SignedPermit { .. } => Mechanism::SignedPermit,
            QuoteTerms::AutoAllowance { .. } => Mechanism::AutoAllowance,
            QuoteTerms::Classic => Mechanism::Classic,
        }
    }

    pub fn typed_data_to_sign(&self) -> Option<&serde_json::Value> {
        match &self.terms {
            QuoteTerms::SignedPermit {
                typed_data: Some(data),
                signature: None,
            } => Some(data),
            _ => None,
        }
    }

    pub fn requires_signature(&self) -> bool {
        self.typed_data_to_sign().is_some()
    }

    pub fn allowance_issue(&self) -> Option<&AllowanceIssue> {
        match &self.terms {
            QuoteTerms::AutoAllowance { allowance_issue } => allowance_issue.as_ref(),
            _ => None,
        }
    }
}

/// Why an attempt produced nothing executable. All variants are recoverable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NoQuote {
    Unavailable(String),
    AllowanceRequired { spender: Address },
    TransportFault(String),
}

impl fmt::Display for NoQuote {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NoQuote::Unavailable(reason) => write!(f, "no quote: {reason}"),
            NoQuote::AllowanceRequired { spender } => {
                write!(f, "allowance required for spender {spender:#x}")
            }
            NoQuote::TransportFault(reason) => write!(f, "transport fault: {reason}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Acquired {
    Quote(Quote),
    NoQuote(NoQuote),
}

#[derive(Debug, Clone, PartialEq)]
pub enum AttemptOutcome {
    Success,
    NoQuote(NoQuote),
    RequestFailed(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ResolutionAttempt {
    pub candidate: OutcomeKey,
    pub symbol: String,
    pub mechanism: Mechanism,
    pub outcome: AttemptOutcome,
}

#[derive(Debug, Clone)]
pub enum Resolution {
    Resolved {
        quote: Quote,
        candidate: OutcomeKey,
        buy_token: TokenDescriptor,
        attempts: Vec<ResolutionAttempt>,
    },
    Exhausted {
        attempts: Vec<ResolutionAttempt>,
    },
}

impl Resolution {
    pub fn attempts(&self) -> &[ResolutionAttempt] {
        match self {
            Resolution::Resolved { attempts, .. } | Resolution::Exhausted { attempts } => attempts,
        }
    }
}

/// What to do when the allowance-holder path reports a missing approval.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AllowancePolicy {
    /// Treat the quote as unavailable and keep searching.
    #[default]
    Skip,
    /// Send an approval for the spender before the swap.
    Approve,
    /// Log the issue and submit the quote anyway.
    Ignore,
}

impl FromStr for AllowancePolicy {
    type Err = String;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "skip" => Ok(AllowancePolicy::Skip),
            "approve" => Ok(AllowancePolicy::Approve),
            "ignore" => Ok(AllowancePolicy::Ignore),
            other => Err(format!(
                "unknown allowance policy {other:?} (expected skip, approve or ignore)"
            )),
        }
    }
}

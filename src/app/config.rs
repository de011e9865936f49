// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@mitander.dev>

use crate::domain::constants;
use crate::domain::error::AppError;
use crate::domain::swap::AllowancePolicy;
use crate::data::token_registry::TokenRegistry;
use crate::network::aggregator::AggregatorEndpoints;
use crate::services::swap::outcome::SellAmount;
use alloy::primitives::Address;
use alloy::signers::local::PrivateKeySigner;
use config::{Config, Environment, File};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

#[derive(Debug, Deserialize, Clone)]
pub struct GlobalSettings {
    // General
    #[serde(default = "default_debug")]
    pub debug: bool,
    #[serde(default = "default_false")]
    pub log_json: bool,
    #[serde(default = "default_chain_id")]
    pub chain_id: u64,
    pub rpc_url: Option<String>,

    // Identity
    #[serde(default)]
    pub wallet_key: String,
    pub wallet_address: Option<Address>,

    // Aggregator
    #[serde(default = "default_aggregator_url")]
    pub aggregator_url: String,
    pub aggregator_api_key: Option<String>,
    #[serde(default = "default_aggregator_version")]
    pub aggregator_version: String,
    pub permit2_quote_path: Option<String>,
    pub allowance_holder_price_path: Option<String>,
    pub allowance_holder_quote_path: Option<String>,
    pub classic_quote_path: Option<String>,
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,

    // Tokens and policy
    pub tokenlist_path: Option<String>,
    /// "skip", "approve" or "ignore"
    #[serde(default = "default_allowance_policy")]
    pub allowance_policy: String,

    // Sell amount: fixed when set, otherwise random in [min, max]
    pub sell_amount: Option<String>,
    #[serde(default = "default_sell_amount_min")]
    pub sell_amount_min: f64,
    #[serde(default = "default_sell_amount_max")]
    pub sell_amount_max: f64,

    // Timing
    #[serde(default = "default_roll_duration_ms")]
    pub roll_duration_ms: u64,
    #[serde(default = "default_receipt_poll_ms")]
    pub receipt_poll_ms: u64,
    #[serde(default = "default_receipt_confirm_blocks")]
    pub receipt_confirm_blocks: u64,
}

// Defaults
fn default_debug() -> bool {
    false
}
fn default_false() -> bool {
    false
}
fn default_chain_id() -> u64 {
    constants::CHAIN_MONAD_TESTNET
}
fn default_aggregator_url() -> String {
    constants::DEFAULT_AGGREGATOR_URL.to_string()
}
fn default_aggregator_version() -> String {
    constants::DEFAULT_AGGREGATOR_VERSION.to_string()
}
fn default_request_timeout_ms() -> u64 {
    constants::DEFAULT_REQUEST_TIMEOUT_MS
}
fn default_allowance_policy() -> String {
    "skip".to_string()
}
fn default_sell_amount_min() -> f64 {
    constants::DEFAULT_SELL_AMOUNT_MIN
}
fn default_sell_amount_max() -> f64 {
    constants::DEFAULT_SELL_AMOUNT_MAX
}
fn default_roll_duration_ms() -> u64 {
    constants::DEFAULT_ROLL_DURATION_MS
}
fn default_receipt_poll_ms() -> u64 {
    constants::DEFAULT_RECEIPT_POLL_MS
}
fn default_receipt_confirm_blocks() -> u64 {
    constants::DEFAULT_RECEIPT_CONFIRM_BLOCKS
}

fn non_empty(value: Option<&String>) -> Option<String> {
    value
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

impl GlobalSettings {
    pub fn load_with_path(path: Option<&str>) -> Result<Self, AppError> {
        // Load .env file if it exists
        dotenvy::dotenv().ok();

        let mut builder = Config::builder();
        if let Some(selected_path) = path {
            builder = builder.add_source(File::from(Path::new(selected_path)).required(true));
        } else {
            builder = builder.add_source(File::with_name("config").required(false));
        }
        // Precedence: CLI (in main) > env/.env > config file.
        builder = builder.add_source(Environment::default());

        let settings: GlobalSettings = builder.build()?.try_deserialize()?;
        settings.validate()?;
        tracing::debug!(
            target: "config",
            chain_id = settings.chain_id,
            aggregator = %settings.aggregator_url,
            policy = %settings.allowance_policy,
            "Settings loaded"
        );
        Ok(settings)
    }

    pub fn load() -> Result<Self, AppError> {
        Self::load_with_path(None)
    }

    pub fn validate(&self) -> Result<(), AppError> {
        if self.wallet_key.trim().is_empty() {
            return Err(AppError::Config("WALLET_KEY is missing".to_string()));
        }
        self.allowance_policy_value()?;
        if !(self.sell_amount_min > 0.0 && self.sell_amount_min <= self.sell_amount_max) {
            return Err(AppError::Validation {
                field: "sell_amount_min/sell_amount_max".into(),
                message: format!(
                    "expected 0 < min <= max, got [{}, {}]",
                    self.sell_amount_min, self.sell_amount_max
                ),
            });
        }
        if self.request_timeout_ms == 0 {
            return Err(AppError::Validation {
                field: "request_timeout_ms".into(),
                message: "must be positive".into(),
            });
        }
        Ok(())
    }

    pub fn allowance_policy_value(&self) -> Result<AllowancePolicy, AppError> {
        self.allowance_policy
            .parse()
            .map_err(|message| AppError::Validation {
                field: "allowance_policy".into(),
                message,
            })
    }

    /// Config value first, then `ZEROX_API_KEY`.
    pub fn aggregator_api_key_value(&self) -> Option<String> {
        non_empty(self.aggregator_api_key.as_ref()).or_else(|| {
            std::env::var(constants::AGGREGATOR_API_KEY_ENV)
                .ok()
                .filter(|v| !v.trim().is_empty())
        })
    }

    pub fn rpc_url_value(&self) -> Result<String, AppError> {
        if let Some(url) = non_empty(self.rpc_url.as_ref()) {
            return Ok(url);
        }
        match self.chain_id {
            constants::CHAIN_MONAD_TESTNET => Ok(constants::MONAD_TESTNET_RPC.to_string()),
            other => Err(AppError::Config(format!(
                "No RPC_URL configured for chain {other}"
            ))),
        }
    }

    pub fn aggregator_endpoints(&self) -> AggregatorEndpoints {
        let defaults = AggregatorEndpoints::default();
        AggregatorEndpoints {
            permit2_quote: non_empty(self.permit2_quote_path.as_ref())
                .unwrap_or(defaults.permit2_quote),
            allowance_holder_price: non_empty(self.allowance_holder_price_path.as_ref())
                .unwrap_or(defaults.allowance_holder_price),
            allowance_holder_quote: non_empty(self.allowance_holder_quote_path.as_ref())
                .unwrap_or(defaults.allowance_holder_quote),
            classic_quote: non_empty(self.classic_quote_path.as_ref())
                .unwrap_or(defaults.classic_quote),
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    pub fn roll_duration(&self) -> Duration {
        Duration::from_millis(self.roll_duration_ms)
    }

    pub fn receipt_poll_interval(&self) -> Duration {
        Duration::from_millis(self.receipt_poll_ms.max(50))
    }

    pub fn receipt_confirm_blocks_value(&self) -> u64 {
        self.receipt_confirm_blocks.max(1)
    }

    pub fn sell_amount_source(&self) -> SellAmount {
        match non_empty(self.sell_amount.as_ref()) {
            Some(fixed) => SellAmount::Fixed(fixed),
            None => SellAmount::Random {
                min: self.sell_amount_min,
                max: self.sell_amount_max,
            },
        }
    }

    pub fn token_registry(&self) -> Result<TokenRegistry, AppError> {
        if let Some(path) = non_empty(self.tokenlist_path.as_ref()) {
            return TokenRegistry::load_from_file(&path, self.chain_id);
        }
        TokenRegistry::for_chain(self.chain_id).ok_or_else(|| {
            AppError::Config(format!(
                "No built-in token table for chain {}; set TOKENLIST_PATH",
                self.chain_id
            ))
        })
    }

    /// Parse the wallet key and check it against `wallet_address` when both are set.
    pub fn wallet_signer(&self) -> Result<PrivateKeySigner, AppError> {
        let signer: PrivateKeySigner = self
            .wallet_key
            .trim()
            .parse()
            .map_err(|e| AppError::Config(format!("Invalid WALLET_KEY: {e}")))?;
        if let Some(expected) = self.wallet_address
            && expected != signer.address()
        {
            return Err(AppError::InvalidAddress(format!(
                "{expected:#x} does not match WALLET_KEY ({:#x})",
                signer.address()
            )));
        }
        Ok(signer)
    }
}
